//! Snack Storefront Cart Library
//!
//! This library provides the shopper-side cart of the storefront: line items
//! clamped against stock, coupon discounts, durable persistence with a
//! best-effort server mirror, and a small HTTP surface for the UI.

// Domain modules
pub mod backend;
pub mod cart;

// Infrastructure
pub mod config;
pub mod error;
pub mod router;
