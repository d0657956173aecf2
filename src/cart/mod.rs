//! Shopping Cart Domain Module
//!
//! This module contains all shopping cart business logic, including:
//! - Domain models (LineItem, Coupon, CartState, inputs, responses)
//! - Pricing and mutation helpers (clamping, discounts, totals)
//! - Durable storage and the cart store
//! - Application state management
//! - REST API handlers

pub mod handlers;
pub mod helpers;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;

// Re-export commonly used types for convenience
pub use handlers::routes;
pub use state::{AppState, SharedState};
pub use storage::{CartStorage, FileStorage, MemoryStorage};
pub use store::CartStore;
