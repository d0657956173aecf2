//! Storefront Backend Module
//!
//! The backend owns products, coupons and orders. The cart reaches it through
//! [`CartBackend`]:
//! - `PUT /cart/sync` mirrors the cart (advisory, best-effort)
//! - `POST /coupons/validate` validates a coupon against the cart
//! - `GET /coupons` lists the coupons on offer
//! - `POST /orders` places a cash-on-delivery order

pub mod http;
pub mod models;

use crate::cart::models::{CartState, Coupon};
use crate::error::ClientResult;
use async_trait::async_trait;

pub use http::{build_api_url, HttpBackend};
pub use models::{
    ApiEnvelope, CouponValidation, CouponValidationRequest, OrderRequest, PlacedOrder,
};

/// REST collaborator of the cart store
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Mirrors the full cart to the server
    async fn sync_cart(&self, state: &CartState) -> ClientResult<()>;

    /// Validates a coupon code.
    ///
    /// A response the server rejected is returned as an envelope with
    /// `success == false`; only transport and decoding failures are errors.
    async fn validate_coupon(
        &self,
        request: &CouponValidationRequest,
    ) -> ClientResult<CouponValidation>;

    async fn list_coupons(&self) -> ClientResult<Vec<Coupon>>;

    /// Places an order. The envelope carries the server's verdict.
    async fn create_order(&self, order: &OrderRequest) -> ClientResult<ApiEnvelope<PlacedOrder>>;

    /// Whether requests carry a shopper session
    fn has_session(&self) -> bool;
}
