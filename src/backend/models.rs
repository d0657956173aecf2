//! Backend API payloads
//!
//! Request and response shapes of the storefront REST API.

use crate::cart::models::{Coupon, LineItem, PaymentMethod, ShippingAddress};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Envelope wrapping every backend response
///
/// ```json
/// { "success": true, "message": "...", "data": { ... } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Body of `POST /coupons/validate`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidationRequest {
    pub code: String,

    /// Cart total before any discount
    pub order_amount: f64,

    pub items: Vec<LineItem>,
}

/// `data` of a successful coupon validation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidationData {
    #[serde(default)]
    pub coupon: Option<Coupon>,

    #[serde(default)]
    pub discount_amount: Option<f64>,
}

pub type CouponValidation = ApiEnvelope<CouponValidationData>;

/// `data` of `GET /coupons`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CouponList {
    #[serde(default)]
    pub coupons: Vec<Coupon>,
}

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: String,
    pub size: String,
    pub quantity: u32,
}

impl From<&LineItem> for OrderLine {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            size: item.selected_size.clone(),
            quantity: item.quantity,
        }
    }
}

/// Body of `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,

    pub shipping_address: ShippingAddress,

    pub payment_method: PaymentMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_coupon: Option<Coupon>,
}

/// Order as acknowledged by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlacedOrder {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// `data` of `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderData {
    pub order: PlacedOrder,
}
