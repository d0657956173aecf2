//! Shopping Cart Domain Models
//!
//! This module contains the data structures of the cart domain: line items,
//! applied coupons, the persisted cart record and the product payload the cart
//! reads prices and stock from at add-time.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// =============================================================================
// Constants
// =============================================================================

/// Stock ceiling used when a size variant does not report its stock
pub const DEFAULT_MAX_STOCK: u32 = 99;
/// Unit price used when a size variant does not report its price
pub const DEFAULT_UNIT_PRICE: f64 = 0.0;
/// Durable storage key holding the serialized cart
pub const STORAGE_NAMESPACE: &str = "vibe-bites-cart";

fn default_max_stock() -> u32 {
    DEFAULT_MAX_STOCK
}

fn default_quantity() -> u32 {
    1
}

// =============================================================================
// Product Collaborator
// =============================================================================

/// One purchasable configuration of a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SizeVariant {
    /// Size label, e.g. `"100g"`
    pub size: String,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub stock: Option<u32>,
}

/// Product as returned by the catalogue backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub sizes: Vec<SizeVariant>,
}

impl Product {
    /// Finds the size variant with the given label
    pub fn variant(&self, selected_size: &str) -> Option<&SizeVariant> {
        self.sizes.iter().find(|s| s.size == selected_size)
    }
}

// =============================================================================
// Cart Domain Models
// =============================================================================

/// One entry of the cart, keyed by `(product_id, selected_size)`
///
/// The JSON names (`id`, `price`) match the record the storefront keeps in
/// durable storage and mirrors to `/cart/sync`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(rename = "id")]
    pub product_id: String,

    pub name: String,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    pub selected_size: String,

    /// Price snapshot taken when the item was added
    #[serde(rename = "price", default)]
    pub unit_price: f64,

    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default = "default_max_stock")]
    pub max_stock: u32,
}

impl LineItem {
    /// Returns true when this line is identified by the given key
    pub fn matches(&self, product_id: &str, selected_size: &str) -> bool {
        self.product_id == product_id && self.selected_size == selected_size
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Discount kind carried by a coupon
///
/// Unknown kinds are kept verbatim so that a persisted coupon survives a
/// round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CouponType {
    Percentage,
    Fixed,
    Other(String),
}

impl Default for CouponType {
    fn default() -> Self {
        CouponType::Other(String::new())
    }
}

impl From<String> for CouponType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "percentage" => CouponType::Percentage,
            "fixed" => CouponType::Fixed,
            _ => CouponType::Other(value),
        }
    }
}

impl From<CouponType> for String {
    fn from(value: CouponType) -> Self {
        match value {
            CouponType::Percentage => "percentage".to_string(),
            CouponType::Fixed => "fixed".to_string(),
            CouponType::Other(kind) => kind,
        }
    }
}

/// A validated coupon applied to the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Uppercased code as entered by the shopper
    #[serde(default)]
    pub code: String,

    #[serde(rename = "type", default)]
    pub coupon_type: CouponType,

    /// Percentage value when `coupon_type` is `Percentage`
    #[serde(default)]
    pub discount: f64,

    /// Restricts the discount to items of this category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Amount computed by the server at validation time (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,

    /// Any additional fields the server attached to the coupon
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// The whole cart as persisted to durable storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    #[serde(default)]
    pub items: Vec<LineItem>,

    #[serde(default)]
    pub applied_coupon: Option<Coupon>,
}

impl CartState {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Price breakdown shown on the cart and checkout pages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub subtotal: f64,
    /// `subtotal - total`
    pub discount: f64,
    pub total: f64,
    /// Sum of quantities
    pub item_count: u32,
    /// Number of distinct line items
    pub line_count: usize,
}

/// Result of a coupon application, reported instead of an error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CouponOutcome {
    pub success: bool,
    pub message: String,
}

impl CouponOutcome {
    pub fn applied(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Stock availability of a requested `(product, size, quantity)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCheck {
    Available,
    OutOfStock,
    /// More was requested than the variant holds
    Limited { max: u32 },
}

// =============================================================================
// Checkout Models
// =============================================================================

/// Payment methods offered at checkout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery
    #[default]
    Cod,
    /// Online payment gateway, currently disabled
    Razorpay,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Razorpay => "razorpay",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub phone: String,
}

// =============================================================================
// HTTP Surface Inputs and Responses
// =============================================================================

/// Input for `POST /cart/items`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemInput {
    pub product: Product,

    pub selected_size: String,

    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Input for `PATCH /cart/items`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityInput {
    pub product_id: String,

    pub selected_size: String,

    /// Zero or negative removes the line
    pub quantity: i64,

    #[serde(default)]
    pub max_stock: Option<u32>,
}

/// Input for `POST /cart/coupon`
#[derive(Debug, Deserialize)]
pub struct ApplyCouponInput {
    pub code: String,
}

/// Input for `POST /checkout`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub shipping_address: ShippingAddress,

    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Snapshot of the cart returned by every cart endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<LineItem>,

    pub applied_coupon: Option<Coupon>,

    pub summary: CartSummary,

    /// Stock warning raised while adding an item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Response for `POST /cart/coupon`
#[derive(Debug, Serialize)]
pub struct CouponResponse {
    pub success: bool,
    pub message: String,
    pub cart: CartView,
}
