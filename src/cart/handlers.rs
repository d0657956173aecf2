//! REST API handlers for shopping cart operations
//!
//! These endpoints let the storefront UI drive the cart store: line item
//! mutations, coupon application, the coupon catalogue and COD checkout.

use super::{helpers::stock_check, models::*, state::SharedState};
use crate::backend::models::PlacedOrder;
use crate::error::AppError;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::info;

/// Creates routes for cart-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/cart", get(get_cart))
        .route("/cart/items", post(add_item).patch(update_quantity))
        .route("/cart/items/:product_id/:size", delete(remove_item))
        .route("/cart/clear", post(clear_cart))
        .route("/cart/coupon", post(apply_coupon).delete(remove_coupon))
        .route("/coupons", get(list_coupons))
        .route("/checkout", post(checkout))
}

/// Endpoint: GET /cart
async fn get_cart(State(state): State<SharedState>) -> Json<CartView> {
    Json(state.store().view())
}

/// Endpoint: POST /cart/items
/// Adds an item, clamping to stock. Out-of-stock sizes are refused.
async fn add_item(
    State(state): State<SharedState>,
    Json(payload): Json<AddItemInput>,
) -> Result<Json<CartView>, AppError> {
    if payload.selected_size.trim().is_empty() {
        return Err(AppError::Validation("Please select a size".into()));
    }

    let warning = match stock_check(&payload.product, &payload.selected_size, payload.quantity) {
        StockCheck::OutOfStock => {
            return Err(AppError::OutOfStock("Selected size is out of stock".into()))
        }
        StockCheck::Limited { max } => Some(format!("Only {max} left in stock")),
        StockCheck::Available => None,
    };

    let mut store = state.store();
    store.add_item(&payload.product, &payload.selected_size, payload.quantity);

    let mut view = store.view();
    view.warning = warning;
    Ok(Json(view))
}

/// Endpoint: PATCH /cart/items
async fn update_quantity(
    State(state): State<SharedState>,
    Json(payload): Json<UpdateQuantityInput>,
) -> Json<CartView> {
    let mut store = state.store();
    store.update_quantity(
        &payload.product_id,
        &payload.selected_size,
        payload.quantity,
        payload.max_stock,
    );
    Json(store.view())
}

/// Endpoint: DELETE /cart/items/:product_id/:size
async fn remove_item(
    State(state): State<SharedState>,
    Path((product_id, size)): Path<(String, String)>,
) -> Json<CartView> {
    let mut store = state.store();
    store.remove_item(&product_id, &size);
    Json(store.view())
}

/// Endpoint: POST /cart/clear
async fn clear_cart(State(state): State<SharedState>) -> Json<CartView> {
    let mut store = state.store();
    store.clear_cart();
    Json(store.view())
}

/// Endpoint: POST /cart/coupon
/// Always answers 200; rejections are reported in the body.
async fn apply_coupon(
    State(state): State<SharedState>,
    Json(payload): Json<ApplyCouponInput>,
) -> Json<CouponResponse> {
    let begun = state.store().begin_coupon(&payload.code);
    let request = match begun {
        Ok(request) => request,
        Err(outcome) => return Json(coupon_response(&state, outcome)),
    };

    let result = state.backend.validate_coupon(&request.payload).await;

    let outcome = state.store().finish_coupon(&request, result);
    Json(coupon_response(&state, outcome))
}

fn coupon_response(state: &SharedState, outcome: CouponOutcome) -> CouponResponse {
    CouponResponse {
        success: outcome.success,
        message: outcome.message,
        cart: state.store().view(),
    }
}

/// Endpoint: DELETE /cart/coupon
async fn remove_coupon(State(state): State<SharedState>) -> Json<CartView> {
    let mut store = state.store();
    store.remove_coupon();
    Json(store.view())
}

/// Endpoint: GET /coupons
async fn list_coupons(State(state): State<SharedState>) -> Result<Json<Vec<Coupon>>, AppError> {
    Ok(Json(state.backend.list_coupons().await?))
}

/// Endpoint: POST /checkout
/// Places a cash-on-delivery order and takes the ordered lines off the cart once accepted.
async fn checkout(
    State(state): State<SharedState>,
    Json(payload): Json<CheckoutInput>,
) -> Result<Json<PlacedOrder>, AppError> {
    let order = state
        .store()
        .order_request(payload.shipping_address, payload.payment_method)?;

    let result = state.backend.create_order(&order).await;

    let placed = state.store().finish_checkout(&order, result)?;
    info!(order = placed.id.as_deref().unwrap_or("-"), "checkout complete");
    Ok(Json(placed))
}
