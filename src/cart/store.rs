//! Cart Store
//!
//! [`CartStore`] owns the [`CartState`], re-applies the cart invariants on
//! every write, persists the state synchronously after each mutation and
//! mirrors it to the backend from a detached task.
//!
//! The remote sync is fire-and-forget: a single worker task on the current
//! Tokio runtime pushes the latest state through a `watch` channel, so a burst
//! of mutations settles on the newest cart. Nothing is awaited or reported.
//! Outside a runtime the sync is skipped; the local record stays
//! authoritative either way.

use super::helpers::{self, format_item_summary, normalize_coupon_code};
use super::models::{
    CartState, CartSummary, CartView, Coupon, CouponOutcome, LineItem, PaymentMethod, Product,
    ShippingAddress,
};
use super::storage::CartStorage;
use crate::backend::models::CouponValidationData;
use crate::backend::{
    ApiEnvelope, CartBackend, CouponValidation, CouponValidationRequest, OrderRequest,
    PlacedOrder,
};
use crate::error::{CheckoutError, ClientResult};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// An in-flight coupon validation started by [`CartStore::begin_coupon`]
#[derive(Debug, Clone)]
pub struct CouponRequest {
    pub token: Uuid,
    /// Normalized code the coupon will be stored under
    pub code: String,
    pub payload: CouponValidationRequest,
}

pub struct CartStore {
    state: CartState,
    storage: Box<dyn CartStorage>,
    backend: Arc<dyn CartBackend>,
    pending_coupon: Option<Uuid>,
    sync_tx: Option<watch::Sender<CartState>>,
}

impl CartStore {
    /// Creates an empty store without reading storage
    pub fn new(storage: Box<dyn CartStorage>, backend: Arc<dyn CartBackend>) -> Self {
        Self {
            state: CartState::default(),
            storage,
            backend,
            pending_coupon: None,
            sync_tx: None,
        }
    }

    /// Creates a store rehydrated from `storage`.
    ///
    /// A stored record fully replaces the empty state once its lines are
    /// normalized (see [`helpers::normalize_lines`]); a repaired record is
    /// written back. An unreadable record is logged and the cart starts empty.
    pub fn load(storage: Box<dyn CartStorage>, backend: Arc<dyn CartBackend>) -> Self {
        let mut store = Self::new(storage, backend);
        match store.storage.load() {
            Ok(Some(mut state)) => {
                let repaired = helpers::normalize_lines(&mut state);
                info!(
                    lines = state.items.len(),
                    coupon = state.applied_coupon.is_some(),
                    repaired,
                    "cart rehydrated"
                );
                store.state = state;
                if repaired {
                    store.commit();
                }
            }
            Ok(None) => debug!("no stored cart, starting empty"),
            Err(e) => warn!(error = %e, "stored cart unreadable, starting empty"),
        }
        store
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn items(&self) -> &[LineItem] {
        &self.state.items
    }

    pub fn applied_coupon(&self) -> Option<&Coupon> {
        self.state.applied_coupon.as_ref()
    }

    pub fn backend(&self) -> Arc<dyn CartBackend> {
        Arc::clone(&self.backend)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds `quantity` units of a product size; over-stock requests are
    /// clamped silently.
    pub fn add_item(&mut self, product: &Product, selected_size: &str, quantity: u32) {
        if helpers::add_line_item(&mut self.state, product, selected_size, quantity) {
            self.commit();
        }
    }

    pub fn remove_item(&mut self, product_id: &str, selected_size: &str) {
        if helpers::remove_line_item(&mut self.state, product_id, selected_size) {
            self.commit();
        }
    }

    /// Sets a line's quantity; zero or below removes it.
    ///
    /// Without `max_stock` the stock recorded on the line applies.
    pub fn update_quantity(
        &mut self,
        product_id: &str,
        selected_size: &str,
        new_quantity: i64,
        max_stock: Option<u32>,
    ) {
        if helpers::set_line_quantity(
            &mut self.state,
            product_id,
            selected_size,
            new_quantity,
            max_stock,
        ) {
            self.commit();
        }
    }

    /// Empties the cart and drops the coupon
    pub fn clear_cart(&mut self) {
        self.state = CartState::default();
        self.pending_coupon = None;
        self.commit();
    }

    pub fn remove_coupon(&mut self) {
        self.pending_coupon = None;
        if self.state.applied_coupon.take().is_some() {
            self.commit();
        }
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    pub fn cart_total(&self) -> f64 {
        helpers::cart_total(&self.state)
    }

    pub fn cart_count(&self) -> u32 {
        helpers::cart_count(&self.state.items)
    }

    pub fn subtotal(&self) -> f64 {
        helpers::subtotal(&self.state.items)
    }

    pub fn summary(&self) -> CartSummary {
        helpers::summarize(&self.state)
    }

    pub fn view(&self) -> CartView {
        CartView {
            items: self.state.items.clone(),
            applied_coupon: self.state.applied_coupon.clone(),
            summary: self.summary(),
            warning: None,
        }
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Validates `code` with the backend and applies it on success.
    ///
    /// Never fails: rejections and network errors come back as an
    /// unsuccessful [`CouponOutcome`] and leave the cart unchanged.
    pub async fn apply_coupon(&mut self, code: &str) -> CouponOutcome {
        let request = match self.begin_coupon(code) {
            Ok(request) => request,
            Err(outcome) => return outcome,
        };
        let result = self.backend.validate_coupon(&request.payload).await;
        self.finish_coupon(&request, result)
    }

    /// First half of [`apply_coupon`](Self::apply_coupon): snapshots the cart
    /// into a validation request and marks it as the current one.
    ///
    /// A blank code is rejected here without contacting the backend.
    pub fn begin_coupon(&mut self, code: &str) -> Result<CouponRequest, CouponOutcome> {
        let Some(normalized) = normalize_coupon_code(code) else {
            return Err(CouponOutcome::rejected("Please enter a coupon code"));
        };

        let token = Uuid::new_v4();
        self.pending_coupon = Some(token);

        Ok(CouponRequest {
            token,
            payload: CouponValidationRequest {
                code: normalized.clone(),
                order_amount: self.subtotal(),
                items: self.state.items.clone(),
            },
            code: normalized,
        })
    }

    /// Second half of [`apply_coupon`](Self::apply_coupon).
    ///
    /// Responses to a request that is no longer current (a newer validation
    /// started, or the coupon was removed or the cart cleared meanwhile) are
    /// discarded.
    pub fn finish_coupon(
        &mut self,
        request: &CouponRequest,
        result: ClientResult<CouponValidation>,
    ) -> CouponOutcome {
        if self.pending_coupon != Some(request.token) {
            debug!(code = %request.code, "discarding superseded coupon response");
            return CouponOutcome::rejected("Coupon request superseded");
        }
        self.pending_coupon = None;

        let envelope = match result {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(code = %request.code, error = %e, "coupon validation failed");
                return CouponOutcome::rejected("Network error");
            }
        };

        match envelope {
            ApiEnvelope {
                success: true,
                data:
                    Some(CouponValidationData {
                        coupon: Some(mut coupon),
                        discount_amount,
                    }),
                ..
            } => {
                if coupon.code.trim().is_empty() {
                    coupon.code = request.code.clone();
                }
                coupon.discount_amount = discount_amount;

                info!(code = %coupon.code, "coupon applied");
                self.state.applied_coupon = Some(coupon);
                self.commit();
                CouponOutcome::applied(format!("Coupon {} applied!", request.code))
            }
            ApiEnvelope { message, .. } => {
                CouponOutcome::rejected(message.unwrap_or_else(|| "Invalid coupon code".into()))
            }
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Builds the cash-on-delivery order for the current cart.
    pub fn order_request(
        &self,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<OrderRequest, CheckoutError> {
        if payment_method != PaymentMethod::Cod {
            return Err(CheckoutError::UnsupportedPayment(
                payment_method.as_str().to_string(),
            ));
        }
        if self.state.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if !self.backend.has_session() {
            return Err(CheckoutError::LoginRequired);
        }

        Ok(OrderRequest {
            items: self.state.items.iter().map(Into::into).collect(),
            shipping_address,
            payment_method,
            applied_coupon: self.state.applied_coupon.clone(),
        })
    }

    /// Applies the backend's answer to `order`.
    ///
    /// Nothing changes unless the order was accepted. Then the ordered
    /// quantities are taken off the cart, along with the coupon when the order
    /// carried one. Lines added or grown while the order was in flight stay.
    pub fn finish_checkout(
        &mut self,
        order: &OrderRequest,
        result: ClientResult<ApiEnvelope<PlacedOrder>>,
    ) -> Result<PlacedOrder, CheckoutError> {
        match result? {
            ApiEnvelope {
                success: true,
                data: Some(placed),
                ..
            } => {
                self.settle_order(order);
                info!(
                    order = placed.id.as_deref().unwrap_or("-"),
                    lines = order.items.len(),
                    remaining = %format_item_summary(&self.state.items),
                    "order placed"
                );
                Ok(placed)
            }
            ApiEnvelope { message, .. } => Err(CheckoutError::Rejected(
                message.unwrap_or_else(|| "order was not accepted".into()),
            )),
        }
    }

    /// Places a cash-on-delivery order and clears the cart once accepted.
    pub async fn checkout(
        &mut self,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<PlacedOrder, CheckoutError> {
        let order = self.order_request(shipping_address, payment_method)?;
        let result = self.backend.create_order(&order).await;
        self.finish_checkout(&order, result)
    }

    fn settle_order(&mut self, order: &OrderRequest) {
        let mut changed = false;
        for line in &order.items {
            changed |= helpers::deduct_line_quantity(
                &mut self.state,
                &line.product_id,
                &line.size,
                line.quantity,
            );
        }
        if order.applied_coupon.is_some() {
            self.pending_coupon = None;
            changed |= self.state.applied_coupon.take().is_some();
        }
        if changed {
            self.commit();
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn commit(&mut self) {
        if let Err(e) = self.storage.save(&self.state) {
            warn!(error = %e, "failed to persist cart");
        }
        self.spawn_sync();
    }

    fn spawn_sync(&mut self) {
        if let Some(tx) = &self.sync_tx {
            if tx.send(self.state.clone()).is_ok() {
                return;
            }
        }

        // No worker yet, or its runtime is gone.
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no async runtime, skipping cart sync");
            self.sync_tx = None;
            return;
        };
        let (tx, rx) = watch::channel(self.state.clone());
        runtime.spawn(sync_worker(Arc::clone(&self.backend), rx));
        self.sync_tx = Some(tx);
    }
}

/// Pushes the newest state on `rx` to the backend until the store is dropped.
///
/// States replaced while a sync is in flight are skipped.
async fn sync_worker(backend: Arc<dyn CartBackend>, mut rx: watch::Receiver<CartState>) {
    loop {
        let snapshot = rx.borrow_and_update().clone();
        if let Err(e) = backend.sync_cart(&snapshot).await {
            debug!(error = %e, "cart sync failed");
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}
