//! Shopping Cart State Management
//!
//! This module builds the application state injected into the HTTP layer:
//! one cart store, rehydrated at startup and kept for the process lifetime.

use super::models::STORAGE_NAMESPACE;
use super::storage::FileStorage;
use super::store::CartStore;
use crate::backend::{CartBackend, HttpBackend};
use crate::config::Config;
use crate::error::ClientError;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Core application state containing the cart store and its backend
pub struct AppState {
    /// The shopper's cart. The lock is never held across an `.await`.
    store: Mutex<CartStore>,

    /// Backend used for coupon validation, coupon listing and orders
    pub backend: Arc<dyn CartBackend>,
}

impl AppState {
    /// Wraps an existing store
    pub fn new(store: CartStore) -> Self {
        let backend = store.backend();
        Self {
            store: Mutex::new(store),
            backend,
        }
    }

    /// Builds the file-backed store and HTTP backend described by `config`
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let storage = FileStorage::new(&config.cart_dir, STORAGE_NAMESPACE);
        info!("Using cart record: {:?}", storage.path());

        let backend: Arc<dyn CartBackend> = Arc::new(HttpBackend::new(config)?);
        Ok(Self::new(CartStore::load(Box::new(storage), backend)))
    }

    /// Locks the cart store
    pub fn store(&self) -> MutexGuard<'_, CartStore> {
        self.store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
