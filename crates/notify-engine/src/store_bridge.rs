//! Bridges `notify-store::DocumentStore` to the narrower traits
//! `notify-dispatch` and `notify-subscriptions` expose, without either
//! of those crates depending back on `notify-store` (see DESIGN.md for
//! why that dependency direction is forbidden).

use std::sync::Arc;

use async_trait::async_trait;

use notify_dispatch::{DispatchError, NotifierBinding, NotifierBindingSource};
use notify_store::DocumentStore;

/// Adapts a `DocumentStore` to the dispatch fabric's narrower
/// `NotifierBindingSource` seam.
pub struct StoreBackedBindingSource {
    store: Arc<dyn DocumentStore>,
}

impl StoreBackedBindingSource {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl NotifierBindingSource for StoreBackedBindingSource {
    async fn bindings_for(&self, owner_id: &str) -> Result<Vec<NotifierBinding>, DispatchError> {
        self.store
            .notifiers_for(owner_id)
            .await
            .map_err(|e| DispatchError::BindingLookup(e.to_string()))
    }
}
