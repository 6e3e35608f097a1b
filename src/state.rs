use std::sync::Arc;

use crate::auth::IdentityProvider;
use crate::gateway::PaymentGateway;
use crate::observability::metrics::Metrics;
use crate::store::Store;

/// Request-scoped dependency context. The identity, store, and gateway
/// collaborators are injected here rather than constructed as module-level
/// singletons.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub identity: Arc<dyn IdentityProvider>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub platform_account_id: String,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        identity: Arc<dyn IdentityProvider>,
        gateway: Arc<dyn PaymentGateway>,
        platform_account_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            identity,
            gateway,
            platform_account_id: platform_account_id.into(),
            metrics: Metrics::new(),
        }
    }
}
