use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::gateway::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway};

/// Offline gateway for local runs and tests: fabricates order ids instead of
/// calling the hosted API. Selected only via explicit config.
pub struct SandboxGateway;

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let order = GatewayOrder {
            id: format!("order_sbx_{}", Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency.clone(),
        };

        info!(
            order_id = %order.id,
            amount = order.amount,
            receipt = %request.receipt,
            "sandbox gateway order created"
        );

        Ok(order)
    }

    fn key_id(&self) -> Result<String, GatewayError> {
        Ok("rzp_test_sandbox".to_string())
    }
}
