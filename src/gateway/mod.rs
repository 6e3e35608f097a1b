pub mod razorpay;
pub mod sandbox;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use razorpay::RazorpayGateway;
pub use sandbox::SandboxGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Razorpay credentials are not configured.")]
    CredentialsMissing,

    #[error("gateway request failed: {0}")]
    Request(String),

    #[error("gateway rejected order ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Holding-order request. Amounts are in minor currency units (paise).
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: OrderNotes,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderNotes {
    pub delivery_id: Uuid,
    pub sender_id: Uuid,
    pub purpose: String,
}

/// Order handle returned by the gateway once the hold is registered.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// Payment gateway seam: creates holding orders and exposes the public key
/// id the client needs for the hosted payment UI. The secret never leaves
/// the implementation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;

    fn key_id(&self) -> Result<String, GatewayError>;
}
