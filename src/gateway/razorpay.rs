use async_trait::async_trait;
use serde::Deserialize;

use crate::gateway::{GatewayError, GatewayOrder, OrderRequest, PaymentGateway};

#[derive(Debug, Clone)]
struct Credentials {
    key_id: String,
    key_secret: String,
}

/// Client for the hosted Razorpay orders API. Credentials are optional at
/// construction so the service can boot in environments where they are
/// absent; calls then fail at request time, matching the deferred check the
/// hosted flow expects.
pub struct RazorpayGateway {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

impl RazorpayGateway {
    pub fn new(
        key_id: Option<String>,
        key_secret: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let credentials = match (key_id, key_secret) {
            (Some(key_id), Some(key_secret)) => Some(Credentials { key_id, key_secret }),
            _ => None,
        };

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    fn credentials(&self) -> Result<&Credentials, GatewayError> {
        self.credentials
            .as_ref()
            .ok_or(GatewayError::CredentialsMissing)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let credentials = self.credentials()?;
        let url = format!("{}/v1/orders", self.base_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|err| GatewayError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|err| GatewayError::Request(err.to_string()))?;

        Ok(GatewayOrder {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
        })
    }

    fn key_id(&self) -> Result<String, GatewayError> {
        Ok(self.credentials()?.key_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::gateway::OrderNotes;

    #[tokio::test]
    async fn create_order_without_credentials_fails() {
        let gateway = RazorpayGateway::new(None, None, "https://api.razorpay.com");
        let request = OrderRequest {
            amount: 25_000,
            currency: "INR".to_string(),
            receipt: "routedrop_test".to_string(),
            notes: OrderNotes {
                delivery_id: Uuid::new_v4(),
                sender_id: Uuid::new_v4(),
                purpose: "p2p_delivery_escrow".to_string(),
            },
        };

        let err = gateway.create_order(&request).await.unwrap_err();
        assert!(matches!(err, GatewayError::CredentialsMissing));
        assert!(matches!(
            gateway.key_id().unwrap_err(),
            GatewayError::CredentialsMissing
        ));
    }
}
