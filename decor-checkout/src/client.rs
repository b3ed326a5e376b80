//! HTTP adapter for a hosted checkout provider.

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use decor_types::{
    CheckoutProvider, CheckoutSession, NewCheckoutSession, ProviderError, ResolvedSession,
    SessionMetadata, SessionPaymentStatus,
};

/// Client for a Stripe-style hosted checkout API.
///
/// Sessions are created with `POST {base}/v1/checkout/sessions` and resolved
/// with `GET {base}/v1/checkout/sessions/{id}`, authenticated with a bearer
/// secret key.
pub struct HostedCheckoutClient {
    base_url: String,
    secret_key: String,
    http: Client,
}

/// Session shape on the provider's wire.
#[derive(Debug, Deserialize)]
struct SessionWire {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    metadata: Option<MetadataWire>,
}

#[derive(Debug, Deserialize)]
struct MetadataWire {
    #[serde(default)]
    booking_id: String,
    #[serde(default)]
    tracking_id: String,
    #[serde(default)]
    item_name: String,
}

impl HostedCheckoutClient {
    /// Creates a new client for the given provider endpoint.
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
            http: Client::new(),
        }
    }

    async fn read_session(&self, resp: reqwest::Response) -> Result<SessionWire, ProviderError> {
        let status = resp.status();
        if status.is_success() {
            resp.json::<SessionWire>()
                .await
                .map_err(|e| ProviderError::Protocol(e.to_string()))
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(ProviderError::Protocol(format!(
                "provider returned {}: {}",
                status, body
            )))
        }
    }
}

#[async_trait::async_trait]
impl CheckoutProvider for HostedCheckoutClient {
    async fn create_session(
        &self,
        req: NewCheckoutSession,
    ) -> Result<CheckoutSession, ProviderError> {
        let resp = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let wire = self.read_session(resp).await?;
        let url = wire
            .url
            .ok_or_else(|| ProviderError::Protocol("session response missing url".into()))?;

        Ok(CheckoutSession {
            session_id: wire.id,
            url,
        })
    }

    async fn resolve_session(&self, session_id: &str) -> Result<ResolvedSession, ProviderError> {
        let resp = self
            .http
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.base_url, session_id
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::SessionNotFound(session_id.to_string()));
        }

        let wire = self.read_session(resp).await?;

        let status = match wire.payment_status.as_deref() {
            Some("paid") => SessionPaymentStatus::Paid,
            _ => SessionPaymentStatus::Unpaid,
        };

        let metadata = wire.metadata.map_or_else(
            || SessionMetadata {
                booking_id: String::new(),
                tracking_id: String::new(),
                item_name: String::new(),
            },
            |m| SessionMetadata {
                booking_id: m.booking_id,
                tracking_id: m.tracking_id,
                item_name: m.item_name,
            },
        );

        Ok(ResolvedSession {
            transaction_id: wire.payment_intent.unwrap_or_else(|| wire.id.clone()),
            session_id: wire.id,
            status,
            amount_minor: wire.amount_total.unwrap_or(0),
            currency: wire.currency.unwrap_or_else(|| "usd".to_string()),
            customer_email: wire.customer_email.unwrap_or_default(),
            metadata,
        })
    }
}
