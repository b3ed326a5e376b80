//! Hosted checkout provider port.
//!
//! The marketplace never talks to card networks: it opens a provider-hosted
//! checkout session, hands the customer a redirect URL, and later resolves
//! the session to learn whether it was paid. All payment state machinery
//! lives on the provider side of this trait.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Metadata attached to a checkout session so the settlement webhook/redirect
/// can be tied back to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub booking_id: String,
    pub tracking_id: String,
    pub item_name: String,
}

/// Parameters for opening a hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCheckoutSession {
    /// Amount in minor currency units
    pub amount_minor: i64,
    pub currency: String,
    pub customer_email: String,
    pub metadata: SessionMetadata,
}

/// A freshly opened session: the id to resolve later and the URL to send the
/// customer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

/// Payment state of a session as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPaymentStatus {
    Paid,
    Unpaid,
}

/// A session resolved after the customer returned from the hosted flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSession {
    pub session_id: String,
    /// The provider's transaction identifier; settlement is keyed by this
    pub transaction_id: String,
    pub status: SessionPaymentStatus,
    pub amount_minor: i64,
    pub currency: String,
    pub customer_email: String,
    pub metadata: SessionMetadata,
}

/// Port to the external hosted checkout provider.
#[async_trait::async_trait]
pub trait CheckoutProvider: Send + Sync + 'static {
    /// Opens a session and returns the hosted redirect URL.
    async fn create_session(
        &self,
        req: NewCheckoutSession,
    ) -> Result<CheckoutSession, ProviderError>;

    /// Resolves a session by id after the customer completed (or abandoned)
    /// the hosted flow.
    async fn resolve_session(&self, session_id: &str) -> Result<ResolvedSession, ProviderError>;
}
