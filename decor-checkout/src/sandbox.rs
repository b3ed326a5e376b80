//! In-process checkout provider simulation.

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use decor_types::{
    CheckoutProvider, CheckoutSession, NewCheckoutSession, ProviderError, ResolvedSession,
    SessionPaymentStatus,
};

/// Base of the fake redirect URLs handed out by the sandbox.
const SANDBOX_PAY_URL: &str = "https://checkout.sandbox.invalid/pay";

struct SandboxSession {
    transaction_id: String,
    paid: bool,
    request: NewCheckoutSession,
}

/// A self-contained stand-in for the hosted checkout provider.
///
/// Sessions are held in memory. Nothing is ever paid until a test (or a dev
/// driving the API manually) calls [`SandboxCheckout::mark_paid`], which
/// mirrors the customer completing the hosted flow.
///
/// Clones share the session store, so a handle kept outside the service can
/// complete sessions the service opened.
#[derive(Clone, Default)]
pub struct SandboxCheckout {
    sessions: Arc<DashMap<String, SandboxSession>>,
}

impl SandboxCheckout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completes the hosted flow for a session. Returns the transaction id,
    /// or None for an unknown session.
    pub fn mark_paid(&self, session_id: &str) -> Option<String> {
        self.sessions.get_mut(session_id).map(|mut s| {
            s.paid = true;
            s.transaction_id.clone()
        })
    }

    /// Number of sessions opened so far.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Ids of every session opened so far, in no particular order.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|e| e.key().clone()).collect()
    }
}

#[async_trait::async_trait]
impl CheckoutProvider for SandboxCheckout {
    async fn create_session(
        &self,
        req: NewCheckoutSession,
    ) -> Result<CheckoutSession, ProviderError> {
        let session_id = format!("cs_sbx_{}", Uuid::new_v4().simple());
        let transaction_id = format!("txn_sbx_{}", Uuid::new_v4().simple());
        let url = format!("{}/{}", SANDBOX_PAY_URL, session_id);

        self.sessions.insert(
            session_id.clone(),
            SandboxSession {
                transaction_id,
                paid: false,
                request: req,
            },
        );

        Ok(CheckoutSession { session_id, url })
    }

    async fn resolve_session(&self, session_id: &str) -> Result<ResolvedSession, ProviderError> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| ProviderError::SessionNotFound(session_id.to_string()))?;

        let status = if session.paid {
            SessionPaymentStatus::Paid
        } else {
            SessionPaymentStatus::Unpaid
        };

        Ok(ResolvedSession {
            session_id: session_id.to_string(),
            transaction_id: session.transaction_id.clone(),
            status,
            amount_minor: session.request.amount_minor,
            currency: session.request.currency.clone(),
            customer_email: session.request.customer_email.clone(),
            metadata: session.request.metadata.clone(),
        })
    }
}
