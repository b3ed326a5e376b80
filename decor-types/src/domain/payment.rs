//! Settled payment ledger record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::booking::{BookingId, PaymentState};
use super::tracking::TrackingId;

/// A confirmed payment recorded against a booking.
///
/// Keyed by the external provider's transaction id; at most one record
/// exists per transaction id. This is the settlement idempotency anchor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// External transaction identifier, unique in the ledger
    pub transaction_id: String,
    /// The booking this payment settles
    pub booking_id: BookingId,
    pub tracking_id: TrackingId,
    /// Amount in minor currency units
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub payment_status: PaymentState,
    pub paid_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a settled payment record.
    pub fn settled(
        transaction_id: String,
        booking_id: BookingId,
        tracking_id: TrackingId,
        amount: i64,
        currency: String,
        customer_email: String,
    ) -> Self {
        Self {
            transaction_id,
            booking_id,
            tracking_id,
            amount,
            currency,
            customer_email,
            payment_status: PaymentState::Paid,
            paid_at: Utc::now(),
        }
    }

    /// Reconstructs a payment from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        transaction_id: String,
        booking_id: BookingId,
        tracking_id: TrackingId,
        amount: i64,
        currency: String,
        customer_email: String,
        payment_status: PaymentState,
        paid_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id,
            booking_id,
            tracking_id,
            amount,
            currency,
            customer_email,
            payment_status,
            paid_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_payment() {
        let payment = Payment::settled(
            "txn_123".to_string(),
            BookingId::new(),
            TrackingId::generate(),
            45000,
            "usd".to_string(),
            "customer@example.com".to_string(),
        );

        assert_eq!(payment.payment_status, PaymentState::Paid);
        assert_eq!(payment.amount, 45000);
    }
}
