//! Data Transfer Objects (DTOs) for requests and responses.
//!
//! Wire casing is camelCase throughout: the HTTP surface predates this
//! implementation and clients depend on the field names.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Booking, BookingId, DecoratorStatus, DeliveryStatus, Payment, UserRole,
};

// ─────────────────────────────────────────────────────────────────────────────
// Identity DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to register (or log in) a user.
///
/// Registration is idempotent per email: an already-known email returns the
/// stored record unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Defaults to `user` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

/// Filter for listing users.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserQuery {
    pub role: Option<UserRole>,
    pub status: Option<DecoratorStatus>,
}

/// Role lookup response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub role: UserRole,
}

/// Request to change a user's role.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// Required; a missing role is a validation failure, not a no-op
    pub role: Option<UserRole>,
}

/// Request to change a decorator's approval status.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: Option<DecoratorStatus>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to publish a service listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    #[schema(example = "Wedding stage decoration")]
    pub service_name: String,
    #[schema(example = "wedding")]
    pub category: String,
    /// Price in major currency units
    #[schema(example = 450.0)]
    pub cost: f64,
}

/// Filter for browsing the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingQuery {
    /// Case-insensitive substring match on the service name
    pub search: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
}

/// Partial update of a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    pub service_name: Option<String>,
    pub category: Option<String>,
    pub cost: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Booking DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to place a booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[schema(example = "alice@example.com")]
    pub user_email: String,
    /// Defaults to the current time when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::DateTime<chrono::Utc>>,
}

/// Filter for listing bookings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    /// Customer email
    pub email: Option<String>,
    pub decorator_email: Option<String>,
    pub delivery_status: Option<DeliveryStatus>,
}

/// Request to assign a decorator to a booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignDecoratorRequest {
    pub decorator_name: String,
    pub decorator_email: String,
    /// Free-form provider-side state, e.g. "accepted"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorator_status: Option<String>,
}

/// Request to move a booking along its delivery lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateDeliveryStatusRequest {
    /// Required; must be an allowed transition from the current status
    pub status: Option<DeliveryStatus>,
}

/// Partial update of a booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    pub date: Option<chrono::DateTime<chrono::Utc>>,
    pub ratings: Option<f64>,
}

/// Filter for the decorator work queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecoratorQuery {
    pub decorator_email: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to open a hosted checkout session for a booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    pub booking_id: BookingId,
    pub tracking_id: String,
    /// Price in major currency units; converted to minor units for the provider
    #[schema(example = 450.0)]
    pub cost: f64,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "Wedding stage decoration")]
    pub service_name: String,
}

/// Redirect target for a freshly created checkout session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub url: String,
}

/// Outcome of a settlement attempt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub success: bool,
    /// True when the transaction was already in the ledger and nothing was
    /// mutated by this call
    pub already_settled: bool,
    /// True when the referenced booking was moved to planning-phase
    pub booking_updated: bool,
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    pub message: String,
}

/// Filter for the payment ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentQuery {
    pub email: Option<String>,
}

/// Settlement endpoint query string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettleQuery {
    pub session_id: String,
}

/// A booking together with its assignment patch, as stored by the repository
/// when a decorator accepts the work.
#[derive(Debug, Clone)]
pub struct DecoratorAssignment {
    pub decorator_name: String,
    pub decorator_email: String,
    pub decorator_status: String,
    pub ratings: f64,
}

/// Result of an atomic settlement write.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub payment: Payment,
    /// The booking after the settlement write; None when the insert lost a
    /// settlement race and the existing ledger row was returned instead
    pub booking: Option<Booking>,
    /// True when a concurrent settlement beat this one to the insert
    pub duplicate: bool,
}
