//! Booking domain model and delivery lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::tracking::TrackingId;
use crate::error::DomainError;

/// Rating attached to a booking when a decorator is assigned.
pub const DECORATOR_RATING_PLACEHOLDER: f64 = 4.8;

/// Unique identifier for a Booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random BookingId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a BookingId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Delivery lifecycle of a booking.
///
/// The recognized states and their allowed transitions:
///
/// - `assigned` -> `materials-prepared` | `planning-phase` | `cancelled`
/// - `materials-prepared` -> `planning-phase` | `cancelled`
/// - `planning-phase` -> `in-progress` | `cancelled`
/// - `in-progress` -> `completed` | `cancelled`
/// - `completed`, `cancelled` -> terminal
///
/// `planning-phase` is reachable from `assigned` directly because payment
/// may be confirmed before a decorator is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    /// Initial state at booking creation
    Assigned,
    /// A decorator accepted the booking
    MaterialsPrepared,
    /// Payment confirmed
    PlanningPhase,
    InProgress,
    Completed,
    Cancelled,
}

impl DeliveryStatus {
    /// Whether this status may move to `next`.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        match (self, next) {
            (Assigned, MaterialsPrepared) => true,
            (Assigned, PlanningPhase) => true,
            (MaterialsPrepared, PlanningPhase) => true,
            (PlanningPhase, InProgress) => true,
            (InProgress, Completed) => true,
            (Completed, _) | (Cancelled, _) => false,
            (_, Cancelled) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Completed | DeliveryStatus::Cancelled)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Assigned => "assigned",
            DeliveryStatus::MaterialsPrepared => "materials-prepared",
            DeliveryStatus::PlanningPhase => "planning-phase",
            DeliveryStatus::InProgress => "in-progress",
            DeliveryStatus::Completed => "completed",
            DeliveryStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(DeliveryStatus::Assigned),
            "materials-prepared" => Ok(DeliveryStatus::MaterialsPrepared),
            "planning-phase" => Ok(DeliveryStatus::PlanningPhase),
            "in-progress" => Ok(DeliveryStatus::InProgress),
            "completed" => Ok(DeliveryStatus::Completed),
            "cancelled" => Ok(DeliveryStatus::Cancelled),
            other => Err(format!("Unknown delivery status: {}", other)),
        }
    }
}

/// Payment state recorded on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Paid,
    Unpaid,
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Paid => write!(f, "paid"),
            PaymentState::Unpaid => write!(f, "unpaid"),
        }
    }
}

impl std::str::FromStr for PaymentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentState::Paid),
            "unpaid" => Ok(PaymentState::Unpaid),
            other => Err(format!("Unknown payment state: {}", other)),
        }
    }
}

/// A customer's request for a decoration service, tracked through its
/// delivery lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Unique identifier
    pub id: BookingId,
    pub user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorator_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorator_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorator_status: Option<String>,
    /// Display identifier, distinct from the storage id
    pub tracking_id: TrackingId,
    pub delivery_status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<f64>,
    /// When the booking was placed
    pub date: DateTime<Utc>,
}

impl Booking {
    /// Creates a new booking in the `assigned` state.
    ///
    /// # Validation
    /// - Customer email cannot be empty
    pub fn new(
        user_email: String,
        tracking_id: TrackingId,
        date: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        if user_email.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Customer email cannot be empty".into(),
            ));
        }

        Ok(Self {
            id: BookingId::new(),
            user_email,
            decorator_email: None,
            decorator_name: None,
            decorator_status: None,
            tracking_id,
            delivery_status: DeliveryStatus::Assigned,
            payment_status: None,
            assigned_at: None,
            ratings: None,
            date: date.unwrap_or_else(Utc::now),
        })
    }

    /// Reconstructs a booking from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: BookingId,
        user_email: String,
        decorator_email: Option<String>,
        decorator_name: Option<String>,
        decorator_status: Option<String>,
        tracking_id: TrackingId,
        delivery_status: DeliveryStatus,
        payment_status: Option<PaymentState>,
        assigned_at: Option<DateTime<Utc>>,
        ratings: Option<f64>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_email,
            decorator_email,
            decorator_name,
            decorator_status,
            tracking_id,
            delivery_status,
            payment_status,
            assigned_at,
            ratings,
            date,
        }
    }
}
