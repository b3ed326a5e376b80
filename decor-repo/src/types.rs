//! Shared database types with feature-gated fields for SQLite and PostgreSQL.

use sqlx::FromRow;

use decor_types::{
    Booking, BookingId, DecoratorStatus, DeliveryStatus, Listing, ListingId, Payment, PaymentState,
    RepoError, TrackingId, User, UserId, UserRole,
};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(feature = "sqlite"))]
use chrono::{DateTime, Utc};
#[cfg(not(feature = "sqlite"))]
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// User row from database.
#[derive(FromRow)]
pub struct DbUser {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub status: Option<String>,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

/// Listing row from database.
#[derive(FromRow)]
pub struct DbListing {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    pub service_name: String,
    pub category: String,
    pub cost: f64,
    pub tracking_id: String,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

/// Booking row from database.
#[derive(FromRow)]
pub struct DbBooking {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    pub user_email: String,
    pub decorator_email: Option<String>,
    pub decorator_name: Option<String>,
    pub decorator_status: Option<String>,
    pub tracking_id: String,
    pub delivery_status: String,
    pub payment_status: Option<String>,

    #[cfg(not(feature = "sqlite"))]
    pub assigned_at: Option<DateTime<Utc>>,
    #[cfg(feature = "sqlite")]
    pub assigned_at: Option<String>,

    pub ratings: Option<f64>,

    #[cfg(not(feature = "sqlite"))]
    pub booked_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub booked_at: String,
}

/// Payment row from database.
#[derive(FromRow)]
pub struct DbPayment {
    pub transaction_id: String,

    #[cfg(not(feature = "sqlite"))]
    pub booking_id: Uuid,
    #[cfg(feature = "sqlite")]
    pub booking_id: String,

    pub tracking_id: String,
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub payment_status: String,

    #[cfg(not(feature = "sqlite"))]
    pub paid_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub paid_at: String,
}

/// Delivery-status-only row for transition checks.
#[derive(FromRow)]
pub struct DbDeliveryStatus {
    pub delivery_status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

pub fn parse_role(s: &str) -> Result<UserRole, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown role: {}", s)))
}

pub fn parse_decorator_status(s: &str) -> Result<DecoratorStatus, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown decorator status: {}", s)))
}

pub fn parse_delivery_status(s: &str) -> Result<DeliveryStatus, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown delivery status: {}", s)))
}

pub fn parse_payment_state(s: &str) -> Result<PaymentState, RepoError> {
    s.parse()
        .map_err(|_| RepoError::Database(format!("Unknown payment state: {}", s)))
}

#[cfg(feature = "sqlite")]
fn parse_uuid(s: &str) -> Result<uuid::Uuid, RepoError> {
    uuid::Uuid::parse_str(s).map_err(|e| RepoError::Database(e.to_string()))
}

#[cfg(feature = "sqlite")]
fn parse_datetime(s: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| RepoError::Database(e.to_string()))
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion (feature-gated implementations)
// ─────────────────────────────────────────────────────────────────────────────

impl DbUser {
    /// Convert database row to domain User.
    pub fn into_domain(self) -> Result<User, RepoError> {
        let role = parse_role(&self.role)?;
        let status = self
            .status
            .as_deref()
            .map(parse_decorator_status)
            .transpose()?;

        #[cfg(not(feature = "sqlite"))]
        let (id, created_at) = (UserId::from_uuid(self.id), self.created_at);

        #[cfg(feature = "sqlite")]
        let (id, created_at) = (
            UserId::from_uuid(parse_uuid(&self.id)?),
            parse_datetime(&self.created_at)?,
        );

        Ok(User::from_parts(
            id, self.email, self.name, role, status, created_at,
        ))
    }
}

impl DbListing {
    /// Convert database row to domain Listing.
    pub fn into_domain(self) -> Result<Listing, RepoError> {
        #[cfg(not(feature = "sqlite"))]
        let (id, created_at) = (ListingId::from_uuid(self.id), self.created_at);

        #[cfg(feature = "sqlite")]
        let (id, created_at) = (
            ListingId::from_uuid(parse_uuid(&self.id)?),
            parse_datetime(&self.created_at)?,
        );

        Ok(Listing::from_parts(
            id,
            self.service_name,
            self.category,
            self.cost,
            TrackingId::from_string(self.tracking_id),
            created_at,
        ))
    }
}

impl DbBooking {
    /// Convert database row to domain Booking.
    pub fn into_domain(self) -> Result<Booking, RepoError> {
        let delivery_status = parse_delivery_status(&self.delivery_status)?;
        let payment_status = self
            .payment_status
            .as_deref()
            .map(parse_payment_state)
            .transpose()?;

        #[cfg(not(feature = "sqlite"))]
        let (id, assigned_at, booked_at) =
            (BookingId::from_uuid(self.id), self.assigned_at, self.booked_at);

        #[cfg(feature = "sqlite")]
        let (id, assigned_at, booked_at) = (
            BookingId::from_uuid(parse_uuid(&self.id)?),
            self.assigned_at.as_deref().map(parse_datetime).transpose()?,
            parse_datetime(&self.booked_at)?,
        );

        Ok(Booking::from_parts(
            id,
            self.user_email,
            self.decorator_email,
            self.decorator_name,
            self.decorator_status,
            TrackingId::from_string(self.tracking_id),
            delivery_status,
            payment_status,
            assigned_at,
            self.ratings,
            booked_at,
        ))
    }
}

impl DbPayment {
    /// Convert database row to domain Payment.
    pub fn into_domain(self) -> Result<Payment, RepoError> {
        let payment_status = parse_payment_state(&self.payment_status)?;

        #[cfg(not(feature = "sqlite"))]
        let (booking_id, paid_at) = (BookingId::from_uuid(self.booking_id), self.paid_at);

        #[cfg(feature = "sqlite")]
        let (booking_id, paid_at) = (
            BookingId::from_uuid(parse_uuid(&self.booking_id)?),
            parse_datetime(&self.paid_at)?,
        );

        Ok(Payment::from_parts(
            self.transaction_id,
            booking_id,
            TrackingId::from_string(self.tracking_id),
            self.amount,
            self.currency,
            self.customer_email,
            payment_status,
            paid_at,
        ))
    }
}
