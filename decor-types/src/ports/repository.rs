//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory test doubles) implement this trait.

use crate::domain::{
    Booking, BookingId, DecoratorStatus, DeliveryStatus, Listing, ListingId, Payment, User, UserId,
    UserRole,
};
use crate::dto::{
    BookingQuery, DecoratorAssignment, ListingQuery, SettlementOutcome, UpdateBookingRequest,
    UpdateListingRequest, UserQuery,
};
use crate::error::RepoError;

/// The main repository port for marketplace state.
///
/// Single-record reads return `Option`; mutations of a missing record return
/// `RepoError::NotFound`. `record_settlement` MUST be atomic: the booking
/// update and the ledger insert happen in one database transaction, and a
/// unique-violation on the transaction id is reported as a duplicate
/// outcome, never as a hard failure.
#[async_trait::async_trait]
pub trait MarketplaceRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a new user record.
    async fn insert_user(&self, user: User) -> Result<User, RepoError>;

    /// Finds a user by email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Lists users matching the filter.
    async fn list_users(&self, filter: &UserQuery) -> Result<Vec<User>, RepoError>;

    /// Overwrites a user's role.
    async fn update_user_role(&self, id: UserId, role: UserRole) -> Result<(), RepoError>;

    /// Overwrites a decorator's approval status.
    async fn update_user_status(
        &self,
        id: UserId,
        status: DecoratorStatus,
    ) -> Result<(), RepoError>;

    /// Deletes a user.
    async fn delete_user(&self, id: UserId) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a new listing.
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, RepoError>;

    /// Gets a listing by id.
    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepoError>;

    /// Lists catalog entries matching the filter.
    async fn list_listings(&self, filter: &ListingQuery) -> Result<Vec<Listing>, RepoError>;

    /// Applies a partial update to a listing.
    async fn update_listing(
        &self,
        id: ListingId,
        patch: UpdateListingRequest,
    ) -> Result<(), RepoError>;

    /// Deletes a listing.
    async fn delete_listing(&self, id: ListingId) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────
    // Bookings
    // ─────────────────────────────────────────────────────────────────────────

    /// Inserts a new booking. A tracking-id collision surfaces as
    /// `RepoError::Conflict` so the caller can regenerate and retry.
    async fn insert_booking(&self, booking: Booking) -> Result<Booking, RepoError>;

    /// Gets a booking by id.
    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, RepoError>;

    /// Lists bookings matching the filter, most recent first.
    async fn list_bookings(&self, filter: &BookingQuery) -> Result<Vec<Booking>, RepoError>;

    /// Attaches a decorator and moves the booking to materials-prepared.
    async fn assign_decorator(
        &self,
        id: BookingId,
        assignment: DecoratorAssignment,
    ) -> Result<Booking, RepoError>;

    /// Moves a booking along its delivery lifecycle. The transition is
    /// validated against the current status inside the store transaction.
    async fn update_delivery_status(
        &self,
        id: BookingId,
        status: DeliveryStatus,
    ) -> Result<Booking, RepoError>;

    /// Applies a partial update to a booking.
    async fn update_booking(
        &self,
        id: BookingId,
        patch: UpdateBookingRequest,
    ) -> Result<(), RepoError>;

    /// Deletes a booking.
    async fn delete_booking(&self, id: BookingId) -> Result<(), RepoError>;

    // ─────────────────────────────────────────────────────────────────────────
    // Payment ledger (settlement MUST be atomic)
    // ─────────────────────────────────────────────────────────────────────────

    /// Finds a ledger record by external transaction id.
    async fn find_payment(&self, transaction_id: &str) -> Result<Option<Payment>, RepoError>;

    /// Atomically marks the referenced booking paid (delivery status
    /// planning-phase) and inserts the ledger record. Returns NotFound when
    /// the booking does not exist; nothing is written in that case.
    async fn record_settlement(&self, payment: Payment) -> Result<SettlementOutcome, RepoError>;

    /// Lists ledger records, newest first, optionally for one customer.
    async fn list_payments(&self, email: Option<&str>) -> Result<Vec<Payment>, RepoError>;
}
