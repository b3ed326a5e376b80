//! Domain models for the booking marketplace.

pub mod booking;
pub mod listing;
pub mod payment;
pub mod tracking;
pub mod user;

pub use booking::{Booking, BookingId, DeliveryStatus, PaymentState};
pub use listing::{Listing, ListingId};
pub use payment::Payment;
pub use tracking::TrackingId;
pub use user::{DecoratorStatus, User, UserId, UserRole};
