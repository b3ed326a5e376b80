//! # Decor Types
//!
//! Domain types and port traits for the decoration booking marketplace.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (User, Listing, Booking, Payment)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Booking, BookingId, DecoratorStatus, DeliveryStatus, Listing, ListingId, Payment, PaymentState,
    TrackingId, User, UserId, UserRole,
};
pub use dto::*;
pub use error::{AppError, DomainError, ProviderError, RepoError};
pub use ports::{
    CheckoutProvider, CheckoutSession, MarketplaceRepository, NewCheckoutSession, ResolvedSession,
    SessionMetadata, SessionPaymentStatus,
};
