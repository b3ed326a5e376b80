//! # Decor Checkout
//!
//! Adapters for the `CheckoutProvider` port:
//!
//! - [`HostedCheckoutClient`] - reqwest client for a real hosted checkout
//!   provider (Stripe-style session API).
//! - [`SandboxCheckout`] - in-process provider simulation for development
//!   and tests; sessions live in memory and are marked paid explicitly.
//!
//! Both adapters speak the same port, so the application layer cannot tell
//! them apart.

mod client;
mod sandbox;

pub use client::HostedCheckoutClient;
pub use sandbox::SandboxCheckout;
