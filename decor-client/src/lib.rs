//! # Decor Client SDK
//!
//! A typed Rust client for the booking marketplace API.

use reqwest::Client;
use serde::de::DeserializeOwned;

use decor_types::{
    AssignDecoratorRequest, Booking, BookingId, BookingQuery, CheckoutSessionResponse,
    CreateBookingRequest, CreateCheckoutSessionRequest, CreateListingRequest, DeliveryStatus,
    Listing, ListingId, ListingQuery, Payment, RegisterUserRequest, RoleResponse,
    SettlementResponse, UpdateDeliveryStatusRequest, UpdateRoleRequest, User, UserId, UserRole,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Marketplace API client.
pub struct DecorClient {
    base_url: String,
    http: Client,
}

impl DecorClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers (or logs in) a user by email.
    pub async fn register_user(
        &self,
        email: &str,
        name: Option<String>,
        role: Option<UserRole>,
    ) -> Result<User, ClientError> {
        let req = RegisterUserRequest {
            email: email.to_string(),
            name,
            role,
        };
        self.post("/users", &req).await
    }

    /// Lists all users.
    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        self.get("/users").await
    }

    /// Looks up a user's role by email.
    pub async fn user_role(&self, email: &str) -> Result<UserRole, ClientError> {
        let resp: RoleResponse = self.get(&format!("/users/{}/role", email)).await?;
        Ok(resp.role)
    }

    /// Changes a user's role.
    pub async fn update_user_role(
        &self,
        id: UserId,
        role: UserRole,
    ) -> Result<serde_json::Value, ClientError> {
        let req = UpdateRoleRequest { role: Some(role) };
        self.patch(&format!("/users/{}", id), &req).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    /// Publishes a service listing.
    pub async fn create_listing(
        &self,
        service_name: &str,
        category: &str,
        cost: f64,
    ) -> Result<Listing, ClientError> {
        let req = CreateListingRequest {
            service_name: service_name.to_string(),
            category: category.to_string(),
            cost,
        };
        self.post("/services", &req).await
    }

    /// Browses the catalog.
    pub async fn list_listings(&self, filter: &ListingQuery) -> Result<Vec<Listing>, ClientError> {
        self.get_with_query("/services", filter).await
    }

    /// Gets a listing by id.
    pub async fn get_listing(&self, id: ListingId) -> Result<Listing, ClientError> {
        self.get(&format!("/services/{}", id)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bookings
    // ─────────────────────────────────────────────────────────────────────────

    /// Places a booking for a customer.
    pub async fn create_booking(&self, user_email: &str) -> Result<Booking, ClientError> {
        let req = CreateBookingRequest {
            user_email: user_email.to_string(),
            date: None,
        };
        self.post("/bookings", &req).await
    }

    /// Lists bookings, most recent first.
    pub async fn list_bookings(&self, filter: &BookingQuery) -> Result<Vec<Booking>, ClientError> {
        self.get_with_query("/bookings", filter).await
    }

    /// Assigns a decorator to a booking.
    pub async fn assign_decorator(
        &self,
        booking_id: BookingId,
        decorator_name: &str,
        decorator_email: &str,
    ) -> Result<Booking, ClientError> {
        let req = AssignDecoratorRequest {
            decorator_name: decorator_name.to_string(),
            decorator_email: decorator_email.to_string(),
            decorator_status: None,
        };
        self.patch(&format!("/bookings/{}/role", booking_id), &req)
            .await
    }

    /// Moves a booking along its delivery lifecycle.
    pub async fn update_delivery_status(
        &self,
        booking_id: BookingId,
        status: DeliveryStatus,
    ) -> Result<Booking, ClientError> {
        let req = UpdateDeliveryStatusRequest {
            status: Some(status),
        };
        self.patch(&format!("/bookings/{}/status", booking_id), &req)
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────

    /// Opens a hosted checkout session for a booking.
    pub async fn create_checkout_session(
        &self,
        req: &CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSessionResponse, ClientError> {
        self.post("/payment-checkout-session", req).await
    }

    /// Settles a completed checkout session.
    pub async fn settle_payment(
        &self,
        session_id: &str,
    ) -> Result<SettlementResponse, ClientError> {
        let resp = self
            .http
            .patch(format!(
                "{}/payment-success?session_id={}",
                self.base_url, session_id
            ))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    /// Lists the payment ledger, optionally for one customer.
    pub async fn list_payments(&self, email: Option<&str>) -> Result<Vec<Payment>, ClientError> {
        match email {
            Some(email) => self.get(&format!("/payments?email={}", email)).await,
            None => self.get("/payments").await,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plumbing
    // ─────────────────────────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: serde::Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self
            .http
            .patch(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DecorClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = DecorClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }
}
