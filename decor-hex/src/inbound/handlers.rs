//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use decor_types::{
    AppError, AssignDecoratorRequest, BookingId, BookingQuery, CheckoutProvider,
    CreateBookingRequest, CreateCheckoutSessionRequest, CreateListingRequest, DecoratorQuery,
    ListingId, ListingQuery, MarketplaceRepository, PaymentQuery, RegisterUserRequest,
    RoleResponse, SettleQuery, UpdateBookingRequest, UpdateDeliveryStatusRequest,
    UpdateListingRequest, UpdateRoleRequest, UpdateStatusRequest, UserId, UserQuery,
};

use crate::MarketplaceService;

/// Application state shared across handlers.
pub struct AppState<R: MarketplaceRepository, P: CheckoutProvider> {
    pub service: MarketplaceService<R, P>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Provider(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    id.parse()
        .map_err(|_| AppError::Validation("Invalid user ID".into()).into())
}

fn parse_listing_id(id: &str) -> Result<ListingId, ApiError> {
    id.parse()
        .map_err(|_| AppError::Validation("Invalid service ID".into()).into())
}

fn parse_booking_id(id: &str) -> Result<BookingId, ApiError> {
    id.parse()
        .map_err(|_| AppError::Validation("Invalid booking ID".into()).into())
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Login-or-create a user: 201 for a fresh record, 200 for a known email.
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn register_user<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, created) = state.service.register_user(req).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(user)))
}

/// List users with optional role/status filters.
#[tracing::instrument(skip(state))]
pub async fn list_users<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(filter): Query<UserQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.service.list_users(filter).await?;
    Ok(Json(users))
}

/// Look up a user's role by email, defaulting to `user`.
#[tracing::instrument(skip(state), fields(email = %email))]
pub async fn get_user_role<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let role = state.service.user_role(&email).await?;
    Ok(Json(RoleResponse { role }))
}

/// Update a user's role.
#[tracing::instrument(skip(state, req), fields(user_id = %id))]
pub async fn update_user_role<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_user_id(&id)?;
    state.service.update_user_role(user_id, req).await?;
    Ok(Json(
        serde_json::json!({ "message": "Role updated successfully" }),
    ))
}

/// Update a decorator's approval status.
#[tracing::instrument(skip(state, req), fields(user_id = %id))]
pub async fn update_user_status<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_user_id(&id)?;
    state.service.update_user_status(user_id, req).await?;
    Ok(Json(
        serde_json::json!({ "message": "Status updated successfully" }),
    ))
}

/// Delete a user.
#[tracing::instrument(skip(state), fields(user_id = %id))]
pub async fn delete_user<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_user_id(&id)?;
    state.service.delete_user(user_id).await?;
    Ok(Json(
        serde_json::json!({ "message": "User deleted successfully" }),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Publish a service listing.
#[tracing::instrument(skip(state, req), fields(service_name = %req.service_name))]
pub async fn create_listing<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Json(req): Json<CreateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state.service.create_listing(req).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Browse the catalog with optional search/category/budget filters.
#[tracing::instrument(skip(state))]
pub async fn list_listings<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(filter): Query<ListingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let listings = state.service.list_listings(filter).await?;
    Ok(Json(listings))
}

/// Get a listing by id.
#[tracing::instrument(skip(state), fields(service_id = %id))]
pub async fn get_listing<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let listing_id = parse_listing_id(&id)?;
    let listing = state.service.get_listing(listing_id).await?;
    Ok(Json(listing))
}

/// Patch a listing.
#[tracing::instrument(skip(state, patch), fields(service_id = %id))]
pub async fn update_listing<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
    Json(patch): Json<UpdateListingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let listing_id = parse_listing_id(&id)?;
    state.service.update_listing(listing_id, patch).await?;
    Ok(Json(
        serde_json::json!({ "message": "Service updated successfully" }),
    ))
}

/// Delete a listing.
#[tracing::instrument(skip(state), fields(service_id = %id))]
pub async fn delete_listing<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let listing_id = parse_listing_id(&id)?;
    state.service.delete_listing(listing_id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Service deleted successfully" }),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Bookings
// ─────────────────────────────────────────────────────────────────────────────

/// Place a booking.
#[tracing::instrument(skip(state, req), fields(email = %req.user_email))]
pub async fn create_booking<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.service.create_booking(req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// List bookings, most recent first.
#[tracing::instrument(skip(state))]
pub async fn list_bookings<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(filter): Query<BookingQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.service.list_bookings(filter).await?;
    Ok(Json(bookings))
}

/// Assign a decorator to a booking.
#[tracing::instrument(skip(state, req), fields(booking_id = %id, decorator = %req.decorator_email))]
pub async fn assign_decorator<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
    Json(req): Json<AssignDecoratorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state.service.assign_decorator(booking_id, req).await?;
    Ok(Json(booking))
}

/// Move a booking along its delivery lifecycle.
#[tracing::instrument(skip(state, req), fields(booking_id = %id))]
pub async fn update_delivery_status<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDeliveryStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state.service.update_delivery_status(booking_id, req).await?;
    Ok(Json(booking))
}

/// Patch a booking.
#[tracing::instrument(skip(state, patch), fields(booking_id = %id))]
pub async fn update_booking<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
    Json(patch): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    state.service.update_booking(booking_id, patch).await?;
    Ok(Json(
        serde_json::json!({ "message": "Booking updated successfully" }),
    ))
}

/// Delete a booking.
#[tracing::instrument(skip(state), fields(booking_id = %id))]
pub async fn delete_booking<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    state.service.delete_booking(booking_id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Booking deleted successfully" }),
    ))
}

/// List a decorator's assigned bookings.
#[tracing::instrument(skip(state))]
pub async fn list_decorator_bookings<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(filter): Query<DecoratorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.service.decorator_bookings(filter).await?;
    Ok(Json(bookings))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────────────────────────

/// Open a hosted checkout session, returning the redirect URL.
#[tracing::instrument(skip(state, req), fields(booking_id = %req.booking_id))]
pub async fn create_checkout_session<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Json(req): Json<CreateCheckoutSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.service.create_checkout_session(req).await?;
    Ok(Json(session))
}

/// Settle a completed checkout session. Idempotent per transaction id.
#[tracing::instrument(skip(state), fields(session_id = %query.session_id))]
pub async fn settle_payment<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(query): Query<SettleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.service.settle_payment(&query.session_id).await?;
    Ok(Json(result))
}

/// List the payment ledger.
#[tracing::instrument(skip(state))]
pub async fn list_payments<R: MarketplaceRepository, P: CheckoutProvider>(
    State(state): State<Arc<AppState<R, P>>>,
    Query(filter): Query<PaymentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = state.service.list_payments(filter).await?;
    Ok(Json(payments))
}
