//! Marketplace Application Service
//!
//! Orchestrates domain operations through the repository and checkout ports.
//! Contains NO infrastructure logic - pure business orchestration.

use decor_types::domain::booking::DECORATOR_RATING_PLACEHOLDER;
use decor_types::{
    AppError, AssignDecoratorRequest, Booking, BookingId, BookingQuery, CheckoutProvider,
    CheckoutSessionResponse, CreateBookingRequest, CreateCheckoutSessionRequest,
    CreateListingRequest, DecoratorAssignment, DecoratorQuery, Listing, ListingId, ListingQuery,
    MarketplaceRepository, NewCheckoutSession, Payment, PaymentQuery, RegisterUserRequest,
    RepoError, SessionMetadata, SessionPaymentStatus, SettlementResponse, TrackingId,
    UpdateBookingRequest, UpdateDeliveryStatusRequest, UpdateListingRequest, UpdateRoleRequest,
    UpdateStatusRequest, User, UserId, UserQuery, UserRole,
};

/// Currency every checkout session is denominated in. The provider reports
/// the settled currency back and the ledger stores whatever it says.
const CHECKOUT_CURRENCY: &str = "usd";

/// How many times booking creation retries a colliding tracking id before
/// giving up.
const TRACKING_ID_RETRIES: u32 = 3;

/// Application service for the booking marketplace.
///
/// Generic over `R: MarketplaceRepository` and `P: CheckoutProvider` - the
/// adapters are injected at compile time. This enables:
/// - Swapping the store without code changes
/// - Testing with an in-memory repo and a sandbox provider
/// - Compile-time checks for port implementations
pub struct MarketplaceService<R: MarketplaceRepository, P: CheckoutProvider> {
    repo: R,
    checkout: P,
}

impl<R: MarketplaceRepository, P: CheckoutProvider> MarketplaceService<R, P> {
    /// Creates a new service with the given repository and checkout provider.
    pub fn new(repo: R, checkout: P) -> Self {
        Self { repo, checkout }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// Login-or-create: a known email returns the stored record untouched,
    /// a new one is inserted with the default role rules applied.
    ///
    /// Returns the record and whether it was created by this call.
    pub async fn register_user(&self, req: RegisterUserRequest) -> Result<(User, bool), AppError> {
        if let Some(existing) = self.repo.find_user_by_email(&req.email).await? {
            return Ok((existing, false));
        }

        let user = User::new(req.email.clone(), req.name, req.role.unwrap_or_default())?;

        match self.repo.insert_user(user).await {
            Ok(created) => Ok((created, true)),
            // Lost a concurrent registration for the same email; the winner's
            // record is the answer either way.
            Err(RepoError::Conflict(_)) => {
                let existing = self
                    .repo
                    .find_user_by_email(&req.email)
                    .await?
                    .ok_or_else(|| AppError::Internal("registration race lost twice".into()))?;
                Ok((existing, false))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Lists users matching the filter.
    pub async fn list_users(&self, filter: UserQuery) -> Result<Vec<User>, AppError> {
        self.repo.list_users(&filter).await.map_err(Into::into)
    }

    /// Looks up a user's role by email, defaulting to `user` when unknown.
    pub async fn user_role(&self, email: &str) -> Result<UserRole, AppError> {
        let user = self.repo.find_user_by_email(email).await?;
        Ok(user.map(|u| u.role).unwrap_or_default())
    }

    /// Overwrites a user's role.
    pub async fn update_user_role(
        &self,
        id: UserId,
        req: UpdateRoleRequest,
    ) -> Result<(), AppError> {
        let role = req
            .role
            .ok_or_else(|| AppError::Validation("Role is required".into()))?;

        self.repo
            .update_user_role(id, role)
            .await
            .map_err(Into::into)
    }

    /// Overwrites a decorator's approval status.
    pub async fn update_user_status(
        &self,
        id: UserId,
        req: UpdateStatusRequest,
    ) -> Result<(), AppError> {
        let status = req
            .status
            .ok_or_else(|| AppError::Validation("Status is required".into()))?;

        self.repo
            .update_user_status(id, status)
            .await
            .map_err(Into::into)
    }

    /// Deletes a user.
    pub async fn delete_user(&self, id: UserId) -> Result<(), AppError> {
        self.repo.delete_user(id).await.map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    /// Publishes a new service listing.
    pub async fn create_listing(&self, req: CreateListingRequest) -> Result<Listing, AppError> {
        let listing = Listing::new(req.service_name, req.category, req.cost)?;
        self.repo.insert_listing(listing).await.map_err(Into::into)
    }

    /// Gets a listing by id.
    pub async fn get_listing(&self, id: ListingId) -> Result<Listing, AppError> {
        self.repo
            .get_listing(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Service {}", id))))
    }

    /// Lists catalog entries matching the filter.
    pub async fn list_listings(&self, filter: ListingQuery) -> Result<Vec<Listing>, AppError> {
        self.repo.list_listings(&filter).await.map_err(Into::into)
    }

    /// Applies a partial update to a listing.
    pub async fn update_listing(
        &self,
        id: ListingId,
        patch: UpdateListingRequest,
    ) -> Result<(), AppError> {
        if let Some(cost) = patch.cost {
            if cost < 0.0 {
                return Err(AppError::Validation("Cost cannot be negative".into()));
            }
        }
        self.repo
            .update_listing(id, patch)
            .await
            .map_err(Into::into)
    }

    /// Deletes a listing.
    pub async fn delete_listing(&self, id: ListingId) -> Result<(), AppError> {
        self.repo.delete_listing(id).await.map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bookings
    // ─────────────────────────────────────────────────────────────────────────

    /// Places a booking in the `assigned` state with a fresh tracking id.
    ///
    /// A tracking-id collision regenerates and retries a bounded number of
    /// times; the UNIQUE index in the store makes the id trustworthy for
    /// display without widening its format.
    pub async fn create_booking(&self, req: CreateBookingRequest) -> Result<Booking, AppError> {
        let mut last_conflict = None;

        for _ in 0..TRACKING_ID_RETRIES {
            let booking =
                Booking::new(req.user_email.clone(), TrackingId::generate(), req.date)?;

            match self.repo.insert_booking(booking).await {
                Ok(created) => return Ok(created),
                Err(RepoError::Conflict(msg)) => {
                    last_conflict = Some(msg);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal(format!(
            "could not allocate a unique tracking id: {}",
            last_conflict.unwrap_or_default()
        )))
    }

    /// Lists bookings matching the filter, most recent first.
    pub async fn list_bookings(&self, filter: BookingQuery) -> Result<Vec<Booking>, AppError> {
        self.repo.list_bookings(&filter).await.map_err(Into::into)
    }

    /// Lists the bookings assigned to a decorator.
    pub async fn decorator_bookings(
        &self,
        filter: DecoratorQuery,
    ) -> Result<Vec<Booking>, AppError> {
        let query = BookingQuery {
            decorator_email: filter.decorator_email,
            ..Default::default()
        };
        self.repo.list_bookings(&query).await.map_err(Into::into)
    }

    /// Attaches a decorator to a booking and moves it to materials-prepared.
    pub async fn assign_decorator(
        &self,
        id: BookingId,
        req: AssignDecoratorRequest,
    ) -> Result<Booking, AppError> {
        if req.decorator_email.trim().is_empty() {
            return Err(AppError::Validation(
                "Decorator email cannot be empty".into(),
            ));
        }

        let assignment = DecoratorAssignment {
            decorator_name: req.decorator_name,
            decorator_email: req.decorator_email,
            decorator_status: req
                .decorator_status
                .unwrap_or_else(|| "accepted".to_string()),
            ratings: DECORATOR_RATING_PLACEHOLDER,
        };

        self.repo
            .assign_decorator(id, assignment)
            .await
            .map_err(Into::into)
    }

    /// Moves a booking along its delivery lifecycle.
    pub async fn update_delivery_status(
        &self,
        id: BookingId,
        req: UpdateDeliveryStatusRequest,
    ) -> Result<Booking, AppError> {
        let status = req
            .status
            .ok_or_else(|| AppError::Validation("Status is required".into()))?;

        self.repo
            .update_delivery_status(id, status)
            .await
            .map_err(Into::into)
    }

    /// Applies a partial update to a booking.
    pub async fn update_booking(
        &self,
        id: BookingId,
        patch: UpdateBookingRequest,
    ) -> Result<(), AppError> {
        self.repo
            .update_booking(id, patch)
            .await
            .map_err(Into::into)
    }

    /// Deletes a booking.
    pub async fn delete_booking(&self, id: BookingId) -> Result<(), AppError> {
        self.repo.delete_booking(id).await.map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────

    /// Opens a hosted checkout session for a booking and returns the
    /// redirect URL. No local state is mutated.
    pub async fn create_checkout_session(
        &self,
        req: CreateCheckoutSessionRequest,
    ) -> Result<CheckoutSessionResponse, AppError> {
        if req.cost < 0.0 {
            return Err(AppError::Validation("Cost cannot be negative".into()));
        }

        // Providers bill in minor units; fractional sub-cent amounts are
        // truncated, not rounded.
        let amount_minor = (req.cost * 100.0).trunc() as i64;

        let session = self
            .checkout
            .create_session(NewCheckoutSession {
                amount_minor,
                currency: CHECKOUT_CURRENCY.to_string(),
                customer_email: req.email,
                metadata: SessionMetadata {
                    booking_id: req.booking_id.to_string(),
                    tracking_id: req.tracking_id,
                    item_name: req.service_name,
                },
            })
            .await?;

        Ok(CheckoutSessionResponse { url: session.url })
    }

    /// Confirms an external checkout session and records it exactly once.
    ///
    /// Settlement is idempotent per transaction id: retries, refreshes and
    /// webhook replays all land on the first recorded outcome.
    pub async fn settle_payment(&self, session_id: &str) -> Result<SettlementResponse, AppError> {
        let session = self.checkout.resolve_session(session_id).await?;

        // Idempotency guard: a known transaction id means this settlement
        // already happened; nothing is re-applied.
        if let Some(existing) = self.repo.find_payment(&session.transaction_id).await? {
            return Ok(SettlementResponse {
                success: true,
                already_settled: true,
                booking_updated: false,
                transaction_id: existing.transaction_id.clone(),
                tracking_id: Some(existing.tracking_id.to_string()),
                payment: Some(existing),
                message: "Payment already recorded".into(),
            });
        }

        if session.status != SessionPaymentStatus::Paid {
            return Ok(SettlementResponse {
                success: false,
                already_settled: false,
                booking_updated: false,
                transaction_id: session.transaction_id,
                tracking_id: Some(session.metadata.tracking_id),
                payment: None,
                message: "Checkout session is not paid".into(),
            });
        }

        let booking_id: BookingId = session.metadata.booking_id.parse().map_err(|_| {
            AppError::Validation(format!(
                "Malformed booking id in session metadata: {}",
                session.metadata.booking_id
            ))
        })?;

        let payment = Payment::settled(
            session.transaction_id,
            booking_id,
            TrackingId::from_string(session.metadata.tracking_id),
            session.amount_minor,
            session.currency,
            session.customer_email,
        );

        let outcome = self.repo.record_settlement(payment).await?;

        let message = if outcome.duplicate {
            "Payment already recorded".to_string()
        } else {
            "Payment recorded successfully".to_string()
        };

        Ok(SettlementResponse {
            success: true,
            already_settled: outcome.duplicate,
            booking_updated: outcome.booking.is_some(),
            transaction_id: outcome.payment.transaction_id.clone(),
            tracking_id: Some(outcome.payment.tracking_id.to_string()),
            payment: Some(outcome.payment),
            message,
        })
    }

    /// Lists ledger records, newest first.
    pub async fn list_payments(&self, filter: PaymentQuery) -> Result<Vec<Payment>, AppError> {
        self.repo
            .list_payments(filter.email.as_deref())
            .await
            .map_err(Into::into)
    }
}
