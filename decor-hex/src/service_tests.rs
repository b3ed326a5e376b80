//! MarketplaceService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use decor_checkout::SandboxCheckout;
    use decor_types::{
        AppError, AssignDecoratorRequest, Booking, BookingId, BookingQuery,
        CreateBookingRequest, CreateCheckoutSessionRequest, CreateListingRequest,
        DecoratorAssignment, DecoratorStatus, DeliveryStatus, DomainError, Listing, ListingId,
        ListingQuery, MarketplaceRepository, Payment, PaymentQuery, PaymentState,
        RegisterUserRequest, RepoError, SettlementOutcome, TrackingId, UpdateBookingRequest,
        UpdateDeliveryStatusRequest, UpdateListingRequest, UpdateRoleRequest, User, UserId,
        UserQuery, UserRole,
    };

    use crate::MarketplaceService;

    /// Simple in-memory repository for testing the service layer.
    pub struct MockRepo {
        users: Mutex<Vec<User>>,
        listings: Mutex<Vec<Listing>>,
        bookings: Mutex<Vec<Booking>>,
        payments: Mutex<Vec<Payment>>,
    }

    impl MockRepo {
        pub fn new() -> Self {
            Self {
                users: Mutex::new(Vec::new()),
                listings: Mutex::new(Vec::new()),
                bookings: Mutex::new(Vec::new()),
                payments: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MarketplaceRepository for MockRepo {
        async fn insert_user(&self, user: User) -> Result<User, RepoError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == user.email) {
                return Err(RepoError::Conflict(format!(
                    "User already exists: {}",
                    user.email
                )));
            }
            users.push(user.clone());
            Ok(user)
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn list_users(&self, filter: &UserQuery) -> Result<Vec<User>, RepoError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| filter.role.is_none_or(|r| u.role == r))
                .filter(|u| filter.status.is_none_or(|s| u.status == Some(s)))
                .cloned()
                .collect())
        }

        async fn update_user_role(&self, id: UserId, role: UserRole) -> Result<(), RepoError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(RepoError::NotFound)?;
            user.role = role;
            Ok(())
        }

        async fn update_user_status(
            &self,
            id: UserId,
            status: DecoratorStatus,
        ) -> Result<(), RepoError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or(RepoError::NotFound)?;
            user.status = Some(status);
            Ok(())
        }

        async fn delete_user(&self, id: UserId) -> Result<(), RepoError> {
            let mut users = self.users.lock().unwrap();
            let before = users.len();
            users.retain(|u| u.id != id);
            if users.len() == before {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn insert_listing(&self, listing: Listing) -> Result<Listing, RepoError> {
            self.listings.lock().unwrap().push(listing.clone());
            Ok(listing)
        }

        async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepoError> {
            Ok(self
                .listings
                .lock()
                .unwrap()
                .iter()
                .find(|l| l.id == id)
                .cloned())
        }

        async fn list_listings(&self, filter: &ListingQuery) -> Result<Vec<Listing>, RepoError> {
            Ok(self
                .listings
                .lock()
                .unwrap()
                .iter()
                .filter(|l| {
                    filter.search.as_deref().is_none_or(|s| {
                        l.service_name.to_lowercase().contains(&s.to_lowercase())
                    })
                })
                .filter(|l| filter.category.as_deref().is_none_or(|c| l.category == c))
                .filter(|l| filter.min_budget.is_none_or(|min| l.cost >= min))
                .filter(|l| filter.max_budget.is_none_or(|max| l.cost <= max))
                .cloned()
                .collect())
        }

        async fn update_listing(
            &self,
            id: ListingId,
            patch: UpdateListingRequest,
        ) -> Result<(), RepoError> {
            let mut listings = self.listings.lock().unwrap();
            let listing = listings
                .iter_mut()
                .find(|l| l.id == id)
                .ok_or(RepoError::NotFound)?;
            if let Some(name) = patch.service_name {
                listing.service_name = name;
            }
            if let Some(category) = patch.category {
                listing.category = category;
            }
            if let Some(cost) = patch.cost {
                listing.cost = cost;
            }
            Ok(())
        }

        async fn delete_listing(&self, id: ListingId) -> Result<(), RepoError> {
            let mut listings = self.listings.lock().unwrap();
            let before = listings.len();
            listings.retain(|l| l.id != id);
            if listings.len() == before {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn insert_booking(&self, booking: Booking) -> Result<Booking, RepoError> {
            let mut bookings = self.bookings.lock().unwrap();
            if bookings
                .iter()
                .any(|b| b.tracking_id == booking.tracking_id)
            {
                return Err(RepoError::Conflict(format!(
                    "Tracking id already exists: {}",
                    booking.tracking_id
                )));
            }
            bookings.push(booking.clone());
            Ok(booking)
        }

        async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, RepoError> {
            Ok(self
                .bookings
                .lock()
                .unwrap()
                .iter()
                .find(|b| b.id == id)
                .cloned())
        }

        async fn list_bookings(&self, filter: &BookingQuery) -> Result<Vec<Booking>, RepoError> {
            let mut matched: Vec<Booking> = self
                .bookings
                .lock()
                .unwrap()
                .iter()
                .filter(|b| filter.email.as_deref().is_none_or(|e| b.user_email == e))
                .filter(|b| {
                    filter
                        .decorator_email
                        .as_deref()
                        .is_none_or(|e| b.decorator_email.as_deref() == Some(e))
                })
                .filter(|b| {
                    filter
                        .delivery_status
                        .is_none_or(|s| b.delivery_status == s)
                })
                .cloned()
                .collect();
            matched.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(matched)
        }

        async fn assign_decorator(
            &self,
            id: BookingId,
            assignment: DecoratorAssignment,
        ) -> Result<Booking, RepoError> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or(RepoError::NotFound)?;

            if !booking
                .delivery_status
                .can_transition_to(DeliveryStatus::MaterialsPrepared)
            {
                return Err(RepoError::Domain(DomainError::InvalidTransition {
                    from: booking.delivery_status,
                    to: DeliveryStatus::MaterialsPrepared,
                }));
            }

            booking.decorator_name = Some(assignment.decorator_name);
            booking.decorator_email = Some(assignment.decorator_email);
            booking.decorator_status = Some(assignment.decorator_status);
            booking.delivery_status = DeliveryStatus::MaterialsPrepared;
            booking.assigned_at = Some(chrono::Utc::now());
            booking.ratings = Some(assignment.ratings);
            Ok(booking.clone())
        }

        async fn update_delivery_status(
            &self,
            id: BookingId,
            status: DeliveryStatus,
        ) -> Result<Booking, RepoError> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or(RepoError::NotFound)?;

            if !booking.delivery_status.can_transition_to(status) {
                return Err(RepoError::Domain(DomainError::InvalidTransition {
                    from: booking.delivery_status,
                    to: status,
                }));
            }

            booking.delivery_status = status;
            Ok(booking.clone())
        }

        async fn update_booking(
            &self,
            id: BookingId,
            patch: UpdateBookingRequest,
        ) -> Result<(), RepoError> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or(RepoError::NotFound)?;
            if let Some(date) = patch.date {
                booking.date = date;
            }
            if let Some(ratings) = patch.ratings {
                booking.ratings = Some(ratings);
            }
            Ok(())
        }

        async fn delete_booking(&self, id: BookingId) -> Result<(), RepoError> {
            let mut bookings = self.bookings.lock().unwrap();
            let before = bookings.len();
            bookings.retain(|b| b.id != id);
            if bookings.len() == before {
                return Err(RepoError::NotFound);
            }
            Ok(())
        }

        async fn find_payment(&self, transaction_id: &str) -> Result<Option<Payment>, RepoError> {
            Ok(self
                .payments
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.transaction_id == transaction_id)
                .cloned())
        }

        async fn record_settlement(
            &self,
            payment: Payment,
        ) -> Result<SettlementOutcome, RepoError> {
            if let Some(existing) = self.find_payment(&payment.transaction_id).await? {
                return Ok(SettlementOutcome {
                    payment: existing,
                    booking: None,
                    duplicate: true,
                });
            }

            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == payment.booking_id)
                .ok_or(RepoError::NotFound)?;

            booking.payment_status = Some(PaymentState::Paid);
            booking.delivery_status = DeliveryStatus::PlanningPhase;
            let updated = booking.clone();
            drop(bookings);

            self.payments.lock().unwrap().push(payment.clone());
            Ok(SettlementOutcome {
                payment,
                booking: Some(updated),
                duplicate: false,
            })
        }

        async fn list_payments(&self, email: Option<&str>) -> Result<Vec<Payment>, RepoError> {
            Ok(self
                .payments
                .lock()
                .unwrap()
                .iter()
                .filter(|p| email.is_none_or(|e| p.customer_email == e))
                .cloned()
                .collect())
        }
    }

    fn service() -> (
        MarketplaceService<MockRepo, SandboxCheckout>,
        SandboxCheckout,
    ) {
        let sandbox = SandboxCheckout::new();
        (
            MarketplaceService::new(MockRepo::new(), sandbox.clone()),
            sandbox,
        )
    }

    fn register(email: &str, role: Option<UserRole>) -> RegisterUserRequest {
        RegisterUserRequest {
            email: email.to_string(),
            name: None,
            role,
        }
    }

    async fn place_booking(
        service: &MarketplaceService<MockRepo, SandboxCheckout>,
    ) -> decor_types::Booking {
        service
            .create_booking(CreateBookingRequest {
                user_email: "alice@example.com".to_string(),
                date: None,
            })
            .await
            .unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_register_user_is_login_or_create() {
        let (service, _) = service();

        let (first, created) = service
            .register_user(register("alice@example.com", None))
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.role, UserRole::User);

        let (second, created) = service
            .register_user(register("alice@example.com", Some(UserRole::Admin)))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        // The stored record wins; the second request's role is ignored.
        assert_eq!(second.role, UserRole::User);

        let all = service.list_users(UserQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_decorator_registration_gets_pending_status() {
        let (service, _) = service();

        let (user, _) = service
            .register_user(register("deco@example.com", Some(UserRole::Decorator)))
            .await
            .unwrap();
        assert_eq!(user.status, Some(DecoratorStatus::Pending));

        let (plain, _) = service
            .register_user(register("bob@example.com", Some(UserRole::Rider)))
            .await
            .unwrap();
        assert!(plain.status.is_none());
    }

    #[tokio::test]
    async fn test_unknown_email_defaults_to_user_role() {
        let (service, _) = service();
        let role = service.user_role("nobody@example.com").await.unwrap();
        assert_eq!(role, UserRole::User);
    }

    #[tokio::test]
    async fn test_update_role_requires_role() {
        let (service, _) = service();

        let (user, _) = service
            .register_user(register("alice@example.com", None))
            .await
            .unwrap();

        let result = service
            .update_user_role(user.id, UpdateRoleRequest { role: None })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_listing_generates_tracking_id() {
        let (service, _) = service();

        let listing = service
            .create_listing(CreateListingRequest {
                service_name: "Wedding stage".to_string(),
                category: "wedding".to_string(),
                cost: 450.0,
            })
            .await
            .unwrap();

        assert!(TrackingId::is_well_formed(listing.tracking_id.as_str()));
    }

    #[tokio::test]
    async fn test_get_listing_not_found() {
        let (service, _) = service();
        let result = service.get_listing(ListingId::new()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bookings
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_booking_assigned_with_tracking_id() {
        let (service, _) = service();

        let booking = place_booking(&service).await;

        assert_eq!(booking.delivery_status, DeliveryStatus::Assigned);
        assert!(TrackingId::is_well_formed(booking.tracking_id.as_str()));
    }

    #[tokio::test]
    async fn test_assign_decorator_not_found() {
        let (service, _) = service();

        let result = service
            .assign_decorator(
                BookingId::new(),
                AssignDecoratorRequest {
                    decorator_name: "Mina".to_string(),
                    decorator_email: "mina@example.com".to_string(),
                    decorator_status: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_transition_is_validation_failure() {
        let (service, _) = service();

        let booking = place_booking(&service).await;

        let result = service
            .update_delivery_status(
                booking.id,
                UpdateDeliveryStatusRequest {
                    status: Some(DeliveryStatus::Completed),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_checkout_amount_is_truncated_minor_units() {
        let (service, sandbox) = service();

        let booking = place_booking(&service).await;
        service
            .create_checkout_session(CreateCheckoutSessionRequest {
                booking_id: booking.id,
                tracking_id: booking.tracking_id.to_string(),
                cost: 123.456,
                email: booking.user_email.clone(),
                service_name: "Wedding stage".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(sandbox.session_count(), 1);
        // 123.456 * 100 truncates to 12345, never rounds to 12346.
        let session_id = sandbox_session_id(&sandbox);
        let resolved = resolve(&sandbox, &session_id).await;
        assert_eq!(resolved.amount_minor, 12345);
    }

    #[tokio::test]
    async fn test_settle_unpaid_session_mutates_nothing() {
        let (service, sandbox) = service();

        let booking = place_booking(&service).await;
        service
            .create_checkout_session(checkout_req(&booking))
            .await
            .unwrap();
        let session_id = sandbox_session_id(&sandbox);

        let result = service.settle_payment(&session_id).await.unwrap();

        assert!(!result.success);
        assert!(!result.booking_updated);
        let stored = service.repo().get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.delivery_status, DeliveryStatus::Assigned);
        assert!(stored.payment_status.is_none());
    }

    #[tokio::test]
    async fn test_settle_paid_session_then_resettle_is_idempotent() {
        let (service, sandbox) = service();

        let booking = place_booking(&service).await;
        service
            .create_checkout_session(checkout_req(&booking))
            .await
            .unwrap();
        let session_id = sandbox_session_id(&sandbox);
        sandbox.mark_paid(&session_id).unwrap();

        let first = service.settle_payment(&session_id).await.unwrap();
        assert!(first.success);
        assert!(!first.already_settled);
        assert!(first.booking_updated);
        assert_eq!(
            first.tracking_id.as_deref(),
            Some(booking.tracking_id.as_str())
        );

        let stored = service.repo().get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.delivery_status, DeliveryStatus::PlanningPhase);
        assert_eq!(stored.payment_status, Some(PaymentState::Paid));

        // Second settlement of the same session: same tracking id back, no
        // new ledger row, no further booking mutation.
        let second = service.settle_payment(&session_id).await.unwrap();
        assert!(second.success);
        assert!(second.already_settled);
        assert!(!second.booking_updated);
        assert_eq!(second.tracking_id, first.tracking_id);
        assert_eq!(second.transaction_id, first.transaction_id);

        let ledger = service.list_payments(PaymentQuery::default()).await.unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_settle_unknown_session_not_found() {
        let (service, _) = service();
        let result = service.settle_payment("cs_sbx_missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn checkout_req(booking: &decor_types::Booking) -> CreateCheckoutSessionRequest {
        CreateCheckoutSessionRequest {
            booking_id: booking.id,
            tracking_id: booking.tracking_id.to_string(),
            cost: 450.0,
            email: booking.user_email.clone(),
            service_name: "Wedding stage".to_string(),
        }
    }

    fn sandbox_session_id(sandbox: &SandboxCheckout) -> String {
        sandbox
            .session_ids()
            .into_iter()
            .next()
            .expect("a session was opened")
    }

    async fn resolve(
        sandbox: &SandboxCheckout,
        session_id: &str,
    ) -> decor_types::ResolvedSession {
        use decor_types::CheckoutProvider;
        sandbox.resolve_session(session_id).await.unwrap()
    }
}
