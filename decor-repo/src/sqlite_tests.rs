//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use decor_types::{
        Booking, BookingId, BookingQuery, DecoratorAssignment, DeliveryStatus, DomainError,
        Listing, ListingQuery, MarketplaceRepository, Payment, RepoError, TrackingId,
        UpdateListingRequest, User, UserQuery, UserRole,
    };

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn new_booking(email: &str) -> Booking {
        Booking::new(email.to_string(), TrackingId::generate(), None).unwrap()
    }

    fn assignment() -> DecoratorAssignment {
        DecoratorAssignment {
            decorator_name: "Mina".to_string(),
            decorator_email: "mina@example.com".to_string(),
            decorator_status: "accepted".to_string(),
            ratings: 4.8,
        }
    }

    fn paid_payment(booking: &Booking, txn: &str) -> Payment {
        Payment::settled(
            txn.to_string(),
            booking.id,
            booking.tracking_id.clone(),
            45000,
            "usd".to_string(),
            booking.user_email.clone(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let repo = setup_repo().await;

        let user = User::new("alice@example.com".to_string(), None, UserRole::User).unwrap();
        repo.insert_user(user.clone()).await.unwrap();

        let found = repo
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = setup_repo().await;

        let first = User::new("dup@example.com".to_string(), None, UserRole::User).unwrap();
        repo.insert_user(first).await.unwrap();

        let second = User::new("dup@example.com".to_string(), None, UserRole::User).unwrap();
        let result = repo.insert_user(second).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_users_by_role() {
        let repo = setup_repo().await;

        repo.insert_user(
            User::new("a@example.com".to_string(), None, UserRole::User).unwrap(),
        )
        .await
        .unwrap();
        repo.insert_user(
            User::new("b@example.com".to_string(), None, UserRole::Decorator).unwrap(),
        )
        .await
        .unwrap();

        let decorators = repo
            .list_users(&UserQuery {
                role: Some(UserRole::Decorator),
                status: None,
            })
            .await
            .unwrap();

        assert_eq!(decorators.len(), 1);
        assert_eq!(decorators[0].email, "b@example.com");
    }

    #[tokio::test]
    async fn test_update_role_not_found() {
        let repo = setup_repo().await;

        let result = repo
            .update_user_role(decor_types::UserId::new(), UserRole::Admin)
            .await;

        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_listing_filters() {
        let repo = setup_repo().await;

        repo.insert_listing(
            Listing::new("Wedding stage".to_string(), "wedding".to_string(), 450.0).unwrap(),
        )
        .await
        .unwrap();
        repo.insert_listing(
            Listing::new("Birthday balloons".to_string(), "birthday".to_string(), 80.0).unwrap(),
        )
        .await
        .unwrap();

        // Case-insensitive substring search
        let hits = repo
            .list_listings(&ListingQuery {
                search: Some("WEDDING".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].service_name, "Wedding stage");

        // Budget range
        let cheap = repo
            .list_listings(&ListingQuery {
                min_budget: Some(50.0),
                max_budget: Some(100.0),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cheap.len(), 1);
        assert_eq!(cheap[0].category, "birthday");

        // No filters returns everything
        let all = repo.list_listings(&ListingQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_listing_patch_keeps_unset_fields() {
        let repo = setup_repo().await;

        let listing = repo
            .insert_listing(
                Listing::new("Garden lights".to_string(), "outdoor".to_string(), 120.0).unwrap(),
            )
            .await
            .unwrap();

        repo.update_listing(
            listing.id,
            UpdateListingRequest {
                cost: Some(150.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = repo.get_listing(listing.id).await.unwrap().unwrap();
        assert_eq!(updated.cost, 150.0);
        assert_eq!(updated.service_name, "Garden lights");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bookings
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_insert_booking_starts_assigned() {
        let repo = setup_repo().await;

        let booking = repo.insert_booking(new_booking("alice@example.com")).await.unwrap();

        let stored = repo.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.delivery_status, DeliveryStatus::Assigned);
        assert_eq!(stored.tracking_id, booking.tracking_id);
    }

    #[tokio::test]
    async fn test_duplicate_tracking_id_conflicts() {
        let repo = setup_repo().await;

        let first = new_booking("a@example.com");
        let mut second = new_booking("b@example.com");
        second.tracking_id = first.tracking_id.clone();

        repo.insert_booking(first).await.unwrap();
        let result = repo.insert_booking(second).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_bookings_newest_first() {
        let repo = setup_repo().await;

        let old = Booking::new(
            "alice@example.com".to_string(),
            TrackingId::generate(),
            Some(chrono::Utc::now() - chrono::Duration::days(2)),
        )
        .unwrap();
        let recent = new_booking("alice@example.com");

        repo.insert_booking(old.clone()).await.unwrap();
        repo.insert_booking(recent.clone()).await.unwrap();

        let all = repo.list_bookings(&BookingQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, recent.id);
        assert_eq!(all[1].id, old.id);
    }

    #[tokio::test]
    async fn test_list_bookings_status_filter() {
        let repo = setup_repo().await;

        let a = repo.insert_booking(new_booking("a@example.com")).await.unwrap();
        let b = repo.insert_booking(new_booking("b@example.com")).await.unwrap();
        repo.assign_decorator(b.id, assignment()).await.unwrap();

        let assigned = repo
            .list_bookings(&BookingQuery {
                delivery_status: Some(DeliveryStatus::Assigned),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].id, a.id);
    }

    #[tokio::test]
    async fn test_assign_decorator_moves_to_materials_prepared() {
        let repo = setup_repo().await;

        let booking = repo.insert_booking(new_booking("alice@example.com")).await.unwrap();
        let updated = repo.assign_decorator(booking.id, assignment()).await.unwrap();

        assert_eq!(updated.delivery_status, DeliveryStatus::MaterialsPrepared);
        assert_eq!(updated.decorator_email.as_deref(), Some("mina@example.com"));
        assert!(updated.assigned_at.is_some());
        assert_eq!(updated.ratings, Some(4.8));
    }

    #[tokio::test]
    async fn test_assign_decorator_not_found() {
        let repo = setup_repo().await;

        let result = repo.assign_decorator(BookingId::new(), assignment()).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() {
        let repo = setup_repo().await;

        let booking = repo.insert_booking(new_booking("alice@example.com")).await.unwrap();

        // assigned -> completed skips the whole lifecycle
        let result = repo
            .update_delivery_status(booking.id, DeliveryStatus::Completed)
            .await;

        assert!(matches!(
            result,
            Err(RepoError::Domain(DomainError::InvalidTransition { .. }))
        ));

        let stored = repo.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.delivery_status, DeliveryStatus::Assigned);
    }

    #[tokio::test]
    async fn test_valid_transition_applies() {
        let repo = setup_repo().await;

        let booking = repo.insert_booking(new_booking("alice@example.com")).await.unwrap();
        let updated = repo
            .update_delivery_status(booking.id, DeliveryStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(updated.delivery_status, DeliveryStatus::Cancelled);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settlement
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_settlement_updates_booking_and_ledger() {
        let repo = setup_repo().await;

        let booking = repo.insert_booking(new_booking("alice@example.com")).await.unwrap();
        let outcome = repo
            .record_settlement(paid_payment(&booking, "txn_1"))
            .await
            .unwrap();

        assert!(!outcome.duplicate);
        let updated = outcome.booking.unwrap();
        assert_eq!(updated.delivery_status, DeliveryStatus::PlanningPhase);
        assert_eq!(updated.payment_status, Some(decor_types::PaymentState::Paid));

        let stored = repo.find_payment("txn_1").await.unwrap().unwrap();
        assert_eq!(stored.booking_id, booking.id);
        assert_eq!(stored.amount, 45000);
    }

    #[tokio::test]
    async fn test_settlement_race_is_duplicate_noop() {
        let repo = setup_repo().await;

        let booking = repo.insert_booking(new_booking("alice@example.com")).await.unwrap();
        repo.record_settlement(paid_payment(&booking, "txn_1"))
            .await
            .unwrap();

        // Same transaction id again: the unique constraint fires and the
        // existing ledger row is handed back.
        let second = repo
            .record_settlement(paid_payment(&booking, "txn_1"))
            .await
            .unwrap();

        assert!(second.duplicate);
        assert!(second.booking.is_none());
        assert_eq!(second.payment.transaction_id, "txn_1");

        let all = repo.list_payments(None).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_settlement_missing_booking_writes_nothing() {
        let repo = setup_repo().await;

        let orphan = new_booking("ghost@example.com");
        let result = repo.record_settlement(paid_payment(&orphan, "txn_ghost")).await;

        assert!(matches!(result, Err(RepoError::NotFound)));
        assert!(repo.find_payment("txn_ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_payments_by_email() {
        let repo = setup_repo().await;

        let a = repo.insert_booking(new_booking("a@example.com")).await.unwrap();
        let b = repo.insert_booking(new_booking("b@example.com")).await.unwrap();

        repo.record_settlement(paid_payment(&a, "txn_a")).await.unwrap();
        repo.record_settlement(paid_payment(&b, "txn_b")).await.unwrap();

        let only_a = repo.list_payments(Some("a@example.com")).await.unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].transaction_id, "txn_a");
    }
}
