//! SQLite repository adapter.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use decor_types::{
    Booking, BookingId, BookingQuery, DecoratorAssignment, DecoratorStatus, DeliveryStatus,
    DomainError, Listing, ListingId, ListingQuery, MarketplaceRepository, Payment, RepoError,
    SettlementOutcome, UpdateBookingRequest, UpdateListingRequest, User, UserId, UserQuery,
    UserRole,
};

use crate::types::{DbBooking, DbListing, DbPayment, DbUser, parse_delivery_status};

const BOOKING_COLS: &str = "id, user_email, decorator_email, decorator_name, decorator_status, \
     tracking_id, delivery_status, payment_status, assigned_at, ratings, booked_at";

const PAYMENT_COLS: &str = "transaction_id, booking_id, tracking_id, amount, currency, \
     customer_email, payment_status, paid_at";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        // Run migration from migration file
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl MarketplaceRepository for SqliteRepo {
    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let result = sqlx::query(
            r#"INSERT INTO users (id, email, name, role, status, created_at) VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.to_string())
        .bind(user.status.map(|s| s.to_string()))
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(RepoError::Conflict(
                format!("User already exists: {}", user.email),
            )),
            Err(e) => Err(RepoError::Database(e.to_string())),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> = sqlx::query_as(
            r#"SELECT id, email, name, role, status, created_at FROM users WHERE email = ?"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbUser::into_domain).transpose()
    }

    async fn list_users(&self, filter: &UserQuery) -> Result<Vec<User>, RepoError> {
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, email, name, role, status, created_at FROM users WHERE 1=1",
        );

        if let Some(role) = filter.role {
            query.push(" AND role = ").push_bind(role.to_string());
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.to_string());
        }
        query.push(" ORDER BY created_at DESC");

        let rows: Vec<DbUser> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbUser::into_domain).collect()
    }

    async fn update_user_role(&self, id: UserId, role: UserRole) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE users SET role = ? WHERE id = ?"#)
            .bind(role.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn update_user_status(
        &self,
        id: UserId,
        status: DecoratorStatus,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE users SET status = ? WHERE id = ?"#)
            .bind(status.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_listing(&self, listing: Listing) -> Result<Listing, RepoError> {
        sqlx::query(
            r#"INSERT INTO listings (id, service_name, category, cost, tracking_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(listing.id.to_string())
        .bind(&listing.service_name)
        .bind(&listing.category)
        .bind(listing.cost)
        .bind(listing.tracking_id.as_str())
        .bind(listing.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepoError> {
        let row: Option<DbListing> = sqlx::query_as(
            r#"SELECT id, service_name, category, cost, tracking_id, created_at
               FROM listings WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbListing::into_domain).transpose()
    }

    async fn list_listings(&self, filter: &ListingQuery) -> Result<Vec<Listing>, RepoError> {
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT id, service_name, category, cost, tracking_id, created_at FROM listings WHERE 1=1",
        );

        if let Some(search) = &filter.search {
            query
                .push(" AND LOWER(service_name) LIKE ")
                .push_bind(format!("%{}%", search.to_lowercase()));
        }
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(min) = filter.min_budget {
            query.push(" AND cost >= ").push_bind(min);
        }
        if let Some(max) = filter.max_budget {
            query.push(" AND cost <= ").push_bind(max);
        }
        query.push(" ORDER BY created_at DESC");

        let rows: Vec<DbListing> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbListing::into_domain).collect()
    }

    async fn update_listing(
        &self,
        id: ListingId,
        patch: UpdateListingRequest,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE listings
               SET service_name = COALESCE(?, service_name),
                   category = COALESCE(?, category),
                   cost = COALESCE(?, cost)
               WHERE id = ?"#,
        )
        .bind(&patch.service_name)
        .bind(&patch.category)
        .bind(patch.cost)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_listing(&self, id: ListingId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM listings WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bookings
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_booking(&self, booking: Booking) -> Result<Booking, RepoError> {
        let result = sqlx::query(&format!(
            "INSERT INTO bookings ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            BOOKING_COLS
        ))
        .bind(booking.id.to_string())
        .bind(&booking.user_email)
        .bind(&booking.decorator_email)
        .bind(&booking.decorator_name)
        .bind(&booking.decorator_status)
        .bind(booking.tracking_id.as_str())
        .bind(booking.delivery_status.to_string())
        .bind(booking.payment_status.map(|s| s.to_string()))
        .bind(booking.assigned_at.map(|dt| dt.to_rfc3339()))
        .bind(booking.ratings)
        .bind(booking.date.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(booking),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RepoError::Conflict(format!(
                    "Tracking id already exists: {}",
                    booking.tracking_id
                )))
            }
            Err(e) => Err(RepoError::Database(e.to_string())),
        }
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, RepoError> {
        let row: Option<DbBooking> =
            sqlx::query_as(&format!("SELECT {} FROM bookings WHERE id = ?", BOOKING_COLS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbBooking::into_domain).transpose()
    }

    async fn list_bookings(&self, filter: &BookingQuery) -> Result<Vec<Booking>, RepoError> {
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
            "SELECT {} FROM bookings WHERE 1=1",
            BOOKING_COLS
        ));

        if let Some(email) = &filter.email {
            query.push(" AND user_email = ").push_bind(email.clone());
        }
        if let Some(decorator) = &filter.decorator_email {
            query
                .push(" AND decorator_email = ")
                .push_bind(decorator.clone());
        }
        if let Some(status) = filter.delivery_status {
            query
                .push(" AND delivery_status = ")
                .push_bind(status.to_string());
        }
        query.push(" ORDER BY booked_at DESC");

        let rows: Vec<DbBooking> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbBooking::into_domain).collect()
    }

    async fn assign_decorator(
        &self,
        id: BookingId,
        assignment: DecoratorAssignment,
    ) -> Result<Booking, RepoError> {
        let id_str = id.to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let current = fetch_delivery_status(&mut db_tx, &id_str).await?;
        check_transition(current, DeliveryStatus::MaterialsPrepared)?;

        sqlx::query(
            r#"UPDATE bookings
               SET decorator_name = ?, decorator_email = ?, decorator_status = ?,
                   delivery_status = ?, assigned_at = ?, ratings = ?
               WHERE id = ?"#,
        )
        .bind(&assignment.decorator_name)
        .bind(&assignment.decorator_email)
        .bind(&assignment.decorator_status)
        .bind(DeliveryStatus::MaterialsPrepared.to_string())
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(assignment.ratings)
        .bind(&id_str)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let updated = fetch_booking_tx(&mut db_tx, &id_str).await?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(updated)
    }

    async fn update_delivery_status(
        &self,
        id: BookingId,
        status: DeliveryStatus,
    ) -> Result<Booking, RepoError> {
        let id_str = id.to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let current = fetch_delivery_status(&mut db_tx, &id_str).await?;
        check_transition(current, status)?;

        sqlx::query(r#"UPDATE bookings SET delivery_status = ? WHERE id = ?"#)
            .bind(status.to_string())
            .bind(&id_str)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let updated = fetch_booking_tx(&mut db_tx, &id_str).await?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(updated)
    }

    async fn update_booking(
        &self,
        id: BookingId,
        patch: UpdateBookingRequest,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"UPDATE bookings
               SET booked_at = COALESCE(?, booked_at),
                   ratings = COALESCE(?, ratings)
               WHERE id = ?"#,
        )
        .bind(patch.date.map(|dt| dt.to_rfc3339()))
        .bind(patch.ratings)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_booking(&self, id: BookingId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM bookings WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Payment ledger
    // ─────────────────────────────────────────────────────────────────────────

    async fn find_payment(&self, transaction_id: &str) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE transaction_id = ?",
            PAYMENT_COLS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn record_settlement(&self, payment: Payment) -> Result<SettlementOutcome, RepoError> {
        let booking_id_str = payment.booking_id.to_string();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        // The settlement is void unless the booking it references exists;
        // nothing is written in that case.
        let exists: Option<crate::types::DbDeliveryStatus> =
            sqlx::query_as(r#"SELECT delivery_status FROM bookings WHERE id = ?"#)
                .bind(&booking_id_str)
                .fetch_optional(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        if exists.is_none() {
            return Err(RepoError::NotFound);
        }

        sqlx::query(r#"UPDATE bookings SET payment_status = ?, delivery_status = ? WHERE id = ?"#)
            .bind(payment.payment_status.to_string())
            .bind(DeliveryStatus::PlanningPhase.to_string())
            .bind(&booking_id_str)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let insert = sqlx::query(&format!(
            "INSERT INTO payments ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            PAYMENT_COLS
        ))
        .bind(&payment.transaction_id)
        .bind(&booking_id_str)
        .bind(payment.tracking_id.as_str())
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.customer_email)
        .bind(payment.payment_status.to_string())
        .bind(payment.paid_at.to_rfc3339())
        .execute(&mut *db_tx)
        .await;

        match insert {
            Ok(_) => {}
            // A concurrent settlement for the same transaction won the
            // insert; roll back our booking write and hand back theirs.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                drop(db_tx);
                tracing::warn!(
                    transaction_id = %payment.transaction_id,
                    "duplicate settlement attempt, returning existing record"
                );
                let existing = self
                    .find_payment(&payment.transaction_id)
                    .await?
                    .ok_or_else(|| {
                        RepoError::Database("settlement race lost but ledger row missing".into())
                    })?;
                return Ok(SettlementOutcome {
                    payment: existing,
                    booking: None,
                    duplicate: true,
                });
            }
            Err(e) => return Err(RepoError::Database(e.to_string())),
        }

        let updated = fetch_booking_tx(&mut db_tx, &booking_id_str).await?;

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        Ok(SettlementOutcome {
            payment,
            booking: Some(updated),
            duplicate: false,
        })
    }

    async fn list_payments(&self, email: Option<&str>) -> Result<Vec<Payment>, RepoError> {
        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
            "SELECT {} FROM payments WHERE 1=1",
            PAYMENT_COLS
        ));

        if let Some(email) = email {
            query
                .push(" AND customer_email = ")
                .push_bind(email.to_string());
        }
        query.push(" ORDER BY paid_at DESC");

        let rows: Vec<DbPayment> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbPayment::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn fetch_delivery_status(
    db_tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id_str: &str,
) -> Result<DeliveryStatus, RepoError> {
    let row: Option<crate::types::DbDeliveryStatus> =
        sqlx::query_as(r#"SELECT delivery_status FROM bookings WHERE id = ?"#)
            .bind(id_str)
            .fetch_optional(&mut **db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

    let row = row.ok_or(RepoError::NotFound)?;
    parse_delivery_status(&row.delivery_status)
}

fn check_transition(from: DeliveryStatus, to: DeliveryStatus) -> Result<(), RepoError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(RepoError::Domain(DomainError::InvalidTransition { from, to }))
    }
}

async fn fetch_booking_tx(
    db_tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id_str: &str,
) -> Result<Booking, RepoError> {
    let row: DbBooking =
        sqlx::query_as(&format!("SELECT {} FROM bookings WHERE id = ?", BOOKING_COLS))
            .bind(id_str)
            .fetch_one(&mut **db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

    row.into_domain()
}
