//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

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
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository implementation.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        execute_migration(
            &pool,
            include_str!("../migrations/0001_create_tables_pg.sql"),
            "0001",
        )
        .await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl MarketplaceRepository for PostgresRepo {
    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    async fn insert_user(&self, user: User) -> Result<User, RepoError> {
        let result = sqlx::query(
            r#"INSERT INTO users (id, email, name, role, status, created_at) VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.to_string())
        .bind(user.status.map(|s| s.to_string()))
        .bind(user.created_at)
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
            r#"SELECT id, email, name, role, status, created_at FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbUser::into_domain).transpose()
    }

    async fn list_users(&self, filter: &UserQuery) -> Result<Vec<User>, RepoError> {
        let mut query = sqlx::QueryBuilder::<sqlx::Postgres>::new(
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
        let result = sqlx::query(r#"UPDATE users SET role = $1 WHERE id = $2"#)
            .bind(role.to_string())
            .bind(id.as_uuid())
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
        let result = sqlx::query(r#"UPDATE users SET status = $1 WHERE id = $2"#)
            .bind(status.to_string())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id.as_uuid())
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
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(listing.id.as_uuid())
        .bind(&listing.service_name)
        .bind(&listing.category)
        .bind(listing.cost)
        .bind(listing.tracking_id.as_str())
        .bind(listing.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(listing)
    }

    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>, RepoError> {
        let row: Option<DbListing> = sqlx::query_as(
            r#"SELECT id, service_name, category, cost, tracking_id, created_at
               FROM listings WHERE id = $1"#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbListing::into_domain).transpose()
    }

    async fn list_listings(&self, filter: &ListingQuery) -> Result<Vec<Listing>, RepoError> {
        let mut query = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "SELECT id, service_name, category, cost, tracking_id, created_at FROM listings WHERE 1=1",
        );

        if let Some(search) = &filter.search {
            query
                .push(" AND service_name ILIKE ")
                .push_bind(format!("%{}%", search));
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
               SET service_name = COALESCE($1, service_name),
                   category = COALESCE($2, category),
                   cost = COALESCE($3, cost)
               WHERE id = $4"#,
        )
        .bind(&patch.service_name)
        .bind(&patch.category)
        .bind(patch.cost)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_listing(&self, id: ListingId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM listings WHERE id = $1"#)
            .bind(id.as_uuid())
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
            "INSERT INTO bookings ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            BOOKING_COLS
        ))
        .bind(booking.id.as_uuid())
        .bind(&booking.user_email)
        .bind(&booking.decorator_email)
        .bind(&booking.decorator_name)
        .bind(&booking.decorator_status)
        .bind(booking.tracking_id.as_str())
        .bind(booking.delivery_status.to_string())
        .bind(booking.payment_status.map(|s| s.to_string()))
        .bind(booking.assigned_at)
        .bind(booking.ratings)
        .bind(booking.date)
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
        let row: Option<DbBooking> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbBooking::into_domain).transpose()
    }

    async fn list_bookings(&self, filter: &BookingQuery) -> Result<Vec<Booking>, RepoError> {
        let mut query = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
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
        let uuid = *id.as_uuid();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let current = fetch_delivery_status(&mut db_tx, uuid).await?;
        check_transition(current, DeliveryStatus::MaterialsPrepared)?;

        sqlx::query(
            r#"UPDATE bookings
               SET decorator_name = $1, decorator_email = $2, decorator_status = $3,
                   delivery_status = $4, assigned_at = $5, ratings = $6
               WHERE id = $7"#,
        )
        .bind(&assignment.decorator_name)
        .bind(&assignment.decorator_email)
        .bind(&assignment.decorator_status)
        .bind(DeliveryStatus::MaterialsPrepared.to_string())
        .bind(Utc::now())
        .bind(assignment.ratings)
        .bind(uuid)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let updated = fetch_booking_tx(&mut db_tx, uuid).await?;

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
        let uuid = *id.as_uuid();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        let current = fetch_delivery_status(&mut db_tx, uuid).await?;
        check_transition(current, status)?;

        sqlx::query(r#"UPDATE bookings SET delivery_status = $1 WHERE id = $2"#)
            .bind(status.to_string())
            .bind(uuid)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let updated = fetch_booking_tx(&mut db_tx, uuid).await?;

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
               SET booked_at = COALESCE($1, booked_at),
                   ratings = COALESCE($2, ratings)
               WHERE id = $3"#,
        )
        .bind(patch.date)
        .bind(patch.ratings)
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_booking(&self, id: BookingId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM bookings WHERE id = $1"#)
            .bind(id.as_uuid())
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
            "SELECT {} FROM payments WHERE transaction_id = $1",
            PAYMENT_COLS
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn record_settlement(&self, payment: Payment) -> Result<SettlementOutcome, RepoError> {
        let booking_uuid = *payment.booking_id.as_uuid();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        // The settlement is void unless the booking it references exists;
        // nothing is written in that case.
        let exists: Option<crate::types::DbDeliveryStatus> =
            sqlx::query_as(r#"SELECT delivery_status FROM bookings WHERE id = $1"#)
                .bind(booking_uuid)
                .fetch_optional(&mut *db_tx)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        if exists.is_none() {
            return Err(RepoError::NotFound);
        }

        sqlx::query(
            r#"UPDATE bookings SET payment_status = $1, delivery_status = $2 WHERE id = $3"#,
        )
        .bind(payment.payment_status.to_string())
        .bind(DeliveryStatus::PlanningPhase.to_string())
        .bind(booking_uuid)
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let insert = sqlx::query(&format!(
            "INSERT INTO payments ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            PAYMENT_COLS
        ))
        .bind(&payment.transaction_id)
        .bind(booking_uuid)
        .bind(payment.tracking_id.as_str())
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.customer_email)
        .bind(payment.payment_status.to_string())
        .bind(payment.paid_at)
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

        let updated = fetch_booking_tx(&mut db_tx, booking_uuid).await?;

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
        let mut query = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
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
    db_tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<DeliveryStatus, RepoError> {
    let row: Option<crate::types::DbDeliveryStatus> =
        sqlx::query_as(r#"SELECT delivery_status FROM bookings WHERE id = $1"#)
            .bind(id)
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
    db_tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<Booking, RepoError> {
    let row: DbBooking = sqlx::query_as(&format!(
        "SELECT {} FROM bookings WHERE id = $1",
        BOOKING_COLS
    ))
    .bind(id)
    .fetch_one(&mut **db_tx)
    .await
    .map_err(|e| RepoError::Database(e.to_string()))?;

    row.into_domain()
}
