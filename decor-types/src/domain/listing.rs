//! Catalog listing domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::tracking::TrackingId;
use crate::error::DomainError;

/// Unique identifier for a catalog Listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Creates a new random ListingId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a ListingId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ListingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ListingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A decoration service offered on the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Unique identifier
    pub id: ListingId,
    pub service_name: String,
    pub category: String,
    /// Price in major currency units
    pub cost: f64,
    pub tracking_id: TrackingId,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Creates a new listing.
    ///
    /// # Validation
    /// - Service name cannot be empty
    /// - Cost cannot be negative
    pub fn new(service_name: String, category: String, cost: f64) -> Result<Self, DomainError> {
        if service_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Service name cannot be empty".into(),
            ));
        }
        if cost < 0.0 {
            return Err(DomainError::ValidationError(
                "Cost cannot be negative".into(),
            ));
        }

        Ok(Self {
            id: ListingId::new(),
            service_name,
            category,
            cost,
            tracking_id: TrackingId::generate(),
            created_at: Utc::now(),
        })
    }

    /// Reconstructs a listing from database fields.
    pub fn from_parts(
        id: ListingId,
        service_name: String,
        category: String,
        cost: f64,
        tracking_id: TrackingId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            service_name,
            category,
            cost,
            tracking_id,
            created_at,
        }
    }
}
