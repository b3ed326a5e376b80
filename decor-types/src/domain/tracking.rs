//! Human-readable tracking identifiers.

use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Prefix carried by every tracking identifier.
pub const TRACKING_PREFIX: &str = "PS";

/// A display-friendly, semi-unique identifier for bookings and listings,
/// distinct from their storage identifiers.
///
/// Format: `PS-YYYYMMDD-XXXXXX` where the suffix is 3 random bytes rendered
/// as uppercase hex. The suffix alone does not guarantee global uniqueness;
/// the store enforces a UNIQUE index and callers regenerate on collision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TrackingId(String);

impl TrackingId {
    /// Generates a tracking id stamped with the current UTC date.
    pub fn generate() -> Self {
        let date = chrono::Utc::now().format("%Y%m%d");
        let suffix: u32 = rand::rng().random_range(0..0x1_00_00_00);
        Self(format!("{}-{}-{:06X}", TRACKING_PREFIX, date, suffix))
    }

    /// Wraps an already-generated tracking id string.
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks that a string has the `PS-YYYYMMDD-XXXXXX` shape.
    pub fn is_well_formed(s: &str) -> bool {
        let mut parts = s.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        prefix == TRACKING_PREFIX
            && date.len() == 8
            && date.bytes().all(|b| b.is_ascii_digit())
            && suffix.len() == 6
            && suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
    }
}

impl std::fmt::Display for TrackingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TrackingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
