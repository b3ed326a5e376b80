//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier for a User.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random UserId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a UserId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The role a user plays on the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular customer
    User,
    /// Service provider fulfilling bookings
    Decorator,
    /// Marketplace operator
    Admin,
    /// Delivery courier for materials
    Rider,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::User
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Decorator => write!(f, "decorator"),
            UserRole::Admin => write!(f, "admin"),
            UserRole::Rider => write!(f, "rider"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "decorator" => Ok(UserRole::Decorator),
            "admin" => Ok(UserRole::Admin),
            "rider" => Ok(UserRole::Rider),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Approval state of a decorator account.
///
/// Only present on users with the decorator role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DecoratorStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for DecoratorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoratorStatus::Pending => write!(f, "pending"),
            DecoratorStatus::Approved => write!(f, "approved"),
            DecoratorStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for DecoratorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DecoratorStatus::Pending),
            "approved" => Ok(DecoratorStatus::Approved),
            "rejected" => Ok(DecoratorStatus::Rejected),
            other => Err(format!("Unknown status: {}", other)),
        }
    }
}

/// A registered marketplace user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: UserId,
    /// Login email, unique across the marketplace
    pub email: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub role: UserRole,
    /// Approval state, present only for decorators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DecoratorStatus>,
    /// When the user registered
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user record.
    ///
    /// Decorator registrations start in `pending` status; every other role
    /// carries no status field.
    ///
    /// # Validation
    /// - Email cannot be empty
    pub fn new(email: String, name: Option<String>, role: UserRole) -> Result<Self, DomainError> {
        if email.trim().is_empty() {
            return Err(DomainError::ValidationError("Email cannot be empty".into()));
        }

        let status = match role {
            UserRole::Decorator => Some(DecoratorStatus::Pending),
            _ => None,
        };

        Ok(Self {
            id: UserId::new(),
            email,
            name,
            role,
            status,
            created_at: Utc::now(),
        })
    }

    /// Reconstructs a user from database fields.
    pub fn from_parts(
        id: UserId,
        email: String,
        name: Option<String>,
        role: UserRole,
        status: Option<DecoratorStatus>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            name,
            role,
            status,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorator_defaults_to_pending() {
        let user = User::new("deco@example.com".to_string(), None, UserRole::Decorator).unwrap();
        assert_eq!(user.status, Some(DecoratorStatus::Pending));
    }

    #[test]
    fn test_regular_user_has_no_status() {
        let user = User::new("a@example.com".to_string(), None, UserRole::User).unwrap();
        assert!(user.status.is_none());

        let admin = User::new("b@example.com".to_string(), None, UserRole::Admin).unwrap();
        assert!(admin.status.is_none());
    }

    #[test]
    fn test_empty_email_fails() {
        let result = User::new("  ".to_string(), None, UserRole::User);
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_role_round_trip() {
        for role in ["user", "decorator", "admin", "rider"] {
            let parsed: UserRole = role.parse().unwrap();
            assert_eq!(parsed.to_string(), role);
        }
        assert!("manager".parse::<UserRole>().is_err());
    }
}
