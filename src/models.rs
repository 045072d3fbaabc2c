use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity Schemas ---

/// Role
///
/// The single classification held by every user. The set is closed: every
/// decision table keyed on a role is an exhaustive `match`, so adding a variant
/// is a compile error until each table handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Operator,
    Viewer,
}

impl Role {
    /// The wire identifier, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::Viewer => "viewer",
        }
    }

    /// Human-facing label used by the access-denied page.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Operator => "Operator",
            Role::Viewer => "Viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            "viewer" => Ok(Role::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Permission
///
/// An opaque, independently grantable capability such as `doc:read`.
/// Unlike [`Role`] the set is open, so it is a string newtype.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct Permission(String);

// Deserialized from a bare string so query strings (`?permission=doc:read`)
// decode the same way as JSON bodies.
impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self)
    }
}

impl Permission {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// User
///
/// The principal's identity record as held by the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    // Ordered so that serialized output is stable.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub permissions: BTreeSet<Permission>,
}

impl User {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            permissions: BTreeSet::new(),
        }
    }

    /// Builder-style helper used by seeds and tests.
    pub fn with_permission(mut self, permission: impl Into<Permission>) -> Self {
        self.permissions.insert(permission.into());
        self
    }
}

// --- Document Schemas ---

/// Document
///
/// A managed document. Content behind the protected document routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub owner_id: Uuid,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// UpdateDocumentRequest
///
/// Partial update payload for `PUT /documents/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateDocumentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// UserProfile
///
/// Output schema for `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
    pub role_label: String,
    #[schema(value_type = Vec<String>)]
    pub permissions: BTreeSet<Permission>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            role: user.role,
            role_label: user.role.label().to_string(),
            permissions: user.permissions.clone(),
        }
    }
}
