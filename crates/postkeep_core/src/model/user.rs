//! User model and legacy password digest.
//!
//! # Invariants
//! - `password_digest` is never logged or serialized.
//! - Digests are unsalted SHA-224 hex strings. This matches accounts
//!   provisioned by earlier deployments and is weak; it must be replaced by a
//!   salted key-derivation function before any real deployment.

use crate::model::entry::RecordId;
use serde::Serialize;
use sha2::{Digest, Sha224};

/// Authorization role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    /// Parses a stored role name. Relational ranks use `administrator`,
    /// document users use `admin`.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "admin" | "administrator" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Rank name used by the relational `ranks` table.
    pub fn rank_name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "administrator",
        }
    }

    /// Role name stored on document-store user documents.
    pub fn document_name(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    #[serde(skip)]
    pub password_digest: String,
    pub role: Role,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            role: self.role,
        }
    }
}

/// Minimal projection used to authorize the admin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: RecordId,
    pub role: Role,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Computes the legacy lowercase-hex SHA-224 digest of `plaintext`.
pub fn password_digest(plaintext: &str) -> String {
    format!("{:x}", Sha224::digest(plaintext.as_bytes()))
}

/// Checks `plaintext` against a stored digest.
pub fn verify_password(plaintext: &str, stored_digest: &str) -> bool {
    password_digest(plaintext).eq_ignore_ascii_case(stored_digest.trim())
}
