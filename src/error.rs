//! Unified authorization error model.
//! Every failure here is a rejected administrative operation, not a crash:
//! callers surface these as validation responses (see `http_status`).
//! Derived queries (resolver/gate) never produce these — absence of a
//! permission is simply `false` or an empty list.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthError {
    /// Referenced permission name(s) not in the catalog.
    PermissionNotFound { names: Vec<String> },
    /// Referenced role name does not exist.
    RoleNotFound { name: String },
    /// Role creation/rename collides with an existing name.
    DuplicateRole { name: String },
    /// Permission creation collides with an existing name.
    DuplicatePermission { name: String },
    /// Role delete blocked because users still hold it.
    RoleInUse { name: String, holders: usize },
    /// Permission delete blocked because roles or users still hold it.
    PermissionInUse { name: String },
    /// User already holds the role being assigned.
    AlreadyAssigned { user: String, role: String },
    /// User does not hold the role being removed.
    NotAssigned { user: String, role: String },
}

impl AuthError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AuthError::PermissionNotFound { .. } => "permission_not_found",
            AuthError::RoleNotFound { .. } => "role_not_found",
            AuthError::DuplicateRole { .. } => "duplicate_role",
            AuthError::DuplicatePermission { .. } => "duplicate_permission",
            AuthError::RoleInUse { .. } => "role_in_use",
            AuthError::PermissionInUse { .. } => "permission_in_use",
            AuthError::AlreadyAssigned { .. } => "already_assigned",
            AuthError::NotAssigned { .. } => "not_assigned",
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::PermissionNotFound { names } => {
                format!("permissions not found: {}", names.join(", "))
            }
            AuthError::RoleNotFound { name } => format!("role '{}' not found", name),
            AuthError::DuplicateRole { name } => format!("role '{}' already exists", name),
            AuthError::DuplicatePermission { name } => {
                format!("permission '{}' already exists", name)
            }
            AuthError::RoleInUse { name, holders } => format!(
                "cannot delete role '{}': assigned to {} user(s); use force to override",
                name, holders
            ),
            AuthError::PermissionInUse { name } => format!(
                "cannot delete permission '{}': assigned to roles or users; use force to override",
                name
            ),
            AuthError::AlreadyAssigned { user, role } => {
                format!("user '{}' already has the role '{}'", user, role)
            }
            AuthError::NotAssigned { user, role } => {
                format!("user '{}' does not have the role '{}'", user, role)
            }
        }
    }

    pub fn permission_not_found<S: Into<String>>(name: S) -> Self {
        AuthError::PermissionNotFound { names: vec![name.into()] }
    }

    /// Map to HTTP status code for the administrative surface.
    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::PermissionNotFound { .. } | AuthError::RoleNotFound { .. } => 404,
            AuthError::DuplicateRole { .. }
            | AuthError::DuplicatePermission { .. }
            | AuthError::AlreadyAssigned { .. } => 409,
            AuthError::RoleInUse { .. }
            | AuthError::PermissionInUse { .. }
            | AuthError::NotAssigned { .. } => 422,
        }
    }
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AuthError {}

pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(AuthError::permission_not_found("fly events").http_status(), 404);
        assert_eq!(AuthError::RoleNotFound { name: "x".into() }.http_status(), 404);
        assert_eq!(AuthError::DuplicateRole { name: "x".into() }.http_status(), 409);
        assert_eq!(AuthError::RoleInUse { name: "x".into(), holders: 2 }.http_status(), 422);
        assert_eq!(
            AuthError::AlreadyAssigned { user: "u".into(), role: "r".into() }.http_status(),
            409
        );
    }

    #[test]
    fn display_includes_code_and_message() {
        let e = AuthError::RoleNotFound { name: "vip".into() };
        let s = e.to_string();
        assert!(s.starts_with("role_not_found:"), "got: {s}");
        assert!(s.contains("'vip'"), "got: {s}");
    }

    #[test]
    fn serde_tagging_round_trip() {
        let e = AuthError::RoleInUse { name: "admin".into(), holders: 3 };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v.get("type").and_then(|t| t.as_str()), Some("role_in_use"));
        let back: AuthError = serde_json::from_value(v).unwrap();
        assert_eq!(back, e);
    }
}
