//! Permission catalog: the source of truth for valid permission names.
//! Permissions are plain strings of the form "<action> <resource>"
//! ("view events", "refund orders"). The catalog is seeded once at bootstrap
//! and injected into the store; it is a constant registry, not a reflective
//! lookup.

use crate::error::{AuthError, AuthResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Fixed action vocabulary accepted by the catalog's permission strings.
pub const ACTIONS: &[&str] = &[
    "view", "create", "edit", "delete", "publish", "validate", "refund", "export", "manage",
];

/// Default permission set for the ticketing platform, in display order.
static BUILTIN_PERMISSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        // User management
        "view users",
        "create users",
        "edit users",
        "delete users",
        // Role management
        "view roles",
        "create roles",
        "edit roles",
        "delete roles",
        // Event management
        "view events",
        "create events",
        "edit events",
        "delete events",
        "publish events",
        // Ticket management
        "view tickets",
        "create tickets",
        "edit tickets",
        "delete tickets",
        "validate tickets",
        // Order management
        "view orders",
        "create orders",
        "edit orders",
        "delete orders",
        "refund orders",
        // Organizer management
        "view organizers",
        "create organizers",
        "edit organizers",
        "delete organizers",
        // Reports
        "view reports",
        "export reports",
        // Settings
        "manage settings",
    ]
});

/// Derive the grouping category for a permission string: the second
/// whitespace token ("view events" -> "events"); single-token names fall
/// into "general".
pub fn category_of(permission: &str) -> &str {
    permission.split_whitespace().nth(1).unwrap_or("general")
}

/// Registry of valid permission names. Keeps seed order for listings and a
/// set for membership checks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionCatalog {
    ordered: Vec<String>,
    #[serde(skip)]
    index: HashSet<String>,
}

impl PermissionCatalog {
    /// Empty catalog for callers that seed manually.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-seeded with the platform's default permission set.
    pub fn builtin() -> Self {
        let mut cat = Self::new();
        for p in BUILTIN_PERMISSIONS.iter() {
            // Seed list is static and duplicate-free.
            let _ = cat.create_permission(p);
        }
        cat
    }

    /// Rebuild the membership index after deserialization (serde skips it).
    pub fn reindex(&mut self) {
        self.index = self.ordered.iter().cloned().collect();
    }

    /// Register a new permission name. Fails with `DuplicatePermission` if it
    /// already exists.
    pub fn create_permission(&mut self, name: &str) -> AuthResult<()> {
        if self.index.contains(name) {
            return Err(AuthError::DuplicatePermission { name: name.to_string() });
        }
        self.ordered.push(name.to_string());
        self.index.insert(name.to_string());
        Ok(())
    }

    /// Remove a permission name from the catalog. Returns false if absent.
    pub fn remove(&mut self, name: &str) -> bool {
        if !self.index.remove(name) {
            return false;
        }
        self.ordered.retain(|p| p != name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// All registered permissions in seed order.
    pub fn list_all(&self) -> Vec<String> {
        self.ordered.clone()
    }

    /// Permissions grouped by category, each group in seed order.
    pub fn by_category(&self) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for p in &self.ordered {
            out.entry(category_of(p).to_string()).or_default().push(p.clone());
        }
        out
    }

    /// All-or-nothing membership check: every name must exist in the catalog
    /// or the call fails with `PermissionNotFound` naming each unknown
    /// permission. No partial application anywhere downstream.
    pub fn validate<I, S>(&self, names: I) -> AuthResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unknown: Vec<String> = names
            .into_iter()
            .filter(|n| !self.contains(n.as_ref()))
            .map(|n| n.as_ref().to_string())
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AuthError::PermissionNotFound { names: unknown })
        }
    }
}
