//! Identity-permission resolver: computes a user's effective permission set,
//! primary role and display name from the current role/permission graph.
//! Everything here is a read-only recomputation against the shared store —
//! nothing is cached, so results always reflect the latest mutations.
//!
//! Resolver queries never error: unknown or stale role names degrade to
//! priority 0 and a generated display label rather than failing, because
//! display and gating must keep working on incomplete identity data.

use crate::catalog::category_of;
use crate::store::SharedAuthStore;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fixed priority ranking used to pick a user's primary role. Roles absent
/// from the table rank at 0 and only win when no ranked role is held.
static ROLE_PRIORITY: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    HashMap::from([
        ("super-admin", 5),
        ("admin", 4),
        ("event-manager", 3),
        ("customer-service", 2),
        ("customer", 1),
    ])
});

/// Human labels for the built-in roles.
static ROLE_DISPLAY_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("super-admin", "Super Administrator"),
        ("admin", "Administrator"),
        ("event-manager", "Event Manager"),
        ("customer-service", "Customer Service"),
        ("customer", "Customer"),
    ])
});

pub fn role_priority(role: &str) -> u8 {
    ROLE_PRIORITY.get(role).copied().unwrap_or(0)
}

/// Human label for a role name. Known roles use the fixed table; unknown
/// names get a title-cased, dash-to-space transform ("shift-lead" ->
/// "Shift Lead") so stale or externally-introduced roles still render.
pub fn role_display_name(role: &str) -> String {
    if let Some(label) = ROLE_DISPLAY_NAMES.get(role) {
        return (*label).to_string();
    }
    role.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read-side view over the shared store.
#[derive(Clone)]
pub struct Resolver {
    store: SharedAuthStore,
}

impl Resolver {
    pub fn new(store: SharedAuthStore) -> Self {
        Resolver { store }
    }

    pub fn store(&self) -> &SharedAuthStore {
        &self.store
    }

    /// Union of permissions of every role assigned to the user, plus direct
    /// grants. Set semantics: duplicates collapse, order irrelevant.
    pub fn effective_permissions(&self, user: &str) -> BTreeSet<String> {
        let guard = self.store.read();
        let principal = guard.principal(user);
        let mut out: BTreeSet<String> = principal.direct_permissions.into_iter().collect();
        for role in &principal.roles {
            // A role can disappear between resolving the principal and here
            // only via this same lock, so the lookup cannot fail; still,
            // unknown names degrade to empty rather than erroring.
            if let Ok(r) = guard.role(role) {
                out.extend(r.permissions.iter().cloned());
            }
        }
        out
    }

    /// Permissions the user holds via roles only.
    pub fn role_permissions(&self, user: &str) -> BTreeSet<String> {
        let guard = self.store.read();
        let principal = guard.principal(user);
        let mut out = BTreeSet::new();
        for role in &principal.roles {
            if let Ok(r) = guard.role(role) {
                out.extend(r.permissions.iter().cloned());
            }
        }
        out
    }

    /// Direct grants only, bypassing roles.
    pub fn direct_permissions(&self, user: &str) -> BTreeSet<String> {
        self.store.read().principal(user).direct_permissions.into_iter().collect()
    }

    pub fn has_permission(&self, user: &str, permission: &str) -> bool {
        self.effective_permissions(user).contains(permission)
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, user: &str, permissions: &[S]) -> bool {
        let held = self.effective_permissions(user);
        permissions.iter().any(|p| held.contains(p.as_ref()))
    }

    pub fn has_all_permissions<S: AsRef<str>>(&self, user: &str, permissions: &[S]) -> bool {
        let held = self.effective_permissions(user);
        permissions.iter().all(|p| held.contains(p.as_ref()))
    }

    pub fn has_role(&self, user: &str, role: &str) -> bool {
        self.store.read().principal(user).roles.iter().any(|r| r == role)
    }

    pub fn has_any_role<S: AsRef<str>>(&self, user: &str, roles: &[S]) -> bool {
        let held = self.store.read().principal(user).roles;
        roles.iter().any(|r| held.iter().any(|h| h == r.as_ref()))
    }

    /// The user's highest-priority role, or None when no roles are assigned.
    /// Ranked priorities are unique, so ties can only occur among unranked
    /// roles; the lexicographically smallest name wins there, which keeps the
    /// result deterministic regardless of assignment order.
    pub fn primary_role(&self, user: &str) -> Option<String> {
        let roles = self.store.read().principal(user).roles;
        let mut best: Option<(u8, String)> = None;
        // Principal roles are sorted, so the first seen at a given priority
        // is the lexicographic winner.
        for role in roles {
            let priority = role_priority(&role);
            let better = match &best {
                Some((p, _)) => priority > *p,
                None => true,
            };
            if better {
                best = Some((priority, role));
            }
        }
        best.map(|(_, name)| name)
    }

    /// Display label for the user's primary role; "Guest" with no roles.
    pub fn display_name_for(&self, user: &str) -> String {
        match self.primary_role(user) {
            Some(role) => role_display_name(&role),
            None => "Guest".to_string(),
        }
    }

    /// The user's effective permissions grouped by catalog category.
    pub fn permissions_by_category(&self, user: &str) -> BTreeMap<String, Vec<String>> {
        let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for p in self.effective_permissions(user) {
            out.entry(category_of(&p).to_string()).or_default().push(p);
        }
        out
    }
}
