//!
//! stagepass role store
//! --------------------
//! In-memory authorization state for the ticketing platform: the permission
//! catalog (injected at construction), the role table, and the two user link
//! maps (user->roles, user->direct permissions). The public API centers
//! around `AuthStore`, which is usually wrapped in a thread-safe
//! `SharedAuthStore` (`Arc<RwLock<AuthStore>>`) elsewhere in the codebase.
//!
//! Key responsibilities:
//! - Role CRUD with referential safety (a role held by users cannot be
//!   deleted without `force`).
//! - Idempotent grant/revoke and atomic sync of role permission sets,
//!   validated against the catalog before any state change.
//! - Strict user-role assignment (duplicate assignment is a caller error,
//!   unlike the idempotent role-permission calls; the asymmetry is
//!   deliberate and mirrors the administrative API contract).
//! - JSON snapshot save/load for the admin surface.
//!
//! Derived queries (effective permissions, primary role) live in
//! `crate::identity`; this module only owns the mutable graph.

use crate::catalog::PermissionCatalog;
use crate::error::{AuthError, AuthResult};
use crate::identity::Principal;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A named, reusable bundle of permissions assignable to users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub permissions: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    fn new(name: &str) -> Self {
        let now = Utc::now();
        Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            permissions: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Listing row for the administrative surface: role metadata plus counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub permissions_count: usize,
    pub users_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authorization state: catalog, roles, and user links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStore {
    catalog: PermissionCatalog,
    roles: BTreeMap<String, Role>,
    user_roles: BTreeMap<String, BTreeSet<String>>,
    user_permissions: BTreeMap<String, BTreeSet<String>>,
}

impl AuthStore {
    /// Create a store around an explicitly constructed catalog.
    pub fn new(catalog: PermissionCatalog) -> Self {
        AuthStore {
            catalog,
            roles: BTreeMap::new(),
            user_roles: BTreeMap::new(),
            user_permissions: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut PermissionCatalog {
        &mut self.catalog
    }

    // ------------------------
    // Role CRUD
    // ------------------------

    /// Create a role, optionally granting an initial permission set.
    /// Validation happens before any state change: an unknown permission in
    /// `initial_permissions` leaves the store untouched.
    pub fn create_role(&mut self, name: &str, initial_permissions: &[String]) -> AuthResult<Role> {
        if self.roles.contains_key(name) {
            return Err(AuthError::DuplicateRole { name: name.to_string() });
        }
        self.catalog.validate(initial_permissions)?;
        let mut role = Role::new(name);
        role.permissions.extend(initial_permissions.iter().cloned());
        debug!(target: "stagepass::store", "create_role: name='{}' perms={}", name, role.permissions.len());
        self.roles.insert(name.to_string(), role.clone());
        Ok(role)
    }

    /// Rename a role, keeping its id, permissions and holders.
    pub fn rename_role(&mut self, name: &str, new_name: &str) -> AuthResult<Role> {
        if !self.roles.contains_key(name) {
            return Err(AuthError::RoleNotFound { name: name.to_string() });
        }
        if name != new_name && self.roles.contains_key(new_name) {
            return Err(AuthError::DuplicateRole { name: new_name.to_string() });
        }
        let mut role = self.roles.remove(name).expect("checked above");
        role.name = new_name.to_string();
        role.updated_at = Utc::now();
        self.roles.insert(new_name.to_string(), role.clone());
        for held in self.user_roles.values_mut() {
            if held.remove(name) {
                held.insert(new_name.to_string());
            }
        }
        debug!(target: "stagepass::store", "rename_role: '{}' -> '{}'", name, new_name);
        Ok(role)
    }

    /// Delete a role. Refuses with `RoleInUse` while users hold it unless
    /// `force` is set; a forced delete strips the role from every holder.
    pub fn delete_role(&mut self, name: &str, force: bool) -> AuthResult<()> {
        if !self.roles.contains_key(name) {
            return Err(AuthError::RoleNotFound { name: name.to_string() });
        }
        let holders = self.user_roles.values().filter(|r| r.contains(name)).count();
        if holders > 0 && !force {
            return Err(AuthError::RoleInUse { name: name.to_string(), holders });
        }
        self.roles.remove(name);
        for held in self.user_roles.values_mut() {
            held.remove(name);
        }
        debug!(target: "stagepass::store", "delete_role: name='{}' force={} stripped_holders={}", name, force, holders);
        Ok(())
    }

    pub fn role(&self, name: &str) -> AuthResult<&Role> {
        self.roles.get(name).ok_or_else(|| AuthError::RoleNotFound { name: name.to_string() })
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }

    /// All roles with their permission sets, in name order.
    pub fn roles_with_permissions(&self) -> Vec<Role> {
        self.roles.values().cloned().collect()
    }

    /// Listing rows for the admin surface, in name order.
    pub fn role_summaries(&self) -> Vec<RoleSummary> {
        self.roles
            .values()
            .map(|r| RoleSummary {
                id: r.id,
                name: r.name.clone(),
                display_name: crate::identity::role_display_name(&r.name),
                permissions_count: r.permissions.len(),
                users_count: self.user_roles.values().filter(|h| h.contains(&r.name)).count(),
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
            .collect()
    }

    // ------------------------
    // Role permission sets
    // ------------------------

    /// Grant permissions to a role. Idempotent: already-held permissions are
    /// a no-op. Unknown names fail before any change is applied.
    pub fn grant_permissions(&mut self, role: &str, permissions: &[String]) -> AuthResult<Role> {
        self.catalog.validate(permissions)?;
        let r = self
            .roles
            .get_mut(role)
            .ok_or_else(|| AuthError::RoleNotFound { name: role.to_string() })?;
        let before = r.permissions.len();
        r.permissions.extend(permissions.iter().cloned());
        if r.permissions.len() != before {
            r.updated_at = Utc::now();
        }
        debug!(target: "stagepass::store", "grant_permissions: role='{}' requested={} added={}", role, permissions.len(), r.permissions.len() - before);
        Ok(r.clone())
    }

    /// Revoke permissions from a role. Idempotent: unheld permissions are a
    /// no-op. Unknown names still fail with `PermissionNotFound`.
    pub fn revoke_permissions(&mut self, role: &str, permissions: &[String]) -> AuthResult<Role> {
        self.catalog.validate(permissions)?;
        let r = self
            .roles
            .get_mut(role)
            .ok_or_else(|| AuthError::RoleNotFound { name: role.to_string() })?;
        let before = r.permissions.len();
        for p in permissions {
            r.permissions.remove(p);
        }
        if r.permissions.len() != before {
            r.updated_at = Utc::now();
        }
        Ok(r.clone())
    }

    /// Replace a role's full permission set. Validated first, then swapped in
    /// one assignment; readers behind the shared lock never observe a
    /// partially-replaced set.
    pub fn sync_permissions(&mut self, role: &str, permissions: &[String]) -> AuthResult<Role> {
        self.catalog.validate(permissions)?;
        let r = self
            .roles
            .get_mut(role)
            .ok_or_else(|| AuthError::RoleNotFound { name: role.to_string() })?;
        r.permissions = permissions.iter().cloned().collect();
        r.updated_at = Utc::now();
        debug!(target: "stagepass::store", "sync_permissions: role='{}' perms={}", role, r.permissions.len());
        Ok(r.clone())
    }

    // ------------------------
    // Permission admin
    // ------------------------

    /// Remove a permission from the catalog. Refuses while any role or user
    /// holds it unless `force`; a forced delete strips it everywhere.
    pub fn delete_permission(&mut self, name: &str, force: bool) -> AuthResult<()> {
        if !self.catalog.contains(name) {
            return Err(AuthError::permission_not_found(name));
        }
        let in_roles = self.roles.values().any(|r| r.permissions.contains(name));
        let in_users = self.user_permissions.values().any(|p| p.contains(name));
        if (in_roles || in_users) && !force {
            return Err(AuthError::PermissionInUse { name: name.to_string() });
        }
        self.catalog.remove(name);
        for r in self.roles.values_mut() {
            if r.permissions.remove(name) {
                r.updated_at = Utc::now();
            }
        }
        for p in self.user_permissions.values_mut() {
            p.remove(name);
        }
        debug!(target: "stagepass::store", "delete_permission: name='{}' force={}", name, force);
        Ok(())
    }

    // ------------------------
    // User links
    // ------------------------

    /// Assign a role to a user. Strict: assigning a role the user already
    /// holds fails with `AlreadyAssigned`.
    pub fn assign_role(&mut self, user: &str, role: &str) -> AuthResult<()> {
        if !self.roles.contains_key(role) {
            return Err(AuthError::RoleNotFound { name: role.to_string() });
        }
        let held = self.user_roles.entry(user.to_string()).or_default();
        if !held.insert(role.to_string()) {
            return Err(AuthError::AlreadyAssigned { user: user.to_string(), role: role.to_string() });
        }
        debug!(target: "stagepass::store", "assign_role: user='{}' role='{}'", user, role);
        Ok(())
    }

    /// Remove a role from a user. Strict: removing a role the user does not
    /// hold fails with `NotAssigned`.
    pub fn unassign_role(&mut self, user: &str, role: &str) -> AuthResult<()> {
        let removed = self.user_roles.get_mut(user).map(|h| h.remove(role)).unwrap_or(false);
        if !removed {
            return Err(AuthError::NotAssigned { user: user.to_string(), role: role.to_string() });
        }
        debug!(target: "stagepass::store", "unassign_role: user='{}' role='{}'", user, role);
        Ok(())
    }

    /// Replace a user's role set. All names are validated before any change.
    pub fn sync_user_roles(&mut self, user: &str, roles: &[String]) -> AuthResult<()> {
        for r in roles {
            if !self.roles.contains_key(r) {
                return Err(AuthError::RoleNotFound { name: r.clone() });
            }
        }
        self.user_roles.insert(user.to_string(), roles.iter().cloned().collect());
        debug!(target: "stagepass::store", "sync_user_roles: user='{}' roles={}", user, roles.len());
        Ok(())
    }

    /// Grant direct permissions to a user, bypassing roles. Idempotent like
    /// the role-permission calls.
    pub fn grant_user_permissions(&mut self, user: &str, permissions: &[String]) -> AuthResult<()> {
        self.catalog.validate(permissions)?;
        let held = self.user_permissions.entry(user.to_string()).or_default();
        held.extend(permissions.iter().cloned());
        debug!(target: "stagepass::store", "grant_user_permissions: user='{}' perms={}", user, held.len());
        Ok(())
    }

    /// Revoke direct permissions from a user. Idempotent.
    pub fn revoke_user_permissions(&mut self, user: &str, permissions: &[String]) -> AuthResult<()> {
        self.catalog.validate(permissions)?;
        if let Some(held) = self.user_permissions.get_mut(user) {
            for p in permissions {
                held.remove(p);
            }
        }
        Ok(())
    }

    /// Users currently holding the given role, in id order.
    pub fn users_with_role(&self, role: &str) -> AuthResult<Vec<String>> {
        if !self.roles.contains_key(role) {
            return Err(AuthError::RoleNotFound { name: role.to_string() });
        }
        Ok(self
            .user_roles
            .iter()
            .filter(|(_, held)| held.contains(role))
            .map(|(u, _)| u.clone())
            .collect())
    }

    /// Users holding the given permission either directly or via a role.
    pub fn users_with_permission(&self, permission: &str) -> AuthResult<Vec<String>> {
        if !self.catalog.contains(permission) {
            return Err(AuthError::permission_not_found(permission));
        }
        let mut out: BTreeSet<String> = BTreeSet::new();
        for (user, held) in &self.user_permissions {
            if held.contains(permission) {
                out.insert(user.clone());
            }
        }
        for (user, held) in &self.user_roles {
            let via_role = held
                .iter()
                .filter_map(|r| self.roles.get(r))
                .any(|r| r.permissions.contains(permission));
            if via_role {
                out.insert(user.clone());
            }
        }
        Ok(out.into_iter().collect())
    }

    /// Snapshot of a user's identity: assigned role names plus direct grants.
    /// Total for any user id; an unknown user simply has nothing.
    pub fn principal(&self, user: &str) -> Principal {
        Principal {
            user_id: user.to_string(),
            roles: self.user_roles.get(user).map(|h| h.iter().cloned().collect()).unwrap_or_default(),
            direct_permissions: self
                .user_permissions
                .get(user)
                .map(|h| h.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }
}

/// Thread-safe shared handle over the authorization state. Mutations hold the
/// write lock for their full duration, so every administrative call is atomic
/// with respect to concurrent readers.
#[derive(Clone)]
pub struct SharedAuthStore(pub Arc<RwLock<AuthStore>>);

impl SharedAuthStore {
    pub fn new(catalog: PermissionCatalog) -> Self {
        SharedAuthStore(Arc::new(RwLock::new(AuthStore::new(catalog))))
    }

    /// Handle over a store seeded with the builtin permission catalog.
    pub fn builtin() -> Self {
        Self::new(PermissionCatalog::builtin())
    }

    pub fn read(&self) -> RwLockReadGuard<'_, AuthStore> {
        self.0.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, AuthStore> {
        self.0.write()
    }

    /// Persist the full store state as pretty-printed JSON.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = {
            let guard = self.read();
            serde_json::to_string_pretty(&*guard)?
        };
        if let Some(dir) = path.as_ref().parent() {
            fs::create_dir_all(dir).ok();
        }
        fs::write(path.as_ref(), json)
            .with_context(|| format!("writing snapshot to {}", path.as_ref().display()))?;
        debug!(target: "stagepass::store", "save_snapshot: path='{}'", path.as_ref().display());
        Ok(())
    }

    /// Load store state from a JSON snapshot, replacing the current state.
    pub fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading snapshot from {}", path.as_ref().display()))?;
        let mut loaded: AuthStore = serde_json::from_str(&raw).context("parsing snapshot JSON")?;
        loaded.catalog_mut().reindex();
        *self.write() = loaded;
        debug!(target: "stagepass::store", "load_snapshot: path='{}'", path.as_ref().display());
        Ok(())
    }
}
