//! RBAC integration tests: role store invariants, identity resolution and
//! the authorization gate. These tests exercise positive and negative paths
//! across the full public surface.

use anyhow::Result;
use std::collections::BTreeSet;

use stagepass::identity::{role_display_name, Gate, Resolver};
use stagepass::seed::seed_builtin_roles;
use stagepass::{AuthError, PermissionCatalog, SharedAuthStore};

fn perms(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn seeded_store() -> SharedAuthStore {
    let store = SharedAuthStore::builtin();
    seed_builtin_roles(&store).expect("seeding a fresh store");
    store
}

#[test]
fn effective_permissions_are_union_of_roles_and_direct_grants() -> Result<()> {
    let store = seeded_store();
    {
        let mut s = store.write();
        s.assign_role("amira", "customer")?;
        s.assign_role("amira", "event-manager")?;
        s.grant_user_permissions("amira", &perms(&["export reports", "view events"]))?;
    }
    let resolver = Resolver::new(store.clone());
    let held = resolver.effective_permissions("amira");

    // Union of both role sets plus direct grants, duplicates collapsed.
    let mut expected: BTreeSet<String> = BTreeSet::new();
    {
        let s = store.read();
        expected.extend(s.role("customer")?.permissions.iter().cloned());
        expected.extend(s.role("event-manager")?.permissions.iter().cloned());
    }
    expected.insert("export reports".to_string());
    assert_eq!(held, expected);
    assert_eq!(held.iter().filter(|p| p.as_str() == "view events").count(), 1);
    Ok(())
}

#[test]
fn unknown_permission_fails_and_leaves_state_intact() -> Result<()> {
    let store = seeded_store();
    let before = store.read().role("customer")?.permissions.clone();

    let err = store.write().grant_permissions("customer", &perms(&["ride ponies"])).unwrap_err();
    assert!(matches!(err, AuthError::PermissionNotFound { .. }));
    let err = store.write().revoke_permissions("customer", &perms(&["ride ponies"])).unwrap_err();
    assert!(matches!(err, AuthError::PermissionNotFound { .. }));

    let s = store.read();
    assert_eq!(s.role("customer")?.permissions, before);
    assert!(!s.catalog().contains("ride ponies"));
    Ok(())
}

#[test]
fn grant_twice_equals_grant_once() -> Result<()> {
    let store = seeded_store();
    let once = store.write().grant_permissions("customer", &perms(&["view tickets"]))?;
    let twice = store.write().grant_permissions("customer", &perms(&["view tickets"]))?;
    assert_eq!(once.permissions, twice.permissions);
    Ok(())
}

#[test]
fn assignment_is_strict_while_role_grants_are_idempotent() -> Result<()> {
    // The asymmetry is deliberate: bulk permission calls on roles are no-ops
    // on repeats, but assigning a role a user already holds is a caller
    // error.
    let store = seeded_store();
    store.write().assign_role("amira", "customer")?;
    let err = store.write().assign_role("amira", "customer").unwrap_err();
    assert!(matches!(err, AuthError::AlreadyAssigned { .. }));

    let err = store.write().unassign_role("amira", "event-manager").unwrap_err();
    assert!(matches!(err, AuthError::NotAssigned { .. }));

    store.write().grant_permissions("customer", &perms(&["view events"]))?;
    store.write().grant_permissions("customer", &perms(&["view events"]))?;
    Ok(())
}

#[test]
fn primary_role_ranking() -> Result<()> {
    let store = seeded_store();
    {
        let mut s = store.write();
        s.assign_role("amira", "customer")?;
        s.assign_role("amira", "admin")?;
        s.assign_role("bruno", "event-manager")?;
        s.assign_role("bruno", "customer-service")?;
    }
    let resolver = Resolver::new(store);
    assert_eq!(resolver.primary_role("amira").as_deref(), Some("admin"));
    assert_eq!(resolver.primary_role("bruno").as_deref(), Some("event-manager"));
    assert_eq!(resolver.primary_role("nobody"), None);
    assert_eq!(resolver.display_name_for("nobody"), "Guest");
    Ok(())
}

#[test]
fn role_display_names_with_title_case_fallback() {
    assert_eq!(role_display_name("event-manager"), "Event Manager");
    assert_eq!(role_display_name("unknown-role"), "Unknown Role");
    assert_eq!(role_display_name("super-admin"), "Super Administrator");
}

#[test]
fn available_actions_subset_in_fixed_order() -> Result<()> {
    let store = SharedAuthStore::builtin();
    store.write().grant_user_permissions("pat", &perms(&["view events", "edit events"]))?;
    let gate = Gate::new(store);
    assert_eq!(gate.available_actions("pat", "events"), vec!["view", "edit"]);
    assert_eq!(gate.available_actions("pat", "Events"), vec!["view", "edit"]);
    assert!(gate.available_actions("pat", "orders").is_empty());
    Ok(())
}

#[test]
fn delete_role_in_use_blocks_and_preserves_assignments() -> Result<()> {
    let store = seeded_store();
    store.write().assign_role("amira", "customer")?;

    let err = store.write().delete_role("customer", false).unwrap_err();
    assert!(matches!(err, AuthError::RoleInUse { holders: 1, .. }));
    {
        let s = store.read();
        assert!(s.role("customer").is_ok());
        assert_eq!(s.users_with_role("customer")?, vec!["amira".to_string()]);
    }

    // Forced delete strips the role from all holders.
    store.write().delete_role("customer", true)?;
    let s = store.read();
    assert!(s.role("customer").is_err());
    assert!(s.principal("amira").roles.is_empty());
    Ok(())
}

#[test]
fn can_manage_orders_matches_its_fixed_permission_set() -> Result<()> {
    let store = seeded_store();
    {
        let mut s = store.write();
        s.assign_role("casey", "customer-service")?; // holds refund orders
        s.grant_user_permissions("tess", &perms(&["view tickets", "validate tickets"]))?;
    }
    let gate = Gate::new(store);
    assert!(gate.can_manage_orders("casey"));
    // Disjoint permission set: tickets only.
    assert!(!gate.can_manage_orders("tess"));
    assert!(gate.can_manage_tickets("tess"));
    Ok(())
}

#[test]
fn admin_access_follows_elevated_role_set() -> Result<()> {
    let store = seeded_store();
    {
        let mut s = store.write();
        s.assign_role("root", "super-admin")?;
        s.assign_role("manager", "event-manager")?;
        s.assign_role("shopper", "customer")?;
    }
    let gate = Gate::new(store);
    assert!(gate.can_access_admin("root"));
    assert!(gate.can_access_admin("manager"));
    assert!(!gate.can_access_admin("shopper"));
    assert!(gate.has_elevated_privileges("root"));
    assert!(!gate.has_elevated_privileges("manager"));
    Ok(())
}

#[test]
fn sync_user_roles_is_all_or_nothing() -> Result<()> {
    let store = seeded_store();
    store.write().assign_role("amira", "customer")?;

    let err = store
        .write()
        .sync_user_roles("amira", &perms(&["admin", "head-of-pyrotechnics"]))
        .unwrap_err();
    assert!(matches!(err, AuthError::RoleNotFound { .. }));
    assert_eq!(store.read().principal("amira").roles, vec!["customer".to_string()]);

    store.write().sync_user_roles("amira", &perms(&["admin", "event-manager"]))?;
    assert_eq!(
        store.read().principal("amira").roles,
        vec!["admin".to_string(), "event-manager".to_string()]
    );
    Ok(())
}

#[test]
fn seeded_role_grants_match_platform_defaults() -> Result<()> {
    let store = seeded_store();
    let s = store.read();
    assert_eq!(s.role("super-admin")?.permissions.len(), s.catalog().len());
    let customer: Vec<String> = s.role("customer")?.permissions.iter().cloned().collect();
    assert_eq!(customer, perms(&["create orders", "view events"]));
    assert!(s.role("customer-service")?.permissions.contains("refund orders"));
    assert!(!s.role("event-manager")?.permissions.contains("delete events"));
    Ok(())
}

#[test]
fn snapshot_round_trips_store_state() -> Result<()> {
    let store = seeded_store();
    {
        let mut s = store.write();
        s.assign_role("amira", "admin")?;
        s.grant_user_permissions("amira", &perms(&["manage settings"]))?;
    }
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("auth.json");
    store.save_snapshot(&path)?;

    let restored = SharedAuthStore::new(PermissionCatalog::new());
    restored.load_snapshot(&path)?;
    let resolver = Resolver::new(restored.clone());
    assert_eq!(resolver.primary_role("amira").as_deref(), Some("admin"));
    assert!(resolver.has_permission("amira", "manage settings"));
    assert_eq!(
        restored.read().role("admin")?.permissions,
        store.read().role("admin")?.permissions
    );
    Ok(())
}

#[test]
fn unranked_roles_never_outrank_ranked_ones() -> Result<()> {
    let store = seeded_store();
    {
        let mut s = store.write();
        s.create_role("door-crew", &perms(&["validate tickets"]))?;
        s.create_role("bar-crew", &[])?;
        s.assign_role("kit", "door-crew")?;
        s.assign_role("kit", "bar-crew")?;
    }
    let resolver = Resolver::new(store.clone());
    // Tie among unranked roles resolves lexicographically.
    assert_eq!(resolver.primary_role("kit").as_deref(), Some("bar-crew"));
    assert_eq!(resolver.display_name_for("kit"), "Bar Crew");

    store.write().assign_role("kit", "customer")?;
    assert_eq!(resolver.primary_role("kit").as_deref(), Some("customer"));
    Ok(())
}
