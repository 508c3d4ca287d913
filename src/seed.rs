//! Bootstrap seeding of the built-in roles. The catalog itself ships seeded
//! (`PermissionCatalog::builtin`); this module layers the five platform roles
//! and their fixed grants on top. Run once at startup or from the admin
//! REPL's `seed` command.

use crate::error::AuthResult;
use crate::store::SharedAuthStore;
use tracing::info;

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Create the built-in roles with their default permission grants.
/// super-admin receives every permission currently in the catalog.
/// Fails with `DuplicateRole` if any of the roles already exist.
pub fn seed_builtin_roles(store: &SharedAuthStore) -> AuthResult<()> {
    let mut s = store.write();

    let all = s.catalog().list_all();
    s.create_role("super-admin", &all)?;

    s.create_role(
        "admin",
        &owned(&[
            "view users", "create users", "edit users",
            "view roles", "create roles", "edit roles",
            "view events", "create events", "edit events", "publish events",
            "view tickets", "create tickets", "edit tickets", "validate tickets",
            "view orders", "create orders", "edit orders", "refund orders",
            "view reports", "export reports",
        ]),
    )?;

    s.create_role(
        "event-manager",
        &owned(&[
            "view events", "create events", "edit events", "publish events",
            "view tickets", "create tickets", "edit tickets",
            "view orders", "edit orders",
            "view reports",
        ]),
    )?;

    s.create_role(
        "customer-service",
        &owned(&[
            "view users", "edit users",
            "view events",
            "view tickets", "validate tickets",
            "view orders", "edit orders", "refund orders",
        ]),
    )?;

    s.create_role("customer", &owned(&["view events", "create orders"]))?;

    info!(target: "stagepass::seed", "seeded built-in roles: super-admin, admin, event-manager, customer-service, customer");
    Ok(())
}
