//! Authorization gate: the single entry point application code calls to
//! decide whether an operation is allowed. Pure recomputation over the
//! current role/permission graph; every method is an infallible boolean or
//! list, so callers can always render a safe, minimally-privileged view even
//! when identity data is incomplete.

use crate::identity::resolver::Resolver;
use crate::store::SharedAuthStore;

/// Fixed per-resource action list, in display order.
pub const RESOURCE_ACTIONS: &[&str] = &["view", "create", "edit", "delete"];

/// Roles granted access to the admin panel.
pub const ELEVATED_ROLES: &[&str] = &["super-admin", "admin", "event-manager", "customer-service"];

const MANAGE_USERS: &[&str] = &["view users", "create users", "edit users", "delete users"];
const MANAGE_EVENTS: &[&str] = &["view events", "create events", "edit events", "delete events"];
const MANAGE_TICKETS: &[&str] = &["view tickets", "create tickets", "edit tickets", "delete tickets"];
const MANAGE_ORDERS: &[&str] =
    &["view orders", "create orders", "edit orders", "delete orders", "refund orders"];
const MANAGE_ORGANIZERS: &[&str] =
    &["view organizers", "create organizers", "edit organizers", "delete organizers"];
const VIEW_REPORTS: &[&str] = &["view reports", "export reports"];

/// Capability checks over a resolver. One cohesive type rather than helper
/// mixins scattered across callers.
#[derive(Clone)]
pub struct Gate {
    resolver: Resolver,
}

impl Gate {
    pub fn new(store: SharedAuthStore) -> Self {
        Gate { resolver: Resolver::new(store) }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Build "<action> <resource>" (resource lowercased) and test membership
    /// in the user's effective permissions.
    pub fn can_perform_action(&self, user: &str, action: &str, resource: &str) -> bool {
        let permission = format!("{} {}", action, resource.to_lowercase());
        self.resolver.has_permission(user, &permission)
    }

    /// The subset of {view, create, edit, delete} the user holds for the
    /// resource, preserving that fixed order.
    pub fn available_actions(&self, user: &str, resource: &str) -> Vec<&'static str> {
        let held = self.resolver.effective_permissions(user);
        let resource = resource.to_lowercase();
        RESOURCE_ACTIONS
            .iter()
            .copied()
            .filter(|action| held.contains(&format!("{} {}", action, resource)))
            .collect()
    }

    // Capability shortcuts: each is any-of over a fixed permission set.

    pub fn can_manage_users(&self, user: &str) -> bool {
        self.resolver.has_any_permission(user, MANAGE_USERS)
    }

    pub fn can_manage_events(&self, user: &str) -> bool {
        self.resolver.has_any_permission(user, MANAGE_EVENTS)
    }

    pub fn can_manage_tickets(&self, user: &str) -> bool {
        self.resolver.has_any_permission(user, MANAGE_TICKETS)
    }

    pub fn can_manage_orders(&self, user: &str) -> bool {
        self.resolver.has_any_permission(user, MANAGE_ORDERS)
    }

    pub fn can_manage_organizers(&self, user: &str) -> bool {
        self.resolver.has_any_permission(user, MANAGE_ORGANIZERS)
    }

    pub fn can_view_reports(&self, user: &str) -> bool {
        self.resolver.has_any_permission(user, VIEW_REPORTS)
    }

    // Role predicates.

    pub fn is_super_admin(&self, user: &str) -> bool {
        self.resolver.has_role(user, "super-admin")
    }

    pub fn is_admin(&self, user: &str) -> bool {
        self.resolver.has_any_role(user, &["super-admin", "admin"])
    }

    pub fn is_event_manager(&self, user: &str) -> bool {
        self.resolver.has_role(user, "event-manager")
    }

    pub fn is_customer_service(&self, user: &str) -> bool {
        self.resolver.has_role(user, "customer-service")
    }

    pub fn is_customer(&self, user: &str) -> bool {
        self.resolver.has_role(user, "customer")
    }

    /// Admin panel access: any elevated role.
    pub fn can_access_admin(&self, user: &str) -> bool {
        self.resolver.has_any_role(user, ELEVATED_ROLES)
    }

    pub fn has_elevated_privileges(&self, user: &str) -> bool {
        self.resolver.has_any_role(user, &["super-admin", "admin"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SharedAuthStore;

    fn perms(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn gate() -> Gate {
        let shared = SharedAuthStore::builtin();
        {
            let mut s = shared.write();
            s.create_role("event-manager", &perms(&["view events", "edit events", "publish events"]))
                .unwrap();
            s.create_role("customer-service", &perms(&["view orders", "refund orders"])).unwrap();
            s.create_role("customer", &perms(&["view events", "create orders"])).unwrap();
        }
        Gate::new(shared)
    }

    #[test]
    fn can_perform_action_lowercases_resource() {
        let g = gate();
        g.resolver().store().write().assign_role("u1", "event-manager").unwrap();
        assert!(g.can_perform_action("u1", "view", "Events"));
        assert!(g.can_perform_action("u1", "edit", "events"));
        assert!(!g.can_perform_action("u1", "delete", "events"));
    }

    #[test]
    fn available_actions_preserve_fixed_order() {
        let g = gate();
        g.resolver().store().write().assign_role("u1", "event-manager").unwrap();
        assert_eq!(g.available_actions("u1", "events"), vec!["view", "edit"]);
        assert!(g.available_actions("u1", "organizers").is_empty());
        assert!(g.available_actions("stranger", "events").is_empty());
    }

    #[test]
    fn manage_orders_shortcut_matches_any_of_fixed_set() {
        let g = gate();
        g.resolver().store().write().assign_role("cs", "customer-service").unwrap();
        assert!(g.can_manage_orders("cs"));

        // Disjoint permission set: events only, no order permissions.
        {
            let mut s = g.resolver().store().write();
            s.grant_user_permissions("ev", &perms(&["view events", "publish events"])).unwrap();
        }
        assert!(!g.can_manage_orders("ev"));
        assert!(g.can_manage_events("ev"));
    }

    #[test]
    fn report_capability_covers_view_and_export() {
        let g = gate();
        g.resolver()
            .store()
            .write()
            .grant_user_permissions("analyst", &perms(&["export reports"]))
            .unwrap();
        assert!(g.can_view_reports("analyst"));
        assert!(!g.can_view_reports("nobody"));
    }

    #[test]
    fn admin_access_and_elevation() {
        let g = gate();
        {
            let mut s = g.resolver().store().write();
            s.create_role("admin", &[]).unwrap();
            s.assign_role("boss", "admin").unwrap();
            s.assign_role("cs", "customer-service").unwrap();
            s.assign_role("shopper", "customer").unwrap();
        }
        assert!(g.can_access_admin("boss"));
        assert!(g.can_access_admin("cs"));
        assert!(!g.can_access_admin("shopper"));
        assert!(g.has_elevated_privileges("boss"));
        assert!(!g.has_elevated_privileges("cs"));
        assert!(g.is_admin("boss"));
        assert!(!g.is_super_admin("boss"));
        assert!(g.is_customer("shopper"));
    }
}
