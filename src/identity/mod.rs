//! Derived authorization facts for resolved user identities.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod principal;
mod resolver;

pub use authorizer::{Gate, ELEVATED_ROLES, RESOURCE_ACTIONS};
pub use principal::Principal;
pub use resolver::{role_display_name, role_priority, Resolver};
