pub mod catalog;
pub mod error;
pub mod identity;
pub mod seed;
pub mod store;

pub use catalog::PermissionCatalog;
pub use error::{AuthError, AuthResult};
pub use identity::{Gate, Principal, Resolver};
pub use store::{AuthStore, Role, SharedAuthStore};
