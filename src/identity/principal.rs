use serde::{Deserialize, Serialize};

/// Resolved user identity as presented by the authentication layer: the
/// user's assigned role names plus any directly granted permission names.
/// Both lists are sorted; derived queries treat them as sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub direct_permissions: Vec<String>,
}
