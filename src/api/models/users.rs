use crate::auth::models::Role;
use serde::{Deserialize, Serialize};

/// Account entry shown on the admin users page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(deserialize_with = "crate::core::serde_ext::string_or_number")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<String>,
}
