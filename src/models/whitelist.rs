use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'allowed_emails' table.
/// Inactive entries stay for audit but do not grant registration.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WhitelistEntry {
    pub id: i64,
    pub email: String,
    pub note: String,
    pub active: bool,
    pub added_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddWhitelistRequest {
    #[validate(length(min = 3, max = 254), contains(pattern = "@", message = "Invalid email."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub note: String,
}
