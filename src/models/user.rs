use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    /// Stored lowercased; the unique lookup key.
    pub email: String,
    pub name: String,
    /// Stored and compared in the clear. Known weakness, see DESIGN.md.
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}
