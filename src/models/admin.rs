use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An administrator account. Passwords are stored as bcrypt hashes only.
#[derive(Debug, Serialize, Deserialize)]
pub struct Admin {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub created_at: Option<DateTime<Utc>>,
}
