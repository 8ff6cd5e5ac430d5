use serde::{Deserialize, Serialize};

use crate::users::{DateBucket, UserRecord};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// Opaque session token; the guard compares it against the stored flag.
#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub range: DateBucket,
}

/// Row shown in the admin user table. The stored password never leaves the
/// blob.
#[derive(Debug, Serialize)]
pub struct UserRow {
    pub email: String,
    pub timestamp: String,
    #[serde(rename = "loginDate", skip_serializing_if = "Option::is_none")]
    pub login_date: Option<String>,
    #[serde(rename = "loginTime", skip_serializing_if = "Option::is_none")]
    pub login_time: Option<String>,
    pub blocked: bool,
}

impl From<UserRecord> for UserRow {
    fn from(r: UserRecord) -> Self {
        Self {
            email: r.email,
            timestamp: r.timestamp,
            login_date: r.login_date,
            login_time: r.login_time,
            blocked: r.blocked,
        }
    }
}

/// Body for block/unblock and delete, both addressed by email.
#[derive(Debug, Deserialize)]
pub struct UserActionRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct BlockResponse {
    pub email: String,
    pub blocked: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub email: String,
    pub removed: usize,
}
