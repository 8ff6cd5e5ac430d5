use anyhow::Context;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

/// One signed-up identity as it lives in the `users` blob.
///
/// Field names follow the persisted layout, so blobs written by earlier
/// deployments load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub password: String,
    /// RFC 3339 creation instant. Stored as a string: a malformed value in a
    /// hand-edited blob drops that record from time-bounded filters instead of
    /// failing the whole load.
    pub timestamp: String,
    #[serde(rename = "loginDate", default, skip_serializing_if = "Option::is_none")]
    pub login_date: Option<String>,
    #[serde(rename = "loginTime", default, skip_serializing_if = "Option::is_none")]
    pub login_time: Option<String>,
    #[serde(default)]
    pub blocked: bool,
}

impl UserRecord {
    /// Record for a fresh signup. `timestamp` and the redundant display
    /// fields are all derived from the same instant.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        now: OffsetDateTime,
    ) -> anyhow::Result<Self> {
        let date_format = format_description!("[day]/[month]/[year]");
        let time_format = format_description!("[hour]:[minute]:[second]");
        Ok(Self {
            email: email.into(),
            password: password.into(),
            timestamp: now.format(&Rfc3339).context("format timestamp")?,
            login_date: Some(now.format(date_format).context("format login date")?),
            login_time: Some(now.format(time_format).context("format login time")?),
            blocked: false,
        })
    }

    /// Creation instant, if the stored string still parses.
    pub fn parsed_timestamp(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.timestamp, &Rfc3339).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn new_record_stamps_all_three_time_fields() {
        let now = datetime!(2024-03-05 09:30:01 UTC);
        let record = UserRecord::new("a@x.com", "secret12", now).expect("build record");

        assert_eq!(record.timestamp, "2024-03-05T09:30:01Z");
        assert_eq!(record.login_date.as_deref(), Some("05/03/2024"));
        assert_eq!(record.login_time.as_deref(), Some("09:30:01"));
        assert!(!record.blocked);
        assert_eq!(record.parsed_timestamp(), Some(now));
    }

    #[test]
    fn blob_layout_uses_original_field_names() {
        let now = datetime!(2024-03-05 09:30:01 UTC);
        let record = UserRecord::new("a@x.com", "secret12", now).expect("build record");
        let json = serde_json::to_string(&record).expect("serialize");

        assert!(json.contains("\"loginDate\""));
        assert!(json.contains("\"loginTime\""));
        assert!(json.contains("\"timestamp\""));
        assert!(!json.contains("login_date"));
    }

    #[test]
    fn blocked_defaults_to_false_when_absent() {
        let json = r#"{"email":"a@x.com","password":"pw","timestamp":"2024-03-05T09:30:01Z"}"#;
        let record: UserRecord = serde_json::from_str(json).expect("deserialize");
        assert!(!record.blocked);
        assert_eq!(record.login_date, None);
        assert_eq!(record.login_time, None);
    }
}
