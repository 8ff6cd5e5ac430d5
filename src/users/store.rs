use std::sync::Arc;

use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::warn;

use crate::storage::Storage;
use crate::users::record::UserRecord;

/// Well-known key holding the serialized record array.
pub const USERS_KEY: &str = "users";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no user with that email")]
    NotFound,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("timestamp is not a valid RFC 3339 instant")]
    InvalidTimestamp,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Rolling-window filter over a record's creation instant. The windows slide
/// with `now`; they are not calendar-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBucket {
    #[default]
    All,
    Today,
    Week,
    Month,
}

/// Exact, case-sensitive match. This is the login/signup/reset semantic;
/// the admin search box uses [`search`] instead.
pub fn find_by_email<'a>(records: &'a [UserRecord], email: &str) -> Option<&'a UserRecord> {
    records.iter().find(|r| r.email == email)
}

/// Case-insensitive substring match on email, as the admin search box does it.
pub fn search(records: &[UserRecord], needle: &str) -> Vec<UserRecord> {
    let needle = needle.to_lowercase();
    records
        .iter()
        .filter(|r| r.email.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

pub fn filter_by_date_bucket(
    records: &[UserRecord],
    bucket: DateBucket,
    now: OffsetDateTime,
) -> Vec<UserRecord> {
    records
        .iter()
        .filter(|r| in_bucket(r, bucket, now))
        .cloned()
        .collect()
}

fn in_bucket(record: &UserRecord, bucket: DateBucket, now: OffsetDateTime) -> bool {
    if bucket == DateBucket::All {
        return true;
    }
    // A timestamp that no longer parses silently drops out of every
    // time-bounded bucket.
    let ts = match record.parsed_timestamp() {
        Some(ts) => ts,
        None => return false,
    };
    match bucket {
        DateBucket::All => true,
        DateBucket::Today => ts.to_offset(now.offset()).date() == now.date(),
        DateBucket::Week => ts >= now - Duration::days(7),
        DateBucket::Month => ts >= now - Duration::days(30),
    }
}

/// CRUD over the user records persisted as one blob under [`USERS_KEY`].
///
/// Every mutation is a read-modify-write of the whole blob, serialized behind
/// one async lock so two concurrent writers cannot silently drop each other's
/// changes.
#[derive(Clone)]
pub struct UserStore {
    storage: Arc<dyn Storage>,
    write_lock: Arc<Mutex<()>>,
}

impl UserStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Read and deserialize the whole blob. An absent or corrupt blob loads
    /// as an empty set; the read path never surfaces a storage error.
    pub async fn load_all(&self) -> Vec<UserRecord> {
        let raw = match self.storage.read(USERS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "users blob unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "users blob corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Serialize the full sequence and overwrite the blob in one write.
    pub async fn save_all(&self, records: &[UserRecord]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(records).map_err(|e| StoreError::Storage(e.into()))?;
        self.storage.write(USERS_KEY, &raw).await?;
        Ok(())
    }

    /// Append a signup record. Rejects a duplicate email and a record whose
    /// timestamp would never match a date filter.
    pub async fn append(&self, record: UserRecord) -> Result<(), StoreError> {
        if record.parsed_timestamp().is_none() {
            return Err(StoreError::InvalidTimestamp);
        }
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await;
        if find_by_email(&records, &record.email).is_some() {
            return Err(StoreError::DuplicateEmail);
        }
        records.push(record);
        self.save_all(&records).await
    }

    /// Rewrite only the `password` field of the exact-match record.
    pub async fn update_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await;
        let record = records
            .iter_mut()
            .find(|r| r.email == email)
            .ok_or(StoreError::NotFound)?;
        record.password = new_password.to_string();
        self.save_all(&records).await
    }

    /// Flip the `blocked` flag on every record with this email and return the
    /// new state.
    pub async fn toggle_blocked(&self, email: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await;
        let mut matched = 0usize;
        let mut blocked = false;
        for record in records.iter_mut().filter(|r| r.email == email) {
            record.blocked = !record.blocked;
            blocked = record.blocked;
            matched += 1;
        }
        if matched == 0 {
            return Err(StoreError::NotFound);
        }
        if matched > 1 {
            warn!(email, matched, "multiple records share one email");
        }
        self.save_all(&records).await?;
        Ok(blocked)
    }

    /// Drop every record with this email and return how many went. Uniqueness
    /// is enforced on append, so more than one removal means the blob predates
    /// that check.
    pub async fn remove(&self, email: &str) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await;
        let before = records.len();
        records.retain(|r| r.email != email);
        let removed = before - records.len();
        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        if removed > 1 {
            warn!(email, removed, "multiple records share one email");
        }
        self.save_all(&records).await?;
        Ok(removed)
    }
}
