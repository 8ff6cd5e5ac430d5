mod record;
mod store;

pub use record::UserRecord;
pub use store::{
    filter_by_date_bucket, find_by_email, search, DateBucket, StoreError, UserStore, USERS_KEY,
};
