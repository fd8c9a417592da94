//! Data models for revsync

mod review;
mod settings;

pub use review::{
    external_id_for, format_review_date, ReviewId, ReviewMeta, ReviewPost, ReviewRecord,
    ReviewStatus, EXTERNAL_ID_PREFIX,
};
pub use settings::{Credentials, SyncFrequency, SyncSettings};
