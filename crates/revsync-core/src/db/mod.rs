//! Database layer for revsync

mod connection;
mod lock_repository;
mod migrations;
mod repository;
mod schedule_repository;
mod settings_repository;

pub use connection::Database;
pub use lock_repository::{LibSqlSyncLockRepository, SyncLockRepository};
pub use repository::{LibSqlReviewRepository, ReviewRepository};
pub use schedule_repository::{LibSqlScheduleRepository, ScheduleRepository, ScheduledEvent};
pub use settings_repository::{LibSqlSettingsRepository, SettingsRepository};
