//! Mapping logical file references onto a checkout, and the `.original`
//! backups that mark a file as already transformed.

pub mod backup;
pub mod migrate;
pub mod resolve;

pub use backup::{
    backup_path, create_backup, has_backup, is_backup, reset_from_backup, restore, to_repo_relative,
    RestoreOutcome,
};
pub use migrate::{detect_legacy_backups, migrate_legacy_backups, LegacyBackup, MigrationReport};
pub use resolve::{normalize, resolve};
