//! Persistent progress ledger.
//!
//! The ledger file is the only shared mutable state of a run. [`LedgerStore`]
//! owns it; everything else receives snapshots.

pub mod overrides;
pub mod paths;
pub mod store;

pub use overrides::ConfigOverrides;
pub use paths::{LedgerLocation, LedgerMode, IN_REPO_LEDGER_FILE, MANIFEST_NAMES, WORKSPACE_LEDGER_FILE};
pub use store::LedgerStore;
