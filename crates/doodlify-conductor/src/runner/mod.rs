pub mod analyze;
pub mod message;
pub mod process;
pub mod push;
pub mod restore;

pub use analyze::{run_analyze, AnalyzeOptions, AnalyzeReport};
pub use process::{run_process, EventOutcome, EventReport, ProcessCapabilities, ProcessOptions, ProcessReport};
pub use push::{run_push, PushReport, PushedEvent};
pub use restore::{run_restore, RestoreReport};
