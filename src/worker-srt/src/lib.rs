pub mod check;
pub mod config;
pub mod errors;
pub mod progress;

pub use errors::Error;

pub use check::{CheckSummary, RankingCheckJob, RunGuard};
pub use config::CheckConfig;
pub use progress::{ProgressReport, ProgressReporter, WorkerProgress, WorkerStatus};
