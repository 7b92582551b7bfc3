pub mod aggregate;
pub mod common;
pub mod retry;
pub mod serp;
pub mod visibility;

pub use common::db_env::{get_database_url, get_db_pool};
pub use common::env_config::{TimeUnit, get_duration, parse_duration, parse_number};
pub use common::health::health_router;
pub use common::hostname::{HostPortError, get_api_base_url, get_bind_address};
pub use common::logging::setup_logging;

pub use data_model_srt::db;

pub use retry::{CheckOutcome, RetryPolicy, lookup_with_retry};
pub use serp::{LookupError, RankLookup, RankQuery, RankResult, ValueSerp};
pub use visibility::{Sistrix, VisibilityError, VisibilityPoint, VisibilityProvider};
