//! Read-only aggregation of OpenClaw agent state and host counters into dashboard snapshots.

pub mod error;
pub mod host;
pub mod paths;
pub mod readers;
pub mod sampler;
pub mod state;
pub mod tail;
pub mod timeline;
pub mod types;

pub use error::{Error, Result};
pub use paths::Paths;
pub use state::{Applied, RefreshOutcome, RefreshState, Refresher};
pub use types::*;
