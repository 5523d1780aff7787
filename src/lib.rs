// Library surface shared by the binary and the integration tests.
pub mod app_dirs;
pub mod attempt;
pub mod clock;
pub mod config;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod replay;
pub mod time_series;

pub use matcher::{evaluate, WordCredit};
pub use metrics::{compute_metrics, Keystrokes, LiveMetrics};
