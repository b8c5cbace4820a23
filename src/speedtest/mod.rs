//! Speedtest CLI integration
//!
//! - `invoker`: runs the tool with rate-limit retry
//! - `result`: JSON schema and completeness validation
//! - `metrics`: unit conversion into channel values

pub mod invoker;
pub mod metrics;
pub mod result;

pub use invoker::{
    Invoker, ProcessRunner, RATE_LIMIT_EXIT_CODE, RetryPolicy, Sleeper, ThreadSleeper, ToolOutput,
    ToolRunner, is_rate_limited, tool_arguments,
};
pub use metrics::Metrics;
pub use result::{SpeedtestResult, ValidatedResult};
