//! PRTG sensor for the Ookla speedtest CLI
//!
//! Resolves the invocation, runs the tool with rate-limit retry, validates and
//! converts its JSON result, and renders exactly one PRTG XML document, which is
//! the error document on every failure path.

pub mod cli;
pub mod errors;
pub mod pipeline;
pub mod report;
pub mod settings;
pub mod speedtest;

pub use errors::{Result, SensorError};
pub use report::Report;
