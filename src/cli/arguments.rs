//! Resolution of invocation parameters
//!
//! Turns the parsed command line into the immutable [`InvocationParams`] used by
//! the rest of the pipeline. Named flags take precedence over bare tokens, and an
//! absent source address is valid: the test then runs on the default interface.

use log::debug;
use std::net::IpAddr;

use crate::cli::commands::Cli;
use crate::errors::{Result, SensorError};

/// Tokens that switch on the detailed channel set when they show up as bare tokens
const DETAILED_TOKENS: [&str; 3] = ["-d", "--detailed", "-detailed"];

/// Parameters resolved once at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InvocationParams {
    /// Address to bind the measurement to, `None` for the default interface
    pub source_ip: Option<IpAddr>,
    /// Emit latency, jitter and packet loss channels
    pub detailed: bool,
}

fn is_detailed_token(token: &str) -> bool {
    DETAILED_TOKENS
        .iter()
        .any(|candidate| token.eq_ignore_ascii_case(candidate))
}

/// Picks the raw source address: `-i`, then `--ipaddress`, then the first bare token
///
/// Empty or whitespace-only values count as not supplied.
pub fn resolve_source_ip(cli: &Cli) -> Option<&str> {
    let first_positional = cli
        .rest
        .iter()
        .map(String::as_str)
        .find(|token| !is_detailed_token(token));

    [cli.ip.as_deref(), cli.ipaddress.as_deref(), first_positional]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
}

/// Detailed mode: either named switch, or a detailed token anywhere among the bare tokens
pub fn resolve_detailed(cli: &Cli) -> bool {
    cli.d || cli.detailed || cli.rest.iter().any(|token| is_detailed_token(token))
}

/// Validates an IPv4 or IPv6 literal
pub fn validate_ip(candidate: &str) -> Result<IpAddr> {
    candidate
        .parse::<IpAddr>()
        .map_err(|_| SensorError::InvalidIp(candidate.to_string()))
}

/// Resolves and validates the parameters for this run
pub fn resolve_invocation(cli: &Cli) -> Result<InvocationParams> {
    let source_ip = resolve_source_ip(cli).map(validate_ip).transpose()?;
    let detailed = resolve_detailed(cli);

    debug!(
        "Resolved invocation: source_ip={}, detailed={}",
        source_ip.map_or_else(|| "default".to_string(), |ip| ip.to_string()),
        detailed
    );

    Ok(InvocationParams {
        source_ip,
        detailed,
    })
}
