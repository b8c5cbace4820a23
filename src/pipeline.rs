//! End-to-end sensor run
//!
//! Stages run strictly in order: resolve → invoke → validate → convert →
//! assemble. [`guarded`] is the only place where a terminal error, or a panic,
//! is turned into the error document.

use log::{debug, error, info};
use std::panic::{self, AssertUnwindSafe};

use crate::cli::arguments::{InvocationParams, resolve_invocation};
use crate::cli::commands::Cli;
use crate::errors::{Result, SensorError};
use crate::report::formatting::{format_bits_per_second, format_float};
use crate::report::{Report, assemble};
use crate::settings::SensorSettings;
use crate::speedtest::invoker::{
    Invoker, ProcessRunner, RetryPolicy, Sleeper, ThreadSleeper, ToolRunner, tool_arguments,
};
use crate::speedtest::metrics::Metrics;

/// Runs the measurement for already-resolved parameters
pub fn measure<R: ToolRunner, S: Sleeper>(
    params: &InvocationParams,
    settings: &SensorSettings,
    invoker: &Invoker<R, S>,
) -> Result<Report> {
    let args = tool_arguments(params.source_ip, settings);
    let result = invoker.run(&args)?.validate()?;
    let metrics = Metrics::from_result(&result);

    info!(
        "Speedtest finished: download={}, upload={}, ping={}ms, server={} ({}), result={}",
        format_bits_per_second(metrics.download.bits_per_second),
        format_bits_per_second(metrics.upload.bits_per_second),
        format_float(metrics.ping.latency_ms),
        result.server.id.as_deref().unwrap_or("-"),
        result.server.name.as_deref().unwrap_or("-"),
        result
            .result
            .as_ref()
            .and_then(|link| link.url.as_deref())
            .unwrap_or("-"),
    );
    debug!(
        "Transfer sizes: download={:?} bytes in {:?}ms, upload={:?} bytes in {:?}ms, interface={:?} ({:?}, vpn={:?}), server_port={:?}",
        result.download.bytes,
        result.download.elapsed,
        result.upload.bytes,
        result.upload.elapsed,
        result.interface.name,
        result.interface.internal_ip,
        result.interface.is_vpn,
        result.server.port,
    );

    Ok(assemble(params, &metrics, &result))
}

/// Resolves the command line, loads settings and runs the real speedtest executable
pub fn run_sensor(cli: &Cli) -> Result<Report> {
    let params = resolve_invocation(cli)?;
    let settings = SensorSettings::load(cli.config.as_deref())?;

    let runner = ProcessRunner::new(settings.speedtest_command(cli.speedtest_path.as_deref()));
    debug!("Using speedtest executable {}", runner.program().display());

    let invoker = Invoker::new(runner, ThreadSleeper, RetryPolicy::from_settings(&settings));
    measure(&params, &settings, &invoker)
}

/// Logs a terminal error and converts it into the error document
pub fn error_report(error: &SensorError) -> Report {
    error!("Sensor run failed ({}): {}", error.kind(), error);
    Report::from(error)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs a stage and always yields a report, whatever happens inside it
pub fn guarded<F>(run: F) -> Report
where
    F: FnOnce() -> Result<Report>,
{
    match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(report)) => report,
        Ok(Err(error)) => error_report(&error),
        Err(payload) => error_report(&SensorError::Unexpected(panic_message(payload.as_ref()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_passes_reports_through() {
        let report = guarded(|| {
            Ok(Report::Success {
                channels: Vec::new(),
                text: "ok".to_string(),
            })
        });
        assert!(!report.is_error());
    }

    #[test]
    fn test_guarded_converts_errors() {
        let report = guarded(|| Err(SensorError::EmptyOutput));
        assert_eq!(
            report,
            Report::Error {
                message: "Speedtest returned no output".to_string()
            }
        );
    }

    #[test]
    fn test_guarded_converts_panics() {
        let report = guarded(|| panic!("boom & bust"));
        match &report {
            Report::Error { message } => assert_eq!(message, "Unexpected error: boom & bust"),
            other => panic!("expected error report, got {other:?}"),
        }
        assert!(report.to_xml().contains("boom &amp; bust"));
    }

    #[test]
    fn test_invalid_ip_stops_before_settings_or_tool() {
        let cli = Cli {
            ip: Some("not-an-ip".to_string()),
            config: Some("/nonexistent/sensor.toml".into()),
            ..Cli::default()
        };
        assert!(matches!(run_sensor(&cli), Err(SensorError::InvalidIp(_))));
    }
}
