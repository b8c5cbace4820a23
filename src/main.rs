use anyhow::Result;
use clap::error::ErrorKind;
use std::io::Write;
use std::process::ExitCode;

use speedtest_sensor::SensorError;
use speedtest_sensor::cli::parse_args;
use speedtest_sensor::pipeline::{error_report, guarded, run_sensor};

fn main() -> Result<ExitCode> {
    env_logger::init();

    let report = match parse_args(std::env::args_os()) {
        Ok(cli) => guarded(|| run_sensor(&cli)),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let rendered = e.to_string();
            let message = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            error_report(&SensorError::Usage(message))
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(report.to_xml().as_bytes())?;
    stdout.flush()?;

    Ok(if report.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
