//! Speedtest process invocation with rate-limit retry
//!
//! The tool is run through the [`ToolRunner`] trait and backoff waits go through
//! [`Sleeper`], so the retry schedule can be driven without a real process or
//! real sleeps. Only the rate-limit exit code is retried; every other failure
//! ends the run immediately.

use log::{debug, error, info, trace, warn};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::{Result, SensorError};
use crate::settings::SensorSettings;
use crate::speedtest::result::SpeedtestResult;

/// Exit code the speedtest CLI uses when its upstream throttled the request
/// Unix keeps only the low 8 bits of an exit status, so there it arrives as
/// `429 & 0xFF` (173); see [`is_rate_limited`]
pub const RATE_LIMIT_EXIT_CODE: i32 = 429;

/// True when an exit code signals rate limiting on this platform
pub fn is_rate_limited(code: i32) -> bool {
    code == RATE_LIMIT_EXIT_CODE || (cfg!(unix) && code == (RATE_LIMIT_EXIT_CODE & 0xFF))
}

/// Captured result of one tool run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    /// `None` when the process ended without an exit code (signal)
    pub exit_code: Option<i32>,
    /// Standard output, lossily decoded; the JSON document on success
    pub stdout: String,
    /// Standard error, lossily decoded; only logged
    pub stderr: String,
}

/// Runs the speedtest tool once with the given arguments
pub trait ToolRunner {
    fn run(&self, args: &[String]) -> std::io::Result<ToolOutput>;
}

/// Waits between rate-limited attempts
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Runs the real executable as a child process
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
}

impl ProcessRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, args: &[String]) -> std::io::Result<ToolOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Blocks the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Attempt ceiling and first backoff delay; the delay doubles after every wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &SensorSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_delay: Duration::from_secs(settings.initial_backoff_secs),
        }
    }

    /// At least one attempt is always made
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after the given failed attempt (1-based): 10s, 20s, 40s, ...
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

/// Builds the speedtest command line
pub fn tool_arguments(source_ip: Option<IpAddr>, settings: &SensorSettings) -> Vec<String> {
    let mut args = vec!["--format=json".to_string()];
    if settings.accept_license {
        args.push("--accept-license".to_string());
        args.push("--accept-gdpr".to_string());
    }
    if let Some(ip) = source_ip {
        args.push(format!("--ip={ip}"));
    }
    if let Some(server_id) = settings.server_id {
        args.push(format!("--server-id={server_id}"));
    }
    args
}

/// Runs the tool until it succeeds, fails for good, or runs out of attempts
#[derive(Debug)]
pub struct Invoker<R, S> {
    runner: R,
    sleeper: S,
    policy: RetryPolicy,
}

impl<R: ToolRunner, S: Sleeper> Invoker<R, S> {
    pub fn new(runner: R, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            runner,
            sleeper,
            policy,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs the tool with retry and parses its JSON output
    pub fn run(&self, args: &[String]) -> Result<SpeedtestResult> {
        let attempts = self.policy.attempts();
        let retry_start = Instant::now();

        debug!(
            "Starting speedtest with args {:?} (max_attempts={}, initial_delay={}s)",
            args,
            attempts,
            self.policy.initial_delay.as_secs()
        );

        for attempt in 1..=attempts {
            let attempt_start = Instant::now();
            let output = self.runner.run(args).map_err(|e| {
                error!("Failed to launch speedtest on attempt {}/{}: {}", attempt, attempts, e);
                SensorError::Launch(e)
            })?;
            let attempt_ms = attempt_start.elapsed().as_secs_f64() * 1000.0;

            match output.exit_code {
                Some(0) => {
                    if attempt > 1 {
                        info!(
                            "Speedtest succeeded after rate limiting: attempt {}/{} (total_duration={:.3}s)",
                            attempt,
                            attempts,
                            retry_start.elapsed().as_secs_f64()
                        );
                    } else {
                        trace!("Speedtest succeeded on first attempt (duration={:.3}ms)", attempt_ms);
                    }
                    return parse_output(&output);
                }
                Some(code) if is_rate_limited(code) && attempt < attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        "Speedtest rate limited (exit code {}) on attempt {}/{} (duration={:.3}ms) - retrying with exponential backoff in {}s",
                        code,
                        attempt,
                        attempts,
                        attempt_ms,
                        delay.as_secs()
                    );
                    self.sleeper.sleep(delay);
                }
                Some(code) if is_rate_limited(code) => {
                    error!(
                        "Speedtest rate limited on final attempt {}/{} - no more retries (total_duration={:.3}s)",
                        attempt,
                        attempts,
                        retry_start.elapsed().as_secs_f64()
                    );
                }
                Some(code) => {
                    error!(
                        "Speedtest exited with code {} on attempt {}/{}: {}",
                        code,
                        attempt,
                        attempts,
                        output.stderr.trim()
                    );
                    return Err(SensorError::ToolFailed { code });
                }
                None => {
                    error!("Speedtest terminated without an exit code: {}", output.stderr.trim());
                    return Err(SensorError::ToolTerminated);
                }
            }
        }

        Err(SensorError::RetriesExhausted { attempts })
    }
}

fn parse_output(output: &ToolOutput) -> Result<SpeedtestResult> {
    if output.stdout.trim().is_empty() {
        error!("Speedtest exited successfully but wrote no output: {}", output.stderr.trim());
        return Err(SensorError::EmptyOutput);
    }
    trace!("Speedtest output: {}", output.stdout.trim());
    SpeedtestResult::from_json(&output.stdout)
}
