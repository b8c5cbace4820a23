use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

/// Command line of the speedtest sensor
/// Named and bare positional forms are accepted interchangeably so existing
/// sensor definitions (`sensor 10.0.0.5 -d`) keep working
#[derive(Parser, Debug, Default)]
#[command(author = "Kaipo Chen")]
#[command(version)] // Automatically uses version from Cargo.toml
#[command(about = "PRTG sensor that runs the speedtest CLI and reports bandwidth and latency channels")]
#[command(long_about = "Runs the Ookla speedtest CLI, optionally bound to a source interface address, \
and prints a single PRTG EXE/Script Advanced XML document on stdout. Failures are reported \
as an error document and a non-zero exit code.\n\n\
Examples:\n  \
speedtest-sensor                          # Test on the default interface\n  \
speedtest-sensor -i 192.168.1.20          # Bind to a source address\n  \
speedtest-sensor 192.168.1.20 -d          # Positional address with detailed channels\n  \
speedtest-sensor -ipaddress 10.0.0.5 -detailed")]
pub struct Cli {
    /// Source interface address to bind the test to
    #[arg(short = 'i', value_name = "IP", help = "Source interface IP address")]
    pub ip: Option<String>,

    /// Alternate spelling of the source address flag
    #[arg(
        long = "ipaddress",
        value_name = "IP",
        help = "Source interface IP address (alternate form of -i)"
    )]
    pub ipaddress: Option<String>,

    /// Short detailed switch
    #[arg(short = 'd', help = "Emit latency, jitter and packet loss channels")]
    pub d: bool,

    /// Long detailed switch
    #[arg(
        long = "detailed",
        help = "Emit latency, jitter and packet loss channels (alternate form of -d)"
    )]
    pub detailed: bool,

    /// Path to the speedtest executable, overriding settings
    #[arg(long, value_name = "PATH", help = "Path to the speedtest executable")]
    pub speedtest_path: Option<PathBuf>,

    /// Optional settings file
    #[arg(long, value_name = "FILE", help = "Settings file (toml, json, yaml, ini)")]
    pub config: Option<PathBuf>,

    /// Leftover bare tokens; the first one is a fallback source address
    /// Named flags are still recognized after these, anything after `--` lands here verbatim
    #[arg(value_name = "ARGS")]
    pub rest: Vec<String>,
}

/// Legacy single-dash long flags and their clap spelling
const LEGACY_FLAGS: [(&str, &str); 2] = [("ipaddress", "--ipaddress"), ("detailed", "--detailed")];

/// Rewrites `-ipaddress` / `-Detailed` style tokens into clap's `--ipaddress` / `--detailed`
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let name = text.trim_start_matches('-');
            if name.len() == text.len() || text.len() - name.len() > 2 {
                return arg;
            }
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| name.eq_ignore_ascii_case(legacy))
                .map(|(_, canonical)| OsString::from(*canonical))
                .unwrap_or(arg)
        })
        .collect()
}

/// Parses a full argv (program name first) after legacy flag normalization
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    Cli::try_parse_from(normalize_legacy_flags(args))
}
