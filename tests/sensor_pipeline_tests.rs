use speedtest_sensor::cli::{InvocationParams, parse_args, resolve_invocation};
use speedtest_sensor::pipeline::{error_report, guarded, measure};
use speedtest_sensor::report::{ChannelValue, Report};
use speedtest_sensor::settings::SensorSettings;
use speedtest_sensor::speedtest::{Invoker, RetryPolicy, Sleeper, ToolOutput, ToolRunner};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// End-to-end sensor runs against a scripted speedtest tool
/// These tests drive the whole pipeline through the public API without spawning processes

const FULL_PAYLOAD: &str = r#"{
    "type": "result",
    "ping": {"jitter": 0.412, "latency": 14.2, "low": 13.8, "high": 15.1},
    "download": {"bandwidth": 12500000, "bytes": 150000000, "elapsed": 12000,
                 "latency": {"iqm": 22.5, "low": 14.0, "high": 80.2, "jitter": 3.1}},
    "upload": {"bandwidth": 2500000, "bytes": 30000000, "elapsed": 11000,
               "latency": {"iqm": 40.1, "low": 15.0, "high": 120.9, "jitter": 5.2}},
    "packetLoss": 0.25,
    "isp": "Fiber & Cable",
    "interface": {"internalIp": "192.168.1.20", "name": "eth0", "externalIp": "203.0.113.7"},
    "server": {"id": 1234, "host": "speedtest.example.net", "name": "Example <Berlin>",
               "location": "Berlin", "country": "Germany", "ip": "198.51.100.1"},
    "result": {"id": "abc-123", "url": "https://www.speedtest.net/result/c/abc-123"}
}"#;

struct ScriptedRunner {
    outputs: RefCell<VecDeque<ToolOutput>>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    fn new(outputs: Vec<ToolOutput>) -> Self {
        Self {
            outputs: RefCell::new(outputs.into()),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, args: &[String]) -> std::io::Result<ToolOutput> {
        self.calls.borrow_mut().push(args.to_vec());
        self.outputs
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| std::io::Error::other("no more scripted outputs"))
    }
}

#[derive(Default)]
struct RecordingSleeper {
    waits: RefCell<Vec<Duration>>,
}

impl Sleeper for &RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

fn success(stdout: &str) -> ToolOutput {
    ToolOutput {
        exit_code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn exit(code: i32) -> ToolOutput {
    ToolOutput {
        exit_code: Some(code),
        stdout: String::new(),
        stderr: "{\"type\":\"log\",\"level\":\"error\",\"message\":\"Too many requests\"}".to_string(),
    }
}

/// Runs the pipeline the way the binary does, returning the document and the calls made
fn run_scripted(
    params: InvocationParams,
    outputs: Vec<ToolOutput>,
    sleeper: &RecordingSleeper,
) -> (Report, Vec<Vec<String>>) {
    let settings = SensorSettings::default();
    let invoker = Invoker::new(
        ScriptedRunner::new(outputs),
        sleeper,
        RetryPolicy::from_settings(&settings),
    );
    let report = guarded(|| measure(&params, &settings, &invoker));
    let calls = invoker.runner().calls.borrow().clone();
    (report, calls)
}

fn channel_value(report: &Report, name: &str) -> Option<ChannelValue> {
    match report {
        Report::Success { channels, .. } => channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value),
        Report::Error { .. } => None,
    }
}

#[test]
fn test_successful_run_produces_basic_channels() {
    let sleeper = RecordingSleeper::default();
    let (report, calls) = run_scripted(
        InvocationParams::default(),
        vec![success(FULL_PAYLOAD)],
        &sleeper,
    );

    assert!(!report.is_error());
    assert_eq!(
        channel_value(&report, "Download Speed"),
        Some(ChannelValue::Integer(100_000_000))
    );
    assert_eq!(
        channel_value(&report, "Upload Speed"),
        Some(ChannelValue::Integer(20_000_000))
    );
    assert_eq!(channel_value(&report, "Ping"), Some(ChannelValue::Float(14.2)));
    // detailed channels only on request
    assert_eq!(channel_value(&report, "Packet Loss"), None);

    // default interface: no binding argument
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains(&"--format=json".to_string()));
    assert!(calls[0].iter().all(|arg| !arg.starts_with("--ip")));
}

#[test]
fn test_document_text_is_escaped() {
    let sleeper = RecordingSleeper::default();
    let (report, _) = run_scripted(
        InvocationParams::default(),
        vec![success(FULL_PAYLOAD)],
        &sleeper,
    );

    let xml = report.to_xml();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<prtg>\n"));
    assert!(xml.contains(
        "<text>Speedtest via Default Interface on speedtest.example.net | ISP: Fiber &amp; Cable | \
         ExternalIP: 203.0.113.7 | ServerIP: 198.51.100.1 | ServerLocation: Berlin, Germany</text>"
    ));
    assert!(!xml.contains("Fiber & Cable"));
}

#[test]
fn test_detailed_run_with_source_ip() {
    let cli = parse_args(["speedtest-sensor", "192.168.1.20", "-d"]).expect("parse");
    let params = resolve_invocation(&cli).expect("valid params");
    assert!(params.detailed);

    let sleeper = RecordingSleeper::default();
    let (report, calls) = run_scripted(params, vec![success(FULL_PAYLOAD)], &sleeper);

    assert!(calls[0].contains(&"--ip=192.168.1.20".to_string()));
    assert_eq!(
        channel_value(&report, "Download Latency IQM"),
        Some(ChannelValue::Float(22.5))
    );
    assert_eq!(
        channel_value(&report, "Upload Jitter"),
        Some(ChannelValue::Float(5.2))
    );
    assert_eq!(
        channel_value(&report, "Ping Jitter"),
        Some(ChannelValue::Float(0.41))
    );
    assert_eq!(
        channel_value(&report, "Packet Loss"),
        Some(ChannelValue::Float(0.25))
    );

    let xml = report.to_xml();
    assert!(xml.contains("Speedtest via 192.168.1.20 on speedtest.example.net"));
    assert!(xml.contains("<channel>Packet Loss</channel>\n    <value>0.25</value>\n    <unit>Percent</unit>"));
}

#[test]
fn test_missing_ping_latency_defaults_to_zero() {
    let payload = r#"{"download": {"bandwidth": 1}, "upload": {"bandwidth": 1}, "ping": {"jitter": 1.5}}"#;
    let sleeper = RecordingSleeper::default();
    let (report, _) = run_scripted(InvocationParams::default(), vec![success(payload)], &sleeper);

    assert_eq!(channel_value(&report, "Ping"), Some(ChannelValue::Float(0.0)));
    assert!(report.to_xml().contains("<channel>Ping</channel>\n    <value>0</value>"));
}

#[test]
fn test_missing_upload_is_incomplete_data() {
    let payload = r#"{"download": {"bandwidth": 12500000, "latency": {"iqm": 1}}, "ping": {"latency": 14.2}}"#;
    let sleeper = RecordingSleeper::default();
    let (report, _) = run_scripted(InvocationParams::default(), vec![success(payload)], &sleeper);

    assert_eq!(
        report,
        Report::Error {
            message: "Speedtest returned incomplete data: missing upload".to_string()
        }
    );
    assert!(report.to_xml().contains("<error>1</error>"));
}

#[test]
fn test_rate_limited_twice_then_success() {
    let sleeper = RecordingSleeper::default();
    let (report, calls) = run_scripted(
        InvocationParams::default(),
        vec![exit(429), exit(429), success(FULL_PAYLOAD)],
        &sleeper,
    );

    assert!(!report.is_error());
    assert!(!report.to_xml().contains("<error>"));
    assert_eq!(calls.len(), 3);
    assert_eq!(
        *sleeper.waits.borrow(),
        vec![Duration::from_secs(10), Duration::from_secs(20)]
    );
}

#[test]
fn test_rate_limited_until_ceiling() {
    let sleeper = RecordingSleeper::default();
    let (report, calls) = run_scripted(
        InvocationParams::default(),
        vec![exit(429), exit(429), exit(429)],
        &sleeper,
    );

    assert_eq!(calls.len(), 3);
    assert_eq!(
        report,
        Report::Error {
            message: "Speedtest rate limited (429) after 3 attempts".to_string()
        }
    );
}

#[test]
fn test_non_retryable_exit_code() {
    let sleeper = RecordingSleeper::default();
    let (report, calls) = run_scripted(InvocationParams::default(), vec![exit(1)], &sleeper);

    assert_eq!(calls.len(), 1);
    assert!(sleeper.waits.borrow().is_empty());
    assert_eq!(
        report,
        Report::Error {
            message: "Speedtest failed with exit code 1".to_string()
        }
    );
}

#[test]
fn test_invalid_ip_document() {
    for invalid in ["999.999.1.1", "not-an-ip"] {
        let cli = parse_args(["speedtest-sensor", "-i", invalid]).expect("parse");
        let error = resolve_invocation(&cli).expect_err("address must be rejected");
        let report = error_report(&error);
        assert!(report.is_error());
        assert!(report.to_xml().contains(&format!(
            "<text>Invalid IP address: &apos;{invalid}&apos;</text>"
        )));
    }
}

#[test]
fn test_identical_output_renders_identical_documents() {
    let first_sleeper = RecordingSleeper::default();
    let (first, _) = run_scripted(
        InvocationParams {
            source_ip: None,
            detailed: true,
        },
        vec![success(FULL_PAYLOAD)],
        &first_sleeper,
    );
    let second_sleeper = RecordingSleeper::default();
    let (second, _) = run_scripted(
        InvocationParams {
            source_ip: None,
            detailed: true,
        },
        vec![success(FULL_PAYLOAD)],
        &second_sleeper,
    );

    assert_eq!(first.to_xml().into_bytes(), second.to_xml().into_bytes());
}
