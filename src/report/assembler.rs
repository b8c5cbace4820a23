//! Report assembly
//!
//! Channel order is fixed: the three headline channels always come first, the
//! detailed set follows only when requested, and each detailed channel appears
//! only if the tool reported its value.

use crate::cli::arguments::InvocationParams;
use crate::report::Report;
use crate::report::channel::Channel;
use crate::speedtest::metrics::{Metrics, TransferMetrics};
use crate::speedtest::result::ValidatedResult;

/// Label used in the summary when no source address was given
pub const DEFAULT_INTERFACE_LABEL: &str = "Default Interface";

/// Label used in the summary when the tool did not name its server
pub const UNKNOWN_SERVER_LABEL: &str = "unknown server";

/// Unit label for jitter channels
const JITTER_UNIT: &str = "ms";

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn push_transfer_details(channels: &mut Vec<Channel>, direction: &str, metrics: &TransferMetrics) {
    let latencies = [
        ("Latency IQM", metrics.latency_iqm),
        ("Latency Low", metrics.latency_low),
        ("Latency High", metrics.latency_high),
    ];
    for (label, value) in latencies {
        if let Some(value) = value {
            channels.push(Channel::response_time(
                &format!("{direction} {label}"),
                value,
            ));
        }
    }
    if let Some(jitter) = metrics.jitter {
        channels.push(Channel::custom(
            &format!("{direction} Jitter"),
            jitter,
            JITTER_UNIT,
        ));
    }
}

/// Builds the ordered channel list
pub fn channels(metrics: &Metrics, detailed: bool) -> Vec<Channel> {
    let mut channels = vec![
        Channel::speed("Download Speed", metrics.download.bits_per_second),
        Channel::speed("Upload Speed", metrics.upload.bits_per_second),
        Channel::response_time("Ping", metrics.ping.latency_ms),
    ];

    if !detailed {
        return channels;
    }

    push_transfer_details(&mut channels, "Download", &metrics.download);
    push_transfer_details(&mut channels, "Upload", &metrics.upload);

    if let Some(jitter) = metrics.ping.jitter {
        channels.push(Channel::custom("Ping Jitter", jitter, JITTER_UNIT));
    }
    if let Some(low) = metrics.ping.low {
        channels.push(Channel::response_time("Ping Low", low));
    }
    if let Some(high) = metrics.ping.high {
        channels.push(Channel::response_time("Ping High", high));
    }
    if let Some(loss) = metrics.packet_loss {
        channels.push(Channel::percent("Packet Loss", loss));
    }

    channels
}

/// Builds the trailing summary text (unescaped; escaping happens on render)
pub fn summary_text(params: &InvocationParams, result: &ValidatedResult) -> String {
    let source = params
        .source_ip
        .map_or_else(|| DEFAULT_INTERFACE_LABEL.to_string(), |ip| ip.to_string());
    let host = non_empty(result.server.host.as_deref()).unwrap_or(UNKNOWN_SERVER_LABEL);

    let mut parts = vec![format!("Speedtest via {source} on {host}")];

    if let Some(isp) = non_empty(result.isp.as_deref()) {
        parts.push(format!("ISP: {isp}"));
    }
    if let Some(external_ip) = non_empty(result.interface.external_ip.as_deref()) {
        parts.push(format!("ExternalIP: {external_ip}"));
    }
    if let Some(server_ip) = non_empty(result.server.ip.as_deref()) {
        parts.push(format!("ServerIP: {server_ip}"));
    }
    if let Some(location) = non_empty(result.server.location.as_deref()) {
        match non_empty(result.server.country.as_deref()) {
            Some(country) => parts.push(format!("ServerLocation: {location}, {country}")),
            None => parts.push(format!("ServerLocation: {location}")),
        }
    }

    parts.join(" | ")
}

/// Assembles the success report for a validated measurement
pub fn assemble(params: &InvocationParams, metrics: &Metrics, result: &ValidatedResult) -> Report {
    Report::Success {
        channels: channels(metrics, params.detailed),
        text: summary_text(params, result),
    }
}
