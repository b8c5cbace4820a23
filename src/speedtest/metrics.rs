//! Unit conversion from raw speedtest values to sensor channel values
//!
//! Bandwidth is reported by the tool in bytes per second and converted to bits per
//! second. Latencies stay in milliseconds. Conversion never fails: missing numbers
//! either default to zero (headline channels) or stay absent (detail channels).

use crate::report::formatting::round_to;
use crate::speedtest::result::{Ping, Transfer, ValidatedResult};

/// Decimal places kept for latency values in milliseconds
pub const LATENCY_PRECISION: u32 = 2;

/// Decimal places kept for packet loss percentages
pub const PACKET_LOSS_PRECISION: u32 = 3;

/// Converts bytes per second to whole bits per second, absent values become 0
pub fn bytes_to_bits_per_second(bandwidth: Option<f64>) -> i64 {
    bandwidth.map_or(0, |bytes_per_second| (bytes_per_second * 8.0).round() as i64)
}

/// Keeps a detail value only when it was reported and is non-zero
fn detail(value: Option<f64>) -> Option<f64> {
    value
        .filter(|v| *v != 0.0)
        .map(|v| round_to(v, LATENCY_PRECISION))
}

/// Converted values for one transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransferMetrics {
    pub bits_per_second: i64,
    pub latency_iqm: Option<f64>,
    pub latency_low: Option<f64>,
    pub latency_high: Option<f64>,
    pub jitter: Option<f64>,
}

impl TransferMetrics {
    pub fn from_transfer(transfer: &Transfer) -> Self {
        let latency = transfer.latency.clone().unwrap_or_default();
        Self {
            bits_per_second: bytes_to_bits_per_second(transfer.bandwidth),
            latency_iqm: detail(latency.iqm),
            latency_low: detail(latency.low),
            latency_high: detail(latency.high),
            jitter: detail(latency.jitter),
        }
    }
}

/// Converted idle latency values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PingMetrics {
    pub latency_ms: f64,
    pub jitter: Option<f64>,
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl PingMetrics {
    pub fn from_ping(ping: &Ping) -> Self {
        Self {
            latency_ms: ping
                .latency
                .map_or(0.0, |latency| round_to(latency, LATENCY_PRECISION)),
            jitter: detail(ping.jitter),
            low: detail(ping.low),
            high: detail(ping.high),
        }
    }
}

/// All channel values of one measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metrics {
    pub download: TransferMetrics,
    pub upload: TransferMetrics,
    pub ping: PingMetrics,
    pub packet_loss: Option<f64>,
}

impl Metrics {
    pub fn from_result(result: &ValidatedResult) -> Self {
        Self {
            download: TransferMetrics::from_transfer(&result.download),
            upload: TransferMetrics::from_transfer(&result.upload),
            ping: PingMetrics::from_ping(&result.ping),
            packet_loss: result
                .packet_loss
                .map(|loss| round_to(loss, PACKET_LOSS_PRECISION)),
        }
    }
}
