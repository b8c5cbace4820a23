//! Speedtest JSON result schema
//!
//! Mirrors the `--format=json` output of the Ookla speedtest CLI. Every field is
//! optional and numeric fields decode leniently: absent, `null` or non-numeric
//! values become `None` instead of failing the whole document.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::errors::{Result, SensorError};

/// Decodes a number, a numeric string, or anything else as `None`
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|n| n.is_finite()))
}

/// Decodes a string; numbers are rendered, anything else is `None`
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Decodes an integer in `u16` range (or its string form); anything else is `None`
fn lenient_u16<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<u16>().ok(),
        _ => None,
    })
}

/// Decodes a boolean or a `"true"`/`"false"` string; anything else is `None`
fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::String(s)) => s.trim().to_ascii_lowercase().parse::<bool>().ok(),
        _ => None,
    })
}

/// Decodes a nested record only when it is a non-empty JSON object
fn non_empty_record<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) if !map.is_empty() => serde_json::from_value(Value::Object(map))
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Latency observed while a transfer was running
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransferLatency {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub iqm: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub jitter: Option<f64>,
}

/// One direction of the measurement (download or upload)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Transfer {
    /// Throughput in bytes per second
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bandwidth: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bytes: Option<f64>,
    /// Transfer duration in milliseconds
    #[serde(default, deserialize_with = "lenient_f64")]
    pub elapsed: Option<f64>,
    #[serde(default, deserialize_with = "non_empty_record")]
    pub latency: Option<TransferLatency>,
}

/// Idle latency measurement, all values in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Ping {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub jitter: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
}

/// Test server chosen by the tool; ids and hosts are kept as text
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Server {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub host: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "lenient_u16")]
    pub port: Option<u16>,
}

/// Local interface the test ran on
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    #[serde(default, deserialize_with = "lenient_string")]
    pub internal_ip: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub external_ip: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_vpn: Option<bool>,
}

/// Link to the result page on speedtest.net
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultLink {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

/// Parsed speedtest output
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedtestResult {
    #[serde(default, deserialize_with = "non_empty_record")]
    pub download: Option<Transfer>,
    #[serde(default, deserialize_with = "non_empty_record")]
    pub upload: Option<Transfer>,
    #[serde(default, deserialize_with = "non_empty_record")]
    pub ping: Option<Ping>,
    #[serde(default, deserialize_with = "non_empty_record")]
    pub server: Option<Server>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub isp: Option<String>,
    #[serde(default, deserialize_with = "non_empty_record")]
    pub interface: Option<Interface>,
    /// Packet loss in percent; the tool omits it when it could not be measured
    #[serde(default, deserialize_with = "lenient_f64")]
    pub packet_loss: Option<f64>,
    #[serde(default, deserialize_with = "non_empty_record")]
    pub result: Option<ResultLink>,
}

/// A result whose download, upload and ping records are known to be present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResult {
    pub download: Transfer,
    pub upload: Transfer,
    pub ping: Ping,
    pub server: Server,
    pub isp: Option<String>,
    pub interface: Interface,
    pub packet_loss: Option<f64>,
    pub result: Option<ResultLink>,
}

impl SpeedtestResult {
    /// Parses raw tool output
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Confirms download, upload and ping are all present and non-empty
    pub fn validate(self) -> Result<ValidatedResult> {
        let download = self
            .download
            .ok_or(SensorError::IncompleteData { missing: "download" })?;
        let upload = self
            .upload
            .ok_or(SensorError::IncompleteData { missing: "upload" })?;
        let ping = self
            .ping
            .ok_or(SensorError::IncompleteData { missing: "ping" })?;

        Ok(ValidatedResult {
            download,
            upload,
            ping,
            server: self.server.unwrap_or_default(),
            isp: self.isp,
            interface: self.interface.unwrap_or_default(),
            packet_loss: self.packet_loss,
            result: self.result,
        })
    }
}
