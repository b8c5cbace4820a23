//! Formatting utilities for channel values
//!
//! This module provides the rounding used by the metric conversion and the number
//! rendering used by the XML writer and log lines, so both agree on precision.

/// Rounds a value to a fixed number of decimal places
///
/// # Examples
///
/// ```
/// use speedtest_sensor::report::formatting::round_to;
///
/// assert_eq!(round_to(14.236, 2), 14.24);
/// assert_eq!(round_to(0.12345, 3), 0.123);
/// ```
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Renders a float channel value without trailing zeros
///
/// Integral values render without a fractional part (`0`, not `0.0`) and
/// non-finite values render as `0` so the document always holds a number.
pub fn format_float(value: f64) -> String {
    if value.is_finite() {
        // `+ 0.0` folds negative zero into zero
        format!("{}", value + 0.0)
    } else {
        "0".to_string()
    }
}

/// Formats a speed in bits per second with decimal units for log output
///
/// # Examples
///
/// ```
/// use speedtest_sensor::report::formatting::format_bits_per_second;
///
/// assert_eq!(format_bits_per_second(0), "0 bit/s");
/// assert_eq!(format_bits_per_second(100_000_000), "100.00 Mbit/s");
/// ```
pub fn format_bits_per_second(bits_per_second: i64) -> String {
    let bps = bits_per_second as f64;
    if bps.abs() < 1_000.0 {
        format!("{} bit/s", bits_per_second)
    } else if bps.abs() < 1_000_000.0 {
        format!("{:.2} Kbit/s", bps / 1_000.0)
    } else if bps.abs() < 1_000_000_000.0 {
        format!("{:.2} Mbit/s", bps / 1_000_000.0)
    } else {
        format!("{:.2} Gbit/s", bps / 1_000_000_000.0)
    }
}
