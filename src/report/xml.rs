//! PRTG EXE/Script Advanced XML writer
//!
//! The schema is small and fixed, so the document is written directly. All text
//! goes through [`escape_xml`] on the way in.

use std::fmt::Write;

use crate::report::Report;
use crate::report::channel::{Channel, ChannelValue, Unit};
use crate::report::formatting::format_float;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Escapes the five reserved markup characters
///
/// # Examples
///
/// ```
/// use speedtest_sensor::report::xml::escape_xml;
///
/// assert_eq!(escape_xml("Fiber & Cable"), "Fiber &amp; Cable");
/// assert_eq!(escape_xml(r#"<a href="x">'y'</a>"#), "&lt;a href=&quot;x&quot;&gt;&apos;y&apos;&lt;/a&gt;");
/// ```
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // control characters other than tab/newline/CR are not allowed in XML 1.0
            c if c.is_control() && !matches!(c, '\t' | '\n' | '\r') => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}

fn write_channel(out: &mut String, channel: &Channel) {
    let value = match channel.value {
        ChannelValue::Integer(v) => v.to_string(),
        ChannelValue::Float(v) => format_float(v),
    };

    // writing into a String cannot fail
    let _ = writeln!(out, "  <result>");
    let _ = writeln!(out, "    <channel>{}</channel>", escape_xml(&channel.name));
    let _ = writeln!(out, "    <value>{}</value>", value);
    let _ = writeln!(out, "    <unit>{}</unit>", channel.unit.as_str());
    if let Unit::Custom(label) = &channel.unit {
        let _ = writeln!(out, "    <customUnit>{}</customUnit>", escape_xml(label));
    }
    if let Some(size) = channel.speed_size {
        let _ = writeln!(out, "    <SpeedSize>{}</SpeedSize>", size.as_str());
    }
    if channel.is_float() {
        let _ = writeln!(out, "    <float>1</float>");
    }
    let _ = writeln!(out, "  </result>");
}

/// Serializes a report into the complete document, ending with a newline
pub fn render(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", XML_DECLARATION);
    let _ = writeln!(out, "<prtg>");

    match report {
        Report::Success { channels, text } => {
            for channel in channels {
                write_channel(&mut out, channel);
            }
            let _ = writeln!(out, "  <text>{}</text>", escape_xml(text));
        }
        Report::Error { message } => {
            let _ = writeln!(out, "  <error>1</error>");
            let _ = writeln!(out, "  <text>{}</text>", escape_xml(message));
        }
    }

    let _ = writeln!(out, "</prtg>");
    out
}
