//! Sensor report
//!
//! A report is built once per run, either from a measurement or from a terminal
//! error, and serialized once into the PRTG XML document.
//!
//! ## Module Organization
//!
//! - `channel`: channel records and their unit annotations
//! - `assembler`: channel ordering and the summary text
//! - `formatting`: rounding and number rendering
//! - `xml`: escaping and document serialization

pub mod assembler;
pub mod channel;
pub mod formatting;
pub mod xml;

pub use assembler::{assemble, summary_text};
pub use channel::{Channel, ChannelValue, SpeedSize, Unit};

use crate::errors::SensorError;

/// The single output document of a run
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Ordered channels plus the trailing summary text
    Success { channels: Vec<Channel>, text: String },
    /// Error marker with a message
    Error { message: String },
}

impl Report {
    pub fn is_error(&self) -> bool {
        matches!(self, Report::Error { .. })
    }

    /// Serializes the report into the PRTG XML document
    pub fn to_xml(&self) -> String {
        xml::render(self)
    }
}

impl From<&SensorError> for Report {
    fn from(error: &SensorError) -> Self {
        Report::Error {
            message: error.to_string(),
        }
    }
}
