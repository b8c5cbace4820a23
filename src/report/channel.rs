//! PRTG channel records

/// Value of a channel; floats are flagged as such in the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelValue {
    Integer(i64),
    Float(f64),
}

/// PRTG unit classification
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    /// Network speed, scaled by the channel's speed size
    SpeedNet,
    /// Response time in milliseconds
    TimeResponse,
    Percent,
    /// Free-form unit label shown next to the value
    Custom(String),
}

impl Unit {
    pub fn as_str(&self) -> &str {
        match self {
            Unit::SpeedNet => "SpeedNet",
            Unit::TimeResponse => "TimeResponse",
            Unit::Percent => "Percent",
            Unit::Custom(_) => "Custom",
        }
    }
}

/// Display scaling for speed channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedSize {
    MegaBit,
}

impl SpeedSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedSize::MegaBit => "MegaBit",
        }
    }
}

/// One named metric in the output document
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub value: ChannelValue,
    pub unit: Unit,
    pub speed_size: Option<SpeedSize>,
}

impl Channel {
    /// Bits per second shown in megabits
    pub fn speed(name: &str, bits_per_second: i64) -> Self {
        Self {
            name: name.to_string(),
            value: ChannelValue::Integer(bits_per_second),
            unit: Unit::SpeedNet,
            speed_size: Some(SpeedSize::MegaBit),
        }
    }

    /// Milliseconds as a float response time
    pub fn response_time(name: &str, milliseconds: f64) -> Self {
        Self {
            name: name.to_string(),
            value: ChannelValue::Float(milliseconds),
            unit: Unit::TimeResponse,
            speed_size: None,
        }
    }

    /// Float value with a free-form unit label
    pub fn custom(name: &str, value: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            value: ChannelValue::Float(value),
            unit: Unit::Custom(unit.to_string()),
            speed_size: None,
        }
    }

    pub fn percent(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value: ChannelValue::Float(value),
            unit: Unit::Percent,
            speed_size: None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self.value, ChannelValue::Float(_))
    }
}
