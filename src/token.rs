//! Time tokens: the timing vocabulary of a protocol grammar
//!
//! A token describes one duration to append to a frame. Durations can be
//! given in microseconds, in exact hardware ticks (for padding, where
//! sub-microsecond precision matters), or as a multiple of the protocol's
//! base unit T. A token may also assert the polarity of the slot it must
//! land in.

use crate::error::{CodecError, Result};
use crate::frame::Entry;
use std::str::FromStr;

/// Polarity of a pulse-train entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarity {
    /// Infrared emitter on ("high")
    Pulse,
    /// Infrared emitter off ("low")
    Space,
}

impl Polarity {
    /// The opposite polarity
    pub fn opposite(&self) -> Polarity {
        match self {
            Polarity::Pulse => Polarity::Space,
            Polarity::Space => Polarity::Pulse,
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Pulse => write!(f, "high"),
            Polarity::Space => write!(f, "low"),
        }
    }
}

/// How a token's duration is expressed
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeValue {
    /// Plain microseconds
    Micros(f64),
    /// An exact hardware tick count (1 tick = 0.5 microseconds)
    Ticks(u32),
    /// A multiple of the protocol's base unit T
    UnitsOfT(f64),
}

/// A single timing instruction
///
/// Parsed from strings like `"562"`, `"2.5T"`, `"65535 ticks"`, optionally
/// suffixed with `-high` or `-low` to force the slot polarity:
///
/// ```
/// use ir_pulse_codec::{TimeToken, TimeValue, Polarity};
///
/// let token: TimeToken = "16T-high".parse()?;
/// assert_eq!(token.value, TimeValue::UnitsOfT(16.0));
/// assert_eq!(token.polarity, Some(Polarity::Pulse));
/// # Ok::<(), ir_pulse_codec::CodecError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeToken {
    /// The duration
    pub value: TimeValue,
    /// Polarity the duration must land on, if asserted
    pub polarity: Option<Polarity>,
}

impl TimeToken {
    /// A plain microsecond duration
    pub fn micros(us: f64) -> Self {
        TimeToken {
            value: TimeValue::Micros(us),
            polarity: None,
        }
    }

    /// An exact tick count
    pub fn ticks(ticks: u32) -> Self {
        TimeToken {
            value: TimeValue::Ticks(ticks),
            polarity: None,
        }
    }

    /// A multiple of the base unit T
    pub fn units_of_t(units: f64) -> Self {
        TimeToken {
            value: TimeValue::UnitsOfT(units),
            polarity: None,
        }
    }

    /// Assert the polarity this token must land on
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = Some(polarity);
        self
    }

    /// Resolve the token to a concrete frame entry given the base unit T
    pub fn resolve(&self, unit_us: f64) -> Entry {
        match self.value {
            TimeValue::Micros(us) => Entry::Micros(us),
            TimeValue::Ticks(ticks) => Entry::Ticks(ticks),
            TimeValue::UnitsOfT(units) => Entry::Micros(units * unit_us),
        }
    }
}

impl From<f64> for TimeToken {
    /// A bare number is microseconds
    fn from(us: f64) -> Self {
        TimeToken::micros(us)
    }
}

impl From<u32> for TimeToken {
    fn from(us: u32) -> Self {
        TimeToken::micros(us as f64)
    }
}

impl FromStr for TimeToken {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();

        let (body, polarity) = if let Some(body) = trimmed.strip_suffix("-high") {
            (body, Some(Polarity::Pulse))
        } else if let Some(body) = trimmed.strip_suffix("-low") {
            (body, Some(Polarity::Space))
        } else {
            (trimmed, None)
        };

        let value = if let Some(number) = body.strip_suffix("ticks") {
            let ticks = parse_number(s, number)?;
            TimeValue::Ticks(ticks.round() as u32)
        } else if let Some(number) = body.strip_suffix('T') {
            TimeValue::UnitsOfT(parse_number(s, number)?)
        } else {
            TimeValue::Micros(parse_number(s, body)?)
        };

        Ok(TimeToken { value, polarity })
    }
}

fn parse_number(token: &str, number: &str) -> Result<f64> {
    let number = number.trim();
    let parsed: f64 = number
        .parse()
        .map_err(|_| CodecError::malformed_input(format!("unrecognized time token {:?}", token)))?;
    if parsed < 0.0 || !parsed.is_finite() {
        return Err(CodecError::malformed_input(format!(
            "negative or non-finite duration in time token {:?}",
            token
        )));
    }
    Ok(parsed)
}
