//! Sensor readings and their textual encoding
//!
//! A [`SensorReading`] is a tagged value produced by a sensor driver
//! immediately before a report. [`encode`] turns it into the text that goes
//! into the JSON payload:
//!
//! - integers: decimal, sign kept, no leading zeros
//! - floats: fixed notation with exactly two fractional digits
//! - text: verbatim (quoting and escaping happen in the payload layer)

use core::fmt::Write;
use core::future::Future;

use heapless::String;

use crate::error::EncodeError;

/// Capacity of a text reading
pub const TEXT_CAPACITY: usize = 32;

/// Capacity of an encoded value
///
/// Large enough for any `f32` in fixed notation with two decimals.
pub const ENCODED_CAPACITY: usize = 48;

/// Discriminant of a [`SensorReading`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorKind {
    /// 32-bit signed integer
    Int,
    /// 32-bit float
    Float,
    /// Short text
    Text,
}

/// One sensor measurement
#[derive(Debug, Clone, PartialEq)]
pub enum SensorReading {
    Int(i32),
    Float(f32),
    Text(String<TEXT_CAPACITY>),
}

impl SensorReading {
    /// Integer reading
    pub const fn int(value: i32) -> Self {
        Self::Int(value)
    }

    /// Floating-point reading
    pub const fn float(value: f32) -> Self {
        Self::Float(value)
    }

    /// Text reading
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::TextTooLong` if `value` exceeds [`TEXT_CAPACITY`].
    pub fn text(value: &str) -> Result<Self, EncodeError> {
        let mut s = String::new();
        s.push_str(value).map_err(|_| EncodeError::TextTooLong)?;
        Ok(Self::Text(s))
    }

    /// Discriminant of this reading
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Int(_) => SensorKind::Int,
            Self::Float(_) => SensorKind::Float,
            Self::Text(_) => SensorKind::Text,
        }
    }
}

impl From<i32> for SensorReading {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for SensorReading {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

/// Textual form of a reading, tagged with the kind it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedValue {
    kind: SensorKind,
    text: String<ENCODED_CAPACITY>,
}

impl EncodedValue {
    /// Empty value of the given kind ("do not report")
    pub const fn empty(kind: SensorKind) -> Self {
        Self {
            kind,
            text: String::new(),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Encode a reading into its canonical text
///
/// # Errors
///
/// - `EncodeError::NonFinite` for NaN or infinite floats (not representable
///   in JSON)
/// - `EncodeError::Overflow` if the text does not fit [`ENCODED_CAPACITY`]
pub fn encode(reading: &SensorReading) -> Result<EncodedValue, EncodeError> {
    let mut text = String::<ENCODED_CAPACITY>::new();

    match reading {
        SensorReading::Int(v) => write!(text, "{}", v).map_err(|_| EncodeError::Overflow)?,
        SensorReading::Float(v) => {
            if !v.is_finite() {
                return Err(EncodeError::NonFinite);
            }
            write!(text, "{:.2}", v).map_err(|_| EncodeError::Overflow)?
        }
        SensorReading::Text(s) => text.push_str(s).map_err(|_| EncodeError::Overflow)?,
    }

    Ok(EncodedValue {
        kind: reading.kind(),
        text,
    })
}

/// Encode a reading, logging and returning an empty value on failure
///
/// Callers treat an empty result as "do not report".
pub fn encode_or_empty(reading: &SensorReading) -> EncodedValue {
    encode(reading).unwrap_or_else(|e| {
        warn!("{}", e);
        EncodedValue::empty(reading.kind())
    })
}

/// A sensor producer
///
/// Each source reports one reading under a fixed JSON key to a fixed API
/// path. How the reading is acquired is up to the implementation.
pub trait SensorSource {
    /// JSON key the reading is reported under
    fn key(&self) -> &'static str;

    /// Backend path the report is posted to
    fn path(&self) -> &'static str;

    /// Take one reading, or `None` if the sensor could not be read
    fn read(&mut self) -> impl Future<Output = Option<SensorReading>>;
}
