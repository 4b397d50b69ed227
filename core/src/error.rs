//! Error types for the reporting pipeline

use hal_abstractions::ConnectErrorKind;

/// A sensor reading could not be turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Floating-point reading is NaN or infinite
    NonFinite,
    /// Text reading does not fit the reading buffer
    TextTooLong,
    /// Encoded form does not fit the output buffer
    Overflow,
    /// Reading encoded to nothing; there is nothing to report
    Empty,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NonFinite => write!(f, "Non-finite sensor value"),
            Self::TextTooLong => write!(f, "Sensor text too long"),
            Self::Overflow => write!(f, "Encoded value too long"),
            Self::Empty => write!(f, "Empty sensor value"),
        }
    }
}

impl core::error::Error for EncodeError {}

/// The JSON payload could not be composed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// More than three key/value pairs were supplied
    TooManyFields,
    /// The payload does not fit the payload buffer
    Overflow,
}

impl core::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooManyFields => write!(f, "Too many payload fields"),
            Self::Overflow => write!(f, "Payload buffer overflow"),
        }
    }
}

impl core::error::Error for PayloadError {}

/// Why a report was not delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError {
    /// Sensor produced no reading; nothing was sent
    SensorUnavailable,
    /// Primary reading could not be encoded; nothing was sent
    Encode(EncodeError),
    /// Payload could not be composed; nothing was sent
    Payload(PayloadError),
    /// Transport could not establish a stream
    ConnectFailed(ConnectErrorKind),
    /// Connection attempt exceeded the connect timeout
    ConnectTimeout,
    /// Writing the request failed
    Io,
    /// Request could not be written within the exchange timeout
    ExchangeTimeout,
}

impl core::fmt::Display for ReportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SensorUnavailable => write!(f, "Sensor unavailable"),
            Self::Encode(e) => write!(f, "Encoding failed: {}", e),
            Self::Payload(e) => write!(f, "Payload failed: {}", e),
            Self::ConnectFailed(kind) => write!(f, "Failed to connect to backend: {}", kind),
            Self::ConnectTimeout => write!(f, "Connect timeout"),
            Self::Io => write!(f, "Write to backend failed"),
            Self::ExchangeTimeout => write!(f, "Exchange timeout"),
        }
    }
}

impl core::error::Error for ReportError {}

impl From<EncodeError> for ReportError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<PayloadError> for ReportError {
    fn from(e: PayloadError) -> Self {
        Self::Payload(e)
    }
}

impl ReportError {
    /// Whether anything may have reached the backend
    ///
    /// Sensor, encoding and payload failures happen before a connection is
    /// opened.
    pub fn reached_network(&self) -> bool {
        !matches!(
            self,
            Self::SensorUnavailable | Self::Encode(_) | Self::Payload(_)
        )
    }
}
