//! JSON payload composition
//!
//! Produces a single-line JSON object:
//!
//! ```text
//! {"device_id": "<id>", "<key1>": <value1>[, "<key2>": <value2>][, "<key3>": <value3>]}
//! ```
//!
//! The device id always comes first, followed by one mandatory field and up
//! to two optional ones in insertion order. Numeric values are emitted bare;
//! text values are emitted as escaped JSON strings.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::error::PayloadError;
use crate::reading::{EncodedValue, SensorKind};

/// Capacity of a composed payload
pub const PAYLOAD_CAPACITY: usize = 256;

/// Maximum number of key/value pairs after the device id
pub const MAX_FIELDS: usize = 3;

/// Composed JSON payload
pub type Payload = String<PAYLOAD_CAPACITY>;

/// A payload value and how it is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Already-formatted number, emitted bare
    Number(&'a str),
    /// Text, emitted quoted and escaped
    Text(&'a str),
}

impl<'a> FieldValue<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Self::Number(s) | Self::Text(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl<'a> From<&'a EncodedValue> for FieldValue<'a> {
    fn from(value: &'a EncodedValue) -> Self {
        match value.kind() {
            SensorKind::Int | SensorKind::Float => Self::Number(value.as_str()),
            SensorKind::Text => Self::Text(value.as_str()),
        }
    }
}

/// One key/value pair of the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub key: &'a str,
    pub value: FieldValue<'a>,
}

/// Ordered list of one to three payload fields
///
/// The first field is mandatory and always emitted. Optional fields with an
/// empty key or an empty value are dropped when added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields<'a> {
    fields: Vec<Field<'a>, MAX_FIELDS>,
}

impl<'a> Fields<'a> {
    /// Start a field list with the mandatory first pair
    pub fn new(key: &'a str, value: FieldValue<'a>) -> Self {
        let mut fields = Vec::new();
        // Capacity is at least one
        let _ = fields.push(Field { key, value });
        Self { fields }
    }

    /// Add an optional pair
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::TooManyFields` if three pairs are already present.
    pub fn push(&mut self, key: &'a str, value: FieldValue<'a>) -> Result<(), PayloadError> {
        if key.is_empty() || value.is_empty() {
            return Ok(());
        }
        self.fields
            .push(Field { key, value })
            .map_err(|_| PayloadError::TooManyFields)
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, key: &'a str, value: FieldValue<'a>) -> Result<Self, PayloadError> {
        self.push(key, value)?;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field<'a>> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Compose the JSON payload for one report
///
/// An empty `device_id` is still emitted, as `""`.
///
/// # Errors
///
/// Returns `PayloadError::Overflow` if the payload exceeds [`PAYLOAD_CAPACITY`].
pub fn build_payload(device_id: &str, fields: &Fields<'_>) -> Result<Payload, PayloadError> {
    let mut json = Payload::new();
    write_payload(&mut json, device_id, fields).map_err(|_| PayloadError::Overflow)?;
    Ok(json)
}

fn write_payload<W: Write>(w: &mut W, device_id: &str, fields: &Fields<'_>) -> core::fmt::Result {
    w.write_str("{\"device_id\": ")?;
    write_json_string(w, device_id)?;

    for field in fields.iter() {
        w.write_str(", ")?;
        write_json_string(w, field.key)?;
        w.write_str(": ")?;
        match field.value {
            FieldValue::Number(s) => w.write_str(s)?,
            FieldValue::Text(s) => write_json_string(w, s)?,
        }
    }

    w.write_char('}')
}

/// Write `s` as a quoted, escaped JSON string
pub fn write_json_string<W: Write>(w: &mut W, s: &str) -> core::fmt::Result {
    w.write_char('"')?;

    let mut start = 0;
    for (i, c) in s.char_indices() {
        let escape = match c {
            '"' => Some("\\\""),
            '\\' => Some("\\\\"),
            '\n' => Some("\\n"),
            '\r' => Some("\\r"),
            '\t' => Some("\\t"),
            '\u{08}' => Some("\\b"),
            '\u{0c}' => Some("\\f"),
            c if (c as u32) < 0x20 => None,
            _ => continue,
        };

        w.write_str(&s[start..i])?;
        match escape {
            Some(e) => w.write_str(e)?,
            None => write!(w, "\\u{:04x}", c as u32)?,
        }
        start = i + c.len_utf8();
    }

    w.write_str(&s[start..])?;
    w.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{encode, SensorReading};

    fn json_string(s: &str) -> String<64> {
        let mut out = String::new();
        write_json_string(&mut out, s).unwrap();
        out
    }

    #[test]
    fn test_single_field() {
        let fields = Fields::new("temp", FieldValue::Number("21.50"));
        let json = build_payload("node-1", &fields).unwrap();
        assert_eq!(json.as_str(), r#"{"device_id": "node-1", "temp": 21.50}"#);
    }

    #[test]
    fn test_two_fields() {
        let fields = Fields::new("lat", FieldValue::Number("10.0"))
            .with("lon", FieldValue::Number("20.0"))
            .unwrap();
        let json = build_payload("node-1", &fields).unwrap();
        assert_eq!(
            json.as_str(),
            r#"{"device_id": "node-1", "lat": 10.0, "lon": 20.0}"#
        );
    }

    #[test]
    fn test_empty_optional_value_omitted() {
        let fields = Fields::new("lat", FieldValue::Number("10.0"))
            .with("lon", FieldValue::Number(""))
            .unwrap();
        assert_eq!(fields.len(), 1);
        let json = build_payload("node-1", &fields).unwrap();
        assert_eq!(json.as_str(), r#"{"device_id": "node-1", "lat": 10.0}"#);
    }

    #[test]
    fn test_empty_optional_key_omitted() {
        let fields = Fields::new("lat", FieldValue::Number("10.0"))
            .with("", FieldValue::Number("20.0"))
            .unwrap()
            .with("alt", FieldValue::Number("3"))
            .unwrap();
        let json = build_payload("n", &fields).unwrap();
        assert_eq!(json.as_str(), r#"{"device_id": "n", "lat": 10.0, "alt": 3}"#);
    }

    #[test]
    fn test_three_fields_in_order() {
        let fields = Fields::new("a", FieldValue::Number("1"))
            .with("b", FieldValue::Number("2"))
            .unwrap()
            .with("c", FieldValue::Number("3"))
            .unwrap();
        let json = build_payload("x", &fields).unwrap();
        assert_eq!(json.as_str(), r#"{"device_id": "x", "a": 1, "b": 2, "c": 3}"#);
    }

    #[test]
    fn test_fourth_field_rejected() {
        let fields = Fields::new("a", FieldValue::Number("1"))
            .with("b", FieldValue::Number("2"))
            .unwrap()
            .with("c", FieldValue::Number("3"))
            .unwrap();
        assert_eq!(
            fields.with("d", FieldValue::Number("4")),
            Err(PayloadError::TooManyFields)
        );
    }

    #[test]
    fn test_mandatory_field_kept_when_empty() {
        let fields = Fields::new("sound", FieldValue::Number(""));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_empty_device_id_still_emitted() {
        let fields = Fields::new("sound", FieldValue::Number("300"));
        let json = build_payload("", &fields).unwrap();
        assert_eq!(json.as_str(), r#"{"device_id": "", "sound": 300}"#);
    }

    #[test]
    fn test_text_value_quoted_and_escaped() {
        let fields = Fields::new("status", FieldValue::Text("say \"hi\""));
        let json = build_payload("n", &fields).unwrap();
        assert_eq!(
            json.as_str(),
            r#"{"device_id": "n", "status": "say \"hi\""}"#
        );
    }

    #[test]
    fn test_field_value_from_encoded() {
        let number = encode(&SensorReading::float(1.5)).unwrap();
        assert_eq!(FieldValue::from(&number), FieldValue::Number("1.50"));

        let text = encode(&SensorReading::text("ok").unwrap()).unwrap();
        assert_eq!(FieldValue::from(&text), FieldValue::Text("ok"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(json_string("plain").as_str(), r#""plain""#);
        assert_eq!(json_string(r"a\b").as_str(), r#""a\\b""#);
        assert_eq!(json_string("l1\nl2\t").as_str(), r#""l1\nl2\t""#);
        assert_eq!(json_string("\u{01}").as_str(), r#""\u0001""#);
        assert_eq!(json_string("grün").as_str(), "\"grün\"");
    }

    #[test]
    fn test_overflow() {
        let long = "x".repeat(PAYLOAD_CAPACITY);
        let fields = Fields::new("k", FieldValue::Text(&long));
        assert_eq!(build_payload("n", &fields), Err(PayloadError::Overflow));
    }
}
