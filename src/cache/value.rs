//! Stored Value Module
//!
//! Scalar payloads accepted by the cache and the decoders that read them back.

use std::fmt;

use crate::error::{CacheError, Result};

// == Stored Value ==
/// A payload accepted by [`InstrumentedCache::store`](crate::cache::InstrumentedCache::store).
///
/// Only the bytes are persisted; the variant is not.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
}

impl StoredValue {
    /// Encodes the value the way it is written to the store.
    ///
    /// Strings as UTF-8, bytes verbatim, numbers as decimal text.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            StoredValue::Text(s) => s.as_bytes().to_vec(),
            StoredValue::Bytes(b) => b.clone(),
            StoredValue::Int(i) => i.to_string().into_bytes(),
            StoredValue::Float(f) => format_float(*f).into_bytes(),
        }
    }
}

/// Renders floats with a fractional part so `1.0` round-trips as a float.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Argument representation used in call history.
impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Text(s) => write!(f, "{:?}", s),
            StoredValue::Bytes(b) => write!(f, "b\"{}\"", b.escape_ascii()),
            StoredValue::Int(i) => write!(f, "{}", i),
            StoredValue::Float(v) => write!(f, "{}", format_float(*v)),
        }
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::Text(value.to_string())
    }
}

impl From<String> for StoredValue {
    fn from(value: String) -> Self {
        StoredValue::Text(value)
    }
}

impl From<Vec<u8>> for StoredValue {
    fn from(value: Vec<u8>) -> Self {
        StoredValue::Bytes(value)
    }
}

impl From<&[u8]> for StoredValue {
    fn from(value: &[u8]) -> Self {
        StoredValue::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for StoredValue {
    fn from(value: &[u8; N]) -> Self {
        StoredValue::Bytes(value.to_vec())
    }
}

impl From<i64> for StoredValue {
    fn from(value: i64) -> Self {
        StoredValue::Int(value)
    }
}

impl From<i32> for StoredValue {
    fn from(value: i32) -> Self {
        StoredValue::Int(i64::from(value))
    }
}

impl From<f64> for StoredValue {
    fn from(value: f64) -> Self {
        StoredValue::Float(value)
    }
}

// == Decoders ==
/// Decodes raw bytes as a UTF-8 string.
pub fn decode_utf8(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|e| CacheError::Decode(e.to_string()))
}

/// Decodes raw bytes as a base-10 integer.
pub fn decode_int(raw: Vec<u8>) -> Result<i64> {
    let text = decode_utf8(raw)?;
    text.trim()
        .parse()
        .map_err(|_| CacheError::Decode(format!("{:?} is not an integer", text)))
}

/// Decodes raw bytes as a float.
pub fn decode_float(raw: Vec<u8>) -> Result<f64> {
    let text = decode_utf8(raw)?;
    text.trim()
        .parse()
        .map_err(|_| CacheError::Decode(format!("{:?} is not a float", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        assert_eq!(StoredValue::from("hello").to_bytes(), b"hello".to_vec());
        assert_eq!(StoredValue::from(b"\x00\xff").to_bytes(), vec![0, 255]);
        assert_eq!(StoredValue::from(-7).to_bytes(), b"-7".to_vec());
        assert_eq!(StoredValue::from(3.25).to_bytes(), b"3.25".to_vec());
        assert_eq!(StoredValue::from(1.0).to_bytes(), b"1.0".to_vec());
    }

    #[test]
    fn test_display_repr() {
        assert_eq!(StoredValue::from("hi").to_string(), "\"hi\"");
        assert_eq!(StoredValue::from(b"ab\n").to_string(), "b\"ab\\n\"");
        assert_eq!(StoredValue::from(12).to_string(), "12");
    }

    #[test]
    fn test_decoders() {
        assert_eq!(decode_utf8(b"hello".to_vec()).unwrap(), "hello");
        assert_eq!(decode_int(b"42".to_vec()).unwrap(), 42);
        assert_eq!(decode_float(b"1.5".to_vec()).unwrap(), 1.5);
    }

    #[test]
    fn test_decoder_failures() {
        assert!(matches!(
            decode_utf8(vec![0xff, 0xfe]),
            Err(CacheError::Decode(_))
        ));
        assert!(matches!(
            decode_int(b"forty-two".to_vec()),
            Err(CacheError::Decode(_))
        ));
        assert!(matches!(
            decode_float(b"".to_vec()),
            Err(CacheError::Decode(_))
        ));
    }
}
