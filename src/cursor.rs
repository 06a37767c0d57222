//! Opaque pagination cursors.
//!
//! A cursor carries exactly one scalar key (string, timestamp, unsigned or
//! signed integer) serialized as a self-describing MessagePack value and
//! wrapped in URL-safe base64. Cursors hold no ordering logic; they only make
//! the last-seen key of a keyset listing opaque to clients.
//!
//! ```ignore
//! let token = cursor::encode(&42u64)?;
//! let key: u64 = cursor::decode(&token)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rmpv::Value;
use thiserror::Error;

/// MessagePack extension type reserved for timestamps.
const TIMESTAMP_EXT: i8 = -1;

/// Upper bound on accepted token length.
const MAX_TOKEN_LEN: usize = 1024;

/// Errors produced while decoding a cursor.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cursor is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("cursor is too long ({0} characters)")]
    TooLong(usize),

    #[error("cursor payload is truncated")]
    Truncated,

    #[error("cursor payload is malformed: {0}")]
    Malformed(String),

    #[error("cursor payload has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("cursor has unexpected shape: {0}")]
    Shape(String),
}

mod sealed {
    pub trait Sealed {}
}

/// Scalar types a cursor can carry.
pub trait CursorScalar: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn to_value(&self) -> Value;

    #[doc(hidden)]
    fn from_value(value: Value) -> Result<Self, CursorError>;
}

impl sealed::Sealed for String {}
impl CursorScalar for String {
    fn to_value(&self) -> Value {
        Value::from(self.as_str())
    }

    fn from_value(value: Value) -> Result<Self, CursorError> {
        match value {
            Value::String(s) => s
                .into_str()
                .ok_or_else(|| CursorError::Shape("string key is not valid UTF-8".into())),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl sealed::Sealed for u64 {}
impl CursorScalar for u64 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: Value) -> Result<Self, CursorError> {
        match value {
            Value::Integer(i) => i
                .as_u64()
                .ok_or_else(|| CursorError::Shape(format!("{} is not an unsigned key", i))),
            other => Err(mismatch("unsigned integer", &other)),
        }
    }
}

impl sealed::Sealed for u32 {}
impl CursorScalar for u32 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: Value) -> Result<Self, CursorError> {
        let wide = u64::from_value(value)?;
        u32::try_from(wide)
            .map_err(|_| CursorError::Shape(format!("{} does not fit in 32 bits", wide)))
    }
}

impl sealed::Sealed for i64 {}
impl CursorScalar for i64 {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_value(value: Value) -> Result<Self, CursorError> {
        match value {
            Value::Integer(i) => i
                .as_i64()
                .ok_or_else(|| CursorError::Shape(format!("{} is not a signed 64-bit key", i))),
            other => Err(mismatch("signed integer", &other)),
        }
    }
}

impl sealed::Sealed for DateTime<Utc> {}
impl CursorScalar for DateTime<Utc> {
    fn to_value(&self) -> Value {
        // timestamp 96: nanoseconds (u32) followed by seconds (i64), big endian
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&self.timestamp_subsec_nanos().to_be_bytes());
        data.extend_from_slice(&self.timestamp().to_be_bytes());
        Value::Ext(TIMESTAMP_EXT, data)
    }

    fn from_value(value: Value) -> Result<Self, CursorError> {
        let data = match value {
            Value::Ext(TIMESTAMP_EXT, data) => data,
            other => return Err(mismatch("timestamp", &other)),
        };

        let (secs, nanos) = match data.len() {
            4 => (i64::from(u32::from_be_bytes(fixed(&data[..4]))), 0),
            8 => {
                let packed = u64::from_be_bytes(fixed(&data[..8]));
                ((packed & 0x0003_ffff_ffff) as i64, (packed >> 34) as u32)
            }
            12 => (
                i64::from_be_bytes(fixed(&data[4..12])),
                u32::from_be_bytes(fixed(&data[..4])),
            ),
            n => {
                return Err(CursorError::Shape(format!(
                    "timestamp payload has {} bytes",
                    n
                )))
            }
        };

        DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(|| {
            CursorError::Shape(format!("timestamp {}s/{}ns is out of range", secs, nanos))
        })
    }
}

/// Encodes a scalar key into an opaque, URL-safe cursor token.
pub fn encode<T: CursorScalar>(value: &T) -> Result<String, CursorError> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, &value.to_value())
        .map_err(|e| CursorError::Malformed(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

/// Decodes a cursor token into the requested scalar type.
///
/// Fails (never panics) on invalid base64, truncated or oversized payloads,
/// trailing bytes, or a payload holding a different kind of scalar.
pub fn decode<T: CursorScalar>(token: &str) -> Result<T, CursorError> {
    if token.len() > MAX_TOKEN_LEN {
        return Err(CursorError::TooLong(token.len()));
    }

    let bytes = URL_SAFE_NO_PAD.decode(token.trim_end_matches('='))?;
    check_scalar_frame(&bytes)?;

    let mut rd: &[u8] = &bytes;
    let value =
        rmpv::decode::read_value(&mut rd).map_err(|e| CursorError::Malformed(e.to_string()))?;
    if !rd.is_empty() {
        return Err(CursorError::TrailingBytes(rd.len()));
    }

    T::from_value(value)
}

/// Validates the leading MessagePack marker before handing bytes to the
/// decoder: only scalar markers are accepted and declared lengths must fit in
/// the payload, so a forged header cannot trigger a large allocation.
fn check_scalar_frame(bytes: &[u8]) -> Result<(), CursorError> {
    let (&marker, rest) = bytes.split_first().ok_or(CursorError::Truncated)?;

    let (header_len, data_len) = match marker {
        // fixints and sized integers carry no variable-length payload
        0x00..=0x7f | 0xe0..=0xff | 0xcc..=0xd3 => return Ok(()),
        // fixext 1/2/4/8/16: type byte plus a fixed payload
        0xd4..=0xd8 => (0, 1 + (1usize << (marker - 0xd4))),
        0xa0..=0xbf => (0, usize::from(marker & 0x1f)),
        0xd9 => (1, declared_len(rest, 1)?),
        0xda => (2, declared_len(rest, 2)?),
        0xdb => (4, declared_len(rest, 4)?),
        0xc7 => (1, declared_len(rest, 1)? + 1),
        0xc8 => (2, declared_len(rest, 2)? + 1),
        0xc9 => (4, declared_len(rest, 4)? + 1),
        other => {
            return Err(CursorError::Shape(format!(
                "unsupported value marker 0x{:02x}",
                other
            )))
        }
    };

    if rest.len() < header_len + data_len {
        return Err(CursorError::Truncated);
    }
    Ok(())
}

fn declared_len(rest: &[u8], width: usize) -> Result<usize, CursorError> {
    let header = rest.get(..width).ok_or(CursorError::Truncated)?;
    Ok(header
        .iter()
        .fold(0usize, |acc, &byte| (acc << 8) | usize::from(byte)))
}

fn fixed<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

fn mismatch(expected: &str, found: &Value) -> CursorError {
    CursorError::Shape(format!("expected {}, found {}", expected, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round_trip_string() {
        let token = encode(&"dell-xps-13".to_string()).unwrap();
        let decoded: String = decode(&token).unwrap();
        assert_eq!(decoded, "dell-xps-13");
    }

    #[test]
    fn test_round_trip_unsigned() {
        for key in [0u64, 1, 127, 128, 65_535, u64::from(u32::MAX) + 1, u64::MAX] {
            let decoded: u64 = decode(&encode(&key).unwrap()).unwrap();
            assert_eq!(decoded, key);
        }
        let small: u32 = decode(&encode(&77u32).unwrap()).unwrap();
        assert_eq!(small, 77);
    }

    #[test]
    fn test_round_trip_signed() {
        for key in [i64::MIN, -129, -1, 0, 42, i64::MAX] {
            let decoded: i64 = decode(&encode(&key).unwrap()).unwrap();
            assert_eq!(decoded, key);
        }
    }

    #[test]
    fn test_round_trip_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 10).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        let decoded: DateTime<Utc> = decode(&encode(&ts).unwrap()).unwrap();
        assert_eq!(decoded, ts);
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = encode(&"a/b+c?d=e".repeat(8)).unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_not_base64() {
        let err = decode::<u64>("not base64!").unwrap_err();
        assert!(matches!(err, CursorError::Base64(_)));
    }

    #[test]
    fn test_shape_mismatch() {
        let token = encode(&"abc".to_string()).unwrap();
        assert!(matches!(
            decode::<u64>(&token).unwrap_err(),
            CursorError::Shape(_)
        ));

        let negative = encode(&-5i64).unwrap();
        assert!(decode::<u64>(&negative).is_err());
    }

    #[test]
    fn test_truncated_and_forged_lengths() {
        // str32 header claiming 4 GiB with no payload
        let forged = URL_SAFE_NO_PAD.encode([0xdb, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(
            decode::<String>(&forged).unwrap_err(),
            CursorError::Truncated
        ));

        // uint64 marker without its eight bytes
        let short = URL_SAFE_NO_PAD.encode([0xcf, 0x01]);
        assert!(decode::<u64>(&short).is_err());

        assert!(matches!(
            decode::<u64>("").unwrap_err(),
            CursorError::Truncated
        ));
    }

    #[test]
    fn test_rejects_containers_and_trailing_bytes() {
        // array32 marker
        let array = URL_SAFE_NO_PAD.encode([0xdd, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(
            decode::<u64>(&array).unwrap_err(),
            CursorError::Shape(_)
        ));

        let trailing = URL_SAFE_NO_PAD.encode([0x05, 0x06]);
        assert!(matches!(
            decode::<u64>(&trailing).unwrap_err(),
            CursorError::TrailingBytes(1)
        ));
    }

    #[test]
    fn test_rejects_oversized_token() {
        let token = "A".repeat(MAX_TOKEN_LEN + 1);
        assert!(matches!(
            decode::<u64>(&token).unwrap_err(),
            CursorError::TooLong(_)
        ));
    }

    #[test]
    fn test_garbage_never_panics() {
        for seed in 0u8..=255 {
            let bytes: Vec<u8> = (0..seed % 17)
                .map(|i| seed.wrapping_mul(31).wrapping_add(i))
                .collect();
            let token = URL_SAFE_NO_PAD.encode(&bytes);
            let _ = decode::<u64>(&token);
            let _ = decode::<i64>(&token);
            let _ = decode::<String>(&token);
            let _ = decode::<DateTime<Utc>>(&token);
        }
    }
}
