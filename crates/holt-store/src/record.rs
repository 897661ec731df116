//! Typed record encoding
//!
//! Every value is stored as a self-describing record:
//!
//! ```text
//! +-----+--------+----------------+-----------------+
//! | tag | expiry | expire_at (LE) | payload ...     |
//! | u8  | u8     | u64            |                 |
//! +-----+--------+----------------+-----------------+
//! ```
//!
//! Numbers are fixed-width little-endian, strings are raw UTF-8 and byte
//! buffers are stored verbatim.

use crate::error::{StoreError, StoreResult};
use std::time::{SystemTime, UNIX_EPOCH};

const HEADER_LEN: usize = 10;

/// Type tag of a stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ValueKind {
    Bool = 1,
    Int32 = 2,
    UInt32 = 3,
    Int64 = 4,
    UInt64 = 5,
    Double = 6,
    String = 7,
    Bytes = 8,
}

impl ValueKind {
    fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => ValueKind::Bool,
            2 => ValueKind::Int32,
            3 => ValueKind::UInt32,
            4 => ValueKind::Int64,
            5 => ValueKind::UInt64,
            6 => ValueKind::Double,
            7 => ValueKind::String,
            8 => ValueKind::Bytes,
            _ => return None,
        })
    }
}

/// A value on its way into the store.
///
/// `String` and `Bytes` borrow from the caller. Whoever receives a `ValueRef`
/// must copy what it needs before returning: the borrowed memory is only
/// guaranteed for the duration of the call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(&'a str),
    Bytes(&'a [u8]),
}

impl ValueRef<'_> {
    pub fn kind(&self) -> ValueKind {
        match self {
            ValueRef::Bool(_) => ValueKind::Bool,
            ValueRef::Int32(_) => ValueKind::Int32,
            ValueRef::UInt32(_) => ValueKind::UInt32,
            ValueRef::Int64(_) => ValueKind::Int64,
            ValueRef::UInt64(_) => ValueKind::UInt64,
            ValueRef::Double(_) => ValueKind::Double,
            ValueRef::String(_) => ValueKind::String,
            ValueRef::Bytes(_) => ValueKind::Bytes,
        }
    }

    fn write_payload(&self, out: &mut Vec<u8>) {
        match *self {
            ValueRef::Bool(v) => out.push(v as u8),
            ValueRef::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
            ValueRef::UInt32(v) => out.extend_from_slice(&v.to_le_bytes()),
            ValueRef::Int64(v) => out.extend_from_slice(&v.to_le_bytes()),
            ValueRef::UInt64(v) => out.extend_from_slice(&v.to_le_bytes()),
            ValueRef::Double(v) => out.extend_from_slice(&v.to_le_bytes()),
            ValueRef::String(v) => out.extend_from_slice(v.as_bytes()),
            ValueRef::Bytes(v) => out.extend_from_slice(v),
        }
    }
}

/// A value read back out of the store. Always owned.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl StoredValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            StoredValue::Bool(_) => ValueKind::Bool,
            StoredValue::Int32(_) => ValueKind::Int32,
            StoredValue::UInt32(_) => ValueKind::UInt32,
            StoredValue::Int64(_) => ValueKind::Int64,
            StoredValue::UInt64(_) => ValueKind::UInt64,
            StoredValue::Double(_) => ValueKind::Double,
            StoredValue::String(_) => ValueKind::String,
            StoredValue::Bytes(_) => ValueKind::Bytes,
        }
    }
}

/// Current unix time in seconds
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Encode a value into its record form.
///
/// `expire_at` is an absolute unix timestamp in seconds.
pub fn encode(value: ValueRef<'_>, expire_at: Option<u64>) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 8);
    out.push(value.kind() as u8);
    match expire_at {
        Some(at) => {
            out.push(1);
            out.extend_from_slice(&at.to_le_bytes());
        }
        None => {
            out.push(0);
            out.extend_from_slice(&0u64.to_le_bytes());
        }
    }
    value.write_payload(&mut out);
    out
}

/// A decoded record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub value: StoredValue,
    pub expire_at: Option<u64>,
}

impl Record {
    /// Whether the record is past its expiry at `now` (unix seconds)
    pub fn is_expired_at(&self, now: u64) -> bool {
        matches!(self.expire_at, Some(at) if now > at)
    }
}

/// Decode a record read for `key`.
pub fn decode(key: &str, bytes: &[u8]) -> StoreResult<Record> {
    if bytes.len() < HEADER_LEN {
        return Err(StoreError::corrupt(key, "truncated header"));
    }

    let kind = ValueKind::from_tag(bytes[0])
        .ok_or_else(|| StoreError::corrupt(key, format!("unknown tag {}", bytes[0])))?;
    let expire_at = match bytes[1] {
        0 => None,
        1 => Some(u64::from_le_bytes(fixed(key, &bytes[2..HEADER_LEN])?)),
        flag => return Err(StoreError::corrupt(key, format!("bad expiry flag {flag}"))),
    };

    let payload = &bytes[HEADER_LEN..];
    let value = match kind {
        ValueKind::Bool => match payload {
            [0] => StoredValue::Bool(false),
            [1] => StoredValue::Bool(true),
            _ => return Err(StoreError::corrupt(key, "bad bool payload")),
        },
        ValueKind::Int32 => StoredValue::Int32(i32::from_le_bytes(fixed(key, payload)?)),
        ValueKind::UInt32 => StoredValue::UInt32(u32::from_le_bytes(fixed(key, payload)?)),
        ValueKind::Int64 => StoredValue::Int64(i64::from_le_bytes(fixed(key, payload)?)),
        ValueKind::UInt64 => StoredValue::UInt64(u64::from_le_bytes(fixed(key, payload)?)),
        ValueKind::Double => StoredValue::Double(f64::from_le_bytes(fixed(key, payload)?)),
        ValueKind::String => StoredValue::String(
            String::from_utf8(payload.to_vec())
                .map_err(|e| StoreError::corrupt(key, e.to_string()))?,
        ),
        ValueKind::Bytes => StoredValue::Bytes(payload.to_vec()),
    };

    Ok(Record { value, expire_at })
}

fn fixed<const N: usize>(key: &str, bytes: &[u8]) -> StoreResult<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| StoreError::corrupt(key, format!("expected {N} bytes, got {}", bytes.len())))
}
