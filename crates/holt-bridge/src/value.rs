//! Host-side value model
//!
//! The subset of script values that can cross the bridge. Strings are kept as
//! UTF-16 code units the way the runtime holds them, and ArrayBuffers have
//! reference semantics: cloning a `JsValue::ArrayBuffer` shares the bytes.

use num_bigint::BigInt;
use parking_lot::RwLock;
use std::sync::Arc;

/// A script value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    BigInt(BigInt),
    String(JsString),
    ArrayBuffer(JsArrayBuffer),
}

impl JsValue {
    pub fn string(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }

    pub fn bigint(value: impl Into<BigInt>) -> Self {
        JsValue::BigInt(value.into())
    }

    pub fn array_buffer(bytes: Vec<u8>) -> Self {
        JsValue::ArrayBuffer(JsArrayBuffer::from_vec(bytes))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    /// Name used in error messages, close to `typeof` but telling
    /// `null` and ArrayBuffer apart from plain objects.
    pub fn type_name(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "null",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::BigInt(_) => "bigint",
            JsValue::String(_) => "string",
            JsValue::ArrayBuffer(_) => "ArrayBuffer",
        }
    }

    /// ToBoolean
    pub fn coerce_to_bool(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => !(*n == 0.0 || n.is_nan()),
            JsValue::BigInt(b) => *b != BigInt::default(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::ArrayBuffer(_) => true,
        }
    }

    pub fn as_array_buffer(&self) -> Option<&JsArrayBuffer> {
        match self {
            JsValue::ArrayBuffer(buf) => Some(buf),
            _ => None,
        }
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::string(s)
    }
}

/// An immutable UTF-16 string
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct JsString {
    units: Arc<[u16]>,
}

impl JsString {
    pub fn from_utf16(units: Vec<u16>) -> Self {
        Self {
            units: units.into(),
        }
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn chars(&self) -> impl Iterator<Item = char> + '_ {
        char::decode_utf16(self.units.iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    /// Number of bytes the UTF-8 encoding takes. Unpaired surrogates count as
    /// U+FFFD.
    pub fn utf8_len(&self) -> usize {
        self.chars().map(char::len_utf8).sum()
    }

    /// Encode into `buf`, stopping at the last whole character that fits.
    /// Returns the number of bytes written.
    pub fn write_utf8(&self, buf: &mut [u8]) -> usize {
        let mut written = 0;
        for c in self.chars() {
            let len = c.len_utf8();
            if written + len > buf.len() {
                break;
            }
            c.encode_utf8(&mut buf[written..written + len]);
            written += len;
        }
        written
    }

    pub fn to_string_lossy(&self) -> String {
        self.chars().collect()
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self::from_utf16(s.encode_utf16().collect())
    }
}

impl std::fmt::Debug for JsString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl std::fmt::Display for JsString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// A script ArrayBuffer
///
/// The bytes belong to the script side. Native code only gets to look at them
/// inside [`with_bytes`](Self::with_bytes).
#[derive(Clone, Default)]
pub struct JsArrayBuffer {
    data: Arc<RwLock<Vec<u8>>>,
}

impl JsArrayBuffer {
    /// Create a zero-filled buffer of `byte_length` bytes
    pub fn new(byte_length: usize) -> Self {
        Self::from_vec(vec![0; byte_length])
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(bytes)),
        }
    }

    pub fn byte_length(&self) -> usize {
        self.data.read().len()
    }

    /// Borrow the bytes for the duration of `f`
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.data.read())
    }

    /// Mutate the bytes in place, as script code writing through a view would
    pub fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        f(&mut self.data.write())
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.read().clone()
    }

    /// Whether both handles refer to the same buffer
    pub fn ptr_eq(&self, other: &JsArrayBuffer) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for JsArrayBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.data.read() == *other.data.read()
    }
}

impl std::fmt::Debug for JsArrayBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsArrayBuffer")
            .field("byte_length", &self.byte_length())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_len_counts_multibyte() {
        let s = JsString::from("héllo 🦦");
        assert_eq!(s.utf8_len(), "héllo 🦦".len());
        assert_eq!(s.len(), "héllo 🦦".encode_utf16().count());
    }

    #[test]
    fn test_lone_surrogate_becomes_replacement() {
        let s = JsString::from_utf16(vec![0x61, 0xD800, 0x62]);
        assert_eq!(s.utf8_len(), 1 + 3 + 1);
        assert_eq!(s.to_string_lossy(), "a\u{FFFD}b");
    }

    #[test]
    fn test_write_utf8_stops_at_char_boundary() {
        let s = JsString::from("aé");
        let mut buf = [0u8; 2];
        assert_eq!(s.write_utf8(&mut buf), 1);
        assert_eq!(&buf[..1], b"a");
    }

    #[test]
    fn test_coerce_to_bool() {
        assert!(!JsValue::Undefined.coerce_to_bool());
        assert!(!JsValue::Number(0.0).coerce_to_bool());
        assert!(!JsValue::Number(f64::NAN).coerce_to_bool());
        assert!(JsValue::Number(1.0).coerce_to_bool());
        assert!(!JsValue::bigint(0).coerce_to_bool());
        assert!(JsValue::bigint(-3).coerce_to_bool());
        assert!(!JsValue::string("").coerce_to_bool());
        assert!(JsValue::array_buffer(Vec::new()).coerce_to_bool());
    }

    #[test]
    fn test_array_buffer_clones_share_bytes() {
        let a = JsArrayBuffer::from_vec(vec![1, 2, 3]);
        let b = a.clone();
        b.with_bytes_mut(|bytes| bytes[0] = 9);
        assert_eq!(a.to_vec(), vec![9, 2, 3]);
        assert!(a.ptr_eq(&b));

        let c = JsArrayBuffer::from_vec(vec![9, 2, 3]);
        assert_eq!(a, c);
        assert!(!a.ptr_eq(&c));
    }
}
