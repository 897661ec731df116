//! The narrow call interface the bridge consumes.

use crate::record::{StoredValue, ValueRef};

/// Opaque access-mode bits, passed through from the caller untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessMode(pub i32);

impl AccessMode {
    pub const SINGLE_PROCESS: i32 = 1;
    pub const MULTI_PROCESS: i32 = 1 << 1;
    pub const READ_ONLY: i32 = 1 << 5;

    pub fn bits(self) -> i32 {
        self.0
    }

    pub fn is_read_only(self) -> bool {
        self.0 & Self::READ_ONLY != 0
    }
}

/// A live store instance.
///
/// Writes report success as `bool` and reads fall back to the supplied
/// default; engine failures are logged by the implementation and never
/// surface here.
///
/// Implementations of [`set`](Self::set) and
/// [`set_with_expiration`](Self::set_with_expiration) must copy the borrowed
/// bytes of `value` before returning. Callers hand in views over memory they
/// do not own beyond the call.
pub trait StoreInstance: Send + Sync {
    /// Write without expiration.
    fn set(&self, key: &str, value: ValueRef<'_>) -> bool;

    /// Write with an expiration of `expiration` seconds from now. Zero is a
    /// real (short) TTL, not "no expiry".
    fn set_with_expiration(&self, key: &str, value: ValueRef<'_>, expiration: u32) -> bool;

    /// Read the live value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<StoredValue>;

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`. Returns whether a live value was removed.
    fn remove_value(&self, key: &str) -> bool;

    /// Number of live keys.
    fn count(&self) -> usize;

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(StoredValue::Bool(v)) => v,
            _ => default,
        }
    }

    fn get_int32(&self, key: &str, default: i32) -> i32 {
        match self.get(key) {
            Some(StoredValue::Int32(v)) => v,
            _ => default,
        }
    }

    fn get_uint32(&self, key: &str, default: u32) -> u32 {
        match self.get(key) {
            Some(StoredValue::UInt32(v)) => v,
            _ => default,
        }
    }

    fn get_int64(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(StoredValue::Int64(v)) => v,
            _ => default,
        }
    }

    fn get_uint64(&self, key: &str, default: u64) -> u64 {
        match self.get(key) {
            Some(StoredValue::UInt64(v)) => v,
            _ => default,
        }
    }

    fn get_double(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(StoredValue::Double(v)) => v,
            _ => default,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Some(StoredValue::String(v)) => Some(v),
            _ => None,
        }
    }

    /// Read a byte buffer. The returned vector is owned by the caller and
    /// shares nothing with the store.
    fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        match self.get(key) {
            Some(StoredValue::Bytes(v)) => Some(v),
            _ => None,
        }
    }
}
