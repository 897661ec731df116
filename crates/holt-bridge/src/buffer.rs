//! Byte buffer transfer
//!
//! Writes borrow the caller's ArrayBuffer for exactly as long as the store
//! call runs. Reads always hand back a fresh ArrayBuffer.

use crate::error::{BridgeError, BridgeResult};
use crate::value::{JsArrayBuffer, JsValue};
use holt_store::ValueRef;

/// A view over script-owned bytes. Cannot outlive the closure it is handed to.
#[derive(Debug, Clone, Copy)]
pub struct BorrowedBytes<'a>(&'a [u8]);

impl<'a> BorrowedBytes<'a> {
    pub fn as_slice(&self) -> &'a [u8] {
        self.0
    }

    pub fn as_value_ref(&self) -> ValueRef<'a> {
        ValueRef::Bytes(self.0)
    }
}

/// Run `f` over the bytes of `value` without copying them.
pub fn with_borrowed_bytes<R>(
    value: &JsValue,
    f: impl FnOnce(BorrowedBytes<'_>) -> R,
) -> BridgeResult<R> {
    match value {
        JsValue::ArrayBuffer(buf) => Ok(buf.with_bytes(|bytes| f(BorrowedBytes(bytes)))),
        other => Err(BridgeError::type_mismatch("ArrayBuffer", other.type_name())),
    }
}

/// Wrap bytes read from the store in a new ArrayBuffer.
///
/// `stored` is owned: the store has already copied the value out of its own
/// storage, so the script side and the store never share memory.
pub fn bytes_to_js(stored: Vec<u8>) -> JsValue {
    JsValue::ArrayBuffer(JsArrayBuffer::from_vec(stored))
}
