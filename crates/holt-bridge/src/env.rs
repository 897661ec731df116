//! Per-call environment and argument access

use crate::codec::FromJs;
use crate::error::{BridgeError, BridgeResult, JsError};
use crate::value::JsValue;

static UNDEFINED: JsValue = JsValue::Undefined;

/// The caller's environment for one call into the bridge.
///
/// Holds at most one pending exception. Once an exception is pending, later
/// throws are dropped so the first error is what the caller sees.
#[derive(Debug, Default)]
pub struct Env {
    pending: Option<JsError>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exception_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_exception(&self) -> Option<&JsError> {
        self.pending.as_ref()
    }

    /// Raise `error` unless something is already pending. Returns whether
    /// `error` became the pending exception.
    pub fn throw(&mut self, error: JsError) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(error);
        true
    }

    /// Clear and return the pending exception
    pub fn take_exception(&mut self) -> Option<JsError> {
        self.pending.take()
    }
}

/// Positional call arguments. Missing trailing arguments read as `undefined`.
#[derive(Debug, Clone, Copy)]
pub struct CallArgs<'a> {
    args: &'a [JsValue],
}

impl<'a> CallArgs<'a> {
    pub fn new(args: &'a [JsValue]) -> Self {
        Self { args }
    }

    pub fn get(&self, index: usize) -> &'a JsValue {
        self.args.get(index).unwrap_or(&UNDEFINED)
    }

    /// Whether the argument was supplied with a value other than `undefined`
    pub fn is_present(&self, index: usize) -> bool {
        !self.get(index).is_undefined()
    }

    /// Convert argument `index`, naming it in the error on failure
    pub fn value<T: FromJs>(&self, index: usize, name: &'static str) -> BridgeResult<T> {
        T::from_js(self.get(index)).map_err(|err| BridgeError::argument(name, err))
    }
}
