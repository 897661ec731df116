//! Value codec
//!
//! Conversions between script values and the store's primitive types.
//!
//! | Native | Script          | Notes                                        |
//! |--------|-----------------|----------------------------------------------|
//! | bool   | boolean         | outbound via the 1/0 projection + ToBoolean  |
//! | i32    | number          | integral and in range, else RangeError       |
//! | u32    | number          | integral and in range, else RangeError       |
//! | i64    | bigint          | lossless only, else RangeError               |
//! | u64    | bigint          | lossless only, else RangeError               |
//! | f64    | number          | NaN and infinities pass through              |
//! | String | string          | two-pass UTF-16 to UTF-8                     |
//!
//! Byte buffers live in [`crate::buffer`].

use crate::error::{BridgeError, BridgeResult};
use crate::value::{JsString, JsValue};
use num_traits::ToPrimitive;

/// Script value to native
pub trait FromJs: Sized {
    fn from_js(value: &JsValue) -> BridgeResult<Self>;
}

/// Native value to script
pub trait ToJs {
    fn to_js(self) -> JsValue;
}

impl FromJs for bool {
    fn from_js(value: &JsValue) -> BridgeResult<Self> {
        match value {
            JsValue::Boolean(b) => Ok(*b),
            other => Err(BridgeError::type_mismatch("boolean", other.type_name())),
        }
    }
}

impl ToJs for bool {
    fn to_js(self) -> JsValue {
        let projected = JsValue::Number(if self { 1.0 } else { 0.0 });
        JsValue::Boolean(projected.coerce_to_bool())
    }
}

fn integral_number(value: &JsValue, target: &'static str, min: f64, max: f64) -> BridgeResult<f64> {
    let n = match value {
        JsValue::Number(n) => *n,
        other => return Err(BridgeError::type_mismatch("number", other.type_name())),
    };
    if !n.is_finite() || n.fract() != 0.0 || n < min || n > max {
        return Err(BridgeError::Range {
            target,
            value: n.to_string(),
        });
    }
    Ok(n)
}

impl FromJs for i32 {
    fn from_js(value: &JsValue) -> BridgeResult<Self> {
        integral_number(value, "int32", i32::MIN as f64, i32::MAX as f64).map(|n| n as i32)
    }
}

impl ToJs for i32 {
    fn to_js(self) -> JsValue {
        JsValue::Number(f64::from(self))
    }
}

impl FromJs for u32 {
    fn from_js(value: &JsValue) -> BridgeResult<Self> {
        integral_number(value, "uint32", 0.0, u32::MAX as f64).map(|n| n as u32)
    }
}

impl ToJs for u32 {
    fn to_js(self) -> JsValue {
        JsValue::Number(f64::from(self))
    }
}

impl FromJs for i64 {
    fn from_js(value: &JsValue) -> BridgeResult<Self> {
        match value {
            JsValue::BigInt(b) => b.to_i64().ok_or_else(|| BridgeError::LossyBigInt {
                target: "int64",
                value: b.to_string(),
            }),
            other => Err(BridgeError::type_mismatch("bigint", other.type_name())),
        }
    }
}

impl ToJs for i64 {
    fn to_js(self) -> JsValue {
        JsValue::bigint(self)
    }
}

impl FromJs for u64 {
    fn from_js(value: &JsValue) -> BridgeResult<Self> {
        match value {
            JsValue::BigInt(b) => b.to_u64().ok_or_else(|| BridgeError::LossyBigInt {
                target: "uint64",
                value: b.to_string(),
            }),
            other => Err(BridgeError::type_mismatch("bigint", other.type_name())),
        }
    }
}

impl ToJs for u64 {
    fn to_js(self) -> JsValue {
        JsValue::bigint(self)
    }
}

impl FromJs for f64 {
    fn from_js(value: &JsValue) -> BridgeResult<Self> {
        match value {
            JsValue::Number(n) => Ok(*n),
            other => Err(BridgeError::type_mismatch("number", other.type_name())),
        }
    }
}

impl ToJs for f64 {
    fn to_js(self) -> JsValue {
        JsValue::Number(self)
    }
}

impl FromJs for String {
    fn from_js(value: &JsValue) -> BridgeResult<Self> {
        match value {
            JsValue::String(s) => utf8_from_js_string(s),
            other => Err(BridgeError::type_mismatch("string", other.type_name())),
        }
    }
}

impl ToJs for String {
    fn to_js(self) -> JsValue {
        JsValue::String(JsString::from(self.as_str()))
    }
}

impl ToJs for &str {
    fn to_js(self) -> JsValue {
        JsValue::string(self)
    }
}

/// Size the buffer first, then fill exactly that many bytes.
fn utf8_from_js_string(s: &JsString) -> BridgeResult<String> {
    let len = s.utf8_len();
    let mut buf = vec![0u8; len];
    let written = s.write_utf8(&mut buf);
    if written != len {
        return Err(BridgeError::internal(format!(
            "string encoding wrote {written} of {len} bytes"
        )));
    }
    String::from_utf8(buf).map_err(|e| BridgeError::internal(e.to_string()))
}
