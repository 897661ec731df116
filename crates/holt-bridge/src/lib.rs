//! Holt Bridge - exposes holt stores to a script runtime
//!
//! The bridge is the only place script values meet store values. It owns the
//! conversion rules for each supported type, the handle table that stands in
//! for store pointers, the optional-argument rules for expiration and crypt
//! keys, and the buffer ownership policy.
//!
//! # Usage
//!
//! ```no_run
//! use holt_bridge::{Env, JsValue, new_registry};
//! use holt_store::HoltEngine;
//! use std::sync::Arc;
//!
//! let registry = new_registry(Arc::new(HoltEngine::new())).unwrap();
//! let mut env = Env::new();
//!
//! registry.call(&mut env, "initialize", &[
//!     JsValue::string("/data/holt"),
//!     JsValue::string("/tmp/holt"),
//!     JsValue::Number(1.0),
//! ]);
//! let handle = registry.call(&mut env, "getDefaultStore", &[JsValue::Number(1.0)]);
//! registry.call(&mut env, "encodeInt64", &[
//!     handle.clone(),
//!     JsValue::string("visits"),
//!     JsValue::bigint(1),
//! ]);
//! ```

pub mod buffer;
pub mod codec;
mod env;
mod error;
pub mod extension;
pub mod handle;
mod ops;
pub mod params;
pub mod value;

pub use codec::{FromJs, ToJs};
pub use env::{CallArgs, Env};
pub use error::{BridgeError, BridgeResult, ErrorKind, JsError};
pub use extension::{Extension, ExtensionRegistry, ExtensionState, OpContext, op_native};
pub use handle::{HandleTable, StoreHandle};
pub use ops::{BootState, Engine, HOLT_EXTENSION, holt_extension};
pub use value::{JsArrayBuffer, JsString, JsValue};

use holt_store::StoreClient;
use std::sync::Arc;

/// Create a registry with the holt extension installed
pub fn new_registry(client: Arc<dyn StoreClient>) -> BridgeResult<ExtensionRegistry> {
    let registry = ExtensionRegistry::new();
    registry.register_extension(holt_extension(client))?;
    Ok(registry)
}
