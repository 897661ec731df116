//! The `holt` extension: every op script code can call.
//!
//! Typed ops share one shape. Handle and key are unpacked first; a null,
//! unknown or stale handle and an empty key all short-circuit to `false`
//! (encode) or the caller's default (decode) without touching the store.

use crate::buffer::{bytes_to_js, with_borrowed_bytes};
use crate::codec::ToJs;
use crate::env::CallArgs;
use crate::error::{BridgeError, BridgeResult};
use crate::extension::{Extension, OpContext, OpResult, op_native};
use crate::handle::{HandleTable, StoreHandle};
use crate::params::{resolve_crypt_key, resolve_expiration, write};
use crate::value::JsValue;
use holt_store::{AccessMode, BootContext, LogLevel, StoreClient, StoreInstance, ValueRef};
use paste::paste;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Name the extension registers under
pub const HOLT_EXTENSION: &str = "holt";

/// The engine the ops call through to
#[derive(Clone)]
pub struct Engine(pub Arc<dyn StoreClient>);

/// Boot context, written once by `initialize`
#[derive(Debug, Default)]
pub struct BootState {
    ctx: OnceLock<BootContext>,
}

impl BootState {
    pub fn get(&self) -> Option<&BootContext> {
        self.ctx.get()
    }
}

/// Create the holt extension backed by `client`
pub fn holt_extension(client: Arc<dyn StoreClient>) -> Extension {
    Extension::new(HOLT_EXTENSION)
        .with_init(move |state| {
            state.put(Engine(client.clone()));
            state.put(HandleTable::new());
            state.put(BootState::default());
        })
        .with_ops(vec![
            op_native("initialize", initialize),
            op_native("version", version),
            op_native("getDefaultStore", get_default_store),
            op_native("closeStore", close_store),
            op_native("encodeBool", encode_bool),
            op_native("decodeBool", decode_bool),
            op_native("encodeInt32", encode_int32),
            op_native("decodeInt32", decode_int32),
            op_native("encodeUInt32", encode_uint32),
            op_native("decodeUInt32", decode_uint32),
            op_native("encodeInt64", encode_int64),
            op_native("decodeInt64", decode_int64),
            op_native("encodeUInt64", encode_uint64),
            op_native("decodeUInt64", decode_uint64),
            op_native("encodeDouble", encode_double),
            op_native("decodeDouble", decode_double),
            op_native("encodeString", encode_string),
            op_native("decodeString", decode_string),
            op_native("encodeBytes", encode_bytes),
            op_native("decodeBytes", decode_bytes),
            op_native("containsKey", contains_key),
            op_native("removeValueForKey", remove_value_for_key),
            op_native("count", count),
        ])
}

fn path_to_js(path: &std::path::Path) -> JsValue {
    JsValue::string(&path.to_string_lossy())
}

/// initialize(rootDir, cacheDir, logLevel) -> rootDir
fn initialize(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    let root_dir: String = args.value(0, "rootDir")?;
    let cache_dir: String = args.value(1, "cacheDir")?;
    let log_level: i32 = args.value(2, "logLevel")?;

    let boot = ctx.state().require::<BootState>()?;
    if let Some(existing) = boot.get() {
        warn!(
            root_dir = %existing.root_dir.display(),
            "Already initialized, keeping the first boot context"
        );
        return Ok(path_to_js(&existing.root_dir));
    }

    let engine = ctx.state().require::<Engine>()?;
    let requested = BootContext::new(root_dir, cache_dir, LogLevel(log_level));
    let root_dir = engine.0.initialize(&requested);
    let effective = BootContext { root_dir, ..requested };
    info!(
        root_dir = %effective.root_dir.display(),
        cache_dir = %effective.cache_dir.display(),
        log_level,
        "Bridge initialized"
    );

    let boot_ctx = boot.ctx.get_or_init(|| effective);
    Ok(path_to_js(&boot_ctx.root_dir))
}

/// version() -> string
fn version(ctx: &OpContext, _args: &CallArgs<'_>) -> OpResult {
    let engine = ctx.state().require::<Engine>()?;
    Ok(engine.0.version().to_js())
}

/// getDefaultStore(mode, cryptKey?) -> handle
fn get_default_store(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    let mode = AccessMode(args.value(0, "mode")?);
    let crypt_key = resolve_crypt_key(args, 1)?;

    let boot = ctx.state().require::<BootState>()?;
    let Some(boot_ctx) = boot.get() else {
        warn!("getDefaultStore called before initialize");
        return Ok(StoreHandle::NULL.raw().to_js());
    };
    let engine = ctx.state().require::<Engine>()?;

    let mut store = None;
    if let Some(key) = crypt_key.as_deref() {
        store = engine.0.default_store(boot_ctx, mode, Some(key));
        if store.is_none() {
            warn!("Encrypted default store unavailable, falling back to plain");
        }
    }
    let store = store.or_else(|| engine.0.default_store(boot_ctx, mode, None));

    let handle = match store {
        Some(store) => ctx.state().require::<HandleTable>()?.register(store),
        None => StoreHandle::NULL,
    };
    debug!(handle = handle.raw(), mode = mode.bits(), "Default store handle");
    Ok(handle.raw().to_js())
}

/// closeStore(handle) -> bool
fn close_store(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    let handle = StoreHandle::from_raw(args.value(0, "handle")?);
    let released = ctx.state().require::<HandleTable>()?.release(handle);
    Ok(released.to_js())
}

fn resolve_handle(
    ctx: &OpContext,
    handle: StoreHandle,
) -> BridgeResult<Option<Arc<dyn StoreInstance>>> {
    if handle.is_null() {
        return Ok(None);
    }
    Ok(ctx.state().require::<HandleTable>()?.resolve(handle))
}

/// Unpack `(handle, key)` from the first two arguments. `None` when either
/// does not name something the store can act on.
fn resolve_target(
    ctx: &OpContext,
    args: &CallArgs<'_>,
) -> BridgeResult<Option<(Arc<dyn StoreInstance>, String)>> {
    let handle = StoreHandle::from_raw(args.value(0, "handle")?);
    let key: String = args.value(1, "key")?;
    if handle.is_null() || key.is_empty() {
        return Ok(None);
    }
    Ok(resolve_handle(ctx, handle)?.map(|store| (store, key)))
}

macro_rules! typed_ops {
    ($($name:ident: $ty:ty => $variant:ident, $getter:ident;)*) => {
        paste! {
            $(
                fn [<encode_ $name>](ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
                    let Some((store, key)) = resolve_target(ctx, args)? else {
                        return Ok(false.to_js());
                    };
                    let value: $ty = args.value(2, "value")?;
                    let expiration = resolve_expiration(args, 3)?;
                    Ok(write(&*store, &key, ValueRef::$variant(value), expiration).to_js())
                }

                fn [<decode_ $name>](ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
                    let target = resolve_target(ctx, args)?;
                    let default: $ty = args.value(2, "default")?;
                    let value = match target {
                        Some((store, key)) => store.$getter(&key, default),
                        None => default,
                    };
                    Ok(value.to_js())
                }
            )*
        }
    };
}

typed_ops! {
    bool: bool => Bool, get_bool;
    int32: i32 => Int32, get_int32;
    uint32: u32 => UInt32, get_uint32;
    int64: i64 => Int64, get_int64;
    uint64: u64 => UInt64, get_uint64;
    double: f64 => Double, get_double;
}

/// encodeString(handle, key, value, expiration?) -> bool
fn encode_string(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    let Some((store, key)) = resolve_target(ctx, args)? else {
        return Ok(false.to_js());
    };
    let value: String = args.value(2, "value")?;
    let expiration = resolve_expiration(args, 3)?;
    Ok(write(&*store, &key, ValueRef::String(&value), expiration).to_js())
}

/// decodeString(handle, key, default) -> string | default
///
/// The default comes back as passed, whatever its type.
fn decode_string(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    if let Some((store, key)) = resolve_target(ctx, args)?
        && let Some(value) = store.get_string(&key)
    {
        return Ok(value.to_js());
    }
    Ok(args.get(2).clone())
}

/// encodeBytes(handle, key, value, expiration?) -> bool
fn encode_bytes(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    let Some((store, key)) = resolve_target(ctx, args)? else {
        return Ok(false.to_js());
    };
    let expiration = resolve_expiration(args, 3)?;
    let written = with_borrowed_bytes(args.get(2), |bytes| {
        write(&*store, &key, bytes.as_value_ref(), expiration)
    })
    .map_err(|err| BridgeError::argument("value", err))?;
    Ok(written.to_js())
}

/// decodeBytes(handle, key, default) -> ArrayBuffer | default
fn decode_bytes(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    if let Some((store, key)) = resolve_target(ctx, args)?
        && let Some(bytes) = store.get_bytes(&key)
    {
        return Ok(bytes_to_js(bytes));
    }
    Ok(args.get(2).clone())
}

/// containsKey(handle, key) -> bool
fn contains_key(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    let found = resolve_target(ctx, args)?.is_some_and(|(store, key)| store.contains_key(&key));
    Ok(found.to_js())
}

/// removeValueForKey(handle, key) -> bool
fn remove_value_for_key(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    let removed = resolve_target(ctx, args)?.is_some_and(|(store, key)| store.remove_value(&key));
    Ok(removed.to_js())
}

/// count(handle) -> number
fn count(ctx: &OpContext, args: &CallArgs<'_>) -> OpResult {
    let handle = StoreHandle::from_raw(args.value(0, "handle")?);
    let count = resolve_handle(ctx, handle)?.map_or(0, |store| store.count());
    Ok(JsValue::Number(count as f64))
}
