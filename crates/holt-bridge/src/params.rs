//! Optional trailing parameters

use crate::env::CallArgs;
use crate::error::BridgeResult;
use holt_store::{StoreInstance, ValueRef};

/// Resolve the optional expiration argument.
///
/// Absence is decided before the value is looked at as a number: a missing or
/// `undefined` argument is `None`, while an explicit `0` is `Some(0)`.
pub fn resolve_expiration(args: &CallArgs<'_>, index: usize) -> BridgeResult<Option<u32>> {
    if !args.is_present(index) {
        return Ok(None);
    }
    args.value::<u32>(index, "expiration").map(Some)
}

/// Resolve the optional crypt key. Missing, `undefined` and `""` all mean
/// "no encryption".
pub fn resolve_crypt_key(args: &CallArgs<'_>, index: usize) -> BridgeResult<Option<String>> {
    if !args.is_present(index) {
        return Ok(None);
    }
    let key: String = args.value(index, "cryptKey")?;
    Ok(Some(key).filter(|k| !k.is_empty()))
}

/// Pick the store write variant for `expiration`.
pub fn write(
    store: &dyn StoreInstance,
    key: &str,
    value: ValueRef<'_>,
    expiration: Option<u32>,
) -> bool {
    match expiration {
        None => store.set(key, value),
        Some(secs) => store.set_with_expiration(key, value, secs),
    }
}
