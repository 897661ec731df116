//! End to end against the redb-backed engine.

mod common;

use common::{big, s};
use holt_bridge::{Env, ExtensionRegistry, JsValue, new_registry};
use holt_store::{AccessMode, DEFAULT_STORE_NAME, HoltEngine};
use std::sync::Arc;

struct Session {
    registry: ExtensionRegistry,
    env: Env,
}

impl Session {
    fn new() -> Self {
        Self {
            registry: new_registry(Arc::new(HoltEngine::new())).unwrap(),
            env: Env::new(),
        }
    }

    fn ok(&mut self, name: &str, args: &[JsValue]) -> JsValue {
        let out = self.registry.call(&mut self.env, name, args);
        assert!(
            !self.env.is_exception_pending(),
            "{name} threw {:?}",
            self.env.pending_exception()
        );
        out
    }
}

#[test]
fn boot_acquire_write_read() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("data");
    let cache = dir.path().join("cache");
    let root_str = root.to_string_lossy().to_string();

    let mut session = Session::new();
    let out = session.ok(
        "initialize",
        &[s(&root_str), s(&cache.to_string_lossy()), JsValue::Number(4.0)],
    );
    assert_eq!(out, s(&root_str));
    assert!(root.is_dir());
    assert!(cache.is_dir());

    let version = session.ok("version", &[]);
    assert!(matches!(&version, JsValue::String(v) if v.to_string_lossy().starts_with('v')));

    let handle = session.ok(
        "getDefaultStore",
        &[JsValue::Number(f64::from(AccessMode::MULTI_PROCESS)), JsValue::Undefined],
    );
    assert_ne!(handle, big(0));
    assert!(root.join(DEFAULT_STORE_NAME).exists());

    let out = session.ok("encodeInt64", &[handle.clone(), s("big"), big(i64::MAX.into())]);
    assert_eq!(out, JsValue::Boolean(true));
    let out = session.ok("decodeInt64", &[handle.clone(), s("big"), big(0)]);
    assert_eq!(out, big(i64::MAX.into()));

    let out = session.ok("decodeInt64", &[handle.clone(), s("missing"), big(-1)]);
    assert_eq!(out, big(-1));

    session.ok("encodeString", &[handle.clone(), s("name"), s("river")]);
    session.ok("encodeBytes", &[handle.clone(), s("raw"), JsValue::array_buffer(vec![0, 255])]);
    assert_eq!(session.ok("count", &[handle.clone()]), JsValue::Number(3.0));

    let out = session.ok("decodeBytes", &[handle.clone(), s("raw"), JsValue::Undefined]);
    assert_eq!(out.as_array_buffer().unwrap().to_vec(), vec![0, 255]);

    assert_eq!(
        session.ok("removeValueForKey", &[handle.clone(), s("name")]),
        JsValue::Boolean(true)
    );
    assert_eq!(
        session.ok("decodeString", &[handle, s("name"), JsValue::Null]),
        JsValue::Null
    );
}

#[test]
fn values_persist_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().to_string();
    let boot = [s(&root), s(&root), JsValue::Number(4.0)];

    {
        let mut session = Session::new();
        session.ok("initialize", &boot);
        let handle = session.ok("getDefaultStore", &[JsValue::Number(1.0)]);
        session.ok("encodeUInt32", &[handle.clone(), s("visits"), JsValue::Number(41.0)]);
        session.ok("encodeDouble", &[handle, s("ratio"), JsValue::Number(0.75)]);
    }

    let mut session = Session::new();
    session.ok("initialize", &boot);
    let handle = session.ok("getDefaultStore", &[JsValue::Number(1.0)]);
    assert_eq!(
        session.ok("decodeUInt32", &[handle.clone(), s("visits"), JsValue::Number(0.0)]),
        JsValue::Number(41.0)
    );
    assert_eq!(
        session.ok("decodeDouble", &[handle, s("ratio"), JsValue::Number(0.0)]),
        JsValue::Number(0.75)
    );
}

#[test]
fn expiring_writes_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().to_string();

    let mut session = Session::new();
    session.ok("initialize", &[s(&root), s(&root), JsValue::Number(4.0)]);
    let handle = session.ok("getDefaultStore", &[JsValue::Number(1.0)]);

    // Expiry timing is covered with a fixed clock in holt-store.
    let out = session.ok(
        "encodeBool",
        &[handle.clone(), s("flash"), JsValue::Boolean(true), JsValue::Number(0.0)],
    );
    assert_eq!(out, JsValue::Boolean(true));
    session.ok(
        "encodeBool",
        &[handle.clone(), s("later"), JsValue::Boolean(true), JsValue::Number(3600.0)],
    );
    assert_eq!(
        session.ok("decodeBool", &[handle.clone(), s("later"), JsValue::Boolean(false)]),
        JsValue::Boolean(true)
    );
    assert_eq!(
        session.ok("containsKey", &[handle, s("later")]),
        JsValue::Boolean(true)
    );
}

#[test]
fn read_only_store_refuses_writes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().to_string();

    let mut session = Session::new();
    session.ok("initialize", &[s(&root), s(&root), JsValue::Number(4.0)]);
    let mode = AccessMode::SINGLE_PROCESS | AccessMode::READ_ONLY;
    let handle = session.ok("getDefaultStore", &[JsValue::Number(f64::from(mode))]);
    assert_ne!(handle, big(0));

    let out = session.ok("encodeString", &[handle.clone(), s("k"), s("v")]);
    assert_eq!(out, JsValue::Boolean(false));
    assert_eq!(
        session.ok("decodeString", &[handle, s("k"), s("none")]),
        s("none")
    );
}

#[test]
fn encrypted_request_falls_back_once_plain_is_open() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().to_string();

    let mut session = Session::new();
    session.ok("initialize", &[s(&root), s(&root), JsValue::Number(4.0)]);
    let plain = session.ok("getDefaultStore", &[JsValue::Number(1.0)]);
    let keyed = session.ok("getDefaultStore", &[JsValue::Number(1.0), s("secret")]);

    assert_eq!(plain, keyed);
}
