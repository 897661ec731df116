#![allow(dead_code)]

use holt_bridge::{Env, ExtensionRegistry, JsValue, new_registry};
use holt_store::{AccessMode, BootContext, StoreClient, StoreInstance, StoredValue, ValueRef};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// What the bridge asked the store to do
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Set { key: String },
    SetWithExpiration { key: String, expiration: u32 },
    Get { key: String },
    Remove { key: String },
    Count,
}

/// In-memory store double that logs every call it receives.
#[derive(Default)]
pub struct RecordingStore {
    values: Mutex<HashMap<String, StoredValue>>,
    calls: Mutex<Vec<Call>>,
}

fn to_owned(value: ValueRef<'_>) -> StoredValue {
    match value {
        ValueRef::Bool(v) => StoredValue::Bool(v),
        ValueRef::Int32(v) => StoredValue::Int32(v),
        ValueRef::UInt32(v) => StoredValue::UInt32(v),
        ValueRef::Int64(v) => StoredValue::Int64(v),
        ValueRef::UInt64(v) => StoredValue::UInt64(v),
        ValueRef::Double(v) => StoredValue::Double(v),
        ValueRef::String(v) => StoredValue::String(v.to_string()),
        ValueRef::Bytes(v) => StoredValue::Bytes(v.to_vec()),
    }
}

impl RecordingStore {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn stored(&self, key: &str) -> Option<StoredValue> {
        self.values.lock().get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl StoreInstance for RecordingStore {
    fn set(&self, key: &str, value: ValueRef<'_>) -> bool {
        self.calls.lock().push(Call::Set {
            key: key.to_string(),
        });
        self.values.lock().insert(key.to_string(), to_owned(value));
        true
    }

    fn set_with_expiration(&self, key: &str, value: ValueRef<'_>, expiration: u32) -> bool {
        self.calls.lock().push(Call::SetWithExpiration {
            key: key.to_string(),
            expiration,
        });
        self.values.lock().insert(key.to_string(), to_owned(value));
        true
    }

    fn get(&self, key: &str) -> Option<StoredValue> {
        self.calls.lock().push(Call::Get {
            key: key.to_string(),
        });
        self.values.lock().get(key).cloned()
    }

    fn remove_value(&self, key: &str) -> bool {
        self.calls.lock().push(Call::Remove {
            key: key.to_string(),
        });
        self.values.lock().remove(key).is_some()
    }

    fn count(&self) -> usize {
        self.calls.lock().push(Call::Count);
        self.values.lock().len()
    }
}

/// Client double handing out fixed store instances.
pub struct FixedClient {
    pub plain: Arc<RecordingStore>,
    pub encrypted: Option<Arc<RecordingStore>>,
    pub acquisitions: Mutex<Vec<Option<String>>>,
}

impl FixedClient {
    pub fn new(plain: Arc<RecordingStore>) -> Self {
        Self {
            plain,
            encrypted: None,
            acquisitions: Mutex::new(Vec::new()),
        }
    }
}

impl StoreClient for FixedClient {
    fn initialize(&self, ctx: &BootContext) -> PathBuf {
        ctx.root_dir.clone()
    }

    fn version(&self) -> &str {
        "v-test"
    }

    fn default_store(
        &self,
        _ctx: &BootContext,
        _mode: AccessMode,
        crypt_key: Option<&str>,
    ) -> Option<Arc<dyn StoreInstance>> {
        self.acquisitions
            .lock()
            .push(crypt_key.map(str::to_string));
        match crypt_key {
            Some(_) => self
                .encrypted
                .clone()
                .map(|store| store as Arc<dyn StoreInstance>),
            None => Some(self.plain.clone() as Arc<dyn StoreInstance>),
        }
    }
}

/// A registry wired to a recording store, already initialized and holding a
/// default store handle.
pub struct Harness {
    pub registry: ExtensionRegistry,
    pub env: Env,
    pub store: Arc<RecordingStore>,
    pub handle: JsValue,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(RecordingStore::default());
        let client = Arc::new(FixedClient::new(store.clone()));
        let registry = new_registry(client).unwrap();
        let mut env = Env::new();

        registry.call(
            &mut env,
            "initialize",
            &[s("/root"), s("/cache"), JsValue::Number(4.0)],
        );
        let handle = registry.call(&mut env, "getDefaultStore", &[JsValue::Number(1.0)]);
        assert!(!env.is_exception_pending(), "{:?}", env.pending_exception());

        Self {
            registry,
            env,
            store,
            handle,
        }
    }

    pub fn call(&mut self, name: &str, args: &[JsValue]) -> JsValue {
        self.registry.call(&mut self.env, name, args)
    }

    /// Call and assert no exception was raised
    pub fn ok(&mut self, name: &str, args: &[JsValue]) -> JsValue {
        let out = self.call(name, args);
        assert!(
            !self.env.is_exception_pending(),
            "{name} threw {:?}",
            self.env.pending_exception()
        );
        out
    }
}

pub fn s(value: &str) -> JsValue {
    JsValue::string(value)
}

pub fn big(value: i128) -> JsValue {
    JsValue::bigint(value)
}
