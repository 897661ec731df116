//! Extension API for registering host functions.
//!
//! An [`Extension`] bundles named ops with an init hook that seeds the shared
//! [`ExtensionState`]. The [`ExtensionRegistry`] is what the host calls into:
//! it looks the op up, runs it, and turns a failed op into a thrown
//! exception on the caller's [`Env`].

use crate::env::{CallArgs, Env};
use crate::error::{BridgeError, BridgeResult};
use crate::value::JsValue;
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub type OpResult = BridgeResult<JsValue>;
/// Type alias for extension initialization functions.
pub type ExtensionInitFn = Arc<dyn Fn(&ExtensionState) + Send + Sync>;
/// Type alias for op handlers.
pub type OpFn = Arc<dyn Fn(&OpContext, &CallArgs<'_>) -> OpResult + Send + Sync>;

/// Type-map shared by every op of a registry.
#[derive(Clone)]
pub struct ExtensionState {
    inner: Arc<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>>,
}

impl Default for ExtensionState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn put<T: Any + Send + Sync>(&self, value: T) {
        let mut map = self.inner.lock();
        map.insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let map = self.inner.lock();
        map.get(&TypeId::of::<T>()).and_then(|value| {
            let value = value.clone();
            value.downcast::<T>().ok()
        })
    }

    /// Like [`get`](Self::get), but a missing entry is an internal error.
    pub fn require<T: Any + Send + Sync>(&self) -> BridgeResult<Arc<T>> {
        self.get::<T>().ok_or_else(|| {
            BridgeError::internal(format!(
                "extension state has no {}",
                std::any::type_name::<T>()
            ))
        })
    }
}

#[derive(Clone)]
pub struct OpContext {
    state: ExtensionState,
}

impl OpContext {
    pub fn state(&self) -> &ExtensionState {
        &self.state
    }
}

#[derive(Clone)]
pub struct OpDecl {
    name: String,
    handler: OpFn,
}

impl OpDecl {
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub fn op_native<F>(name: &str, handler: F) -> OpDecl
where
    F: Fn(&OpContext, &CallArgs<'_>) -> OpResult + Send + Sync + 'static,
{
    OpDecl {
        name: name.to_string(),
        handler: Arc::new(handler),
    }
}

#[derive(Clone)]
pub struct Extension {
    name: String,
    ops: Vec<OpDecl>,
    init: Option<ExtensionInitFn>,
}

impl Extension {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ops: Vec::new(),
            init: None,
        }
    }

    /// Get the name of this extension
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_ops(mut self, ops: Vec<OpDecl>) -> Self {
        self.ops = ops;
        self
    }

    pub fn with_init<F>(mut self, init: F) -> Self
    where
        F: Fn(&ExtensionState) + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(init));
        self
    }
}

pub struct ExtensionRegistry {
    ops: Mutex<HashMap<String, OpDecl>>,
    state: ExtensionState,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(HashMap::new()),
            state: ExtensionState::new(),
        }
    }

    pub fn state(&self) -> ExtensionState {
        self.state.clone()
    }

    pub fn register_extension(&self, extension: Extension) -> BridgeResult<()> {
        debug!(
            extension = extension.name(),
            ops_count = extension.ops.len(),
            "Registering extension"
        );

        let mut ops = self.ops.lock();
        if let Some(dup) = extension.ops.iter().find(|op| ops.contains_key(op.name())) {
            return Err(BridgeError::DuplicateOp(dup.name().to_string()));
        }

        if let Some(init) = extension.init.as_ref() {
            init(&self.state);
        }

        for op in extension.ops {
            if ops.contains_key(op.name()) {
                return Err(BridgeError::DuplicateOp(op.name().to_string()));
            }
            ops.insert(op.name().to_string(), op);
        }

        debug!(extension = %extension.name, "Extension registered successfully");
        Ok(())
    }

    fn get_op(&self, name: &str) -> Option<OpDecl> {
        let ops = self.ops.lock();
        ops.get(name).cloned()
    }

    /// Call op `name` with `args`.
    ///
    /// On failure the error is thrown on `env` (unless an exception is
    /// already pending there) and `undefined` is returned.
    pub fn call(&self, env: &mut Env, name: &str, args: &[JsValue]) -> JsValue {
        match self.try_call(name, args) {
            Ok(value) => value,
            Err(err) => {
                let thrown = env.throw(err.to_js_error());
                debug!(op = name, error = %err, thrown, "Op failed");
                JsValue::Undefined
            }
        }
    }

    /// Call op `name`, returning the error instead of throwing it.
    pub fn try_call(&self, name: &str, args: &[JsValue]) -> OpResult {
        let op = self
            .get_op(name)
            .ok_or_else(|| BridgeError::UnknownOp(name.to_string()))?;
        let ctx = OpContext {
            state: self.state(),
        };
        (op.handler)(&ctx, &CallArgs::new(args))
    }
}
