//! Bootstrap and instance acquisition

use crate::instance::{AccessMode, StoreInstance};
use crate::logging::{self, LogLevel};
use crate::store::{KvStore, StoreOptions};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Engine version string
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// File name of the default store inside the root directory
pub const DEFAULT_STORE_NAME: &str = "holt.default";

/// Process initialization parameters, built once by `initialize` and handed
/// to every acquisition afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct BootContext {
    pub root_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub log_level: LogLevel,
}

impl BootContext {
    pub fn new(root_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>, log_level: LogLevel) -> Self {
        Self {
            root_dir: root_dir.into(),
            cache_dir: cache_dir.into(),
            log_level,
        }
    }
}

/// The engine side of the bridge.
pub trait StoreClient: Send + Sync {
    /// One-time process setup. Returns the effective root directory.
    fn initialize(&self, ctx: &BootContext) -> PathBuf;

    fn version(&self) -> &str;

    /// Acquire or create the default store. `None` means no instance could be
    /// produced for this combination of arguments.
    fn default_store(
        &self,
        ctx: &BootContext,
        mode: AccessMode,
        crypt_key: Option<&str>,
    ) -> Option<Arc<dyn StoreInstance>>;
}

/// redb-backed engine
#[derive(Debug, Default)]
pub struct HoltEngine {
    default_store: Mutex<Option<Arc<KvStore>>>,
}

impl HoltEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_dir(path: &Path) {
    if path.as_os_str().is_empty() || path.exists() {
        return;
    }
    if let Err(err) = std::fs::create_dir_all(path) {
        error!(path = %path.display(), error = %err, "Failed to create directory");
    }
}

impl StoreClient for HoltEngine {
    fn initialize(&self, ctx: &BootContext) -> PathBuf {
        logging::install(ctx.log_level);

        ensure_dir(&ctx.root_dir);
        ensure_dir(&ctx.cache_dir);

        info!(
            root_dir = %ctx.root_dir.display(),
            cache_dir = %ctx.cache_dir.display(),
            log_level = ctx.log_level.0,
            "Initialized holt"
        );
        ctx.root_dir.clone()
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn default_store(
        &self,
        ctx: &BootContext,
        mode: AccessMode,
        crypt_key: Option<&str>,
    ) -> Option<Arc<dyn StoreInstance>> {
        let mut slot = self.default_store.lock();

        // A cached instance keeps the mode it was first opened with.

        if let Some(existing) = slot.as_ref() {
            if crypt_key.is_some() && existing.crypt_key() != crypt_key {
                warn!("Default store is already open with a different crypt key");
                return None;
            }
            return Some(existing.clone() as Arc<dyn StoreInstance>);
        }

        let path = ctx.root_dir.join(DEFAULT_STORE_NAME);
        let options = StoreOptions {
            mode,
            crypt_key: crypt_key.map(str::to_string),
        };
        match KvStore::open(&path.to_string_lossy(), options) {
            Ok(store) => {
                let store = Arc::new(store);
                *slot = Some(store.clone());
                Some(store as Arc<dyn StoreInstance>)
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "Failed to open default store");
                None
            }
        }
    }
}
