//! Holt Store - persistent typed key-value store
//!
//! The engine behind the holt bridge. Values are typed records in a redb
//! table, optionally carrying an expiry. The bridge only talks to it through
//! [`StoreClient`] and [`StoreInstance`].
//!
//! # Usage
//!
//! ```no_run
//! use holt_store::{AccessMode, BootContext, HoltEngine, LogLevel, StoreClient, ValueRef};
//!
//! let engine = HoltEngine::new();
//! let ctx = BootContext::new("/data/holt", "/tmp/holt", LogLevel::INFO);
//! engine.initialize(&ctx);
//!
//! let store = engine
//!     .default_store(&ctx, AccessMode(AccessMode::SINGLE_PROCESS), None)
//!     .unwrap();
//! store.set("visits", ValueRef::Int32(1));
//! assert_eq!(store.get_int32("visits", 0), 1);
//! ```

mod engine;
mod error;
mod instance;
mod logging;
pub mod record;
mod store;

pub use engine::{BootContext, DEFAULT_STORE_NAME, HoltEngine, StoreClient, VERSION};
pub use error::{StoreError, StoreResult};
pub use instance::{AccessMode, StoreInstance};
pub use logging::LogLevel;
pub use record::{StoredValue, ValueKind, ValueRef};
pub use store::{Clock, KvStore, StoreOptions};
