//! Filesystem type registration.
//!
//! The registry is an ordinary value owned by the host layer, not process
//! global state. Registering a type is the "module loaded" moment and
//! unregistering it the "module unloaded" one; per-mount state never touches
//! the registry.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::info;

use crate::config::MountConfig;
use crate::error::{FsError, FsResult};
use crate::superblock::Superblock;

/// A mountable filesystem type.
pub trait FsType: Send + Sync {
    /// Type name (e.g. `"smartfishfs"`).
    fn name(&self) -> &'static str;

    /// Create and populate a new mount instance.
    fn mount(&self, config: &MountConfig) -> FsResult<Arc<Superblock>>;

    /// Tear down a mount instance.
    fn unmount(&self, sb: &Superblock);
}

/// Registered filesystem types, keyed by name in registration order.
#[derive(Default)]
pub struct FsRegistry {
    types: IndexMap<&'static str, Arc<dyn FsType>>,
}

impl std::fmt::Debug for FsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsRegistry")
            .field("types", &self.names())
            .finish()
    }
}

impl FsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filesystem type. Fails if the name is taken.
    pub fn register(&mut self, fs: impl FsType + 'static) -> FsResult<()> {
        self.register_arc(Arc::new(fs))
    }

    /// Register a filesystem type (already wrapped in Arc).
    pub fn register_arc(&mut self, fs: Arc<dyn FsType>) -> FsResult<()> {
        let name = fs.name();
        if self.types.contains_key(name) {
            return Err(FsError::already_exists(format!("filesystem type {name}")));
        }
        self.types.insert(name, fs);
        info!(fs = name, "filesystem type registered");
        Ok(())
    }

    /// Remove a filesystem type.
    ///
    /// Returns `true` if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.types.shift_remove(name).is_some();
        if removed {
            info!(fs = name, "filesystem type unregistered");
        }
        removed
    }

    /// Find a filesystem type by name.
    pub fn lookup(&self, name: &str) -> FsResult<Arc<dyn FsType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| FsError::not_found(format!("filesystem type {name}")))
    }

    /// Mount an instance of the named type.
    pub fn mount(&self, name: &str, config: &MountConfig) -> FsResult<Arc<Superblock>> {
        self.lookup(name)?.mount(config)
    }

    /// Registered type names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.types.keys().copied().collect()
    }
}
