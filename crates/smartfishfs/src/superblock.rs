//! Per-mount filesystem state.
//!
//! A [`Superblock`] owns one [`NodeTree`] behind a reader/writer lock:
//! lookups, listings, metadata and reads take it shared, node creation and
//! unmount take it exclusive. The mount state lives under the same lock so
//! that unmount and the release of every node happen in one step.

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;
use std::time::Duration;

use crate::config::MountConfig;
use crate::error::{FsError, FsResult};
use crate::mount::MountState;
use crate::reader::FileReader;
use crate::tree::{NAME_MAX, NodeTree};
use crate::types::{DirEntry, NodeId, NodeInfo, StatFs};

/// Magic number identifying SmartfishFS instances ("SMFS").
pub const SMARTFISHFS_MAGIC: u64 = 0x534D_4653;

/// Capacity reported to `statfs`-style queries. Content is not block-mapped,
/// so this is a fixed figure rather than real accounting.
const SYNTHETIC_CAPACITY: u64 = 1 << 40;

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) state: MountState,
    pub(crate) tree: NodeTree,
}

/// One mount instance of the filesystem.
#[derive(Debug)]
pub struct Superblock {
    block_size: u32,
    magic: u64,
    time_granularity: Duration,
    inner: RwLock<Inner>,
}

impl Superblock {
    /// Create an unmounted superblock with an empty tree (no root yet).
    ///
    /// Hosts get a populated superblock from [`SmartfishFs::mount`]; this is
    /// the blank instance mount starts from.
    ///
    /// [`SmartfishFs::mount`]: crate::SmartfishFs::mount
    pub(crate) fn new(block_size: u32, magic: u64) -> Self {
        Self {
            block_size,
            magic,
            time_granularity: Duration::from_nanos(1),
            inner: RwLock::new(Inner {
                state: MountState::Unmounted,
                tree: NodeTree::new(),
            }),
        }
    }

    pub(crate) fn from_config(config: &MountConfig) -> Self {
        let granularity = config.time_granularity();
        Self::new(config.block_size, SMARTFISHFS_MAGIC)
            .with_tree(granularity, NodeTree::with_limits(granularity, config.max_nodes))
    }

    fn with_tree(mut self, time_granularity: Duration, tree: NodeTree) -> Self {
        self.time_granularity = time_granularity;
        self.inner.get_mut().tree = tree;
        self
    }

    /// Block size.
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Filesystem type magic.
    pub fn magic(&self) -> u64 {
        self.magic
    }

    /// Timestamp granularity.
    pub fn time_granularity(&self) -> Duration {
        self.time_granularity
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MountState {
        self.inner.read().state
    }

    /// Returns true while the filesystem is mounted.
    pub fn is_mounted(&self) -> bool {
        self.state() == MountState::Mounted
    }

    pub(crate) fn write_inner(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write()
    }

    /// Shared access to the node tree of a mounted filesystem.
    ///
    /// Holding the guard blocks node creation and unmount; keep it short.
    pub fn tree(&self) -> FsResult<MappedRwLockReadGuard<'_, NodeTree>> {
        let inner = self.inner.read();
        if inner.state != MountState::Mounted {
            return Err(FsError::not_found(format!(
                "filesystem is {}",
                inner.state
            )));
        }
        Ok(RwLockReadGuard::map(inner, |inner| &inner.tree))
    }

    /// Root identity.
    pub fn root(&self) -> FsResult<NodeId> {
        self.tree()?
            .root()
            .ok_or_else(|| FsError::not_found("root directory"))
    }

    /// Synthesized filesystem statistics.
    pub fn statistics(&self) -> StatFs {
        let inner = self.inner.read();
        let blocks = SYNTHETIC_CAPACITY / u64::from(self.block_size.max(1));
        let total_nodes = inner.tree.len() as u64;
        let free_nodes = match inner.tree.max_nodes() {
            Some(max) => max.saturating_sub(total_nodes),
            None => u64::MAX,
        };
        StatFs {
            magic: self.magic,
            block_size: self.block_size,
            total_blocks: blocks,
            free_blocks: blocks,
            available_blocks: blocks,
            total_nodes,
            free_nodes,
            name_max: NAME_MAX as u32,
        }
    }

    /// Find a child of `parent` by name.
    pub fn lookup(&self, parent: NodeId, name: &str) -> FsResult<NodeId> {
        self.tree()?.lookup(parent, name)
    }

    /// Snapshot the entries of `dir` in insertion order.
    pub fn list_children(&self, dir: NodeId) -> FsResult<Vec<DirEntry>> {
        Ok(self.tree()?.list_children(dir)?.collect())
    }

    /// Metadata snapshot of a node.
    pub fn get(&self, id: NodeId) -> FsResult<NodeInfo> {
        self.tree()?.get(id)
    }

    /// Resolve a `/`-separated path from the root.
    pub fn resolve(&self, path: &str) -> FsResult<NodeId> {
        self.tree()?.resolve(path)
    }
}

impl FileReader for Superblock {
    fn file_content(&self, node: NodeId) -> FsResult<Arc<[u8]>> {
        self.tree()?.content(node)
    }
}
