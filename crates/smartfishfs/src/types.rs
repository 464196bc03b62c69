//! Core filesystem types.
//!
//! Identities are plain integers mirroring inode numbers. Everything a caller
//! gets back from the tree is a snapshot, never a borrow into node storage,
//! so these types are `Clone` and serializable for whatever transport the
//! host layer speaks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Node identity, unique within one tree and never reused.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// The root directory of every tree.
    pub const ROOT: NodeId = NodeId(1);

    /// Wrap a raw identity.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer (inode number).
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns true if this is the root identity.
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<NodeId> for u64 {
    fn from(id: NodeId) -> u64 {
        id.0
    }
}

/// Node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Directory.
    Directory,
    /// Read-only regular file.
    File,
}

impl NodeKind {
    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, NodeKind::Directory)
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, NodeKind::File)
    }

    /// Permission bits every node of this kind is created with.
    pub fn default_perm(&self) -> u32 {
        match self {
            NodeKind::Directory => Mode::DIR_PERM,
            NodeKind::File => Mode::FILE_PERM,
        }
    }

    /// Link count a fresh node of this kind starts with.
    pub fn initial_links(&self) -> u32 {
        match self {
            NodeKind::Directory => 2, // . and the parent's entry
            NodeKind::File => 1,
        }
    }
}

/// File type plus rwx permission triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    /// Node kind.
    pub kind: NodeKind,
    /// Unix permissions (9 bits).
    pub perm: u32,
}

impl Mode {
    /// `S_IFDIR`.
    pub const S_IFDIR: u32 = 0o040000;
    /// `S_IFREG`.
    pub const S_IFREG: u32 = 0o100000;
    /// Directory permissions.
    pub const DIR_PERM: u32 = 0o755;
    /// File permissions.
    pub const FILE_PERM: u32 = 0o644;

    /// The fixed mode for a node kind.
    pub fn for_kind(kind: NodeKind) -> Self {
        Self {
            kind,
            perm: kind.default_perm(),
        }
    }

    /// Full `st_mode` value (type bits | permission bits).
    pub fn bits(&self) -> u32 {
        let type_bits = match self.kind {
            NodeKind::Directory => Self::S_IFDIR,
            NodeKind::File => Self::S_IFREG,
        };
        type_bits | (self.perm & 0o777)
    }
}

/// Creation, access and modification instants. Set once, never updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Creation time.
    pub ctime: SystemTime,
    /// Last access time.
    pub atime: SystemTime,
    /// Last modification time.
    pub mtime: SystemTime,
}

impl Timestamps {
    /// Stamp all three instants with `now`, truncated to `granularity`.
    pub fn now(granularity: Duration) -> Self {
        let now = truncate_time(SystemTime::now(), granularity);
        Self {
            ctime: now,
            atime: now,
            mtime: now,
        }
    }
}

/// Round a time down to a multiple of `granularity` since the epoch.
pub(crate) fn truncate_time(t: SystemTime, granularity: Duration) -> SystemTime {
    let gran = granularity.as_nanos();
    if gran <= 1 {
        return t;
    }
    match t.duration_since(UNIX_EPOCH) {
        Ok(since) => {
            let nanos = since.as_nanos() - since.as_nanos() % gran;
            let secs = (nanos / 1_000_000_000) as u64;
            let sub = (nanos % 1_000_000_000) as u32;
            UNIX_EPOCH + Duration::new(secs, sub)
        }
        // Pre-epoch clocks are left alone.
        Err(_) => t,
    }
}

/// Read-only snapshot of a node's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node identity.
    pub id: NodeId,
    /// Parent identity (`None` for root).
    pub parent: Option<NodeId>,
    /// Name under the parent (`None` for root).
    pub name: Option<String>,
    /// Type and permissions.
    pub mode: Mode,
    /// Number of hard links.
    pub nlink: u32,
    /// Content length in bytes (0 for directories).
    pub size: u64,
    /// Number of children (0 for files).
    pub children: usize,
    /// Creation/access/modification times.
    pub times: Timestamps,
}

impl NodeInfo {
    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.mode.kind
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.mode.kind.is_dir()
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.mode.kind.is_file()
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Child identity.
    pub id: NodeId,
    /// Entry type.
    pub kind: NodeKind,
}

/// Filesystem statistics, synthesized since nothing is block-mapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatFs {
    /// Filesystem type magic.
    pub magic: u64,
    /// Block size.
    pub block_size: u32,
    /// Total blocks.
    pub total_blocks: u64,
    /// Free blocks.
    pub free_blocks: u64,
    /// Available blocks (to non-root).
    pub available_blocks: u64,
    /// Live nodes.
    pub total_nodes: u64,
    /// Nodes that can still be created.
    pub free_nodes: u64,
    /// Maximum name length.
    pub name_max: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_bits() {
        assert_eq!(Mode::for_kind(NodeKind::Directory).bits(), 0o040755);
        assert_eq!(Mode::for_kind(NodeKind::File).bits(), 0o100644);
    }

    #[test]
    fn test_initial_links() {
        assert_eq!(NodeKind::Directory.initial_links(), 2);
        assert_eq!(NodeKind::File.initial_links(), 1);
    }

    #[test]
    fn test_node_id() {
        assert!(NodeId::ROOT.is_root());
        assert!(!NodeId::new(2).is_root());
        assert_eq!(NodeId::new(42).to_string(), "42");
        assert_eq!(format!("{:?}", NodeId::new(3)), "NodeId(3)");
        assert_eq!(serde_json::to_string(&NodeId::new(5)).unwrap(), "5");
    }

    #[test]
    fn test_truncate_time() {
        let t = UNIX_EPOCH + Duration::new(10, 123_456_789);
        assert_eq!(truncate_time(t, Duration::from_nanos(1)), t);
        assert_eq!(
            truncate_time(t, Duration::from_secs(1)),
            UNIX_EPOCH + Duration::from_secs(10)
        );
        assert_eq!(
            truncate_time(t, Duration::from_millis(100)),
            UNIX_EPOCH + Duration::new(10, 100_000_000)
        );
    }
}
