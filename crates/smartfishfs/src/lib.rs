//! # smartfishfs
//!
//! A minimal read-only in-memory filesystem core.
//!
//! Key components:
//!
//! - [`NodeTree`] - Owns every node, hands out integer identities (root = 1)
//! - [`Superblock`] - One mount instance: a tree behind a reader/writer lock
//! - [`SmartfishFs`] - Mount/unmount lifecycle and initial population
//! - [`FileReader`] - Positional reads over fixed file content
//! - [`FsRegistry`] - Caller-owned filesystem type registration
//!
//! ## Design Decisions
//!
//! - **Identities, not paths**: callers hold [`NodeId`]s, which stay valid
//!   for the life of the mount and are never reused.
//! - **Explicit offset/size**: reads carry their own offset; there is no
//!   cursor state in the filesystem.
//! - **Atomic creation**: node creation and mount are all-or-nothing.
//! - **Host layer is external**: translating OS calls into these operations
//!   is somebody else's job.
//!
//! ```
//! use smartfishfs::{FileReader, MountConfig, NodeId, mount, unmount};
//!
//! let sb = mount(&MountConfig::default()).unwrap();
//! let readme = sb.lookup(NodeId::ROOT, "readme.txt").unwrap();
//! let out = sb.read(readme, 0, 1024).unwrap();
//! assert!(out.data.starts_with(b"Congratulations!"));
//! unmount(&sb);
//! assert!(sb.get(readme).is_err());
//! ```

pub mod config;
mod error;
pub mod mount;
mod reader;
pub mod registry;
mod superblock;
mod tree;
mod types;

pub use config::{MountConfig, SeedContent, SeedFile};
pub use error::{FsError, FsResult};
pub use mount::{FS_NAME, MountState, README_CONTENT, README_NAME, SmartfishFs, mount, unmount};
pub use reader::{FileReader, ReadOutcome};
pub use registry::{FsRegistry, FsType};
pub use superblock::{SMARTFISHFS_MAGIC, Superblock};
pub use tree::{Children, NAME_MAX, NodeTree};
pub use types::{DirEntry, Mode, NodeId, NodeInfo, NodeKind, StatFs, Timestamps};
