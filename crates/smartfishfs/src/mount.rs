//! Mount lifecycle.
//!
//! ```text
//! Unmounted -> Mounting -> Mounted -> Unmounting -> Unmounted
//! ```
//!
//! A superblock is only handed to the caller once it reaches `Mounted`, i.e.
//! after the root and the fixed entries exist. Unmount releases every node,
//! after which all identities from that superblock fail with `NotFound`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::Display;
use tracing::{info, warn};

use crate::config::{MountConfig, SeedFile};
use crate::error::{FsError, FsResult};
use crate::registry::FsType;
use crate::superblock::Superblock;
use crate::tree::NodeTree;
use crate::types::NodeId;

/// Filesystem type name.
pub const FS_NAME: &str = "smartfishfs";

/// Name of the file every default mount starts with.
pub const README_NAME: &str = "readme.txt";

/// Content of [`README_NAME`].
pub const README_CONTENT: &[u8] = b"Congratulations! You are reading data from SmartfishFS RAM!\n";

/// Lifecycle state of one superblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum MountState {
    /// Not mounted (before mount, and again after unmount).
    Unmounted,
    /// Root and fixed entries are being created.
    Mounting,
    /// Live; the host may look up, list and read.
    Mounted,
    /// Nodes are being released.
    Unmounting,
}

/// The SmartfishFS filesystem type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartfishFs;

impl SmartfishFs {
    /// Create the filesystem type.
    pub fn new() -> Self {
        Self
    }

    /// Build a superblock, create the root and the fixed entries.
    ///
    /// On any failure the half-built superblock is dropped and nothing is
    /// returned, so no node ever becomes reachable.
    pub fn mount(&self, config: &MountConfig) -> FsResult<Arc<Superblock>> {
        config.validate()?;

        let sb = Superblock::from_config(config);
        {
            let mut inner = sb.write_inner();
            inner.state = MountState::Mounting;

            if let Err(e) = populate(&mut inner.tree, config) {
                warn!(error = %e, "mount failed, discarding superblock");
                inner.tree.release();
                inner.state = MountState::Unmounted;
                return Err(e);
            }

            inner.state = MountState::Mounted;
            info!(
                fs = FS_NAME,
                magic = sb.magic(),
                block_size = sb.block_size(),
                nodes = inner.tree.len(),
                "mounted"
            );
        }
        Ok(Arc::new(sb))
    }

    /// Release the superblock and every node it owns.
    ///
    /// Never fails. Unmounting something that is not mounted is logged and
    /// otherwise ignored.
    pub fn unmount(&self, sb: &Superblock) {
        let mut inner = sb.write_inner();
        if inner.state != MountState::Mounted {
            warn!(
                fs = FS_NAME,
                state = %inner.state,
                "unmount of a superblock that is not mounted"
            );
            return;
        }

        inner.state = MountState::Unmounting;
        let released = inner.tree.release();
        inner.state = MountState::Unmounted;
        info!(fs = FS_NAME, released, "unmounted");
    }
}

impl FsType for SmartfishFs {
    fn name(&self) -> &'static str {
        FS_NAME
    }

    fn mount(&self, config: &MountConfig) -> FsResult<Arc<Superblock>> {
        SmartfishFs::mount(self, config)
    }

    fn unmount(&self, sb: &Superblock) {
        SmartfishFs::unmount(self, sb)
    }
}

/// Mount a SmartfishFS instance.
pub fn mount(config: &MountConfig) -> FsResult<Arc<Superblock>> {
    SmartfishFs.mount(config)
}

/// Unmount a SmartfishFS instance.
pub fn unmount(sb: &Superblock) {
    SmartfishFs.unmount(sb)
}

/// Create the root, the readme and the configured fixed files.
fn populate(tree: &mut NodeTree, config: &MountConfig) -> FsResult<()> {
    let root = tree.create_root()?;
    if config.populate_readme {
        tree.create_file(root, README_NAME, README_CONTENT)?;
    }
    for seed in &config.files {
        seed_file(tree, root, seed)?;
    }
    Ok(())
}

/// Create `seed.path` below `root`, making missing directories on the way.
fn seed_file(tree: &mut NodeTree, root: NodeId, seed: &SeedFile) -> FsResult<NodeId> {
    let components: Vec<&str> = seed
        .path
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect();
    let Some((file_name, dirs)) = components.split_last() else {
        return Err(FsError::invalid_name(seed.path.as_str()));
    };

    let mut current = root;
    for dir in dirs {
        current = match tree.lookup(current, dir) {
            Ok(id) => id,
            Err(FsError::NotFound(_)) => tree.create_dir(current, dir)?,
            Err(e) => return Err(e),
        };
    }
    tree.create_file(current, file_name, seed.content.as_bytes())
}
