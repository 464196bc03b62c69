//! Node tree: allocation, identity and parent/child linkage.
//!
//! The tree exclusively owns every node of one filesystem instance. Callers
//! only ever hold [`NodeId`]s; all reads hand back snapshots.
//!
//! Identities are handed out by a monotonic counter: the root is always `1`,
//! every later node gets the next integer, and nothing is reused even after
//! [`NodeTree::release`] drops the nodes.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{FsError, FsResult};
use crate::types::{DirEntry, Mode, NodeId, NodeInfo, NodeKind, Timestamps};

/// Longest name a directory entry may carry.
pub const NAME_MAX: usize = 255;

/// Kind-specific payload of a node.
#[derive(Debug)]
enum Body {
    Directory {
        children: IndexMap<String, NodeId>,
    },
    File {
        content: Arc<[u8]>,
    },
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    name: Option<String>,
    mode: Mode,
    nlink: u32,
    times: Timestamps,
    body: Body,
}

impl Node {
    fn kind(&self) -> NodeKind {
        self.mode.kind
    }

    fn children(&self) -> Option<&IndexMap<String, NodeId>> {
        match &self.body {
            Body::Directory { children } => Some(children),
            Body::File { .. } => None,
        }
    }

    fn info(&self, id: NodeId) -> NodeInfo {
        let (size, children) = match &self.body {
            Body::Directory { children } => (0, children.len()),
            Body::File { content } => (content.len() as u64, 0),
        };
        NodeInfo {
            id,
            parent: self.parent,
            name: self.name.clone(),
            mode: self.mode,
            nlink: self.nlink,
            size,
            children,
            times: self.times,
        }
    }
}

/// Owner of all nodes of one filesystem instance.
#[derive(Debug)]
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    granularity: Duration,
    max_nodes: Option<u64>,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Create an empty tree (no root yet).
    pub fn new() -> Self {
        Self::with_limits(Duration::from_nanos(1), None)
    }

    /// Create an empty tree with a timestamp granularity and an optional node cap.
    ///
    /// Creating a node past `max_nodes` fails with `OutOfMemory`, the same
    /// way a real allocation failure would.
    pub fn with_limits(granularity: Duration, max_nodes: Option<u64>) -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: NodeId::ROOT.get(),
            granularity,
            max_nodes,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Configured node cap, if any.
    pub fn max_nodes(&self) -> Option<u64> {
        self.max_nodes
    }

    /// The root identity, if the root has been created and not released.
    pub fn root(&self) -> Option<NodeId> {
        self.nodes.contains_key(&NodeId::ROOT).then_some(NodeId::ROOT)
    }

    /// Allocate the next identity without publishing anything.
    fn peek_id(&self) -> NodeId {
        NodeId::new(self.next_id)
    }

    fn check_capacity(&mut self) -> FsResult<()> {
        if let Some(max) = self.max_nodes {
            if self.nodes.len() as u64 >= max {
                return Err(FsError::out_of_memory(format!("node limit of {max} reached")));
            }
        }
        self.nodes.try_reserve(1)?;
        Ok(())
    }

    fn node(&self, id: NodeId) -> FsResult<&Node> {
        self.nodes.get(&id).ok_or_else(|| FsError::unknown_node(id))
    }

    fn dir_children(&self, id: NodeId) -> FsResult<&IndexMap<String, NodeId>> {
        self.node(id)?
            .children()
            .ok_or_else(|| FsError::not_a_directory(format!("node {id}")))
    }

    /// Create the root directory (`id = 1`, `nlink = 2`, no parent).
    ///
    /// May only be called once per tree; a second call fails with
    /// `AlreadyExists`.
    pub fn create_root(&mut self) -> FsResult<NodeId> {
        if self.next_id != NodeId::ROOT.get() {
            return Err(FsError::already_exists("root directory"));
        }
        self.check_capacity()?;

        let id = self.peek_id();
        self.nodes.insert(
            id,
            Node {
                parent: None,
                name: None,
                mode: Mode::for_kind(NodeKind::Directory),
                nlink: NodeKind::Directory.initial_links(),
                times: Timestamps::now(self.granularity),
                body: Body::Directory {
                    children: IndexMap::new(),
                },
            },
        );
        self.next_id += 1;
        debug!(%id, "created root directory");
        Ok(id)
    }

    /// Create a node under `parent`.
    ///
    /// `content` becomes the immutable data of a file and is ignored for
    /// directories. Every fallible step runs before the tree is touched, so
    /// on error nothing has been linked or allocated from the caller's view.
    pub fn create_child(
        &mut self,
        parent: NodeId,
        name: &str,
        kind: NodeKind,
        content: &[u8],
    ) -> FsResult<NodeId> {
        validate_name(name)?;

        let siblings = self.dir_children(parent)?;
        if siblings.contains_key(name) {
            return Err(FsError::already_exists(name));
        }

        self.check_capacity()?;

        let mut owned_name = String::new();
        owned_name.try_reserve_exact(name.len())?;
        owned_name.push_str(name);

        let body = match kind {
            NodeKind::Directory => Body::Directory {
                children: IndexMap::new(),
            },
            NodeKind::File => {
                let mut data = Vec::new();
                data.try_reserve_exact(content.len())?;
                data.extend_from_slice(content);
                Body::File {
                    content: Arc::from(data),
                }
            }
        };

        let id = self.peek_id();
        let granularity = self.granularity;
        let Some(Body::Directory { children }) = self.nodes.get_mut(&parent).map(|n| &mut n.body)
        else {
            return Err(FsError::not_a_directory(format!("node {parent}")));
        };
        children.try_reserve(1)?;
        children.insert(owned_name.clone(), id);

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            if kind.is_dir() {
                // The child's ".." entry links back to the parent.
                parent_node.nlink += 1;
            }
        }

        self.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                name: Some(owned_name),
                mode: Mode::for_kind(kind),
                nlink: kind.initial_links(),
                times: Timestamps::now(granularity),
                body,
            },
        );
        self.next_id += 1;

        debug!(%parent, %id, entry = name, ?kind, size = content.len(), "created node");
        Ok(id)
    }

    /// Create a subdirectory.
    pub fn create_dir(&mut self, parent: NodeId, name: &str) -> FsResult<NodeId> {
        self.create_child(parent, name, NodeKind::Directory, &[])
    }

    /// Create a read-only file with fixed content.
    pub fn create_file(&mut self, parent: NodeId, name: &str, content: &[u8]) -> FsResult<NodeId> {
        self.create_child(parent, name, NodeKind::File, content)
    }

    /// Find a child of `parent` by name.
    pub fn lookup(&self, parent: NodeId, name: &str) -> FsResult<NodeId> {
        self.dir_children(parent)?
            .get(name)
            .copied()
            .ok_or_else(|| FsError::not_found(format!("{name} in node {parent}")))
    }

    /// Iterate over the entries of `dir` in insertion order.
    ///
    /// The iterator is lazy and `Clone`; cloning it (or calling this again)
    /// restarts the listing.
    pub fn list_children(&self, dir: NodeId) -> FsResult<Children<'_>> {
        let children = self.dir_children(dir)?;
        Ok(Children {
            inner: children.iter(),
            tree: self,
        })
    }

    /// Metadata snapshot of a node.
    pub fn get(&self, id: NodeId) -> FsResult<NodeInfo> {
        self.node(id).map(|n| n.info(id))
    }

    /// Shared handle to a file's content.
    pub fn content(&self, id: NodeId) -> FsResult<Arc<[u8]>> {
        match &self.node(id)?.body {
            Body::File { content } => Ok(Arc::clone(content)),
            Body::Directory { .. } => Err(FsError::not_a_file(format!("node {id}"))),
        }
    }

    /// Resolve a `/`-separated path from the root.
    ///
    /// Empty and `.` components are skipped; `..` moves to the parent
    /// (staying put at the root).
    pub fn resolve(&self, path: &str) -> FsResult<NodeId> {
        let mut current = self
            .root()
            .ok_or_else(|| FsError::not_found("root directory"))?;
        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    current = self.node(current)?.parent.unwrap_or(current);
                }
                name => current = self.lookup(current, name)?,
            }
        }
        Ok(current)
    }

    /// Drop every node. Identities handed out so far stay retired.
    pub fn release(&mut self) -> usize {
        let dropped = self.nodes.len();
        self.nodes = HashMap::new();
        dropped
    }
}

/// Reject names that could not appear as a single directory entry.
fn validate_name(name: &str) -> FsResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(FsError::invalid_name(name));
    }
    if name.len() > NAME_MAX {
        return Err(FsError::invalid_name(format!(
            "{}... ({} bytes, max {NAME_MAX})",
            name.chars().take(16).collect::<String>(),
            name.len()
        )));
    }
    Ok(())
}

/// Lazy listing of one directory, see [`NodeTree::list_children`].
#[derive(Clone)]
pub struct Children<'a> {
    inner: indexmap::map::Iter<'a, String, NodeId>,
    tree: &'a NodeTree,
}

impl Iterator for Children<'_> {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        // Nodes only go away all together in `release`, so every child id
        // names a live node.
        loop {
            let (name, id) = self.inner.next()?;
            match self.tree.nodes.get(id) {
                Some(node) => {
                    return Some(DirEntry {
                        name: name.clone(),
                        id: *id,
                        kind: node.kind(),
                    });
                }
                None => debug_assert!(false, "entry {name:?} points at missing node {id}"),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Children<'_> {}

impl std::fmt::Debug for Children<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Children")
            .field("remaining", &self.inner.len())
            .finish()
    }
}
