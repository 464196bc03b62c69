//! Read dispatch for file content.
//!
//! Reads are positional: the caller passes the offset every time and gets the
//! advanced offset back. No cursor lives in the filesystem.

use std::sync::Arc;

use crate::error::FsResult;
use crate::types::NodeId;

/// Result of one positional read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Bytes read; empty at or past end of file.
    pub data: Vec<u8>,
    /// `offset + data.len()`.
    pub new_offset: u64,
}

impl ReadOutcome {
    /// Returns true if nothing was read (end of data).
    pub fn is_eof(&self) -> bool {
        self.data.is_empty()
    }
}

/// Serves bytes from the fixed content of file nodes.
pub trait FileReader {
    /// Shared handle to a file's content.
    ///
    /// Fails with `NotFound` for unknown nodes and `NotAFile` for directories.
    fn file_content(&self, node: NodeId) -> FsResult<Arc<[u8]>>;

    /// Read up to `max_len` bytes starting at `offset`.
    ///
    /// Returns `min(max_len, len - offset)` bytes, or none when `offset` is at
    /// or past the end of the content.
    fn read(&self, node: NodeId, offset: u64, max_len: usize) -> FsResult<ReadOutcome> {
        let content = self.file_content(node)?;
        let range = clamp(content.len(), offset, max_len);
        let mut data = Vec::new();
        data.try_reserve_exact(range.len())?;
        data.extend_from_slice(&content[range]);
        let new_offset = offset + data.len() as u64;
        Ok(ReadOutcome { data, new_offset })
    }

    /// Copy bytes starting at `offset` into `buf`, returning how many were copied.
    fn read_into(&self, node: NodeId, offset: u64, buf: &mut [u8]) -> FsResult<usize> {
        let content = self.file_content(node)?;
        let range = clamp(content.len(), offset, buf.len());
        let n = range.len();
        buf[..n].copy_from_slice(&content[range]);
        Ok(n)
    }

    /// Read the whole content.
    fn read_all(&self, node: NodeId) -> FsResult<Vec<u8>> {
        let content = self.file_content(node)?;
        let mut data = Vec::new();
        data.try_reserve_exact(content.len())?;
        data.extend_from_slice(&content);
        Ok(data)
    }
}

/// Byte range `[offset, offset + max_len)` clipped to `len`.
fn clamp(len: usize, offset: u64, max_len: usize) -> std::ops::Range<usize> {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(len);
    let end = start.saturating_add(max_len).min(len);
    start..end
}

impl FileReader for crate::tree::NodeTree {
    fn file_content(&self, node: NodeId) -> FsResult<Arc<[u8]>> {
        self.content(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FsError;
    use crate::tree::NodeTree;

    const TEXT: &[u8] = b"hello world";

    fn tree_with_file() -> (NodeTree, NodeId) {
        let mut tree = NodeTree::new();
        tree.create_root().unwrap();
        let id = tree.create_file(NodeId::ROOT, "test.txt", TEXT).unwrap();
        (tree, id)
    }

    #[test]
    fn test_read_whole() {
        let (tree, id) = tree_with_file();
        let out = tree.read(id, 0, 100).unwrap();
        assert_eq!(out.data, TEXT);
        assert_eq!(out.new_offset, TEXT.len() as u64);
    }

    #[test]
    fn test_partial_read() {
        let (tree, id) = tree_with_file();
        let out = tree.read(id, 6, 5).unwrap();
        assert_eq!(out.data, b"world");
        assert_eq!(out.new_offset, 11);

        let out = tree.read(id, 2, 3).unwrap();
        assert_eq!(out.data, b"llo");
        assert_eq!(out.new_offset, 5);
    }

    #[test]
    fn test_read_at_and_past_end() {
        let (tree, id) = tree_with_file();
        let len = TEXT.len() as u64;
        for offset in [len, len + 1, u64::MAX] {
            let out = tree.read(id, offset, 16).unwrap();
            assert!(out.is_eof());
            assert_eq!(out.new_offset, offset);
        }
    }

    #[test]
    fn test_read_length_formula() {
        let (tree, id) = tree_with_file();
        let len = TEXT.len() as u64;
        for offset in 0..=len + 2 {
            for max_len in 0..=len as usize + 2 {
                let out = tree.read(id, offset, max_len).unwrap();
                let expected = (max_len as u64).min(len.saturating_sub(offset));
                assert_eq!(out.data.len() as u64, expected, "offset {offset} max {max_len}");
            }
        }
    }

    #[test]
    fn test_sequential_reads_reassemble_content() {
        let (tree, id) = tree_with_file();
        let mut offset = 0;
        let mut collected = Vec::new();
        loop {
            let out = tree.read(id, offset, 4).unwrap();
            if out.is_eof() {
                break;
            }
            collected.extend_from_slice(&out.data);
            offset = out.new_offset;
        }
        assert_eq!(collected, TEXT);
    }

    #[test]
    fn test_read_into() {
        let (tree, id) = tree_with_file();
        let mut buf = [0u8; 8];
        assert_eq!(tree.read_into(id, 6, &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"world");
        assert_eq!(tree.read_into(id, 11, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_empty_file() {
        let mut tree = NodeTree::new();
        tree.create_root().unwrap();
        let id = tree.create_file(NodeId::ROOT, "empty", b"").unwrap();
        assert!(tree.read(id, 0, 10).unwrap().is_eof());
        assert!(tree.read_all(id).unwrap().is_empty());
    }

    #[test]
    fn test_read_errors() {
        let (tree, _) = tree_with_file();
        assert!(matches!(
            tree.read(NodeId::ROOT, 0, 10),
            Err(FsError::NotAFile(_))
        ));
        assert!(matches!(
            tree.read(NodeId::new(42), 0, 10),
            Err(FsError::NotFound(_))
        ));
    }
}
