//! Filesystem error types.

use std::collections::TryReserveError;
use std::io;
use thiserror::Error;

use crate::types::NodeId;

/// SmartfishFS error type.
#[derive(Debug, Error)]
pub enum FsError {
    /// Allocation failed (or the configured node cap was hit) while creating a node.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// Unknown node identity or name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a regular file.
    #[error("not a file: {0}")]
    NotAFile(String),

    /// A sibling with this name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Node name is empty or contains a path separator.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// Mount configuration could not be read or is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FsError {
    /// Create an OutOfMemory error.
    pub fn out_of_memory(what: impl Into<String>) -> Self {
        Self::OutOfMemory(what.into())
    }

    /// Create a NotFound error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// NotFound for a node identity.
    pub fn unknown_node(id: NodeId) -> Self {
        Self::NotFound(format!("node {id}"))
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(what: impl Into<String>) -> Self {
        Self::NotADirectory(what.into())
    }

    /// Create a NotAFile error.
    pub fn not_a_file(what: impl Into<String>) -> Self {
        Self::NotAFile(what.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    /// Create an InvalidName error.
    pub fn invalid_name(name: impl Into<String>) -> Self {
        Self::InvalidName(name.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true for `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

impl From<TryReserveError> for FsError {
    fn from(e: TryReserveError) -> Self {
        Self::OutOfMemory(e.to_string())
    }
}

impl From<indexmap::TryReserveError> for FsError {
    fn from(e: indexmap::TryReserveError) -> Self {
        Self::OutOfMemory(e.to_string())
    }
}

/// Convert FsError to std::io::Error for host layers that speak io errors.
impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        match e {
            FsError::OutOfMemory(msg) => io::Error::new(io::ErrorKind::OutOfMemory, msg),
            FsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            FsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            FsError::NotAFile(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            FsError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            FsError::InvalidName(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            FsError::Config(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
        }
    }
}

/// Filesystem result type.
pub type FsResult<T> = Result<T, FsError>;
