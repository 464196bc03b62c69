//! Mount configuration.
//!
//! Every field has a default, so an empty TOML document (or
//! `MountConfig::default()`) mounts the stock filesystem: a root directory
//! holding `readme.txt`.
//!
//! ```toml
//! block_size = 4096
//! time_granularity_ns = 1
//! populate_readme = true
//! max_nodes = 1024
//!
//! [[files]]
//! path = "docs/hello.txt"
//! content = "hi\n"
//!
//! [[files]]
//! path = "bin/blob"
//! content = [0, 255, 254]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{FsError, FsResult};

/// Default block size reported to the host.
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

/// Content of a seeded file: text, or an array of byte values for
/// anything that is not UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl SeedContent {
    /// Raw bytes stored in the file.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SeedContent::Text(text) => text.as_bytes(),
            SeedContent::Bytes(bytes) => bytes,
        }
    }
}

impl Default for SeedContent {
    fn default() -> Self {
        SeedContent::Text(String::new())
    }
}

impl From<&str> for SeedContent {
    fn from(text: &str) -> Self {
        SeedContent::Text(text.to_owned())
    }
}

impl From<String> for SeedContent {
    fn from(text: String) -> Self {
        SeedContent::Text(text)
    }
}

impl From<Vec<u8>> for SeedContent {
    fn from(bytes: Vec<u8>) -> Self {
        SeedContent::Bytes(bytes)
    }
}

impl From<&[u8]> for SeedContent {
    fn from(bytes: &[u8]) -> Self {
        SeedContent::Bytes(bytes.to_vec())
    }
}

/// A fixed file created at mount time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFile {
    /// `/`-separated path below the root; missing directories are created.
    pub path: String,
    /// File content.
    #[serde(default)]
    pub content: SeedContent,
}

impl SeedFile {
    /// Create a seed entry.
    pub fn new(path: impl Into<String>, content: impl Into<SeedContent>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Options for one mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountConfig {
    /// Block size reported by `statistics()`.
    pub block_size: u32,
    /// Timestamp granularity in nanoseconds.
    pub time_granularity_ns: u64,
    /// Create the stock `readme.txt` at mount time.
    pub populate_readme: bool,
    /// Cap on live nodes; creation past it fails with `OutOfMemory`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<u64>,
    /// Extra fixed files, created in order after the readme.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<SeedFile>,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            time_granularity_ns: 1,
            populate_readme: true,
            max_nodes: None,
            files: Vec::new(),
        }
    }
}

impl MountConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> FsResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| FsError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> FsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FsError::config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> FsResult<()> {
        if self.block_size == 0 || !self.block_size.is_power_of_two() {
            return Err(FsError::config(format!(
                "block_size must be a non-zero power of two, got {}",
                self.block_size
            )));
        }
        if self.time_granularity_ns == 0 || self.time_granularity_ns > 1_000_000_000 {
            return Err(FsError::config(format!(
                "time_granularity_ns must be between 1 and 1000000000, got {}",
                self.time_granularity_ns
            )));
        }
        if self.max_nodes == Some(0) {
            return Err(FsError::config("max_nodes must leave room for the root"));
        }
        Ok(())
    }

    /// Timestamp granularity as a duration.
    pub fn time_granularity(&self) -> Duration {
        Duration::from_nanos(self.time_granularity_ns)
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Cap the number of live nodes.
    pub fn with_max_nodes(mut self, max: u64) -> Self {
        self.max_nodes = Some(max);
        self
    }

    /// Skip the stock readme.
    pub fn without_readme(mut self) -> Self {
        self.populate_readme = false;
        self
    }

    /// Add a fixed file.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<SeedContent>) -> Self {
        self.files.push(SeedFile::new(path, content));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = MountConfig::from_toml_str("").unwrap();
        assert_eq!(config, MountConfig::default());
        assert_eq!(config.block_size, 4096);
        assert!(config.populate_readme);
        assert_eq!(config.time_granularity(), Duration::from_nanos(1));
    }

    #[test]
    fn test_parse_files() {
        let config = MountConfig::from_toml_str(
            r#"
            block_size = 1024
            populate_readme = false
            max_nodes = 16

            [[files]]
            path = "docs/hello.txt"
            content = "hi\n"

            [[files]]
            path = "empty"
            "#,
        )
        .unwrap();
        assert_eq!(config.block_size, 1024);
        assert!(!config.populate_readme);
        assert_eq!(config.max_nodes, Some(16));
        assert_eq!(
            config.files,
            vec![SeedFile::new("docs/hello.txt", "hi\n"), SeedFile::new("empty", "")]
        );
    }

    #[test]
    fn test_parse_byte_content() {
        let config = MountConfig::from_toml_str(
            r#"
            [[files]]
            path = "bin/blob"
            content = [255, 0, 254]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.files[0].content,
            SeedContent::Bytes(vec![0xff, 0x00, 0xfe])
        );
        assert_eq!(config.files[0].content.as_bytes(), [0xff, 0x00, 0xfe]);

        assert!(matches!(
            MountConfig::from_toml_str("[[files]]\npath = \"x\"\ncontent = [256]"),
            Err(FsError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            MountConfig::from_toml_str("block_size = 1000"),
            Err(FsError::Config(_))
        ));
        assert!(matches!(
            MountConfig::from_toml_str("block_size = 0"),
            Err(FsError::Config(_))
        ));
        assert!(matches!(
            MountConfig::from_toml_str("time_granularity_ns = 0"),
            Err(FsError::Config(_))
        ));
        assert!(matches!(
            MountConfig::from_toml_str("max_nodes = 0"),
            Err(FsError::Config(_))
        ));
        assert!(matches!(
            MountConfig::from_toml_str("bogus = true"),
            Err(FsError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "block_size = 512").unwrap();
        let config = MountConfig::load(file.path()).unwrap();
        assert_eq!(config.block_size, 512);

        let missing = MountConfig::load("/nonexistent/smartfishfs.toml");
        assert!(matches!(missing, Err(FsError::Config(_))));
    }

    #[test]
    fn test_builder() {
        let config = MountConfig::default()
            .with_block_size(8192)
            .with_max_nodes(4)
            .without_readme()
            .with_file("a.txt", "a");
        assert_eq!(config.block_size, 8192);
        assert_eq!(config.max_nodes, Some(4));
        assert!(!config.populate_readme);
        assert_eq!(config.files.len(), 1);
        assert!(config.validate().is_ok());
    }
}
