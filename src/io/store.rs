//! Project storage capabilities
//!
//! [`BinderStore`] is enough to read and rewrite the binder. Creating nodes
//! needs the wider [`NodeCreation`] capability; the transaction is generic
//! over it, so a store without node support cannot drive a transaction at
//! all.

use crate::config::ProjectConfig;
use crate::core::ids::NodeId;
use crate::error::Result;
use crate::io::fs::{read_limited, remove_file, write_atomic, write_atomic_new};
use log::debug;
use std::path::{Path, PathBuf};

/// Whole-file access to the binder
pub trait BinderStore {
    /// Current binder bytes; a binder that does not exist yet reads as empty
    fn read_binder(&self) -> Result<Vec<u8>>;

    /// Replace the binder atomically
    fn write_binder(&self, content: &[u8]) -> Result<()>;
}

/// Creation and removal of node files
pub trait NodeCreation: BinderStore {
    /// Where the node with `id` lives
    fn node_path(&self, id: &NodeId) -> PathBuf;

    /// Atomically create a new node file. Must fail rather than overwrite an
    /// existing file.
    fn create_node(&self, id: &NodeId, content: &[u8]) -> Result<PathBuf>;

    /// Delete a node file
    fn remove_node(&self, id: &NodeId) -> Result<()>;
}

/// A project directory on disk
#[derive(Debug, Clone)]
pub struct ProjectDir {
    config: ProjectConfig,
}

impl ProjectDir {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    /// Project rooted at `root` with default settings
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(ProjectConfig::new(root))
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        self.config.root()
    }

    pub fn binder_path(&self) -> PathBuf {
        self.config.binder_path()
    }

    pub fn node_exists(&self, id: &NodeId) -> bool {
        self.node_path(id).is_file()
    }

    /// Create an empty binder unless one exists. Returns whether a file was
    /// created.
    pub fn init_binder(&self) -> Result<bool> {
        let path = self.binder_path();
        if path.exists() {
            return Ok(false);
        }
        write_atomic_new(&path, b"")?;
        Ok(true)
    }
}

impl BinderStore for ProjectDir {
    fn read_binder(&self) -> Result<Vec<u8>> {
        let path = self.binder_path();
        match read_limited(&path, self.config.max_binder_size) {
            Err(e) if e.is_not_found() => {
                debug!("No binder at {}, starting empty", path.display());
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn write_binder(&self, content: &[u8]) -> Result<()> {
        write_atomic(&self.binder_path(), content)
    }
}

impl NodeCreation for ProjectDir {
    fn node_path(&self, id: &NodeId) -> PathBuf {
        self.config.root.join(id.filename())
    }

    fn create_node(&self, id: &NodeId, content: &[u8]) -> Result<PathBuf> {
        let path = self.node_path(id);
        write_atomic_new(&path, content)?;
        Ok(path)
    }

    fn remove_node(&self, id: &NodeId) -> Result<()> {
        remove_file(&self.node_path(id), "deleting")
    }
}
