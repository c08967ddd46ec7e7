//! Node identifiers and the clock / id-generator capabilities
//!
//! Both capabilities are passed into the transaction explicitly. Production
//! wiring uses [`SystemClock`] and [`UuidGenerator`]; tests hand in closures,
//! which implement the traits through blanket impls.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// File extension of node files
pub const NODE_EXTENSION: &str = "md";

/// Identifier of a node; also the stem of its file name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an already-validated id string.
    ///
    /// Use [`crate::core::validate::validate_target`] for user input.
    pub(crate) fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the node inside the project directory
    pub fn filename(&self) -> String {
        format!("{}.{}", self.0, NODE_EXTENSION)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of the current time
pub trait TimeSource {
    fn now(&self) -> DateTime<Utc>;
}

impl<F> TimeSource for F
where
    F: Fn() -> DateTime<Utc>,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of fresh node ids
pub trait IdGenerator {
    fn generate(&self) -> Result<NodeId>;
}

impl<F> IdGenerator for F
where
    F: Fn() -> Result<NodeId>,
{
    fn generate(&self) -> Result<NodeId> {
        self()
    }
}

/// Random (v4) UUID ids in hyphenated lowercase form
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Result<NodeId> {
        Ok(NodeId(uuid::Uuid::new_v4().hyphenated().to_string()))
    }
}
