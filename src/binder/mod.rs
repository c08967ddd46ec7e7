//! Binder mutation interface
//!
//! The transaction never edits the binder itself. It hands the current binder
//! bytes and a [`MutationParams`] to a [`BinderMutator`] and gets back new
//! bytes plus diagnostics. Implementations must be pure: the returned value is
//! their only effect.

pub mod outline;

pub use outline::OutlineBinder;

use crate::core::diagnostic::{has_error, Diagnostic};
use crate::error::Result;

/// Where a new reference goes among the parent's children
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Position {
    /// After the last child
    #[default]
    Last,
    /// Before the first child
    First,
    /// At a zero-based child index
    At(usize),
    /// Immediately before the child selected by id or filename
    Before(String),
    /// Immediately after the child selected by id or filename
    After(String),
}

/// Parameters of one "add a reference" mutation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationParams {
    /// Parent node selector; `None` (or `.`) is the binder root
    pub parent: Option<String>,
    /// File name the new reference points to
    pub target: String,
    /// Link text; empty means "use the target"
    pub title: String,
    pub position: Position,
    /// Downgrade "already referenced" from an error to a warning
    pub force: bool,
}

/// Outcome of a binder mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResult {
    pub bytes: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
    /// Whether `bytes` differ from the input
    pub changed: bool,
}

impl MutationResult {
    pub fn new(original: &[u8], bytes: Vec<u8>, diagnostics: Vec<Diagnostic>) -> Self {
        let changed = bytes != original;
        Self {
            bytes,
            diagnostics,
            changed,
        }
    }

    /// Result that leaves the binder as it was
    pub fn unchanged(original: &[u8], diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            bytes: original.to_vec(),
            diagnostics,
            changed: false,
        }
    }

    pub fn has_error(&self) -> bool {
        has_error(&self.diagnostics)
    }
}

/// Applies a change to binder bytes
pub trait BinderMutator {
    fn add_reference(&self, binder: &[u8], params: &MutationParams) -> Result<MutationResult>;
}

impl<M: BinderMutator + ?Sized> BinderMutator for &M {
    fn add_reference(&self, binder: &[u8], params: &MutationParams) -> Result<MutationResult> {
        (**self).add_reference(binder, params)
    }
}
