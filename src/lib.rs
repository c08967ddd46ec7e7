//! quire: binder and node files for long-form writing projects
//!
//! A project is a directory holding one outline file, the binder, and many
//! node files. Each node starts with a YAML header (`id`, optional `title`
//! and `synopsis`, `created`, `updated`) followed by free-form prose that the
//! library never interprets.
//!
//! The centre of the library is [`NodeCreationTransaction`]: it creates a node
//! file, links it into the binder, and rolls the node back if the binder
//! cannot be committed. After a commit it can hand the node to an external
//! editor and refresh the `updated` stamp without touching the prose.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use quire::{
//!     EditorSession, NewNodeRequest, NodeCreationTransaction, OutlineBinder, ProjectDir,
//!     SystemClock, UuidGenerator,
//! };
//!
//! let project = ProjectDir::open("my-novel");
//! let editor = EditorSession::from_config(project.config());
//! let transaction =
//!     NodeCreationTransaction::new(project, OutlineBinder::new(), SystemClock, UuidGenerator);
//!
//! let request = NewNodeRequest {
//!     title: Some("Chapter One".to_string()),
//!     ..Default::default()
//! };
//! let outcome = transaction.run(&request, Some(&editor));
//! if let Some(error) = outcome.error() {
//!     eprintln!("{}", error);
//! }
//! ```
//!
//! # Architecture
//!
//! - [`core`]: node header codec, ids, diagnostics, field validation
//! - [`binder`]: the binder mutation interface and the bundled outline engine
//! - [`io`]: atomic writes, project storage, editor sessions, post-edit refresh
//! - [`transaction`]: the node creation protocol
//! - [`config`]: per-project settings
//! - [`error`]: the error taxonomy

// Public API exports
pub use error::{QuireError, Result};

pub use binder::{BinderMutator, MutationParams, MutationResult, OutlineBinder, Position};
pub use config::ProjectConfig;
pub use core::{
    has_error, Diagnostic, Frontmatter, IdGenerator, NodeFile, NodeId, Severity, SystemClock,
    TimeSource, UuidGenerator,
};
pub use io::{BinderStore, Editor, EditorSession, NodeCreation, PostEditRefresher, ProjectDir};
pub use transaction::{CreatedNode, NewNodeRequest, NodeCreationTransaction, TransactionOutcome};

pub mod binder;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod transaction;

// CLI components live in the binary only
