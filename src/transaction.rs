//! Node creation transaction
//!
//! Creating a node touches two files that must stay consistent: the new node
//! file and the binder that references it. The steps run in a fixed order:
//!
//! 1. validate the request (no I/O)
//! 2. pick the node id (explicit target or generated)
//! 3. read the binder
//! 4. write the node file (header only, `created == updated`)
//! 5. ask the binder engine for the new binder bytes
//! 6. write the binder if it changed: this is the commit point
//! 7. optionally open an editor and refresh `updated`
//!
//! Any failure in steps 4-6 deletes the node file again, since nothing refers
//! to it yet. After step 6 the node belongs to the project: editor or refresh
//! failures are reported but never undo the commit.

use crate::binder::{BinderMutator, MutationParams, Position};
use crate::config::ProjectConfig;
use crate::core::diagnostic::{has_error, Diagnostic};
use crate::core::frontmatter::{self, Frontmatter};
use crate::core::ids::{IdGenerator, NodeId, TimeSource};
use crate::core::validate::{validate_target, validate_text_field};
use crate::error::{QuireError, Result};
use crate::io::editor::Editor;
use crate::io::refresh::edit_and_refresh;
use crate::io::store::NodeCreation;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::PathBuf;

/// What the caller wants created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNodeRequest {
    /// Parent selector in the binder; `None` is the root
    pub parent: Option<String>,
    /// Explicit node id; generated when `None`
    pub target: Option<String>,
    pub title: Option<String>,
    pub synopsis: Option<String>,
    pub position: Position,
    /// Passed through to the binder engine
    pub force: bool,
}

/// A node whose reference is in the binder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedNode {
    pub id: NodeId,
    pub path: PathBuf,
    /// Warnings from the binder engine
    pub diagnostics: Vec<Diagnostic>,
    /// False when the engine returned the binder unchanged
    pub binder_changed: bool,
    /// True once an editor session and refresh completed
    pub edited: bool,
}

/// How a transaction ended
#[derive(Debug)]
pub enum TransactionOutcome {
    /// Binder committed (and edit finished, if one was requested)
    Committed(CreatedNode),
    /// The request was invalid; nothing was read or written
    Rejected(QuireError),
    /// Failed before the binder was written; no node file remains unless the
    /// error is a [`QuireError::Rollback`]
    FailedPreCommit {
        error: QuireError,
        diagnostics: Vec<Diagnostic>,
    },
    /// The binder was committed but the editor or refresh failed. The node
    /// and its reference are kept.
    FailedPostCommit { node: CreatedNode, error: QuireError },
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// Whether the binder now references the node
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_) | Self::FailedPostCommit { .. })
    }

    pub fn node(&self) -> Option<&CreatedNode> {
        match self {
            Self::Committed(node) | Self::FailedPostCommit { node, .. } => Some(node),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QuireError> {
        match self {
            Self::Committed(_) => None,
            Self::Rejected(error)
            | Self::FailedPreCommit { error, .. }
            | Self::FailedPostCommit { error, .. } => Some(error),
        }
    }

    /// All diagnostics the binder engine reported
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Committed(node) | Self::FailedPostCommit { node, .. } => &node.diagnostics,
            Self::FailedPreCommit { diagnostics, .. } => diagnostics,
            Self::Rejected(_) => &[],
        }
    }

    /// Short machine-readable name of the outcome
    pub fn status(&self) -> &'static str {
        match self {
            Self::Committed(_) => "committed",
            Self::Rejected(_) => "rejected",
            Self::FailedPreCommit { .. } => "failed",
            Self::FailedPostCommit { .. } => "failed-after-commit",
        }
    }

    pub fn into_result(self) -> Result<CreatedNode> {
        match self {
            Self::Committed(node) => Ok(node),
            Self::Rejected(error)
            | Self::FailedPreCommit { error, .. }
            | Self::FailedPostCommit { error, .. } => Err(error),
        }
    }
}

/// Orchestrates node creation over a store with node-creation capability
pub struct NodeCreationTransaction<S, M> {
    store: S,
    mutator: M,
    clock: Box<dyn TimeSource>,
    ids: Box<dyn IdGenerator>,
    max_title_len: usize,
    max_synopsis_len: usize,
}

impl<S: NodeCreation, M: BinderMutator> NodeCreationTransaction<S, M> {
    pub fn new(
        store: S,
        mutator: M,
        clock: impl TimeSource + 'static,
        ids: impl IdGenerator + 'static,
    ) -> Self {
        let defaults = ProjectConfig::default();
        Self {
            store,
            mutator,
            clock: Box::new(clock),
            ids: Box::new(ids),
            max_title_len: defaults.max_title_len,
            max_synopsis_len: defaults.max_synopsis_len,
        }
    }

    /// Take the field length limits from `config`
    pub fn with_limits(mut self, config: &ProjectConfig) -> Self {
        self.max_title_len = config.max_title_len;
        self.max_synopsis_len = config.max_synopsis_len;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the transaction. `editor` is `Some` only when editing was
    /// requested.
    pub fn run(&self, request: &NewNodeRequest, editor: Option<&dyn Editor>) -> TransactionOutcome {
        let target = match self.validate(request) {
            Ok(target) => target,
            Err(error) => {
                debug!("Rejected request: {}", error);
                return TransactionOutcome::Rejected(error);
            }
        };

        let id = match target {
            Some(id) => id,
            None => match self.ids.generate() {
                Ok(id) => id,
                Err(error) => return pre_commit_failure(error, Vec::new()),
            },
        };
        debug!("Creating node {}", id);

        let binder = match self.store.read_binder() {
            Ok(binder) => binder,
            Err(error) => return pre_commit_failure(error.within("reading binder"), Vec::new()),
        };

        let header = Frontmatter::new(
            id.clone(),
            request.title.clone(),
            request.synopsis.clone(),
            self.clock.now(),
        );
        let content = match frontmatter::serialize(&header) {
            Ok(content) => content,
            Err(error) => return pre_commit_failure(error, Vec::new()),
        };

        let path = match self.store.create_node(&id, &content) {
            Ok(path) => path,
            Err(error) => {
                return pre_commit_failure(error.within("creating node file"), Vec::new())
            }
        };
        debug!("Wrote node file {}", path.display());

        let (binder_changed, diagnostics) = match self.commit_binder(&id, &binder, request) {
            Ok(committed) => committed,
            Err((error, diagnostics)) => {
                let error = self.rollback(&id, error);
                return pre_commit_failure(error, diagnostics);
            }
        };

        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }
        info!("Created node {} at {}", id, path.display());

        let node = CreatedNode {
            id,
            path,
            diagnostics,
            binder_changed,
            edited: false,
        };

        match editor {
            None => TransactionOutcome::Committed(node),
            Some(editor) => self.edit(node, editor),
        }
    }

    /// Reference an existing node file from the binder without creating one.
    ///
    /// Requires `request.target`. There is nothing to roll back: a failed
    /// binder write leaves both files as they were.
    pub fn link(&self, request: &NewNodeRequest) -> TransactionOutcome {
        let id = match self.validate(request) {
            Ok(Some(id)) => id,
            Ok(None) => {
                return TransactionOutcome::Rejected(QuireError::invalid_input(
                    "target",
                    "required when linking an existing node",
                ))
            }
            Err(error) => return TransactionOutcome::Rejected(error),
        };

        let path = self.store.node_path(&id);
        if !path.is_file() {
            let error = QuireError::io(
                format!("linking {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "node file does not exist"),
            );
            return pre_commit_failure(error, Vec::new());
        }

        let binder = match self.store.read_binder() {
            Ok(binder) => binder,
            Err(error) => return pre_commit_failure(error.within("reading binder"), Vec::new()),
        };

        match self.commit_binder(&id, &binder, request) {
            Ok((binder_changed, diagnostics)) => {
                for diagnostic in &diagnostics {
                    warn!("{}", diagnostic);
                }
                info!("Linked node {}", id);
                TransactionOutcome::Committed(CreatedNode {
                    id,
                    path,
                    diagnostics,
                    binder_changed,
                    edited: false,
                })
            }
            Err((error, diagnostics)) => pre_commit_failure(error, diagnostics),
        }
    }

    fn validate(&self, request: &NewNodeRequest) -> Result<Option<NodeId>> {
        if let Some(title) = &request.title {
            validate_text_field("title", title, self.max_title_len)?;
        }
        if let Some(synopsis) = &request.synopsis {
            validate_text_field("synopsis", synopsis, self.max_synopsis_len)?;
        }
        request.target.as_deref().map(validate_target).transpose()
    }

    /// Mutate and, if the bytes changed, write the binder. On failure returns
    /// the error with whatever diagnostics were produced.
    fn commit_binder(
        &self,
        id: &NodeId,
        binder: &[u8],
        request: &NewNodeRequest,
    ) -> std::result::Result<(bool, Vec<Diagnostic>), (QuireError, Vec<Diagnostic>)> {
        let params = MutationParams {
            parent: request.parent.clone(),
            target: id.filename(),
            title: request.title.clone().unwrap_or_default(),
            position: request.position.clone(),
            force: request.force,
        };

        let result = self
            .mutator
            .add_reference(binder, &params)
            .map_err(|e| (e.within("updating binder"), Vec::new()))?;

        if has_error(&result.diagnostics) {
            let error = QuireError::Diagnostic {
                diagnostics: result.diagnostics.clone(),
            };
            return Err((error, result.diagnostics));
        }

        if !result.changed {
            debug!("Binder unchanged, nothing to write");
            return Ok((false, result.diagnostics));
        }

        match self.store.write_binder(&result.bytes) {
            Ok(()) => Ok((true, result.diagnostics)),
            Err(e) => Err((e.within("writing binder"), result.diagnostics)),
        }
    }

    /// Delete the uncommitted node file, at most once
    fn rollback(&self, id: &NodeId, cause: QuireError) -> QuireError {
        warn!("Rolling back node {}: {}", id, cause);
        match self.store.remove_node(id) {
            Ok(()) => cause,
            Err(e) => QuireError::rollback(cause, e.within("removing node file")),
        }
    }

    fn edit(&self, mut node: CreatedNode, editor: &dyn Editor) -> TransactionOutcome {
        match edit_and_refresh(editor, &node.path, self.clock.as_ref()) {
            Ok(_) => {
                node.edited = true;
                TransactionOutcome::Committed(node)
            }
            Err(error) => {
                warn!("Node {} kept after failed edit: {}", node.id, error);
                TransactionOutcome::FailedPostCommit { node, error }
            }
        }
    }
}

fn pre_commit_failure(error: QuireError, diagnostics: Vec<Diagnostic>) -> TransactionOutcome {
    warn!("Node creation failed: {}", error);
    TransactionOutcome::FailedPreCommit { error, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{MutationResult, OutlineBinder};
    use crate::core::validate::validate_target;
    use crate::io::store::{BinderStore, ProjectDir};
    use chrono::{DateTime, TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn transaction(temp_dir: &TempDir) -> NodeCreationTransaction<ProjectDir, OutlineBinder> {
        NodeCreationTransaction::new(
            ProjectDir::open(temp_dir.path()),
            OutlineBinder::new(),
            t0,
            || validate_target("n1"),
        )
    }

    fn project_files(temp_dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_invalid_title_is_rejected_without_io() {
        let temp_dir = TempDir::new().unwrap();
        let request = NewNodeRequest {
            title: Some("Chapter\u{7}".to_string()),
            ..Default::default()
        };

        let outcome = transaction(&temp_dir).run(&request, None);

        assert_eq!(outcome.status(), "rejected");
        assert!(!outcome.is_committed());
        assert!(project_files(&temp_dir).is_empty());
    }

    #[test]
    fn test_title_limit_comes_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = ProjectConfig {
            max_title_len: 3,
            ..ProjectConfig::new(temp_dir.path())
        };
        let request = NewNodeRequest {
            title: Some("Four".to_string()),
            ..Default::default()
        };

        let outcome = transaction(&temp_dir).with_limits(&config).run(&request, None);
        assert!(matches!(
            outcome.error(),
            Some(QuireError::InvalidInput { field, .. }) if field == "title"
        ));
    }

    #[test]
    fn test_generation_failure_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let transaction = NodeCreationTransaction::new(
            ProjectDir::open(temp_dir.path()),
            OutlineBinder::new(),
            t0,
            || Err(QuireError::generation("entropy unavailable")),
        );

        let outcome = transaction.run(&NewNodeRequest::default(), None);

        assert_eq!(outcome.status(), "failed");
        assert!(matches!(outcome.error(), Some(QuireError::Generation { .. })));
        assert!(project_files(&temp_dir).is_empty());
    }

    #[test]
    fn test_explicit_target_skips_generator() {
        let temp_dir = TempDir::new().unwrap();
        let transaction = NodeCreationTransaction::new(
            ProjectDir::open(temp_dir.path()),
            OutlineBinder::new(),
            t0,
            || -> Result<NodeId> { panic!("generator must not run") },
        );
        let request = NewNodeRequest {
            target: Some("prologue.md".to_string()),
            ..Default::default()
        };

        let node = transaction.run(&request, None).into_result().unwrap();
        assert_eq!(node.id.as_str(), "prologue");
        assert!(temp_dir.path().join("prologue.md").is_file());
    }

    #[test]
    fn test_existing_node_file_is_not_removed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("n1.md"), "mine\n").unwrap();

        let outcome = transaction(&temp_dir).run(&NewNodeRequest::default(), None);

        let error = outcome.error().unwrap();
        assert!(matches!(error, QuireError::NodeExists { .. }));
        assert!(error.to_string().starts_with("creating node file: "));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("n1.md")).unwrap(),
            "mine\n"
        );
    }

    #[test]
    fn test_unchanged_binder_is_not_written() {
        let temp_dir = TempDir::new().unwrap();
        let keep = |binder: &[u8], _: &MutationParams| -> Result<MutationResult> {
            Ok(MutationResult::unchanged(binder, Vec::new()))
        };
        let transaction = NodeCreationTransaction::new(
            ProjectDir::open(temp_dir.path()),
            ClosureMutator(keep),
            t0,
            || validate_target("n1"),
        );

        let node = transaction
            .run(&NewNodeRequest::default(), None)
            .into_result()
            .unwrap();

        assert!(!node.binder_changed);
        assert!(!temp_dir.path().join("_binder.md").exists());
        assert!(node.path.is_file());
    }

    struct ClosureMutator<F>(F);

    impl<F> BinderMutator for ClosureMutator<F>
    where
        F: Fn(&[u8], &MutationParams) -> Result<MutationResult>,
    {
        fn add_reference(&self, binder: &[u8], params: &MutationParams) -> Result<MutationResult> {
            (self.0)(binder, params)
        }
    }

    #[test]
    fn test_link_existing_node() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("intro.md"), "---\n---\n").unwrap();
        let transaction = transaction(&temp_dir);
        let request = NewNodeRequest {
            target: Some("intro".to_string()),
            title: Some("Intro".to_string()),
            ..Default::default()
        };

        let node = transaction.link(&request).into_result().unwrap();

        assert_eq!(node.id.as_str(), "intro");
        assert_eq!(
            transaction.store().read_binder().unwrap(),
            b"- [Intro](intro.md)\n".to_vec()
        );
    }

    #[test]
    fn test_link_requires_existing_target() {
        let temp_dir = TempDir::new().unwrap();
        let transaction = transaction(&temp_dir);

        let outcome = transaction.link(&NewNodeRequest::default());
        assert_eq!(outcome.status(), "rejected");

        let request = NewNodeRequest {
            target: Some("ghost".to_string()),
            ..Default::default()
        };
        let outcome = transaction.link(&request);
        assert_eq!(outcome.status(), "failed");
        assert!(outcome.error().unwrap().is_not_found());
        assert!(project_files(&temp_dir).is_empty());
    }
}
