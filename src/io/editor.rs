//! External editor sessions
//!
//! The editor is configured as one raw string, typically the value of
//! `$EDITOR`. It is split on whitespace: the first token is the program, the
//! rest are passed before the file path, so `code --wait` works.

use crate::config::{ProjectConfig, DEFAULT_EDITOR_VAR};
use crate::error::{QuireError, Result};
use log::{debug, info};
use std::path::Path;
use std::process::Command;

/// Something that lets the user edit a file and returns once they are done
pub trait Editor {
    fn open(&self, path: &Path) -> Result<()>;
}

impl<F> Editor for F
where
    F: Fn(&Path) -> Result<()>,
{
    fn open(&self, path: &Path) -> Result<()> {
        self(path)
    }
}

/// An editor launched as a blocking child process
#[derive(Debug, Clone)]
pub struct EditorSession {
    spec: String,
    var: String,
}

impl EditorSession {
    /// Session for a raw editor command string
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            var: DEFAULT_EDITOR_VAR.to_string(),
        }
    }

    /// Session using the editor variable named in `config`
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self {
            spec: config.editor_spec(),
            var: config.editor_var.clone(),
        }
    }

    /// False when the command string holds no tokens at all
    pub fn is_configured(&self) -> bool {
        self.spec.split_whitespace().next().is_some()
    }

    /// Build the command that opens `path`, without running it
    pub fn command(&self, path: &Path) -> Result<Command> {
        let mut tokens = self.spec.split_whitespace();
        let program = tokens.next().ok_or_else(|| QuireError::EditorNotConfigured {
            var: self.var.clone(),
        })?;

        let mut command = Command::new(program);
        command.args(tokens).arg(path);
        Ok(command)
    }
}

impl Editor for EditorSession {
    fn open(&self, path: &Path) -> Result<()> {
        let mut command = self.command(path)?;
        let program = command.get_program().to_string_lossy().to_string();
        info!("Opening {} in {}", path.display(), program);
        debug!("Editor command: {:?}", command);

        // inherits stdin/stdout/stderr and blocks until the editor exits
        let status = command
            .status()
            .map_err(|source| QuireError::EditorLaunch {
                program: program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(QuireError::EditorExit { program, status });
        }
        Ok(())
    }
}

/// Open `path` with the editor described by `spec` and wait for it to exit.
pub fn open(spec: &str, path: &Path) -> Result<()> {
    EditorSession::new(spec).open(path)
}
