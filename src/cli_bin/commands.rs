//! CLI command handlers that bridge CLI arguments to library operations

use crate::cli_bin::args::{AddArgs, EditArgs};
use log::{debug, info};
use quire::core::validate_target;
use quire::io::edit_and_refresh;
use quire::{
    Diagnostic, EditorSession, NewNodeRequest, NodeCreation, NodeCreationTransaction, NodeId,
    OutlineBinder, ProjectDir, Result, SystemClock, TransactionOutcome, UuidGenerator,
};
use serde::Serialize;
use std::path::Path;

/// Execute the init command
pub fn init_command(project: &ProjectDir) -> Result<()> {
    debug!("Executing init command in {}", project.root().display());

    if project.init_binder()? {
        info!("Created {}", project.binder_path().display());
    } else {
        info!("{} already exists", project.binder_path().display());
    }
    Ok(())
}

/// Execute the add command
pub fn add_command(project: ProjectDir, args: AddArgs) -> Result<()> {
    debug!("Executing add command with args: {:?}", args);

    let editor = EditorSession::from_config(project.config());
    let config = project.config().clone();
    let transaction =
        NodeCreationTransaction::new(project, OutlineBinder::new(), SystemClock, UuidGenerator)
            .with_limits(&config);

    let request = NewNodeRequest {
        parent: args.parent.clone(),
        target: args.target.clone(),
        title: args.title.clone(),
        synopsis: args.synopsis.clone(),
        position: args.position(),
        force: args.force,
    };

    let outcome = if !args.new {
        transaction.link(&request)
    } else if args.edit {
        transaction.run(&request, Some(&editor))
    } else {
        transaction.run(&request, None)
    };

    report(&outcome, args.json)?;
    outcome.into_result().map(|_| ())
}

/// Execute the edit command
pub fn edit_command(project: &ProjectDir, args: EditArgs) -> Result<()> {
    debug!("Executing edit command for {}", args.id);

    let id = validate_target(&args.id)?;
    let path = project.node_path(&id);
    if !path.is_file() {
        return Err(quire::QuireError::io(
            format!("opening {}", path.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such node"),
        ));
    }

    let editor = EditorSession::from_config(project.config());
    let header = edit_and_refresh(&editor, &path, &SystemClock)?;
    info!("Updated {} at {}", id, header.updated);
    Ok(())
}

/// Outcome of `add` as printed with `--json`
#[derive(Serialize)]
struct AddReport<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a Path>,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> AddReport<'a> {
    fn new(outcome: &'a TransactionOutcome) -> Self {
        let node = outcome.node();
        Self {
            status: outcome.status(),
            id: node.map(|n| &n.id),
            path: node.map(|n| n.path.as_path()),
            diagnostics: outcome.diagnostics(),
            error: outcome.error().map(ToString::to_string),
        }
    }
}

fn report(outcome: &TransactionOutcome, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(&AddReport::new(outcome)).map_err(|e| {
            quire::QuireError::io("rendering JSON output", std::io::Error::other(e))
        })?;
        println!("{}", rendered);
        return Ok(());
    }

    for diagnostic in outcome.diagnostics() {
        eprintln!("{}", diagnostic);
    }
    if let Some(node) = outcome.node() {
        println!("{}", node.path.display());
    }
    Ok(())
}
