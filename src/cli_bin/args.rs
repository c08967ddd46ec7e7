//! Command-line argument definitions and parsing

use clap::{ArgGroup, Args, Parser, Subcommand};
use quire::Position;
use std::path::PathBuf;

/// Main CLI application
#[derive(Parser)]
#[command(
    name = "quire",
    version,
    about = "Manage the binder and node files of a long-form writing project",
    long_about = "quire keeps a writing project's outline (the binder) and its node files \
                  consistent: new nodes are linked into the binder in one step, and a node \
                  whose binder update fails is removed again."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory
    #[arg(short = 'C', long = "project", global = true, default_value = ".")]
    pub project: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty binder if the project has none
    Init,
    /// Add a node reference to the binder, creating the node with --new
    Add(AddArgs),
    /// Open an existing node in $EDITOR and refresh its timestamp
    Edit(EditArgs),
}

/// Arguments for the add command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("position").args(["first", "at", "before", "after"])))]
pub struct AddArgs {
    /// Parent node id or file name; the binder root when omitted
    pub parent: Option<String>,

    /// Create a new node file instead of linking an existing one
    #[arg(long)]
    pub new: bool,

    /// Open the new node in $EDITOR once it is linked
    #[arg(long, requires = "new")]
    pub edit: bool,

    /// Node title, also used as the binder link text
    #[arg(long)]
    pub title: Option<String>,

    /// Short synopsis stored in the node header
    #[arg(long, requires = "new")]
    pub synopsis: Option<String>,

    /// Node id (file name without .md); generated for new nodes when omitted
    #[arg(long, value_name = "ID")]
    pub target: Option<String>,

    /// Add the reference even if the binder already has one
    #[arg(long)]
    pub force: bool,

    /// Insert before the parent's first child
    #[arg(long)]
    pub first: bool,

    /// Insert at this zero-based index among the parent's children
    #[arg(long, value_name = "INDEX")]
    pub at: Option<usize>,

    /// Insert before this sibling
    #[arg(long, value_name = "SIBLING")]
    pub before: Option<String>,

    /// Insert after this sibling
    #[arg(long, value_name = "SIBLING")]
    pub after: Option<String>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl AddArgs {
    /// The requested insertion position; the flags are mutually exclusive
    pub fn position(&self) -> Position {
        if self.first {
            Position::First
        } else if let Some(index) = self.at {
            Position::At(index)
        } else if let Some(sibling) = &self.before {
            Position::Before(sibling.clone())
        } else if let Some(sibling) = &self.after {
            Position::After(sibling.clone())
        } else {
            Position::Last
        }
    }
}

/// Arguments for the edit command
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Node id or file name
    pub id: String,
}
