//! Post-edit timestamp refresh
//!
//! After an editor session the node's `updated` stamp is bumped. The file is
//! always re-read from disk first: the editor may have rewritten the body, and
//! anything captured before it ran is stale.

use crate::core::frontmatter::{self, Frontmatter};
use crate::core::ids::TimeSource;
use crate::error::{QuireError, Result};
use crate::io::editor::Editor;
use crate::io::fs::write_atomic;
use log::debug;
use std::fs;
use std::path::Path;

/// Restamps `updated` on node files after they were edited
pub struct PostEditRefresher<'a> {
    clock: &'a dyn TimeSource,
}

impl<'a> PostEditRefresher<'a> {
    pub fn new(clock: &'a dyn TimeSource) -> Self {
        Self { clock }
    }

    /// Re-read `path`, set `updated` to now and write it back with the body
    /// bytes untouched.
    ///
    /// A read or parse failure performs no write, so the file stays exactly as
    /// the editor left it.
    pub fn refresh(&self, path: &Path) -> Result<Frontmatter> {
        let content =
            fs::read(path).map_err(|e| QuireError::io("reading node file after edit", e))?;

        let (mut header, body) =
            frontmatter::parse(&content).map_err(|e| e.within("parsing node file after edit"))?;

        header.touch(self.clock.now());
        debug!(
            "Refreshing {} (updated {}, body {} bytes)",
            path.display(),
            header.updated,
            body.len()
        );

        let mut refreshed = frontmatter::serialize(&header)?;
        refreshed.extend_from_slice(body);
        write_atomic(path, &refreshed).map_err(|e| e.within("writing node file after edit"))?;

        Ok(header)
    }
}

/// Let the user edit the node at `path`, then refresh its `updated` stamp.
///
/// Shared by node creation and plain editing. An editor failure skips the
/// refresh.
pub fn edit_and_refresh(
    editor: &dyn Editor,
    path: &Path,
    clock: &dyn TimeSource,
) -> Result<Frontmatter> {
    editor.open(path)?;
    PostEditRefresher::new(clock).refresh(path)
}
