//! Input validation for node creation
//!
//! Everything here runs before the transaction touches the filesystem, so a
//! rejected request never leaves anything behind.

use crate::core::ids::{NodeId, NODE_EXTENSION};
use crate::error::{QuireError, Result};

/// Longest accepted explicit target id
pub const MAX_TARGET_LEN: usize = 128;

/// Validate a free-text header field such as a title or synopsis.
///
/// The length is counted in characters. Control characters (including
/// newlines and tabs) are rejected since the value lands on a single header
/// line and in the binder's link text.
pub fn validate_text_field(field: &str, value: &str, max_len: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max_len {
        return Err(QuireError::invalid_input(
            field,
            format!("{} characters exceeds the limit of {}", len, max_len),
        ));
    }

    if let Some(c) = value.chars().find(|c| c.is_control()) {
        return Err(QuireError::invalid_input(
            field,
            format!("contains control character {:?}", c),
        ));
    }

    Ok(())
}

/// Validate an explicit node target and turn it into a [`NodeId`].
///
/// Accepts `id` or `id.md`; the id must be non-empty ASCII alphanumerics,
/// `-` or `_`, so it can never name a path outside the project directory.
pub fn validate_target(target: &str) -> Result<NodeId> {
    let id = target
        .strip_suffix(&format!(".{}", NODE_EXTENSION))
        .unwrap_or(target);

    if id.is_empty() {
        return Err(QuireError::invalid_input("target", "must not be empty"));
    }

    if id.len() > MAX_TARGET_LEN {
        return Err(QuireError::invalid_input(
            "target",
            format!("longer than {} characters", MAX_TARGET_LEN),
        ));
    }

    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(QuireError::invalid_input(
            "target",
            format!("{:?} contains disallowed character {:?}", target, c),
        ));
    }

    Ok(NodeId::new_unchecked(id))
}
