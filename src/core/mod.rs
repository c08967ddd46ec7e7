//! Core types for node files and binder changes
//!
//! - Frontmatter / NodeFile: the header codec of a node file
//! - Diagnostic: findings reported by the binder engine
//! - NodeId plus the clock and id-generator capabilities
//! - Validation of user-supplied fields

pub mod diagnostic;
pub mod frontmatter;
pub mod ids;
pub mod validate;

pub use diagnostic::{has_error, Diagnostic, Severity};
pub use frontmatter::{Frontmatter, NodeFile};
pub use ids::{IdGenerator, NodeId, SystemClock, TimeSource, UuidGenerator};
pub use validate::{validate_target, validate_text_field};
