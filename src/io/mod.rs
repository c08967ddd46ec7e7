pub mod editor;
pub mod fs;
pub mod refresh;
pub mod store;

pub use editor::{Editor, EditorSession};
pub use fs::{read_limited, write_atomic, write_atomic_new, MAX_BINDER_SIZE};
pub use refresh::{edit_and_refresh, PostEditRefresher};
pub use store::{BinderStore, NodeCreation, ProjectDir};
