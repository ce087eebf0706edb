//! Browser tab control and workspace preparation.

mod types;
mod workspace;

pub use types::{TabController, TabError, TabInfo, Workflow};
pub use workspace::open_workspace;
