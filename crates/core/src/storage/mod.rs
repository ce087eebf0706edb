//! Durable state.
//!
//! [`KeyValueStore`] is the opaque get/set/remove surface; [`StateStore`]
//! layers the versioned records on top of it.

mod schema;
mod sqlite;
mod state;
mod store;

pub use schema::{
    keys, PersistedProgress, SearchState, SearchStatus, StoppedBy, PROGRESS_VERSION,
    SEARCH_STATE_VERSION,
};
pub use sqlite::SqliteStore;
pub use state::StateStore;
pub use store::{KeyValueStore, MemoryStore, StoreError};
