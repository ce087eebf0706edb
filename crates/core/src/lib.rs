pub mod config;
pub mod coordinator;
pub mod criteria;
pub mod engine;
pub mod executor;
pub mod metrics;
pub mod panel;
pub mod storage;
pub mod tabs;
pub mod testing;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use coordinator::{CoordinatorError, CoordinatorStatus, SessionCoordinator, SessionPhase};
pub use criteria::{CriteriaError, SearchCriteria, SearchMode};
pub use engine::{EngineConfig, EngineError, ProgressReporter, PurchaseOutcome, SearchResult};
pub use executor::{
    ExecutorClient, ExecutorCommand, ExecutorError, ExecutorEvent, ExecutorReply, PageExecutor,
    TabId,
};
pub use panel::{PanelBroadcaster, PanelCommand, PanelEvent, PanelReply};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StateStore, StoreError};
pub use tabs::{TabController, TabError, TabInfo, Workflow};
pub use ticket::{Ticket, UserData};
