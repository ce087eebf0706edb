pub mod bridge;
pub mod handlers;
pub mod middleware;
pub mod panel;
pub mod routes;
pub mod ws;

pub use bridge::{run_event_pump, BridgeEvent, BridgeFrame, BridgeHub, BridgeRequest};
pub use routes::create_router;
