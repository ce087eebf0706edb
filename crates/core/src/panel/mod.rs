//! Control panel message contracts and event fan-out.

mod broadcaster;
mod messages;

pub use broadcaster::PanelBroadcaster;
pub use messages::{PanelCommand, PanelEvent, PanelReply};
