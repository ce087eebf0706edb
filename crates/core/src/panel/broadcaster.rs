//! Best-effort fan-out of panel events.

use tokio::sync::broadcast;

use crate::executor::TabId;
use crate::ticket::Ticket;

use super::messages::PanelEvent;

/// Broadcaster for panel events using a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct PanelBroadcaster {
    sender: broadcast::Sender<PanelEvent>,
}

impl PanelBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast an event to all connected panels.
    pub fn broadcast(&self, event: PanelEvent) {
        // No receivers just means no panel is open.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.sender.subscribe()
    }

    pub fn status(&self, status: impl Into<String>) {
        self.broadcast(PanelEvent::SearchStatus {
            status: status.into(),
        });
    }

    pub fn error(&self, tab_id: Option<TabId>, error: impl Into<String>) {
        self.broadcast(PanelEvent::Error {
            tab_id,
            error: error.into(),
        });
    }

    pub fn search_progress(&self, tab_id: TabId, checked: u32) {
        self.broadcast(PanelEvent::SearchProgress { tab_id, checked });
    }

    pub fn purchase_progress(&self, tab_id: TabId, purchased: u32, found: u32) {
        self.broadcast(PanelEvent::PurchaseProgress {
            tab_id,
            purchased,
            found,
        });
    }

    pub fn ticket_found(&self, tab_id: TabId, tickets: Vec<Ticket>) {
        self.broadcast(PanelEvent::TicketFound { tab_id, tickets });
    }

    pub fn search_stopped(&self, tab_id: TabId) {
        self.broadcast(PanelEvent::SearchStopped { tab_id });
    }
}

impl Default for PanelBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_without_subscribers_is_fine() {
        let panel = PanelBroadcaster::default();
        panel.status("nobody listening");
    }

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let panel = PanelBroadcaster::new(8);
        let mut rx = panel.subscribe();

        panel.search_progress(TabId(2), 40);
        panel.error(Some(TabId(2)), "boom");

        assert_eq!(
            rx.recv().await.unwrap(),
            PanelEvent::SearchProgress {
                tab_id: TabId(2),
                checked: 40
            }
        );
        assert!(matches!(rx.recv().await.unwrap(), PanelEvent::Error { .. }));
    }
}
