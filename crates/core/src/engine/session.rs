//! A running search or purchase on one tab.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::criteria::SearchCriteria;
use crate::executor::TabId;

/// One session per active tab.
///
/// The running flag is a `watch` channel so waits can end as soon as the
/// session is stopped. It only ever goes from `true` to `false`.
#[derive(Debug)]
pub struct Session {
    tab_id: TabId,
    criteria: SearchCriteria,
    running: watch::Sender<bool>,
    tickets_checked: AtomicU32,
    tickets_found: AtomicU32,
    tickets_purchased: AtomicU32,
    started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(tab_id: TabId, criteria: SearchCriteria) -> Self {
        let (running, _) = watch::channel(true);
        Self {
            tab_id,
            criteria,
            running,
            tickets_checked: AtomicU32::new(0),
            tickets_found: AtomicU32::new(0),
            tickets_purchased: AtomicU32::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Flip the running flag off. Idempotent.
    pub fn stop(&self) {
        self.running.send_replace(false);
    }

    /// Sleep for `duration` unless the session is stopped first.
    ///
    /// Returns whether the session is still running afterwards.
    pub async fn sleep_unless_stopped(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return self.is_running();
        }
        let mut rx = self.running.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = rx.wait_for(|running| !*running) => {}
        }
        self.is_running()
    }

    pub fn tickets_checked(&self) -> u32 {
        self.tickets_checked.load(Ordering::Relaxed)
    }

    pub fn tickets_found(&self) -> u32 {
        self.tickets_found.load(Ordering::Relaxed)
    }

    pub fn tickets_purchased(&self) -> u32 {
        self.tickets_purchased.load(Ordering::Relaxed)
    }

    pub fn set_tickets_checked(&self, n: u32) {
        self.tickets_checked.store(n, Ordering::Relaxed);
    }

    pub fn set_tickets_found(&self, n: u32) {
        self.tickets_found.store(n, Ordering::Relaxed);
    }

    pub fn set_tickets_purchased(&self, n: u32) {
        self.tickets_purchased.store(n, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::SearchMode;
    use std::sync::Arc;
    use std::time::Instant;

    fn session() -> Session {
        let criteria = SearchCriteria::new(vec![5], [], SearchMode::Anywhere, 0).unwrap();
        Session::new(TabId(1), criteria)
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let session = session();
        assert!(session.is_running());
        session.stop();
        session.stop();
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_sleep_ends_early_on_stop() {
        let session = Arc::new(session());
        let sleeper = Arc::clone(&session);
        let started = Instant::now();

        let handle =
            tokio::spawn(async move { sleeper.sleep_unless_stopped(Duration::from_secs(30)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.stop();

        let still_running = handle.await.unwrap();
        assert!(!still_running);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_sleep_completes_when_running() {
        let session = session();
        assert!(session.sleep_unless_stopped(Duration::from_millis(5)).await);
    }

    #[test]
    fn test_counters() {
        let session = session();
        session.set_tickets_checked(40);
        session.set_tickets_found(2);
        session.set_tickets_purchased(1);
        assert_eq!(session.tickets_checked(), 40);
        assert_eq!(session.tickets_found(), 2);
        assert_eq!(session.tickets_purchased(), 1);
    }
}
