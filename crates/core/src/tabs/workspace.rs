//! Workspace preparation: find or open the one tab the coordinator drives.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::executor::TabId;

use super::types::{TabController, TabError, Workflow};

/// Settle on a single search-page tab and return it.
///
/// Owned tabs that drifted off the search page are closed, stale ids are
/// dropped, and foreign search-page tabs are closed. An owned search-page
/// tab is reused when one survives; otherwise a fresh tab is opened. The
/// returned tab is inserted into `owned`.
pub async fn open_workspace(
    tabs: &dyn TabController,
    workflow: &Workflow,
    owned: &mut BTreeSet<TabId>,
) -> Result<TabId, TabError> {
    let previously_owned: Vec<TabId> = owned.iter().copied().collect();
    for tab_id in previously_owned {
        match tabs.get(tab_id).await {
            Ok(Some(tab)) if workflow.is_search_page(&tab.url) => {}
            Ok(Some(tab)) => {
                info!(tab_id = %tab_id, url = %tab.url, "Owned tab left the search page, closing");
                if let Err(e) = tabs.remove(tab_id).await {
                    warn!(tab_id = %tab_id, error = %e, "Failed to close drifted tab");
                }
                owned.remove(&tab_id);
            }
            Ok(None) => {
                debug!(tab_id = %tab_id, "Owned tab no longer exists");
                owned.remove(&tab_id);
            }
            Err(e) => {
                debug!(tab_id = %tab_id, error = %e, "Owned tab lookup failed, forgetting it");
                owned.remove(&tab_id);
            }
        }
    }

    let candidates = tabs.query(&workflow.search_page_prefix).await?;
    debug!(
        found = candidates.len(),
        owned = owned.len(),
        "Search-page tabs found"
    );

    let ours = candidates.iter().find(|t| owned.contains(&t.id)).map(|t| t.id);

    let tab_id = match ours {
        Some(tab_id) => {
            info!(tab_id = %tab_id, "Reusing owned tab");
            tabs.activate(tab_id).await?;
            close_all_except(tabs, &candidates, Some(tab_id)).await;
            tab_id
        }
        None => {
            close_all_except(tabs, &candidates, None).await;
            let created = tabs.create(&workflow.target_url).await?;
            info!(tab_id = %created.id, "Opened new workspace tab");
            created.id
        }
    };

    owned.insert(tab_id);
    Ok(tab_id)
}

async fn close_all_except(
    tabs: &dyn TabController,
    candidates: &[super::TabInfo],
    keep: Option<TabId>,
) {
    for tab in candidates {
        if Some(tab.id) == keep {
            continue;
        }
        match tabs.remove(tab.id).await {
            Ok(()) => debug!(tab_id = %tab.id, "Closed foreign tab"),
            Err(e) => warn!(tab_id = %tab.id, error = %e, "Failed to close foreign tab"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::testing::MockTabController;

    const GAME: &str = "https://www.stoloto.ru/ruslotto/game?viewType=tickets";

    fn workflow() -> Workflow {
        Workflow::from_config(&WorkflowConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_reuses_owned_tab_and_closes_others() {
        let tabs = MockTabController::new();
        tabs.add_tab(TabId(1), GAME).await;
        tabs.add_tab(TabId(2), GAME).await;
        let mut owned: BTreeSet<TabId> = [TabId(2)].into_iter().collect();

        let tab_id = open_workspace(&tabs, &workflow(), &mut owned).await.unwrap();

        assert_eq!(tab_id, TabId(2));
        assert_eq!(tabs.activated().await, vec![TabId(2)]);
        assert_eq!(tabs.removed().await, vec![TabId(1)]);
        assert!(tabs.created().await.is_empty());
    }

    #[tokio::test]
    async fn test_opens_new_tab_when_none_owned() {
        let tabs = MockTabController::new();
        tabs.add_tab(TabId(1), GAME).await;
        let mut owned = BTreeSet::new();

        let tab_id = open_workspace(&tabs, &workflow(), &mut owned).await.unwrap();

        assert_ne!(tab_id, TabId(1));
        assert_eq!(tabs.removed().await, vec![TabId(1)]);
        assert_eq!(tabs.created().await, vec![GAME.to_string()]);
        assert!(owned.contains(&tab_id));
        assert_eq!(owned.len(), 1);
    }

    #[tokio::test]
    async fn test_drops_drifted_and_missing_owned_tabs() {
        let tabs = MockTabController::new();
        tabs.add_tab(TabId(5), "https://www.stoloto.ru/news").await;
        let mut owned: BTreeSet<TabId> = [TabId(5), TabId(6)].into_iter().collect();

        let tab_id = open_workspace(&tabs, &workflow(), &mut owned).await.unwrap();

        assert_eq!(tabs.removed().await, vec![TabId(5)]);
        assert!(!owned.contains(&TabId(5)));
        assert!(!owned.contains(&TabId(6)));
        assert!(owned.contains(&tab_id));
    }
}
