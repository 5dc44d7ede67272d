//! Poll-driven refresh of the client table
//!
//! The poller owns the [`KnownIds`] set. Each cycle fetches the client list
//! and renders only when the set of ids changed, unless the cycle is forced.
//! Cycles run one at a time: a slow fetch delays the next tick instead of
//! overlapping with it.

use crate::api::ApiClient;
use crate::render::{render, TableView};
use keydesk_common::KnownIds;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Requests sent to a running poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Fetch now and render regardless of change detection
    Force,
}

/// Updates sent from the poller and dispatcher to the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// A freshly rendered table replacing the previous one
    Table(TableView),
    /// Fetching failed; the previous table stays on screen
    RefreshFailed(String),
    /// Informational message for the status line
    Notice(String),
}

/// Result of one poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Rendered(TableView),
    Skipped,
    Failed(String),
}

impl CycleOutcome {
    /// Event to forward to the panel, if any
    pub fn into_event(self) -> Option<PanelEvent> {
        match self {
            CycleOutcome::Rendered(view) => Some(PanelEvent::Table(view)),
            CycleOutcome::Skipped => None,
            CycleOutcome::Failed(message) => Some(PanelEvent::RefreshFailed(message)),
        }
    }
}

pub struct Poller {
    api: ApiClient,
    known: KnownIds,
}

impl Poller {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            known: KnownIds::new(),
        }
    }

    /// Ids of the last rendered list
    #[cfg(test)]
    pub fn known(&self) -> &KnownIds {
        &self.known
    }

    /// Fetch the client list and render it if needed
    pub async fn cycle(&mut self, force: bool) -> CycleOutcome {
        let clients = match self.api.list_clients().await {
            Ok(clients) => clients,
            Err(e) => {
                tracing::warn!("Failed to fetch clients from {}: {}", self.api.base_url(), e);
                return CycleOutcome::Failed(e.to_string());
            }
        };

        if !force && !self.known.is_different(&clients) {
            tracing::debug!(count = clients.len(), "client ids unchanged, render skipped");
            return CycleOutcome::Skipped;
        }

        self.known.rebuild(&clients);
        tracing::debug!(count = clients.len(), force, "rendering client table");
        CycleOutcome::Rendered(render(&clients))
    }

    /// Poll until either channel closes.
    ///
    /// The first cycle is forced so an empty list still produces a table.
    pub async fn run(
        mut self,
        interval: Duration,
        mut commands: mpsc::Receiver<PollCommand>,
        events: mpsc::Sender<PanelEvent>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the initial forced cycle covers it
        ticker.tick().await;

        let mut force = true;
        loop {
            if let Some(event) = self.cycle(force).await.into_event() {
                if events.send(event).await.is_err() {
                    break;
                }
            }

            force = tokio::select! {
                _ = ticker.tick() => false,
                command = commands.recv() => match command {
                    Some(PollCommand::Force) => true,
                    None => break,
                },
            };
        }

        tracing::debug!("poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    async fn poller(backend: &MockBackend) -> Poller {
        Poller::new(ApiClient::new(&backend.api_url()).unwrap())
    }

    #[tokio::test]
    async fn test_first_cycle_renders_and_unchanged_ids_skip() {
        let backend = MockBackend::start(vec![("alpha", "k1"), ("beta", "k2")]).await;
        let mut poller = poller(&backend).await;

        match poller.cycle(false).await {
            CycleOutcome::Rendered(view) => assert_eq!(view.len(), 2),
            other => panic!("expected render, got {:?}", other),
        }
        assert_eq!(poller.known().len(), 2);

        assert_eq!(poller.cycle(false).await, CycleOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_new_client_triggers_render() {
        let backend = MockBackend::start(vec![("alpha", "k1")]).await;
        let mut poller = poller(&backend).await;
        poller.cycle(true).await;

        let id = backend.push("beta").await;
        match poller.cycle(false).await {
            CycleOutcome::Rendered(view) => assert_eq!(view.rows[1].id, id),
            other => panic!("expected render, got {:?}", other),
        }
        assert!(poller.known().contains(id));
    }

    #[tokio::test]
    async fn test_rename_is_only_visible_on_forced_cycle() {
        let backend = MockBackend::start(vec![("alpha", "k1")]).await;
        let mut poller = poller(&backend).await;
        poller.cycle(true).await;

        backend.rename(1, "renamed").await;
        assert_eq!(poller.cycle(false).await, CycleOutcome::Skipped);

        match poller.cycle(true).await {
            CycleOutcome::Rendered(view) => assert_eq!(view.rows[0].name, "renamed"),
            other => panic!("expected render, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_known_ids() {
        let backend = MockBackend::start(vec![("alpha", "k1"), ("beta", "k2")]).await;
        let mut poller = poller(&backend).await;
        poller.cycle(true).await;
        let before = poller.known().clone();

        backend.set_failing(true).await;
        assert!(matches!(poller.cycle(true).await, CycleOutcome::Failed(_)));
        assert_eq!(poller.known(), &before);

        backend.set_failing(false).await;
        assert_eq!(poller.cycle(false).await, CycleOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_run_renders_initially_and_on_force() {
        let backend = MockBackend::start(vec![]).await;
        let poller = poller(&backend).await;
        let (command_tx, command_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);

        let task = tokio::spawn(poller.run(Duration::from_secs(3600), command_rx, event_tx));

        // Initial forced cycle renders even an empty list
        assert_eq!(
            event_rx.recv().await,
            Some(PanelEvent::Table(TableView::default()))
        );

        backend.push("alpha").await;
        command_tx.send(PollCommand::Force).await.unwrap();
        match event_rx.recv().await {
            Some(PanelEvent::Table(view)) => assert_eq!(view.rows[0].name, "alpha"),
            other => panic!("expected table, got {:?}", other),
        }

        drop(command_tx);
        task.await.unwrap();
        assert_eq!(backend.list_requests().await, 2);
    }

    #[tokio::test]
    async fn test_slow_fetches_never_overlap() {
        let backend = MockBackend::start(vec![("alpha", "k1")]).await;
        backend.set_list_delay(Duration::from_millis(150)).await;
        let poller = poller(&backend).await;
        let (command_tx, command_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);

        // Interval far below the fetch time, so ticks are missed on every cycle
        let task = tokio::spawn(poller.run(Duration::from_millis(20), command_rx, event_tx));

        assert!(matches!(event_rx.recv().await, Some(PanelEvent::Table(_))));
        command_tx.send(PollCommand::Force).await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        task.abort();

        assert_eq!(backend.peak_lists_in_flight().await, 1);

        // Missed ticks are skipped: at most one fetch per delay, no catch-up burst
        let requests = backend.list_requests().await;
        assert!(requests >= 2, "poller stalled after {} requests", requests);
        assert!(requests <= 7, "catch-up burst: {} requests", requests);
    }

    #[tokio::test]
    async fn test_run_reports_failures_and_keeps_polling() {
        let backend = MockBackend::start(vec![("alpha", "k1")]).await;
        backend.set_failing(true).await;
        let poller = poller(&backend).await;
        let (_command_tx, command_rx) = mpsc::channel(4);
        let (event_tx, mut event_rx) = mpsc::channel(4);

        let task = tokio::spawn(poller.run(Duration::from_millis(20), command_rx, event_tx));

        assert!(matches!(
            event_rx.recv().await,
            Some(PanelEvent::RefreshFailed(_))
        ));

        backend.set_failing(false).await;
        loop {
            match event_rx.recv().await {
                Some(PanelEvent::Table(view)) => {
                    assert_eq!(view.len(), 1);
                    break;
                }
                Some(PanelEvent::RefreshFailed(_)) => continue,
                other => panic!("unexpected event {:?}", other),
            }
        }

        drop(event_rx);
        task.abort();
    }
}
