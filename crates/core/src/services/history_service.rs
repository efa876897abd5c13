use std::sync::Arc;

use tokio::sync::watch;

use crate::errors::StorageError;
use crate::models::history::{group_by_day, DayGroup, HistoryEntry};
use crate::storage::history_store::HistoryStore;

/// Lifecycle of the history screen.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryStatus {
    Idle,
    Loading,
    Loaded,
    LoadedEmpty,
    Error(StorageError),
}

/// Snapshot of the history screen: status plus day-bucketed rows, rebuilt in
/// full on every emission of the underlying query.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    pub status: HistoryStatus,
    pub days: Vec<DayGroup>,
}

impl Default for HistoryState {
    fn default() -> Self {
        Self {
            status: HistoryStatus::Idle,
            days: Vec::new(),
        }
    }
}

/// State controller for the history screen.
pub struct HistoryService {
    store: Arc<HistoryStore>,
    state: watch::Sender<HistoryState>,
}

impl HistoryService {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        let (state, _) = watch::channel(HistoryState::default());
        Self { store, state }
    }

    /// Observe state replacements. The receiver immediately holds the
    /// current snapshot.
    pub fn state(&self) -> watch::Receiver<HistoryState> {
        self.state.subscribe()
    }

    /// Drive the live four-day history query.
    ///
    /// Runs until the caller drops the future (screen teardown) or the
    /// store reports an error, whichever comes first. Every emission
    /// replaces the whole state: rows regrouped by local calendar day,
    /// status recomputed as `Loaded`/`LoadedEmpty`. A storage error parks
    /// the screen in `Error`; there is no automatic retry.
    pub async fn load_history(&self) {
        self.state.send_replace(HistoryState {
            status: HistoryStatus::Loading,
            days: Vec::new(),
        });

        let mut updates = self.store.subscribe();
        while let Some(emission) = updates.next().await {
            match emission {
                Ok(entries) => {
                    let status = if entries.is_empty() {
                        HistoryStatus::LoadedEmpty
                    } else {
                        HistoryStatus::Loaded
                    };
                    self.state.send_replace(HistoryState {
                        status,
                        days: group_by_day(&entries),
                    });
                }
                Err(error) => {
                    self.state.send_replace(HistoryState {
                        status: HistoryStatus::Error(error),
                        days: Vec::new(),
                    });
                    return;
                }
            }
        }
    }

    /// Record a finished conversion. Fire-and-forget: a failed insert is
    /// logged and otherwise dropped, the screen state never reflects it.
    pub async fn append(&self, entry: HistoryEntry) {
        if let Err(error) = self.store.add(&entry).await {
            log::warn!(
                "failed to record conversion {} -> {}: {error}",
                entry.source_symbol,
                entry.target_symbol
            );
        }
    }
}
