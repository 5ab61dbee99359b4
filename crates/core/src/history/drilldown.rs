use crate::domain::allocation::{ExpandedAllocation, PendingExpansion};
use crate::domain::entry::{EntryId, ResultEntry};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrillDownError {
    #[error("entry {entry_id} not found")]
    UnknownEntry { entry_id: EntryId },
    #[error("entry {entry_id} has no allocation chart")]
    NoAllocation { entry_id: EntryId },
    #[error("session is closed")]
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrillDownState {
    pub pending: Option<PendingExpansion>,
    pub expanded: Option<ExpandedAllocation>,
}

/// Asset allocation drill-down: a pending copy of the chart data becomes the
/// expanded view after a simulated load. A newer expand replaces the pending one.
pub struct AllocationDrillDown {
    state: Arc<watch::Sender<DrillDownState>>,
    loading: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
    latency: Duration,
}

impl AllocationDrillDown {
    pub fn new(latency: Duration, shutdown: CancellationToken) -> Self {
        let (state, _) = watch::channel(DrillDownState::default());
        Self {
            state: Arc::new(state),
            loading: Mutex::new(None),
            shutdown,
            latency,
        }
    }

    pub async fn expand(&self, entry: &ResultEntry) -> Result<PendingExpansion, DrillDownError> {
        if self.shutdown.is_cancelled() {
            return Err(DrillDownError::Closed);
        }
        let (Some(series), Some(ticker)) = (entry.chart_series(), entry.ticker()) else {
            return Err(DrillDownError::NoAllocation {
                entry_id: entry.id(),
            });
        };

        let pending = PendingExpansion {
            entry_id: entry.id(),
            ticker: ticker.to_string(),
            allocation: series.allocation.to_vec(),
        };

        let mut loading = self.loading.lock().await;
        if let Some(previous) = loading.take() {
            previous.cancel();
        }
        let token = self.shutdown.child_token();
        *loading = Some(token.clone());

        self.state.send_modify(|s| s.pending = Some(pending.clone()));
        tracing::debug!(entry_id = %pending.entry_id, ticker = %pending.ticker, "allocation drill-down loading");

        let state = Arc::clone(&self.state);
        let latency = self.latency;
        let expected = pending.entry_id;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(latency) => {}
            }
            state.send_modify(|s| {
                // A newer expand may have replaced the pending slot.
                if s.pending.as_ref().map(|p| p.entry_id) != Some(expected) {
                    return;
                }
                if let Some(pending) = s.pending.take() {
                    s.expanded = Some(ExpandedAllocation::from(pending));
                }
            });
        });

        Ok(pending)
    }

    pub fn state(&self) -> DrillDownState {
        self.state.borrow().clone()
    }

    /// Waits for the current load to finish. `None` if nothing is loading or
    /// expanded.
    pub async fn wait_expanded(&self) -> Option<ExpandedAllocation> {
        let mut rx = self.state.subscribe();
        tokio::select! {
            state = rx.wait_for(|s| s.pending.is_none()) => {
                state.ok().and_then(|s| s.expanded.clone())
            }
            _ = self.shutdown.cancelled() => None,
        }
    }
}
