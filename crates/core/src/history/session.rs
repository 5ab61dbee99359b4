use crate::domain::allocation::{ExpandedAllocation, PendingExpansion};
use crate::domain::entry::{EntryId, ResultEntry};
use crate::domain::query::classify;
use crate::history::drilldown::{AllocationDrillDown, DrillDownError, DrillDownState};
use crate::history::view::ViewState;
use crate::history::{HistoryAccumulator, SubmitOutcome, Ticket};
use crate::synth::synthesize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch, Mutex};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1200);
pub const DEFAULT_DRILLDOWN_LATENCY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Simulated processing time before an answer is appended.
    pub latency: Duration,
    pub drilldown_latency: Duration,
    /// Fixed seed for reproducible payloads.
    pub seed: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
            drilldown_latency: DEFAULT_DRILLDOWN_LATENCY,
            seed: None,
        }
    }
}

struct Inner {
    history: HistoryAccumulator,
    rng: StdRng,
    in_flight: Option<CancellationToken>,
}

/// Async owner of one history. Dropping it (or calling [`shutdown`](Self::shutdown))
/// cancels pending work; nothing is appended afterwards.
pub struct HistorySession {
    inner: Arc<Mutex<Inner>>,
    view: Arc<watch::Sender<ViewState>>,
    drilldown: AllocationDrillDown,
    shutdown: CancellationToken,
    latency: Duration,
}

impl HistorySession {
    pub fn new(options: SessionOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let shutdown = CancellationToken::new();
        let (view, _) = watch::channel(ViewState::default());

        Self {
            inner: Arc::new(Mutex::new(Inner {
                history: HistoryAccumulator::new(),
                rng,
                in_flight: None,
            })),
            view: Arc::new(view),
            drilldown: AllocationDrillDown::new(options.drilldown_latency, shutdown.child_token()),
            shutdown,
            latency: options.latency,
        }
    }

    pub async fn submit(&self, query: &str) -> SubmitOutcome {
        self.start(query).await.0
    }

    /// Submits and waits for the answer. `None` when the submission was a
    /// duplicate, got superseded, or the session was torn down.
    pub async fn submit_and_wait(&self, query: &str) -> Option<EntryId> {
        let (_, done) = self.start(query).await;
        done?.await.ok()
    }

    async fn start(&self, query: &str) -> (SubmitOutcome, Option<oneshot::Receiver<EntryId>>) {
        let mut inner = self.inner.lock().await;
        let outcome = inner.history.begin(query);
        let Some(ticket) = outcome.ticket() else {
            tracing::debug!(query, ?outcome, "submission ignored");
            return (outcome, None);
        };

        if let Some(previous) = inner.in_flight.take() {
            previous.cancel();
        }
        if let SubmitOutcome::Restarted { superseded, .. } = &outcome {
            tracing::info!(query, superseded = %superseded, "restarting on newer query");
        }

        let token = self.shutdown.child_token();
        inner.in_flight = Some(token.clone());
        self.view.send_modify(|v| *v = v.loading(query));

        let (tx, rx) = oneshot::channel();
        tokio::spawn(process(
            Arc::clone(&self.inner),
            Arc::clone(&self.view),
            token,
            ticket,
            query.to_string(),
            self.latency,
            tx,
        ));

        (outcome, Some(rx))
    }

    pub async fn current_entries(&self) -> Vec<Arc<ResultEntry>> {
        self.inner.lock().await.history.snapshot()
    }

    pub async fn entry(&self, id: EntryId) -> Option<Arc<ResultEntry>> {
        let inner = self.inner.lock().await;
        inner.history.entries().iter().find(|e| e.id() == id).cloned()
    }

    pub async fn in_flight(&self) -> Option<String> {
        self.inner.lock().await.history.in_flight().map(str::to_string)
    }

    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    /// Resolves once no query is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.view.subscribe();
        // The sender lives as long as `self`, so this only errors during teardown.
        let _ = rx.wait_for(|v| !v.is_loading()).await;
    }

    pub async fn expand_allocation(
        &self,
        entry_id: EntryId,
    ) -> Result<PendingExpansion, DrillDownError> {
        let entry = self
            .entry(entry_id)
            .await
            .ok_or(DrillDownError::UnknownEntry { entry_id })?;
        self.drilldown.expand(&entry).await
    }

    pub fn drilldown(&self) -> DrillDownState {
        self.drilldown.state()
    }

    pub async fn wait_expanded(&self) -> Option<ExpandedAllocation> {
        self.drilldown.wait_expanded().await
    }

    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut inner = self.inner.lock().await;
        inner.history.close();
        inner.in_flight = None;
        self.view.send_modify(|v| *v = v.settled());
        tracing::debug!(entries = inner.history.entries().len(), "history session closed");
    }
}

impl Drop for HistorySession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn process(
    inner: Arc<Mutex<Inner>>,
    view: Arc<watch::Sender<ViewState>>,
    token: CancellationToken,
    ticket: Ticket,
    query: String,
    latency: Duration,
    done: oneshot::Sender<EntryId>,
) {
    tokio::select! {
        _ = token.cancelled() => {
            tracing::debug!(query = %query, "submission cancelled before completion");
            return;
        }
        _ = tokio::time::sleep(latency) => {}
    }

    let mut inner = inner.lock().await;
    // Re-checked under the lock: shutdown cancels before it closes the history.
    if token.is_cancelled() {
        return;
    }

    let classification = classify(&query);
    let payload = synthesize(&classification, &mut inner.rng);
    let entry = match ResultEntry::new(query.as_str(), payload) {
        Ok(entry) => entry,
        Err(err) => {
            tracing::error!(query = %query, error = %err, "failed to build result entry");
            inner.history.abandon(ticket);
            inner.in_flight = None;
            view.send_modify(|v| *v = v.settled());
            return;
        }
    };

    let Some(entry) = inner.history.complete(ticket, entry) else {
        return;
    };
    inner.in_flight = None;
    view.send_replace(ViewState::revealed(entry.id()));

    tracing::info!(
        query = %query,
        category = %entry.category(),
        lookup_key = %classification.lookup_key,
        entry_id = %entry.id(),
        "appended result entry"
    );
    let _ = done.send(entry.id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::Category;
    use crate::history::view::ScrollAlign;

    fn session() -> HistorySession {
        HistorySession::new(SessionOptions {
            latency: Duration::from_millis(500),
            drilldown_latency: Duration::from_millis(300),
            seed: Some(11),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn appends_entry_after_latency_and_reveals_it() {
        let s = session();
        assert!(matches!(s.submit("AAPL").await, SubmitOutcome::Started { .. }));

        let view = s.view();
        let loading = view.loading.unwrap();
        assert_eq!(loading.query, "AAPL");
        assert_eq!(loading.align, ScrollAlign::Center);
        assert!(s.current_entries().await.is_empty());

        s.wait_idle().await;
        let entries = s.current_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category(), Category::Stock);
        assert!(entries[0].chart_series().is_some());

        let view = s.view();
        assert!(!view.is_loading());
        let reveal = view.reveal.unwrap();
        assert_eq!(reveal.entry_id, entries[0].id());
        assert_eq!(reveal.align, ScrollAlign::Top);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_submission_creates_one_entry() {
        let s = session();
        let first = s.submit_and_wait("What is a 401k?").await;
        assert!(first.is_some());
        assert_eq!(s.submit("What is a 401k?").await, SubmitOutcome::Duplicate);
        assert_eq!(s.submit_and_wait("What is a 401k?").await, None);
        assert_eq!(s.current_entries().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn last_submission_wins() {
        let s = session();
        s.submit("AAPL").await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let outcome = s.submit("my news today").await;
        assert!(matches!(outcome, SubmitOutcome::Restarted { .. }));
        assert_eq!(s.view().loading.unwrap().query, "my news today");

        s.wait_idle().await;
        // Give the cancelled task a chance to run past its original deadline.
        tokio::time::sleep(Duration::from_secs(2)).await;

        let entries = s.current_entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].query(), "my news today");
        assert_eq!(entries[0].category(), Category::News);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_completion() {
        let s = session();
        s.submit("IBM").await;
        s.shutdown().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(s.current_entries().await.is_empty());
        assert!(!s.view().is_loading());
        assert_eq!(s.submit("MSFT").await, SubmitOutcome::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_cancels_pending_completion() {
        let s = session();
        let inner = Arc::clone(&s.inner);
        let token = s.shutdown.clone();
        assert!(matches!(s.submit("IBM").await, SubmitOutcome::Started { .. }));

        drop(s);
        assert!(token.is_cancelled());
        tokio::time::sleep(Duration::from_secs(2)).await;

        let inner = inner.lock().await;
        assert!(inner.history.entries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn entries_keep_insertion_order() {
        let s = session();
        let mut ids = Vec::new();
        for q in ["AAPL", "explain bonds", "news", "Hello there", "Q"] {
            ids.push(s.submit_and_wait(q).await.unwrap());
        }
        let entries = s.current_entries().await;
        assert_eq!(entries.iter().map(|e| e.id()).collect::<Vec<_>>(), ids);
        let categories: Vec<_> = entries.iter().map(|e| e.category()).collect();
        assert_eq!(
            categories,
            [
                Category::Stock,
                Category::Definition,
                Category::News,
                Category::General,
                Category::Stock
            ]
        );
        assert_eq!(s.view().reveal.unwrap().entry_id, *ids.last().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn attachment_queries_carry_structured_attachment() {
        let s = session();
        s.submit_and_wait("Question about q3.csv|text/csv: what is the trend?")
            .await
            .unwrap();
        let entry = &s.current_entries().await[0];
        let attachment = entry.attachment().unwrap();
        assert_eq!(attachment.file.mime_type, "text/csv");
        assert_eq!(attachment.question.as_deref(), Some("what is the trend?"));
        assert!(entry.chart_series().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expands_allocation_for_stock_entries() {
        let s = session();
        let id = s.submit_and_wait("MSFT").await.unwrap();
        let pending = s.expand_allocation(id).await.unwrap();
        assert_eq!(pending.ticker, "MSFT");
        assert!(s.drilldown().pending.is_some());

        let expanded = s.wait_expanded().await.unwrap();
        assert_eq!(expanded.entry_id, id);
        assert_eq!(expanded.total, 9000);
        let state = s.drilldown();
        assert!(state.pending.is_none());
        assert_eq!(state.expanded, Some(expanded));
    }

    #[tokio::test(start_paused = true)]
    async fn expand_rejects_non_stock_and_unknown_entries() {
        let s = session();
        let id = s.submit_and_wait("Hello there").await.unwrap();
        assert!(matches!(
            s.expand_allocation(id).await,
            Err(DrillDownError::NoAllocation { .. })
        ));
        assert!(matches!(
            s.expand_allocation(EntryId::new()).await,
            Err(DrillDownError::UnknownEntry { .. })
        ));
    }
}
