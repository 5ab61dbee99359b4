//! Append-only result history.
//!
//! [`HistoryAccumulator`] is the synchronous state machine
//! (`Idle -> Processing(query) -> Idle`, plus a terminal `Closed`), and
//! [`session::HistorySession`] drives it asynchronously with simulated latency
//! and cancellation.
//!
//! A submission for a different query while one is processing cancels the
//! pending one and restarts on the new query (last submission wins).

pub mod drilldown;
pub mod session;
pub mod view;

use crate::domain::entry::ResultEntry;
use serde::Serialize;
use std::sync::Arc;

/// Submission number; completions carrying a stale ticket are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Started { ticket: Ticket },
    /// The in-flight query was cancelled in favor of this one.
    Restarted { ticket: Ticket, superseded: String },
    /// Same text as the in-flight or most recently submitted query.
    Duplicate,
    Closed,
}

impl SubmitOutcome {
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            SubmitOutcome::Started { ticket } | SubmitOutcome::Restarted { ticket, .. } => {
                Some(*ticket)
            }
            SubmitOutcome::Duplicate | SubmitOutcome::Closed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Processing { query: String, ticket: Ticket },
    Closed,
}

#[derive(Debug)]
pub struct HistoryAccumulator {
    entries: Vec<Arc<ResultEntry>>,
    phase: Phase,
    last_submitted: Option<String>,
    next_ticket: u64,
}

impl Default for HistoryAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryAccumulator {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            phase: Phase::Idle,
            last_submitted: None,
            next_ticket: 1,
        }
    }

    pub fn begin(&mut self, query: &str) -> SubmitOutcome {
        let superseded = match &self.phase {
            Phase::Closed => return SubmitOutcome::Closed,
            Phase::Processing { query: in_flight, .. } if in_flight == query => {
                return SubmitOutcome::Duplicate
            }
            Phase::Processing { query: in_flight, .. } => Some(in_flight.clone()),
            Phase::Idle => None,
        };

        if self.last_submitted.as_deref() == Some(query) {
            return SubmitOutcome::Duplicate;
        }

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.last_submitted = Some(query.to_string());
        self.phase = Phase::Processing {
            query: query.to_string(),
            ticket,
        };

        match superseded {
            Some(superseded) => SubmitOutcome::Restarted { ticket, superseded },
            None => SubmitOutcome::Started { ticket },
        }
    }

    /// Appends `entry` if `ticket` is still the in-flight submission.
    pub fn complete(&mut self, ticket: Ticket, entry: ResultEntry) -> Option<Arc<ResultEntry>> {
        if !self.is_current(ticket) {
            return None;
        }
        let entry = Arc::new(entry);
        self.entries.push(Arc::clone(&entry));
        self.phase = Phase::Idle;
        Some(entry)
    }

    /// Returns to idle without appending, e.g. after a failed completion.
    pub fn abandon(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.phase = Phase::Idle;
        true
    }

    pub fn close(&mut self) {
        self.phase = Phase::Closed;
    }

    pub fn in_flight(&self) -> Option<&str> {
        match &self.phase {
            Phase::Processing { query, .. } => Some(query),
            Phase::Idle | Phase::Closed => None,
        }
    }

    pub fn entries(&self) -> &[Arc<ResultEntry>] {
        &self.entries
    }

    /// Insertion-ordered copy; later appends do not affect it.
    pub fn snapshot(&self) -> Vec<Arc<ResultEntry>> {
        self.entries.clone()
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        matches!(&self.phase, Phase::Processing { ticket: current, .. } if *current == ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payload::{GeneralInfo, Payload, Sentiment};

    fn entry(query: &str) -> ResultEntry {
        ResultEntry::new(
            query,
            Payload::General(GeneralInfo {
                definition: format!("about {query}"),
                related_terms: vec![],
                sentiment: Sentiment::Neutral,
            }),
        )
        .unwrap()
    }

    fn run(acc: &mut HistoryAccumulator, query: &str) -> Option<Arc<ResultEntry>> {
        let ticket = acc.begin(query).ticket()?;
        acc.complete(ticket, entry(query))
    }

    #[test]
    fn same_query_twice_in_a_row_is_a_noop() {
        let mut acc = HistoryAccumulator::new();
        assert!(run(&mut acc, "AAPL").is_some());
        assert_eq!(acc.begin("AAPL"), SubmitOutcome::Duplicate);
        assert_eq!(acc.entries().len(), 1);
    }

    #[test]
    fn same_query_while_in_flight_is_dropped() {
        let mut acc = HistoryAccumulator::new();
        let first = acc.begin("news");
        assert!(matches!(first, SubmitOutcome::Started { .. }));
        assert_eq!(acc.begin("news"), SubmitOutcome::Duplicate);
        assert_eq!(acc.in_flight(), Some("news"));
    }

    #[test]
    fn repeated_query_is_accepted_after_a_different_one() {
        let mut acc = HistoryAccumulator::new();
        run(&mut acc, "AAPL").unwrap();
        run(&mut acc, "MSFT").unwrap();
        run(&mut acc, "AAPL").unwrap();
        let queries: Vec<_> = acc.entries().iter().map(|e| e.query().to_string()).collect();
        assert_eq!(queries, ["AAPL", "MSFT", "AAPL"]);
    }

    #[test]
    fn different_query_while_processing_supersedes_the_pending_one() {
        let mut acc = HistoryAccumulator::new();
        let first = acc.begin("AAPL").ticket().unwrap();
        let second = acc.begin("MSFT");
        let ticket = match second {
            SubmitOutcome::Restarted { ticket, superseded } => {
                assert_eq!(superseded, "AAPL");
                ticket
            }
            other => panic!("expected restart, got {other:?}"),
        };

        assert!(acc.complete(first, entry("AAPL")).is_none());
        assert!(acc.complete(ticket, entry("MSFT")).is_some());
        assert_eq!(acc.entries().len(), 1);
        assert_eq!(acc.entries()[0].query(), "MSFT");
    }

    #[test]
    fn snapshots_preserve_order_and_are_unaffected_by_later_appends() {
        let mut acc = HistoryAccumulator::new();
        for q in ["a", "b", "c"] {
            run(&mut acc, q).unwrap();
        }
        let snapshot = acc.snapshot();
        let ids: Vec<_> = snapshot.iter().map(|e| e.id()).collect();

        run(&mut acc, "d").unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.iter().map(|e| e.id()).collect::<Vec<_>>(), ids);
        assert_eq!(acc.entries()[..3].iter().map(|e| e.id()).collect::<Vec<_>>(), ids);
        assert!(Arc::ptr_eq(&snapshot[0], &acc.entries()[0]));
    }

    #[test]
    fn closed_accumulator_rejects_everything() {
        let mut acc = HistoryAccumulator::new();
        let ticket = acc.begin("AAPL").ticket().unwrap();
        acc.close();
        assert!(acc.complete(ticket, entry("AAPL")).is_none());
        assert_eq!(acc.begin("MSFT"), SubmitOutcome::Closed);
        assert!(acc.entries().is_empty());
    }

    #[test]
    fn abandon_returns_to_idle_without_appending() {
        let mut acc = HistoryAccumulator::new();
        let ticket = acc.begin("AAPL").ticket().unwrap();
        assert!(acc.abandon(ticket));
        assert_eq!(acc.in_flight(), None);
        assert!(acc.entries().is_empty());
        // Still the most recent submission.
        assert_eq!(acc.begin("AAPL"), SubmitOutcome::Duplicate);
    }
}
