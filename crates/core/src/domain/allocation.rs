use crate::domain::entry::EntryId;
use crate::domain::payload::AllocationSlice;
use serde::{Deserialize, Serialize};

/// Copy of a stock entry's allocation while its expanded view loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingExpansion {
    pub entry_id: EntryId,
    pub ticker: String,
    pub allocation: Vec<AllocationSlice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedAllocation {
    pub entry_id: EntryId,
    pub ticker: String,
    pub allocation: Vec<AllocationSlice>,
    pub total: u64,
}

impl From<PendingExpansion> for ExpandedAllocation {
    fn from(pending: PendingExpansion) -> Self {
        let total = pending.allocation.iter().map(|s| u64::from(s.value)).sum();
        Self {
            entry_id: pending.entry_id,
            ticker: pending.ticker,
            allocation: pending.allocation,
            total,
        }
    }
}
