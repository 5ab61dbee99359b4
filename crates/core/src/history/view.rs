use crate::domain::entry::EntryId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAlign {
    Top,
    Center,
}

/// Shown while a query is in flight; kept in view center-aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadingIndicator {
    pub query: String,
    pub align: ScrollAlign,
}

/// Heading to bring into view after an append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevealTarget {
    pub entry_id: EntryId,
    pub anchor: String,
    pub align: ScrollAlign,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub loading: Option<LoadingIndicator>,
    pub reveal: Option<RevealTarget>,
}

impl ViewState {
    pub(crate) fn loading(&self, query: &str) -> Self {
        Self {
            loading: Some(LoadingIndicator {
                query: query.to_string(),
                align: ScrollAlign::Center,
            }),
            reveal: self.reveal.clone(),
        }
    }

    pub(crate) fn revealed(entry_id: EntryId) -> Self {
        Self {
            loading: None,
            reveal: Some(RevealTarget {
                entry_id,
                anchor: entry_id.heading_anchor(),
                align: ScrollAlign::Top,
            }),
        }
    }

    pub(crate) fn settled(&self) -> Self {
        Self {
            loading: None,
            reveal: self.reveal.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }
}
