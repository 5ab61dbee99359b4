use crate::context::FocusMode;
use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const RESULTS_PATH: &str = "/results";

/// Parameters of the results view: free-text query plus optional focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub query: String,
    pub focus: Option<FocusMode>,
}

impl NavigationRequest {
    /// `None` for blank input; the search bar does not navigate on empty submit.
    pub fn new(query: &str, focus: Option<FocusMode>) -> Option<Self> {
        if query.is_empty() {
            return None;
        }
        Some(Self {
            query: query.to_string(),
            focus,
        })
    }

    pub fn to_query_string(&self) -> String {
        let mut out = format!("query={}", urlencoding::encode(&self.query));
        if let Some(focus) = self.focus {
            out.push_str("&focus=");
            out.push_str(&urlencoding::encode(focus.label()));
        }
        out
    }

    pub fn to_url(&self) -> String {
        format!("{RESULTS_PATH}?{}", self.to_query_string())
    }

    /// Parses `query=..&focus=..` (leading `?` allowed). Unknown focus labels are ignored.
    pub fn parse(query_string: &str) -> anyhow::Result<Option<Self>> {
        let mut query = None;
        let mut focus = None;

        for pair in query_string.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            // Form encoding uses '+' for spaces.
            let value = value.replace('+', " ");
            let value = urlencoding::decode(&value)
                .with_context(|| format!("invalid percent-encoding in {key}"))?;
            match key {
                "query" => query = Some(value.into_owned()),
                "focus" => focus = FocusMode::from_label(&value),
                _ => {}
            }
        }

        Ok(query.and_then(|q| Self::new(&q, focus)))
    }
}
