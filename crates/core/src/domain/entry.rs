use crate::attachments::AttachedQuery;
use crate::domain::payload::{ChartSeries, Payload};
use crate::domain::query::Category;
use anyhow::ensure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// DOM anchor of the entry heading.
    pub fn heading_anchor(&self) -> String {
        format!("entry-heading-{}", self.0)
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EntryId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One answered query. Fields are read-only once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    id: EntryId,
    query: String,
    category: Category,
    payload: Payload,
    chart_series: Option<ChartSeries>,
    attachment: Option<AttachedQuery>,
    created_at: DateTime<Utc>,
}

impl ResultEntry {
    pub fn new(query: impl Into<String>, payload: Payload) -> anyhow::Result<Self> {
        let category = payload.category();
        let chart_series = (category == Category::Stock).then(ChartSeries::standard);
        Self::with_chart_series(query, category, payload, chart_series)
    }

    pub fn with_chart_series(
        query: impl Into<String>,
        category: Category,
        payload: Payload,
        chart_series: Option<ChartSeries>,
    ) -> anyhow::Result<Self> {
        ensure!(
            payload.category() == category,
            "payload variant {} does not match entry category {category}",
            payload.category()
        );
        ensure!(
            chart_series.is_some() == (category == Category::Stock),
            "chart series must be present exactly for stock entries (category={category})"
        );

        let query = query.into();
        let attachment = AttachedQuery::parse(&query);

        Ok(Self {
            id: EntryId::new(),
            query,
            category,
            payload,
            chart_series,
            attachment,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn chart_series(&self) -> Option<&ChartSeries> {
        self.chart_series.as_ref()
    }

    pub fn attachment(&self) -> Option<&AttachedQuery> {
        self.attachment.as_ref()
    }

    /// Ticker of a stock entry.
    pub fn ticker(&self) -> Option<&str> {
        self.payload.as_stock().map(|s| s.ticker.as_str())
    }
}
