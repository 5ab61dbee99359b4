//! Market-data fan-out: five independent upstream calls merged into one
//! response with a per-field error map.

pub mod twelve_data;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_INTERVAL: &str = "1day";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Endpoint {
    Price,
    Quote,
    TimeSeries,
    Profile,
    Earnings,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Price,
        Endpoint::Quote,
        Endpoint::TimeSeries,
        Endpoint::Profile,
        Endpoint::Earnings,
    ];

    /// Upstream path segment.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Price => "price",
            Endpoint::Quote => "quote",
            Endpoint::TimeSeries => "time_series",
            Endpoint::Profile => "profile",
            Endpoint::Earnings => "earnings",
        }
    }

    /// Key used in the combined response and its error map.
    pub fn field(self) -> &'static str {
        match self {
            Endpoint::Price => "price",
            Endpoint::Quote => "quote",
            Endpoint::TimeSeries => "timeSeries",
            Endpoint::Profile => "profile",
            Endpoint::Earnings => "earnings",
        }
    }
}

#[async_trait::async_trait]
pub trait MarketDataClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch(&self, endpoint: Endpoint, ticker: &str, interval: &str) -> Result<Value>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedMarketData {
    pub price: Option<Value>,
    pub quote: Option<Value>,
    pub time_series: Option<Value>,
    pub profile: Option<Value>,
    pub earnings: Option<Value>,
    pub errors: BTreeMap<String, String>,
}

impl CombinedMarketData {
    fn slot(&mut self, endpoint: Endpoint) -> &mut Option<Value> {
        match endpoint {
            Endpoint::Price => &mut self.price,
            Endpoint::Quote => &mut self.quote,
            Endpoint::TimeSeries => &mut self.time_series,
            Endpoint::Profile => &mut self.profile,
            Endpoint::Earnings => &mut self.earnings,
        }
    }

    fn record(&mut self, endpoint: Endpoint, result: Result<Value>) {
        match result {
            Ok(value) => *self.slot(endpoint) = Some(value),
            Err(err) => {
                self.errors
                    .insert(endpoint.field().to_string(), format!("{err:#}"));
            }
        }
    }

    pub fn succeeded(&self) -> usize {
        [
            &self.price,
            &self.quote,
            &self.time_series,
            &self.profile,
            &self.earnings,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }

    /// Every field failed; surfaced as "upstream unavailable".
    pub fn all_failed(&self) -> bool {
        self.succeeded() == 0 && !self.errors.is_empty()
    }
}

/// Issues all five calls concurrently and waits for every one to settle.
pub async fn aggregate(
    client: &dyn MarketDataClient,
    ticker: &str,
    interval: &str,
) -> CombinedMarketData {
    let (price, quote, time_series, profile, earnings) = tokio::join!(
        client.fetch(Endpoint::Price, ticker, interval),
        client.fetch(Endpoint::Quote, ticker, interval),
        client.fetch(Endpoint::TimeSeries, ticker, interval),
        client.fetch(Endpoint::Profile, ticker, interval),
        client.fetch(Endpoint::Earnings, ticker, interval),
    );

    let mut combined = CombinedMarketData::default();
    for (endpoint, result) in Endpoint::ALL
        .into_iter()
        .zip([price, quote, time_series, profile, earnings])
    {
        combined.record(endpoint, result);
    }

    if combined.errors.is_empty() {
        tracing::debug!(provider = client.provider_name(), %ticker, "market data fetched");
    } else {
        tracing::warn!(
            provider = client.provider_name(),
            %ticker,
            failed = combined.errors.len(),
            errors = ?combined.errors,
            "market data partially failed"
        );
    }

    combined
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    /// Succeeds for every endpoint not listed in `failing`.
    pub(crate) struct StubClient {
        pub failing: BTreeSet<Endpoint>,
    }

    #[async_trait::async_trait]
    impl MarketDataClient for StubClient {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(&self, endpoint: Endpoint, ticker: &str, interval: &str) -> Result<Value> {
            if self.failing.contains(&endpoint) {
                anyhow::bail!("Too Many Requests");
            }
            Ok(json!({"endpoint": endpoint.path(), "symbol": ticker, "interval": interval}))
        }
    }

    #[tokio::test]
    async fn merges_partial_failures_per_field() {
        let client = StubClient {
            failing: [Endpoint::TimeSeries, Endpoint::Earnings].into_iter().collect(),
        };
        let combined = aggregate(&client, "AAPL", DEFAULT_INTERVAL).await;

        assert_eq!(combined.succeeded(), 3);
        assert!(!combined.all_failed());
        assert_eq!(combined.price.as_ref().unwrap()["symbol"], "AAPL");
        assert!(combined.time_series.is_none());
        assert_eq!(
            combined.errors.keys().cloned().collect::<Vec<_>>(),
            ["earnings", "timeSeries"]
        );
        assert_eq!(combined.errors["timeSeries"], "Too Many Requests");
    }

    #[tokio::test]
    async fn total_failure_is_flagged() {
        let client = StubClient {
            failing: Endpoint::ALL.into_iter().collect(),
        };
        let combined = aggregate(&client, "AAPL", "1week").await;
        assert!(combined.all_failed());
        assert_eq!(combined.errors.len(), 5);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let v = serde_json::to_value(CombinedMarketData::default()).unwrap();
        assert!(v.get("timeSeries").is_some());
        assert!(v.get("errors").unwrap().as_object().unwrap().is_empty());
    }
}
