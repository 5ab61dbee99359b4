use crate::config::Settings;
use crate::market_data::{Endpoint, MarketDataClient};
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct TwelveDataClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TwelveDataClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_twelve_data_api_key()?.to_string();
        let base_url = settings
            .twelve_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings
            .twelve_data_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(base_url, api_key, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }

    fn params<'a>(&'a self, endpoint: Endpoint, ticker: &'a str, interval: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("symbol", ticker), ("apikey", self.api_key.as_str())];
        if endpoint == Endpoint::TimeSeries {
            params.push(("interval", interval));
        }
        params
    }
}

#[async_trait::async_trait]
impl MarketDataClient for TwelveDataClient {
    fn provider_name(&self) -> &'static str {
        "twelve_data"
    }

    async fn fetch(&self, endpoint: Endpoint, ticker: &str, interval: &str) -> Result<Value> {
        let res = self
            .http
            .get(self.url(endpoint))
            .query(&self.params(endpoint, ticker, interval))
            .send()
            .await
            .with_context(|| format!("{} request failed", endpoint.path()))?;

        let status = res.status();
        if !status.is_success() {
            anyhow::bail!(
                "{}",
                status.canonical_reason().unwrap_or(status.as_str())
            );
        }

        let body = res
            .json::<Value>()
            .await
            .with_context(|| format!("{} response is not valid JSON", endpoint.path()))?;

        // Twelve Data reports some failures in a 200 body.
        if body.get("status").and_then(Value::as_str) == Some("error") {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("upstream error");
            anyhow::bail!("{message}");
        }

        Ok(body)
    }
}
