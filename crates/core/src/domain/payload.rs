use crate::domain::query::Category;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Stock(StockSnapshot),
    General(GeneralInfo),
    News(NewsDigest),
    Definition(DefinitionInfo),
}

impl Payload {
    pub fn category(&self) -> Category {
        match self {
            Payload::Stock(_) => Category::Stock,
            Payload::General(_) => Category::General,
            Payload::News(_) => Category::News,
            Payload::Definition(_) => Category::Definition,
        }
    }

    pub fn as_stock(&self) -> Option<&StockSnapshot> {
        match self {
            Payload::Stock(stock) => Some(stock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalystRating {
    Buy,
    Hold,
    Sell,
}

impl AnalystRating {
    /// Progress-bar value shown next to the rating.
    pub fn rating_value(self) -> u8 {
        match self {
            AnalystRating::Buy => 85,
            AnalystRating::Hold => 50,
            AnalystRating::Sell => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub ticker: String,
    pub company_name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,
    /// Trillions of USD.
    pub market_cap_trillions: f64,
    pub pe_ratio: f64,
    pub dividend_yield_percent: f64,
    pub analyst_rating: AnalystRating,
    pub rating_value: u8,
    pub is_up: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub definition: String,
    pub related_terms: Vec<String>,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionInfo {
    pub term: String,
    pub definition: String,
    pub related_terms: Vec<String>,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsDigest {
    pub news_items: Vec<NewsItem>,
    pub accounts: Vec<AccountSummary>,
    pub movers: Vec<Mover>,
    pub next_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub headline: String,
    pub source: String,
    pub impact: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub name: String,
    pub balance: f64,
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub ticker: String,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub category: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub monthly: [MonthlyPoint; 6],
    pub allocation: [AllocationSlice; 4],
}

impl ChartSeries {
    pub fn standard() -> Self {
        let monthly = [
            ("Jan", 186),
            ("Feb", 205),
            ("Mar", 237),
            ("Apr", 225),
            ("May", 273),
            ("Jun", 301),
        ]
        .map(|(month, value)| MonthlyPoint {
            month: month.to_string(),
            value,
        });

        let allocation = [
            ("Equities", 4500),
            ("Bonds", 2500),
            ("Cash", 800),
            ("Alternatives", 1200),
        ]
        .map(|(category, value)| AllocationSlice {
            category: category.to_string(),
            value,
        });

        Self {
            monthly,
            allocation,
        }
    }
}
