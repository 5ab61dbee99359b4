//! Randomized placeholder payloads. Stand-ins for a market-data API and a
//! knowledge-base lookup; only the stock-miss fallback is a behavioral contract.

use crate::domain::payload::{
    AccountSummary, AnalystRating, DefinitionInfo, GeneralInfo, Mover, NewsDigest, NewsItem,
    Payload, Sentiment, StockSnapshot,
};
use crate::domain::query::{is_ticker_shaped, Category, Classification};
use rand::Rng;

const RELATED_TERMS: [&str; 3] = ["Term A", "Term B", "Term C"];

/// Builds the payload for a classified query. A stock lookup miss falls back
/// to general info for the same key.
pub fn synthesize<R: Rng + ?Sized>(classification: &Classification, rng: &mut R) -> Payload {
    match classification.category {
        Category::Definition => Payload::Definition(synthesize_definition(
            &classification.lookup_key,
            rng,
        )),
        Category::News => Payload::News(synthesize_news(rng)),
        Category::Stock => match synthesize_stock(&classification.lookup_key, rng) {
            Some(stock) => Payload::Stock(stock),
            None => {
                tracing::debug!(
                    ticker = %classification.lookup_key,
                    "stock lookup miss; falling back to general info"
                );
                Payload::General(synthesize_general(&classification.lookup_key, rng))
            }
        },
        Category::General => {
            Payload::General(synthesize_general(&classification.lookup_key, rng))
        }
    }
}

/// `None` when `ticker` is not 1 to 5 uppercase letters.
pub fn synthesize_stock<R: Rng + ?Sized>(ticker: &str, rng: &mut R) -> Option<StockSnapshot> {
    if !is_ticker_shaped(ticker) {
        return None;
    }

    let price = round2(rng.gen_range(50.0..1050.0));
    let change = round2(rng.gen_range(-25.0..25.0));
    let change_percent = round2(change / price * 100.0);
    let analyst_rating = pick_rating(rng);

    Some(StockSnapshot {
        ticker: ticker.to_string(),
        company_name: company_name(ticker),
        price,
        change,
        change_percent,
        volume: rng.gen_range(100_000..10_100_000),
        market_cap_trillions: round2(rng.gen_range(0.5..2.5)),
        pe_ratio: (rng.gen_range(10.0..40.0_f64) * 10.0).round() / 10.0,
        dividend_yield_percent: round2(rng.gen_range(0.0..5.0)),
        analyst_rating,
        rating_value: analyst_rating.rating_value(),
        is_up: change >= 0.0,
    })
}

pub fn synthesize_general<R: Rng + ?Sized>(term: &str, rng: &mut R) -> GeneralInfo {
    GeneralInfo {
        definition: placeholder_definition(term),
        related_terms: pick_related_terms(rng),
        sentiment: pick_sentiment(rng),
    }
}

pub fn synthesize_definition<R: Rng + ?Sized>(term: &str, rng: &mut R) -> DefinitionInfo {
    DefinitionInfo {
        term: term.to_string(),
        definition: placeholder_definition(term),
        related_terms: pick_related_terms(rng),
        sentiment: pick_sentiment(rng),
    }
}

pub fn synthesize_news<R: Rng + ?Sized>(rng: &mut R) -> NewsDigest {
    let news_items = [
        (
            "Market Reacts Positively to Fed Announcement",
            "Global Financial Times",
            Sentiment::Positive,
        ),
        (
            "Tech Sector Sees Pullback Amid Profit Taking",
            "Market Watchers",
            Sentiment::Negative,
        ),
        (
            "Energy Prices Surge on Geopolitical Tensions",
            "Energy News Hub",
            Sentiment::Neutral,
        ),
    ]
    .into_iter()
    .map(|(headline, source, impact)| NewsItem {
        headline: headline.to_string(),
        source: source.to_string(),
        impact,
    })
    .collect();

    let portfolio_sign: f64 = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let accounts = vec![
        account("Checking", rng.gen_range(1000.0..6000.0), rng.gen_range(0.0..50.0)),
        account("Savings", rng.gen_range(5000.0..25000.0), rng.gen_range(0.0..10.0)),
        account(
            "Investment Portfolio",
            rng.gen_range(50_000.0..200_000.0),
            portfolio_sign * rng.gen_range(0.0..1500.0_f64),
        ),
    ];

    let movers = vec![
        mover("XYZ", rng.gen_range(2.0..7.0)),
        mover("ABC", rng.gen_range(1.0..4.0)),
        mover("DEF", -rng.gen_range(1.0..5.0_f64)),
    ];

    NewsDigest {
        news_items,
        accounts,
        movers,
        next_actions: vec![
            "Review Portfolio Allocation".to_string(),
            "Analyze Recent Market Trends".to_string(),
        ],
    }
}

pub fn company_name(ticker: &str) -> String {
    match ticker {
        "AAPL" => "Apple Inc.".to_string(),
        "GOOGL" => "Alphabet Inc.".to_string(),
        "MSFT" => "Microsoft Corporation".to_string(),
        other => format!("{other} Holdings Inc."),
    }
}

fn placeholder_definition(term: &str) -> String {
    format!(
        "This is a placeholder definition for \"{term}\". Financial data APIs would provide real information."
    )
}

fn pick_related_terms<R: Rng + ?Sized>(rng: &mut R) -> Vec<String> {
    RELATED_TERMS
        .iter()
        .filter(|_| rng.gen_bool(0.5))
        .map(|t| t.to_string())
        .collect()
}

fn pick_sentiment<R: Rng + ?Sized>(rng: &mut R) -> Sentiment {
    if rng.gen_bool(0.4) {
        Sentiment::Positive
    } else if rng.gen_bool(0.7) {
        Sentiment::Neutral
    } else {
        Sentiment::Negative
    }
}

fn pick_rating<R: Rng + ?Sized>(rng: &mut R) -> AnalystRating {
    if rng.gen_bool(0.4) {
        AnalystRating::Buy
    } else if rng.gen_bool(0.7) {
        AnalystRating::Hold
    } else {
        AnalystRating::Sell
    }
}

fn account(name: &str, balance: f64, change: f64) -> AccountSummary {
    AccountSummary {
        name: name.to_string(),
        balance: round2(balance),
        change: round2(change),
    }
}

fn mover(ticker: &str, change_percent: f64) -> Mover {
    Mover {
        ticker: ticker.to_string(),
        change_percent: (change_percent * 10.0).round() / 10.0,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::classify;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn stock_lookup_misses_for_non_ticker_keys() {
        let mut rng = StdRng::seed_from_u64(7);
        for key in ["aapl", "Hello there", "", "TOOLONG", "A1"] {
            assert!(synthesize_stock(key, &mut rng).is_none(), "key={key}");
        }
    }

    #[test]
    fn stock_snapshot_is_internally_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let s = synthesize_stock("IBM", &mut rng).unwrap();
            assert_eq!(s.company_name, "IBM Holdings Inc.");
            assert!((50.0..=1050.0).contains(&s.price));
            assert_eq!(s.is_up, s.change >= 0.0);
            assert_eq!(s.rating_value, s.analyst_rating.rating_value());
        }
    }

    #[test]
    fn stock_miss_falls_back_to_general_payload() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut c = classify("IBM");
        c.lookup_key = "not a ticker".to_string();
        match synthesize(&c, &mut rng) {
            Payload::General(info) => assert!(info.definition.contains("not a ticker")),
            other => panic!("expected general fallback, got {other:?}"),
        }
    }

    #[test]
    fn payload_variant_follows_category() {
        let mut rng = StdRng::seed_from_u64(3);
        for (q, expected) in [
            ("What is a 401k?", Category::Definition),
            ("news", Category::News),
            ("aapl", Category::Stock),
            ("Market Overview", Category::General),
        ] {
            assert_eq!(synthesize(&classify(q), &mut rng).category(), expected);
        }
    }

    #[test]
    fn known_tickers_get_company_names() {
        assert_eq!(company_name("AAPL"), "Apple Inc.");
        assert_eq!(company_name("GOOGL"), "Alphabet Inc.");
        assert_eq!(company_name("MSFT"), "Microsoft Corporation");
    }
}
