use serde::{Deserialize, Serialize};

/// Lookup key used for every news query; news digests are not keyed by the query text.
pub const NEWS_LOOKUP_KEY: &str = "myNews";

const DEFINITION_PREFIXES: [&str; 4] = ["explain ", "define ", "what is ", "what are "];

// Checked in order; the first alias group that matches wins.
const TICKER_ALIASES: [(&[&str], &str); 3] = [
    (&["apple", "aapl"], "AAPL"),
    (&["google", "googl"], "GOOGL"),
    (&["microsoft", "msft"], "MSFT"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Definition,
    News,
    Stock,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Definition => "definition",
            Category::News => "news",
            Category::Stock => "stock",
            Category::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub lookup_key: String,
    pub aux_term: Option<String>,
}

impl Classification {
    fn keyed(category: Category, lookup_key: impl Into<String>) -> Self {
        Self {
            category,
            lookup_key: lookup_key.into(),
            aux_term: None,
        }
    }
}

/// Assigns a category and lookup key to a raw query. Total and deterministic:
/// rules are tried in priority order and the first match wins.
pub fn classify(query: &str) -> Classification {
    let lowered = query.to_lowercase();

    if let Some(classification) = classify_definition(query, &lowered) {
        return classification;
    }

    if lowered.contains("news") {
        return Classification::keyed(Category::News, NEWS_LOOKUP_KEY);
    }

    for (aliases, ticker) in TICKER_ALIASES {
        if aliases.iter().any(|alias| lowered.contains(alias)) {
            return Classification::keyed(Category::Stock, ticker);
        }
    }

    if is_ticker_shaped(query) {
        return Classification::keyed(Category::Stock, query);
    }

    Classification::keyed(Category::General, query)
}

fn classify_definition(query: &str, lowered: &str) -> Option<Classification> {
    let prefix = DEFINITION_PREFIXES
        .iter()
        .find(|prefix| lowered.starts_with(*prefix))?;

    // Prefixes are ASCII, so lowercasing preserved their byte length, but the
    // remainder must come from the original string to keep its casing.
    let remainder = query.get(prefix.len()..).unwrap_or_default().trim();
    let lookup_key = if remainder.is_empty() {
        query.to_string()
    } else {
        remainder.to_string()
    };

    Some(Classification {
        category: Category::Definition,
        lookup_key,
        aux_term: Some(remainder.to_string()),
    })
}

/// 1 to 5 uppercase ASCII letters and nothing else.
pub fn is_ticker_shaped(s: &str) -> bool {
    (1..=5).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_uppercase())
}
