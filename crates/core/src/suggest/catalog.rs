use super::SuggestionKind::{self, *};

pub(super) const CATALOG: &[(&str, SuggestionKind)] = &[
    ("AAPL", Ticker),
    ("GOOGL", Ticker),
    ("MSFT", Ticker),
    ("AMZN", Ticker),
    ("TSLA", Ticker),
    ("NVDA", Ticker),
    ("S&P 500", Index),
    ("Dow Jones", Index),
    ("NASDAQ Composite", Index),
    ("Checking Account", Account),
    ("Savings Account", Account),
    ("Investment Portfolio", Account),
    ("Market Cap", Term),
    ("Dividend Yield", Term),
    ("P/E Ratio", Term),
    ("Inflation Rate", Term),
    ("Interest Rates", Term),
    ("GDP Growth", Term),
    ("Volatility (VIX)", Term),
    ("Bond", Term),
    ("ETF (Exchange Traded Fund)", Term),
    ("Mutual Fund", Term),
    ("Earnings Per Share (EPS)", Metric),
    ("Return on Investment (ROI)", Metric),
    ("What is diversification?", Question),
    ("Explain asset allocation", Term),
    ("How do bonds work?", Question),
    ("What is market volatility?", Term),
    ("Difference between stocks and bonds", Topic),
    ("What is a mutual fund?", Term),
    ("Explain ETFs", Term),
    ("What is compound interest?", Term),
    ("How to save for retirement?", Question),
    ("What is a 401(k)?", Term),
    ("Explain IRA (Individual Retirement Account)", Term),
    ("Roth vs Traditional IRA", Topic),
    ("What are capital gains?", Term),
    ("Tax implications of investing", Topic),
    ("What is inflation?", Term),
    ("How does the Federal Reserve affect rates?", Question),
    ("What is a credit score?", Term),
    ("How to improve credit score?", Question),
    ("Budgeting tips", Topic),
    ("Understanding mortgages", Topic),
    ("Fixed vs Variable Rate Mortgage", Topic),
    ("What is equity?", Term),
    ("Understanding balance sheets", Topic),
    ("What is an income statement?", Term),
    ("Cash flow analysis", Topic),
    ("What are dividends?", Term),
    ("Stock buybacks explained", Term),
    ("What is a Bull Market?", Term),
    ("What is a Bear Market?", Term),
    ("Market correction vs crash", Topic),
    ("Understanding risk tolerance", Topic),
    ("What is dollar-cost averaging?", Term),
    ("Lump sum investing vs DCA", Topic),
    ("What are options trading?", Term),
    ("Futures contracts explained", Term),
    ("Cryptocurrency basics", Topic),
    ("What is Blockchain?", Term),
    ("Real Estate Investment Trusts (REITs)", Term),
    ("Commodities trading (Oil, Gold)", Topic),
    ("ESG Investing (Environmental, Social, Governance)", Term),
    ("Impact investing", Topic),
    ("What is a Robo-advisor?", Term),
    ("Financial advisor vs Robo-advisor", Topic),
    ("Understanding insurance types (Life, Health, Auto)", Topic),
    ("Estate planning basics", Topic),
    ("What is a trust fund?", Term),
    ("Saving for college (529 plans)", Topic),
    ("How does stock market work?", Question),
    ("What drives stock prices?", Question),
    ("How much should I save?", Question),
];

pub const ICEBREAKERS: [&str; 4] = [
    "How's AAPL doing?",
    "Market Overview",
    "Explain P/E Ratio",
    "What news has affected me today?",
];
