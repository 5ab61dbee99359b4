use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use finsearch_core::attachments::{self, AttachedQuery, AttachmentRef, FileDescriptor};
use finsearch_core::domain::query::{classify, Classification};
use finsearch_core::history::session::SessionOptions;
use finsearch_core::market_data::twelve_data::TwelveDataClient;
use finsearch_core::market_data::{self, MarketDataClient, DEFAULT_INTERVAL};
use finsearch_core::suggest::{self, SuggestionGroup, ICEBREAKERS};

mod sessions;

use sessions::ApiSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsearch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let market_data: Option<Arc<dyn MarketDataClient>> =
        match TwelveDataClient::from_settings(&settings) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "market data client unavailable; /api/stock-data will report 500");
                None
            }
        };

    let state = AppState::new(
        market_data,
        settings.session_options(),
        settings.session_idle_ttl,
    );
    let shutdown = CancellationToken::new();
    tokio::spawn(sessions::sweep_idle_sessions(state.clone(), shutdown.clone()));
    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/classify", get(classify_query))
        .route("/api/suggestions", get(suggestions))
        .route("/api/stock-data", get(stock_data))
        .route("/api/attachments", post(intake_attachments))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/:id", delete(sessions::delete_session))
        .route("/api/sessions/:id/queries", post(sessions::submit_query))
        .route("/api/sessions/:id/results", post(sessions::navigate))
        .route("/api/sessions/:id/entries", get(sessions::list_entries))
        .route("/api/sessions/:id/view", get(sessions::get_view))
        .route("/api/sessions/:id/context", put(sessions::update_context))
        .route(
            "/api/sessions/:id/entries/:entry/expand",
            post(sessions::expand_entry),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    market_data: Option<Arc<dyn MarketDataClient>>,
    sessions: Arc<Mutex<HashMap<Uuid, Arc<ApiSession>>>>,
    session_options: SessionOptions,
    session_idle_ttl: Duration,
}

impl AppState {
    fn new(
        market_data: Option<Arc<dyn MarketDataClient>>,
        session_options: SessionOptions,
        session_idle_ttl: Duration,
    ) -> Self {
        Self {
            market_data,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            session_options,
            session_idle_ttl,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassifyParams {
    query: Option<String>,
}

async fn classify_query(
    Query(params): Query<ClassifyParams>,
) -> Result<Json<Classification>, StatusCode> {
    let query = params.query.ok_or(StatusCode::BAD_REQUEST)?;
    Ok(Json(classify(&query)))
}

#[derive(Debug, Deserialize)]
struct SuggestionParams {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct SuggestionsResponse {
    groups: Vec<SuggestionGroup>,
    /// Starter prompts, only for an empty search box.
    icebreakers: Vec<&'static str>,
}

async fn suggestions(Query(params): Query<SuggestionParams>) -> Json<SuggestionsResponse> {
    let input = params.q.unwrap_or_default();
    let icebreakers = if input.trim().is_empty() {
        ICEBREAKERS.to_vec()
    } else {
        Vec::new()
    };

    Json(SuggestionsResponse {
        groups: suggest::group(suggest::search(&input)),
        icebreakers,
    })
}

#[derive(Debug, Deserialize)]
struct StockDataParams {
    ticker: Option<String>,
    interval: Option<String>,
}

async fn stock_data(
    State(state): State<AppState>,
    Query(params): Query<StockDataParams>,
) -> Response {
    let Some(ticker) = params
        .ticker
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Ticker symbol is required" })),
        )
            .into_response();
    };

    let Some(client) = &state.market_data else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "API key not configured" })),
        )
            .into_response();
    };

    let interval = params.interval.as_deref().unwrap_or(DEFAULT_INTERVAL);
    let combined = market_data::aggregate(client.as_ref(), &ticker, interval).await;

    if combined.all_failed() {
        let e = anyhow::anyhow!("all market data requests failed for {ticker}");
        sentry_anyhow::capture_anyhow(&e);
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Failed to fetch any data from market data provider",
                "details": combined.errors,
            })),
        )
            .into_response();
    }

    Json(combined).into_response()
}

#[derive(Debug, Deserialize)]
struct AttachmentRequest {
    files: Vec<FileDescriptor>,
    #[serde(default)]
    question: Option<String>,
}

#[derive(Debug, Serialize)]
struct AttachmentResponse {
    accepted: Vec<AttachmentRef>,
    rejections: Vec<String>,
    /// One encoded query per accepted file, ready to submit to a session.
    queries: Vec<String>,
}

async fn intake_attachments(Json(req): Json<AttachmentRequest>) -> Json<AttachmentResponse> {
    let report = attachments::validate_batch(&req.files);
    let question = req.question.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let queries = report
        .accepted
        .iter()
        .map(|file| AttachedQuery::new(file.clone(), question).to_query_string())
        .collect();

    Json(AttachmentResponse {
        rejections: report.messages(),
        accepted: report.accepted,
        queries,
    })
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    shutdown.cancel();
}

fn init_sentry(settings: &finsearch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use finsearch_core::market_data::Endpoint;
    use serde_json::Value;
    use std::collections::BTreeSet;
    use tower::ServiceExt;

    struct StubClient {
        failing: BTreeSet<Endpoint>,
    }

    #[async_trait::async_trait]
    impl MarketDataClient for StubClient {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(
            &self,
            endpoint: Endpoint,
            ticker: &str,
            interval: &str,
        ) -> anyhow::Result<Value> {
            if self.failing.contains(&endpoint) {
                anyhow::bail!("Too Many Requests");
            }
            Ok(json!({ "symbol": ticker, "interval": interval }))
        }
    }

    pub(crate) fn test_state(failing: &[Endpoint]) -> AppState {
        let client = StubClient {
            failing: failing.iter().copied().collect(),
        };
        AppState::new(
            Some(Arc::new(client)),
            SessionOptions {
                latency: Duration::from_millis(50),
                drilldown_latency: Duration::from_millis(20),
                seed: Some(7),
            },
            Duration::from_secs(60),
        )
    }

    pub(crate) async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub(crate) fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub(crate) fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let (status, body) = send(router(test_state(&[])), get_req("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn classifies_queries() {
        let app = router(test_state(&[]));
        let (status, body) = send(app.clone(), get_req("/api/classify?query=AAPL")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "stock");
        assert_eq!(body["lookup_key"], "AAPL");

        let (_, body) = send(app.clone(), get_req("/api/classify?query=define%20beta")).await;
        assert_eq!(body["category"], "definition");
        assert_eq!(body["aux_term"], "beta");

        let (status, _) = send(app, get_req("/api/classify")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn suggestions_group_matches_and_offer_icebreakers_when_empty() {
        let app = router(test_state(&[]));
        let (_, body) = send(app.clone(), get_req("/api/suggestions?q=aapl")).await;
        assert_eq!(body["groups"][0]["heading"], "Tickers");
        assert_eq!(body["groups"][0]["items"][0]["value"], "AAPL");
        assert!(body["icebreakers"].as_array().unwrap().is_empty());

        let (_, body) = send(app, get_req("/api/suggestions")).await;
        assert!(body["groups"].as_array().unwrap().is_empty());
        assert_eq!(body["icebreakers"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn stock_data_requires_ticker() {
        let (status, body) = send(router(test_state(&[])), get_req("/api/stock-data")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Ticker symbol is required");
    }

    #[tokio::test]
    async fn stock_data_without_client_is_a_server_error() {
        let state = AppState::new(None, SessionOptions::default(), Duration::from_secs(60));
        let (status, body) = send(router(state), get_req("/api/stock-data?ticker=AAPL")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "API key not configured");
    }

    #[tokio::test]
    async fn stock_data_returns_partial_results() {
        let app = router(test_state(&[Endpoint::Earnings]));
        let (status, body) = send(app, get_req("/api/stock-data?ticker=MSFT&interval=1week")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["price"]["symbol"], "MSFT");
        assert_eq!(body["timeSeries"]["interval"], "1week");
        assert!(body["earnings"].is_null());
        assert_eq!(body["errors"]["earnings"], "Too Many Requests");
    }

    #[tokio::test]
    async fn stock_data_total_failure_is_bad_gateway() {
        let app = router(test_state(&Endpoint::ALL));
        let (status, body) = send(app, get_req("/api/stock-data?ticker=MSFT")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["details"].as_object().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn attachment_intake_reports_rejections_and_encodes_queries() {
        let app = router(test_state(&[]));
        let req = json_req(
            "POST",
            "/api/attachments",
            json!({
                "files": [
                    { "name": "q3.pdf", "size_bytes": 1024 },
                    { "name": "notes.txt", "mime_type": "text/plain", "size_bytes": 10 },
                    { "name": "huge.png", "mime_type": "image/png", "size_bytes": 6 * 1024 * 1024 },
                ],
                "question": "What changed?"
            }),
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"].as_array().unwrap().len(), 1);
        assert_eq!(body["rejections"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["queries"][0],
            "Question about q3.pdf|application/pdf: What changed?"
        );
    }
}
