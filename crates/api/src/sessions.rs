//! Per-client history sessions. Each session owns a [`HistorySession`] and the
//! UI context that travels with it; deleting the session tears down pending work.
//! Sessions idle past the configured TTL are swept the same way.

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use finsearch_core::context::{ConfidenceLevel, FocusMode, ResultTab, SessionContext};
use finsearch_core::domain::allocation::PendingExpansion;
use finsearch_core::domain::entry::{EntryId, ResultEntry};
use finsearch_core::history::drilldown::{DrillDownError, DrillDownState};
use finsearch_core::history::session::HistorySession;
use finsearch_core::history::view::ViewState;
use finsearch_core::history::SubmitOutcome;
use finsearch_core::navigation::NavigationRequest;

use crate::AppState;

const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

pub(crate) struct ApiSession {
    pub(crate) history: HistorySession,
    context: Mutex<SessionContext>,
    last_access: Mutex<Instant>,
}

async fn lookup(state: &AppState, id: Uuid) -> Result<Arc<ApiSession>, StatusCode> {
    let session = state
        .sessions
        .lock()
        .await
        .get(&id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)?;
    *session.last_access.lock().await = Instant::now();
    Ok(session)
}

/// Removes sessions idle for longer than the TTL and shuts each one down.
pub(crate) async fn sweep_once(state: &AppState) -> usize {
    let now = Instant::now();
    let expired: Vec<(Uuid, Arc<ApiSession>)> = {
        let mut sessions = state.sessions.lock().await;
        let mut idle = Vec::new();
        for (id, session) in sessions.iter() {
            let last_access = *session.last_access.lock().await;
            if now.duration_since(last_access) > state.session_idle_ttl {
                idle.push(*id);
            }
        }
        idle.into_iter()
            .filter_map(|id| sessions.remove(&id).map(|s| (id, s)))
            .collect()
    };

    for (id, session) in &expired {
        session.history.shutdown().await;
        tracing::info!(session_id = %id, "idle session expired");
    }
    expired.len()
}

/// Runs [`sweep_once`] periodically until `shutdown` is cancelled.
pub(crate) async fn sweep_idle_sessions(state: AppState, shutdown: CancellationToken) {
    let period = state
        .session_idle_ttl
        .min(MAX_SWEEP_PERIOD)
        .max(Duration::from_secs(1));
    let mut tick = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!("session sweeper stopped");
                return;
            }
            _ = tick.tick() => {
                let expired = sweep_once(&state).await;
                if expired > 0 {
                    tracing::debug!(expired, "swept idle sessions");
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatedSession {
    session_id: Uuid,
}

pub(crate) async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreatedSession>) {
    let session_id = Uuid::new_v4();
    let session = ApiSession {
        history: HistorySession::new(state.session_options.clone()),
        context: Mutex::new(SessionContext::default()),
        last_access: Mutex::new(Instant::now()),
    };
    state
        .sessions
        .lock()
        .await
        .insert(session_id, Arc::new(session));

    tracing::info!(%session_id, "session created");
    (StatusCode::CREATED, Json(CreatedSession { session_id }))
}

pub(crate) async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    let Some(session) = state.sessions.lock().await.remove(&id) else {
        return StatusCode::NOT_FOUND;
    };
    session.history.shutdown().await;
    tracing::info!(session_id = %id, "session deleted");
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    query: String,
    #[serde(default)]
    focus: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitResponse {
    #[serde(flatten)]
    outcome: SubmitOutcome,
    results_url: String,
}

pub(crate) async fn submit_query(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), StatusCode> {
    let focus = req
        .focus
        .as_deref()
        .map(|label| FocusMode::from_label(label).ok_or(StatusCode::UNPROCESSABLE_ENTITY))
        .transpose()?;
    let nav = NavigationRequest::new(&req.query, focus).ok_or(StatusCode::BAD_REQUEST)?;

    let session = lookup(&state, id).await?;
    Ok(submit(&session, nav).await)
}

/// Same as `submit_query`, but driven by a results-view query string
/// (`?query=..&focus=..`).
pub(crate) async fn navigate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    RawQuery(raw): RawQuery,
) -> Result<(StatusCode, Json<SubmitResponse>), StatusCode> {
    let nav = NavigationRequest::parse(raw.as_deref().unwrap_or_default())
        .map_err(|e| {
            tracing::debug!(error = %e, "rejecting malformed navigation");
            StatusCode::BAD_REQUEST
        })?
        .ok_or(StatusCode::BAD_REQUEST)?;

    let session = lookup(&state, id).await?;
    Ok(submit(&session, nav).await)
}

async fn submit(session: &ApiSession, nav: NavigationRequest) -> (StatusCode, Json<SubmitResponse>) {
    if let Some(focus) = nav.focus {
        session.context.lock().await.set_focus_mode(focus);
    }

    let outcome = session.history.submit(&nav.query).await;
    let status = match outcome {
        SubmitOutcome::Started { .. } | SubmitOutcome::Restarted { .. } => StatusCode::ACCEPTED,
        SubmitOutcome::Duplicate => StatusCode::OK,
        SubmitOutcome::Closed => StatusCode::GONE,
    };

    (
        status,
        Json(SubmitResponse {
            outcome,
            results_url: nav.to_url(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub(crate) struct EntryView {
    #[serde(flatten)]
    entry: ResultEntry,
    anchor: String,
    active_tab: ResultTab,
}

pub(crate) async fn list_entries(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EntryView>>, StatusCode> {
    let session = lookup(&state, id).await?;
    let entries = session.history.current_entries().await;
    let context = session.context.lock().await;

    Ok(Json(
        entries
            .iter()
            .map(|entry| EntryView {
                anchor: entry.id().heading_anchor(),
                active_tab: context.active_tab(entry.id()),
                entry: ResultEntry::clone(entry),
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub(crate) struct ViewResponse {
    view: ViewState,
    in_flight: Option<String>,
    drilldown: DrillDownState,
}

pub(crate) async fn get_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ViewResponse>, StatusCode> {
    let session = lookup(&state, id).await?;
    Ok(Json(ViewResponse {
        view: session.history.view(),
        in_flight: session.history.in_flight().await,
        drilldown: session.history.drilldown(),
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TabSelection {
    entry_id: EntryId,
    tab: ResultTab,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContextUpdate {
    #[serde(default)]
    sidebar_collapsed: Option<bool>,
    #[serde(default)]
    toggle_sidebar: bool,
    #[serde(default)]
    confidence: Option<i64>,
    #[serde(default)]
    focus: Option<String>,
    #[serde(default)]
    active_tab: Option<TabSelection>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContextResponse {
    #[serde(flatten)]
    context: SessionContext,
    confidence_level: ConfidenceLevel,
}

pub(crate) async fn update_context(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ContextUpdate>,
) -> Result<Json<ContextResponse>, StatusCode> {
    let session = lookup(&state, id).await?;

    let focus = update
        .focus
        .as_deref()
        .map(|label| FocusMode::from_label(label).ok_or(StatusCode::UNPROCESSABLE_ENTITY))
        .transpose()?;
    if let Some(selection) = &update.active_tab {
        if session.history.entry(selection.entry_id).await.is_none() {
            return Err(StatusCode::NOT_FOUND);
        }
    }

    let mut context = session.context.lock().await;
    if let Some(collapsed) = update.sidebar_collapsed {
        context.set_sidebar_collapsed(collapsed);
    }
    if update.toggle_sidebar {
        context.toggle_sidebar();
    }
    if let Some(confidence) = update.confidence {
        context.set_confidence(confidence);
    }
    if let Some(focus) = focus {
        context.set_focus_mode(focus);
    }
    if let Some(selection) = update.active_tab {
        context.set_active_tab(selection.entry_id, selection.tab);
    }

    Ok(Json(ContextResponse {
        confidence_level: context.confidence_level(),
        context: context.clone(),
    }))
}

pub(crate) async fn expand_entry(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(Uuid, Uuid)>,
) -> Result<(StatusCode, Json<PendingExpansion>), StatusCode> {
    let session = lookup(&state, id).await?;
    let pending = session
        .history
        .expand_allocation(EntryId::from(entry_id))
        .await
        .map_err(|e| match e {
            DrillDownError::UnknownEntry { .. } => StatusCode::NOT_FOUND,
            DrillDownError::NoAllocation { .. } => StatusCode::CONFLICT,
            DrillDownError::Closed => StatusCode::GONE,
        })?;

    Ok((StatusCode::ACCEPTED, Json(pending)))
}
