//! HTTP API endpoints for inspecting running sessions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::types::{GroupId, ScoreLine, SessionPhase};
use crate::ws::ServerState;

/// Compact view of one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub group_id: GroupId,
    pub phase: SessionPhase,
    pub round_no: u32,
    pub player_count: usize,
    pub scores: Vec<ScoreLine>,
}

/// List all active sessions.
///
/// GET /api/sessions
pub async fn list_sessions(State(state): State<ServerState>) -> Json<Vec<SessionSummary>> {
    let mut summaries = Vec::new();
    for handle in state.app.all_sessions().await {
        let session = handle.session.read().await;
        summaries.push(SessionSummary {
            group_id: session.group_id.clone(),
            phase: session.phase,
            round_no: session.round_no,
            player_count: session.players.len(),
            scores: session.scoreboard(),
        });
    }
    summaries.sort_by(|a, b| a.group_id.cmp(&b.group_id));
    Json(summaries)
}

/// Full state of one session.
///
/// GET /api/sessions/{group_id}
pub async fn get_session(
    State(state): State<ServerState>,
    Path(group_id): Path<GroupId>,
) -> Response {
    match state.app.session_snapshot(&group_id).await {
        Some(session) => Json(session).into_response(),
        None => (StatusCode::NOT_FOUND, "No active game").into_response(),
    }
}
