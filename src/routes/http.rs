//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; unknown ids come back as an error body, not
//! a panic or a bare status code.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::{IntoResponse, Response}};
use tracing::{info, instrument};

use crate::logic::*;
use crate::protocol::*;
use crate::state::AppState;

fn ok_or_error<T: serde::Serialize>(result: Result<T, String>) -> Response {
  match result {
    Ok(out) => Json(out).into_response(),
    Err(message) => Json(ErrorOut { message }).into_response(),
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_drills(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let drills = state.list_drills().await;
  info!(target: "drill", count = drills.len(), "HTTP drill list served");
  Json(drills.iter().map(drill_summary_out).collect::<Vec<_>>())
}

#[instrument(level = "info", skip(state), fields(%q.drill_id))]
pub async fn http_get_drill(
  State(state): State<Arc<AppState>>,
  Query(q): Query<DrillQuery>,
) -> Response {
  let result = state
    .get_drill(&q.drill_id)
    .await
    .map(|d| drill_detail_out(&d))
    .ok_or_else(|| format!("Unknown drillId: {}", q.drill_id));
  ok_or_error(result)
}

#[instrument(level = "info", skip(state, body), fields(preview = body.preview))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartSessionIn>,
) -> Response {
  let result = start_session(&state, body.drill_id.as_deref(), body.player, body.preview).await;
  ok_or_error(result)
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_session_next(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionActionIn>,
) -> Response {
  ok_or_error(session_next(&state, &body.session_id).await)
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_session_back(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionActionIn>,
) -> Response {
  ok_or_error(session_back(&state, &body.session_id).await)
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_session_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerActionIn>,
) -> Response {
  ok_or_error(session_answer(&state, &body.session_id, body.input).await)
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_session_retake(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionActionIn>,
) -> Response {
  ok_or_error(session_retake(&state, &body.session_id).await)
}

#[instrument(level = "info", skip(state, body), fields(%body.session_id))]
pub async fn http_session_exit(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionActionIn>,
) -> impl IntoResponse {
  let ok = session_exit(&state, &body.session_id).await;
  Json(ExitOut { ok })
}

#[instrument(level = "info", skip(state), fields(%q.drill_id))]
pub async fn http_leaderboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LeaderboardQuery>,
) -> impl IntoResponse {
  let entries = leaderboard(&state, &q.drill_id).await;
  info!(target: "session", drill = %q.drill_id, count = entries.len(), "HTTP leaderboard served");
  Json(LeaderboardOut { entries })
}
