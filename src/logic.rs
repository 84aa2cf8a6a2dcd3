//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting, advancing, and abandoning play sessions
//!   - Applying learner inputs and reporting the judged outcome
//!   - Fire-and-forget result submission on each resolved question
//!   - Leaderboard lookup (external source, local fallback)
//!   - The once-per-second tick applied by the play channel

use tracing::{debug, error, info, instrument};

use crate::domain::LeaderboardEntry;
use crate::flow::{DrillSession, LessonPhase, SubmitOutcome};
use crate::protocol::{
  outcome_out, to_session_out, AnswerInput, AnswerStepOut, SessionOut,
};
use crate::results::AnswerRecord;
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state, player), fields(preview = %preview))]
pub async fn start_session(
  state: &AppState,
  drill_id: Option<&str>,
  player: Option<String>,
  preview: bool,
) -> Result<SessionOut, String> {
  let drill = match drill_id {
    Some(id) => state
      .get_drill(id)
      .await
      .ok_or_else(|| format!("Unknown drillId: {id}"))?,
    None => state.default_drill().await,
  };
  let player = player
    .map(|p| p.trim().to_string())
    .filter(|p| !p.is_empty())
    .unwrap_or_else(|| "anonymous".into());
  let session = state.create_session(drill, player, preview).await;
  Ok(to_session_out(&session))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn session_next(state: &AppState, session_id: &str) -> Result<SessionOut, String> {
  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| format!("Unknown sessionId: {session_id}"))?;
  let was_summary = s.phase == LessonPhase::Summary;
  s.advance();
  if s.phase == LessonPhase::Summary && !was_summary {
    let entry = s.finished_entry();
    info!(target: "session", id = %s.id, player = %entry.player, score = entry.score, "Drill finished");
    state.record_finished(entry).await;
  }
  Ok(to_session_out(s))
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn session_back(state: &AppState, session_id: &str) -> Result<SessionOut, String> {
  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| format!("Unknown sessionId: {session_id}"))?;
  s.back();
  Ok(to_session_out(s))
}

#[instrument(level = "info", skip(state, input), fields(%session_id))]
pub async fn session_answer(
  state: &AppState,
  session_id: &str,
  input: AnswerInput,
) -> Result<AnswerStepOut, String> {
  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| format!("Unknown sessionId: {session_id}"))?;

  let outcome = match input {
    AnswerInput::SelectChoice { index } => s.select_choice(index),
    AnswerInput::PlaceTile { tile } => s.place_tile(tile),
    AnswerInput::ClearSlot { slot } => s.clear_slot(slot),
    AnswerInput::CheckWord => s.check_word(),
    AnswerInput::PlaceToken { slot, token } => s.place_token(slot, token),
    AnswerInput::RemoveToken { slot } => s.remove_token(slot),
    AnswerInput::FlipCard { card_id } => s.flip_card(&card_id),
    AnswerInput::SubmitText { text } => s.submit_text(&text),
  };

  if let SubmitOutcome::Judged { correct, points_awarded, wrong_attempts } = outcome {
    let kind = s.current_question().map(|q| q.payload.kind_code()).unwrap_or('?');
    info!(
      target: "session",
      id = %s.id,
      kind = %kind,
      %correct,
      wrong_attempts,
      points = points_awarded.unwrap_or(0),
      "Answer judged"
    );
    if correct {
      submit_result_fire_and_forget(state, s, points_awarded.unwrap_or(0), wrong_attempts);
    }
  } else {
    debug!(target: "session", id = %s.id, ?outcome, "Draft updated");
  }

  Ok(AnswerStepOut { outcome: outcome_out(outcome), session: to_session_out(s) })
}

#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn session_retake(state: &AppState, session_id: &str) -> Result<SessionOut, String> {
  let mut sessions = state.sessions.write().await;
  let s = sessions
    .get_mut(session_id)
    .ok_or_else(|| format!("Unknown sessionId: {session_id}"))?;
  s.retake();
  info!(target: "session", id = %s.id, "Session reset for retake");
  Ok(to_session_out(s))
}

/// Exit abandons the in-memory attempt; result records already sent stand.
#[instrument(level = "info", skip(state), fields(%session_id))]
pub async fn session_exit(state: &AppState, session_id: &str) -> bool {
  let removed = state.remove_session(session_id).await;
  info!(target: "session", id = %session_id, %removed, "Session exited");
  removed
}

/// Ranked entries for the summary screen: the external source when
/// configured, otherwise the local in-memory ranking.
#[instrument(level = "info", skip(state), fields(%drill_id))]
pub async fn leaderboard(state: &AppState, drill_id: &str) -> Vec<LeaderboardEntry> {
  if let Some(sink) = &state.results {
    match sink.fetch_leaderboard(drill_id).await {
      Ok(entries) => return entries,
      Err(e) => {
        error!(target: "session", %drill_id, error = %e, "Leaderboard fetch failed; using local ranking.");
      }
    }
  }
  state.local_leaderboard(drill_id).await
}

/// One second of wall clock for a session's active question. Driven by the
/// play channel's interval; a no-op for unknown sessions and outside the
/// question loop.
pub async fn tick_session(state: &AppState, session_id: &str) {
  let mut sessions = state.sessions.write().await;
  if let Some(s) = sessions.get_mut(session_id) {
    s.tick();
  }
}

/// Best-effort telemetry: the record is spawned off and any failure only
/// reaches a log line.
fn submit_result_fire_and_forget(
  state: &AppState,
  s: &DrillSession,
  points: u32,
  wrong_attempts: u32,
) {
  let Some(sink) = state.results.clone() else {
    return;
  };
  let Some(question) = s.current_question() else {
    return;
  };
  let answer = s
    .draft
    .as_ref()
    .map(|d| d.answer_text(&question.payload))
    .unwrap_or_default();
  let record = AnswerRecord {
    session_id: s.id.clone(),
    drill_id: s.drill.id.clone(),
    question_id: question.id.clone(),
    answer: trunc_for_log(&answer, 200),
    time_taken: s.book.seconds(s.key()),
    wrong_attempts,
    points,
  };
  tokio::spawn(async move {
    if let Err(e) = sink.submit_result(&record).await {
      error!(target: "session", error = %e, "Result submission failed; continuing without retry.");
    }
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flow::LessonPhase;
  use crate::progress::AnswerStatus;
  use crate::protocol::AnswerOutcomeOut;

  async fn started(state: &AppState) -> String {
    let out = start_session(state, Some("seed-back-to-school"), Some("ada".into()), false)
      .await
      .expect("start");
    out.id
  }

  async fn answer(state: &AppState, id: &str, input: AnswerInput) -> AnswerStepOut {
    session_answer(state, id, input).await.expect("answer")
  }

  #[tokio::test]
  async fn full_session_over_the_seed_drill() {
    let state = AppState::new();
    let id = started(&state).await;

    // Teaching steps for word 0.
    for _ in 0..5 {
      session_next(&state, &id).await.expect("next");
    }
    let snap = session_next(&state, &id).await.expect("snapshot");
    assert_eq!(snap.phase, LessonPhase::QuestionLoop, "unresolved question holds the loop");

    // bts-select: wrong then right.
    let step = answer(&state, &id, AnswerInput::SelectChoice { index: 1 }).await;
    assert!(matches!(
      step.outcome,
      AnswerOutcomeOut::Judged { correct: false, wrong_attempts: 1, .. }
    ));
    assert_eq!(step.session.answer_status, AnswerStatus::Wrong);
    let step = answer(&state, &id, AnswerInput::SelectChoice { index: 0 }).await;
    assert!(matches!(step.outcome, AnswerOutcomeOut::Judged { correct: true, .. }));
    assert_eq!(step.session.score, 80, "one wrong attempt costs 20 points");
    session_next(&state, &id).await.expect("next");

    // bts-spell: checking early is refused, then a clean solve pays 100.
    let step = answer(&state, &id, AnswerInput::CheckWord).await;
    assert!(matches!(step.outcome, AnswerOutcomeOut::Incomplete));
    for tile in [0usize, 1, 2, 3, 4, 5] {
      let step = answer(&state, &id, AnswerInput::PlaceTile { tile }).await;
      assert!(matches!(step.outcome, AnswerOutcomeOut::Updated));
    }
    let step = answer(&state, &id, AnswerInput::CheckWord).await;
    assert!(matches!(
      step.outcome,
      AnswerOutcomeOut::Judged { correct: true, points_awarded: Some(100), .. }
    ));
    session_next(&state, &id).await.expect("next");

    // bts-sentence: read the shuffled pool from the snapshot, fill in order.
    let snap = session_back(&state, &id).await.expect("snapshot");
    let pool = match snap.question.expect("question").view {
      crate::protocol::QuestionViewOut::SentenceBuilder { pool, .. } => pool,
      other => panic!("unexpected view: {other:?}"),
    };
    let backpack = pool.iter().position(|t| t == "backpack").expect("backpack");
    let back = pool.iter().position(|t| t == "back").expect("back");
    answer(&state, &id, AnswerInput::PlaceToken { slot: 0, token: backpack }).await;
    let step = answer(&state, &id, AnswerInput::PlaceToken { slot: 1, token: back }).await;
    assert!(matches!(step.outcome, AnswerOutcomeOut::Judged { correct: true, .. }));
    session_next(&state, &id).await.expect("next");

    // Teaching steps for word 1, then the memory game.
    for _ in 0..4 {
      session_next(&state, &id).await.expect("next");
    }
    for card in ["bts-card-1", "bts-card-2", "bts-card-3"] {
      answer(&state, &id, AnswerInput::FlipCard { card_id: card.into() }).await;
    }
    let step = answer(&state, &id, AnswerInput::FlipCard { card_id: "bts-card-4".into() }).await;
    assert!(matches!(
      step.outcome,
      AnswerOutcomeOut::Judged { correct: true, points_awarded: Some(100), .. }
    ));
    session_next(&state, &id).await.expect("next");

    // bts-pictures, then the summary.
    let step = answer(&state, &id, AnswerInput::SubmitText { text: "pencil".into() }).await;
    assert!(matches!(step.outcome, AnswerOutcomeOut::Judged { correct: true, .. }));
    let snap = session_next(&state, &id).await.expect("next");
    assert_eq!(snap.phase, LessonPhase::Summary);
    assert_eq!(snap.progress_percent, 100.0);
    assert_eq!(snap.score, 480);

    // The finished attempt feeds the local leaderboard.
    let entries = leaderboard(&state, "seed-back-to-school").await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].player, "ada");
    assert_eq!(entries[0].score, 480);
  }

  #[tokio::test]
  async fn unknown_ids_error_without_panicking() {
    let state = AppState::new();
    assert!(start_session(&state, Some("nope"), None, false).await.is_err());
    assert!(session_next(&state, "nope").await.is_err());
    assert!(
      session_answer(&state, "nope", AnswerInput::CheckWord).await.is_err()
    );
    assert!(!session_exit(&state, "nope").await);
  }

  #[tokio::test]
  async fn ticks_only_charge_the_active_question() {
    let state = AppState::new();
    let id = started(&state).await;
    tick_session(&state, &id).await;
    for _ in 0..5 {
      session_next(&state, &id).await.expect("next");
    }
    for _ in 0..12 {
      tick_session(&state, &id).await;
    }
    let step = answer(&state, &id, AnswerInput::SelectChoice { index: 0 }).await;
    // 0 wrong attempts, 12 s elapsed: 100 - 2.
    assert!(matches!(
      step.outcome,
      AnswerOutcomeOut::Judged { correct: true, points_awarded: Some(98), .. }
    ));
  }

  #[tokio::test]
  async fn exit_discards_the_attempt() {
    let state = AppState::new();
    let id = started(&state).await;
    assert!(session_exit(&state, &id).await);
    assert!(session_next(&state, &id).await.is_err());
    assert!(leaderboard(&state, "seed-back-to-school").await.is_empty());
  }

  #[tokio::test]
  async fn retake_starts_a_fresh_attempt() {
    let state = AppState::new();
    let id = started(&state).await;
    for _ in 0..5 {
      session_next(&state, &id).await.expect("next");
    }
    answer(&state, &id, AnswerInput::SelectChoice { index: 0 }).await;
    let snap = session_retake(&state, &id).await.expect("retake");
    assert_eq!(snap.phase, LessonPhase::GlobalIntro);
    assert_eq!(snap.score, 0);
  }

  #[tokio::test]
  async fn starting_without_an_id_serves_the_first_drill() {
    let state = AppState::new();
    let out = start_session(&state, None, None, true).await.expect("start");
    assert_eq!(out.drill_id, "seed-back-to-school");
    assert_eq!(out.player, "anonymous");
    assert!(out.preview);
  }
}
