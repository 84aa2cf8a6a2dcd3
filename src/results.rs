//! Best-effort HTTP client for the results sink and the leaderboard source.
//!
//! Correctness is decided locally before anything is sent, so these calls
//! are telemetry: failures are logged and never alter the play flow, and
//! there is no retry. The API token is never logged.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::LeaderboardEntry;
use crate::util::trunc_for_log;

/// One resolved question, as reported to the sink.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
  pub session_id: String,
  pub drill_id: String,
  pub question_id: String,
  pub answer: String,
  pub time_taken: u32,
  pub wrong_attempts: u32,
  pub points: u32,
}

#[derive(Clone)]
pub struct ResultsSink {
  pub client: reqwest::Client,
  pub base_url: String,
  api_token: Option<String>,
}

impl ResultsSink {
  /// Construct the client if we find RESULTS_API_URL; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("RESULTS_API_URL").ok()?;
    let api_token = std::env::var("RESULTS_API_TOKEN").ok();

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .ok()?;

    Some(Self { client, base_url, api_token })
  }

  /// POST one answer record. Fire-and-forget at the call sites; the error
  /// only reaches a log line.
  #[instrument(level = "info", skip(self, record), fields(question = %record.question_id))]
  pub async fn submit_result(&self, record: &AnswerRecord) -> Result<(), String> {
    let url = format!("{}/answers", self.base_url);
    let mut req = self
      .client
      .post(&url)
      .header(USER_AGENT, "wordquest-backend/0.1")
      .header(CONTENT_TYPE, "application/json");
    if let Some(token) = &self.api_token {
      req = req.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let res = req.json(record).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("results sink HTTP {}: {}", status, trunc_for_log(&body, 200)));
    }
    info!(target: "session", "answer record delivered");
    Ok(())
  }

  /// GET the ranked entries for one drill.
  #[instrument(level = "info", skip(self), fields(%drill_id))]
  pub async fn fetch_leaderboard(&self, drill_id: &str) -> Result<Vec<LeaderboardEntry>, String> {
    let url = format!("{}/leaderboard", self.base_url);
    let mut req = self
      .client
      .get(&url)
      .query(&[("drillId", drill_id)])
      .header(USER_AGENT, "wordquest-backend/0.1");
    if let Some(token) = &self.api_token {
      req = req.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let res = req.send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(format!("leaderboard HTTP {}: {}", status, trunc_for_log(&body, 200)));
    }
    res.json::<Vec<LeaderboardEntry>>().await.map_err(|e| e.to_string())
  }
}
