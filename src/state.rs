//! Application state: in-memory drill and session stores, the finished-
//! attempt book, and the optional results-sink client.
//!
//! This module owns:
//!   - the drill store (by id, plus a stable listing order)
//!   - the live play sessions (by session id)
//!   - finished attempts (the local leaderboard fallback)
//!   - the optional results sink
//!
//! Drills come from the TOML bank (if configured) plus built-in seeds; a
//! hard fallback is injected only if both somehow leave the store empty.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_drill_bank_from_env, resolve_drill};
use crate::domain::{Drill, DrillSource, LeaderboardEntry};
use crate::flow::DrillSession;
use crate::results::ResultsSink;
use crate::seeds::{hard_fallback_drill, seed_drills};

#[derive(Clone)]
pub struct AppState {
    pub drills: Arc<RwLock<HashMap<String, Drill>>>,
    pub drill_order: Arc<RwLock<Vec<String>>>,
    pub sessions: Arc<RwLock<HashMap<String, DrillSession>>>,
    pub finished: Arc<RwLock<Vec<LeaderboardEntry>>>,
    pub results: Option<ResultsSink>,
}

impl AppState {
    /// Build state from env: load the bank, add seeds, build indices, init
    /// the results sink.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let mut drill_map = HashMap::<String, Drill>::new();
        let mut order = Vec::<String>::new();

        // Insert bank drills (if any); invalid entries are skipped loudly.
        if let Some(bank) = load_drill_bank_from_env() {
            for cfg in bank.drills {
                let title = cfg.title.clone();
                match resolve_drill(cfg) {
                    Ok(drill) => {
                        order.push(drill.id.clone());
                        drill_map.insert(drill.id.clone(), drill);
                    }
                    Err(e) => {
                        error!(target: "drill", %title, error = %e, "Skipping bank drill");
                    }
                }
            }
        }

        // Always insert built-in seeds, but don't overwrite existing ids.
        for d in seed_drills() {
            if !drill_map.contains_key(&d.id) {
                order.push(d.id.clone());
                drill_map.insert(d.id.clone(), d);
            }
        }

        // Inventory summary by source.
        let mut bank_count = 0usize;
        let mut seed_count = 0usize;
        for d in drill_map.values() {
            match d.source {
                DrillSource::LocalBank => bank_count += 1,
                DrillSource::Seed => seed_count += 1,
            }
        }
        info!(target: "drill", local_bank = bank_count, seed = seed_count, "Startup drill inventory");

        let results = ResultsSink::from_env();
        if let Some(rs) = &results {
            info!(target: "wordquest_backend", base_url = %rs.base_url, "Results sink enabled.");
        } else {
            info!(target: "wordquest_backend", "Results sink disabled (no RESULTS_API_URL). Keeping results in memory.");
        }

        Self {
            drills: Arc::new(RwLock::new(drill_map)),
            drill_order: Arc::new(RwLock::new(order)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            finished: Arc::new(RwLock::new(Vec::new())),
            results,
        }
    }

    /// Read-only access to a drill by id.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_drill(&self, id: &str) -> Option<Drill> {
        let drills = self.drills.read().await;
        drills.get(id).cloned()
    }

    /// Drills in stable listing order.
    pub async fn list_drills(&self) -> Vec<Drill> {
        let drills = self.drills.read().await;
        let order = self.drill_order.read().await;
        order.iter().filter_map(|id| drills.get(id).cloned()).collect()
    }

    /// The drill a session starts on when no id is given: first in listing
    /// order, or a hard fallback if the store is somehow empty.
    pub async fn default_drill(&self) -> Drill {
        if let Some(first) = {
            let order = self.drill_order.read().await;
            order.first().cloned()
        } {
            if let Some(drill) = self.get_drill(&first).await {
                return drill;
            }
        }
        let d = hard_fallback_drill();
        warn!(target: "drill", id = %d.id, "Drill store empty; inserted hard fallback drill");
        self.drills.write().await.insert(d.id.clone(), d.clone());
        self.drill_order.write().await.push(d.id.clone());
        d
    }

    /// Create and register a new play session for a drill.
    #[instrument(level = "info", skip(self, drill), fields(drill_id = %drill.id, %preview))]
    pub async fn create_session(&self, drill: Drill, player: String, preview: bool) -> DrillSession {
        let session = DrillSession::new(Uuid::new_v4().to_string(), drill, player, preview);
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        info!(target: "session", id = %session.id, player = %session.player, "Session created");
        session
    }

    /// Drop a session (exit); returns whether one was removed.
    pub async fn remove_session(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Record a finished attempt for the local leaderboard.
    pub async fn record_finished(&self, entry: LeaderboardEntry) {
        self.finished.write().await.push(entry);
    }

    /// Local ranking for one drill, best first.
    pub async fn local_leaderboard(&self, drill_id: &str) -> Vec<LeaderboardEntry> {
        let finished = self.finished.read().await;
        let mut entries: Vec<LeaderboardEntry> =
            finished.iter().filter(|e| e.drill_id == drill_id).cloned().collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }
}
