//! Loading the drill bank from TOML and validating authored questions.
//!
//! See `DrillBankConfig` and `DrillCfg` for the expected schema. Bank
//! entries that violate the structural invariants are skipped with an error
//! log; nothing is repaired silently.

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Drill, DrillSource, Question, QuestionPayload, WordEntry};
use crate::seeds::builtin_word_lists;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct DrillBankConfig {
  #[serde(default)]
  pub drills: Vec<DrillCfg>,
}

/// Drill entry accepted in TOML configuration. Words come either inline
/// (`words`) or by builtin list name (`word_list`); inline wins when both
/// are present.
#[derive(Clone, Debug, Deserialize)]
pub struct DrillCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub opens_at: Option<String>,
  #[serde(default)] pub due_at: Option<String>,
  #[serde(default)] pub word_list: Option<String>,
  #[serde(default)] pub words: Vec<WordEntry>,
  #[serde(default)] pub questions: Vec<Question>,
}

/// Attempt to load the drill bank from DRILL_CONFIG_PATH. On any
/// parsing/IO error, returns None.
pub fn load_drill_bank_from_env() -> Option<DrillBankConfig> {
  let path = std::env::var("DRILL_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<DrillBankConfig>(&s) {
      Ok(cfg) => {
        info!(target: "wordquest_backend", %path, "Loaded drill bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "wordquest_backend", %path, error = %e, "Failed to parse TOML drill bank");
        None
      }
    },
    Err(e) => {
      error!(target: "wordquest_backend", %path, error = %e, "Failed to read TOML drill bank file");
      None
    }
  }
}

/// Resolve a bank entry into a playable drill: attach its word list and
/// check every question against the structural invariants.
pub fn resolve_drill(cfg: DrillCfg) -> Result<Drill, String> {
  let words = if !cfg.words.is_empty() {
    cfg.words
  } else if let Some(name) = &cfg.word_list {
    builtin_word_lists()
      .get(name.as_str())
      .cloned()
      .ok_or_else(|| format!("unknown builtin word list '{name}'"))?
  } else {
    return Err("drill has neither inline words nor a word_list reference".into());
  };

  for q in &cfg.questions {
    validate_question(q, words.len()).map_err(|e| format!("question '{}': {e}", q.id))?;
  }

  Ok(Drill {
    id: cfg.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
    title: cfg.title,
    description: cfg.description,
    opens_at: cfg.opens_at,
    due_at: cfg.due_at,
    source: DrillSource::LocalBank,
    words,
    questions: cfg.questions,
  })
}

/// Structural invariants per question type. Play-time code is defensive
/// anyway, but authoring mistakes should fail loudly at load.
pub fn validate_question(q: &Question, word_count: usize) -> Result<(), String> {
  if q.word_index >= word_count {
    return Err(format!("word_index {} out of range (have {} words)", q.word_index, word_count));
  }
  match &q.payload {
    QuestionPayload::SmartSelect { choices, correct_index } => {
      if choices.is_empty() || choices.len() > 4 {
        return Err(format!("smart select needs 1..=4 choices, got {}", choices.len()));
      }
      if *correct_index >= choices.len() {
        return Err(format!("correct_index {} out of range", correct_index));
      }
      Ok(())
    }
    QuestionPayload::BlankBuster { pattern, answer, letter_pool, .. } => {
      let needed = blank_letters(pattern, answer)?;
      if needed.is_empty() {
        return Err("pattern has no blanks".into());
      }
      for letter in &needed {
        let required = needed.iter().filter(|c| c.eq_ignore_ascii_case(letter)).count();
        let available =
          letter_pool.iter().filter(|c| c.eq_ignore_ascii_case(letter)).count();
        if available < required {
          return Err(format!("letter pool is short of '{letter}' ({available} < {required})"));
        }
      }
      Ok(())
    }
    QuestionPayload::SentenceBuilder { drag_items, .. } => {
      let blanks = q.payload.blank_count();
      if blanks == 0 {
        return Err("sentence has no blanks".into());
      }
      if blanks != drag_items.len() {
        return Err(format!("{} blanks but {} drag items", blanks, drag_items.len()));
      }
      Ok(())
    }
    QuestionPayload::MemoryGame { cards } => {
      if cards.is_empty() || cards.len() % 2 != 0 {
        return Err(format!("memory game needs a non-empty even card count, got {}", cards.len()));
      }
      for card in cards {
        let partner = cards
          .iter()
          .find(|c| c.id == card.pair_id)
          .ok_or_else(|| format!("card '{}' points at missing partner '{}'", card.id, card.pair_id))?;
        if partner.id == card.id || partner.pair_id != card.id {
          return Err(format!("card '{}' is not mutually paired", card.id));
        }
      }
      Ok(())
    }
    QuestionPayload::PictureWord { pictures, answer } => {
      if pictures.len() != 4 {
        return Err(format!("picture word needs exactly 4 pictures, got {}", pictures.len()));
      }
      if answer.trim().is_empty() {
        return Err("picture word answer is empty".into());
      }
      Ok(())
    }
  }
}

/// Align the pattern with the target answer and return the letters the
/// learner must supply, one per blank. Errors on any misalignment.
pub fn blank_letters(pattern: &str, answer: &str) -> Result<Vec<char>, String> {
  let answer_chars: Vec<char> = answer.chars().collect();
  let mut blanks = Vec::new();
  let mut pos = 0usize;
  for token in pattern.split_whitespace() {
    if token == "_" {
      let c = answer_chars
        .get(pos)
        .ok_or_else(|| "pattern is longer than the answer".to_string())?;
      blanks.push(*c);
      pos += 1;
    } else {
      for fixed in token.chars() {
        let c = answer_chars
          .get(pos)
          .ok_or_else(|| "pattern is longer than the answer".to_string())?;
        if !fixed.eq_ignore_ascii_case(c) {
          return Err(format!("fixed letter '{fixed}' does not match the answer at position {pos}"));
        }
        pos += 1;
      }
    }
  }
  if pos != answer_chars.len() {
    return Err("pattern is shorter than the answer".into());
  }
  Ok(blanks)
}
