//! Domain models: drills, word entries, questions, and the question payload union.

use serde::{Deserialize, Serialize};

/// Where did we get the drill from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DrillSource {
  LocalBank,   // from user-provided TOML bank
  Seed,  // built-in seeds (last resort)
}

/// One teachable vocabulary word. Media fields are opaque references
/// (URLs or static paths); the backend never fetches them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WordEntry {
  pub word: String,
  pub definition: String,
  #[serde(default)] pub image: Option<String>,
  #[serde(default)] pub sign_video: Option<String>,
}

/// One choice in a smart-select question. Text and/or media.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Choice {
  #[serde(default)] pub text: Option<String>,
  #[serde(default)] pub media: Option<String>,
}

/// One card in a memory game. `pair_id` names its mutual match partner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
  pub id: String,
  #[serde(default)] pub text: Option<String>,
  #[serde(default)] pub media: Option<String>,
  pub pair_id: String,
}

/// Type-specific question payload. The tag doubles as the config/wire
/// discriminant, so a bank entry reads `kind = "blank_buster"` etc.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionPayload {
  SmartSelect {
    #[serde(default)] choices: Vec<Choice>,
    correct_index: usize,
  },
  BlankBuster {
    /// Space-separated tokens; `_` marks a blank cell.
    pattern: String,
    answer: String,
    #[serde(default)] letter_pool: Vec<char>,
    #[serde(default)] hint: Option<String>,
  },
  SentenceBuilder {
    /// Sentence with `_` placeholders, filled left-to-right.
    sentence: String,
    #[serde(default)] drag_items: Vec<String>,
    #[serde(default)] incorrect_choices: Vec<String>,
  },
  MemoryGame {
    #[serde(default)] cards: Vec<Card>,
  },
  PictureWord {
    #[serde(default)] pictures: Vec<String>,
    answer: String,
  },
}

impl QuestionPayload {
  /// One-character shorthand for logs.
  pub fn kind_code(&self) -> char {
    match self {
      QuestionPayload::SmartSelect { .. } => 'M',
      QuestionPayload::BlankBuster { .. } => 'F',
      QuestionPayload::SentenceBuilder { .. } => 'D',
      QuestionPayload::MemoryGame { .. } => 'G',
      QuestionPayload::PictureWord { .. } => 'P',
    }
  }

  /// Number of fillable slots for the slot-based types; 0 for the rest.
  pub fn blank_count(&self) -> usize {
    match self {
      QuestionPayload::BlankBuster { pattern, .. } => {
        pattern.split_whitespace().filter(|t| *t == "_").count()
      }
      QuestionPayload::SentenceBuilder { sentence, .. } => {
        sentence.chars().filter(|c| *c == '_').count()
      }
      _ => 0,
    }
  }
}

/// One question inside a drill, bound to a word by index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  #[serde(default)] pub word_index: usize,
  #[serde(default)] pub instruction: String,
  #[serde(flatten)] pub payload: QuestionPayload,
}

/// A teacher-authored drill, immutable during play.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Drill {
  pub id: String,
  pub title: String,
  #[serde(default)] pub description: String,
  // Display-only scheduling metadata (RFC 3339 strings).
  #[serde(default)] pub opens_at: Option<String>,
  #[serde(default)] pub due_at: Option<String>,
  pub source: DrillSource,
  pub words: Vec<WordEntry>,
  pub questions: Vec<Question>,
}

impl Drill {
  pub fn total_questions(&self) -> usize {
    self.questions.len()
  }

  /// Questions of one word group, in authored order.
  pub fn question_count_for_word(&self, word_index: usize) -> usize {
    self.questions.iter().filter(|q| q.word_index == word_index).count()
  }

  /// The n-th question of a word group (n is the within-word index).
  pub fn question_for(&self, word_index: usize, question_index: usize) -> Option<&Question> {
    self
      .questions
      .iter()
      .filter(|q| q.word_index == word_index)
      .nth(question_index)
  }
}

/// One ranked leaderboard row. Also the shape we keep for finished
/// in-memory attempts when no external leaderboard source is configured.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
  #[serde(default)] pub drill_id: String,
  pub player: String,
  pub score: u32,
}
