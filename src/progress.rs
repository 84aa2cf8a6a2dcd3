//! Per-question draft state and the cumulative progress books.
//!
//! The draft is the learner's in-flight answer for the active question:
//! slot assignments for the fill-in types, the flip state for the memory
//! game, a free-text buffer for picture-word. Slot assignment is a pure
//! reducer (`apply_slot_action`) over an immutable array; the draft methods
//! enforce the per-type input rules (tile availability caps, two-cards-up,
//! first-empty-blank fill order) and refuse to evaluate until the per-type
//! completeness rule holds.
//!
//! Cumulative accounting (attempts, seconds, points) lives in
//! `ProgressBook`, keyed by `(word_index, question_index)`. Moving to a new
//! question resets the draft but never the books.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::domain::{Question, QuestionPayload};
use crate::eval;

/// Outcome of the last submit on the active question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
  None,
  Correct,
  Wrong,
}

/// Tagged action vocabulary for slot assignment (reducer style).
#[derive(Clone, Copy, Debug)]
pub enum SlotAction {
  SetIndex { slot: usize, index: usize },
  RemoveIndex { slot: usize },
  ClearAll,
}

/// Pure transition over an immutable slot array. Out-of-range slots are
/// ignored, not errors.
pub fn apply_slot_action(slots: &[Option<usize>], action: SlotAction) -> Vec<Option<usize>> {
  let mut next = slots.to_vec();
  match action {
    SlotAction::SetIndex { slot, index } => {
      if let Some(s) = next.get_mut(slot) {
        *s = Some(index);
      }
    }
    SlotAction::RemoveIndex { slot } => {
      if let Some(s) = next.get_mut(slot) {
        *s = None;
      }
    }
    SlotAction::ClearAll => {
      for s in next.iter_mut() {
        *s = None;
      }
    }
  }
  next
}

/// One draggable token in the sentence-builder pool. `source` is the
/// position in the authored list (drag items first, then decoys), which
/// keeps duplicate texts individually trackable.
#[derive(Clone, Debug, Serialize)]
pub struct PoolToken {
  pub text: String,
  pub source: usize,
}

/// What a single card flip did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
  /// No-op: unknown id, already matched, already face-up, or wrong type.
  Ignored,
  /// First card of a pair turned face-up.
  FaceUp,
  /// Two cards matched and locked; more pairs remain.
  Matched,
  /// Two cards did not match; the wrong-pair counter advanced.
  Mismatch,
  /// The final pair matched; the question is resolved.
  Completed,
}

/// The learner's in-flight answer for the active question.
#[derive(Clone, Debug)]
pub enum QuestionDraft {
  SmartSelect {
    chosen: Option<usize>,
    /// Choice indices tried and judged wrong; rendered permanently red.
    wrong_choices: Vec<usize>,
  },
  BlankBuster {
    /// One entry per `_` in the pattern, holding a tile index.
    slots: Vec<Option<usize>>,
    tiles: Vec<char>,
  },
  SentenceBuilder {
    /// One entry per `_` in the sentence, holding a pool index.
    slots: Vec<Option<usize>>,
    pool: Vec<PoolToken>,
  },
  MemoryGame {
    /// Shuffled presentation order (indices into the card list).
    order: Vec<usize>,
    /// Currently face-up, unmatched card indices (at most two).
    face_up: Vec<usize>,
    /// Ids of matched, locked cards.
    matched: Vec<String>,
    wrong_pairs: u32,
  },
  PictureWord {
    text: String,
  },
}

impl QuestionDraft {
  /// Build the draft for a question, shuffling presentation order where
  /// the type calls for it (token pool, card grid).
  pub fn for_question(question: &Question) -> Self {
    let mut rng = rand::thread_rng();
    match &question.payload {
      QuestionPayload::SmartSelect { .. } => {
        QuestionDraft::SmartSelect { chosen: None, wrong_choices: Vec::new() }
      }
      QuestionPayload::BlankBuster { letter_pool, .. } => QuestionDraft::BlankBuster {
        slots: vec![None; question.payload.blank_count()],
        tiles: letter_pool.clone(),
      },
      QuestionPayload::SentenceBuilder { drag_items, incorrect_choices, .. } => {
        let mut pool: Vec<PoolToken> = drag_items
          .iter()
          .chain(incorrect_choices.iter())
          .enumerate()
          .map(|(source, text)| PoolToken { text: text.clone(), source })
          .collect();
        pool.shuffle(&mut rng);
        QuestionDraft::SentenceBuilder {
          slots: vec![None; question.payload.blank_count()],
          pool,
        }
      }
      QuestionPayload::MemoryGame { cards } => {
        let mut order: Vec<usize> = (0..cards.len()).collect();
        order.shuffle(&mut rng);
        QuestionDraft::MemoryGame {
          order,
          face_up: Vec::new(),
          matched: Vec::new(),
          wrong_pairs: 0,
        }
      }
      QuestionPayload::PictureWord { .. } => QuestionDraft::PictureWord { text: String::new() },
    }
  }

  /// Per-type completeness rule; evaluation is gated on this.
  /// A malformed question (no blanks, no cards) is never complete.
  pub fn is_complete(&self, payload: &QuestionPayload) -> bool {
    match self {
      QuestionDraft::SmartSelect { chosen, .. } => chosen.is_some(),
      QuestionDraft::BlankBuster { slots, .. }
      | QuestionDraft::SentenceBuilder { slots, .. } => {
        !slots.is_empty() && slots.iter().all(|s| s.is_some())
      }
      QuestionDraft::MemoryGame { matched, .. } => match payload {
        QuestionPayload::MemoryGame { cards } => {
          !cards.is_empty() && matched.len() == cards.len()
        }
        _ => false,
      },
      QuestionDraft::PictureWord { .. } => true,
    }
  }

  /// Judge the draft. `None` means the draft is incomplete and evaluation
  /// was not invoked; `Some(verdict)` is the evaluator's answer.
  pub fn validate(&self, payload: &QuestionPayload) -> Option<bool> {
    if !self.is_complete(payload) {
      return None;
    }
    match self {
      QuestionDraft::SmartSelect { chosen, .. } => {
        Some(eval::evaluate_smart_select(payload, (*chosen)?))
      }
      QuestionDraft::BlankBuster { slots, tiles } => {
        let letters: Option<Vec<char>> =
          slots.iter().map(|s| s.and_then(|i| tiles.get(i).copied())).collect();
        Some(eval::evaluate_blank_buster(payload, &letters?))
      }
      QuestionDraft::SentenceBuilder { slots, pool } => {
        let texts: Option<Vec<String>> = slots
          .iter()
          .map(|s| s.and_then(|i| pool.get(i).map(|t| t.text.clone())))
          .collect();
        Some(eval::evaluate_sentence_builder(payload, &texts?))
      }
      QuestionDraft::MemoryGame { matched, .. } => {
        Some(eval::evaluate_memory_game(payload, matched))
      }
      QuestionDraft::PictureWord { text } => Some(eval::evaluate_picture_word(payload, text)),
    }
  }

  /// Render the submitted answer for the results record.
  pub fn answer_text(&self, payload: &QuestionPayload) -> String {
    match (self, payload) {
      (QuestionDraft::SmartSelect { chosen, .. }, _) => {
        chosen.map(|i| format!("choice {i}")).unwrap_or_default()
      }
      (QuestionDraft::BlankBuster { slots, tiles }, QuestionPayload::BlankBuster { pattern, .. }) => {
        let mut fill = slots.iter().map(|s| s.and_then(|i| tiles.get(i).copied()));
        let mut out = String::new();
        for token in pattern.split_whitespace() {
          if token == "_" {
            out.push(fill.next().flatten().unwrap_or('_'));
          } else {
            out.push_str(token);
          }
        }
        out
      }
      (QuestionDraft::SentenceBuilder { slots, pool }, QuestionPayload::SentenceBuilder { sentence, .. }) => {
        let mut fill = slots.iter().map(|s| s.and_then(|i| pool.get(i).map(|t| t.text.clone())));
        let mut out = String::new();
        for ch in sentence.chars() {
          if ch == '_' {
            out.push_str(&fill.next().flatten().unwrap_or_else(|| "_".into()));
          } else {
            out.push(ch);
          }
        }
        out
      }
      (QuestionDraft::MemoryGame { matched, wrong_pairs, .. }, _) => {
        format!("matched {} cards, {} wrong pairs", matched.len(), wrong_pairs)
      }
      (QuestionDraft::PictureWord { text }, _) => text.clone(),
      _ => String::new(),
    }
  }

  // -------- Smart select --------

  /// Record a selection. Returns false if the input doesn't apply.
  pub fn select_choice(&mut self, index: usize) -> bool {
    match self {
      QuestionDraft::SmartSelect { chosen, .. } => {
        *chosen = Some(index);
        true
      }
      _ => false,
    }
  }

  /// Mark a judged-wrong choice permanently red and free the draft for the
  /// next selection.
  pub fn mark_wrong_choice(&mut self) {
    if let QuestionDraft::SmartSelect { chosen, wrong_choices } = self {
      if let Some(i) = chosen.take() {
        if !wrong_choices.contains(&i) {
          wrong_choices.push(i);
        }
      }
    }
  }

  // -------- Blank buster --------

  /// Place a tile into the first empty blank, left to right. A tile may be
  /// refused: already placed, unknown index, or its letter is at its usage
  /// cap (answer letters up to their multiplicity in the target, other
  /// letters once).
  pub fn place_tile(&mut self, payload: &QuestionPayload, tile: usize) -> bool {
    let (QuestionDraft::BlankBuster { slots, tiles }, QuestionPayload::BlankBuster { answer, .. }) =
      (&mut *self, payload)
    else {
      return false;
    };
    let Some(letter) = tiles.get(tile).copied() else {
      return false;
    };
    if slots.iter().any(|s| *s == Some(tile)) {
      return false;
    }
    let placed_same_letter = slots
      .iter()
      .flatten()
      .filter(|i| tiles.get(**i).map(|c| c.eq_ignore_ascii_case(&letter)).unwrap_or(false))
      .count();
    if placed_same_letter >= letter_cap(answer, letter) {
      return false;
    }
    let Some(first_empty) = slots.iter().position(|s| s.is_none()) else {
      return false;
    };
    *slots = apply_slot_action(slots, SlotAction::SetIndex { slot: first_empty, index: tile });
    true
  }

  /// Clear one filled blank, returning its tile to the pool.
  pub fn clear_slot(&mut self, slot: usize) -> bool {
    match self {
      QuestionDraft::BlankBuster { slots, .. } | QuestionDraft::SentenceBuilder { slots, .. } => {
        if slots.get(slot).copied().flatten().is_none() {
          return false;
        }
        *slots = apply_slot_action(slots, SlotAction::RemoveIndex { slot });
        true
      }
      _ => false,
    }
  }

  /// Empty every blank (the post-wrong auto-clear).
  pub fn clear_all_slots(&mut self) {
    if let QuestionDraft::BlankBuster { slots, .. } | QuestionDraft::SentenceBuilder { slots, .. } =
      self
    {
      *slots = apply_slot_action(slots, SlotAction::ClearAll);
    }
  }

  // -------- Sentence builder --------

  /// Drop a pool token into a specific blank. Refused if either index is
  /// unknown or the token already sits in another blank.
  pub fn place_token(&mut self, slot: usize, token: usize) -> bool {
    match self {
      QuestionDraft::SentenceBuilder { slots, pool } => {
        if slot >= slots.len() || token >= pool.len() {
          return false;
        }
        if slots.iter().any(|s| *s == Some(token)) {
          return false;
        }
        *slots = apply_slot_action(slots, SlotAction::SetIndex { slot, index: token });
        true
      }
      _ => false,
    }
  }

  // -------- Memory game --------

  /// Flip one card. At most two unmatched cards are ever face-up: a second
  /// flip resolves the pair immediately: matched pairs lock face-up,
  /// mismatches advance the wrong-pair counter and flip back (the client
  /// animates the delay).
  pub fn flip_card(&mut self, payload: &QuestionPayload, card_id: &str) -> FlipOutcome {
    let (
      QuestionDraft::MemoryGame { face_up, matched, wrong_pairs, .. },
      QuestionPayload::MemoryGame { cards },
    ) = (&mut *self, payload)
    else {
      return FlipOutcome::Ignored;
    };
    let Some(idx) = cards.iter().position(|c| c.id == card_id) else {
      return FlipOutcome::Ignored;
    };
    if matched.iter().any(|id| id == card_id) || face_up.contains(&idx) {
      return FlipOutcome::Ignored;
    }
    face_up.push(idx);
    if face_up.len() < 2 {
      return FlipOutcome::FaceUp;
    }
    let a = &cards[face_up[0]];
    let b = &cards[face_up[1]];
    let is_match = a.pair_id == b.id && b.pair_id == a.id;
    face_up.clear();
    if is_match {
      matched.push(a.id.clone());
      matched.push(b.id.clone());
      if matched.len() == cards.len() {
        FlipOutcome::Completed
      } else {
        FlipOutcome::Matched
      }
    } else {
      *wrong_pairs += 1;
      FlipOutcome::Mismatch
    }
  }

  // -------- Picture word --------

  pub fn set_text(&mut self, value: &str) -> bool {
    match self {
      QuestionDraft::PictureWord { text } => {
        *text = value.to_string();
        true
      }
      _ => false,
    }
  }
}

/// How many tiles of this letter may sit in blanks at once.
fn letter_cap(answer: &str, letter: char) -> usize {
  let in_answer = answer.chars().filter(|c| c.eq_ignore_ascii_case(&letter)).count();
  if in_answer == 0 { 1 } else { in_answer }
}

/// Cumulative per-question accounting for one attempt at a drill.
/// Keys are `(word_index, question_index)`. Entries only ever grow; moving
/// between questions or re-submitting never removes history.
#[derive(Clone, Debug, Default)]
pub struct ProgressBook {
  attempts: HashMap<(usize, usize), u32>,
  time_spent: HashMap<(usize, usize), u32>,
  points: HashMap<(usize, usize), u32>,
}

impl ProgressBook {
  pub fn add_wrong_attempt(&mut self, key: (usize, usize)) {
    *self.attempts.entry(key).or_insert(0) += 1;
  }

  pub fn add_second(&mut self, key: (usize, usize)) {
    *self.time_spent.entry(key).or_insert(0) += 1;
  }

  /// Record points exactly once; a second call for the same key is a no-op
  /// so a resolved question is never re-penalized.
  pub fn record_points(&mut self, key: (usize, usize), points: u32) {
    self.points.entry(key).or_insert(points);
  }

  pub fn wrong_attempts(&self, key: (usize, usize)) -> u32 {
    self.attempts.get(&key).copied().unwrap_or(0)
  }

  pub fn seconds(&self, key: (usize, usize)) -> u32 {
    self.time_spent.get(&key).copied().unwrap_or(0)
  }

  pub fn points_for(&self, key: (usize, usize)) -> Option<u32> {
    self.points.get(&key).copied()
  }

  pub fn total_points(&self) -> u32 {
    self.points.values().sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Card;

  fn blank_buster_question() -> Question {
    Question {
      id: "q-f".into(),
      word_index: 0,
      instruction: "Fill in the missing letters".into(),
      payload: QuestionPayload::BlankBuster {
        pattern: "B _ _ _ _ _ _ K".into(),
        answer: "BACKPACK".into(),
        letter_pool: vec!['A', 'C', 'K', 'P', 'A', 'C', 'E', 'T'],
        hint: Some("You wear it to school".into()),
      },
    }
  }

  fn memory_question() -> Question {
    Question {
      id: "q-g".into(),
      word_index: 0,
      instruction: "Match the pairs".into(),
      payload: QuestionPayload::MemoryGame {
        cards: vec![
          Card { id: "c1".into(), text: Some("backpack".into()), media: None, pair_id: "c2".into() },
          Card { id: "c2".into(), text: None, media: Some("backpack.png".into()), pair_id: "c1".into() },
          Card { id: "c3".into(), text: Some("back".into()), media: None, pair_id: "c4".into() },
          Card { id: "c4".into(), text: None, media: Some("back.png".into()), pair_id: "c3".into() },
        ],
      },
    }
  }

  #[test]
  fn slot_reducer_sets_removes_and_clears() {
    let slots = vec![None, None, None];
    let slots = apply_slot_action(&slots, SlotAction::SetIndex { slot: 1, index: 7 });
    assert_eq!(slots, vec![None, Some(7), None]);
    let slots = apply_slot_action(&slots, SlotAction::SetIndex { slot: 9, index: 0 });
    assert_eq!(slots, vec![None, Some(7), None], "out-of-range slot is a no-op");
    let slots = apply_slot_action(&slots, SlotAction::RemoveIndex { slot: 1 });
    assert_eq!(slots, vec![None, None, None]);
    let slots = apply_slot_action(
      &apply_slot_action(&slots, SlotAction::SetIndex { slot: 0, index: 1 }),
      SlotAction::ClearAll,
    );
    assert_eq!(slots, vec![None, None, None]);
  }

  #[test]
  fn tiles_fill_first_empty_blank_left_to_right() {
    let q = blank_buster_question();
    let mut draft = QuestionDraft::for_question(&q);
    assert!(draft.place_tile(&q.payload, 0)); // 'A'
    assert!(draft.place_tile(&q.payload, 1)); // 'C'
    let QuestionDraft::BlankBuster { slots, .. } = &draft else { panic!() };
    assert_eq!(slots[0], Some(0));
    assert_eq!(slots[1], Some(1));
    assert_eq!(slots[2], None);
  }

  #[test]
  fn a_tile_cannot_be_placed_twice() {
    let q = blank_buster_question();
    let mut draft = QuestionDraft::for_question(&q);
    assert!(draft.place_tile(&q.payload, 3)); // 'P'
    assert!(!draft.place_tile(&q.payload, 3));
  }

  #[test]
  fn answer_letters_are_capped_at_their_multiplicity() {
    // BACKPACK holds two As; the pool offers two A tiles, both usable,
    // but a third A (via re-placing) must be refused.
    let q = Question {
      payload: QuestionPayload::BlankBuster {
        pattern: "_ _ _".into(),
        answer: "ABA".into(),
        letter_pool: vec!['A', 'A', 'A', 'B'],
        hint: None,
      },
      ..blank_buster_question()
    };
    let mut draft = QuestionDraft::for_question(&q);
    assert!(draft.place_tile(&q.payload, 0));
    assert!(draft.place_tile(&q.payload, 1));
    assert!(!draft.place_tile(&q.payload, 2), "third A exceeds multiplicity 2");
    assert!(draft.place_tile(&q.payload, 3));
  }

  #[test]
  fn decoy_letters_are_usable_once() {
    // 'E' and 'T' are not in BACKPACK: one wrong guess each.
    let q = Question {
      payload: QuestionPayload::BlankBuster {
        pattern: "_ _ _".into(),
        answer: "CAT".into(),
        letter_pool: vec!['E', 'E', 'C', 'A', 'T'],
        hint: None,
      },
      ..blank_buster_question()
    };
    let mut draft = QuestionDraft::for_question(&q);
    assert!(draft.place_tile(&q.payload, 0));
    assert!(!draft.place_tile(&q.payload, 1), "second E exceeds the decoy cap");
  }

  #[test]
  fn clearing_a_slot_returns_the_tile() {
    let q = blank_buster_question();
    let mut draft = QuestionDraft::for_question(&q);
    assert!(draft.place_tile(&q.payload, 0));
    assert!(draft.clear_slot(0));
    assert!(!draft.clear_slot(0), "already empty");
    assert!(draft.place_tile(&q.payload, 0), "tile usable again after clear");
  }

  #[test]
  fn incomplete_draft_is_never_evaluated() {
    let q = blank_buster_question();
    let mut draft = QuestionDraft::for_question(&q);
    assert_eq!(draft.validate(&q.payload), None);
    for tile in [0, 1, 2, 3, 4, 5] {
      assert!(draft.place_tile(&q.payload, tile));
    }
    assert_eq!(draft.validate(&q.payload), Some(true));
  }

  #[test]
  fn duplicate_pool_texts_stay_individually_trackable() {
    let q = Question {
      id: "q-d".into(),
      word_index: 0,
      instruction: String::new(),
      payload: QuestionPayload::SentenceBuilder {
        sentence: "They walked _ and _.".into(),
        drag_items: vec!["on".into(), "on".into()],
        incorrect_choices: vec!["off".into()],
      },
    };
    let QuestionDraft::SentenceBuilder { pool, .. } = QuestionDraft::for_question(&q) else {
      panic!()
    };
    let mut sources: Vec<usize> = pool.iter().map(|t| t.source).collect();
    sources.sort_unstable();
    assert_eq!(sources, vec![0, 1, 2]);
    assert_eq!(pool.iter().filter(|t| t.text == "on").count(), 2);
  }

  #[test]
  fn a_placed_token_cannot_be_placed_again() {
    let q = Question {
      id: "q-d".into(),
      word_index: 0,
      instruction: String::new(),
      payload: QuestionPayload::SentenceBuilder {
        sentence: "A _ is worn on your _.".into(),
        drag_items: vec!["backpack".into(), "back".into()],
        incorrect_choices: vec![],
      },
    };
    let mut draft = QuestionDraft::for_question(&q);
    assert!(draft.place_token(0, 0));
    assert!(!draft.place_token(1, 0), "token already in a blank");
    assert!(draft.place_token(1, 1));
  }

  #[test]
  fn flip_sequence_counts_wrong_pairs_and_completes_once() {
    let q = memory_question();
    let mut draft = QuestionDraft::for_question(&q);
    // Mismatched pair, twice.
    assert_eq!(draft.flip_card(&q.payload, "c1"), FlipOutcome::FaceUp);
    assert_eq!(draft.flip_card(&q.payload, "c3"), FlipOutcome::Mismatch);
    assert_eq!(draft.flip_card(&q.payload, "c1"), FlipOutcome::FaceUp);
    assert_eq!(draft.flip_card(&q.payload, "c3"), FlipOutcome::Mismatch);
    // Then the two real pairs.
    assert_eq!(draft.flip_card(&q.payload, "c1"), FlipOutcome::FaceUp);
    assert_eq!(draft.flip_card(&q.payload, "c2"), FlipOutcome::Matched);
    assert_eq!(draft.flip_card(&q.payload, "c3"), FlipOutcome::FaceUp);
    assert_eq!(draft.flip_card(&q.payload, "c4"), FlipOutcome::Completed);

    let QuestionDraft::MemoryGame { matched, wrong_pairs, .. } = &draft else { panic!() };
    assert_eq!(*wrong_pairs, 2);
    assert_eq!(matched.len(), 4);
    assert_eq!(draft.validate(&q.payload), Some(true));
  }

  #[test]
  fn matched_and_face_up_cards_ignore_further_flips() {
    let q = memory_question();
    let mut draft = QuestionDraft::for_question(&q);
    assert_eq!(draft.flip_card(&q.payload, "c1"), FlipOutcome::FaceUp);
    assert_eq!(draft.flip_card(&q.payload, "c1"), FlipOutcome::Ignored);
    assert_eq!(draft.flip_card(&q.payload, "c2"), FlipOutcome::Matched);
    assert_eq!(draft.flip_card(&q.payload, "c1"), FlipOutcome::Ignored);
    assert_eq!(draft.flip_card(&q.payload, "nope"), FlipOutcome::Ignored);
  }

  #[test]
  fn book_records_points_once_and_sums() {
    let mut book = ProgressBook::default();
    book.add_wrong_attempt((0, 0));
    book.add_wrong_attempt((0, 0));
    book.add_second((0, 0));
    assert_eq!(book.wrong_attempts((0, 0)), 2);
    assert_eq!(book.seconds((0, 0)), 1);

    book.record_points((0, 0), 60);
    book.record_points((0, 0), 100);
    assert_eq!(book.points_for((0, 0)), Some(60), "points are never recomputed");
    book.record_points((1, 0), 78);
    assert_eq!(book.total_points(), 138);
  }
}
