//! Lesson progression: the multi-phase sequencer driving one play session.
//!
//! Phases run `GlobalIntro → (WordIntro → Definition → SignVideo →
//! Transition → QuestionLoop…) per word → Summary`. The session owns the
//! progress books, the active draft, and the scoring hook: points are
//! derived exactly once, when a question's status flips to correct.
//!
//! Time is advanced through the explicit `tick` contract (one call = one
//! second of the active question); the production driver is the play
//! channel's interval, tests call it directly.

use serde::Serialize;

use crate::domain::{Drill, LeaderboardEntry, Question, QuestionPayload};
use crate::progress::{AnswerStatus, FlipOutcome, ProgressBook, QuestionDraft};
use crate::score::compute_points;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonPhase {
  GlobalIntro,
  WordIntro,
  Definition,
  SignVideo,
  Transition,
  QuestionLoop,
  Summary,
}

/// What applying one learner input did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
  /// Draft changed; nothing was evaluated.
  Updated,
  /// Input did not apply (wrong phase, resolved question, unusable tile…).
  Ignored,
  /// Submit refused before evaluation (unfilled blanks); no attempt counted.
  Incomplete,
  /// A submit (or terminal flip) was evaluated.
  Judged { correct: bool, points_awarded: Option<u32>, wrong_attempts: u32 },
}

/// One student attempt at one drill, held in memory for the session's life.
#[derive(Clone, Debug)]
pub struct DrillSession {
  pub id: String,
  pub player: String,
  pub preview: bool,
  pub drill: Drill,
  pub phase: LessonPhase,
  pub word_index: usize,
  /// Within-word question index.
  pub question_index: usize,
  pub status: AnswerStatus,
  pub draft: Option<QuestionDraft>,
  pub book: ProgressBook,
}

impl DrillSession {
  pub fn new(id: String, drill: Drill, player: String, preview: bool) -> Self {
    Self {
      id,
      player,
      preview,
      drill,
      phase: LessonPhase::GlobalIntro,
      word_index: 0,
      question_index: 0,
      status: AnswerStatus::None,
      draft: None,
      book: ProgressBook::default(),
    }
  }

  pub fn key(&self) -> (usize, usize) {
    (self.word_index, self.question_index)
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.drill.question_for(self.word_index, self.question_index)
  }

  pub fn total_score(&self) -> u32 {
    self.book.total_points()
  }

  /// The row this attempt contributes to the local leaderboard.
  pub fn finished_entry(&self) -> LeaderboardEntry {
    LeaderboardEntry {
      drill_id: self.drill.id.clone(),
      player: self.player.clone(),
      score: self.total_score(),
    }
  }

  // -------- Phase transitions --------

  /// Next. In the question loop this only moves on once the question is
  /// resolved (or in teacher preview, which may skip unresolved questions).
  pub fn advance(&mut self) {
    match self.phase {
      LessonPhase::GlobalIntro => {
        if self.drill.words.is_empty() {
          self.phase = LessonPhase::Summary;
        } else {
          self.phase = LessonPhase::WordIntro;
        }
      }
      LessonPhase::WordIntro => self.phase = LessonPhase::Definition,
      LessonPhase::Definition => self.phase = LessonPhase::SignVideo,
      LessonPhase::SignVideo => self.phase = LessonPhase::Transition,
      LessonPhase::Transition => {
        if self.drill.question_count_for_word(self.word_index) > 0 {
          self.phase = LessonPhase::QuestionLoop;
          self.start_question();
        } else {
          self.next_word_or_summary();
        }
      }
      LessonPhase::QuestionLoop => {
        if self.status == AnswerStatus::Correct || self.preview {
          self.advance_question();
        }
      }
      LessonPhase::Summary => {}
    }
  }

  /// Back is a teaching-step affordance only: no retreat past the word
  /// intro, none inside the question loop, none out of the summary.
  pub fn back(&mut self) {
    self.phase = match self.phase {
      LessonPhase::Definition => LessonPhase::WordIntro,
      LessonPhase::SignVideo => LessonPhase::Definition,
      LessonPhase::Transition => LessonPhase::SignVideo,
      other => other,
    };
  }

  /// Fresh attempt: every counter cleared, back to the global intro.
  pub fn retake(&mut self) {
    self.phase = LessonPhase::GlobalIntro;
    self.word_index = 0;
    self.question_index = 0;
    self.status = AnswerStatus::None;
    self.draft = None;
    self.book = ProgressBook::default();
  }

  /// One second of wall clock for the active question. A no-op outside the
  /// question loop and once the question is resolved, so a leaked or early
  /// tick can never charge time to the wrong question.
  pub fn tick(&mut self) {
    if self.phase == LessonPhase::QuestionLoop && self.status != AnswerStatus::Correct {
      let key = self.key();
      self.book.add_second(key);
    }
  }

  fn advance_question(&mut self) {
    if self.question_index + 1 < self.drill.question_count_for_word(self.word_index) {
      self.question_index += 1;
      self.start_question();
    } else {
      self.next_word_or_summary();
    }
  }

  fn next_word_or_summary(&mut self) {
    self.draft = None;
    self.status = AnswerStatus::None;
    if self.word_index + 1 < self.drill.words.len() {
      self.word_index += 1;
      self.question_index = 0;
      self.phase = LessonPhase::WordIntro;
    } else {
      self.phase = LessonPhase::Summary;
    }
  }

  // Entering a question clears draft and status; the books keep history.
  fn start_question(&mut self) {
    self.draft = self.current_question().map(QuestionDraft::for_question);
    self.status = AnswerStatus::None;
  }

  // -------- Progress display --------

  pub fn total_steps(&self) -> usize {
    1 + 4 * self.drill.words.len() + self.drill.total_questions()
  }

  fn steps_before_word(&self, word: usize) -> usize {
    (0..word).map(|w| 4 + self.drill.question_count_for_word(w)).sum()
  }

  pub fn current_step(&self) -> usize {
    let base = 1 + self.steps_before_word(self.word_index);
    match self.phase {
      LessonPhase::GlobalIntro => 1,
      LessonPhase::WordIntro => base + 1,
      LessonPhase::Definition => base + 2,
      LessonPhase::SignVideo => base + 3,
      LessonPhase::Transition => base + 4,
      LessonPhase::QuestionLoop => base + 4 + self.question_index + 1,
      LessonPhase::Summary => self.total_steps(),
    }
  }

  /// Display value only; monotone non-decreasing going forward and exactly
  /// 100 at the summary.
  pub fn progress_percent(&self) -> f32 {
    let total = self.total_steps().max(1);
    self.current_step() as f32 * 100.0 / total as f32
  }

  // -------- Learner inputs (the five type protocols) --------

  /// Smart select: choosing is submitting. Wrong choices stay marked red;
  /// a resolved question ignores further selections.
  pub fn select_choice(&mut self, index: usize) -> SubmitOutcome {
    let Some(question) = self.accepting_question() else {
      return SubmitOutcome::Ignored;
    };
    let QuestionPayload::SmartSelect { choices, .. } = &question.payload else {
      return SubmitOutcome::Ignored;
    };
    if index >= choices.len() {
      return SubmitOutcome::Ignored;
    }
    let Some(draft) = self.draft.as_mut() else {
      return SubmitOutcome::Ignored;
    };
    if !draft.select_choice(index) {
      return SubmitOutcome::Ignored;
    }
    self.judge_submit(JudgeWrong::MarkChoice)
  }

  /// Blank buster: tiles fill the first empty blank left to right.
  pub fn place_tile(&mut self, tile: usize) -> SubmitOutcome {
    let Some(question) = self.accepting_question().cloned() else {
      return SubmitOutcome::Ignored;
    };
    let Some(draft) = self.draft.as_mut() else {
      return SubmitOutcome::Ignored;
    };
    if draft.place_tile(&question.payload, tile) {
      SubmitOutcome::Updated
    } else {
      SubmitOutcome::Ignored
    }
  }

  /// Clear one filled blank (blank buster or sentence builder).
  pub fn clear_slot(&mut self, slot: usize) -> SubmitOutcome {
    if self.accepting_question().is_none() {
      return SubmitOutcome::Ignored;
    }
    let Some(draft) = self.draft.as_mut() else {
      return SubmitOutcome::Ignored;
    };
    if draft.clear_slot(slot) { SubmitOutcome::Updated } else { SubmitOutcome::Ignored }
  }

  /// Blank buster's explicit Check. Refused (no attempt) until every blank
  /// is filled; a wrong check auto-clears the blanks for the retry.
  pub fn check_word(&mut self) -> SubmitOutcome {
    if self.accepting_question().is_none() {
      return SubmitOutcome::Ignored;
    }
    self.judge_submit(JudgeWrong::ClearSlots)
  }

  /// Sentence builder: dropping a token auto-submits once the last blank
  /// fills; a wrong completion clears the blanks back to the pool.
  pub fn place_token(&mut self, slot: usize, token: usize) -> SubmitOutcome {
    let Some(question) = self.accepting_question().cloned() else {
      return SubmitOutcome::Ignored;
    };
    let Some(draft) = self.draft.as_mut() else {
      return SubmitOutcome::Ignored;
    };
    if !draft.place_token(slot, token) {
      return SubmitOutcome::Ignored;
    }
    if draft.is_complete(&question.payload) {
      self.judge_submit(JudgeWrong::ClearSlots)
    } else {
      SubmitOutcome::Updated
    }
  }

  pub fn remove_token(&mut self, slot: usize) -> SubmitOutcome {
    self.clear_slot(slot)
  }

  /// Memory game: flips either update the board, count a wrong pair, or
  /// (on the final match) resolve the question exactly once.
  pub fn flip_card(&mut self, card_id: &str) -> SubmitOutcome {
    let Some(question) = self.accepting_question().cloned() else {
      return SubmitOutcome::Ignored;
    };
    let Some(draft) = self.draft.as_mut() else {
      return SubmitOutcome::Ignored;
    };
    match draft.flip_card(&question.payload, card_id) {
      FlipOutcome::Ignored => SubmitOutcome::Ignored,
      FlipOutcome::FaceUp => {
        // A fresh flip clears the transient wrong flash.
        self.status = AnswerStatus::None;
        SubmitOutcome::Updated
      }
      FlipOutcome::Matched => SubmitOutcome::Updated,
      FlipOutcome::Mismatch => {
        let key = self.key();
        self.book.add_wrong_attempt(key);
        self.status = AnswerStatus::Wrong;
        SubmitOutcome::Judged {
          correct: false,
          points_awarded: None,
          wrong_attempts: self.book.wrong_attempts(key),
        }
      }
      FlipOutcome::Completed => self.resolve_correct(),
    }
  }

  /// Four pics one word: explicit submit, wrong answers resubmittable.
  pub fn submit_text(&mut self, text: &str) -> SubmitOutcome {
    if self.accepting_question().is_none() {
      return SubmitOutcome::Ignored;
    }
    let Some(draft) = self.draft.as_mut() else {
      return SubmitOutcome::Ignored;
    };
    if !draft.set_text(text) {
      return SubmitOutcome::Ignored;
    }
    self.judge_submit(JudgeWrong::Keep)
  }

  // -------- Judging --------

  fn accepting_question(&self) -> Option<&Question> {
    if self.phase != LessonPhase::QuestionLoop || self.status == AnswerStatus::Correct {
      return None;
    }
    self.current_question()
  }

  fn judge_submit(&mut self, on_wrong: JudgeWrong) -> SubmitOutcome {
    let Some(question) = self.current_question().cloned() else {
      return SubmitOutcome::Ignored;
    };
    let verdict = match self.draft.as_ref() {
      Some(draft) => draft.validate(&question.payload),
      None => return SubmitOutcome::Ignored,
    };
    match verdict {
      None => SubmitOutcome::Incomplete,
      Some(true) => self.resolve_correct(),
      Some(false) => {
        let key = self.key();
        self.book.add_wrong_attempt(key);
        self.status = AnswerStatus::Wrong;
        if let Some(draft) = self.draft.as_mut() {
          match on_wrong {
            JudgeWrong::MarkChoice => draft.mark_wrong_choice(),
            JudgeWrong::ClearSlots => draft.clear_all_slots(),
            JudgeWrong::Keep => {}
          }
        }
        SubmitOutcome::Judged {
          correct: false,
          points_awarded: None,
          wrong_attempts: self.book.wrong_attempts(key),
        }
      }
    }
  }

  fn resolve_correct(&mut self) -> SubmitOutcome {
    let key = self.key();
    let wrong = self.book.wrong_attempts(key);
    let points = compute_points(wrong, self.book.seconds(key));
    self.book.record_points(key, points);
    self.status = AnswerStatus::Correct;
    SubmitOutcome::Judged {
      correct: true,
      points_awarded: self.book.points_for(key),
      wrong_attempts: wrong,
    }
  }
}

/// Post-wrong cleanup per submit style.
#[derive(Clone, Copy)]
enum JudgeWrong {
  MarkChoice,
  ClearSlots,
  Keep,
}
