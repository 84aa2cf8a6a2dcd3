//! Pure correctness judgments, one per question type.
//!
//! Evaluators never panic and never touch state; incomplete drafts are the
//! caller's problem (the draft layer refuses to invoke evaluation until the
//! per-type completeness rule holds). Each evaluator takes the question
//! payload plus the normalized submitted value and returns a plain bool.

use crate::domain::QuestionPayload;
use crate::util::normalize_answer;

/// Smart select: index equality against the authored correct choice.
pub fn evaluate_smart_select(payload: &QuestionPayload, selected: usize) -> bool {
  match payload {
    QuestionPayload::SmartSelect { correct_index, .. } => selected == *correct_index,
    _ => false,
  }
}

/// Blank buster: rebuild the candidate word from the pattern (fixed tokens
/// verbatim, one filled letter per `_`) and compare case-insensitively.
/// Callers must only pass a fully-filled letter list; a short list is
/// incorrect by construction, never an error.
pub fn evaluate_blank_buster(payload: &QuestionPayload, filled_letters: &[char]) -> bool {
  match payload {
    QuestionPayload::BlankBuster { pattern, answer, .. } => {
      let mut fill = filled_letters.iter();
      let mut candidate = String::new();
      for token in pattern.split_whitespace() {
        if token == "_" {
          match fill.next() {
            Some(c) => candidate.push(*c),
            None => return false,
          }
        } else {
          candidate.push_str(token);
        }
      }
      normalize_answer(&candidate) == normalize_answer(answer)
    }
    _ => false,
  }
}

/// Sentence builder: correctness is *sentence equality*, not per-slot token
/// identity. The chosen texts and the authored `drag_items` are each
/// substituted into the sentence in order and the two rendered strings are
/// compared trimmed, case-insensitively. Two same-text tokens swapped across
/// slots therefore still pass; that quirk is intentional and kept.
pub fn evaluate_sentence_builder(payload: &QuestionPayload, chosen_texts: &[String]) -> bool {
  match payload {
    QuestionPayload::SentenceBuilder { sentence, drag_items, .. } => {
      if chosen_texts.len() != payload.blank_count() || drag_items.len() != payload.blank_count() {
        return false;
      }
      let submitted = fill_sentence(sentence, chosen_texts);
      let canonical = fill_sentence(sentence, drag_items);
      normalize_answer(&submitted) == normalize_answer(&canonical)
    }
    _ => false,
  }
}

/// Memory game: self-validating. Completion (every card matched) is the only
/// terminal signal; wrong pairs are a side channel counted by the flip state.
pub fn evaluate_memory_game(payload: &QuestionPayload, matched_card_ids: &[String]) -> bool {
  match payload {
    QuestionPayload::MemoryGame { cards } => {
      !cards.is_empty() && matched_card_ids.len() == cards.len()
    }
    _ => false,
  }
}

/// Four pics one word: trimmed, case-insensitive free-text equality.
pub fn evaluate_picture_word(payload: &QuestionPayload, free_text: &str) -> bool {
  match payload {
    QuestionPayload::PictureWord { answer, .. } => {
      normalize_answer(free_text) == normalize_answer(answer)
    }
    _ => false,
  }
}

/// Substitute each `_` placeholder, in order, with the next fill text.
/// Extra placeholders beyond the fills stay as `_` (rendered mismatch).
fn fill_sentence(sentence: &str, fills: &[String]) -> String {
  let mut fill = fills.iter();
  let mut out = String::new();
  for ch in sentence.chars() {
    if ch == '_' {
      match fill.next() {
        Some(text) => out.push_str(text),
        None => out.push(ch),
      }
    } else {
      out.push(ch);
    }
  }
  out
}
