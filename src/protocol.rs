//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Outgoing question views are answer-free: correct indices, target words,
//! pair ids and authored token order never leave the server.

use serde::{Deserialize, Serialize};

use crate::domain::{Card, Choice, Drill, DrillSource, LeaderboardEntry, QuestionPayload, WordEntry};
use crate::flow::{DrillSession, LessonPhase, SubmitOutcome};
use crate::progress::{AnswerStatus, QuestionDraft};

/// One learner input, tagged by the per-type action vocabulary.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AnswerInput {
    SelectChoice {
        index: usize,
    },
    PlaceTile {
        tile: usize,
    },
    ClearSlot {
        slot: usize,
    },
    CheckWord,
    PlaceToken {
        slot: usize,
        token: usize,
    },
    RemoveToken {
        slot: usize,
    },
    FlipCard {
        #[serde(rename = "cardId")]
        card_id: String,
    },
    SubmitText {
        text: String,
    },
}

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartDrill {
        #[serde(rename = "drillId")]
        drill_id: Option<String>,
        #[serde(default)]
        player: Option<String>,
        #[serde(default)]
        preview: bool,
    },
    Next {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Back {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Answer {
        #[serde(rename = "sessionId")]
        session_id: String,
        input: AnswerInput,
    },
    Retake {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Exit {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    Leaderboard {
        #[serde(rename = "drillId")]
        drill_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionOut,
    },
    Answer {
        outcome: AnswerOutcomeOut,
        session: SessionOut,
    },
    Exited {
        ok: bool,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    Error {
        message: String,
    },
}

/// What one learner input did, as reported back.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcomeOut {
    Updated,
    Ignored,
    Incomplete,
    Judged {
        correct: bool,
        #[serde(rename = "pointsAwarded")]
        points_awarded: Option<u32>,
        #[serde(rename = "wrongAttempts")]
        wrong_attempts: u32,
    },
}

pub fn outcome_out(outcome: SubmitOutcome) -> AnswerOutcomeOut {
    match outcome {
        SubmitOutcome::Updated => AnswerOutcomeOut::Updated,
        SubmitOutcome::Ignored => AnswerOutcomeOut::Ignored,
        SubmitOutcome::Incomplete => AnswerOutcomeOut::Incomplete,
        SubmitOutcome::Judged { correct, points_awarded, wrong_attempts } => {
            AnswerOutcomeOut::Judged { correct, points_awarded, wrong_attempts }
        }
    }
}

/// Live snapshot of one play session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub id: String,
    pub drill_id: String,
    pub drill_title: String,
    pub player: String,
    pub preview: bool,
    pub phase: LessonPhase,
    pub word_index: usize,
    pub question_index: usize,
    pub progress_percent: f32,
    pub score: u32,
    pub answer_status: AnswerStatus,
    pub word: Option<WordOut>,
    pub question: Option<QuestionOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordOut {
    pub word: String,
    pub definition: String,
    pub image: Option<String>,
    pub sign_video: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    pub instruction: String,
    #[serde(flatten)]
    pub view: QuestionViewOut,
}

/// Playable, answer-free question view including the learner's draft.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionViewOut {
    SmartSelect {
        choices: Vec<Choice>,
        chosen: Option<usize>,
        #[serde(rename = "wrongChoices")]
        wrong_choices: Vec<usize>,
    },
    BlankBuster {
        /// Pattern tokens; `_` marks a blank cell.
        pattern: Vec<String>,
        tiles: Vec<char>,
        /// Tile indices currently sitting in blanks.
        #[serde(rename = "usedTiles")]
        used_tiles: Vec<usize>,
        /// Resolved letter per blank.
        slots: Vec<Option<char>>,
        hint: Option<String>,
    },
    SentenceBuilder {
        sentence: String,
        /// Shuffled pool texts (correct tokens and decoys mixed).
        pool: Vec<String>,
        #[serde(rename = "usedTokens")]
        used_tokens: Vec<usize>,
        /// Resolved text per blank.
        slots: Vec<Option<String>>,
    },
    MemoryGame {
        /// Cards in this session's shuffled order, partners undisclosed.
        cards: Vec<CardOut>,
        #[serde(rename = "faceUp")]
        face_up: Vec<String>,
        matched: Vec<String>,
        #[serde(rename = "wrongPairs")]
        wrong_pairs: u32,
    },
    PictureWord {
        pictures: Vec<String>,
        draft: String,
    },
}

#[derive(Debug, Serialize)]
pub struct CardOut {
    pub id: String,
    pub text: Option<String>,
    pub media: Option<String>,
}

fn card_out(c: &Card) -> CardOut {
    CardOut { id: c.id.clone(), text: c.text.clone(), media: c.media.clone() }
}

/// Convert a live session to the public snapshot. The word's teaching
/// content rides along only through the teaching phases: during the
/// question loop the word itself is the answer to spell-it and
/// picture-word questions, so it stays server-side.
pub fn to_session_out(s: &DrillSession) -> SessionOut {
    let word = match s.phase {
        LessonPhase::WordIntro
        | LessonPhase::Definition
        | LessonPhase::SignVideo
        | LessonPhase::Transition => s.drill.words.get(s.word_index).map(|w: &WordEntry| WordOut {
            word: w.word.clone(),
            definition: w.definition.clone(),
            image: w.image.clone(),
            sign_video: w.sign_video.clone(),
        }),
        _ => None,
    };

    let question = if s.phase == LessonPhase::QuestionLoop {
        s.current_question().and_then(|q| {
            let draft = s.draft.as_ref()?;
            Some(QuestionOut {
                id: q.id.clone(),
                instruction: q.instruction.clone(),
                view: question_view(&q.payload, draft)?,
            })
        })
    } else {
        None
    };

    SessionOut {
        id: s.id.clone(),
        drill_id: s.drill.id.clone(),
        drill_title: s.drill.title.clone(),
        player: s.player.clone(),
        preview: s.preview,
        phase: s.phase,
        word_index: s.word_index,
        question_index: s.question_index,
        progress_percent: s.progress_percent(),
        score: s.total_score(),
        answer_status: s.status,
        word,
        question,
    }
}

fn question_view(payload: &QuestionPayload, draft: &QuestionDraft) -> Option<QuestionViewOut> {
    match (payload, draft) {
        (
            QuestionPayload::SmartSelect { choices, .. },
            QuestionDraft::SmartSelect { chosen, wrong_choices },
        ) => Some(QuestionViewOut::SmartSelect {
            choices: choices.clone(),
            chosen: *chosen,
            wrong_choices: wrong_choices.clone(),
        }),
        (
            QuestionPayload::BlankBuster { pattern, hint, .. },
            QuestionDraft::BlankBuster { slots, tiles },
        ) => Some(QuestionViewOut::BlankBuster {
            pattern: pattern.split_whitespace().map(str::to_string).collect(),
            tiles: tiles.clone(),
            used_tiles: slots.iter().flatten().copied().collect(),
            slots: slots.iter().map(|s| s.and_then(|i| tiles.get(i).copied())).collect(),
            hint: hint.clone(),
        }),
        (
            QuestionPayload::SentenceBuilder { sentence, .. },
            QuestionDraft::SentenceBuilder { slots, pool },
        ) => Some(QuestionViewOut::SentenceBuilder {
            sentence: sentence.clone(),
            pool: pool.iter().map(|t| t.text.clone()).collect(),
            used_tokens: slots.iter().flatten().copied().collect(),
            slots: slots
                .iter()
                .map(|s| s.and_then(|i| pool.get(i).map(|t| t.text.clone())))
                .collect(),
        }),
        (
            QuestionPayload::MemoryGame { cards },
            QuestionDraft::MemoryGame { order, face_up, matched, wrong_pairs },
        ) => Some(QuestionViewOut::MemoryGame {
            cards: order.iter().filter_map(|i| cards.get(*i).map(card_out)).collect(),
            face_up: face_up.iter().filter_map(|i| cards.get(*i).map(|c| c.id.clone())).collect(),
            matched: matched.clone(),
            wrong_pairs: *wrong_pairs,
        }),
        (
            QuestionPayload::PictureWord { pictures, .. },
            QuestionDraft::PictureWord { text },
        ) => Some(QuestionViewOut::PictureWord {
            pictures: pictures.clone(),
            draft: text.clone(),
        }),
        _ => None,
    }
}

//
// HTTP request/response DTOs
//

/// Drill catalogue row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillSummaryOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub opens_at: Option<String>,
    pub due_at: Option<String>,
    pub source: DrillSource,
    pub word_count: usize,
    pub question_count: usize,
}

pub fn drill_summary_out(d: &Drill) -> DrillSummaryOut {
    DrillSummaryOut {
        id: d.id.clone(),
        title: d.title.clone(),
        description: d.description.clone(),
        opens_at: d.opens_at.clone(),
        due_at: d.due_at.clone(),
        source: d.source.clone(),
        word_count: d.words.len(),
        question_count: d.total_questions(),
    }
}

/// Drill detail: teaching content plus answer-free question metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDetailOut {
    #[serde(flatten)]
    pub summary: DrillSummaryOut,
    pub words: Vec<WordEntry>,
    pub questions: Vec<QuestionMetaOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMetaOut {
    pub id: String,
    pub word_index: usize,
    pub instruction: String,
    pub kind: String,
}

pub fn drill_detail_out(d: &Drill) -> DrillDetailOut {
    DrillDetailOut {
        summary: drill_summary_out(d),
        words: d.words.clone(),
        questions: d
            .questions
            .iter()
            .map(|q| QuestionMetaOut {
                id: q.id.clone(),
                word_index: q.word_index,
                instruction: q.instruction.clone(),
                kind: q.payload.kind_code().to_string(),
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
pub struct DrillQuery {
    #[serde(rename = "drillId")]
    pub drill_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StartSessionIn {
    #[serde(rename = "drillId")]
    pub drill_id: Option<String>,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub preview: bool,
}

#[derive(Debug, Deserialize)]
pub struct SessionActionIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerActionIn {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub input: AnswerInput,
}

#[derive(Serialize)]
pub struct AnswerStepOut {
    pub outcome: AnswerOutcomeOut,
    pub session: SessionOut,
}

#[derive(Serialize)]
pub struct ExitOut {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(rename = "drillId")]
    pub drill_id: String,
}

#[derive(Serialize)]
pub struct LeaderboardOut {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
