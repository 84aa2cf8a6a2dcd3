//! Seed data and small utilities related to default content.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::{Card, Choice, Drill, DrillSource, Question, QuestionPayload, WordEntry};

/// Built-in word lists a bank drill can reference by name instead of
/// carrying an inline custom list.
pub fn builtin_word_lists() -> HashMap<&'static str, Vec<WordEntry>> {
  HashMap::from([("school-basics", school_basics())])
}

fn school_basics() -> Vec<WordEntry> {
  vec![
    WordEntry {
      word: "BACKPACK".into(),
      definition: "A bag with straps that you carry on your back.".into(),
      image: Some("/media/words/backpack.png".into()),
      sign_video: Some("/media/signs/backpack.mp4".into()),
    },
    WordEntry {
      word: "PENCIL".into(),
      definition: "A thin tool you write and draw with.".into(),
      image: Some("/media/words/pencil.png".into()),
      sign_video: Some("/media/signs/pencil.mp4".into()),
    },
    WordEntry {
      word: "LUNCHBOX".into(),
      definition: "A small box for carrying your lunch to school.".into(),
      image: Some("/media/words/lunchbox.png".into()),
      sign_video: None,
    },
  ]
}

/// Minimal set of built-in drills that guarantee the app is useful even
/// without an external drill bank.
pub fn seed_drills() -> Vec<Drill> {
  let mut words = school_basics();
  words.truncate(2);
  vec![Drill {
    id: "seed-back-to-school".into(),
    title: "Back to School Words".into(),
    description: "Warm up with two classroom words and every game type.".into(),
    opens_at: None,
    due_at: None,
    source: DrillSource::Seed,
    words,
    questions: vec![
      Question {
        id: "bts-select".into(),
        word_index: 0,
        instruction: "Pick the word you just learned.".into(),
        payload: QuestionPayload::SmartSelect {
          choices: vec![
            Choice { text: Some("backpack".into()), media: None },
            Choice { text: Some("lunchbox".into()), media: None },
            Choice { text: Some("pencil".into()), media: None },
            Choice { text: Some("notebook".into()), media: None },
          ],
          correct_index: 0,
        },
      },
      Question {
        id: "bts-spell".into(),
        word_index: 0,
        instruction: "Fill in the missing letters.".into(),
        payload: QuestionPayload::BlankBuster {
          pattern: "B _ _ _ _ _ _ K".into(),
          answer: "BACKPACK".into(),
          letter_pool: vec!['A', 'C', 'K', 'P', 'A', 'C', 'E', 'T'],
          hint: Some("You wear it to carry your books.".into()),
        },
      },
      Question {
        id: "bts-sentence".into(),
        word_index: 0,
        instruction: "Drag the words into the sentence.".into(),
        payload: QuestionPayload::SentenceBuilder {
          sentence: "A _ is worn on your _.".into(),
          drag_items: vec!["backpack".into(), "back".into()],
          incorrect_choices: vec!["bag".into()],
        },
      },
      Question {
        id: "bts-match".into(),
        word_index: 1,
        instruction: "Match each word with its picture.".into(),
        payload: QuestionPayload::MemoryGame {
          cards: vec![
            Card {
              id: "bts-card-1".into(),
              text: Some("pencil".into()),
              media: None,
              pair_id: "bts-card-2".into(),
            },
            Card {
              id: "bts-card-2".into(),
              text: None,
              media: Some("/media/words/pencil.png".into()),
              pair_id: "bts-card-1".into(),
            },
            Card {
              id: "bts-card-3".into(),
              text: Some("backpack".into()),
              media: None,
              pair_id: "bts-card-4".into(),
            },
            Card {
              id: "bts-card-4".into(),
              text: None,
              media: Some("/media/words/backpack.png".into()),
              pair_id: "bts-card-3".into(),
            },
          ],
        },
      },
      Question {
        id: "bts-pictures".into(),
        word_index: 1,
        instruction: "What do the four pictures show?".into(),
        payload: QuestionPayload::PictureWord {
          pictures: vec![
            "/media/pics/pencil-1.png".into(),
            "/media/pics/pencil-2.png".into(),
            "/media/pics/pencil-3.png".into(),
            "/media/pics/pencil-4.png".into(),
          ],
          answer: "pencil".into(),
        },
      },
    ],
  }]
}

/// Absolute last-resort fallback: if the drill store is somehow empty, we
/// inject this.
pub fn hard_fallback_drill() -> Drill {
  Drill {
    id: Uuid::new_v4().to_string(),
    title: "Quick Word Check".into(),
    description: String::new(),
    opens_at: None,
    due_at: None,
    source: DrillSource::Seed,
    words: vec![WordEntry {
      word: "CAT".into(),
      definition: "A small furry animal that purrs.".into(),
      image: None,
      sign_video: None,
    }],
    questions: vec![Question {
      id: "fallback-select".into(),
      word_index: 0,
      instruction: "Pick the word that names the animal.".into(),
      payload: QuestionPayload::SmartSelect {
        choices: vec![
          Choice { text: Some("cat".into()), media: None },
          Choice { text: Some("car".into()), media: None },
          Choice { text: Some("hat".into()), media: None },
          Choice { text: Some("cap".into()), media: None },
        ],
        correct_index: 0,
      },
    }],
  }
}
