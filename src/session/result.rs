use serde::Serialize;

use crate::engine::achievements::AchievementDef;
use crate::engine::evaluator::Rejection;
use crate::engine::stats::accuracy;
use crate::session::state::{Session, Stage};
use crate::word::Word;

#[derive(Clone, Debug, PartialEq)]
pub enum QuestionKind {
    /// Review card: study the word, then advance.
    Card,
    Choice { options: Vec<String> },
    Spelling,
}

/// What a front end needs to render the current position.
#[derive(Clone, Debug, PartialEq)]
pub struct QuestionView {
    /// 0-based position within the current stage.
    pub position: usize,
    pub total: usize,
    pub stage: Stage,
    pub word: Word,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Correct answer text, present once the position has been scored.
    pub reveal: Option<String>,
}

#[derive(Clone, Debug)]
pub enum AnswerResult {
    Scored {
        correct: bool,
        /// Index of the right option; `None` for spelling.
        correct_position: Option<usize>,
        answer: String,
        word: Word,
        unlocked: Vec<&'static AchievementDef>,
    },
    Rejected(Rejection),
}

impl AnswerResult {
    pub fn is_scored(&self) -> bool {
        matches!(self, AnswerResult::Scored { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AdvanceOutcome {
    Continuing,
    Complete(SessionSummary),
    /// Nothing to advance past: unanswered position or finished session.
    NotApplicable,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total_words: usize,
    pub answered: u32,
    pub correct: u32,
    pub wrong: u32,
    pub accuracy: f64,
    pub elapsed_secs: u64,
    /// Ended by the user before the last word.
    pub partial: bool,
}

impl SessionSummary {
    pub fn from_session(session: &Session, elapsed_secs: u64, partial: bool) -> Self {
        Self {
            total_words: session.total(),
            answered: session.answered(),
            correct: session.correct(),
            wrong: session.wrong(),
            accuracy: accuracy(session.correct(), session.wrong()),
            elapsed_secs,
            partial,
        }
    }
}
