use chrono::NaiveDateTime;

use crate::engine::evaluator::Rejection;
use crate::engine::quiz::{Question, QuizMode};
use crate::word::Word;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Presentation pass: cards only, no scoring.
    Review,
    Quiz,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingPresent,
    AwaitingAnswer,
    /// Answered (or card shown); the revealed answer stays readable and
    /// further submissions are refused until `advance`.
    Advancing,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionSource {
    Book(String),
    WrongLedger,
}

/// Result of moving the cursor past the current position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Next,
    /// Last review card passed; quizzing restarts at index 0.
    QuizStarts,
    Finished,
}

/// One learning session. Ephemeral: nothing here is persisted, and
/// dropping it without completion discards its duration credit.
#[derive(Clone, Debug)]
pub struct Session {
    words: Vec<Word>,
    index: usize,
    mode: QuizMode,
    option_count: usize,
    stage: Stage,
    phase: Phase,
    question: Option<Question>,
    last_correct: Option<bool>,
    started_at: NaiveDateTime,
    correct: u32,
    wrong: u32,
    source: SessionSource,
}

impl Session {
    pub fn new(
        words: Vec<Word>,
        mode: QuizMode,
        option_count: usize,
        source: SessionSource,
        started_at: NaiveDateTime,
        review_first: bool,
    ) -> Self {
        let phase = if words.is_empty() {
            Phase::Complete
        } else {
            Phase::AwaitingPresent
        };
        Self {
            words,
            index: 0,
            mode,
            option_count,
            stage: if review_first { Stage::Review } else { Stage::Quiz },
            phase,
            question: None,
            last_correct: None,
            started_at,
            correct: 0,
            wrong: 0,
            source,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.words.len()
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn option_count(&self) -> usize {
        self.option_count
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn source(&self) -> &SessionSource {
        &self.source
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    pub fn wrong(&self) -> u32 {
        self.wrong
    }

    pub fn answered(&self) -> u32 {
        self.correct + self.wrong
    }

    /// True when the session was created over an empty working set, which
    /// for a book session means every word is already mastered.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    pub fn current_word(&self) -> Option<&Word> {
        if self.is_complete() {
            return None;
        }
        self.words.get(self.index)
    }

    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Verdict for the current position once it has been scored.
    pub fn last_correct(&self) -> Option<bool> {
        self.last_correct
    }

    pub(crate) fn present(&mut self, question: Question) {
        debug_assert_eq!(self.phase, Phase::AwaitingPresent);
        self.question = Some(question);
        self.phase = Phase::AwaitingAnswer;
    }

    pub(crate) fn present_card(&mut self) {
        debug_assert_eq!(self.stage, Stage::Review);
        self.phase = Phase::Advancing;
    }

    /// Gate for a submission at the current position.
    pub(crate) fn check_answerable(&self) -> Result<&Question, Rejection> {
        match (self.phase, self.stage) {
            (Phase::Advancing, Stage::Quiz) => Err(Rejection::AlreadyAnswered),
            (Phase::AwaitingAnswer, Stage::Quiz) => {
                self.question.as_ref().ok_or(Rejection::NotAwaitingAnswer)
            }
            _ => Err(Rejection::NotAwaitingAnswer),
        }
    }

    pub(crate) fn record(&mut self, correct: bool) {
        if correct {
            self.correct += 1;
        } else {
            self.wrong += 1;
        }
        self.last_correct = Some(correct);
        self.phase = Phase::Advancing;
    }

    pub(crate) fn can_advance(&self) -> bool {
        self.phase == Phase::Advancing
    }

    /// Peek at what `step` would do without changing anything.
    pub(crate) fn next_step(&self) -> Step {
        if self.index + 1 < self.words.len() {
            Step::Next
        } else if self.stage == Stage::Review {
            Step::QuizStarts
        } else {
            Step::Finished
        }
    }

    pub(crate) fn step(&mut self) -> Step {
        let step = self.next_step();
        self.question = None;
        self.last_correct = None;
        match step {
            Step::Next => {
                self.index += 1;
                self.phase = Phase::AwaitingPresent;
            }
            Step::QuizStarts => {
                self.index = 0;
                self.stage = Stage::Quiz;
                self.phase = Phase::AwaitingPresent;
            }
            Step::Finished => {
                self.index = self.words.len();
                self.phase = Phase::Complete;
            }
        }
        step
    }

    pub(crate) fn finish(&mut self) {
        self.question = None;
        self.phase = Phase::Complete;
    }
}
