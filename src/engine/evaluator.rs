use crate::engine::quiz::{Question, QuizMode};
use crate::word::Word;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Option index for recognition questions.
    Choice(usize),
    /// Typed answer for spelling questions.
    Text(String),
    /// Explicit give-up; scored like a wrong answer.
    Skip,
}

/// Why a submission was not scored. None of these consume the one answer
/// a position allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    EmptySubmission,
    AlreadyAnswered,
    NotAwaitingAnswer,
    NoSuchOption,
    WrongKind,
}

/// Store updates implied by a scored answer, applied by the caller in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    RecordAnswer { correct: bool },
    AdvanceProgress { book: String },
    UpsertWrong { word: Word },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub is_correct: bool,
    pub effects: Vec<Effect>,
}

impl Evaluation {
    fn correct(word: &Word) -> Self {
        Self {
            is_correct: true,
            effects: vec![
                Effect::RecordAnswer { correct: true },
                Effect::AdvanceProgress {
                    book: word.book.clone(),
                },
            ],
        }
    }

    fn wrong(word: &Word) -> Self {
        Self {
            is_correct: false,
            effects: vec![
                Effect::RecordAnswer { correct: false },
                Effect::UpsertWrong { word: word.clone() },
            ],
        }
    }
}

/// Score `submission` against `question`. Mastery flags are not touched
/// here; that is an explicit follow-up call.
pub fn evaluate(question: &Question, submission: &Submission) -> Result<Evaluation, Rejection> {
    let target = &question.target;
    let is_correct = match (question.mode, submission) {
        (_, Submission::Skip) => false,
        (QuizMode::Spelling, Submission::Text(text)) => {
            if text.trim().is_empty() {
                return Err(Rejection::EmptySubmission);
            }
            spelling_matches(text, &target.headword)
        }
        (QuizMode::Spelling, Submission::Choice(_)) => return Err(Rejection::WrongKind),
        (_, Submission::Text(_)) => return Err(Rejection::WrongKind),
        (_, Submission::Choice(idx)) => {
            if *idx >= question.options.len() {
                return Err(Rejection::NoSuchOption);
            }
            *idx == question.correct_position
        }
    };

    Ok(if is_correct {
        Evaluation::correct(target)
    } else {
        Evaluation::wrong(target)
    })
}

/// Trimmed, ASCII case-insensitive equality.
pub fn spelling_matches(typed: &str, headword: &str) -> bool {
    typed.trim().eq_ignore_ascii_case(headword.trim())
}
