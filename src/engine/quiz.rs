use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::WordStore;
use crate::word::Word;

pub const DEFAULT_OPTION_COUNT: usize = 4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuizMode {
    /// Show the translation, pick the headword.
    #[default]
    CnToEn,
    /// Show the headword, pick the translation.
    EnToCn,
    /// Show the translation, type the headword.
    Spelling,
}

impl QuizMode {
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::CnToEn => "cn-to-en",
            QuizMode::EnToCn => "en-to-cn",
            QuizMode::Spelling => "spelling",
        }
    }

    pub fn is_recognition(self) -> bool {
        !matches!(self, QuizMode::Spelling)
    }
}

impl FromStr for QuizMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cn-to-en" => Ok(QuizMode::CnToEn),
            "en-to-cn" => Ok(QuizMode::EnToCn),
            "spelling" => Ok(QuizMode::Spelling),
            other => Err(format!(
                "unknown quiz mode '{other}' (expected cn-to-en, en-to-cn or spelling)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub mode: QuizMode,
    pub target: Word,
    pub prompt: String,
    /// Empty for spelling questions.
    pub options: Vec<Word>,
    /// Index of `target` inside `options`; the only ground truth used
    /// when scoring a recognition answer.
    pub correct_position: usize,
}

impl Question {
    /// Option texts in display order.
    pub fn option_labels(&self) -> Vec<&str> {
        self.options
            .iter()
            .map(|w| option_text(self.mode, w))
            .collect()
    }

    /// What the user should have answered.
    pub fn answer_text(&self) -> &str {
        match self.mode {
            QuizMode::EnToCn => &self.target.translation,
            QuizMode::CnToEn | QuizMode::Spelling => &self.target.headword,
        }
    }
}

fn prompt_text(mode: QuizMode, word: &Word) -> &str {
    match mode {
        QuizMode::CnToEn | QuizMode::Spelling => &word.translation,
        QuizMode::EnToCn => &word.headword,
    }
}

fn option_text(mode: QuizMode, word: &Word) -> &str {
    match mode {
        QuizMode::EnToCn => &word.translation,
        QuizMode::CnToEn | QuizMode::Spelling => &word.headword,
    }
}

/// Build a multiple-choice question for `target`. Distractors come from the
/// target's own book; a small book yields fewer options instead of failing.
pub fn build_question<S: WordStore, R: Rng + ?Sized>(
    store: &S,
    rng: &mut R,
    target: &Word,
    mode: QuizMode,
    option_count: usize,
) -> Result<Question> {
    if mode == QuizMode::Spelling {
        return Ok(spelling_question(target));
    }

    let wanted = option_count.saturating_sub(1);
    let distractors = store.random_others(&target.book, target.rank, wanted, rng)?;
    Ok(assemble(target, distractors, mode, rng))
}

/// Shuffle `{target} ∪ distractors` and record where the target landed.
pub fn assemble<R: Rng + ?Sized>(
    target: &Word,
    distractors: Vec<Word>,
    mode: QuizMode,
    rng: &mut R,
) -> Question {
    let mut options = Vec::with_capacity(distractors.len() + 1);
    options.push(target.clone());
    options.extend(distractors);
    options.shuffle(rng);

    let correct_position = options
        .iter()
        .position(|w| w.key() == target.key())
        .unwrap_or(0);

    Question {
        mode,
        target: target.clone(),
        prompt: prompt_text(mode, target).to_string(),
        options,
        correct_position,
    }
}

pub fn spelling_question(target: &Word) -> Question {
    Question {
        mode: QuizMode::Spelling,
        target: target.clone(),
        prompt: prompt_text(QuizMode::Spelling, target).to_string(),
        options: Vec::new(),
        correct_position: 0,
    }
}
