use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::book::DEFAULT_BOOK;
use crate::engine::quiz::{DEFAULT_OPTION_COUNT, QuizMode};
use crate::engine::selector::{MAX_SESSION_WORDS, MIN_SESSION_WORDS};

pub const MIN_OPTION_COUNT: usize = 2;
pub const MAX_OPTION_COUNT: usize = 6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_current_book")]
    pub current_book: String,
    #[serde(default = "default_word_count")]
    pub word_count: usize,
    #[serde(default = "default_option_count")]
    pub option_count: usize,
    #[serde(default)]
    pub quiz_mode: QuizMode,
    #[serde(default = "default_review_first")]
    pub review_first: bool,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_current_book() -> String {
    DEFAULT_BOOK.to_string()
}
fn default_word_count() -> usize {
    20
}
fn default_option_count() -> usize {
    DEFAULT_OPTION_COUNT
}
fn default_review_first() -> bool {
    true
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexdrill")
        .to_string_lossy()
        .to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current_book: default_current_book(),
            word_count: default_word_count(),
            option_count: default_option_count(),
            quiz_mode: QuizMode::default(),
            review_first: default_review_first(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lexdrill")
            .join("config.toml")
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    /// Clamp numeric fields into their supported ranges and fall back to the
    /// default book when `current_book` is not among `known_books`.
    /// Call after deserialization; hand-edited files can hold anything.
    pub fn validate(&mut self, known_books: &[&str]) {
        self.word_count = self.word_count.clamp(MIN_SESSION_WORDS, MAX_SESSION_WORDS);
        self.option_count = self.option_count.clamp(MIN_OPTION_COUNT, MAX_OPTION_COUNT);
        if !known_books.contains(&self.current_book.as_str()) {
            self.current_book = default_current_book();
        }
    }
}
