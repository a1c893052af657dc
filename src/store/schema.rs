use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::book::Book;
use crate::config::Config;
use crate::engine::achievements::CATALOG;
use crate::word::Word;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookData {
    pub book: Book,
    pub words: Vec<Word>,
}

/// Ledger row for a missed word. `word` is a snapshot taken at the first
/// miss and is not refreshed by later edits to the book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WrongEntry {
    pub word: Word,
    pub wrong_count: u32,
    pub last_wrong: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub word: Word,
    pub added_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LibraryData {
    pub schema_version: u32,
    pub books: Vec<BookData>,
    #[serde(default)]
    pub wrong: Vec<WrongEntry>,
    #[serde(default)]
    pub favorites: Vec<FavoriteEntry>,
}

impl Default for LibraryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            books: Vec::new(),
            wrong: Vec::new(),
            favorites: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    #[serde(default)]
    pub learned: u32,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub wrong: u32,
    #[serde(default)]
    pub duration_secs: u64,
}

impl DailyStat {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            learned: 0,
            correct: 0,
            wrong: 0,
            duration_secs: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cumulative {
    pub total_learned: u64,
    pub total_days: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub id: String,
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<NaiveDateTime>,
}

impl AchievementRecord {
    pub fn locked(id: &str) -> Self {
        Self {
            id: id.to_string(),
            unlocked: false,
            unlocked_at: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsData {
    pub schema_version: u32,
    /// One row per calendar date, kept sorted ascending.
    pub days: Vec<DailyStat>,
    #[serde(default)]
    pub achievements: Vec<AchievementRecord>,
}

impl Default for StatsData {
    fn default() -> Self {
        let mut data = Self {
            schema_version: SCHEMA_VERSION,
            days: Vec::new(),
            achievements: Vec::new(),
        };
        data.ensure_catalog();
        data
    }
}

impl StatsData {
    /// Add a locked record for every catalog entry that has none yet.
    pub fn ensure_catalog(&mut self) {
        for def in CATALOG {
            if !self.achievements.iter().any(|a| a.id == def.id) {
                self.achievements.push(AchievementRecord::locked(def.id));
            }
        }
    }
}

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub lexdrill_export_version: u32,
    pub exported_at: NaiveDateTime,
    pub config: Config,
    pub books: Vec<Book>,
    pub favorites: Vec<FavoriteEntry>,
    pub wrong: Vec<WrongEntry>,
    pub days: Vec<DailyStat>,
    pub achievements: Vec<AchievementRecord>,
}
