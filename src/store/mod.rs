//! Storage seams consumed by the engine.
//!
//! Mutating methods take `&mut self`; an [`crate::app::App`] owns its store
//! outright, so every write goes through a single writer.

pub mod json_store;
pub mod memory;
pub mod schema;

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;

use crate::book::{Book, BookProgress};
use crate::engine::selector;
use crate::error::Result;
use crate::word::{Word, WordImport};
use schema::{AchievementRecord, Cumulative, DailyStat, FavoriteEntry, WrongEntry};

pub trait WordStore {
    fn books(&self) -> Result<Vec<Book>>;

    /// All words of a book ordered by rank.
    fn words(&self, book: &str) -> Result<Vec<Word>>;

    /// Up to `count` distinct unmastered words of `book`, uniformly sampled.
    fn random_unmastered<R: Rng + ?Sized>(
        &self,
        book: &str,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Word>> {
        let pool: Vec<Word> = self
            .words(book)?
            .into_iter()
            .filter(|w| !w.mastered)
            .collect();
        Ok(selector::sample_words(pool, count, rng))
    }

    /// Up to `count` distinct words of `book` other than `exclude_rank`.
    fn random_others<R: Rng + ?Sized>(
        &self,
        book: &str,
        exclude_rank: u32,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Word>> {
        let pool: Vec<Word> = self
            .words(book)?
            .into_iter()
            .filter(|w| w.rank != exclude_rank)
            .collect();
        Ok(selector::sample_words(pool, count, rng))
    }

    fn set_mastered(&mut self, book: &str, rank: u32, mastered: bool) -> Result<()>;

    /// Insert with a count of one, or bump the count and refresh the date.
    fn upsert_wrong(&mut self, word: &Word, at: NaiveDateTime) -> Result<()>;
    fn delete_wrong(&mut self, book: &str, rank: u32) -> Result<()>;
    /// Most recently missed first.
    fn list_wrong(&self) -> Result<Vec<WrongEntry>>;

    fn upsert_favorite(&mut self, word: &Word, at: NaiveDateTime) -> Result<()>;
    fn delete_favorite(&mut self, book: &str, rank: u32) -> Result<()>;
    /// Most recently added first.
    fn list_favorites(&self) -> Result<Vec<FavoriteEntry>>;
    fn is_favorite(&self, book: &str, rank: u32) -> Result<bool>;

    fn book_progress(&self, book: &str) -> Result<BookProgress>;
    fn increment_progress(&mut self, book: &str) -> Result<()>;
    /// Zero the counter and clear every mastered flag in the book.
    fn reset_progress(&mut self, book: &str) -> Result<()>;

    fn create_custom_book(
        &mut self,
        id: &str,
        name: &str,
        words: &[WordImport],
        at: NaiveDateTime,
    ) -> Result<Book>;
}

pub trait StatStore {
    fn record_answer(&mut self, day: NaiveDate, correct: bool) -> Result<()>;
    fn add_duration(&mut self, day: NaiveDate, seconds: u64) -> Result<()>;
    /// Counters for `day`; all zero when nothing was recorded.
    fn day(&self, day: NaiveDate) -> Result<DailyStat>;
    fn cumulative(&self) -> Result<Cumulative>;
    /// Recorded days, most recent first.
    fn recent_days(&self, limit: usize) -> Result<Vec<DailyStat>>;

    fn list_achievements(&self) -> Result<Vec<AchievementRecord>>;
    /// Unlocking an already unlocked achievement keeps the first timestamp.
    fn unlock(&mut self, id: &str, at: NaiveDateTime) -> Result<()>;
}
