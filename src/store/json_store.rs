use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::book::{self, Book, BookProgress};
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::store::schema::{
    AchievementRecord, Cumulative, DailyStat, EXPORT_VERSION, ExportData, FavoriteEntry,
    LibraryData, SCHEMA_VERSION, StatsData, WrongEntry,
};
use crate::store::{StatStore, WordStore};
use crate::word::{Word, WordImport};

const LIBRARY_FILE: &str = "library.json";
const STATS_FILE: &str = "stats.json";

/// File-backed store. Every mutation is applied to a copy, written to disk,
/// and only then committed in memory, so a failed write changes nothing.
pub struct JsonStore {
    base_dir: PathBuf,
    library: LibraryData,
    stats: StatsData,
}

impl JsonStore {
    /// Open the store under `base_dir`, seeding the bundled books on first use.
    pub fn open(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        let mut store = Self {
            base_dir,
            library: LibraryData::default(),
            stats: StatsData::default(),
        };
        if store.clean_stale_temp_files() {
            warn!(dir = %store.base_dir.display(), "removed leftovers of an interrupted save");
        }

        match store.load::<LibraryData>(LIBRARY_FILE)? {
            Some(library) => {
                check_version(LIBRARY_FILE, library.schema_version)?;
                store.library = library;
            }
            None => {
                let assets = book::builtin_books();
                info!(books = assets.len(), "seeding bundled word-books");
                store.library.seed(&assets);
                store.save(LIBRARY_FILE, &store.library)?;
            }
        }

        if let Some(mut stats) = store.load::<StatsData>(STATS_FILE)? {
            check_version(STATS_FILE, stats.schema_version)?;
            stats.ensure_catalog();
            store.stats = stats;
        }

        debug!(dir = %store.base_dir.display(), "store opened");
        Ok(store)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Apply `f` to a copy of the library, save the copy, then commit it.
    /// Each call clones and rewrites the whole library, word state of every
    /// book included, so a mutation costs O(library size).
    fn update_library<T>(&mut self, f: impl FnOnce(&mut LibraryData) -> Result<T>) -> Result<T> {
        let mut next = self.library.clone();
        let out = f(&mut next)?;
        self.save(LIBRARY_FILE, &next)?;
        self.library = next;
        Ok(out)
    }

    fn update_stats<T>(&mut self, f: impl FnOnce(&mut StatsData) -> Result<T>) -> Result<T> {
        let mut next = self.stats.clone();
        let out = f(&mut next)?;
        self.save(STATS_FILE, &next)?;
        self.stats = next;
        Ok(out)
    }

    /// Remove `.tmp` files left behind by a save that never reached its
    /// rename. Returns true if any were found.
    pub fn clean_stale_temp_files(&self) -> bool {
        let mut found = false;
        for name in [LIBRARY_FILE, STATS_FILE] {
            let tmp_path = self.file_path(name).with_extension("tmp");
            if tmp_path.exists() {
                found = true;
                let _ = fs::remove_file(&tmp_path);
            }
        }
        found
    }

    /// Bundle config, ledgers and statistics for the user to keep.
    pub fn export_all(&self, config: &Config, exported_at: NaiveDateTime) -> ExportData {
        ExportData {
            lexdrill_export_version: EXPORT_VERSION,
            exported_at,
            config: config.clone(),
            books: self.library.books.iter().map(|b| b.book.clone()).collect(),
            favorites: self.library.sorted_favorites(),
            wrong: self.library.sorted_wrong(),
            days: self.stats.days.clone(),
            achievements: self.stats.achievements.clone(),
        }
    }
}

fn check_version(file: &str, found: u32) -> Result<()> {
    if found != SCHEMA_VERSION {
        return Err(StoreError::SchemaVersion {
            file: file.to_string(),
            found,
            expected: SCHEMA_VERSION,
        });
    }
    Ok(())
}

impl WordStore for JsonStore {
    fn books(&self) -> Result<Vec<Book>> {
        Ok(self.library.books.iter().map(|b| b.book.clone()).collect())
    }

    fn words(&self, book: &str) -> Result<Vec<Word>> {
        self.library
            .books
            .iter()
            .find(|b| b.book.id == book)
            .map(|b| b.words.clone())
            .ok_or_else(|| StoreError::BookNotFound(book.to_string()))
    }

    fn set_mastered(&mut self, book: &str, rank: u32, mastered: bool) -> Result<()> {
        self.update_library(|lib| lib.set_mastered(book, rank, mastered))
    }

    fn upsert_wrong(&mut self, word: &Word, at: NaiveDateTime) -> Result<()> {
        self.update_library(|lib| {
            lib.upsert_wrong(word, at);
            Ok(())
        })
    }

    fn delete_wrong(&mut self, book: &str, rank: u32) -> Result<()> {
        self.update_library(|lib| {
            lib.delete_wrong(book, rank);
            Ok(())
        })
    }

    fn list_wrong(&self) -> Result<Vec<WrongEntry>> {
        Ok(self.library.sorted_wrong())
    }

    fn upsert_favorite(&mut self, word: &Word, at: NaiveDateTime) -> Result<()> {
        self.update_library(|lib| {
            lib.upsert_favorite(word, at);
            Ok(())
        })
    }

    fn delete_favorite(&mut self, book: &str, rank: u32) -> Result<()> {
        self.update_library(|lib| {
            lib.delete_favorite(book, rank);
            Ok(())
        })
    }

    fn list_favorites(&self) -> Result<Vec<FavoriteEntry>> {
        Ok(self.library.sorted_favorites())
    }

    fn is_favorite(&self, book: &str, rank: u32) -> Result<bool> {
        Ok(self.library.is_favorite(book, rank))
    }

    fn book_progress(&self, book: &str) -> Result<BookProgress> {
        self.library
            .books
            .iter()
            .find(|b| b.book.id == book)
            .map(|b| b.book.progress())
            .ok_or_else(|| StoreError::BookNotFound(book.to_string()))
    }

    fn increment_progress(&mut self, book: &str) -> Result<()> {
        self.update_library(|lib| lib.increment_progress(book))
    }

    fn reset_progress(&mut self, book: &str) -> Result<()> {
        self.update_library(|lib| lib.reset_progress(book))
    }

    fn create_custom_book(
        &mut self,
        id: &str,
        name: &str,
        words: &[WordImport],
        at: NaiveDateTime,
    ) -> Result<Book> {
        self.update_library(|lib| Ok(lib.put_book(id, name, words, Some(at))))
    }
}

impl StatStore for JsonStore {
    fn record_answer(&mut self, day: NaiveDate, correct: bool) -> Result<()> {
        self.update_stats(|stats| {
            stats.record_answer(day, correct);
            Ok(())
        })
    }

    fn add_duration(&mut self, day: NaiveDate, seconds: u64) -> Result<()> {
        self.update_stats(|stats| {
            stats.add_duration(day, seconds);
            Ok(())
        })
    }

    fn day(&self, day: NaiveDate) -> Result<DailyStat> {
        Ok(self.stats.day(day))
    }

    fn cumulative(&self) -> Result<Cumulative> {
        Ok(self.stats.cumulative())
    }

    fn recent_days(&self, limit: usize) -> Result<Vec<DailyStat>> {
        Ok(self.stats.recent_days(limit))
    }

    fn list_achievements(&self) -> Result<Vec<AchievementRecord>> {
        Ok(self.stats.achievements.clone())
    }

    fn unlock(&mut self, id: &str, at: NaiveDateTime) -> Result<()> {
        self.update_stats(|stats| stats.unlock(id, at))
    }
}
