use chrono::{NaiveDate, NaiveDateTime};

use crate::book::{Book, BookAsset, BookProgress};
use crate::error::{Result, StoreError};
use crate::store::schema::{
    AchievementRecord, BookData, Cumulative, DailyStat, FavoriteEntry, LibraryData, StatsData,
    WrongEntry,
};
use crate::store::{StatStore, WordStore};
use crate::word::{Word, WordImport};

impl LibraryData {
    fn book(&self, id: &str) -> Result<&BookData> {
        self.books
            .iter()
            .find(|b| b.book.id == id)
            .ok_or_else(|| StoreError::BookNotFound(id.to_string()))
    }

    fn book_mut(&mut self, id: &str) -> Result<&mut BookData> {
        self.books
            .iter_mut()
            .find(|b| b.book.id == id)
            .ok_or_else(|| StoreError::BookNotFound(id.to_string()))
    }

    /// Insert or replace a book, numbering its words from 1 in input order.
    pub fn put_book(
        &mut self,
        id: &str,
        name: &str,
        words: &[WordImport],
        created_at: Option<NaiveDateTime>,
    ) -> Book {
        let words: Vec<Word> = words
            .iter()
            .enumerate()
            .map(|(i, w)| Word::from_import(id, i as u32 + 1, w))
            .collect();
        let book = Book {
            id: id.to_string(),
            name: name.to_string(),
            total: words.len() as u32,
            progress: 0,
            created_at,
        };
        let data = BookData {
            book: book.clone(),
            words,
        };
        match self.books.iter_mut().find(|b| b.book.id == id) {
            Some(existing) => *existing = data,
            None => self.books.push(data),
        }
        book
    }

    pub fn seed(&mut self, assets: &[BookAsset]) {
        for asset in assets {
            if self.book(&asset.id).is_err() {
                self.put_book(&asset.id, &asset.name, &asset.words, None);
            }
        }
    }

    pub fn set_mastered(&mut self, book: &str, rank: u32, mastered: bool) -> Result<()> {
        let data = self.book_mut(book)?;
        let word = data
            .words
            .iter_mut()
            .find(|w| w.rank == rank)
            .ok_or_else(|| StoreError::WordNotFound {
                book: book.to_string(),
                rank,
            })?;
        word.mastered = mastered;
        Ok(())
    }

    pub fn upsert_wrong(&mut self, word: &Word, at: NaiveDateTime) {
        match self.wrong.iter_mut().find(|e| e.word.key() == word.key()) {
            Some(entry) => {
                entry.wrong_count += 1;
                entry.last_wrong = at;
            }
            None => self.wrong.push(WrongEntry {
                word: word.clone(),
                wrong_count: 1,
                last_wrong: at,
            }),
        }
    }

    pub fn delete_wrong(&mut self, book: &str, rank: u32) {
        self.wrong.retain(|e| e.word.key() != (book, rank));
    }

    pub fn upsert_favorite(&mut self, word: &Word, at: NaiveDateTime) {
        if !self.is_favorite(&word.book, word.rank) {
            self.favorites.push(FavoriteEntry {
                word: word.clone(),
                added_at: at,
            });
        }
    }

    pub fn delete_favorite(&mut self, book: &str, rank: u32) {
        self.favorites.retain(|e| e.word.key() != (book, rank));
    }

    pub fn is_favorite(&self, book: &str, rank: u32) -> bool {
        self.favorites.iter().any(|e| e.word.key() == (book, rank))
    }

    /// Blind increment, capped at the book total.
    pub fn increment_progress(&mut self, book: &str) -> Result<()> {
        let data = self.book_mut(book)?;
        data.book.progress = (data.book.progress + 1).min(data.book.total);
        Ok(())
    }

    pub fn reset_progress(&mut self, book: &str) -> Result<()> {
        let data = self.book_mut(book)?;
        data.book.progress = 0;
        for word in &mut data.words {
            word.mastered = false;
        }
        Ok(())
    }

    pub fn sorted_wrong(&self) -> Vec<WrongEntry> {
        let mut entries = self.wrong.clone();
        entries.sort_by(|a, b| b.last_wrong.cmp(&a.last_wrong));
        entries
    }

    pub fn sorted_favorites(&self) -> Vec<FavoriteEntry> {
        let mut entries = self.favorites.clone();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        entries
    }
}

impl StatsData {
    fn day_mut(&mut self, date: NaiveDate) -> &mut DailyStat {
        let idx = match self.days.binary_search_by(|d| d.date.cmp(&date)) {
            Ok(idx) => idx,
            Err(idx) => {
                self.days.insert(idx, DailyStat::empty(date));
                idx
            }
        };
        &mut self.days[idx]
    }

    pub fn record_answer(&mut self, date: NaiveDate, correct: bool) {
        let day = self.day_mut(date);
        day.learned += 1;
        if correct {
            day.correct += 1;
        } else {
            day.wrong += 1;
        }
    }

    pub fn add_duration(&mut self, date: NaiveDate, seconds: u64) {
        self.day_mut(date).duration_secs += seconds;
    }

    pub fn day(&self, date: NaiveDate) -> DailyStat {
        self.days
            .binary_search_by(|d| d.date.cmp(&date))
            .map(|idx| self.days[idx].clone())
            .unwrap_or_else(|_| DailyStat::empty(date))
    }

    pub fn cumulative(&self) -> Cumulative {
        Cumulative {
            total_learned: self.days.iter().map(|d| d.learned as u64).sum(),
            total_days: self.days.len() as u32,
        }
    }

    pub fn recent_days(&self, limit: usize) -> Vec<DailyStat> {
        self.days.iter().rev().take(limit).cloned().collect()
    }

    pub fn unlock(&mut self, id: &str, at: NaiveDateTime) -> Result<()> {
        let record = self
            .achievements
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::UnknownAchievement(id.to_string()))?;
        if !record.unlocked {
            record.unlocked = true;
            record.unlocked_at = Some(at);
        }
        Ok(())
    }
}

/// Volatile store backing tests, benchmarks and embedders that handle
/// persistence themselves.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    pub library: LibraryData,
    pub stats: StatsData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_book(id: &str, name: &str, words: &[WordImport]) -> Self {
        let mut store = Self::new();
        store.library.put_book(id, name, words, None);
        store
    }
}

impl WordStore for MemoryStore {
    fn books(&self) -> Result<Vec<Book>> {
        Ok(self.library.books.iter().map(|b| b.book.clone()).collect())
    }

    fn words(&self, book: &str) -> Result<Vec<Word>> {
        Ok(self.library.book(book)?.words.clone())
    }

    fn set_mastered(&mut self, book: &str, rank: u32, mastered: bool) -> Result<()> {
        self.library.set_mastered(book, rank, mastered)
    }

    fn upsert_wrong(&mut self, word: &Word, at: NaiveDateTime) -> Result<()> {
        self.library.upsert_wrong(word, at);
        Ok(())
    }

    fn delete_wrong(&mut self, book: &str, rank: u32) -> Result<()> {
        self.library.delete_wrong(book, rank);
        Ok(())
    }

    fn list_wrong(&self) -> Result<Vec<WrongEntry>> {
        Ok(self.library.sorted_wrong())
    }

    fn upsert_favorite(&mut self, word: &Word, at: NaiveDateTime) -> Result<()> {
        self.library.upsert_favorite(word, at);
        Ok(())
    }

    fn delete_favorite(&mut self, book: &str, rank: u32) -> Result<()> {
        self.library.delete_favorite(book, rank);
        Ok(())
    }

    fn list_favorites(&self) -> Result<Vec<FavoriteEntry>> {
        Ok(self.library.sorted_favorites())
    }

    fn is_favorite(&self, book: &str, rank: u32) -> Result<bool> {
        Ok(self.library.is_favorite(book, rank))
    }

    fn book_progress(&self, book: &str) -> Result<BookProgress> {
        Ok(self.library.book(book)?.book.progress())
    }

    fn increment_progress(&mut self, book: &str) -> Result<()> {
        self.library.increment_progress(book)
    }

    fn reset_progress(&mut self, book: &str) -> Result<()> {
        self.library.reset_progress(book)
    }

    fn create_custom_book(
        &mut self,
        id: &str,
        name: &str,
        words: &[WordImport],
        at: NaiveDateTime,
    ) -> Result<Book> {
        Ok(self.library.put_book(id, name, words, Some(at)))
    }
}

impl StatStore for MemoryStore {
    fn record_answer(&mut self, day: NaiveDate, correct: bool) -> Result<()> {
        self.stats.record_answer(day, correct);
        Ok(())
    }

    fn add_duration(&mut self, day: NaiveDate, seconds: u64) -> Result<()> {
        self.stats.add_duration(day, seconds);
        Ok(())
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
        self.stats.unlock(id, at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn store(n: usize) -> MemoryStore {
        let words: Vec<WordImport> = (0..n)
            .map(|i| WordImport::new(&format!("word{i}"), &format!("词{i}")))
            .collect();
        MemoryStore::with_book("b", "Book", &words)
    }

    #[test]
    fn ranks_start_at_one() {
        let s = store(3);
        let ranks: Vec<u32> = s.words("b").unwrap().iter().map(|w| w.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(s.book_progress("b").unwrap().total, 3);
    }

    #[test]
    fn unknown_book_is_an_error() {
        let s = store(1);
        assert!(matches!(s.words("nope"), Err(StoreError::BookNotFound(_))));
    }

    #[test]
    fn random_unmastered_skips_mastered() {
        let mut s = store(6);
        s.set_mastered("b", 2, true).unwrap();
        s.set_mastered("b", 5, true).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let picked = s.random_unmastered("b", 10, &mut rng).unwrap();
        assert_eq!(picked.len(), 4);
        assert!(picked.iter().all(|w| !w.mastered));
    }

    #[test]
    fn random_others_excludes_rank() {
        let s = store(4);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..20 {
            let others = s.random_others("b", 2, 3, &mut rng).unwrap();
            assert_eq!(others.len(), 3);
            assert!(others.iter().all(|w| w.rank != 2));
        }
    }

    #[test]
    fn wrong_upsert_counts_repeat_misses() {
        let mut s = store(2);
        let word = s.words("b").unwrap()[0].clone();
        s.upsert_wrong(&word, at(1, 9)).unwrap();
        s.upsert_wrong(&word, at(2, 9)).unwrap();
        let wrong = s.list_wrong().unwrap();
        assert_eq!(wrong.len(), 1);
        assert_eq!(wrong[0].wrong_count, 2);
        assert_eq!(wrong[0].last_wrong, at(2, 9));
    }

    #[test]
    fn wrong_list_is_most_recent_first() {
        let mut s = store(3);
        let words = s.words("b").unwrap();
        s.upsert_wrong(&words[0], at(1, 9)).unwrap();
        s.upsert_wrong(&words[1], at(3, 9)).unwrap();
        s.upsert_wrong(&words[2], at(2, 9)).unwrap();
        let ranks: Vec<u32> = s.list_wrong().unwrap().iter().map(|e| e.word.rank).collect();
        assert_eq!(ranks, vec![2, 3, 1]);

        s.delete_wrong("b", 3).unwrap();
        assert_eq!(s.list_wrong().unwrap().len(), 2);
    }

    #[test]
    fn snapshots_survive_book_reimport() {
        let mut s = store(1);
        let word = s.words("b").unwrap()[0].clone();
        s.upsert_favorite(&word, at(1, 8)).unwrap();
        s.create_custom_book("b", "Book", &[WordImport::new("changed", "改")], at(2, 8))
            .unwrap();
        assert_eq!(s.list_favorites().unwrap()[0].word.headword, "word0");
    }

    #[test]
    fn favorite_insert_is_idempotent() {
        let mut s = store(1);
        let word = s.words("b").unwrap()[0].clone();
        s.upsert_favorite(&word, at(1, 8)).unwrap();
        s.upsert_favorite(&word, at(1, 9)).unwrap();
        assert_eq!(s.list_favorites().unwrap().len(), 1);
        assert!(s.is_favorite("b", 1).unwrap());
        s.delete_favorite("b", 1).unwrap();
        assert!(!s.is_favorite("b", 1).unwrap());
    }

    #[test]
    fn progress_increments_blindly_up_to_total() {
        let mut s = store(2);
        for _ in 0..5 {
            s.increment_progress("b").unwrap();
        }
        assert_eq!(s.book_progress("b").unwrap().current, 2);
    }

    #[test]
    fn reset_clears_counter_and_mastery() {
        let mut s = store(3);
        s.increment_progress("b").unwrap();
        s.set_mastered("b", 1, true).unwrap();
        s.reset_progress("b").unwrap();
        assert_eq!(s.book_progress("b").unwrap().current, 0);
        assert!(s.words("b").unwrap().iter().all(|w| !w.mastered));
    }

    #[test]
    fn daily_counters_accumulate() {
        let mut s = MemoryStore::new();
        s.record_answer(date(1), true).unwrap();
        s.record_answer(date(1), false).unwrap();
        s.add_duration(date(1), 30).unwrap();
        s.record_answer(date(3), true).unwrap();

        let d1 = s.day(date(1)).unwrap();
        assert_eq!((d1.learned, d1.correct, d1.wrong, d1.duration_secs), (2, 1, 1, 30));
        assert_eq!(s.day(date(2)).unwrap(), DailyStat::empty(date(2)));

        let total = s.cumulative().unwrap();
        assert_eq!(total.total_learned, 3);
        assert_eq!(total.total_days, 2);

        let recent: Vec<NaiveDate> = s.recent_days(7).unwrap().iter().map(|d| d.date).collect();
        assert_eq!(recent, vec![date(3), date(1)]);
    }

    #[test]
    fn unlock_keeps_first_timestamp() {
        let mut s = MemoryStore::new();
        s.unlock("first_word", at(1, 10)).unwrap();
        s.unlock("first_word", at(2, 10)).unwrap();
        let record = s
            .list_achievements()
            .unwrap()
            .into_iter()
            .find(|a| a.id == "first_word")
            .unwrap();
        assert!(record.unlocked);
        assert_eq!(record.unlocked_at, Some(at(1, 10)));
        assert!(matches!(
            s.unlock("no_such", at(1, 10)),
            Err(StoreError::UnknownAchievement(_))
        ));
    }
}
