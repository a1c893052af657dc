use std::cell::Cell;
use std::collections::HashSet;
use std::io;
use std::rc::Rc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tempfile::TempDir;

use lexdrill::app::App;
use lexdrill::book::{Book, BookProgress};
use lexdrill::clock::{Clock, FixedClock};
use lexdrill::config::Config;
use lexdrill::engine::evaluator::{Rejection, Submission};
use lexdrill::engine::quiz::QuizMode;
use lexdrill::error::{Result, StoreError};
use lexdrill::session::{AdvanceOutcome, AnswerResult, Phase, QuestionKind, Session, Stage};
use lexdrill::store::json_store::JsonStore;
use lexdrill::store::memory::MemoryStore;
use lexdrill::store::schema::{
    AchievementRecord, Cumulative, DailyStat, FavoriteEntry, WrongEntry,
};
use lexdrill::store::{StatStore, WordStore};
use lexdrill::word::{Word, WordImport};

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
}

fn words(prefix: &str, n: usize) -> Vec<WordImport> {
    (0..n)
        .map(|i| WordImport::new(&format!("{prefix}{i}"), &format!("{prefix}-t{i}")))
        .collect()
}

fn app_with<S: WordStore + StatStore>(store: S, seed: u64) -> (App<S, SmallRng>, FixedClock) {
    let clock = FixedClock::at_noon(start_date());
    let app = App::with_parts(
        Config::default(),
        store,
        SmallRng::seed_from_u64(seed),
        Box::new(clock.clone()),
    );
    (app, clock)
}

fn book_app(n: usize) -> (App<MemoryStore, SmallRng>, FixedClock) {
    app_with(MemoryStore::with_book("b", "Book", &words("w", n)), 42)
}

/// Present the current position and answer it right or wrong.
fn answer<S: WordStore + StatStore>(
    app: &mut App<S, SmallRng>,
    session: &mut Session,
    correct: bool,
) -> AnswerResult {
    let view = app.current_question(session).unwrap().unwrap();
    let submission = match view.kind {
        QuestionKind::Choice { options } => {
            let right = session.question().unwrap().correct_position;
            if correct {
                Submission::Choice(right)
            } else {
                Submission::Choice((right + 1) % options.len())
            }
        }
        QuestionKind::Spelling if correct => Submission::Text(view.word.headword.clone()),
        QuestionKind::Spelling => Submission::Skip,
        QuestionKind::Card => panic!("cards cannot be answered"),
    };
    app.submit_answer(session, submission).unwrap()
}

fn unlocked_ids(result: &AnswerResult) -> Vec<&'static str> {
    match result {
        AnswerResult::Scored { unlocked, .. } => unlocked.iter().map(|d| d.id).collect(),
        AnswerResult::Rejected(r) => panic!("answer rejected: {r:?}"),
    }
}

#[test]
fn five_word_session_three_right_two_wrong() {
    let (mut app, clock) = book_app(12);
    let mut session = app.start_session("b", 5, QuizMode::CnToEn).unwrap();
    assert_eq!(session.total(), 5);

    for i in 0..5 {
        let result = answer(&mut app, &mut session, i < 3);
        assert!(result.is_scored());
        if i == 4 {
            clock.advance(Duration::seconds(95));
            match app.advance(&mut session).unwrap() {
                AdvanceOutcome::Complete(summary) => {
                    assert_eq!((summary.correct, summary.wrong), (3, 2));
                    assert_eq!(summary.elapsed_secs, 95);
                    assert!((summary.accuracy - 60.0).abs() < 1e-9);
                }
                other => panic!("expected completion, got {other:?}"),
            }
        } else {
            assert_eq!(app.advance(&mut session).unwrap(), AdvanceOutcome::Continuing);
        }
    }

    assert!(session.is_complete());
    let today = app.statistics().unwrap().today;
    assert_eq!((today.learned, today.correct, today.wrong), (5, 3, 2));
    assert_eq!(today.duration_secs, 95);
    assert_eq!(
        app.book_progress("b").unwrap(),
        BookProgress {
            current: 3,
            total: 12
        }
    );
    let wrong = app.wrong_words().unwrap();
    assert_eq!(wrong.len(), 2);
    assert!(wrong.iter().all(|e| e.wrong_count == 1));
}

#[test]
fn missing_a_word_twice_keeps_one_ledger_row() {
    let (mut app, clock) = book_app(10);
    let mut session = app.start_session("b", 5, QuizMode::Spelling).unwrap();
    answer(&mut app, &mut session, false);
    let missed = session.current_word().unwrap().clone();
    app.end_early(&mut session).unwrap();

    clock.advance(Duration::minutes(5));
    let mut practice = app.practice_wrong(5, QuizMode::Spelling).unwrap();
    assert_eq!(practice.words(), std::slice::from_ref(&missed));
    answer(&mut app, &mut practice, false);

    let wrong = app.wrong_words().unwrap();
    assert_eq!(wrong.len(), 1);
    assert_eq!(wrong[0].wrong_count, 2);
    assert_eq!(wrong[0].last_wrong, clock.now());
}

#[test]
fn ten_words_unlocks_exactly_once() {
    let (mut app, _) = book_app(40);
    let mut fired_at = Vec::new();
    let mut answered = 0;
    for _ in 0..3 {
        let mut session = app.start_session("b", 5, QuizMode::EnToCn).unwrap();
        while !session.is_complete() {
            let result = answer(&mut app, &mut session, true);
            answered += 1;
            if unlocked_ids(&result).contains(&"ten_words") {
                fired_at.push(answered);
            }
            app.advance(&mut session).unwrap();
        }
    }
    assert_eq!(answered, 15);
    assert_eq!(fired_at, vec![10]);

    let ten = app
        .achievements()
        .unwrap()
        .into_iter()
        .find(|a| a.def.id == "ten_words")
        .unwrap();
    assert!(ten.unlocked);
    assert!(ten.unlocked_at.is_some());
}

#[test]
fn streak_counts_back_to_first_gap() {
    fn one_answer(app: &mut App<MemoryStore, SmallRng>) {
        let mut session = app.start_session("b", 5, QuizMode::CnToEn).unwrap();
        answer(app, &mut session, true);
        app.end_early(&mut session).unwrap();
    }

    let (mut app, clock) = book_app(30);

    one_answer(&mut app);
    clock.advance(Duration::days(2));
    one_answer(&mut app);
    clock.advance(Duration::days(1));
    one_answer(&mut app);

    let stats = app.statistics().unwrap();
    assert_eq!(stats.streak_days, 2);
    assert_eq!(stats.total_days, 3);
    assert_eq!(stats.total_learned, 3);

    clock.advance(Duration::days(1));
    assert_eq!(app.statistics().unwrap().streak_days, 0);
    let recent = app.recent_days(7).unwrap();
    assert_eq!(recent.len(), 3);
    assert!(recent[0].date > recent[1].date);
}

#[test]
fn accuracy_is_zero_without_activity() {
    let (app, _) = book_app(5);
    let stats = app.statistics().unwrap();
    assert_eq!(stats.today_accuracy, 0.0);
    assert_eq!(stats.streak_days, 0);
}

#[test]
fn double_submission_is_a_no_op() {
    let (mut app, _) = book_app(10);
    let mut session = app.start_session("b", 5, QuizMode::CnToEn).unwrap();
    answer(&mut app, &mut session, true);
    let again = app.submit_answer(&mut session, Submission::Choice(0)).unwrap();
    assert!(matches!(again, AnswerResult::Rejected(Rejection::AlreadyAnswered)));
    assert_eq!(app.statistics().unwrap().today.learned, 1);
    assert_eq!(session.answered(), 1);
}

#[test]
fn out_of_range_choice_is_rejected() {
    let (mut app, _) = book_app(10);
    let mut session = app.start_session("b", 5, QuizMode::CnToEn).unwrap();
    app.current_question(&mut session).unwrap();
    let result = app.submit_answer(&mut session, Submission::Choice(9)).unwrap();
    assert!(matches!(result, AnswerResult::Rejected(Rejection::NoSuchOption)));
    assert_eq!(session.phase(), Phase::AwaitingAnswer);
}

#[test]
fn advancing_out_of_turn_is_not_applicable() {
    let (mut app, _) = book_app(10);
    let mut session = app.start_session("b", 5, QuizMode::CnToEn).unwrap();
    assert_eq!(app.advance(&mut session).unwrap(), AdvanceOutcome::NotApplicable);
    app.current_question(&mut session).unwrap();
    assert_eq!(app.advance(&mut session).unwrap(), AdvanceOutcome::NotApplicable);

    while !session.is_complete() {
        answer(&mut app, &mut session, false);
        app.advance(&mut session).unwrap();
    }
    assert_eq!(app.advance(&mut session).unwrap(), AdvanceOutcome::NotApplicable);
    assert!(app.current_question(&mut session).unwrap().is_none());
}

#[test]
fn review_pass_masters_words_then_quizzes_them() {
    let (mut app, _) = book_app(10);
    let mut session = app.start_study("b", 5, QuizMode::CnToEn).unwrap();
    let studied: Vec<u32> = session.words().iter().map(|w| w.rank).collect();

    for i in 0..5 {
        let view = app.current_question(&mut session).unwrap().unwrap();
        assert_eq!(view.stage, Stage::Review);
        assert_eq!(view.kind, QuestionKind::Card);
        assert_eq!(view.position, i);
        assert_eq!(app.advance(&mut session).unwrap(), AdvanceOutcome::Continuing);
    }

    let view = app.current_question(&mut session).unwrap().unwrap();
    assert_eq!(view.stage, Stage::Quiz);
    assert_eq!(view.position, 0);
    assert_eq!(view.word.rank, studied[0]);

    let mastered: HashSet<u32> = app
        .store()
        .words("b")
        .unwrap()
        .into_iter()
        .filter(|w| w.mastered)
        .map(|w| w.rank)
        .collect();
    assert_eq!(mastered, studied.iter().copied().collect());
    assert_eq!(app.statistics().unwrap().today.learned, 0);
}

#[test]
fn exhausted_book_reports_complete() {
    let (mut app, _) = book_app(5);
    let mut session = app.start_study("b", 5, QuizMode::CnToEn).unwrap();
    while !session.is_complete() {
        app.current_question(&mut session).unwrap();
        if session.stage() == Stage::Quiz {
            app.end_early(&mut session).unwrap();
        } else {
            app.advance(&mut session).unwrap();
        }
    }
    let next = app.start_session("b", 5, QuizMode::CnToEn).unwrap();
    assert!(next.is_empty());
    assert!(next.is_complete());

    app.reset_progress("b").unwrap();
    let fresh = app.start_session("b", 5, QuizMode::CnToEn).unwrap();
    assert_eq!(fresh.total(), 5);
}

#[test]
fn wrong_practice_uses_each_words_own_book() {
    let mut store = MemoryStore::with_book("a", "A", &words("a", 6));
    store.library.put_book("b", "B", &words("b", 6), None);
    let (mut app, clock) = app_with(store, 3);

    let from_a = app.store().words("a").unwrap()[1].clone();
    let from_b = app.store().words("b").unwrap()[4].clone();
    app.flag_wrong(&from_a).unwrap();
    clock.advance(Duration::seconds(1));
    app.flag_wrong(&from_b).unwrap();

    let mut session = app.practice_wrong(10, QuizMode::CnToEn).unwrap();
    assert_eq!(session.total(), 2);
    assert_eq!(session.words()[0].key(), from_b.key());

    for _ in 0..2 {
        let view = app.current_question(&mut session).unwrap().unwrap();
        let book = view.word.book.clone();
        let options = session.question().unwrap().options.clone();
        assert!(options.iter().all(|w| w.book == book));
        answer(&mut app, &mut session, true);
        app.advance(&mut session).unwrap();
    }
    assert_eq!(app.book_progress("a").unwrap().current, 1);
    assert_eq!(app.book_progress("b").unwrap().current, 1);
}

#[test]
fn favorites_toggle_and_snapshot() {
    let (mut app, _) = book_app(5);
    assert!(app.toggle_favorite("b", 2).unwrap());
    assert!(app.is_favorite("b", 2).unwrap());
    assert_eq!(app.favorites().unwrap()[0].word.headword, "w1");
    assert!(!app.toggle_favorite("b", 2).unwrap());
    assert!(app.favorites().unwrap().is_empty());
}

#[test]
fn same_seed_same_session() {
    let run = || {
        let (mut app, _) = book_app(40);
        let mut session = app.start_session("b", 8, QuizMode::CnToEn).unwrap();
        let view = app.current_question(&mut session).unwrap().unwrap();
        (session.words().to_vec(), view.kind)
    };
    assert_eq!(run(), run());
}

#[test]
fn import_creates_custom_book() {
    let (mut app, _) = book_app(5);
    let book: Book = app.import_book("mine", "My words", &words("m", 7)).unwrap();
    assert!(book.is_custom());
    assert_eq!(book.total, 7);
    let ranks: Vec<u32> = app.store().words("mine").unwrap().iter().map(|w| w.rank).collect();
    assert_eq!(ranks, (1..=7).collect::<Vec<_>>());
    assert_eq!(app.books().unwrap().len(), 2);
}

#[test]
fn json_store_keeps_results_across_restarts() {
    let dir = TempDir::new().unwrap();
    let first_rank = {
        let store = JsonStore::open(dir.path().to_path_buf()).unwrap();
        let (mut app, _) = app_with(store, 9);
        let mut session = app.start_session("CET4_1", 5, QuizMode::CnToEn).unwrap();
        answer(&mut app, &mut session, false);
        let rank = session.current_word().unwrap().rank;
        app.end_early(&mut session).unwrap();
        rank
    };

    let store = JsonStore::open(dir.path().to_path_buf()).unwrap();
    let (app, _) = app_with(store, 9);
    let wrong = app.wrong_words().unwrap();
    assert_eq!(wrong.len(), 1);
    assert_eq!(wrong[0].word.rank, first_rank);
    let today = app.statistics().unwrap().today;
    assert_eq!((today.learned, today.wrong), (1, 1));
    assert!(
        app.achievements()
            .unwrap()
            .iter()
            .any(|a| a.def.id == "first_word" && a.unlocked)
    );
}

/// MemoryStore whose stat writes can be switched off.
struct FlakyStore {
    inner: MemoryStore,
    broken: Rc<Cell<bool>>,
}

impl FlakyStore {
    fn check(&self) -> Result<()> {
        if self.broken.get() {
            return Err(StoreError::Io(io::Error::other("disk unavailable")));
        }
        Ok(())
    }
}

impl WordStore for FlakyStore {
    fn books(&self) -> Result<Vec<Book>> {
        self.inner.books()
    }
    fn words(&self, book: &str) -> Result<Vec<Word>> {
        self.inner.words(book)
    }
    fn set_mastered(&mut self, book: &str, rank: u32, mastered: bool) -> Result<()> {
        self.inner.set_mastered(book, rank, mastered)
    }
    fn upsert_wrong(&mut self, word: &Word, at: NaiveDateTime) -> Result<()> {
        self.inner.upsert_wrong(word, at)
    }
    fn delete_wrong(&mut self, book: &str, rank: u32) -> Result<()> {
        self.inner.delete_wrong(book, rank)
    }
    fn list_wrong(&self) -> Result<Vec<WrongEntry>> {
        self.inner.list_wrong()
    }
    fn upsert_favorite(&mut self, word: &Word, at: NaiveDateTime) -> Result<()> {
        self.inner.upsert_favorite(word, at)
    }
    fn delete_favorite(&mut self, book: &str, rank: u32) -> Result<()> {
        self.inner.delete_favorite(book, rank)
    }
    fn list_favorites(&self) -> Result<Vec<FavoriteEntry>> {
        self.inner.list_favorites()
    }
    fn is_favorite(&self, book: &str, rank: u32) -> Result<bool> {
        self.inner.is_favorite(book, rank)
    }
    fn book_progress(&self, book: &str) -> Result<BookProgress> {
        self.inner.book_progress(book)
    }
    fn increment_progress(&mut self, book: &str) -> Result<()> {
        self.inner.increment_progress(book)
    }
    fn reset_progress(&mut self, book: &str) -> Result<()> {
        self.inner.reset_progress(book)
    }
    fn create_custom_book(
        &mut self,
        id: &str,
        name: &str,
        words: &[WordImport],
        at: NaiveDateTime,
    ) -> Result<Book> {
        self.inner.create_custom_book(id, name, words, at)
    }
}

impl StatStore for FlakyStore {
    fn record_answer(&mut self, day: NaiveDate, correct: bool) -> Result<()> {
        self.check()?;
        self.inner.record_answer(day, correct)
    }
    fn add_duration(&mut self, day: NaiveDate, seconds: u64) -> Result<()> {
        self.check()?;
        self.inner.add_duration(day, seconds)
    }
    fn day(&self, day: NaiveDate) -> Result<DailyStat> {
        self.inner.day(day)
    }
    fn cumulative(&self) -> Result<Cumulative> {
        self.inner.cumulative()
    }
    fn recent_days(&self, limit: usize) -> Result<Vec<DailyStat>> {
        self.inner.recent_days(limit)
    }
    fn list_achievements(&self) -> Result<Vec<AchievementRecord>> {
        self.inner.list_achievements()
    }
    fn unlock(&mut self, id: &str, at: NaiveDateTime) -> Result<()> {
        self.inner.unlock(id, at)
    }
}

#[test]
fn store_failure_leaves_session_retryable() {
    let broken = Rc::new(Cell::new(false));
    let store = FlakyStore {
        inner: MemoryStore::with_book("b", "Book", &words("w", 8)),
        broken: Rc::clone(&broken),
    };
    let (mut app, _) = app_with(store, 5);
    let mut session = app.start_session("b", 5, QuizMode::Spelling).unwrap();
    let view = app.current_question(&mut session).unwrap().unwrap();
    let typed = Submission::Text(view.word.headword.clone());

    broken.set(true);
    let err = app.submit_answer(&mut session, typed.clone());
    assert!(matches!(err, Err(StoreError::Io(_))));
    assert_eq!(session.phase(), Phase::AwaitingAnswer);
    assert_eq!(session.answered(), 0);

    broken.set(false);
    let result = app.submit_answer(&mut session, typed).unwrap();
    assert!(matches!(result, AnswerResult::Scored { correct: true, .. }));
    assert_eq!(app.statistics().unwrap().today.correct, 1);

    for _ in 1..5 {
        app.advance(&mut session).unwrap();
        answer(&mut app, &mut session, true);
    }
    broken.set(true);
    assert!(app.advance(&mut session).is_err());
    assert_eq!(session.phase(), Phase::Advancing);
    broken.set(false);
    assert!(matches!(
        app.advance(&mut session).unwrap(),
        AdvanceOutcome::Complete(_)
    ));
}
