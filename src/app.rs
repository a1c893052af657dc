use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::book::{Book, BookProgress};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::engine::achievements::{self, Achievement, AchievementDef};
use crate::engine::evaluator::{self, Effect, Submission};
use crate::engine::quiz::{self, QuizMode};
use crate::engine::selector;
use crate::engine::stats::{self, Statistics};
use crate::error::{Result, StoreError};
use crate::session::result::{
    AdvanceOutcome, AnswerResult, QuestionKind, QuestionView, SessionSummary,
};
use crate::session::state::{Phase, Session, SessionSource, Stage, Step};
use crate::store::schema::{DailyStat, FavoriteEntry, WrongEntry};
use crate::store::{StatStore, WordStore};
use crate::word::{Word, WordImport};

/// Process-wide context: configuration, the store it exclusively owns, the
/// random source and the clock. Sessions are plain values owned by the
/// caller and handed back in on every call.
pub struct App<S, R = SmallRng> {
    pub config: Config,
    store: S,
    rng: R,
    clock: Box<dyn Clock>,
}

impl<S: WordStore + StatStore> App<S, SmallRng> {
    pub fn new(config: Config, store: S) -> Self {
        Self::with_parts(config, store, SmallRng::from_entropy(), Box::new(SystemClock))
    }
}

impl<S: WordStore + StatStore, R: Rng> App<S, R> {
    pub fn with_parts(config: Config, store: S, rng: R, clock: Box<dyn Clock>) -> Self {
        Self {
            config,
            store,
            rng,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // --- sessions ---

    /// Quiz session over unmastered words of `book`. An exhausted book
    /// yields a session that is already complete.
    pub fn start_session(&mut self, book: &str, count: usize, mode: QuizMode) -> Result<Session> {
        self.start_book_session(book, count, mode, false)
    }

    /// Like [`App::start_session`], preceded by a presentation pass over the
    /// same words.
    pub fn start_study(&mut self, book: &str, count: usize, mode: QuizMode) -> Result<Session> {
        self.start_book_session(book, count, mode, true)
    }

    fn start_book_session(
        &mut self,
        book: &str,
        count: usize,
        mode: QuizMode,
        review_first: bool,
    ) -> Result<Session> {
        let count = selector::clamp_count(count);
        let words = selector::select(&self.store, book, count, &mut self.rng)?;
        if words.is_empty() {
            info!(book, "book complete, nothing left to learn");
        } else {
            info!(book, words = words.len(), mode = mode.as_str(), review_first, "session started");
        }
        Ok(self.new_session(words, mode, SessionSource::Book(book.to_string()), review_first))
    }

    /// Quiz session over the most recently missed words, mastered or not.
    pub fn practice_wrong(&mut self, count: usize, mode: QuizMode) -> Result<Session> {
        let words = selector::select_wrong(&self.store, selector::clamp_count(count))?;
        info!(words = words.len(), mode = mode.as_str(), "wrong-word practice started");
        Ok(self.new_session(words, mode, SessionSource::WrongLedger, false))
    }

    fn new_session(
        &self,
        words: Vec<Word>,
        mode: QuizMode,
        source: SessionSource,
        review_first: bool,
    ) -> Session {
        Session::new(
            words,
            mode,
            self.config.option_count,
            source,
            self.clock.now(),
            review_first,
        )
    }

    /// Present the current position, building its question on first call.
    /// Returns `None` once the session is complete. A store failure leaves
    /// the session untouched.
    pub fn current_question(&mut self, session: &mut Session) -> Result<Option<QuestionView>> {
        if session.phase() == Phase::AwaitingPresent {
            let Some(word) = session.current_word().cloned() else {
                return Ok(None);
            };
            match session.stage() {
                Stage::Review => session.present_card(),
                Stage::Quiz => {
                    let question = quiz::build_question(
                        &self.store,
                        &mut self.rng,
                        &word,
                        session.mode(),
                        session.option_count(),
                    )?;
                    debug!(
                        book = %word.book,
                        rank = word.rank,
                        options = question.options.len(),
                        "question built"
                    );
                    session.present(question);
                }
            }
        }
        Ok(view(session))
    }

    /// Score one submission. Invalid input comes back as
    /// [`AnswerResult::Rejected`] and changes nothing.
    pub fn submit_answer(
        &mut self,
        session: &mut Session,
        submission: Submission,
    ) -> Result<AnswerResult> {
        let question = match session.check_answerable() {
            Ok(question) => question.clone(),
            Err(rejection) => return Ok(AnswerResult::Rejected(rejection)),
        };
        let evaluation = match evaluator::evaluate(&question, &submission) {
            Ok(evaluation) => evaluation,
            Err(rejection) => return Ok(AnswerResult::Rejected(rejection)),
        };

        self.apply(&evaluation.effects)?;
        let unlocked = self.check_achievements()?;
        session.record(evaluation.is_correct);

        info!(
            book = %question.target.book,
            rank = question.target.rank,
            correct = evaluation.is_correct,
            "answer scored"
        );

        Ok(AnswerResult::Scored {
            correct: evaluation.is_correct,
            correct_position: question
                .mode
                .is_recognition()
                .then_some(question.correct_position),
            answer: question.answer_text().to_string(),
            word: question.target,
            unlocked,
        })
    }

    /// Move past the current position. Passing a review card marks its word
    /// mastered; passing the last quiz position flushes the session
    /// duration before completing.
    pub fn advance(&mut self, session: &mut Session) -> Result<AdvanceOutcome> {
        if !session.can_advance() {
            return Ok(AdvanceOutcome::NotApplicable);
        }

        if session.stage() == Stage::Review {
            if let Some(word) = session.current_word() {
                self.store.set_mastered(&word.book, word.rank, true)?;
            }
        }

        if session.next_step() == Step::Finished {
            let elapsed = self.flush_duration(session)?;
            session.step();
            let summary = SessionSummary::from_session(session, elapsed, false);
            info!(
                correct = summary.correct,
                wrong = summary.wrong,
                elapsed_secs = elapsed,
                "session complete"
            );
            return Ok(AdvanceOutcome::Complete(summary));
        }

        if session.step() == Step::QuizStarts {
            debug!("review finished, quiz starts");
        }
        Ok(AdvanceOutcome::Continuing)
    }

    /// Stop before the last word, crediting the time spent so far.
    pub fn end_early(&mut self, session: &mut Session) -> Result<Option<SessionSummary>> {
        if session.is_complete() {
            return Ok(None);
        }
        let elapsed = self.flush_duration(session)?;
        session.finish();
        info!(answered = session.answered(), elapsed_secs = elapsed, "session ended early");
        Ok(Some(SessionSummary::from_session(session, elapsed, true)))
    }

    fn flush_duration(&mut self, session: &Session) -> Result<u64> {
        let now = self.clock.now();
        let elapsed = (now - session.started_at()).num_seconds().max(0) as u64;
        self.store.add_duration(now.date(), elapsed)?;
        Ok(elapsed)
    }

    fn apply(&mut self, effects: &[Effect]) -> Result<()> {
        let now = self.clock.now();
        for effect in effects {
            match effect {
                Effect::RecordAnswer { correct } => self.store.record_answer(now.date(), *correct)?,
                Effect::AdvanceProgress { book } => self.store.increment_progress(book)?,
                Effect::UpsertWrong { word } => self.store.upsert_wrong(word, now)?,
            }
        }
        Ok(())
    }

    fn check_achievements(&mut self) -> Result<Vec<&'static AchievementDef>> {
        let stats = stats::collect(&self.store, self.clock.today())?;
        let records = self.store.list_achievements()?;
        let fresh = achievements::newly_unlocked(&stats, &records);
        let now = self.clock.now();
        for def in &fresh {
            self.store.unlock(def.id, now)?;
            info!(achievement = def.id, "achievement unlocked");
        }
        Ok(fresh)
    }

    // --- word state ---

    pub fn mark_mastered(&mut self, book: &str, rank: u32) -> Result<()> {
        self.store.set_mastered(book, rank, true)
    }

    /// Flip the favorite flag and return the new state.
    pub fn toggle_favorite(&mut self, book: &str, rank: u32) -> Result<bool> {
        if self.store.is_favorite(book, rank)? {
            self.store.delete_favorite(book, rank)?;
            return Ok(false);
        }
        let word = self.find_word(book, rank)?;
        self.store.upsert_favorite(&word, self.clock.now())?;
        Ok(true)
    }

    pub fn is_favorite(&self, book: &str, rank: u32) -> Result<bool> {
        self.store.is_favorite(book, rank)
    }

    pub fn favorites(&self) -> Result<Vec<FavoriteEntry>> {
        self.store.list_favorites()
    }

    pub fn remove_favorite(&mut self, book: &str, rank: u32) -> Result<()> {
        self.store.delete_favorite(book, rank)
    }

    pub fn wrong_words(&self) -> Result<Vec<WrongEntry>> {
        self.store.list_wrong()
    }

    pub fn remove_wrong(&mut self, book: &str, rank: u32) -> Result<()> {
        self.store.delete_wrong(book, rank)
    }

    /// Record a miss for `word` outside of scoring, e.g. from a review card.
    pub fn flag_wrong(&mut self, word: &Word) -> Result<Vec<&'static AchievementDef>> {
        self.apply(&[
            Effect::RecordAnswer { correct: false },
            Effect::UpsertWrong { word: word.clone() },
        ])?;
        self.check_achievements()
    }

    fn find_word(&self, book: &str, rank: u32) -> Result<Word> {
        self.store
            .words(book)?
            .into_iter()
            .find(|w| w.rank == rank)
            .ok_or_else(|| StoreError::WordNotFound {
                book: book.to_string(),
                rank,
            })
    }

    // --- books ---

    pub fn books(&self) -> Result<Vec<Book>> {
        self.store.books()
    }

    pub fn book_progress(&self, book: &str) -> Result<BookProgress> {
        self.store.book_progress(book)
    }

    pub fn reset_progress(&mut self, book: &str) -> Result<()> {
        self.store.reset_progress(book)?;
        info!(book, "book progress reset");
        Ok(())
    }

    pub fn import_book(&mut self, id: &str, name: &str, words: &[WordImport]) -> Result<Book> {
        let book = self
            .store
            .create_custom_book(id, name, words, self.clock.now())?;
        info!(book = id, words = book.total, "custom book imported");
        Ok(book)
    }

    // --- statistics ---

    pub fn statistics(&self) -> Result<Statistics> {
        stats::collect(&self.store, self.clock.today())
    }

    pub fn recent_days(&self, limit: usize) -> Result<Vec<DailyStat>> {
        self.store.recent_days(limit)
    }

    pub fn achievements(&self) -> Result<Vec<Achievement>> {
        Ok(achievements::with_state(&self.store.list_achievements()?))
    }
}

fn view(session: &Session) -> Option<QuestionView> {
    let word = session.current_word()?.clone();
    let answered = session.phase() == Phase::Advancing;
    let (prompt, kind, reveal) = match (session.stage(), session.question()) {
        (Stage::Review, _) => (
            word.headword.clone(),
            QuestionKind::Card,
            Some(word.translation.clone()),
        ),
        (Stage::Quiz, Some(question)) => {
            let kind = if question.mode.is_recognition() {
                QuestionKind::Choice {
                    options: question
                        .option_labels()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                }
            } else {
                QuestionKind::Spelling
            };
            let reveal = answered.then(|| question.answer_text().to_string());
            (question.prompt.clone(), kind, reveal)
        }
        (Stage::Quiz, None) => return None,
    };
    Some(QuestionView {
        position: session.index(),
        total: session.total(),
        stage: session.stage(),
        word,
        prompt,
        kind,
        reveal,
    })
}
