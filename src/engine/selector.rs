use rand::Rng;
use rand::seq::index;

use crate::error::Result;
use crate::store::WordStore;
use crate::word::Word;

pub const MIN_SESSION_WORDS: usize = 5;
pub const MAX_SESSION_WORDS: usize = 100;

/// Clamp a requested session size to the range the front end offers.
pub fn clamp_count(count: usize) -> usize {
    count.clamp(MIN_SESSION_WORDS, MAX_SESSION_WORDS)
}

/// Draw up to `count` items uniformly without replacement. The result is
/// in random order; fewer items come back when the pool is smaller.
pub fn sample_words<R: Rng + ?Sized>(pool: Vec<Word>, count: usize, rng: &mut R) -> Vec<Word> {
    let amount = count.min(pool.len());
    if amount == 0 {
        return Vec::new();
    }
    let mut slots: Vec<Option<Word>> = pool.into_iter().map(Some).collect();
    index::sample(rng, slots.len(), amount)
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

/// Working set for a book session: unmastered words only. An empty result
/// means the book is finished.
pub fn select<S: WordStore, R: Rng + ?Sized>(
    store: &S,
    book: &str,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Word>> {
    store.random_unmastered(book, count, rng)
}

/// Working set for wrong-word practice: the most recently missed words,
/// regardless of mastery.
pub fn select_wrong<S: WordStore>(store: &S, count: usize) -> Result<Vec<Word>> {
    Ok(store
        .list_wrong()?
        .into_iter()
        .take(count)
        .map(|entry| entry.word)
        .collect())
}
