use chrono::NaiveDateTime;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::word::WordImport;

pub const DEFAULT_BOOK: &str = "CET4_1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub name: String,
    pub total: u32,
    pub progress: u32,
    /// Set only for books imported by the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl Book {
    pub fn is_custom(&self) -> bool {
        self.created_at.is_some()
    }

    pub fn progress(&self) -> BookProgress {
        BookProgress {
            current: self.progress,
            total: self.total,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookProgress {
    pub current: u32,
    pub total: u32,
}

impl BookProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }
}

/// Word-book as bundled in `assets/books/`.
#[derive(Clone, Debug, Deserialize)]
pub struct BookAsset {
    pub id: String,
    pub name: String,
    pub words: Vec<WordImport>,
}

#[derive(Embed)]
#[folder = "assets/books/"]
struct BundledBooks;

/// All bundled word-books, ordered by id. Assets that fail to parse are
/// skipped with a warning.
pub fn builtin_books() -> Vec<BookAsset> {
    let mut books: Vec<BookAsset> = BundledBooks::iter()
        .filter(|name| name.ends_with(".json"))
        .filter_map(|name| {
            let file = BundledBooks::get(&name)?;
            match serde_json::from_slice::<BookAsset>(&file.data) {
                Ok(book) => Some(book),
                Err(e) => {
                    warn!(asset = %name, error = %e, "skipping malformed bundled book");
                    None
                }
            }
        })
        .collect();
    books.sort_by(|a, b| a.id.cmp(&b.id));
    books
}
