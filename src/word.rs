use serde::{Deserialize, Serialize};

/// Reading forms for kana books, where the usual headword/translation pair
/// is replaced by hiragana, katakana and a romanization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanaForms {
    pub hiragana: String,
    pub katakana: String,
    pub romaji: String,
}

/// A single entry of a word-book. `(book, rank)` identifies it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub book: String,
    pub rank: u32,
    pub headword: String,
    pub translation: String,
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub phrase_translation: String,
    #[serde(default)]
    pub mastered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana: Option<KanaForms>,
}

impl Word {
    pub fn from_import(book: &str, rank: u32, import: &WordImport) -> Self {
        let (headword, translation) = match &import.kana {
            Some(kana) if import.headword.is_empty() => {
                (kana.hiragana.clone(), kana.romaji.clone())
            }
            _ => (import.headword.clone(), import.translation.clone()),
        };
        Self {
            book: book.to_string(),
            rank,
            headword,
            translation,
            phonetic: import.phonetic.clone(),
            phrase: import.phrase.clone(),
            phrase_translation: import.phrase_translation.clone(),
            mastered: false,
            kana: import.kana.clone(),
        }
    }

    pub fn key(&self) -> (&str, u32) {
        (&self.book, self.rank)
    }

    pub fn is_kana(&self) -> bool {
        self.kana.is_some()
    }
}

/// Word as supplied by an external word-list parser or a bundled asset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordImport {
    #[serde(default)]
    pub headword: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub phonetic: String,
    #[serde(default)]
    pub phrase: String,
    #[serde(default)]
    pub phrase_translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kana: Option<KanaForms>,
}

impl WordImport {
    pub fn new(headword: &str, translation: &str) -> Self {
        Self {
            headword: headword.to_string(),
            translation: translation.to_string(),
            ..Self::default()
        }
    }
}
