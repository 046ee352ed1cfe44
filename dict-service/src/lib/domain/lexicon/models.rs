use std::fmt;

use crate::lexicon::errors::EntryIdError;
use crate::lexicon::errors::WordError;

/// Longest word accepted on either side of an entry.
pub const MAX_WORD_LENGTH: usize = 30;

/// Dictionary entry identifier (database sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub i64);

impl EntryId {
    /// Parse an entry ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a positive integer
    pub fn from_string(s: &str) -> Result<Self, EntryIdError> {
        match s.parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(EntryIdError::InvalidFormat(s.to_string())),
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Word value type
///
/// Non-blank, at most `MAX_WORD_LENGTH` characters. Stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word(String);

impl Word {
    /// # Errors
    /// * `Blank` - Word is empty or whitespace
    /// * `TooLong` - Word exceeds the maximum length
    pub fn new(word: String) -> Result<Self, WordError> {
        let trimmed = word.trim();
        if trimmed.is_empty() {
            return Err(WordError::Blank);
        }
        if trimmed.chars().count() > MAX_WORD_LENGTH {
            return Err(WordError::TooLong(MAX_WORD_LENGTH));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One dictionary entry: an english/farsi pair and who submitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub id: EntryId,
    pub english: Word,
    pub farsi: Word,
    pub author: String,
}

/// One direction of a lookup result: the translated word plus its author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub author: String,
}
