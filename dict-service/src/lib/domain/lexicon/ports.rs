use async_trait::async_trait;

use crate::lexicon::errors::LexiconError;
use crate::lexicon::models::EntryId;
use crate::lexicon::models::Translation;
use crate::lexicon::models::Word;
use crate::lexicon::models::WordEntry;

/// Persistence operations for dictionary entries.
#[async_trait]
pub trait LexiconRepository: Send + Sync + 'static {
    /// All entries with their authors, ordered by ID.
    async fn list_all(&self) -> Result<Vec<WordEntry>, LexiconError>;

    /// Farsi translations of an english word (empty if unknown).
    async fn farsi_for_english(&self, english: &Word) -> Result<Vec<Translation>, LexiconError>;

    /// English translations of a farsi word (empty if unknown).
    async fn english_for_farsi(&self, farsi: &Word) -> Result<Vec<Translation>, LexiconError>;

    /// Persist a new entry and return it with its assigned ID.
    async fn insert(
        &self,
        english: &Word,
        farsi: &Word,
        author: &str,
    ) -> Result<WordEntry, LexiconError>;

    /// Whether an entry with this ID exists.
    async fn exists(&self, id: &EntryId) -> Result<bool, LexiconError>;

    /// Whether this entry was submitted by this author.
    async fn belongs_to_author(&self, id: &EntryId, author: &str) -> Result<bool, LexiconError>;

    /// Whether this author has submitted any entries at all.
    async fn author_has_entries(&self, author: &str) -> Result<bool, LexiconError>;

    /// Replace both sides of an entry.
    ///
    /// # Errors
    /// * `EntryNotFound` - No entry with this ID
    async fn update(
        &self,
        id: &EntryId,
        english: &Word,
        farsi: &Word,
    ) -> Result<WordEntry, LexiconError>;

    /// Delete an entry.
    ///
    /// # Errors
    /// * `EntryNotFound` - No entry with this ID
    async fn delete(&self, id: &EntryId) -> Result<(), LexiconError>;
}
