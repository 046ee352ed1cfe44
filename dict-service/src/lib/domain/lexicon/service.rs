use std::sync::Arc;

use auth::AccessGuard;
use auth::Claims;
use auth::Role;
use auth::TokenCodec;

use crate::lexicon::errors::LexiconError;
use crate::lexicon::models::EntryId;
use crate::lexicon::models::Translation;
use crate::lexicon::models::Word;
use crate::lexicon::models::WordEntry;
use crate::lexicon::ports::LexiconRepository;

/// One guard per operation; the allowed-role sets are fixed here and never
/// vary per call.
struct LexiconGuards {
    lookup: AccessGuard,
    list: AccessGuard,
    add: AccessGuard,
    edit_own: AccessGuard,
    edit_any: AccessGuard,
    delete_own: AccessGuard,
    delete_any: AccessGuard,
}

impl LexiconGuards {
    fn new(codec: &Arc<TokenCodec>) -> Self {
        let with = |roles: &[Role]| AccessGuard::new(Arc::clone(codec), roles.iter().copied());
        Self {
            lookup: with(&Role::ALL),
            list: with(&Role::ALL),
            add: with(&[Role::PowerUser, Role::Admin]),
            edit_own: with(&[Role::PowerUser, Role::Admin]),
            edit_any: with(&[Role::Admin]),
            delete_own: with(&[Role::PowerUser, Role::Admin]),
            delete_any: with(&[Role::Admin]),
        }
    }
}

/// Dictionary operations behind role guards.
///
/// Ownership for the `_own` variants means the token's subject authored the
/// entry; admins get the `_any` variants instead of a bypass flag.
pub struct LexiconService<LR>
where
    LR: LexiconRepository,
{
    repository: Arc<LR>,
    guards: LexiconGuards,
}

impl<LR> LexiconService<LR>
where
    LR: LexiconRepository,
{
    pub fn new(repository: Arc<LR>, codec: &Arc<TokenCodec>) -> Self {
        Self {
            repository,
            guards: LexiconGuards::new(codec),
        }
    }

    /// Farsi translations of an english word.
    pub async fn english_to_farsi(
        &self,
        token: &str,
        english: &Word,
    ) -> Result<Vec<Translation>, LexiconError> {
        self.authorize(&self.guards.lookup, token)?;
        let translations = self.repository.farsi_for_english(english).await?;
        if translations.is_empty() {
            return Err(LexiconError::WordNotFound(english.to_string()));
        }
        Ok(translations)
    }

    /// English translations of a farsi word.
    pub async fn farsi_to_english(
        &self,
        token: &str,
        farsi: &Word,
    ) -> Result<Vec<Translation>, LexiconError> {
        self.authorize(&self.guards.lookup, token)?;
        let translations = self.repository.english_for_farsi(farsi).await?;
        if translations.is_empty() {
            return Err(LexiconError::WordNotFound(farsi.to_string()));
        }
        Ok(translations)
    }

    /// Every entry with its author.
    pub async fn list_entries(&self, token: &str) -> Result<Vec<WordEntry>, LexiconError> {
        self.authorize(&self.guards.list, token)?;
        self.repository.list_all().await
    }

    /// Add an entry authored by the token's subject.
    pub async fn add_entry(
        &self,
        token: &str,
        english: &Word,
        farsi: &Word,
    ) -> Result<WordEntry, LexiconError> {
        let claims = self.authorize(&self.guards.add, token)?;
        let entry = self.repository.insert(english, farsi, &claims.sub).await?;
        tracing::info!(id = %entry.id, author = %entry.author, "entry added");
        Ok(entry)
    }

    /// Edit an entry the caller authored.
    pub async fn edit_own_entry(
        &self,
        token: &str,
        id: &EntryId,
        english: &Word,
        farsi: &Word,
    ) -> Result<WordEntry, LexiconError> {
        let claims = self.authorize(&self.guards.edit_own, token)?;
        self.check_ownership(id, &claims).await?;
        self.repository.update(id, english, farsi).await
    }

    /// Edit any entry, regardless of author.
    pub async fn edit_any_entry(
        &self,
        token: &str,
        id: &EntryId,
        english: &Word,
        farsi: &Word,
    ) -> Result<WordEntry, LexiconError> {
        self.authorize(&self.guards.edit_any, token)?;
        if !self.repository.exists(id).await? {
            return Err(LexiconError::EntryNotFound(id.to_string()));
        }
        self.repository.update(id, english, farsi).await
    }

    /// Delete an entry the caller authored.
    pub async fn delete_own_entry(&self, token: &str, id: &EntryId) -> Result<(), LexiconError> {
        let claims = self.authorize(&self.guards.delete_own, token)?;
        self.check_ownership(id, &claims).await?;
        self.repository.delete(id).await?;
        tracing::info!(%id, author = %claims.sub, "entry deleted by author");
        Ok(())
    }

    /// Delete any entry, regardless of author.
    pub async fn delete_any_entry(&self, token: &str, id: &EntryId) -> Result<(), LexiconError> {
        let claims = self.authorize(&self.guards.delete_any, token)?;
        if !self.repository.exists(id).await? {
            return Err(LexiconError::EntryNotFound(id.to_string()));
        }
        self.repository.delete(id).await?;
        tracing::info!(%id, admin = %claims.sub, "entry deleted by admin");
        Ok(())
    }

    fn authorize(&self, guard: &AccessGuard, token: &str) -> Result<Claims, LexiconError> {
        guard.authorize(token).ok_or(LexiconError::Denied)
    }

    async fn check_ownership(&self, id: &EntryId, claims: &Claims) -> Result<(), LexiconError> {
        if !self.repository.author_has_entries(&claims.sub).await? {
            return Err(LexiconError::NoAuthoredEntries);
        }
        if !self.repository.belongs_to_author(id, &claims.sub).await? {
            return Err(LexiconError::NotEntryAuthor(id.to_string()));
        }
        Ok(())
    }
}
