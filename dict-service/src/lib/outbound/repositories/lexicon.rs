use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::lexicon::errors::LexiconError;
use crate::lexicon::models::EntryId;
use crate::lexicon::models::Translation;
use crate::lexicon::models::Word;
use crate::lexicon::models::WordEntry;
use crate::lexicon::ports::LexiconRepository;

pub struct PostgresLexiconRepository {
    pool: PgPool,
}

impl PostgresLexiconRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_entry(row: PgRow) -> Result<WordEntry, LexiconError> {
    Ok(WordEntry {
        id: EntryId(
            row.try_get("id")
                .map_err(|e| LexiconError::DatabaseError(e.to_string()))?,
        ),
        english: Word::new(
            row.try_get("english")
                .map_err(|e| LexiconError::DatabaseError(e.to_string()))?,
        )?,
        farsi: Word::new(
            row.try_get("farsi")
                .map_err(|e| LexiconError::DatabaseError(e.to_string()))?,
        )?,
        author: row
            .try_get("author")
            .map_err(|e| LexiconError::DatabaseError(e.to_string()))?,
    })
}

fn row_to_translation(row: PgRow, column: &str) -> Result<Translation, LexiconError> {
    Ok(Translation {
        text: row
            .try_get(column)
            .map_err(|e| LexiconError::DatabaseError(e.to_string()))?,
        author: row
            .try_get("author")
            .map_err(|e| LexiconError::DatabaseError(e.to_string()))?,
    })
}

#[async_trait]
impl LexiconRepository for PostgresLexiconRepository {
    async fn list_all(&self) -> Result<Vec<WordEntry>, LexiconError> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.english, e.farsi, i.username AS author
            FROM entries e
            JOIN identities i ON i.id = e.author_id
            ORDER BY e.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(row_to_entry).collect()
    }

    async fn farsi_for_english(&self, english: &Word) -> Result<Vec<Translation>, LexiconError> {
        let rows = sqlx::query(
            r#"
            SELECT e.farsi, i.username AS author
            FROM entries e
            JOIN identities i ON i.id = e.author_id
            WHERE e.english = $1
            ORDER BY e.id
            "#,
        )
        .bind(english.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| row_to_translation(row, "farsi"))
            .collect()
    }

    async fn english_for_farsi(&self, farsi: &Word) -> Result<Vec<Translation>, LexiconError> {
        let rows = sqlx::query(
            r#"
            SELECT e.english, i.username AS author
            FROM entries e
            JOIN identities i ON i.id = e.author_id
            WHERE e.farsi = $1
            ORDER BY e.id
            "#,
        )
        .bind(farsi.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(|row| row_to_translation(row, "english"))
            .collect()
    }

    async fn insert(
        &self,
        english: &Word,
        farsi: &Word,
        author: &str,
    ) -> Result<WordEntry, LexiconError> {
        let row = sqlx::query(
            r#"
            INSERT INTO entries (english, farsi, author_id)
            SELECT $1, $2, id FROM identities WHERE username = $3
            RETURNING id
            "#,
        )
        .bind(english.as_str())
        .bind(farsi.as_str())
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LexiconError::DatabaseError(e.to_string()))?
        .ok_or_else(|| LexiconError::DatabaseError(format!("unknown author: {author}")))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        Ok(WordEntry {
            id: EntryId(id),
            english: english.clone(),
            farsi: farsi.clone(),
            author: author.to_string(),
        })
    }

    async fn exists(&self, id: &EntryId) -> Result<bool, LexiconError> {
        let row = sqlx::query("SELECT 1 AS present FROM entries WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn belongs_to_author(&self, id: &EntryId, author: &str) -> Result<bool, LexiconError> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present
            FROM entries e
            JOIN identities i ON i.id = e.author_id
            WHERE e.id = $1 AND i.username = $2
            "#,
        )
        .bind(id.0)
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn author_has_entries(&self, author: &str) -> Result<bool, LexiconError> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present
            FROM entries e
            JOIN identities i ON i.id = e.author_id
            WHERE i.username = $1
            LIMIT 1
            "#,
        )
        .bind(author)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn update(
        &self,
        id: &EntryId,
        english: &Word,
        farsi: &Word,
    ) -> Result<WordEntry, LexiconError> {
        let row = sqlx::query(
            r#"
            UPDATE entries e
            SET english = $2, farsi = $3
            FROM identities i
            WHERE e.id = $1 AND i.id = e.author_id
            RETURNING e.id, e.english, e.farsi, i.username AS author
            "#,
        )
        .bind(id.0)
        .bind(english.as_str())
        .bind(farsi.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_entry(row),
            None => Err(LexiconError::EntryNotFound(id.to_string())),
        }
    }

    async fn delete(&self, id: &EntryId) -> Result<(), LexiconError> {
        let result = sqlx::query("DELETE FROM entries WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| LexiconError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(LexiconError::EntryNotFound(id.to_string()));
        }

        Ok(())
    }
}
