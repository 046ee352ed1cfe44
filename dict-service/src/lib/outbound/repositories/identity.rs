use std::str::FromStr;

use async_trait::async_trait;
use auth::Role;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::identity::errors::IdentityError;
use crate::identity::models::EmailAddress;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::IdentityUpdate;
use crate::identity::models::Username;
use crate::identity::ports::IdentityRepository;

const COLUMNS: &str = "id, username, email, password_hash, role, blocked, created_at";

pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_identity(row: PgRow) -> Result<Identity, IdentityError> {
    let role: String = row
        .try_get("role")
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;
    let role = Role::from_str(&role).map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

    Ok(Identity {
        id: IdentityId(
            row.try_get("id")
                .map_err(|e| IdentityError::DatabaseError(e.to_string()))?,
        ),
        username: Username::new(
            row.try_get("username")
                .map_err(|e| IdentityError::DatabaseError(e.to_string()))?,
        )?,
        email: EmailAddress::new(
            row.try_get("email")
                .map_err(|e| IdentityError::DatabaseError(e.to_string()))?,
        )?,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?,
        role,
        blocked: row
            .try_get("blocked")
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?,
    })
}

fn map_unique_violation(e: sqlx::Error, username: &str, email: &str) -> IdentityError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("identities_username_key") {
                return IdentityError::UsernameAlreadyExists(username.to_string());
            }
            if db_err.constraint() == Some("identities_email_key") {
                return IdentityError::EmailAlreadyExists(email.to_string());
            }
        }
    }
    IdentityError::DatabaseError(e.to_string())
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn insert(&self, identity: Identity) -> Result<Identity, IdentityError> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, username, email, password_hash, role, blocked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.username.as_str())
        .bind(identity.email.as_str())
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.blocked)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, identity.username.as_str(), identity.email.as_str()))?;

        Ok(identity)
    }

    async fn insert_admin(
        &self,
        identity: Identity,
        acting_admin: &IdentityId,
    ) -> Result<Identity, IdentityError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO identities (id, username, email, password_hash, role, blocked, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.username.as_str())
        .bind(identity.email.as_str())
        .bind(&identity.password_hash)
        .bind(identity.role.as_str())
        .bind(identity.blocked)
        .bind(identity.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, identity.username.as_str(), identity.email.as_str()))?;

        let demoted = sqlx::query("UPDATE identities SET role = $2 WHERE id = $1")
            .bind(acting_admin.0)
            .bind(Role::PowerUser.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;
        if demoted.rows_affected() == 0 {
            return Err(IdentityError::NotFound(acting_admin.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM identities WHERE id = $1"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(row_to_identity).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM identities WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(row_to_identity).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM identities WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(row_to_identity).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Identity>, IdentityError> {
        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM identities ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(row_to_identity).collect()
    }

    async fn update(
        &self,
        id: &IdentityId,
        update: IdentityUpdate,
    ) -> Result<Identity, IdentityError> {
        let email = update.email.as_ref().map(|e| e.as_str().to_string());
        let role = update.role.map(|r| r.as_str().to_string());

        let row = sqlx::query(&format!(
            r#"
            UPDATE identities
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                blocked = COALESCE($5, blocked)
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id.0)
        .bind(email.clone())
        .bind(update.password_hash)
        .bind(role)
        .bind(update.blocked)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "", email.as_deref().unwrap_or("")))?;

        match row {
            Some(row) => row_to_identity(row),
            None => Err(IdentityError::NotFound(id.to_string())),
        }
    }

    async fn promote_to_admin(
        &self,
        target: &IdentityId,
        acting_admin: &IdentityId,
    ) -> Result<(), IdentityError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        let promoted = sqlx::query("UPDATE identities SET role = $2 WHERE id = $1")
            .bind(target.0)
            .bind(Role::Admin.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;
        if promoted.rows_affected() == 0 {
            return Err(IdentityError::NotFound(target.to_string()));
        }

        let demoted = sqlx::query("UPDATE identities SET role = $2 WHERE id = $1")
            .bind(acting_admin.0)
            .bind(Role::PowerUser.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;
        if demoted.rows_affected() == 0 {
            return Err(IdentityError::NotFound(acting_admin.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))
    }
}
