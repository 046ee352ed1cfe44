use async_trait::async_trait;

use crate::identity::errors::IdentityError;
use crate::identity::errors::ResetCodeError;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::IdentityUpdate;

/// Persistence operations for the identity aggregate.
///
/// The two admin-creation methods cover both writes of the single-admin
/// invariant in one transaction; partial application must never be
/// observable.
#[async_trait]
pub trait IdentityRepository: Send + Sync + 'static {
    /// Persist a new identity.
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn insert(&self, identity: Identity) -> Result<Identity, IdentityError>;

    /// Persist a new admin identity and, in the same transaction, demote
    /// the acting admin to `power_user`.
    async fn insert_admin(
        &self,
        identity: Identity,
        acting_admin: &IdentityId,
    ) -> Result<Identity, IdentityError>;

    /// Retrieve identity by ID (`None` if not found).
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError>;

    /// Retrieve identity by username (`None` if not found).
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, IdentityError>;

    /// Retrieve identity by email address (`None` if not found).
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError>;

    /// Retrieve all identities.
    async fn list_all(&self) -> Result<Vec<Identity>, IdentityError>;

    /// Apply a partial update and return the updated identity.
    ///
    /// # Errors
    /// * `NotFound` - Identity does not exist
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn update(
        &self,
        id: &IdentityId,
        update: IdentityUpdate,
    ) -> Result<Identity, IdentityError>;

    /// Promote the target to admin and demote the acting admin to
    /// `power_user`, atomically.
    ///
    /// # Errors
    /// * `NotFound` - Either identity does not exist
    /// * `DatabaseError` - Database operation failed
    async fn promote_to_admin(
        &self,
        target: &IdentityId,
        acting_admin: &IdentityId,
    ) -> Result<(), IdentityError>;
}

/// Out-of-band delivery of password reset codes.
///
/// The core never persists the code; it lives only in the reset flow held
/// by the caller.
#[async_trait]
pub trait ResetCodeSender: Send + Sync + 'static {
    async fn send_code(&self, username: &str, email: &str, code: u16)
        -> Result<(), ResetCodeError>;
}
