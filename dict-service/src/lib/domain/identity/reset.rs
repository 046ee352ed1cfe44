use std::sync::Arc;

use auth::PasswordHasher;
use auth::TokenService;
use rand::Rng;

use crate::identity::errors::IdentityError;
use crate::identity::models::IdentityUpdate;
use crate::identity::ports::IdentityRepository;
use crate::identity::ports::ResetCodeSender;

/// Wrong-code attempts allowed before a flow is abandoned.
pub const RESET_ATTEMPT_BUDGET: u8 = 3;

/// Lifecycle of a single reset attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetState {
    /// Code generated and handed to the sender; awaiting verification.
    CodeSent,
    /// Correct code supplied; the password may now be replaced.
    Verified,
    /// Attempt budget exhausted; the flow is dead even for the right code.
    Abandoned,
    /// Password replaced and a fresh token issued.
    Completed,
}

/// In-memory state for one password reset.
///
/// Lives only for the duration of the interactive flow; nothing about it is
/// persisted, so a crashed flow simply starts over.
#[derive(Debug)]
pub struct ResetFlow {
    email: String,
    code: u16,
    attempts_left: u8,
    state: ResetState,
}

impl ResetFlow {
    fn new(email: String, code: u16) -> Self {
        Self {
            email,
            code,
            attempts_left: RESET_ATTEMPT_BUDGET,
            state: ResetState::CodeSent,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn state(&self) -> ResetState {
        self.state
    }

    pub fn attempts_left(&self) -> u8 {
        self.attempts_left
    }

    /// Check a supplied code against the one that was sent.
    ///
    /// Each wrong code burns one attempt; once the budget is spent the flow
    /// is `Abandoned` and always returns `false`, correct code included.
    pub fn verify(&mut self, supplied: u16) -> bool {
        if self.state != ResetState::CodeSent {
            return false;
        }

        if supplied == self.code {
            self.state = ResetState::Verified;
            return true;
        }

        self.attempts_left -= 1;
        if self.attempts_left == 0 {
            self.state = ResetState::Abandoned;
            tracing::debug!(email = %self.email, "reset flow abandoned: attempt budget spent");
        }
        false
    }
}

/// Self-service password reset.
///
/// The actual email transport sits behind the `ResetCodeSender` port; the
/// service only draws the code and drives the flow state machine.
pub struct PasswordResetService<IR, CS>
where
    IR: IdentityRepository,
    CS: ResetCodeSender,
{
    repository: Arc<IR>,
    code_sender: Arc<CS>,
    password_hasher: PasswordHasher,
    token_service: TokenService,
}

impl<IR, CS> PasswordResetService<IR, CS>
where
    IR: IdentityRepository,
    CS: ResetCodeSender,
{
    pub fn new(
        repository: Arc<IR>,
        code_sender: Arc<CS>,
        password_hasher: PasswordHasher,
        token_service: TokenService,
    ) -> Self {
        Self {
            repository,
            code_sender,
            password_hasher,
            token_service,
        }
    }

    /// Start a reset for the account behind `email`.
    ///
    /// Unknown email and blocked account both collapse to `Denied` so the
    /// endpoint does not leak which addresses are registered.
    pub async fn initiate(&self, email: &str) -> Result<ResetFlow, IdentityError> {
        let Some(identity) = self.repository.find_by_email(email).await? else {
            tracing::debug!(email, "reset rejected: unknown email");
            return Err(IdentityError::Denied);
        };
        if identity.blocked {
            tracing::debug!(email, "reset rejected: account is blocked");
            return Err(IdentityError::Denied);
        }

        let code: u16 = rand::thread_rng().gen_range(1000..10000);
        self.code_sender
            .send_code(identity.username.as_str(), email, code)
            .await?;
        tracing::info!(username = %identity.username, "reset code sent");

        Ok(ResetFlow::new(email.to_string(), code))
    }

    /// Replace the password for a verified flow and issue a token.
    ///
    /// # Errors
    /// * `Denied` - Flow is not in the `Verified` state, or the account
    ///   disappeared or was blocked since `initiate`
    pub async fn complete(
        &self,
        flow: &mut ResetFlow,
        new_password: &str,
    ) -> Result<String, IdentityError> {
        if flow.state != ResetState::Verified {
            tracing::debug!(email = %flow.email, state = ?flow.state, "reset rejected: flow not verified");
            return Err(IdentityError::Denied);
        }

        let Some(identity) = self.repository.find_by_email(&flow.email).await? else {
            return Err(IdentityError::Denied);
        };
        if identity.blocked {
            return Err(IdentityError::Denied);
        }

        let password_hash = self.password_hasher.hash(new_password)?;
        self.repository
            .update(
                &identity.id,
                IdentityUpdate {
                    password_hash: Some(password_hash),
                    ..IdentityUpdate::default()
                },
            )
            .await?;
        flow.state = ResetState::Completed;
        tracing::info!(username = %identity.username, "password reset completed");

        Ok(self
            .token_service
            .issue(identity.username.as_str(), identity.role)?)
    }
}
