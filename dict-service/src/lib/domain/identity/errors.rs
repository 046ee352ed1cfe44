use thiserror::Error;

/// Error for IdentityId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    InvalidFormat(String),
}

/// Error for reset-code delivery
#[derive(Debug, Clone, Error)]
pub enum ResetCodeError {
    #[error("Failed to deliver reset code: {0}")]
    DeliveryFailed(String),
}

/// Top-level error for identity operations.
///
/// `Denied` is the uniform signal for the whole security boundary:
/// malformed tokens, bad credentials, expired or forged tokens, and
/// insufficient roles all collapse into it, so the caller cannot tell
/// which check failed. Business-rule violations (duplicates, bad targets)
/// stay descriptive because they are remediable, not secret.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("Access denied")]
    Denied,

    // Value object validation errors
    #[error("Invalid identity ID: {0}")]
    InvalidId(#[from] IdentityIdError),

    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    // Business-rule errors
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Username already exists: {0}")]
    UsernameAlreadyExists(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("You cannot target your own account")]
    CannotTargetSelf,

    #[error("Operation cancelled: admin downgrade not confirmed")]
    ConfirmationRequired,

    #[error("User is already blocked: {0}")]
    AlreadyBlocked(String),

    #[error("User is not blocked: {0}")]
    NotBlocked(String),

    // Infrastructure errors
    #[error("Password error: {0}")]
    Password(#[from] auth::PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] auth::TokenError),

    #[error("Reset code error: {0}")]
    CodeDelivery(#[from] ResetCodeError),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
