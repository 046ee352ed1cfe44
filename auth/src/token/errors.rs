use thiserror::Error;

/// Error type for token issuance and key handling.
///
/// Verification never surfaces these: a token either validates or it does
/// not, and every malformed input maps to "invalid".
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Failed to encode claims: {0}")]
    EncodingFailed(String),

    #[error("Unusable key material: {0}")]
    KeyMaterial(String),
}

/// Error for parsing a role name outside the closed set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(pub String);
