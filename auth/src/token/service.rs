use std::sync::Arc;

use chrono::Utc;

use super::claims::Claims;
use super::claims::Role;
use super::codec::TokenCodec;
use super::errors::TokenError;

/// Issues signed tokens for authenticated identities.
///
/// Issuance is the one path where a broken signer is a hard failure; the
/// caller supplies the identity's current role, freshly read from the
/// persistence layer.
#[derive(Clone)]
pub struct TokenService {
    codec: Arc<TokenCodec>,
    ttl_seconds: i64,
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Arguments
    /// * `codec` - Shared codec holding the signing key
    /// * `ttl_seconds` - Fixed lifetime stamped into every token
    pub fn new(codec: Arc<TokenCodec>, ttl_seconds: i64) -> Self {
        Self { codec, ttl_seconds }
    }

    /// The codec this service signs with, for sharing with guards.
    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Issue a token: `iat = now`, `exp = now + ttl`, fixed issuer.
    ///
    /// # Errors
    /// * `EncodingFailed` - Claims serialization failed
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims::new(subject, role, now, now + self.ttl_seconds);

        let payload = self.codec.encode(&claims)?;
        let signature = self.codec.sign(&payload);
        Ok(TokenCodec::assemble(&payload, &signature))
    }
}
