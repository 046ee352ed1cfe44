use std::path::Path;

use chrono::Utc;
use ed25519_dalek::Signature;
use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use ed25519_dalek::VerifyingKey;
use serde_json::Value;

use super::claims::Claims;
use super::errors::TokenError;
use super::keys;

/// Separator between the claims payload and the hex signature.
pub const TOKEN_DELIMITER: char = '.';

/// Serializes claims to canonical bytes and signs/verifies them with Ed25519.
///
/// A token is `<claims-json>.<signature-hex>`. The payload is not assumed
/// free of the delimiter, so splitting always happens on the last `.`.
///
/// Construction is fallible (a token cannot be issued without a working
/// signer); validation afterwards is total and never errors.
pub struct TokenCodec {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl TokenCodec {
    /// Create a codec from an in-memory signing key.
    ///
    /// The verifying key is derived from it. Used by tests and by hosts that
    /// manage key material themselves.
    pub fn new(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Load a codec from PKCS#8 PEM files.
    ///
    /// # Arguments
    /// * `private_key_path` - Ed25519 private key, optionally encrypted
    /// * `public_key_path` - Corresponding public key
    /// * `passphrase` - Passphrase for an encrypted private key
    ///
    /// # Errors
    /// * `KeyMaterial` - File unreadable, wrong passphrase, or malformed key
    pub fn from_pem_files(
        private_key_path: &Path,
        public_key_path: &Path,
        passphrase: Option<&str>,
    ) -> Result<Self, TokenError> {
        let signing_key = keys::load_signing_key(private_key_path, passphrase)?;
        let verifying_key = keys::load_verifying_key(public_key_path)?;

        Ok(Self {
            signing_key,
            verifying_key,
        })
    }

    /// Serialize claims to the canonical payload bytes the signature covers.
    pub fn encode(&self, claims: &Claims) -> Result<Vec<u8>, TokenError> {
        serde_json::to_vec(claims).map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Sign payload bytes, returning the hex-encoded signature.
    pub fn sign(&self, payload: &[u8]) -> String {
        hex::encode(self.signing_key.sign(payload).to_bytes())
    }

    /// Verify a hex signature over payload bytes.
    ///
    /// Total: malformed hex or a wrong-length signature is simply `false`.
    pub fn verify_signature(&self, payload: &[u8], signature_hex: &str) -> bool {
        let Ok(signature_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&signature_bytes) else {
            return false;
        };

        self.verifying_key.verify_strict(payload, &signature).is_ok()
    }

    /// Concatenate payload and signature into the token string.
    pub fn assemble(payload: &[u8], signature_hex: &str) -> String {
        format!(
            "{}{}{}",
            String::from_utf8_lossy(payload),
            TOKEN_DELIMITER,
            signature_hex
        )
    }

    /// Split a token into payload and signature on the last delimiter.
    pub fn split(token: &str) -> Option<(&str, &str)> {
        token.rsplit_once(TOKEN_DELIMITER)
    }

    /// Validate a token: shape, signature, and expiry.
    ///
    /// Total function from string to bool. Wrong arity, non-hex signature,
    /// failed verification, undecodable payload, missing or non-integer
    /// `exp`, and an elapsed expiry all yield `false`; nothing propagates.
    /// The boundary `now == exp` is still valid.
    pub fn is_valid(&self, token: &str) -> bool {
        if token.trim().is_empty() {
            return false;
        }
        let Some((payload, signature_hex)) = Self::split(token) else {
            return false;
        };
        if !self.verify_signature(payload.as_bytes(), signature_hex) {
            return false;
        }
        let Ok(decoded) = serde_json::from_str::<Value>(payload) else {
            return false;
        };
        let Some(exp) = decoded.get("exp").and_then(Value::as_i64) else {
            return false;
        };

        Utc::now().timestamp() <= exp
    }

    /// Validate a token and decode its claims.
    ///
    /// Runs the full validation again rather than trusting any earlier
    /// check, so it is safe to call standalone without a TOCTOU gap.
    /// Returns `None` for anything invalid, including a payload whose role
    /// is outside the closed set.
    pub fn extract_claims(&self, token: &str) -> Option<Claims> {
        if !self.is_valid(token) {
            return None;
        }

        let (payload, _) = Self::split(token)?;
        serde_json::from_str(payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::token::claims::Role;

    fn test_codec() -> TokenCodec {
        TokenCodec::new(SigningKey::from_bytes(&[42u8; 32]))
    }

    fn token_for(codec: &TokenCodec, claims: &Claims) -> String {
        let payload = codec.encode(claims).expect("Failed to encode claims");
        let signature = codec.sign(&payload);
        TokenCodec::assemble(&payload, &signature)
    }

    fn fresh_claims(sub: &str, role: Role) -> Claims {
        let now = Utc::now().timestamp();
        Claims::new(sub, role, now, now + 3600)
    }

    #[test]
    fn test_sign_and_validate_round_trip() {
        let codec = test_codec();
        let claims = fresh_claims("alice", Role::NormalUser);
        let token = token_for(&codec, &claims);

        assert!(codec.is_valid(&token));
        assert_eq!(codec.extract_claims(&token), Some(claims));
    }

    #[test]
    fn test_split_uses_last_delimiter() {
        // The subject contains dots, so the payload does too
        let codec = test_codec();
        let token = token_for(&codec, &fresh_claims("a.very.dotted.name", Role::Admin));

        let (payload, signature_hex) = TokenCodec::split(&token).expect("Failed to split");
        assert!(payload.starts_with('{') && payload.ends_with('}'));
        assert!(signature_hex.chars().all(|c| c.is_ascii_hexdigit()));

        assert!(codec.is_valid(&token));
        let claims = codec.extract_claims(&token).expect("Failed to extract");
        assert_eq!(claims.sub, "a.very.dotted.name");
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let codec = test_codec();
        let token = token_for(&codec, &fresh_claims("alice", Role::NormalUser));

        // Flip one byte of the payload segment
        let tampered = token.replacen("alice", "blice", 1);
        assert_ne!(token, tampered);
        assert!(!codec.is_valid(&tampered));
        assert!(codec.extract_claims(&tampered).is_none());
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let codec = test_codec();
        let token = token_for(&codec, &fresh_claims("alice", Role::NormalUser));

        let (payload, signature_hex) = TokenCodec::split(&token).unwrap();
        let mut flipped = signature_hex.to_string();
        let last = if flipped.ends_with('0') { "1" } else { "0" };
        flipped.replace_range(flipped.len() - 1.., last);

        let tampered = TokenCodec::assemble(payload.as_bytes(), &flipped);
        assert!(!codec.is_valid(&tampered));
    }

    #[test]
    fn test_foreign_signer_is_invalid() {
        let codec = test_codec();
        let other = TokenCodec::new(SigningKey::from_bytes(&[9u8; 32]));
        let token = token_for(&other, &fresh_claims("alice", Role::Admin));

        assert!(!codec.is_valid(&token));
    }

    #[test]
    fn test_malformed_tokens_are_invalid_not_errors() {
        let codec = test_codec();

        assert!(!codec.is_valid(""));
        assert!(!codec.is_valid("   "));
        assert!(!codec.is_valid("no-delimiter-here"));
        assert!(!codec.is_valid("payload.not-hex!!"));
        assert!(!codec.is_valid("payload.abcd")); // wrong signature length
        assert!(codec.extract_claims("garbage").is_none());
    }

    #[test]
    fn test_signed_non_json_payload_is_invalid() {
        let codec = test_codec();
        let payload = b"not json at all";
        let signature = codec.sign(payload);
        let token = TokenCodec::assemble(payload, &signature);

        assert!(!codec.is_valid(&token));
    }

    #[test]
    fn test_missing_or_non_integer_exp_is_invalid() {
        let codec = test_codec();

        let no_exp = br#"{"iat":1,"iss":"auth","role":"admin","sub":"alice"}"#;
        let token = TokenCodec::assemble(no_exp, &codec.sign(no_exp));
        assert!(!codec.is_valid(&token));

        let string_exp = br#"{"exp":"9999999999","iat":1,"iss":"auth","role":"admin","sub":"alice"}"#;
        let token = TokenCodec::assemble(string_exp, &codec.sign(string_exp));
        assert!(!codec.is_valid(&token));

        let float_exp = br#"{"exp":9999999999.5,"iat":1,"iss":"auth","role":"admin","sub":"alice"}"#;
        let token = TokenCodec::assemble(float_exp, &codec.sign(float_exp));
        assert!(!codec.is_valid(&token));
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = test_codec();
        let now = Utc::now().timestamp();

        // Valid through the expiry second itself
        let at_boundary = token_for(&codec, &Claims::new("alice", Role::NormalUser, now - 60, now));
        assert!(codec.is_valid(&at_boundary));

        let expired = token_for(
            &codec,
            &Claims::new("alice", Role::NormalUser, now - 60, now - 1),
        );
        assert!(!codec.is_valid(&expired));

        let future = token_for(
            &codec,
            &Claims::new("alice", Role::NormalUser, now, now + 1),
        );
        assert!(codec.is_valid(&future));
    }

    #[test]
    fn test_unknown_role_yields_no_claims() {
        let codec = test_codec();
        let now = Utc::now().timestamp();
        let payload = format!(
            r#"{{"exp":{},"iat":{},"iss":"auth","role":"superuser","sub":"alice"}}"#,
            now + 3600,
            now
        );
        let token = TokenCodec::assemble(payload.as_bytes(), &codec.sign(payload.as_bytes()));

        // Signature and expiry are fine, but the role is outside the closed set
        assert!(codec.is_valid(&token));
        assert!(codec.extract_claims(&token).is_none());
    }
}
