//! PKCS#8 PEM key loading for the token signer.

use std::fs;
use std::path::Path;

use ed25519_dalek::pkcs8::spki::DecodePublicKey;
use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::SigningKey;
use ed25519_dalek::VerifyingKey;

use super::errors::TokenError;

/// Load an Ed25519 private key from a PKCS#8 PEM file.
///
/// # Arguments
/// * `path` - Path to the PEM file
/// * `passphrase` - Passphrase if the key is encrypted
///
/// # Errors
/// * `KeyMaterial` - File unreadable, wrong passphrase, or malformed key
pub fn load_signing_key(path: &Path, passphrase: Option<&str>) -> Result<SigningKey, TokenError> {
    let pem = read_pem(path)?;

    let key = match passphrase {
        Some(passphrase) => SigningKey::from_pkcs8_encrypted_pem(&pem, passphrase.as_bytes()),
        None => SigningKey::from_pkcs8_pem(&pem),
    };

    key.map_err(|e| TokenError::KeyMaterial(format!("{}: {}", path.display(), e)))
}

/// Load the corresponding Ed25519 public key from a PEM file.
///
/// # Errors
/// * `KeyMaterial` - File unreadable or malformed key
pub fn load_verifying_key(path: &Path) -> Result<VerifyingKey, TokenError> {
    let pem = read_pem(path)?;

    VerifyingKey::from_public_key_pem(&pem)
        .map_err(|e| TokenError::KeyMaterial(format!("{}: {}", path.display(), e)))
}

fn read_pem(path: &Path) -> Result<String, TokenError> {
    fs::read_to_string(path)
        .map_err(|e| TokenError::KeyMaterial(format!("{}: {}", path.display(), e)))
}
