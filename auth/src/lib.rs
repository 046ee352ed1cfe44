//! Authentication core library
//!
//! Provides the security-critical pieces of the dictionary service:
//! - Password hashing (Argon2id)
//! - Stateless signed session tokens (Ed25519 over canonical claims bytes)
//! - Declarative role-based access control (AccessGuard)
//!
//! Tokens are bearer credentials: possession equals authority. They are not
//! stored server-side and cannot be revoked before expiry; a role change
//! takes effect only once the holder obtains a new token.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Tokens and Access Control
//! ```
//! use std::sync::Arc;
//!
//! use auth::AccessGuard;
//! use auth::Role;
//! use auth::TokenCodec;
//! use auth::TokenService;
//!
//! let signing_key = ed25519_dalek::SigningKey::from_bytes(&[7u8; 32]);
//! let codec = Arc::new(TokenCodec::new(signing_key));
//!
//! // Issue a token for an authenticated identity
//! let tokens = TokenService::new(Arc::clone(&codec), 3600);
//! let token = tokens.issue("alice", Role::NormalUser).unwrap();
//! assert!(codec.is_valid(&token));
//!
//! // Gate an operation behind an allowed-role set
//! let guard = AccessGuard::new(codec, [Role::NormalUser, Role::Admin]);
//! assert!(guard.authorize(&token).is_some());
//! ```

pub mod guard;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use guard::AccessGuard;
pub use guard::Guarded;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::Claims;
pub use token::Role;
pub use token::RoleParseError;
pub use token::TokenCodec;
pub use token::TokenError;
pub use token::TokenService;
