use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use super::errors::RoleParseError;

/// Issuer stamped into every token this service mints.
pub const ISSUER: &str = "auth";

/// Closed set of roles known to the access-control core.
///
/// Extending the set means redeploying the auth core; there are no dynamic
/// roles in this design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    NormalUser,
    PowerUser,
    Admin,
}

impl Role {
    /// Every member of the closed set, for guard-matrix style iteration.
    pub const ALL: [Role; 3] = [Role::NormalUser, Role::PowerUser, Role::Admin];

    /// Wire name of the role, as it appears inside token payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NormalUser => "normal_user",
            Role::PowerUser => "power_user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal_user" => Ok(Role::NormalUser),
            "power_user" => Ok(Role::PowerUser),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// Token payload. All fields are required.
///
/// Fields are declared in sorted key order. serde_json serializes struct
/// fields in declaration order with no whitespace, so the same claims always
/// produce byte-identical payloads - the signature covers exactly these
/// bytes, and the verifier must be able to reconstruct them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (Unix seconds); a token is valid through this second
    pub exp: i64,

    /// Issued at (Unix seconds)
    pub iat: i64,

    /// Issuer
    pub iss: String,

    /// Role the subject held when the token was minted
    pub role: Role,

    /// Subject (username)
    pub sub: String,
}

impl Claims {
    /// Build claims with the fixed issuer.
    pub fn new(sub: impl Into<String>, role: Role, iat: i64, exp: i64) -> Self {
        Self {
            exp,
            iat,
            iss: ISSUER.to_string(),
            role,
            sub: sub.into(),
        }
    }

    /// Check expiry against a caller-supplied clock reading.
    ///
    /// The boundary second is still valid: a token expires only once
    /// `now > exp`.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.exp
    }
}
