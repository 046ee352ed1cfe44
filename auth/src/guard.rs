use std::collections::HashSet;
use std::sync::Arc;

use crate::token::claims::Claims;
use crate::token::claims::Role;
use crate::token::codec::TokenCodec;

/// Declarative role check applied to every privileged operation.
///
/// The allowed-role set is part of the operation's contract: it is fixed
/// when the guard is constructed (at service registration time), never
/// recomputed from caller-supplied data. Every failure collapses to the
/// same `None`; the real reason is only logged server-side, so the caller
/// cannot tell which check failed.
pub struct AccessGuard {
    codec: Arc<TokenCodec>,
    allowed_roles: HashSet<Role>,
}

impl AccessGuard {
    /// Create a guard for a fixed allowed-role set.
    pub fn new(codec: Arc<TokenCodec>, allowed_roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            codec,
            allowed_roles: allowed_roles.into_iter().collect(),
        }
    }

    /// Run the checks in order: blank token, empty role set, token
    /// validity, role membership. `None` means denied; `Some` carries the
    /// decoded claims for the wrapped operation.
    ///
    /// An operation configured with no allowed roles is unreachable by
    /// design, not open.
    pub fn authorize(&self, token: &str) -> Option<Claims> {
        if token.trim().is_empty() {
            tracing::debug!("access denied: blank token");
            return None;
        }
        if self.allowed_roles.is_empty() {
            tracing::debug!("access denied: operation has no allowed roles");
            return None;
        }
        if !self.codec.is_valid(token) {
            tracing::debug!("access denied: invalid or expired token");
            return None;
        }

        let claims = self.codec.extract_claims(token)?;
        if !self.allowed_roles.contains(&claims.role) {
            tracing::debug!(
                subject = %claims.sub,
                role = %claims.role,
                "access denied: role not in allowed set"
            );
            return None;
        }

        Some(claims)
    }

    /// Bind this guard to an operation, producing a single guarded callable.
    pub fn wrap<Op>(self, operation: Op) -> Guarded<Op> {
        Guarded {
            guard: self,
            operation,
        }
    }
}

/// An operation wrapped exactly once with its guard.
///
/// The wrapped operation receives the decoded claims along with its own
/// arguments; a denial short-circuits to `None` without touching it.
pub struct Guarded<Op> {
    guard: AccessGuard,
    operation: Op,
}

impl<Op> Guarded<Op> {
    pub fn call<Args, Out>(&self, token: &str, args: Args) -> Option<Out>
    where
        Op: Fn(Claims, Args) -> Out,
    {
        let claims = self.guard.authorize(token)?;
        Some((self.operation)(claims, args))
    }
}
