use async_trait::async_trait;

use crate::identity::errors::ResetCodeError;
use crate::identity::ports::ResetCodeSender;

/// Development stand-in for a real mail transport: the code goes to the
/// log instead of an inbox.
pub struct TracingCodeSender;

#[async_trait]
impl ResetCodeSender for TracingCodeSender {
    async fn send_code(
        &self,
        username: &str,
        email: &str,
        code: u16,
    ) -> Result<(), ResetCodeError> {
        tracing::info!(username, email, code, "password reset code issued");
        Ok(())
    }
}
