//! Bearer-token issuance for the REST backend.
//!
//! Tokens are short-lived and cheap to mint, so a fresh one is issued before
//! every business call rather than tracking expiry. The state machine exists
//! so a terminal rejection leaves the manager observably unauthenticated.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{ApiError, ErrorKind};

use super::request;
use super::transport::RestTransport;

const MAX_TOKEN_ATTEMPTS: u32 = 3;
const TOKEN_RETRY_DELAY: Duration = Duration::from_secs(3);

// Retrying cannot fix rejected credentials or a response without a token in
// it; every other failure gets the full attempt budget.
fn is_terminal(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::Auth | ErrorKind::Forbidden | ErrorKind::Protocol
    )
}

#[derive(Debug)]
enum TokenState {
    Unauthenticated,
    Authenticated(String),
}

#[derive(Debug)]
pub(crate) struct TokenManager {
    transport: RestTransport,
    username: String,
    password: String,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub(crate) fn new(
        transport: RestTransport,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            username: username.into(),
            password: password.into(),
            state: Mutex::new(TokenState::Unauthenticated),
        }
    }

    /// Issues a fresh token, retrying up to [`MAX_TOKEN_ATTEMPTS`] times with
    /// a fixed delay. A 401/403 is terminal, the credentials are wrong and
    /// retrying cannot fix them; so is a response with no token in it. Any
    /// other failure, status-level included, gets the full attempt budget.
    pub(crate) async fn ensure(&self) -> Result<String, ApiError> {
        let mut state = self.state.lock().await;
        if let TokenState::Authenticated(old) = &*state {
            debug!(previous_len = old.len(), "refreshing bearer token");
        }
        let mut last_err = None;
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            match self.issue().await {
                Ok(token) => {
                    *state = TokenState::Authenticated(token.clone());
                    return Ok(token);
                }
                Err(e) if is_terminal(e.kind) => {
                    *state = TokenState::Unauthenticated;
                    return Err(e);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "token issuance failed");
                    last_err = Some(e);
                    if attempt < MAX_TOKEN_ATTEMPTS {
                        tokio::time::sleep(TOKEN_RETRY_DELAY).await;
                    }
                }
            }
        }
        *state = TokenState::Unauthenticated;
        Err(last_err
            .unwrap_or_else(|| ApiError::new(ErrorKind::Auth, "token issuance failed")))
    }

    async fn issue(&self) -> Result<String, ApiError> {
        let req = request::issue_token(&self.username, &self.password);
        let json = self.transport.execute(&req, None).await?;
        json.get("AccessToken")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| ApiError::new(ErrorKind::Protocol, "token response missing AccessToken"))
    }
}
