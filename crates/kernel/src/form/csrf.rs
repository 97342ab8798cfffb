//! CSRF token generation and verification.
//!
//! Tokens are scoped to an action (a settings group, a plugin panel, the
//! login form), stored in the session, single-use and time-limited.
//! Eviction is per action, so a burst of one form's tokens never pushes out
//! the tokens another page still needs.

use std::collections::HashMap;

use anyhow::Result;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tower_sessions::Session;

/// Session key for storing CSRF tokens.
const CSRF_SESSION_KEY: &str = "csrf_tokens";

/// Maximum number of live tokens kept per action.
const MAX_TOKENS_PER_ACTION: usize = 10;

/// Token validity period in seconds (1 hour).
const TOKEN_VALIDITY_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredToken {
    action: String,
    token: String,
    issued: i64,
}

impl StoredToken {
    fn is_live(&self, now: i64) -> bool {
        now - self.issued <= TOKEN_VALIDITY_SECS
    }

    fn matches(&self, action: &str, submitted: &str) -> bool {
        self.action == action && bool::from(self.token.as_bytes().ct_eq(submitted.as_bytes()))
    }
}

async fn load_tokens(session: &Session) -> Vec<StoredToken> {
    session
        .get(CSRF_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or_default()
}

/// Drop expired tokens, then the oldest tokens of any action over its cap.
///
/// Tokens are stored oldest first.
fn prune(tokens: &mut Vec<StoredToken>, now: i64) {
    tokens.retain(|t| t.is_live(now));

    let keep = {
        let mut per_action: HashMap<&str, usize> = HashMap::new();
        let mut keep = vec![false; tokens.len()];
        for (index, token) in tokens.iter().enumerate().rev() {
            let count = per_action.entry(token.action.as_str()).or_default();
            *count += 1;
            keep[index] = *count <= MAX_TOKENS_PER_ACTION;
        }
        keep
    };

    let mut keep = keep.into_iter();
    tokens.retain(|_| keep.next().unwrap_or(false));
}

/// Generate a CSRF token for `action` and store it in the session.
pub async fn generate_csrf_token(session: &Session, action: &str) -> Result<String> {
    let mut random_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let issued = chrono::Utc::now().timestamp();

    let mut hasher = Sha256::new();
    hasher.update(random_bytes);
    hasher.update(issued.to_le_bytes());
    let token = hex::encode(hasher.finalize());

    let mut tokens = load_tokens(session).await;
    tokens.push(StoredToken {
        action: action.to_string(),
        token: token.clone(),
        issued,
    });
    prune(&mut tokens, issued);

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to store CSRF token: {}", e))?;

    Ok(token)
}

/// Verify a CSRF token for `action` against the session.
///
/// A matching live token is consumed. Empty, unknown, expired, or
/// differently-scoped tokens verify as `false`.
pub async fn verify_csrf_token(session: &Session, action: &str, submitted: &str) -> Result<bool> {
    if submitted.is_empty() {
        return Ok(false);
    }

    let mut tokens = load_tokens(session).await;
    if tokens.is_empty() {
        return Ok(false);
    }

    let now = chrono::Utc::now().timestamp();
    let found = tokens
        .iter()
        .position(|t| t.is_live(now) && t.matches(action, submitted));

    let Some(index) = found else {
        return Ok(false);
    };

    tokens.remove(index);
    tokens.retain(|t| t.is_live(now));

    session
        .insert(CSRF_SESSION_KEY, tokens)
        .await
        .map_err(|e| anyhow::anyhow!("failed to update CSRF tokens: {}", e))?;

    Ok(true)
}

/// Clear all CSRF tokens from the session.
pub async fn clear_csrf_tokens(session: &Session) -> Result<()> {
    session
        .remove::<Vec<StoredToken>>(CSRF_SESSION_KEY)
        .await
        .map_err(|e| anyhow::anyhow!("failed to clear CSRF tokens: {}", e))?;
    Ok(())
}
