//! Signed session tokens.
//!
//! Session state lives with the client. A [`SessionSigner`] lets the
//! engine hand that state out as an HS256 JWT so a client cannot change
//! its phase, config, or the set of questions it was asked.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, Result};
use crate::phase::Phase;
use crate::types::{AccountId, ConfigId, QuestionId};

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account taking the test
    pub sub: AccountId,
    /// Config the session runs against
    pub cfg: ConfigId,
    /// Phase the issued questions belong to
    pub phase: Phase,
    /// Questions issued for this phase
    pub qids: Vec<QuestionId>,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies session tokens with a shared secret.
#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    /// Create a signer. Tokens expire `ttl` after issue.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a token for one phase of a session.
    pub fn issue(
        &self,
        account: &AccountId,
        config_id: ConfigId,
        phase: Phase,
        question_ids: Vec<QuestionId>,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: account.clone(),
            cfg: config_id,
            phase,
            qids: question_ids,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| PlacementError::Backend(format!("failed to sign session token: {e}")))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| PlacementError::InvalidSession(e.to_string()))
    }
}
