use chrono::{Duration, Utc};
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::version4::V4;
use pasetors::{local, Local};
use serde_json::json;
use sha2::{Digest, Sha256};
use crate::error::VerificationError;
use crate::settings::Secret;
use crate::types::User;

const USER_ID_CLAIM: &str = "user_id";
const USER_STATE_CLAIM: &str = "user_state";

/// Issues single-use confirmation tokens.
///
/// A token is a PASETO v4.local token carrying the user id and a digest of
/// the user's mutable state at issuance. Nothing is stored server side: once
/// the account changes (activation sets `is_active` and `last_login`), the
/// digest no longer matches and the token stops validating.
#[derive(Clone)]
pub struct TokenGenerator {
    secret_key: Vec<u8>,
    hmac_secret: Vec<u8>,
    time_to_live: Duration,
}

impl std::fmt::Debug for TokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGenerator")
            .field("time_to_live", &self.time_to_live)
            .finish_non_exhaustive()
    }
}

impl TokenGenerator {
    /// Fails if `secret_key` is not a valid 32 byte V4 symmetric key.
    pub fn new(secret: &Secret) -> Result<Self, VerificationError> {
        SymmetricKey::<V4>::from(secret.secret_key.as_bytes())?;
        let time_to_live = Duration::try_minutes(secret.token_expiration)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                VerificationError::Configuration(format!(
                    "`secret.token_expiration` must be a positive number of minutes, got {}",
                    secret.token_expiration
                ))
            })?;

        Ok(Self {
            secret_key: secret.secret_key.as_bytes().to_vec(),
            hmac_secret: secret.hmac_secret.as_bytes().to_vec(),
            time_to_live,
        })
    }

    fn key(&self) -> Result<SymmetricKey<V4>, pasetors::errors::Error> {
        SymmetricKey::<V4>::from(&self.secret_key)
    }

    #[tracing::instrument(name = "Issue confirmation token", skip(self, user), fields(user_id = %user.id))]
    pub fn make_token(&self, user: &User) -> Result<String, VerificationError> {
        let expires_at = Utc::now() + self.time_to_live;

        let mut claims = Claims::new()?;
        claims.expiration(&expires_at.to_rfc3339())?;
        claims.add_additional(USER_ID_CLAIM, json!(user.id))?;
        claims.add_additional(USER_STATE_CLAIM, json!(user_state_digest(user)))?;

        let token = local::encrypt(&self.key()?, &claims, None, Some(self.hmac_secret.as_slice()))?;
        Ok(token)
    }

    /// True only if `token` was issued for `user` in its current state and
    /// has not expired. Every failure reads as an invalid token.
    #[tracing::instrument(name = "Check confirmation token", skip(self, user, token), fields(user_id = %user.id))]
    pub fn check_token(&self, user: &User, token: &str) -> bool {
        match self.token_matches(user, token) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::event!(target: "verify_email", tracing::Level::DEBUG, "Rejected token: {}", e);
                false
            }
        }
    }

    fn token_matches(&self, user: &User, token: &str) -> Result<bool, pasetors::errors::Error> {
        let untrusted_token = UntrustedToken::<Local, V4>::try_from(token)?;
        let trusted_token = local::decrypt(
            &self.key()?,
            &untrusted_token,
            &ClaimsValidationRules::new(),
            None,
            Some(self.hmac_secret.as_slice()),
        )?;
        let Some(claims) = trusted_token.payload_claims() else {
            return Ok(false);
        };

        let user_id = user.id.to_string();
        let same_user = claims
            .get_claim(USER_ID_CLAIM)
            .and_then(|value| value.as_str())
            .map_or(false, |claimed| claimed == user_id);
        let same_state = claims
            .get_claim(USER_STATE_CLAIM)
            .and_then(|value| value.as_str())
            .map_or(false, |claimed| claimed == user_state_digest(user));

        Ok(same_user && same_state)
    }
}

/// SHA-256 over every field whose change must invalidate outstanding tokens.
fn user_state_digest(user: &User) -> String {
    let last_login = user
        .last_login
        .map(|timestamp| timestamp.to_rfc3339())
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(user.id.as_bytes());
    hasher.update(user.password.as_deref().unwrap_or_default().as_bytes());
    hasher.update(last_login.as_bytes());
    hasher.update([u8::from(user.is_active)]);
    hasher.update(user.email.as_bytes());
    hex::encode(hasher.finalize())
}
