use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::secret::generate_jti;
use crate::config::TokenConfig;
use crate::error::TesseraError;
use crate::models::{Principal, Role};

/// JWT claims payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (principal public id)
    pub sub: String,
    /// Session the token was issued under
    pub sid: String,
    /// Role at issuance time.
    ///
    /// Carrying the role here saves a store lookup per request, at the price
    /// of staleness: a role change is only observed once the access tokens
    /// minted before it have expired (at most one access TTL).
    pub role: Role,
    pub iss: String,
    #[serde(deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub jti: String,
}

/// Accept `aud` both as a single string and as an array.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Audience {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Audience::deserialize(deserializer)? {
        Audience::One(aud) => vec![aud],
        Audience::Many(auds) => auds,
    })
}

/// `issued_at + ttl`, or `Internal` when the sum leaves chrono's range.
pub(crate) fn expiry_after(
    issued_at: DateTime<Utc>,
    ttl: Duration,
) -> Result<DateTime<Utc>, TesseraError> {
    issued_at
        .checked_add_signed(ttl)
        .ok_or_else(|| TesseraError::Internal("token expiry out of range".to_string()))
}

/// Sign an access token for `principal` under `session_id`.
///
/// Returns the compact token and the claims it carries.
pub fn create_token(
    config: &TokenConfig,
    principal: &Principal,
    session_id: &str,
    issued_at: DateTime<Utc>,
) -> Result<(String, Claims), TesseraError> {
    let expires = expiry_after(issued_at, config.access_ttl()?)?;

    let claims = Claims {
        sub: principal.public_id.clone(),
        sid: session_id.to_string(),
        role: principal.role,
        iss: config.issuer.clone(),
        aud: vec![config.audience.clone()],
        iat: issued_at.timestamp(),
        nbf: issued_at.timestamp(),
        exp: expires.timestamp(),
        jti: generate_jti(),
    };

    let mut header = Header::new(config.algorithm);
    header.kid = Some(config.key_id.clone());

    let token = encode(
        &header,
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| TesseraError::Internal(format!("Failed to sign access token: {}", e)))?;

    Ok((token, claims))
}

/// Validate an access token and return its claims.
///
/// Pure computation over the token and `config`. Only the configured
/// algorithm is accepted; issuer must match, the configured audience must be
/// listed, and `exp`/`nbf` are enforced with no leeway.
pub fn validate_token(config: &TokenConfig, token: &str) -> Result<Claims, TesseraError> {
    let mut validation = Validation::new(config.algorithm);
    validation.leeway = 0;
    validation.validate_nbf = true;
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_audience(&[config.audience.as_str()]);
    validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud", "sub"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(reason = %e, "access token rejected");
        TesseraError::InvalidCredential
    })?;

    Ok(token_data.claims)
}
