use std::fmt;
use std::time::Duration;

use chrono::Utc;
use contextful::{AsContext, Context};
use hyper::header::HeaderValue;
use jwt::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use nails::error::NailsError;
use nails::request::FromHeader;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// HS256 signing material shared by login and the auth gate.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenKeys").field("ttl", &self.ttl).finish()
    }
}

impl Context for TokenKeys {}

impl TokenKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: i64) -> AppResult<IssuedToken> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        Ok(IssuedToken {
            token: self.encode(&claims)?,
            expires_in: self.ttl.as_secs(),
        })
    }

    pub fn encode(&self, claims: &Claims) -> AppResult<String> {
        jwt::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("token signing")))
    }

    /// Checks signature and expiry; returns the user id in `sub`.
    pub fn verify(&self, token: &str) -> AppResult<i64> {
        let data = jwt::decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                AppError::unauthorized("invalid or expired token")
            })?;
        data.claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("invalid token subject"))
    }
}

/// The raw credential from `Authorization: Bearer <token>`, not yet verified.
#[derive(Debug, Clone)]
pub struct BearerToken(Option<String>);

impl BearerToken {
    pub fn token(&self) -> AppResult<&str> {
        self.0
            .as_deref()
            .ok_or_else(|| AppError::unauthorized("missing bearer token"))
    }
}

impl FromHeader for BearerToken {
    fn from_header(_name: &str, value: Option<&HeaderValue>) -> Result<Self, NailsError> {
        let token = value
            .and_then(|value| value.to_str().ok())
            .and_then(|value| {
                let (scheme, token) = value.trim().split_once(' ')?;
                if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
                    Some(token.trim().to_owned())
                } else {
                    None
                }
            });
        Ok(BearerToken(token))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

/// The auth gate: the first call in every protected handler.
pub fn authenticate<C>(ctx: &C, bearer: &BearerToken) -> AppResult<AuthUser>
where
    C: AsContext<TokenKeys>,
{
    let id = ctx.as_context().verify(bearer.token()?)?;
    Ok(AuthUser { id })
}
