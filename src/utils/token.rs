//! Signed, expiring, scope-tagged tokens.
//!
//! A token is a self-contained JWT: signature-checked, never persisted.
//! The payload is a tagged union keyed by the `scope` claim, so every
//! consumption site matches exhaustively and a new scope cannot be added
//! without handling it everywhere tokens are read.
//!
//! Verification distinguishes three failures:
//!
//! - [`TokenError::Expired`] carries the expiry instant so callers can say
//!   "expired at X" instead of a generic denial
//! - [`TokenError::NotYetValid`] guards against clock skew (`nbf`)
//! - [`TokenError::Invalid`] covers bad signatures, garbage input, and
//!   payloads that deserialize to no known scope
//!
//! The expiry boundary is closed-exclusive: a token is already dead at
//! `now == exp`. The time-window checks are done here explicitly instead
//! of inside `jsonwebtoken` so the boundary is exact and the expiry
//! instant is available for the error.

use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use practia_core::{AppError, Permission, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;

/// Capability scope of a token. Mirrors the payload variants one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    User,
    Student,
    RecoverUserPassword,
    RecoverStudentPassword,
    InviteUser,
    InviteStudent,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Student => "student",
            Scope::RecoverUserPassword => "recover-user-password",
            Scope::RecoverStudentPassword => "recover-student-password",
            Scope::InviteUser => "invite-user",
            Scope::InviteStudent => "invite-student",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session claims for a staff user. The permission list is a snapshot
/// taken at issuance; guards always re-derive permissions from the fresh
/// database row, never from this copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session claims for a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentClaims {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub career_id: Uuid,
    pub email: String,
    pub telephone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Proposed account data carried by a user invitation. Nothing is
/// persisted until the invite is redeemed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInvite {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "kebab-case")]
pub enum TokenPayload {
    User(UserClaims),
    Student(StudentClaims),
    RecoverUserPassword { id: Uuid },
    RecoverStudentPassword { id: Uuid },
    InviteUser(UserInvite),
    InviteStudent { email: String },
}

impl TokenPayload {
    pub fn scope(&self) -> Scope {
        match self {
            TokenPayload::User(_) => Scope::User,
            TokenPayload::Student(_) => Scope::Student,
            TokenPayload::RecoverUserPassword { .. } => Scope::RecoverUserPassword,
            TokenPayload::RecoverStudentPassword { .. } => Scope::RecoverStudentPassword,
            TokenPayload::InviteUser(_) => Scope::InviteUser,
            TokenPayload::InviteStudent { .. } => Scope::InviteStudent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub payload: TokenPayload,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
    #[error("token is not valid yet")]
    NotYetValid,
    #[error("invalid token")]
    Invalid,
}

impl TokenError {
    /// Map to the rejection the guards surface. Expiry stays a distinct
    /// kind; everything else collapses into `INVALID_TOKEN`.
    pub fn into_app_error(self) -> AppError {
        use practia_core::errors::codes;

        match self {
            TokenError::Expired { expired_at } => AppError::unauthorized(
                codes::TOKEN_EXPIRED,
                anyhow::anyhow!("token expired at {expired_at}"),
            ),
            TokenError::NotYetValid | TokenError::Invalid => AppError::unauthorized(
                codes::INVALID_TOKEN,
                anyhow::anyhow!("invalid or malformed token"),
            ),
        }
    }
}

/// Signs and verifies tokens with a single process-wide symmetric secret.
/// Constructed once at startup from [`JwtConfig`].
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Sign a payload valid for `ttl_seconds` from now.
    pub fn sign(&self, payload: TokenPayload, ttl_seconds: i64) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            payload,
            iat: now,
            nbf: now,
            exp: now + ttl_seconds,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::internal(anyhow::anyhow!("failed to sign token: {e}")))
    }

    /// Verify signature and time window, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        // exp/nbf are checked explicitly below; jsonwebtoken only gets to
        // veto the signature and the payload shape.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?;

        let now = Utc::now().timestamp();
        if now >= data.claims.exp {
            let expired_at =
                DateTime::from_timestamp(data.claims.exp, 0).unwrap_or_default();
            return Err(TokenError::Expired { expired_at });
        }
        if now < data.claims.nbf {
            return Err(TokenError::NotYetValid);
        }

        Ok(data.claims)
    }
}
