//! # rg-auth-jwt
//!
//! Argon2 + JWT implementation of `AuthProvider`.
//! Passwords are stored as PHC strings; tokens are HMAC-signed JWTs whose
//! `scope` claim pins them to one purpose (access, refresh, email confirmation).

use std::str::FromStr;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rg_core::error::{AppError, Result};
use rg_core::traits::{AuthProvider, TokenScope};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Email confirmation links stay valid for a week.
const EMAIL_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    scope: String,
    iat: i64,
    exp: i64,
    jti: String,
}

pub struct JwtAuthProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtAuthProvider {
    /// `algorithm` must name an HMAC family member (`HS256`, `HS384`, `HS512`).
    pub fn new(
        secret: &[u8],
        algorithm: &str,
        access_minutes: i64,
        refresh_days: i64,
    ) -> Result<Self> {
        let algorithm = Algorithm::from_str(&algorithm.to_ascii_uppercase())
            .map_err(|_| AppError::validation(format!("unknown JWT algorithm '{algorithm}'")))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AppError::validation("only HMAC JWT algorithms are supported"));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::days(refresh_days),
        })
    }

    fn ttl(&self, scope: TokenScope) -> Duration {
        match scope {
            TokenScope::Access => self.access_ttl,
            TokenScope::Refresh => self.refresh_ttl,
            TokenScope::EmailConfirmation => Duration::days(EMAIL_TOKEN_DAYS),
        }
    }
}

impl AuthProvider for JwtAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    /// Verifies if a provided password matches a stored Argon2 hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn issue_token(&self, subject: &str, scope: TokenScope) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            scope: scope.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl(scope)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token creation failed: {e}")))
    }

    fn verify_token(&self, token: &str, scope: TokenScope) -> Result<String> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            log::debug!("rejected {} token: {}", scope.as_str(), e);
            AppError::Unauthorized("Could not validate credentials".to_string())
        })?;
        if data.claims.scope != scope.as_str() {
            return Err(AppError::Unauthorized("Invalid scope for token".to_string()));
        }
        Ok(data.claims.sub)
    }
}
