//! Bearer-token authentication.
//!
//! Tokens are verified only; issuance belongs to a separate identity
//! service. Claims carry the user id, email, and role.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The claims a storefront token carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (UUID).
    pub sub: String,
    pub email: String,
    /// `"customer"` or `"admin"`.
    pub role: String,
    pub exp: i64,
}

/// Verifies bearer tokens against the configured secret.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Creates a verifier for HS256 tokens signed with `secret`.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    fn verify(&self, token: &str) -> Result<AuthUser, ApiError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| ApiError::Unauthorized(format!("invalid token: {e}")))?;
        let id: UserId = data
            .claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("invalid subject claim".to_string()))?;
        Ok(AuthUser {
            id,
            email: data.claims.email,
            admin: data.claims.role == "admin",
        })
    }
}

/// Gives route modules access to the verifier without knowing the full
/// application state type.
pub trait HasVerifier {
    fn verifier(&self) -> &JwtVerifier;
}

impl<T: HasVerifier + ?Sized> HasVerifier for std::sync::Arc<T> {
    fn verifier(&self) -> &JwtVerifier {
        (**self).verifier()
    }
}

/// An authenticated caller. Rejects with 401 when the token is missing,
/// malformed, or expired.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub admin: bool,
}

impl AuthUser {
    /// Returns 403 unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin access required".to_string()))
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasVerifier + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
        state.verifier().verify(token)
    }
}

/// An optionally-authenticated caller: any token failure degrades to
/// anonymous instead of rejecting.
#[derive(Debug, Clone, Default)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: HasVerifier + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = bearer_token(parts).and_then(|token| state.verifier().verify(token).ok());
        Ok(OptionalAuthUser(user))
    }
}
