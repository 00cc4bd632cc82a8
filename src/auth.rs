use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
};

/// Header accepted as an identity in the local environment only.
pub const DEV_USER_HEADER: &str = "x-user-id";

/// Claims
///
/// Payload expected inside a bearer JSON Web Token. Tokens are issued by an
/// external identity provider; this service only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the caller's identity.
    pub sub: Uuid,
    /// Expiration Time (exp): tokens past this instant are rejected.
    pub exp: usize,
    /// Issued At (iat)
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Its presence is the
/// "is authenticated" signal consumed by the access policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

/// AuthUser Extractor Implementation
///
/// Resolution order:
/// 1. Local bypass: in `Env::Local`, a UUID in the `x-user-id` header.
/// 2. `Authorization: Bearer <jwt>`, HS256-signed with the configured secret,
///    expiry enforced.
///
/// Rejection: `ApiError::NotAuthenticated` on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass = parts
                .headers
                .get(DEV_USER_HEADER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(id) = bypass {
                return Ok(AuthUser { id });
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(ApiError::NotAuthenticated)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!("rejected bearer token: {:?}", e.kind());
            ApiError::NotAuthenticated
        })?;

        Ok(AuthUser {
            id: token_data.claims.sub,
        })
    }
}
