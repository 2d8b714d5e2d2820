//! Access tokens.
//!
//! Every route apart from `/health` and the Paystack webhook expects an HS256 JWT in the `Authorization: Bearer` header. The token names the caller (`sub`)
//! and the single [`Role`] they act in. Tokens are issued by the identity service, which shares `TSS_JWT_SECRET` with
//! this server; [`TokenIssuer`] exists for tooling and tests.
use std::{
    fmt::Display,
    future::{ready, Ready},
};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use settlement_engine::db_types::ActorType;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A customer placing and paying for orders
    User,
    Restaurant,
    Rider,
    Admin,
}

impl Role {
    /// The kind of wallet this role owns, if any.
    pub fn actor_type(&self) -> Option<ActorType> {
        match self {
            Role::Restaurant => Some(ActorType::Restaurant),
            Role::Rider => Some(ActorType::Rider),
            Role::User | Role::Admin => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Restaurant => "restaurant",
            Role::Rider => "rider",
            Role::Admin => "admin",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The id of the user, restaurant or rider, depending on `role`
    pub sub: i64,
    pub role: Role,
    /// Expiry, in seconds since the Unix epoch
    pub exp: i64,
}

/// Handlers take `JwtClaims` as an argument to get at the caller. The claims are put in the request extensions by
/// [`crate::middleware::JwtMiddlewareFactory`]; a handler outside that middleware always gets a 401.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key }
    }

    pub fn issue_token(&self, sub: i64, role: Role, lifetime: Option<Duration>) -> Result<String, AuthError> {
        let exp = (Utc::now() + lifetime.unwrap_or(DEFAULT_TOKEN_LIFETIME)).timestamp();
        let claims = JwtClaims { sub, role, exp };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::ValidationError(format!("Could not sign token. {e}")))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;
        Self { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("🔐️ Access token rejected. {e}");
            AuthError::ValidationError(e.to_string())
        })?;
        Ok(data.claims)
    }

    /// Reads the token out of an `Authorization: Bearer <token>` header value.
    pub fn verify_bearer(&self, header: &str) -> Result<JwtClaims, AuthError> {
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a bearer token".to_string()))?;
        self.verify(token)
    }
}
