//! Bearer token authentication.
//!
//! Shoppers authenticate with HS256 JWTs issued by the account service. Handlers that take a [`JwtClaims`] argument
//! only run for requests carrying a valid, unexpired token in the `Authorization: Bearer` header.
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use log::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    #[serde(rename = "userId", deserialize_with = "id_from_number_or_string")]
    pub user_id: i64,
    pub email: String,
    /// Expiry, in seconds since the Unix epoch
    pub exp: u64,
    /// Back-office tokens are signed with the same secret but are not valid for shopper routes.
    #[serde(rename = "isAdmin", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_admin: bool,
}

fn id_from_number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }
    match Repr::deserialize(deserializer)? {
        Repr::Number(n) => Ok(n),
        Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Verifies bearer tokens. Registered as app data so that the [`JwtClaims`] extractor can find it.
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let claims = decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    AuthError::PoorlyFormattedToken(e.to_string())
                },
                _ => AuthError::ValidationError(e.to_string()),
            })?
            .claims;
        if claims.is_admin {
            return Err(AuthError::ValidationError("Admin tokens cannot be used here".into()));
        }
        Ok(claims)
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, AuthError> {
    let header = req.headers().get("Authorization").ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    value.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(validator) = req.app_data::<web::Data<TokenValidator>>() else {
            error!("🔐️ No token validator has been registered with the app");
            return ready(Err(ServerError::ConfigurationError("Token validation is not configured".into())));
        };
        let result = bearer_token(req).and_then(|token| validator.validate(token)).map_err(|e| {
            debug!("🔐️ Rejecting request to {}. {e}", req.path());
            ServerError::from(e)
        });
        ready(result)
    }
}
