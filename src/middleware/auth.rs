use axum::{
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

pub(crate) enum BearerToken<'a> {
    Missing,
    Present(&'a str),
    Rejected(&'static str),
}

pub(crate) fn bearer_token(req: &Request) -> BearerToken<'_> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return BearerToken::Missing;
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return BearerToken::Rejected("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return BearerToken::Rejected("unsupported_scheme");
    };
    BearerToken::Present(token)
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| Error::Unauthorized(e.to_string()))
}

pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))
}

pub(crate) fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}
