//! Shared-secret authentication.
//!
//! Every request outside of [`is_public`] paths must carry the configured key
//! in the `X-API-KEY` header.

use std::iter;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;

use super::SharedAppState;
use crate::api;

pub static API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Value of the `X-API-KEY` header.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl headers::Header for ApiKey {
    fn name() -> &'static HeaderName {
        &API_KEY_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        values
            .next()
            .and_then(|v| v.to_str().ok())
            .map(Self::new)
            .ok_or_else(headers::Error::invalid)
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            values.extend(iter::once(value));
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    ApiUser,
}

impl Role {
    pub fn authority(self) -> &'static str {
        match self {
            Self::ApiUser => "ROLE_API_USER",
        }
    }
}

/// Identity attached to every authenticated request.
///
/// All holders of the key are the same principal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Principal {
    pub name: &'static str,
    pub role: Role,
}

impl Principal {
    pub const API_USER: Self = Self {
        name: "api-user",
        role: Role::ApiUser,
    };
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(AuthError::InvalidApiKey)
    }
}

#[derive(Debug)]
pub enum AuthError {
    InvalidApiKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidApiKey => (
                StatusCode::UNAUTHORIZED,
                Json(api::Error::new("Invalid API Key")),
            ),
        }
        .into_response()
    }
}

/// Paths reachable without the key.
pub fn is_public(path: &str) -> bool {
    path.starts_with("/v3/api-docs")
        || path.starts_with("/swagger-ui")
        || path == "/test"
        || path == "/health"
}

/// Rejects requests without the right key and tags the rest with
/// [`Principal::API_USER`].
pub async fn authenticate(
    State(state): State<SharedAppState>,
    api_key: Option<TypedHeader<ApiKey>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let path = request.uri().path();
    if is_public(path) {
        return Ok(next.run(request).await);
    }

    match api_key {
        Some(TypedHeader(key)) if key == state.api_key => {}
        Some(_) => {
            tracing::warn!(path, method = %request.method(), "wrong API key");
            return Err(AuthError::InvalidApiKey);
        }
        None => {
            tracing::warn!(path, method = %request.method(), "missing API key");
            return Err(AuthError::InvalidApiKey);
        }
    }

    tracing::debug!(
        principal = Principal::API_USER.name,
        authority = Principal::API_USER.role.authority(),
        "request authenticated"
    );
    request.extensions_mut().insert(Principal::API_USER);

    Ok(next.run(request).await)
}
