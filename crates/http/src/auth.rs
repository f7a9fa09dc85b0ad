//! Resolves the `Authorization` header into a [`Caller`].

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use libris_authz::{Caller, Credentials};

use crate::error::AppError;

/// Extractor yielding the caller behind the request.
///
/// Accepts `Token <t>` and `Bearer <t>`. Requests without the header, or
/// with another scheme, are anonymous; an unknown token is rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct CurrentCaller(pub Caller);

impl<S> FromRequestParts<S> for CurrentCaller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(Caller::Anonymous));
        };
        let header = header
            .to_str()
            .map_err(|_| AppError::unauthorized("Invalid token header."))?;
        let Some(token) = parse_token(header) else {
            return Ok(Self(Caller::Anonymous));
        };

        parts
            .extensions
            .get::<Arc<Credentials>>()
            .and_then(|credentials| credentials.resolve(token))
            .map(Self)
            .ok_or_else(|| AppError::unauthorized("Invalid token."))
    }
}

fn parse_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    } else {
        None
    }
}
