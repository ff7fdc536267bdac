//! Bearer-token auth: a single shared secret compared against every
//! request's `Authorization: Bearer <token>` header. Disabled entirely
//! when the coordinator has no configured API key.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, StatusCode> {
    let Some(expected) = &state.config.api_key else {
        return Ok(next.run(request).await);
    };

    let token = extract_bearer_token(&request)?;
    if &token != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

fn extract_bearer_token(request: &Request) -> Result<String, StatusCode> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
        .ok_or(StatusCode::UNAUTHORIZED)
}
