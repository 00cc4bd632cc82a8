//! Access policy shared by every resource route.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};

use crate::{AppState, auth::AuthUser, error::ApiError};

/// Methods that never change stored state.
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// is_authenticated_or_read_only
///
/// Safe methods are always allowed; anything else needs an authenticated
/// caller. Resource content and ownership play no part in the decision.
pub fn is_authenticated_or_read_only(method: &Method, authenticated: bool) -> bool {
    is_safe_method(method) || authenticated
}

/// authenticated_or_read_only
///
/// Middleware form of the policy. Runs before the parent lookup and the handler,
/// so a rejected request has no side effects.
pub async fn authenticated_or_read_only(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();
    let authenticated = AuthUser::from_request_parts(&mut parts, &state).await.is_ok();

    if !is_authenticated_or_read_only(&parts.method, authenticated) {
        tracing::debug!(method = %parts.method, uri = %parts.uri, "unauthenticated write rejected");
        return Err(ApiError::NotAuthenticated);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
