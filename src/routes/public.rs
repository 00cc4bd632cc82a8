use crate::AppState;
use axum::{Json, Router, http::HeaderMap, routing::get};
use serde_json::{Value, json};

/// Public Router Module
///
/// Endpoints that sit outside the resource table: the browsable API root and
/// the liveness probe. No access policy applies here.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Lists the top-level collections as absolute URLs.
        .route("/", get(api_root))
        // GET /health
        // Returns "ok" for load balancer and container checks.
        .route("/health", get(|| async { "ok" }))
}

/// api_root
///
/// Absolute links to every top-level collection, built from the `Host` header.
/// Behind a TLS-terminating proxy the scheme comes from `X-Forwarded-Proto`.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Collection links"))
)]
pub async fn api_root(headers: HeaderMap) -> Json<Value> {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    // The first hop is the one the client spoke to.
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|proto| matches!(*proto, "http" | "https"))
        .unwrap_or("http");

    Json(json!({
        "students": format!("{}://{}/students/", scheme, host),
        "universities": format!("{}://{}/universities/", scheme, host),
    }))
}
