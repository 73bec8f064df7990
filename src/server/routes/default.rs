use axum::http::{StatusCode, Uri};

pub async fn not_found(uri: Uri) -> (StatusCode, &'static str) {
    tracing::debug!("No route for {}", uri.path());
    (StatusCode::NOT_FOUND, "404 page not found")
}
