//! Embedded web assets

use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use super::pages;

/// Pages and assets under `web/` (compiled into binary)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Fallback handler: serves `/static/*` from embedded assets, anything else
/// gets the 404 page
pub async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    if path.starts_with("static/")
        && let Some(response) = serve_file(path)
    {
        return response;
    }

    tracing::debug!(path = %uri.path(), "No route or asset");
    pages::not_found()
}

/// Load an embedded HTML template
pub fn template(name: &str) -> Option<String> {
    let file = WebAssets::get(name)?;
    String::from_utf8(file.data.into_owned()).ok()
}

/// Serve a file from embedded assets
fn serve_file(path: &str) -> Option<Response<Body>> {
    let file = WebAssets::get(path)?;

    // Determine content type from file extension
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(file.data.into_owned()))
        .ok()
}

/// Response used when a template is missing from the build
pub fn missing_asset() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Web UI not found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_embedded() {
        assert!(template("index.html").is_some());
        assert!(template("maintenance.html").is_some());
        assert!(template("missing.html").is_none());
    }

    #[test]
    fn script_is_served_as_javascript() {
        let response = serve_file("static/script.js").unwrap();
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.contains("javascript"));
    }

    #[tokio::test]
    async fn templates_are_not_served_raw() {
        let response = static_handler(Uri::from_static("/index.html")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
