//! HTML pages rendered from embedded templates

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::notice::Notice;
use super::static_files::{missing_asset, template};

/// Replaced with the alert markup, if any
const ALERT_MARKER: &str = "<!-- alert -->";
const FEATURE_MARKER: &str = "{{feature}}";

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    #[serde(default)]
    pub notice: Option<String>,
}

/// Control page
///
/// Unknown notice codes are ignored so nothing from the query string reaches
/// the markup.
pub async fn index(Query(query): Query<IndexQuery>) -> Response {
    let alert = query
        .notice
        .as_deref()
        .and_then(Notice::from_code)
        .map(|n| (n.level(), n.message()));
    render_index(StatusCode::OK, alert)
}

pub async fn premium() -> Response {
    render_maintenance("Premium Features")
}

pub async fn admin() -> Response {
    render_maintenance("Admin Panel")
}

pub fn not_found() -> Response {
    render_index(StatusCode::NOT_FOUND, Some(("error", "Page not found")))
}

fn render_index(status: StatusCode, alert: Option<(&str, &str)>) -> Response {
    let Some(page) = template("index.html") else {
        return missing_asset();
    };
    let markup = alert
        .map(|(level, message)| {
            format!(
                r#"<div class="alert alert-{level}" role="alert" data-notice>{message}</div>"#
            )
        })
        .unwrap_or_default();
    (status, Html(page.replace(ALERT_MARKER, &markup))).into_response()
}

fn render_maintenance(feature: &str) -> Response {
    match template("maintenance.html") {
        Some(page) => Html(page.replace(FEATURE_MARKER, feature)).into_response(),
        None => missing_asset(),
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{create_router, test_support};
    use axum::http::StatusCode;
    use axum_test::TestServer;

    #[tokio::test]
    async fn index_renders_known_notice() {
        let server = TestServer::new(create_router(test_support::state())).unwrap();

        let page = server.get("/").add_query_param("notice", "stopped").await;
        page.assert_status_ok();
        let html = page.text();
        assert!(html.contains("alert-success"));
        assert!(html.contains("Bot stopped successfully!"));
    }

    #[tokio::test]
    async fn index_ignores_unknown_notice() {
        let server = TestServer::new(create_router(test_support::state())).unwrap();

        let html = server.get("/?notice=%3Cscript%3E").await.text();
        assert!(!html.contains("data-notice>"));
        assert!(!html.contains("<script>alert"));
    }

    #[tokio::test]
    async fn maintenance_pages_name_their_feature() {
        let server = TestServer::new(create_router(test_support::state())).unwrap();

        let premium = server.get("/premium").await;
        premium.assert_status_ok();
        assert!(premium.text().contains("Premium Features"));

        let admin = server.get("/admin").await.text();
        assert!(admin.contains("Admin Panel"));
        assert!(!admin.contains("{{feature}}"));
    }

    #[tokio::test]
    async fn missing_page_keeps_control_page_with_error() {
        let server = TestServer::new(create_router(test_support::state())).unwrap();

        let response = server.get("/does/not/exist").await;
        response.assert_status(StatusCode::NOT_FOUND);
        assert!(response.text().contains("id=\"token-form\""));
    }
}
