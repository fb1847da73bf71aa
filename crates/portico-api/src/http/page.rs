//! Page-load endpoint and session cookie.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use portico_config::Config;
use portico_protocols::PageSource;

use crate::error::BridgeError;
use crate::state::BridgeState;

const DEFAULT_SHELL: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Portico</title>
</head>
<body>
  <div id="app"></div>
</body>
</html>
"#;

/// Serves one HTML document for every path.
pub struct StaticPage {
    html: String,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl Default for StaticPage {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl PageSource for StaticPage {
    fn read_root(&self, _path: &str, _root_path: &str) -> Option<String> {
        Some(self.html.clone())
    }
}

/// `GET /` and `GET /{*path}`
pub async fn page_handler(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
) -> Response {
    let root_path = resolve_root_path(&state.config, &headers);
    let path = strip_root_path(uri.path(), &root_path);

    let Some(content) = state.page.read_root(path, &root_path) else {
        debug!(path, "No page for path");
        return BridgeError::PageNotFound.into_response();
    };

    let cookie_name = &state.config.session.cookie_name;
    let session_id = jar
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let cookie = session_cookie(&state.config, session_id, forwarded_https(&headers));

    (jar.add(cookie), Html(content)).into_response()
}

/// Root path from config, else from the `script-name` / `x-script-name`
/// headers set by a reverse proxy. `x-script-name` wins when both are set.
pub fn resolve_root_path(config: &Config, headers: &HeaderMap) -> String {
    if let Some(root_path) = &config.server.root_path {
        return root_path.clone();
    }

    let mut root_path = String::new();
    for header in ["script-name", "x-script-name"] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            debug!(header, from = %root_path, to = value, "Root path taken from header");
            root_path = value.to_string();
        }
    }
    root_path
}

fn strip_root_path<'a>(path: &'a str, root_path: &str) -> &'a str {
    path.strip_prefix(root_path).unwrap_or(path)
}

fn forwarded_https(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto == "https")
}

/// Build the session cookie.
///
/// Behind https the cookie is `SameSite=None; Secure` so it also works when the
/// app is embedded in an iframe; otherwise it is `SameSite=Lax`.
pub fn session_cookie(config: &Config, session_id: String, https: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((config.session.cookie_name.clone(), session_id))
        .path("/")
        .build();

    if let Ok(expires) = OffsetDateTime::from_unix_timestamp(config.session.cookie_expires) {
        cookie.set_expires(expires);
    }

    if https {
        cookie.set_same_site(SameSite::None);
        cookie.set_secure(true);
    } else {
        cookie.set_same_site(SameSite::Lax);
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_root_path_from_config() {
        let mut config = Config::default();
        config.server.root_path = Some("/app".to_string());
        let mut headers = HeaderMap::new();
        headers.insert("script-name", HeaderValue::from_static("/ignored"));

        assert_eq!(resolve_root_path(&config, &headers), "/app");
    }

    #[test]
    fn test_root_path_from_headers() {
        let config = Config::default();
        let mut headers = HeaderMap::new();
        assert_eq!(resolve_root_path(&config, &headers), "");

        headers.insert("script-name", HeaderValue::from_static("/proxy"));
        assert_eq!(resolve_root_path(&config, &headers), "/proxy");

        headers.insert("x-script-name", HeaderValue::from_static("/x-proxy"));
        assert_eq!(resolve_root_path(&config, &headers), "/x-proxy");
    }

    #[test]
    fn test_strip_root_path() {
        assert_eq!(strip_root_path("/app/page", "/app"), "/page");
        assert_eq!(strip_root_path("/other", "/app"), "/other");
        assert_eq!(strip_root_path("/page", ""), "/page");
    }

    #[test]
    fn test_cookie_lax_by_default() {
        let cookie = session_cookie(&Config::default(), "abc".to_string(), false);
        let header = cookie.to_string();

        assert!(header.starts_with("portico-session-id=abc"));
        assert!(header.contains("SameSite=Lax"));
        assert!(!header.contains("Secure"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Expires=Fri, 01 Jan 2038 00:00:00 GMT"));
    }

    #[test]
    fn test_cookie_none_secure_behind_https() {
        let cookie = session_cookie(&Config::default(), "abc".to_string(), true);
        let header = cookie.to_string();

        assert!(header.contains("SameSite=None"));
        assert!(header.contains("Secure"));
    }

    #[test]
    fn test_forwarded_https() {
        let mut headers = HeaderMap::new();
        assert!(!forwarded_https(&headers));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert!(forwarded_https(&headers));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        assert!(!forwarded_https(&headers));

        headers.insert("x-forwarded-proto", HeaderValue::from_static("HTTPS"));
        assert!(!forwarded_https(&headers));
    }

    #[test]
    fn test_static_page_serves_every_path() {
        let page = StaticPage::new("<p>hi</p>");
        assert_eq!(page.read_root("/", ""), Some("<p>hi</p>".to_string()));
        assert_eq!(page.read_root("/deep/link", "/app"), Some("<p>hi</p>".to_string()));
    }
}
