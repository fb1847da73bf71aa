//! Page source protocol.
//!
//! Rendering pages belongs to the UI layer. The bridge only needs to know
//! whether a path resolves to content so it can answer and set the session
//! cookie.

/// Supplies the body of the page-load endpoint.
pub trait PageSource: Send + Sync {
    /// Content for `path` (already stripped of `root_path`), or `None` for 404.
    fn read_root(&self, path: &str, root_path: &str) -> Option<String>;
}
