//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::Result;

/// Resolve an endpoint path against the API base URL.
///
/// The base is treated as a directory even without a trailing slash, so
/// `https://host/api` + `progress/c1` gives `https://host/api/progress/c1`.
pub fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

/// Percent-encode an ID for use as one path segment.
pub fn path_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
