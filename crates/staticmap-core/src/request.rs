//! The finished request record.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// An assembled static-map request.
///
/// Immutable once built. The `ident` is a stable key for caching or
/// persisting the URL: either supplied by the caller or derived from the
/// URL itself via [`derive_ident`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapRequest {
    url: String,
    ident: String,
}

impl MapRequest {
    /// Create a record, deriving the identifier from the URL unless one
    /// is supplied.
    #[must_use]
    pub fn new(url: String, ident: Option<String>) -> Self {
        let ident = resolve_ident(&url, ident);
        Self { url, ident }
    }

    /// The full request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The record identifier.
    #[must_use]
    pub fn ident(&self) -> &str {
        &self.ident
    }

    /// Consumes the record, returning `(url, ident)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.url, self.ident)
    }
}

/// Use `ident` when supplied, otherwise [`derive_ident`] of `url`.
#[must_use]
pub fn resolve_ident(url: &str, ident: Option<String>) -> String {
    ident.unwrap_or_else(|| derive_ident(url))
}

/// Lowercase hex SHA-1 of the URL.
#[must_use]
pub fn derive_ident(url: &str) -> String {
    format!("{:x}", Sha1::digest(url.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn derive_ident_is_sha1_hex() {
        assert_eq!(derive_ident("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(derive_ident(""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn explicit_ident_wins() {
        let request = MapRequest::new("https://host/?key=A".to_owned(), Some("home".to_owned()));
        assert_eq!(request.ident(), "home");
        assert_eq!(request.url(), "https://host/?key=A");
    }

    #[test]
    fn missing_ident_is_derived() {
        let request = MapRequest::new("abc".to_owned(), None);
        assert_eq!(request.ident(), derive_ident("abc"));
    }

    #[test]
    fn same_url_same_ident() {
        let a = MapRequest::new("https://host/?a".to_owned(), None);
        let b = MapRequest::new("https://host/?a".to_owned(), None);
        let c = MapRequest::new("https://host/?b".to_owned(), None);
        assert_eq!(a, b);
        assert_ne!(a.ident(), c.ident());
    }

    #[test]
    fn serde_round_trip() {
        let request = MapRequest::new("abc".to_owned(), None);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"ident\":\"a9993e36"));
        let back: MapRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }
}
