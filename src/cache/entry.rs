//! Requests, request keys and stored responses

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// An outgoing request seen by the fetch interceptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-cased HTTP method
    pub method: String,
    /// Absolute request URL
    pub url: Url,
    /// Request headers (not used for cache matching)
    pub headers: Vec<(String, String)>,
    /// Request body, empty for GET/HEAD
    pub body: Vec<u8>,
}

impl Request {
    /// Create a request with the given method
    pub fn new(method: &str, url: Url) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url,
            headers: vec![],
            body: vec![],
        }
    }

    /// Create a GET request
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Key this request is matched under
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Bucket key: method plus URL with the fragment removed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.to_ascii_uppercase(),
            url: url.into(),
        }
    }

    /// Only GET requests are stored or matched
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    /// Stable hex digest used as an on-disk file stem
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b" ");
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A response as returned by the network or stored in a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![],
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// SHA256 of the body, hex encoded
    pub fn body_digest(&self) -> String {
        hex::encode(Sha256::digest(&self.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn key_strips_fragment() {
        let a = RequestKey::new("get", &url("http://localhost/about#team"));
        let b = RequestKey::new("GET", &url("http://localhost/about"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "GET http://localhost/about");
    }

    #[test]
    fn key_keeps_query() {
        let a = RequestKey::new("GET", &url("http://localhost/feed.xml?page=2"));
        let b = RequestKey::new("GET", &url("http://localhost/feed.xml"));
        assert_ne!(a, b);
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn only_get_is_cacheable() {
        assert!(Request::get(url("http://localhost/")).key().is_cacheable());
        assert!(!Request::new("post", url("http://localhost/")).key().is_cacheable());
        assert!(!Request::new("HEAD", url("http://localhost/")).key().is_cacheable());
    }

    #[test]
    fn response_header_lookup() {
        let mut response = CachedResponse::new(200, "body");
        response
            .headers
            .push(("Content-Type".to_string(), "text/css".to_string()));

        assert_eq!(response.header("content-type"), Some("text/css"));
        assert!(response.header("etag").is_none());
        assert!(response.is_ok());
        assert!(!CachedResponse::new(404, "").is_ok());
    }
}
