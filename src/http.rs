//! Request and response model shared by the cache manager, the cache
//! storage backends and the network adapter.

use crate::error::{ShellCacheError, ShellCacheResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ureq::http::Uri;

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            other => Err(format!("unsupported method '{other}'")),
        }
    }
}

/// What the requesting context intends to do with the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// Full-page navigation
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// fetch()/XHR and anything unclassified
    #[default]
    Empty,
}

impl FromStr for Destination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(Self::Document),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "image" => Ok(Self::Image),
            "font" => Ok(Self::Font),
            "manifest" => Ok(Self::Manifest),
            "" | "empty" => Ok(Self::Empty),
            other => Err(format!("unknown destination '{other}'")),
        }
    }
}

/// How much of a response the requesting context may inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response
    Basic,
    /// Cross-origin response readable through CORS
    Cors,
    /// Cross-origin response whose status and body are hidden
    Opaque,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Cors => write!(f, "cors"),
            Self::Opaque => write!(f, "opaque"),
        }
    }
}

/// Scheme, host and port of a URL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    /// Parse an origin such as `https://example.edu` or `http://localhost:8080`
    pub fn parse(s: &str) -> ShellCacheResult<Self> {
        let uri = parse_uri(s)?;
        Self::of(&uri).ok_or_else(|| ShellCacheError::InvalidUrl {
            url: s.to_string(),
            reason: "expected an absolute http(s) URL".to_string(),
        })
    }

    /// Origin of an absolute URI, `None` for relative ones
    pub fn of(uri: &Uri) -> Option<Self> {
        let scheme = uri.scheme_str()?.to_ascii_lowercase();
        let host = uri.host()?.to_ascii_lowercase();
        let port = match (scheme.as_str(), uri.port_u16()) {
            ("http", Some(80)) | ("https", Some(443)) => None,
            (_, port) => port,
        };
        Some(Self { scheme, host, port })
    }

    /// Whether `uri` belongs to this origin
    pub fn contains(&self, uri: &Uri) -> bool {
        Self::of(uri).as_ref() == Some(self)
    }

    /// Resolve a root-relative (`/x`), dot-relative (`./x`) or absolute URL
    pub fn resolve(&self, target: &str) -> ShellCacheResult<Uri> {
        let target = target.split('#').next().unwrap_or_default();
        if target.contains("://") {
            return parse_uri(target);
        }

        let path = target.strip_prefix('.').unwrap_or(target);
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        parse_uri(&format!("{}{}", self, path))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}://{}:{}", self.scheme, self.host, port),
            None => write!(f, "{}://{}", self.scheme, self.host),
        }
    }
}

fn parse_uri(s: &str) -> ShellCacheResult<Uri> {
    let s = s.split('#').next().unwrap_or_default();
    s.parse::<Uri>().map_err(|e| ShellCacheError::InvalidUrl {
        url: s.to_string(),
        reason: e.to_string(),
    })
}

/// An outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Uri,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub destination: Destination,
}

impl Request {
    /// Create a request with an empty destination
    pub fn new(method: Method, url: Uri) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: None,
            destination: Destination::Empty,
        }
    }

    /// Create a GET request
    pub fn get(url: Uri) -> Self {
        Self::new(Method::Get, url)
    }

    /// Create a navigation (document) request
    pub fn navigate(url: Uri) -> Self {
        Self::get(url).with_destination(Destination::Document)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Whether this request loads a full document
    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Normalized key the cache stores entries under
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A response from the network or from cache storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub kind: ResponseType,
    /// Final URL after redirects
    pub url: String,
    pub redirected: bool,
}

impl Response {
    /// Create a same-origin response
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
            kind: ResponseType::Basic,
            url: String::new(),
            redirected: false,
        }
    }

    pub fn with_kind(mut self, kind: ResponseType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    /// Status in the 200-299 range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the response may be stored as a dynamic entry.
    ///
    /// Only plain 200s of same-origin responses that were not redirected
    /// qualify; partial content, errors and opaque bodies never do.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseType::Basic && !self.redirected
    }

    /// Value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::parse("http://localhost:8080").unwrap()
    }

    #[test]
    fn origin_normalizes_default_ports() {
        let a = Origin::parse("https://example.edu:443").unwrap();
        let b = Origin::parse("https://EXAMPLE.edu/some/path").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "https://example.edu");
    }

    #[test]
    fn origin_rejects_relative() {
        assert!(Origin::parse("/index.html").is_err());
    }

    #[test]
    fn origin_contains() {
        let origin = origin();
        assert!(origin.contains(&"http://localhost:8080/news.html".parse().unwrap()));
        assert!(!origin.contains(&"http://localhost:9090/news.html".parse().unwrap()));
        assert!(!origin.contains(&"https://cdn.example.com/lib.js".parse().unwrap()));
    }

    #[test]
    fn resolve_relative_paths() {
        let origin = origin();
        assert_eq!(
            origin.resolve("./resources/school-crest.png").unwrap().to_string(),
            "http://localhost:8080/resources/school-crest.png"
        );
        assert_eq!(
            origin.resolve("/").unwrap().to_string(),
            "http://localhost:8080/"
        );
        assert_eq!(
            origin.resolve("news.html#latest").unwrap().to_string(),
            "http://localhost:8080/news.html"
        );
    }

    #[test]
    fn resolve_absolute_passes_through() {
        let uri = origin().resolve("https://cdn.example.com/a.js").unwrap();
        assert_eq!(uri.host(), Some("cdn.example.com"));
    }

    #[test]
    fn cache_key_includes_method_and_query() {
        let url = origin().resolve("/news.html?page=2").unwrap();
        let request = Request::get(url);
        assert_eq!(
            request.cache_key(),
            "GET http://localhost:8080/news.html?page=2"
        );
    }

    #[test]
    fn navigation_detection() {
        let url = origin().resolve("/about.html").unwrap();
        assert!(Request::navigate(url.clone()).is_navigation());
        assert!(!Request::get(url)
            .with_destination(Destination::Image)
            .is_navigation());
    }

    #[test]
    fn cacheability() {
        assert!(Response::new(200, "ok").is_cacheable());
        assert!(!Response::new(206, "part").is_cacheable());
        assert!(!Response::new(404, "missing").is_cacheable());
        assert!(!Response::new(200, "x")
            .with_kind(ResponseType::Opaque)
            .is_cacheable());
        assert!(!Response::new(200, "x").redirected(true).is_cacheable());
    }

    #[test]
    fn method_parsing() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = Response::new(200, "").with_header("Content-Type", "text/html");
        assert_eq!(response.header("content-type"), Some("text/html"));
    }
}
