// Borrowed view of the inbound request handed to option providers.

use http::header::HOST;
use http::{HeaderMap, Method, Request, Uri};

/// The parts of the current request that option resolution may consult.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
}

impl<'a> RequestContext<'a> {
    pub fn new(method: &'a Method, uri: &'a Uri, headers: &'a HeaderMap) -> Self {
        Self { method, uri, headers }
    }

    pub fn from_parts(parts: &'a http::request::Parts) -> Self {
        Self::new(&parts.method, &parts.uri, &parts.headers)
    }

    pub fn from_request<B>(request: &'a Request<B>) -> Self {
        Self::new(request.method(), request.uri(), request.headers())
    }

    /// Host the request was addressed to: the `Host` header, else the URI authority.
    pub fn host(&self) -> Option<&'a str> {
        self.headers
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .filter(|h| !h.is_empty())
            .or_else(|| self.uri.authority().map(|a| a.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_from_header() {
        let request = Request::get("/api/auth/session")
            .header("host", "localhost:3000")
            .body(())
            .unwrap();
        assert_eq!(RequestContext::from_request(&request).host(), Some("localhost:3000"));
    }

    #[test]
    fn test_host_from_uri() {
        let request = Request::get("http://example.com/api").body(()).unwrap();
        assert_eq!(RequestContext::from_request(&request).host(), Some("example.com"));
    }

    #[test]
    fn test_no_host() {
        let request = Request::get("/api").body(()).unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(RequestContext::from_parts(&parts).host(), None);
    }
}
