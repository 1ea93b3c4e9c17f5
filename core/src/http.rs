//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The core
//! crate builds `HttpRequest` values and decodes `HttpResponse` values without
//! touching the network. Actual I/O sits behind the `Transport` trait, which
//! the caller implements with whatever HTTP client the host already has.
//!
//! All fields use owned types (`String`, `Vec`) so a request carries no
//! borrowed or transport state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Options,
    #[default]
    Get,
    Head,
    Post,
    Put,
    Delete,
    Trace,
    Connect,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Options,
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Trace,
        HttpMethod::Connect,
    ];

    /// Upper-case wire form, as sent on the request line.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown HTTP method `{0}`")]
pub struct UnknownMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// An HTTP request described as plain data.
///
/// Built by `Endpoint::to_request`. The transport executes it and returns the
/// corresponding `HttpResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// First header value whose name matches `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Executes an `HttpRequest` against the network.
///
/// Implemented by the host over its HTTP client of choice. Errors are handed
/// back to the caller unchanged inside `ApiError::Transport`, and a non-2xx
/// status must be returned as a response rather than an error.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    type Error = T::Error;

    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Self::Error> {
        (**self).execute(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_method_is_get() {
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }

    #[test]
    fn method_string_forms_round_trip() {
        for method in HttpMethod::ALL {
            assert_eq!(method.as_str().parse::<HttpMethod>().unwrap(), method);
            assert_eq!(method.to_string(), method.as_str());
        }
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = "get".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err, UnknownMethod("get".to_string()));
        assert!("PATCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn method_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&HttpMethod::Delete).unwrap(), r#""DELETE""#);
        let method: HttpMethod = serde_json::from_str(r#""OPTIONS""#).unwrap();
        assert_eq!(method, HttpMethod::Options);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse {
            status: 200,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Vec::new(),
        };
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("x-missing"), None);
    }

    #[test]
    fn success_covers_2xx_only() {
        let status = |status| HttpResponse {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        };
        assert!(status(200).is_success());
        assert!(status(204).is_success());
        assert!(!status(199).is_success());
        assert!(!status(301).is_success());
        assert!(!status(404).is_success());
    }
}
