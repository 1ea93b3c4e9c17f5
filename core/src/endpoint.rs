//! Declarative description of one API call.
//!
//! # Design
//! `Endpoint<R>` is pure configuration: a URL, a method, optional query and
//! header mappings, and the response type `R` it decodes into. Defaults are
//! set explicitly in `Endpoint::new` (GET, no query, no headers) and changed
//! through consuming builder methods.
//!
//! The URL is parsed when the descriptor is built. Request derivation
//! therefore cannot fail and query parameters are never dropped on the way
//! to the transport.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use tracing::debug;
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::json::{JsonDecodable, JsonObject};

/// One API call and the type its response decodes into.
pub struct Endpoint<R> {
    url: Url,
    method: HttpMethod,
    query: Option<BTreeMap<String, String>>,
    headers: Option<BTreeMap<String, String>>,
    response: PhantomData<fn() -> R>,
}

impl<R: JsonDecodable> Endpoint<R> {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: HttpMethod::Get,
            query: None,
            headers: None,
            response: PhantomData,
        }
    }

    /// Parse `url` and build a GET descriptor for it.
    pub fn parse(url: &str) -> ApiResult<Self> {
        let parsed = Url::parse(url).map_err(|source| ApiError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self::new(parsed))
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Add one query parameter, replacing any earlier value for `key`.
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let query = self.query.get_or_insert_with(BTreeMap::new);
        query.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add one header, replacing any earlier value for `name`.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let map = self.headers.get_or_insert_with(BTreeMap::new);
        map.extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn http_method(&self) -> HttpMethod {
        self.method
    }

    pub fn query_params(&self) -> Option<&BTreeMap<String, String>> {
        self.query.as_ref()
    }

    pub fn header_fields(&self) -> Option<&BTreeMap<String, String>> {
        self.headers.as_ref()
    }

    /// Build the plain-data request for this endpoint.
    ///
    /// Query parameters are form-encoded and appended, in key order, after any
    /// query already present on the URL.
    pub fn to_request(&self) -> HttpRequest {
        let mut url = self.url.clone();
        if let Some(query) = self.query.as_ref().filter(|q| !q.is_empty()) {
            url.query_pairs_mut().extend_pairs(query);
        }

        let headers = self
            .headers
            .iter()
            .flatten()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let request = HttpRequest {
            method: self.method,
            url: url.into(),
            headers,
        };
        debug!(method = %request.method, url = %request.url, "derived request");
        request
    }

    /// Decode a response received for this endpoint.
    pub fn decode_response(&self, response: HttpResponse) -> ApiResult<R> {
        if !response.is_success() {
            debug!(status = response.status, url = %self.url, "non-success response");
            return Err(ApiError::HttpStatus {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        decode(&response.body).inspect_err(|err| {
            debug!(status = response.status, url = %self.url, error = %err, "response rejected");
        })
    }

    /// Derive the request, hand it to `transport`, and decode the response.
    pub fn call<T: Transport>(&self, transport: &T) -> ApiResult<R> {
        let request = self.to_request();
        let response = transport
            .execute(&request)
            .map_err(|err| ApiError::Transport(Box::new(err)))?;
        self.decode_response(response)
    }
}

/// Decode a raw response body into `R`.
pub fn decode<R: JsonDecodable>(body: &[u8]) -> ApiResult<R> {
    let json = JsonObject::parse(body)?;
    Ok(R::from_json(&json)?)
}

// Manual impls: `R` is only a marker and need not be `Clone` or `Debug`.
impl<R> Clone for Endpoint<R> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            method: self.method,
            query: self.query.clone(),
            headers: self.headers.clone(),
            response: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Endpoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url.as_str())
            .field("method", &self.method)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("response", &std::any::type_name::<R>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io;

    use super::*;
    use crate::error::DecodeError;

    #[derive(Debug, PartialEq)]
    struct Item {
        name: String,
        count: Option<i64>,
    }

    impl JsonDecodable for Item {
        fn from_json(json: &JsonObject) -> Result<Self, DecodeError> {
            Ok(Self {
                name: json.get_required("name")?,
                count: json.get_optional("count")?,
            })
        }
    }

    fn items() -> Endpoint<Item> {
        Endpoint::parse("https://api.example.com/items").unwrap()
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn defaults_to_get_without_query_or_headers() {
        let endpoint = items();
        assert_eq!(endpoint.http_method(), HttpMethod::Get);
        assert!(endpoint.query_params().is_none());
        assert!(endpoint.header_fields().is_none());

        let req = endpoint.to_request();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.example.com/items");
        assert!(req.headers.is_empty());
    }

    #[test]
    fn page_query_is_appended() {
        let req = items().method(HttpMethod::Get).query_param("page", "2").to_request();
        assert_eq!(req.method.as_str(), "GET");
        assert_eq!(req.url, "https://api.example.com/items?page=2");
    }

    #[test]
    fn multiple_query_params_are_all_present() {
        let req = items().query([("b", "2"), ("a", "1")]).to_request();
        let url = Url::parse(&req.url).unwrap();
        let pairs: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs["a"], "1");
        assert_eq!(pairs["b"], "2");
    }

    #[test]
    fn query_values_are_encoded() {
        let req = items().query_param("q", "a&b=c d").to_request();
        assert_eq!(req.url, "https://api.example.com/items?q=a%26b%3Dc+d");
        let url = Url::parse(&req.url).unwrap();
        let (_, value) = url.query_pairs().next().unwrap();
        assert_eq!(value, "a&b=c d");
    }

    #[test]
    fn existing_query_is_kept() {
        let endpoint: Endpoint<Item> = Endpoint::parse("https://api.example.com/items?sort=asc")
            .unwrap()
            .query_param("page", "3");
        assert_eq!(endpoint.to_request().url, "https://api.example.com/items?sort=asc&page=3");
    }

    #[test]
    fn empty_query_leaves_url_untouched() {
        let endpoint = items().query(Vec::<(String, String)>::new());
        assert_eq!(endpoint.to_request().url, "https://api.example.com/items");
    }

    #[test]
    fn headers_are_copied_exactly() {
        let req = items()
            .header("X-Test", "v")
            .headers([("Accept", "application/json")])
            .to_request();
        assert_eq!(req.header("X-Test"), Some("v"));
        assert_eq!(
            req.headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("X-Test".to_string(), "v".to_string()),
            ]
        );
    }

    #[test]
    fn to_request_leaves_descriptor_unchanged() {
        let endpoint = items().method(HttpMethod::Post).query_param("page", "1");
        let first = endpoint.to_request();
        let second = endpoint.to_request();
        assert_eq!(first, second);
        assert_eq!(endpoint.url().as_str(), "https://api.example.com/items");
        assert_eq!(endpoint.http_method(), HttpMethod::Post);
    }

    #[test]
    fn invalid_url_fails_loudly() {
        let err = Endpoint::<Item>::parse("not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl { ref url, .. } if url == "not a url"));
    }

    #[test]
    fn decode_response_success() {
        let item = items()
            .decode_response(ok(r#"{"name": "widget", "count": null}"#))
            .unwrap();
        assert_eq!(
            item,
            Item {
                name: "widget".to_string(),
                count: None,
            }
        );
    }

    #[test]
    fn decode_response_failures() {
        let endpoint = items();
        assert!(matches!(endpoint.decode_response(ok("")), Err(ApiError::EmptyBody)));
        assert!(matches!(
            endpoint.decode_response(ok("[]")),
            Err(ApiError::UnexpectedResponseType)
        ));
        assert!(matches!(
            endpoint.decode_response(ok(r#"{"count": 1}"#)),
            Err(ApiError::Decode(DecodeError::MissingRequiredKey(ref k))) if k == "name"
        ));
        assert!(matches!(
            endpoint.decode_response(ok(r#"{"name": 7}"#)),
            Err(ApiError::Decode(DecodeError::UnexpectedType { ref key })) if key == "name"
        ));
    }

    #[test]
    fn decode_response_reports_status() {
        let response = HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: b"no such item".to_vec(),
        };
        let err = items().decode_response(response).unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus { status: 404, ref body } if body == "no such item"));
    }

    struct Canned {
        seen: RefCell<Vec<HttpRequest>>,
        reply: Result<HttpResponse, io::ErrorKind>,
    }

    impl Transport for Canned {
        type Error = io::Error;

        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Self::Error> {
            self.seen.borrow_mut().push(request.clone());
            self.reply.clone().map_err(io::Error::from)
        }
    }

    #[test]
    fn call_executes_derived_request() {
        let transport = Canned {
            seen: RefCell::new(Vec::new()),
            reply: Ok(ok(r#"{"name": "widget", "count": 3}"#)),
        };
        let endpoint = items().query_param("page", "2").header("X-Test", "v");
        let item = endpoint.call(&transport).unwrap();
        assert_eq!(item.count, Some(3));

        let seen = transport.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], endpoint.to_request());
    }

    #[test]
    fn call_passes_transport_errors_through() {
        let transport = Canned {
            seen: RefCell::new(Vec::new()),
            reply: Err(io::ErrorKind::ConnectionRefused),
        };
        let source = match items().call(&transport) {
            Err(ApiError::Transport(source)) => source,
            other => panic!("expected transport error, got {other:?}"),
        };
        let io_err = source.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn decode_is_usable_without_an_endpoint() {
        let item: Item = decode(br#"{"name": "bolt", "count": 12}"#).unwrap();
        assert_eq!(item.count, Some(12));
    }
}
