//! Client-side helpers for calling JSON APIs.
//!
//! # Overview
//! Describes an API call as an `Endpoint<R>`, derives a plain-data
//! `HttpRequest` from it, and decodes the eventual `HttpResponse` into `R`
//! through a typed `JsonObject` accessor. The network round-trip is left to
//! the host (host-does-IO pattern), either directly or through `Transport`.
//!
//! # Design
//! - `Endpoint` is pure configuration with explicit defaults (GET, no query,
//!   no headers) and carries its response type as a type parameter.
//! - `JsonObject` never mutates the parsed map; `get_required` and
//!   `get_optional` are the only ways fields come out of it.
//! - Every failure is returned as an `ApiError`; nothing is retried or
//!   substituted with a default.

pub mod endpoint;
pub mod error;
pub mod http;
pub mod json;

pub use endpoint::{decode, Endpoint};
pub use error::{ApiError, ApiResult, DecodeError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UnknownMethod};
pub use json::{FromJson, JsonDecodable, JsonObject};
pub use url::Url;
