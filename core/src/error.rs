//! Error vocabulary for endpoint calls and JSON decoding.
//!
//! # Design
//! Field-level failures (`DecodeError`) are kept separate from call-level
//! failures (`ApiError`) so a `JsonDecodable` implementation only ever has to
//! name the key that went wrong. Every `DecodeError` converts into
//! `ApiError::Decode` with `?`. Transport failures are boxed and passed
//! through untouched.

use thiserror::Error;

/// Outcome of one endpoint call: `Ok` carries the decoded response, `Err`
/// the reason the call or its decoding failed.
pub type ApiResult<T> = Result<T, ApiError>;

/// A field-level failure raised while reading a `JsonObject`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A required key was absent from the object.
    #[error("missing required key `{0}`")]
    MissingRequiredKey(String),

    /// The key was present but its value could not be read as the requested type.
    #[error("unexpected type for key `{key}`")]
    UnexpectedType { key: String },
}

impl DecodeError {
    /// The key this error refers to.
    pub fn key(&self) -> &str {
        match self {
            DecodeError::MissingRequiredKey(key) => key,
            DecodeError::UnexpectedType { key } => key,
        }
    }
}

/// Errors surfaced to the caller of an endpoint.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The response carried no content to decode.
    #[error("response body is empty")]
    EmptyBody,

    /// The body parsed as JSON but was not an object.
    #[error("unexpected response type: expected a JSON object")]
    UnexpectedResponseType,

    /// The object did not have the fields the response type requires.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// The body was not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint URL could not be parsed.
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}
