//! Error types for sprig services.

use bytes::Bytes;
use derive_more::{Display, Error, From};

use crate::template::TemplateError;

/// Main error type for generated service operations.
///
/// Cloneable so that mock result slots can hand the same failure out
/// more than once.
#[derive(Debug, Clone, Display, Error, From)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[display("unexpected response {status}: {description}")]
    #[from(skip)]
    UnexpectedResponse {
        /// HTTP status code.
        status: u16,
        /// Capitalized reason phrase, e.g. `Not Found`.
        description: String,
        /// Response body, if any.
        #[error(not(source))]
        body: Option<Bytes>,
    },

    /// The response body could not be decoded into the declared type.
    #[display("failed to map response at '{path}': {message}")]
    #[from(skip)]
    FailedToMapResponse {
        /// Path to the offending field (e.g. `user.address.city`).
        path: String,
        /// Decoder message.
        message: String,
    },

    /// Fallback condition, also the initial value of every mock slot.
    #[display("unknown error")]
    #[from(skip)]
    Unknown,

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Certificate pinning rejected or could not be applied.
    #[display("certificate pinning failed: {_0}")]
    #[from(skip)]
    Pinning(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Request body encoding error.
    #[display("failed to encode body: {_0}")]
    #[from(skip)]
    Encoding(#[error(not(source))] String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// URL template could not be parsed or resolved.
    #[display("invalid URL template: {_0}")]
    #[from]
    Template(TemplateError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Field-less discriminant of [`Error`], handy for assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// See [`Error::UnexpectedResponse`].
    UnexpectedResponse,
    /// See [`Error::FailedToMapResponse`].
    FailedToMapResponse,
    /// See [`Error::Unknown`].
    Unknown,
    /// See [`Error::Connection`].
    Connection,
    /// See [`Error::Tls`].
    Tls,
    /// See [`Error::Pinning`].
    Pinning,
    /// See [`Error::Timeout`].
    Timeout,
    /// See [`Error::InvalidRequest`], [`Error::InvalidUrl`] and [`Error::Template`].
    InvalidRequest,
    /// See [`Error::Encoding`].
    Encoding,
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Encoding(error.to_string())
    }
}

impl From<serde_html_form::ser::Error> for Error {
    fn from(error: serde_html_form::ser::Error) -> Self {
        Self::Encoding(error.to_string())
    }
}

impl Error {
    /// Create an unexpected-response error, deriving the description from the status.
    #[must_use]
    pub fn unexpected_response(status: u16, body: Option<Bytes>) -> Self {
        Self::UnexpectedResponse {
            status,
            description: status_description(status),
            body,
        }
    }

    /// Create a decode error with path context.
    #[must_use]
    pub fn failed_to_map(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FailedToMapResponse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create a pinning error.
    #[must_use]
    pub fn pinning(message: impl Into<String>) -> Self {
        Self::Pinning(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// The field-less kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedResponse { .. } => ErrorKind::UnexpectedResponse,
            Self::FailedToMapResponse { .. } => ErrorKind::FailedToMapResponse,
            Self::Unknown => ErrorKind::Unknown,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Tls(_) => ErrorKind::Tls,
            Self::Pinning(_) => ErrorKind::Pinning,
            Self::Timeout => ErrorKind::Timeout,
            Self::InvalidRequest(_) | Self::InvalidUrl(_) | Self::Template(_) => {
                ErrorKind::InvalidRequest
            }
            Self::Encoding(_) => ErrorKind::Encoding,
        }
    }

    /// Returns `true` if this is an unexpected-response error.
    #[must_use]
    pub const fn is_unexpected_response(&self) -> bool {
        matches!(self, Self::UnexpectedResponse { .. })
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns the HTTP status code of an unexpected response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the status description of an unexpected response.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::UnexpectedResponse { description, .. } => Some(description),
            _ => None,
        }
    }

    /// Returns the response body of an unexpected response, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            Self::UnexpectedResponse { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

/// Canonical reason phrase with every word capitalized.
fn status_description(status: u16) -> String {
    let Some(reason) = http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
    else {
        return format!("Status {status}");
    };

    reason
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn error_display() {
        let err = Error::unexpected_response(404, None);
        check!(err.to_string() == "unexpected response 404: Not Found");

        check!(Error::Unknown.to_string() == "unknown error");

        let err = Error::failed_to_map("user.address.city", "missing field `city`");
        check!(
            err.to_string() == "failed to map response at 'user.address.city': missing field `city`"
        );
    }

    #[test]
    fn description_is_capitalized() {
        check!(status_description(404) == "Not Found");
        check!(status_description(500) == "Internal Server Error");
        check!(status_description(418) == "I'm A Teapot");
        check!(status_description(299) == "Status 299");
    }

    #[test]
    fn unexpected_response_accessors() {
        let body = Bytes::from_static(b"{\"error\":\"gone\"}");
        let err = Error::unexpected_response(410, Some(body.clone()));

        check!(err.status() == Some(410));
        check!(err.description() == Some("Gone"));
        check!(err.body() == Some(&body));
        check!(err.kind() == ErrorKind::UnexpectedResponse);
        check!(err.is_unexpected_response());
    }

    #[test]
    fn kind_groups_request_errors() {
        let_assert!(Err(parse) = url::Url::parse("not a url"));
        check!(Error::from(parse).kind() == ErrorKind::InvalidRequest);
        check!(Error::invalid_request("bad").kind() == ErrorKind::InvalidRequest);
        check!(Error::Timeout.kind() == ErrorKind::Timeout);
        check!(Error::Timeout.status().is_none());
    }

    #[test]
    fn errors_are_cloneable() {
        let err = Error::pinning("no match");
        let copy = err.clone();
        check!(copy.to_string() == err.to_string());
    }
}
