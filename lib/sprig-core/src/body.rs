//! Body encoding primitives.

use bytes::Bytes;

use crate::Result;

/// `application/json`.
pub const JSON: &str = "application/json";
/// `application/x-www-form-urlencoded`.
pub const FORM_URL_ENCODED: &str = "application/x-www-form-urlencoded";
/// `multipart/form-data`.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Body encoding family selected by a declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json`: structured encoding.
    Json,
    /// `application/x-www-form-urlencoded`: key/value encoding.
    FormUrlEncoded,
    /// `multipart/form-data`.
    Multipart,
    /// Anything else.
    Other,
}

impl ContentType {
    /// Classify a `Content-Type` header value.
    ///
    /// Only the media type is considered: parameters such as `charset` are
    /// ignored and the comparison is case-insensitive.
    ///
    /// ```
    /// use sprig_core::ContentType;
    ///
    /// assert_eq!(ContentType::classify("application/json; charset=utf-8"), ContentType::Json);
    /// assert_eq!(ContentType::classify("text/plain"), ContentType::Other);
    /// ```
    #[must_use]
    pub fn classify(header_value: &str) -> Self {
        let media_type = header_value
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();

        if media_type.eq_ignore_ascii_case(JSON) {
            Self::Json
        } else if media_type.eq_ignore_ascii_case(FORM_URL_ENCODED) {
            Self::FormUrlEncoded
        } else if media_type.eq_ignore_ascii_case(MULTIPART_FORM_DATA) {
            Self::Multipart
        } else {
            Self::Other
        }
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use sprig_core::encode_structured_body;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Post { title: String }
///
/// let post = Post { title: "Some title".to_string() };
/// let bytes = encode_structured_body(&post).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"title":"Some title"}"#);
/// ```
pub fn encode_structured_body<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// Uses `serde_html_form` which supports `Vec<T>` for repeated form fields
/// (e.g., `tags=a&tags=b&tags=c`).
///
/// # Errors
///
/// Returns an error if form serialization fails.
///
/// # Example
///
/// ```
/// use sprig_core::encode_url_form_body;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Login { username: String, password: String }
///
/// let login = Login { username: "alice".to_string(), password: "secret".to_string() };
/// let bytes = encode_url_form_body(&login).expect("serialize");
/// assert_eq!(bytes.as_ref(), b"username=alice&password=secret");
/// ```
pub fn encode_url_form_body<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_html_form::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}
