//! Multipart form data for file uploads.
//!
//! Generated upload operations wrap the payload in a [`PayloadDescription`]
//! and encode it with [`encode_multipart_body`]. [`Form`] and [`Part`] are
//! the underlying building blocks and can be used directly.
//!
//! # Example
//!
//! ```
//! use sprig_core::{Form, Part};
//!
//! let form = Form::with_boundary("sprig-boundary")
//!     .part(Part::new("name", "John Doe"))
//!     .part(Part::new("avatar", vec![0x89, 0x50, 0x4E, 0x47]).with_filename("photo.png"));
//!
//! let (content_type, _body) = form.into_body();
//! assert_eq!(content_type, "multipart/form-data; boundary=sprig-boundary");
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::body::MULTIPART_FORM_DATA;
use crate::mime::{MimeType, infer_mime_type};

/// Field name, file name and MIME type of an uploaded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDescription {
    name: String,
    file_name: String,
    mime_type: MimeType,
}

impl PayloadDescription {
    /// Field and file name used when an upload declares none.
    pub const DEFAULT_NAME: &'static str = "payload";

    /// Describe a payload.
    #[must_use]
    pub fn new(name: impl Into<String>, file_name: impl Into<String>, mime_type: MimeType) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            mime_type,
        }
    }

    /// Describe a payload, sniffing its MIME type from the data.
    #[must_use]
    pub fn for_data(name: impl Into<String>, file_name: impl Into<String>, data: &[u8]) -> Self {
        Self::new(name, file_name, infer_mime_type(data))
    }

    /// Logical form field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name announced in `Content-Disposition`.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// MIME type of the payload.
    #[must_use]
    pub const fn mime_type(&self) -> MimeType {
        self.mime_type
    }
}

/// Encode one described payload as a multipart body.
///
/// Returns the `Content-Type` header value (with its boundary) and the body.
#[must_use]
pub fn encode_multipart_body(payload: &PayloadDescription, data: Bytes) -> (String, Bytes) {
    Form::new()
        .part(
            Part::new(payload.name(), data)
                .with_filename(payload.file_name())
                .with_content_type(payload.mime_type().as_str()),
        )
        .into_body()
}

/// A single part in a multipart form.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// Create a new part with the given name and data.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Set the filename for this part.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the content type for this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Get the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Get the content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Get the part data.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// A multipart form containing multiple parts.
#[derive(Debug, Clone)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create a new empty form with a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("sprig-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Create a new form with a custom boundary.
    ///
    /// The boundary should be a unique string that doesn't appear in any part data.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Add a part to the form.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Get the boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Get the parts in this form.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("{MULTIPART_FORM_DATA}; boundary={}", self.boundary)
    }

    /// Convert the form into (content-type header value, body bytes).
    #[must_use]
    pub fn into_body(self) -> (String, Bytes) {
        let content_type = self.content_type();
        let body = self.encode();
        (content_type, body)
    }

    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        for part in &self.parts {
            buf.put_slice(b"--");
            buf.put_slice(self.boundary.as_bytes());
            buf.put_slice(b"\r\n");

            buf.put_slice(b"Content-Disposition: form-data; name=\"");
            buf.put_slice(part.name.as_bytes());
            buf.put_slice(b"\"");
            if let Some(filename) = &part.filename {
                buf.put_slice(b"; filename=\"");
                buf.put_slice(filename.as_bytes());
                buf.put_slice(b"\"");
            }
            buf.put_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                buf.put_slice(b"Content-Type: ");
                buf.put_slice(content_type.as_bytes());
                buf.put_slice(b"\r\n");
            }

            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        buf.freeze()
    }
}
