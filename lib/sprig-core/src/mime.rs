//! Signature-based MIME type sniffing for uploaded payloads.

use derive_more::Display;

/// MIME types recognised by [`infer_mime_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum MimeType {
    /// `image/png`
    #[display("image/png")]
    Png,
    /// `image/jpeg`
    #[display("image/jpeg")]
    Jpeg,
    /// `image/gif`
    #[display("image/gif")]
    Gif,
    /// `image/webp`
    #[display("image/webp")]
    Webp,
    /// `image/bmp`
    #[display("image/bmp")]
    Bmp,
    /// `image/tiff`
    #[display("image/tiff")]
    Tiff,
    /// `application/pdf`
    #[display("application/pdf")]
    Pdf,
    /// `application/zip`
    #[display("application/zip")]
    Zip,
    /// `application/gzip`
    #[display("application/gzip")]
    Gzip,
    /// `video/mp4`
    #[display("video/mp4")]
    Mp4,
    /// `application/json`
    #[display("application/json")]
    Json,
    /// `application/octet-stream`, the fallback.
    #[display("application/octet-stream")]
    OctetStream,
}

impl MimeType {
    /// The MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Pdf => "application/pdf",
            Self::Zip => "application/zip",
            Self::Gzip => "application/gzip",
            Self::Mp4 => "video/mp4",
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

/// Infer a MIME type from the leading bytes of a payload.
///
/// ```
/// use sprig_core::{MimeType, infer_mime_type};
///
/// assert_eq!(infer_mime_type(b"\x89PNG\r\n\x1a\n...."), MimeType::Png);
/// assert_eq!(infer_mime_type(b"plain text"), MimeType::OctetStream);
/// ```
#[must_use]
pub fn infer_mime_type(data: &[u8]) -> MimeType {
    match data {
        [0x89, b'P', b'N', b'G', ..] => MimeType::Png,
        [0xFF, 0xD8, 0xFF, ..] => MimeType::Jpeg,
        [b'G', b'I', b'F', b'8', ..] => MimeType::Gif,
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => MimeType::Webp,
        [b'%', b'P', b'D', b'F', ..] => MimeType::Pdf,
        [b'P', b'K', 0x03, 0x04, ..] => MimeType::Zip,
        [0x1F, 0x8B, ..] => MimeType::Gzip,
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => MimeType::Tiff,
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => MimeType::Mp4,
        [b'B', b'M', ..] => MimeType::Bmp,
        _ if looks_like_json(data) => MimeType::Json,
        _ => MimeType::OctetStream,
    }
}

fn looks_like_json(data: &[u8]) -> bool {
    matches!(
        data.iter().find(|byte| !byte.is_ascii_whitespace()),
        Some(b'{' | b'[')
    )
}
