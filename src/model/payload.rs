//! Inline binary payloads (base64 data URIs) embedded in element trees.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use md5::{Digest, Md5};
use serde_json::{Map, Value};

/// Field names that may hold an inline payload.
pub const PAYLOAD_FIELDS: &[&str] = &["base64_data", "uri", "data_uri", "data", "image_data"];

/// Sibling fields that declare the MIME type of a bare `base64_data`.
pub const MIME_FIELDS: &[&str] = &["mime_type", "mimetype"];

/// Number of hex digits kept from the content hash.
pub const HASH_LEN: usize = 10;

/// An inline payload found at one field of an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload<'a> {
    /// Declared MIME type, if any
    pub mime_type: Option<String>,

    /// Base64 text without the data-URI header
    pub encoded: &'a str,
}

impl<'a> InlinePayload<'a> {
    /// Recognize a payload at `field` of `object`.
    ///
    /// Accepts any payload field holding a `data:image/...` URI, and a bare
    /// `base64_data` string when a MIME sibling field is present.
    pub fn detect(field: &str, value: &'a Value, object: &Map<String, Value>) -> Option<Self> {
        if !PAYLOAD_FIELDS.contains(&field) {
            return None;
        }
        let text = value.as_str()?;

        if let Some(uri) = parse_data_uri(text) {
            return uri.mime_type.starts_with("image/").then(|| Self {
                mime_type: Some(uri.mime_type.to_string()),
                encoded: uri.data,
            });
        }

        if field == "base64_data" {
            let mime = MIME_FIELDS
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_str))?;
            return Some(Self {
                mime_type: Some(mime.to_lowercase()),
                encoded: text,
            });
        }

        None
    }

    /// Content hash of the encoded text.
    pub fn hash(&self) -> String {
        content_hash(self.encoded)
    }

    /// Decode the payload bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let compact: String = self
            .encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        BASE64.decode(compact)
    }

    /// File extension from the declared MIME type, falling back to the
    /// decoded bytes' signature.
    pub fn extension(&self, bytes: &[u8]) -> &'static str {
        match self.mime_type.as_deref().map(extension_for_mime) {
            Some(ext) if ext != "bin" => ext,
            _ => detect_mime_type(bytes)
                .map(extension_for_mime)
                .unwrap_or("bin"),
        }
    }
}

/// A parsed `data:` URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    /// MIME type from the header (e.g., "image/png")
    pub mime_type: &'a str,

    /// Payload after the comma
    pub data: &'a str,
}

/// Parse a `data:<mime>;base64,<data>` URI.
pub fn parse_data_uri(text: &str) -> Option<DataUri<'_>> {
    let rest = text.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime_type = header.split(';').next().unwrap_or_default();
    if !header.contains(";base64") {
        return None;
    }
    Some(DataUri { mime_type, data })
}

/// First [`HASH_LEN`] hex digits of the MD5 of the encoded text.
///
/// Whitespace is ignored so wrapped and unwrapped encodings hash alike.
pub fn content_hash(encoded: &str) -> String {
    let mut hasher = Md5::new();
    for chunk in encoded.split_ascii_whitespace() {
        hasher.update(chunk.as_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..HASH_LEN].to_string()
}

/// Content hash of raw bytes, computed over their base64 encoding so it
/// matches [`content_hash`] of an inline payload.
pub fn content_hash_of_bytes(bytes: &[u8]) -> String {
    content_hash(&BASE64.encode(bytes))
}

/// Get the file extension for a MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "image/tiff" => "tiff",
        "image/bmp" => "bmp",
        "image/webp" => "webp",
        "image/jp2" | "image/jpeg2000" => "jp2",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// Detect MIME type from data magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 4 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // TIFF: 49 49 2A 00 (little-endian) or 4D 4D 00 2A (big-endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some("image/tiff");
    }

    // BMP: BM
    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    // WEBP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    if data.starts_with(b"%PDF") {
        return Some("application/pdf");
    }

    if data.starts_with(b"<svg") || data.starts_with(b"<?xml") {
        return Some("image/svg+xml");
    }

    None
}
