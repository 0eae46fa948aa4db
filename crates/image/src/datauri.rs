use {
    crate::*,
    base64::{Engine, engine::general_purpose::STANDARD},
};

pub const JPEG_MIME: &str = "image/jpeg";

/// The decoded contents of a `data:` URI.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URI.
///
/// A bare base64 string without the `data:` header is accepted as well, in
/// which case the mime type is reported as JPEG.
pub fn decode_data_uri(uri: &str) -> Result<DataUri, ImageError> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Ok(DataUri {
            mime: JPEG_MIME.to_string(),
            bytes: STANDARD.decode(uri.trim())?,
        });
    };
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::DataUri("missing ',' separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ImageError::DataUri(format!("not base64 encoded: {header}")))?;
    Ok(DataUri {
        mime: mime.to_string(),
        bytes: STANDARD.decode(payload.trim())?,
    })
}
