use crate::error::AppError;
use base64::{engine::general_purpose, Engine as _};

/// Gemini's inline data limit per request part
const MAX_INLINE_BYTES: usize = 20 * 1024 * 1024;

/// Base64 body of an uploaded file plus its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload {
    pub mime_type: String,
    pub data: String,
}

/// Parse an upload given either as a data URL ("data:image/png;base64,<data>")
/// or as bare base64. Bare input is tagged with `default_mime`.
pub fn parse_inline_payload(input: &str, default_mime: &str) -> Result<InlinePayload, AppError> {
    let (mime_type, data) = match input.strip_prefix("data:") {
        Some(url_body) => parse_data_url_body(url_body)?,
        None => (default_mime.to_string(), input.trim().to_string()),
    };

    if data.is_empty() {
        return Err(AppError::ConversionError("Inline payload is empty".to_string()));
    }

    // Validate base64 encoding and decode to check size
    let decoded = general_purpose::STANDARD
        .decode(&data)
        .map_err(|e| AppError::ConversionError(format!("Invalid base64 data: {}", e)))?;

    if decoded.len() > MAX_INLINE_BYTES {
        return Err(AppError::ConversionError(format!(
            "Payload too large: {} bytes (max: {} bytes)",
            decoded.len(),
            MAX_INLINE_BYTES
        )));
    }

    Ok(InlinePayload { mime_type, data })
}

fn parse_data_url_body(url_body: &str) -> Result<(String, String), AppError> {
    let Some((header, data)) = url_body.split_once(',') else {
        return Err(AppError::ConversionError(
            "Invalid data URL format: missing comma separator".to_string(),
        ));
    };

    // Parse header: "image/jpeg;base64" or just "image/jpeg"
    let mut header_parts = header.split(';');
    let mime_type = header_parts.next().unwrap_or_default().to_string();
    let is_base64 = header_parts.any(|part| part == "base64");

    if !is_base64 {
        return Err(AppError::ConversionError(
            "Only base64-encoded data URLs are supported".to_string(),
        ));
    }

    if mime_type.is_empty() {
        return Err(AppError::ConversionError(
            "Data URL is missing a MIME type".to_string(),
        ));
    }

    Ok((mime_type, data.to_string()))
}

/// Build the data URL handed back to the UI for a generated image
pub fn to_data_url(mime_type: &str, data: &str) -> String {
    format!("data:{};base64,{}", mime_type, data)
}
