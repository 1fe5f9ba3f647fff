//! `data:` URL decoding.
//!
//! [RFC 2397](https://www.rfc-editor.org/rfc/rfc2397)
//!
//! "data:[<mediatype>][;base64],<data>"

use base64::Engine;
use thiserror::Error;

/// Why a `data:` URL could not be decoded.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUrlError {
    /// The string does not start with `data:`.
    #[error("not a data URL")]
    NotDataUrl,
    /// No comma separates the metadata from the payload.
    #[error("invalid data URL: missing comma")]
    MissingComma,
    /// The base64 payload is malformed.
    #[error("base64 decode error: {0}")]
    Base64(String),
    /// A `%` escape is not followed by two hex digits.
    #[error("invalid percent escape at byte {0}")]
    PercentEscape(usize),
}

/// A parsed `data:` URL that can be decoded into raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl<'a> {
    media_type: &'a str,
    base64: bool,
    payload: &'a str,
}

impl<'a> DataUrl<'a> {
    /// Split a `data:` URL into its metadata and payload.
    ///
    /// # Errors
    ///
    /// Returns [`DataUrlError`] if the prefix or the comma is missing.
    pub fn parse(raw: &'a str) -> Result<Self, DataUrlError> {
        let rest = raw.strip_prefix("data:").ok_or(DataUrlError::NotDataUrl)?;
        let (metadata, payload) = rest.split_once(',').ok_or(DataUrlError::MissingComma)?;
        let (media_type, base64) = match metadata.strip_suffix(";base64") {
            Some(media) => (media, true),
            None => (metadata, false),
        };
        Ok(Self {
            media_type,
            base64,
            payload,
        })
    }

    /// The declared media type (may be empty).
    #[must_use]
    pub const fn media_type(&self) -> &'a str {
        self.media_type
    }

    /// Decode the payload into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DataUrlError`] if base64 or percent decoding fails.
    pub fn decode(&self) -> Result<Vec<u8>, DataUrlError> {
        if self.base64 {
            // Whitespace inside inline base64 is common in hand-written markup.
            let compact: String = self.payload.split_whitespace().collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| DataUrlError::Base64(e.to_string()))
        } else {
            percent_decode(self.payload)
        }
    }
}

/// Decode `%XX` escapes; other bytes pass through.
fn percent_decode(input: &str) -> Result<Vec<u8>, DataUrlError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3).ok_or(DataUrlError::PercentEscape(i))?;
            let value = u8::from_str_radix(hex, 16).map_err(|_| DataUrlError::PercentEscape(i))?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Decode a `data:` URL string in one call.
///
/// # Errors
///
/// Returns [`DataUrlError`] if parsing or decoding fails.
pub fn decode_data_url(raw: &str) -> Result<Vec<u8>, DataUrlError> {
    DataUrl::parse(raw)?.decode()
}
