//! Embedded-bitmap (`data:` URI) codec and asynchronous decoding.

use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageFormat, RgbaImage};
use thiserror::Error;

pub const PNG_MIME: &str = "image/png";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("not a data URI")]
    NotDataUri,
    #[error("data URI is missing a MIME type")]
    MissingMimeType,
    #[error("unsupported data URI encoding; expected base64")]
    UnsupportedEncoding,
    #[error("unsupported MIME type {mime}")]
    UnsupportedMimeType { mime: String },
    #[error("base64 payload is malformed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),
    #[error("image encode failed: {0}")]
    Encode(#[source] image::ImageError),
    #[error("decode task aborted: {message}")]
    TaskAborted { message: String },
}

pub type MediaResult<T> = std::result::Result<T, MediaError>;

/// A parsed `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(value: &str) -> MediaResult<Self> {
        let rest = value.trim().strip_prefix("data:").ok_or(MediaError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(MediaError::NotDataUri)?;
        let mut params = header.split(';');
        let mime = params
            .next()
            .filter(|mime| !mime.is_empty())
            .ok_or(MediaError::MissingMimeType)?
            .to_ascii_lowercase();
        if !params.any(|param| param.eq_ignore_ascii_case("base64")) {
            return Err(MediaError::UnsupportedEncoding);
        }
        let bytes = STANDARD.decode(payload.trim())?;
        Ok(Self { mime, bytes })
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            mime: PNG_MIME.to_string(),
            bytes,
        }
    }

    pub fn format(&self) -> MediaResult<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime).ok_or_else(|| MediaError::UnsupportedMimeType {
            mime: self.mime.clone(),
        })
    }

    pub fn decode(&self) -> MediaResult<RgbaImage> {
        let format = self.format()?;
        image::load_from_memory_with_format(&self.bytes, format)
            .map(|image| image.to_rgba8())
            .map_err(MediaError::Decode)
    }

    pub fn to_uri_string(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

pub fn encode_png(image: &RgbaImage) -> MediaResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(MediaError::Encode)?;
    Ok(bytes)
}

/// Encodes `image` as an alpha-capable PNG data URI.
pub fn encode_png_data_uri(image: &RgbaImage) -> MediaResult<String> {
    Ok(DataUri::png(encode_png(image)?).to_uri_string())
}

pub fn decode_data_uri(value: &str) -> MediaResult<RgbaImage> {
    DataUri::parse(value)?.decode()
}

/// Decodes on the blocking pool so the caller's task stays responsive.
pub async fn decode_data_uri_async(value: String) -> MediaResult<Arc<RgbaImage>> {
    tokio::task::spawn_blocking(move || decode_data_uri(&value).map(Arc::new))
        .await
        .map_err(|err| MediaError::TaskAborted {
            message: err.to_string(),
        })?
}

pub async fn encode_png_data_uri_async(image: Arc<RgbaImage>) -> MediaResult<String> {
    tokio::task::spawn_blocking(move || encode_png_data_uri(&image))
        .await
        .map_err(|err| MediaError::TaskAborted {
            message: err.to_string(),
        })?
}

#[cfg(test)]
pub(crate) fn png_data_uri_for_test(image: &RgbaImage) -> String {
    encode_png_data_uri(image).expect("test image should encode")
}
