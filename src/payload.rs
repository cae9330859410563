//! # Sticker Payloads
//!
//! Encoded image bytes, their preview form, and the Dimension Inspector.
//!
//! A [`StickerImage`] owns one encoded image together with a `data:` URI
//! preview derived from the very same bytes. It can only be built from pixels
//! ([`StickerImage::encode`]) or from bytes that decode cleanly
//! ([`StickerImage::from_bytes`]), so the bytes, the preview and the recorded
//! dimensions always describe one picture. Changing a sticker's picture means
//! replacing the whole value.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{StickerError, StickerResult};

/// Encodings a sticker can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless, keeps transparency
    #[default]
    Png,
    /// Lossy, alpha is dropped
    Jpeg,
    /// Lossless WebP, keeps transparency
    #[value(name = "webp")]
    WebP,
}

impl OutputFormat {
    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::WebP => ImageFormat::WebP,
        }
    }

    pub fn mime(self) -> &'static str {
        self.image_format().to_mime_type()
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::WebP => "webp",
        }
    }
}

/// Intrinsic pixel size of an image payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Report the pixel size of an encoded image without decoding its pixels.
///
/// Only the header is read; the payload is never modified.
///
/// # Errors
///
/// `Decode` if the format cannot be recognised or the header is invalid.
pub fn dimensions_of(bytes: &[u8]) -> StickerResult<Dimensions> {
    let (width, height) = reader_for(bytes)?
        .into_dimensions()
        .map_err(|e| StickerError::decode("image header", e.to_string()))?;
    Ok(Dimensions { width, height })
}

/// Decode an encoded image into RGBA8 pixels.
pub fn decode_rgba(bytes: &[u8]) -> StickerResult<RgbaImage> {
    let image = reader_for(bytes)?
        .decode()
        .map_err(|e| StickerError::decode("image", e.to_string()))?;
    Ok(image.into_rgba8())
}

fn reader_for(bytes: &[u8]) -> StickerResult<ImageReader<Cursor<&[u8]>>> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| StickerError::decode("image", e.to_string()))?;
    if reader.format().is_none() {
        return Err(StickerError::decode("image", "unrecognised image format")
            .with_metadata("bytes", bytes.len().to_string()));
    }
    Ok(reader)
}

/// Build a `data:` URI for encoded bytes.
pub fn data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Extract the bytes of a base64 `data:` URI. A bare base64 string is
/// accepted as well.
pub fn parse_data_uri(value: &str) -> StickerResult<Vec<u8>> {
    let trimmed = value.trim();
    let encoded = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| StickerError::decode("data URI", "missing ',' separator"))?;
            if !meta.ends_with(";base64") {
                return Err(StickerError::decode("data URI", "only base64 data URIs are supported"));
            }
            payload
        }
        None => trimmed,
    };
    BASE64
        .decode(encoded)
        .map_err(|e| StickerError::decode("data URI", e.to_string()))
}

/// One encoded sticker picture plus its preview.
#[derive(Clone, PartialEq, Eq)]
pub struct StickerImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    dimensions: Dimensions,
    preview: String,
}

impl std::fmt::Debug for StickerImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StickerImage")
            .field("format", &self.format)
            .field("dimensions", &self.dimensions)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl StickerImage {
    /// Encode RGBA pixels. JPEG output drops the alpha channel.
    ///
    /// # Errors
    ///
    /// `Encode` if the encoder rejects the pixels.
    pub fn encode(pixels: &RgbaImage, format: OutputFormat) -> StickerResult<Self> {
        let mut out = Cursor::new(Vec::new());
        let written = match format {
            OutputFormat::Jpeg => {
                DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(pixels.clone()).into_rgb8())
                    .write_to(&mut out, ImageFormat::Jpeg)
            }
            _ => pixels.write_to(&mut out, format.image_format()),
        };
        written.map_err(|e| {
            StickerError::encode(format!("{:?} image", format), e.to_string())
                .with_metadata("width", pixels.width().to_string())
                .with_metadata("height", pixels.height().to_string())
        })?;
        let bytes = out.into_inner();
        let format = format.image_format();
        Ok(Self {
            preview: data_uri(&bytes, format.to_mime_type()),
            dimensions: Dimensions {
                width: pixels.width(),
                height: pixels.height(),
            },
            format,
            bytes,
        })
    }

    /// Adopt encoded bytes produced elsewhere (backend, disk).
    ///
    /// The bytes are fully decoded once so a truncated or corrupt payload is
    /// rejected here instead of being attached to a sticker.
    pub fn from_bytes(bytes: Vec<u8>) -> StickerResult<Self> {
        Self::adopt(bytes).map(|(image, _)| image)
    }

    /// [`from_bytes`](Self::from_bytes) that also returns the decoded RGBA8
    /// pixels, for callers that need both.
    pub fn decode_owned(bytes: Vec<u8>) -> StickerResult<(Self, RgbaImage)> {
        Self::adopt(bytes).map(|(image, decoded)| (image, decoded.into_rgba8()))
    }

    fn adopt(bytes: Vec<u8>) -> StickerResult<(Self, DynamicImage)> {
        let reader = reader_for(&bytes)?;
        let format = reader
            .format()
            .ok_or_else(|| StickerError::decode("image", "unrecognised image format"))?;
        let decoded = reader
            .decode()
            .map_err(|e| StickerError::decode("image", e.to_string()))?;
        let dimensions = Dimensions {
            width: decoded.width(),
            height: decoded.height(),
        };
        let image = Self {
            preview: data_uri(&bytes, format.to_mime_type()),
            dimensions,
            format,
            bytes,
        };
        Ok((image, decoded))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// File extension matching the encoded bytes.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// Renderable `data:` URI of the same bytes.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Decode back to RGBA pixels.
    pub fn to_rgba(&self) -> StickerResult<RgbaImage> {
        decode_rgba(&self.bytes)
    }
}
