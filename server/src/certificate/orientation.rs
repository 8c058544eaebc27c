use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use thiserror::Error;
use tracing::debug;

pub const JPEG_QUALITY: u8 = 92;

/// Camera orientation as recorded in EXIF. Only the variants the upload
/// pipeline corrects are distinguished; transposed forms count as normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90Cw,
    Rotate180,
    Rotate270Cw,
    FlipHorizontal,
    FlipVertical,
}

#[derive(Debug, Error)]
pub enum ReencodeError {
    #[error("could not decode image: {0}")]
    Decode(image::ImageError),

    #[error("could not encode JPEG: {0}")]
    Encode(image::ImageError),

    #[error("re-encoding task failed: {0}")]
    Task(String),
}

impl Orientation {
    /// Numeric EXIF `Orientation` value (1..=8).
    pub fn from_exif(value: u32) -> Self {
        match value {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            6 => Self::Rotate90Cw,
            8 => Self::Rotate270Cw,
            _ => Self::Normal,
        }
    }

    /// Textual tag as printed by EXIF tools ("Rotate 90 CW", ...).
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        match tag.as_str() {
            "rotate 90 cw" => Self::Rotate90Cw,
            "rotate 180" => Self::Rotate180,
            "rotate 270 cw" => Self::Rotate270Cw,
            "flip horizontal" | "mirror horizontal" => Self::FlipHorizontal,
            "flip vertical" | "mirror vertical" => Self::FlipVertical,
            _ => Self::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Horizontal (normal)",
            Self::Rotate90Cw => "Rotate 90 CW",
            Self::Rotate180 => "Rotate 180",
            Self::Rotate270Cw => "Rotate 270 CW",
            Self::FlipHorizontal => "Flip horizontal",
            Self::FlipVertical => "Flip vertical",
        }
    }

    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Rotate90Cw | Self::Rotate270Cw)
    }

    /// Turn a stored image upright. Quarter turns rotate about the centre so
    /// the result fills the swapped canvas exactly.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::Rotate90Cw => img.rotate90(),
            Self::Rotate180 => img.rotate180(),
            Self::Rotate270Cw => img.rotate270(),
            Self::FlipHorizontal => img.fliph(),
            Self::FlipVertical => img.flipv(),
        }
    }
}

/// Decode, straighten and re-encode as JPEG. The output carries no metadata.
/// Returns a `data:image/jpeg;base64,` URL.
pub fn reencode_upright(
    bytes: &[u8],
    orientation: Option<Orientation>,
) -> Result<String, ReencodeError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ReencodeError::Decode(image::ImageError::IoError(e)))?
        .decode()
        .map_err(ReencodeError::Decode)?;

    let orientation = orientation.unwrap_or_default();
    let upright = orientation.apply(img);
    debug!(
        "Re-encoding {}x{} image ({})",
        upright.width(),
        upright.height(),
        orientation.label()
    );

    let rgb = upright.to_rgb8();
    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .map_err(ReencodeError::Encode)?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&out)))
}

/// [`reencode_upright`] on the blocking pool.
pub async fn reencode_upright_blocking(
    bytes: Bytes,
    orientation: Option<Orientation>,
) -> Result<String, ReencodeError> {
    tokio::task::spawn_blocking(move || reencode_upright(&bytes, orientation))
        .await
        .map_err(|e| ReencodeError::Task(e.to_string()))?
}
