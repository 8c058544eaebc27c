use std::io::Cursor;

use bytes::Bytes;
use exif::{Exif, In, Tag, Value};
use image::ImageReader;
use shared::types::{CameraInfo, Dimensions, GpsDecimal, MetadataBlock};
use thiserror::Error;
use tracing::debug;

use crate::certificate::geo::{Dms, GeoError, GeoPoint, Hemisphere};
use crate::certificate::orientation::Orientation;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("no image uploaded")]
    Missing,

    #[error("unsupported image type {0:?}")]
    UnsupportedType(String),

    #[error("image is {0} bytes, limit is {MAX_UPLOAD_BYTES}")]
    TooLarge(usize),
}

impl UploadError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Missing => "Baumbild ist erforderlich",
            Self::UnsupportedType(_) => "Nur JPG, PNG oder WEBP erlaubt",
            Self::TooLarge(_) => "Das Bild darf maximal 10 MB groß sein",
        }
    }
}

/// The tree photo as uploaded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::Missing);
        }
        if !ACCEPTED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(UploadError::UnsupportedType(self.mime_type.clone()));
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge(self.bytes.len()));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("unreadable EXIF block: {0}")]
    Exif(#[from] exif::Error),
}

/// Raw GPS tag values before conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsTag {
    pub latitude: Dms,
    pub latitude_ref: Hemisphere,
    pub longitude: Dms,
    pub longitude_ref: Hemisphere,
}

impl GpsTag {
    pub fn to_point(&self) -> Result<GeoPoint, GeoError> {
        GeoPoint::new(
            self.latitude.to_decimal(self.latitude_ref),
            self.longitude.to_decimal(self.longitude_ref),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    /// EXIF `DateTimeOriginal` as written by the camera.
    pub capture_time: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub orientation: Option<Orientation>,
    pub gps: Option<GpsTag>,
}

impl ImageMetadata {
    /// GPS position when present and in range.
    pub fn location(&self) -> Option<GeoPoint> {
        self.gps.as_ref().and_then(|g| g.to_point().ok())
    }

    pub fn to_block(&self) -> MetadataBlock {
        let camera = (self.make.is_some() || self.model.is_some()).then(|| CameraInfo {
            make: self.make.clone(),
            model: self.model.clone(),
        });
        let dimensions = match (self.width, self.height) {
            (Some(width), Some(height)) => Some(Dimensions { width, height }),
            _ => None,
        };
        MetadataBlock {
            capture_time: self.capture_time.clone(),
            camera,
            dimensions,
            gps: self.location().map(|p| GpsDecimal {
                latitude: p.latitude,
                longitude: p.longitude,
            }),
        }
    }
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|b| String::from_utf8_lossy(b).trim_end_matches('\0').trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn dms(exif: &Exif, tag: Tag) -> Option<Dms> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(v) if v.len() >= 3 => Some(Dms {
            degrees: v[0].to_f64(),
            minutes: v[1].to_f64(),
            seconds: v[2].to_f64(),
        }),
        _ => None,
    }
}

fn uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn gps(exif: &Exif) -> Option<GpsTag> {
    Some(GpsTag {
        latitude: dms(exif, Tag::GPSLatitude)?,
        latitude_ref: Hemisphere::from_ref(&ascii(exif, Tag::GPSLatitudeRef)?)?,
        longitude: dms(exif, Tag::GPSLongitude)?,
        longitude_ref: Hemisphere::from_ref(&ascii(exif, Tag::GPSLongitudeRef)?)?,
    })
}

fn pixel_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Read camera, capture time, orientation and GPS from an upload.
/// `Ok(None)` when the file carries no EXIF block at all.
pub fn extract_metadata(bytes: &[u8]) -> Result<Option<ImageMetadata>, MetadataError> {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => {
            debug!("Upload has no EXIF block");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let (width, height) = match (
        uint(&exif, Tag::PixelXDimension),
        uint(&exif, Tag::PixelYDimension),
    ) {
        (Some(w), Some(h)) => (Some(w), Some(h)),
        _ => pixel_dimensions(bytes).unzip(),
    };

    let metadata = ImageMetadata {
        make: ascii(&exif, Tag::Make),
        model: ascii(&exif, Tag::Model),
        capture_time: ascii(&exif, Tag::DateTimeOriginal).or_else(|| ascii(&exif, Tag::DateTime)),
        width,
        height,
        orientation: uint(&exif, Tag::Orientation).map(Orientation::from_exif),
        gps: gps(&exif),
    };
    debug!(
        "EXIF: camera {:?} {:?}, gps {}",
        metadata.make,
        metadata.model,
        metadata.gps.is_some()
    );
    Ok(Some(metadata))
}
