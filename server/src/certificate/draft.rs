use chrono::{Months, NaiveDate};
use shared::types::{CertificateFields, FieldErrors, fields};

use crate::certificate::geo::{GeoError, GeoPoint, parse_manual, parse_map_url};
use crate::certificate::metadata::{ImageMetadata, ImageUpload, UploadError};

/// Months added to today for the pre-filled expiry date.
pub const DEFAULT_VALIDITY_MONTHS: u32 = 12;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const GPS_LATITUDE_REQUIRED: &str = "Breitengrad erforderlich, da das Bild keine GPS-Daten enthält";
const GPS_LONGITUDE_REQUIRED: &str = "Längengrad erforderlich, da das Bild keine GPS-Daten enthält";
const GPS_MAP_URL_HINT: &str = "Alternativ einen Google-Maps-Link einfügen";

/// Where the certificate's coordinates came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationSource {
    Exif(GeoPoint),
    Manual(GeoPoint),
    MapUrl(GeoPoint),
}

impl LocationSource {
    pub fn point(&self) -> GeoPoint {
        match *self {
            Self::Exif(p) | Self::Manual(p) | Self::MapUrl(p) => p,
        }
    }
}

/// Certificate form as filled in, before validation.
#[derive(Debug, Clone)]
pub struct CertificateDraft {
    pub owner: String,
    pub occasion: String,
    /// `YYYY-MM-DD`
    pub expiry_date: String,
    pub tree_id: String,
    pub photographer: String,
    pub image: Option<ImageUpload>,
    /// Metadata read from `image`; `None` when it had none or was unreadable.
    pub metadata: Option<ImageMetadata>,
    pub latitude: String,
    pub longitude: String,
    pub map_url: String,
}

/// A draft that passed validation.
#[derive(Debug, Clone)]
pub struct ValidDraft {
    pub fields: CertificateFields,
    pub image: ImageUpload,
    pub metadata: Option<ImageMetadata>,
    pub location: LocationSource,
}

pub fn default_expiry(today: NaiveDate) -> NaiveDate {
    // Clamps to the month's last day, so Feb 29 becomes Feb 28.
    today
        .checked_add_months(Months::new(DEFAULT_VALIDITY_MONTHS))
        .unwrap_or(today)
}

fn required(errors: &mut FieldErrors, field: &str, value: &str, message: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, message);
    }
    value.to_string()
}

impl CertificateDraft {
    /// Empty draft with the expiry pre-filled.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            owner: String::new(),
            occasion: String::new(),
            expiry_date: default_expiry(today).format(DATE_FORMAT).to_string(),
            tree_id: String::new(),
            photographer: String::new(),
            image: None,
            metadata: None,
            latitude: String::new(),
            longitude: String::new(),
            map_url: String::new(),
        }
    }

    /// Coordinates for the certificate: EXIF first, then both manual values,
    /// then the map link. Failures of the latter two are recorded on their
    /// fields.
    fn resolve_location(&self, errors: &mut FieldErrors) -> Option<LocationSource> {
        if let Some(point) = self.metadata.as_ref().and_then(ImageMetadata::location) {
            return Some(LocationSource::Exif(point));
        }

        let (lat, lng) = (self.latitude.trim(), self.longitude.trim());
        if !lat.is_empty() && !lng.is_empty() {
            match parse_manual(lat, lng) {
                Ok(point) => return Some(LocationSource::Manual(point)),
                Err(GeoError::LongitudeOutOfRange(_)) => {
                    errors.add(fields::LONGITUDE, "Ungültiger Längengrad");
                }
                Err(GeoError::NotANumber(raw)) if raw == lng && raw != lat => {
                    errors.add(fields::LONGITUDE, "Ungültiger Längengrad");
                }
                Err(_) => {
                    errors.add(fields::LATITUDE, "Ungültiger Breitengrad");
                }
            }
        }

        if !self.map_url.trim().is_empty() {
            match parse_map_url(&self.map_url) {
                Ok(point) => return Some(LocationSource::MapUrl(point)),
                Err(e) => errors.add(fields::MAP_URL, e.user_message()),
            }
        }

        errors.add(fields::LATITUDE, GPS_LATITUDE_REQUIRED);
        errors.add(fields::LONGITUDE, GPS_LONGITUDE_REQUIRED);
        errors.add(fields::MAP_URL, GPS_MAP_URL_HINT);
        None
    }

    pub fn validate(&self) -> Result<ValidDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let owner = required(&mut errors, fields::OWNER, &self.owner, "Inhaber*in ist erforderlich");
        let occasion = required(&mut errors, fields::OCCASION, &self.occasion, "Anlass ist erforderlich");
        let expiry_date = required(
            &mut errors,
            fields::EXPIRY_DATE,
            &self.expiry_date,
            "Ablaufdatum ist erforderlich",
        );
        if !expiry_date.is_empty() && NaiveDate::parse_from_str(&expiry_date, DATE_FORMAT).is_err() {
            errors.add(fields::EXPIRY_DATE, "Ungültiges Datum");
        }
        let tree_id = required(&mut errors, fields::TREE_ID, &self.tree_id, "Baum-ID ist erforderlich");
        let photographer = required(
            &mut errors,
            fields::PHOTOGRAPHER,
            &self.photographer,
            "Fotograf*in ist erforderlich",
        );

        // The GPS rule only applies once there is a usable image.
        let image = match &self.image {
            None => {
                errors.add(fields::TREE_IMAGE, UploadError::Missing.user_message());
                None
            }
            Some(image) => match image.validate() {
                Ok(()) => Some(image.clone()),
                Err(e) => {
                    errors.add(fields::TREE_IMAGE, e.user_message());
                    None
                }
            },
        };
        let location = image.as_ref().and_then(|_| self.resolve_location(&mut errors));

        match (image, location) {
            (Some(image), Some(location)) if errors.is_empty() => Ok(ValidDraft {
                fields: CertificateFields {
                    owner,
                    occasion,
                    expiry_date,
                    tree_id,
                    photographer,
                },
                image,
                metadata: self.metadata.clone(),
                location,
            }),
            _ => Err(errors),
        }
    }
}
