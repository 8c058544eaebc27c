//! Coordinates: EXIF degree/minute/second conversion, map URLs in both
//! directions, and manually typed values.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use url::Url;

const MAPS_BASE: &str = "https://www.google.com/maps";

static AT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?),").expect("static map url regex")
});

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("latitude {0} outside -90..=90")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside -180..=180")]
    LongitudeOutOfRange(f64),

    #[error("not a number: {0:?}")]
    NotANumber(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum MapUrlError {
    #[error("map link is empty")]
    Empty,

    #[error("no coordinates found in map link")]
    NoCoordinates,

    #[error(transparent)]
    Invalid(#[from] GeoError),
}

impl MapUrlError {
    pub fn user_message(&self) -> &'static str {
        "Koordinaten konnten nicht aus dem Link gelesen werden"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// EXIF `GPSLatitudeRef` / `GPSLongitudeRef` value.
    pub fn from_ref(value: &str) -> Option<Self> {
        match value.trim().chars().next()?.to_ascii_uppercase() {
            'N' => Some(Self::North),
            'S' => Some(Self::South),
            'E' => Some(Self::East),
            'W' => Some(Self::West),
            _ => None,
        }
    }

    fn sign(self) -> f64 {
        match self {
            Self::North | Self::East => 1.0,
            Self::South | Self::West => -1.0,
        }
    }
}

/// Degrees, minutes, seconds as stored in EXIF (three rationals).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dms {
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl Dms {
    pub fn to_decimal(self, hemisphere: Hemisphere) -> f64 {
        hemisphere.sign() * (self.degrees + self.minutes / 60.0 + self.seconds / 3600.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Canonical map link; [`parse_map_url`] reads it back exactly.
    pub fn maps_url(&self) -> String {
        format!("{}?q={},{}", MAPS_BASE, self.latitude, self.longitude)
    }
}

/// Parse a typed coordinate. Accepts a decimal comma.
pub fn parse_coordinate(raw: &str) -> Result<f64, GeoError> {
    let cleaned = raw.trim().replace(',', ".");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| GeoError::NotANumber(raw.trim().to_string()))
}

pub fn parse_manual(latitude: &str, longitude: &str) -> Result<GeoPoint, GeoError> {
    GeoPoint::new(parse_coordinate(latitude)?, parse_coordinate(longitude)?)
}

/// Extract coordinates from a map link. Understands a `q=<lat>,<lng>` query
/// parameter and the `@<lat>,<lng>,<zoom>` path form.
pub fn parse_map_url(input: &str) -> Result<GeoPoint, MapUrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(MapUrlError::Empty);
    }

    if let Ok(url) = Url::parse(input) {
        let query = url
            .query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned());
        if let Some((lat, lng)) = query.as_deref().and_then(|q| q.split_once(',')) {
            if let (Ok(lat), Ok(lng)) = (lat.trim().parse::<f64>(), lng.trim().parse::<f64>()) {
                return Ok(GeoPoint::new(lat, lng)?);
            }
        }
    }

    let caps = AT_PATTERN
        .captures(input)
        .ok_or(MapUrlError::NoCoordinates)?;
    let lat = caps[1].parse::<f64>().map_err(|_| MapUrlError::NoCoordinates)?;
    let lng = caps[2].parse::<f64>().map_err(|_| MapUrlError::NoCoordinates)?;
    Ok(GeoPoint::new(lat, lng)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dms_converts_with_sign() {
        let dms = Dms {
            degrees: 51.0,
            minutes: 30.0,
            seconds: 36.0,
        };
        assert!((dms.to_decimal(Hemisphere::North) - 51.51).abs() < 1e-9);
        assert!((dms.to_decimal(Hemisphere::South) + 51.51).abs() < 1e-9);
    }

    #[test]
    fn hemisphere_refs() {
        assert_eq!(Hemisphere::from_ref("N"), Some(Hemisphere::North));
        assert_eq!(Hemisphere::from_ref("w"), Some(Hemisphere::West));
        assert_eq!(Hemisphere::from_ref(""), None);
        assert_eq!(Hemisphere::from_ref("X"), None);
    }

    #[test]
    fn query_form_is_parsed() {
        let p = parse_map_url("https://www.google.com/maps?q=51.5136,7.4653").unwrap();
        assert_eq!(p, GeoPoint::new(51.5136, 7.4653).unwrap());
    }

    #[test]
    fn at_form_is_parsed() {
        let p = parse_map_url("https://www.google.com/maps/place/Dortmund/@51.5136,-7.4653,15z").unwrap();
        assert_eq!(p, GeoPoint::new(51.5136, -7.4653).unwrap());
    }

    #[test]
    fn links_without_coordinates_fail() {
        assert_eq!(parse_map_url("   "), Err(MapUrlError::Empty));
        assert_eq!(
            parse_map_url("https://www.google.com/maps/place/Dortmund"),
            Err(MapUrlError::NoCoordinates)
        );
        assert!(matches!(
            parse_map_url("https://www.google.com/maps?q=95.0,7.0"),
            Err(MapUrlError::Invalid(GeoError::LatitudeOutOfRange(_)))
        ));
    }

    #[test]
    fn manual_values_accept_decimal_comma() {
        let p = parse_manual("51,5136", " 7.4653 ").unwrap();
        assert_eq!(p.latitude, 51.5136);
        assert!(matches!(parse_manual("abc", "7"), Err(GeoError::NotANumber(_))));
        assert!(matches!(parse_manual("10", "181"), Err(GeoError::LongitudeOutOfRange(_))));
    }

    proptest! {
        #[test]
        fn maps_url_round_trips(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
            let point = GeoPoint::new(lat, lng).unwrap();
            prop_assert_eq!(parse_map_url(&point.maps_url()).unwrap(), point);
        }

        #[test]
        fn southern_and_western_refs_are_negative(d in 0.0f64..90.0, m in 0.0f64..60.0, s in 0.0f64..60.0) {
            let dms = Dms { degrees: d, minutes: m, seconds: s };
            prop_assert!(dms.to_decimal(Hemisphere::South) <= 0.0);
            prop_assert!(dms.to_decimal(Hemisphere::West) <= 0.0);
            prop_assert_eq!(dms.to_decimal(Hemisphere::North), -dms.to_decimal(Hemisphere::South));
        }
    }
}
