use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Certificate generation payload
// ---------------------------------------------------------------------------
//
// Body posted to the certificate generator. `location` and `metadata` are
// `null` when the upload carried no usable data for them.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePayload {
    pub certificate: CertificateFields,
    pub image: ImageDescriptor,
    pub location: Option<LocationBlock>,
    pub metadata: Option<MetadataBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateFields {
    pub owner: String,
    pub occasion: String,
    /// ISO date, `YYYY-MM-DD`.
    pub expiry_date: String,
    pub tree_id: String,
    pub photographer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDescriptor {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Upright, metadata-free JPEG as a `data:` URL.
    pub base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationBlock {
    pub maps_url: String,
    /// PNG scannable code as a `data:` URL.
    pub qr_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBlock {
    pub capture_time: Option<String>,
    pub camera: Option<CameraInfo>,
    pub dimensions: Option<Dimensions>,
    pub gps: Option<GpsDecimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub make: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsDecimal {
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Form field names and messages
// ---------------------------------------------------------------------------

pub mod fields {
    pub const OWNER: &str = "owner";
    pub const OCCASION: &str = "occasion";
    pub const EXPIRY_DATE: &str = "expiryDate";
    pub const TREE_ID: &str = "treeId";
    pub const PHOTOGRAPHER: &str = "photographer";
    pub const TREE_IMAGE: &str = "treeImage";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const MAP_URL: &str = "mapUrl";
}
