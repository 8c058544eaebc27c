//! Certificate creation: upload checks, EXIF reading, location and code
//! rendering, orientation fix-up, validation and submission.

pub mod draft;
pub mod geo;
pub mod metadata;
pub mod orientation;
pub mod payload;
pub mod qr;
pub mod workflow;

pub use draft::{CertificateDraft, LocationSource, ValidDraft};
pub use metadata::{ImageMetadata, ImageUpload, UploadError, extract_metadata};
pub use workflow::{WorkflowError, location_block, submit_certificate};
