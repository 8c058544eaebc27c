use serde_json::Value;
use shared::types::{FieldErrors, LocationBlock, fields};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::backend::{CertificateGenerator, GeneratorError};
use crate::certificate::draft::{CertificateDraft, LocationSource};
use crate::certificate::orientation::reencode_upright_blocking;
use crate::certificate::payload::build_payload;
use crate::certificate::qr::{QrError, render_qr_data_url};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("draft has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),

    #[error("could not render location code: {0}")]
    Qr(#[from] QrError),

    #[error("could not serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Map link and code image for a point.
pub fn location_block(source: &LocationSource) -> Result<LocationBlock, QrError> {
    let maps_url = source.point().maps_url();
    let qr_code = render_qr_data_url(&maps_url)?;
    Ok(LocationBlock { maps_url, qr_code })
}

/// Validate, assemble and submit a certificate. The generator is called
/// at most once, and never for an invalid draft.
pub async fn submit_certificate(
    draft: CertificateDraft,
    generator: &dyn CertificateGenerator,
) -> Result<Value, WorkflowError> {
    let valid = draft.validate().map_err(WorkflowError::Invalid)?;

    let location = location_block(&valid.location)?;

    let orientation = valid.metadata.as_ref().and_then(|m| m.orientation);
    let image = match reencode_upright_blocking(valid.image.bytes.clone(), orientation).await {
        Ok(image) => image,
        Err(e) => {
            warn!("Re-encoding {} failed: {}", valid.image.name, e);
            let mut errors = FieldErrors::new();
            errors.add(fields::TREE_IMAGE, "Bild konnte nicht verarbeitet werden");
            return Err(WorkflowError::Invalid(errors));
        }
    };

    let payload = build_payload(&valid, image, Some(location));
    let body = serde_json::to_value(&payload)?;

    match generator.generate(&body).await {
        Ok(reply) => {
            info!("Certificate for tree {} generated", valid.fields.tree_id);
            Ok(reply)
        }
        Err(e) => {
            error!("Certificate generation for tree {} failed: {}", valid.fields.tree_id, e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate::metadata::{ImageUpload, extract_metadata};
    use crate::test_support::{
        ExifSpec, GeneratorOutcome, MockGenerator, jpeg_with_exif, plain_jpeg,
    };
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use bytes::Bytes;
    use chrono::NaiveDate;
    use serde_json::json;

    fn draft_with(bytes: Vec<u8>) -> CertificateDraft {
        CertificateDraft {
            owner: "Anna Schmidt".into(),
            occasion: "Geburtstag".into(),
            tree_id: "B-0042".into(),
            photographer: "Jörg".into(),
            metadata: extract_metadata(&bytes).ok().flatten(),
            image: Some(ImageUpload {
                name: "baum.jpg".into(),
                mime_type: "image/jpeg".into(),
                bytes: Bytes::from(bytes),
            }),
            ..CertificateDraft::new(NaiveDate::from_ymd_opt(2024, 4, 24).unwrap())
        }
    }

    #[tokio::test]
    async fn full_draft_is_submitted_once() {
        let generator = MockGenerator::new(GeneratorOutcome::Reply(json!({ "id": 1 })));
        let draft = draft_with(jpeg_with_exif(8, 4, &ExifSpec::dortmund()));

        let reply = submit_certificate(draft, &generator).await.unwrap();
        assert_eq!(reply["id"], 1);

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        let payload = &calls[0];

        let maps_url = payload["location"]["mapsUrl"].as_str().unwrap();
        let point = crate::certificate::geo::parse_map_url(maps_url).unwrap();
        assert!((point.latitude - 51.51).abs() < 1e-9);
        assert!((point.longitude + 7.465).abs() < 1e-9);
        let qr = payload["location"]["qrCode"].as_str().unwrap();
        assert!(qr.len() > "data:image/png;base64,".len());

        assert_eq!(payload["metadata"]["camera"]["make"], "Canon");
        assert_eq!(payload["certificate"]["expiryDate"], "2025-04-24");

        // Orientation 6: the 8x4 upload is sent upright as 4x8.
        let b64 = payload["image"]["base64"].as_str().unwrap();
        let jpeg = STANDARD
            .decode(b64.strip_prefix("data:image/jpeg;base64,").unwrap())
            .unwrap();
        let img = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((img.width(), img.height()), (4, 8));
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_generator() {
        let generator = MockGenerator::new(GeneratorOutcome::Reply(json!({})));
        let draft = CertificateDraft::new(NaiveDate::from_ymd_opt(2024, 4, 24).unwrap());

        match submit_certificate(draft, &generator).await {
            Err(WorkflowError::Invalid(errors)) => assert_eq!(errors.len(), 5),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_location_blocks_submission() {
        let generator = MockGenerator::new(GeneratorOutcome::Reply(json!({})));
        let draft = draft_with(plain_jpeg(8, 8));

        match submit_certificate(draft, &generator).await {
            Err(WorkflowError::Invalid(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.contains(fields::MAP_URL));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn generator_failure_is_returned() {
        let generator = MockGenerator::new(GeneratorOutcome::Status(500, "boom"));
        let mut draft = draft_with(plain_jpeg(8, 8));
        draft.map_url = "https://www.google.com/maps?q=51.5,7.4".into();

        assert!(matches!(
            submit_certificate(draft, &generator).await,
            Err(WorkflowError::Generator(GeneratorError::Status { status: 500, .. }))
        ));
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_image_is_a_field_error() {
        let generator = MockGenerator::new(GeneratorOutcome::Reply(json!({})));
        let mut draft = draft_with(b"not really a jpeg".to_vec());
        draft.map_url = "https://www.google.com/maps?q=51.5,7.4".into();

        match submit_certificate(draft, &generator).await {
            Err(WorkflowError::Invalid(errors)) => {
                assert_eq!(errors.get(fields::TREE_IMAGE), Some("Bild konnte nicht verarbeitet werden"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(generator.calls().is_empty());
    }
}
