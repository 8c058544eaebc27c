use std::convert::Infallible;

use anyhow::{Result, anyhow};
use bytes::Bytes;
use chrono::{Local, NaiveDate};
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use shared::types::fields;
use tracing::{error, info};

use crate::AppState;
use crate::certificate::{CertificateDraft, WorkflowError, submit_certificate};
use crate::handlers::http::certificate::{read_metadata, read_upload_form, take_tree_image};
use crate::handlers::http::utils::{
    MultipartForm, deliver_error_json, deliver_serialized_json, deliver_validation_errors,
};

/// `POST /zertifikate/erstellen`
pub async fn handle_create_certificate<B>(
    req: Request<B>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    info!("Processing certificate submission");

    let form = match read_upload_form(req, &state).await? {
        Ok(form) => form,
        Err(rejection) => return Ok(rejection),
    };

    let draft = draft_from_form(form, Local::now().date_naive());
    create_certificate(draft, &state).await
}

/// Fill a draft from the submitted form. A missing expiry field keeps the
/// one-year default; a submitted empty one is left empty and fails validation.
pub fn draft_from_form(mut form: MultipartForm, today: NaiveDate) -> CertificateDraft {
    let image = take_tree_image(&mut form);
    let metadata = image.as_ref().and_then(read_metadata);
    let defaults = CertificateDraft::new(today);

    CertificateDraft {
        owner: form.text(fields::OWNER).to_string(),
        occasion: form.text(fields::OCCASION).to_string(),
        expiry_date: form
            .get(fields::EXPIRY_DATE)
            .map(str::to_string)
            .unwrap_or(defaults.expiry_date),
        tree_id: form.text(fields::TREE_ID).to_string(),
        photographer: form.text(fields::PHOTOGRAPHER).to_string(),
        image,
        metadata,
        latitude: form.text(fields::LATITUDE).to_string(),
        longitude: form.text(fields::LONGITUDE).to_string(),
        map_url: form.text(fields::MAP_URL).to_string(),
    }
}

pub async fn create_certificate(
    draft: CertificateDraft,
    state: &AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    match submit_certificate(draft, state.generator.as_ref()).await {
        Ok(reply) => deliver_serialized_json(&reply, StatusCode::OK),
        Err(WorkflowError::Invalid(errors)) => deliver_validation_errors(errors),
        Err(WorkflowError::Generator(e)) => {
            error!("Certificate generator failed: {}", e);
            deliver_error_json(
                "GENERATOR_FAILED",
                "Das Zertifikat konnte nicht erstellt werden",
                StatusCode::BAD_GATEWAY,
            )
        }
        Err(e) => Err(anyhow!(e).context("Certificate workflow failed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        ExifSpec, GeneratorOutcome, MockAuth, MockGenerator, body_json, jpeg_with_exif,
        multipart_request, plain_jpeg, test_config, test_state, test_state_with,
    };
    use serde_json::json;
    use shared::types::Environment;
    use std::sync::Arc;

    const TEXT_FIELDS: [(&str, &str); 5] = [
        ("owner", "Anna Schmidt"),
        ("occasion", "Geburtstag"),
        ("expiryDate", "2030-01-01"),
        ("treeId", "B-0042"),
        ("photographer", "Jörg"),
    ];

    fn state(generator: Arc<MockGenerator>) -> AppState {
        test_state(Arc::new(MockAuth::default()), generator)
    }

    #[tokio::test]
    async fn complete_upload_is_forwarded() {
        let generator = Arc::new(MockGenerator::new(GeneratorOutcome::Reply(
            json!({ "pdf": "https://files.example/1.pdf" }),
        )));
        let jpeg = jpeg_with_exif(8, 4, &ExifSpec::dortmund());
        let req = multipart_request(
            "/zertifikate/erstellen",
            &TEXT_FIELDS,
            Some(("treeImage", "baum.jpg", "image/jpeg", jpeg.as_slice())),
        );

        let res = handle_create_certificate(req, state(generator.clone())).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["pdf"], "https://files.example/1.pdf");

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["certificate"]["owner"], "Anna Schmidt");
        assert_eq!(calls[0]["image"]["name"], "baum.jpg");
        assert!(calls[0]["location"]["qrCode"].is_string());
    }

    #[tokio::test]
    async fn missing_fields_come_back_as_422() {
        let generator = Arc::new(MockGenerator::new(GeneratorOutcome::Reply(json!({}))));
        let req = multipart_request("/zertifikate/erstellen", &[("owner", "Anna")], None);

        let res = handle_create_certificate(req, state(generator.clone())).await.unwrap();

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(res).await;
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["errors"]["treeImage"], "Baumbild ist erforderlich");
        assert!(body["errors"]["treeId"].is_string());
        assert!(body["errors"].get("owner").is_none());
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn photo_without_gps_needs_a_location() {
        let generator = Arc::new(MockGenerator::new(GeneratorOutcome::Reply(json!({}))));
        let jpeg = plain_jpeg(8, 8);
        let req = multipart_request(
            "/zertifikate/erstellen",
            &TEXT_FIELDS,
            Some(("treeImage", "baum.jpg", "image/jpeg", jpeg.as_slice())),
        );

        let res = handle_create_certificate(req, state(generator.clone())).await.unwrap();

        let body = body_json(res).await;
        for field in ["latitude", "longitude", "mapUrl"] {
            assert!(body["errors"][field].is_string(), "missing {field}");
        }
        assert!(generator.calls().is_empty());
    }

    #[tokio::test]
    async fn generator_failure_is_bad_gateway() {
        let generator = Arc::new(MockGenerator::new(GeneratorOutcome::Unreachable));
        let jpeg = plain_jpeg(8, 8);
        let mut fields = TEXT_FIELDS.to_vec();
        fields.push(("mapUrl", "https://www.google.com/maps/@51.5,7.4,15z"));
        let req = multipart_request(
            "/zertifikate/erstellen",
            &fields,
            Some(("treeImage", "baum.jpg", "image/jpeg", jpeg.as_slice())),
        );

        let res = handle_create_certificate(req, state(generator.clone())).await.unwrap();

        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(generator.calls().len(), 1);
    }

    #[tokio::test]
    async fn oversized_upload_is_refused() {
        let mut config = test_config("web", Environment::Development);
        config.server.max_body_bytes = 1024;
        let state = test_state_with(
            config,
            Arc::new(MockAuth::default()),
            Arc::new(MockGenerator::new(GeneratorOutcome::Reply(json!({})))),
        );
        let big = vec![0u8; 4096];
        let req = multipart_request(
            "/zertifikate/erstellen",
            &TEXT_FIELDS,
            Some(("treeImage", "baum.jpg", "image/jpeg", big.as_slice())),
        );

        let res = handle_create_certificate(req, state).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn absent_expiry_uses_default() {
        let form = crate::handlers::http::utils::parse_multipart(
            Some("multipart/form-data; boundary=B"),
            Bytes::from_static(b"--B\r\nContent-Disposition: form-data; name=\"owner\"\r\n\r\nAnna\r\n--B--\r\n"),
        )
        .await
        .unwrap();

        let draft = draft_from_form(form, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(draft.owner, "Anna");
        assert_eq!(draft.expiry_date, "2025-02-28");
    }
}
