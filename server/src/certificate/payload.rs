use shared::types::{CertificatePayload, ImageDescriptor, LocationBlock};

use crate::certificate::draft::ValidDraft;

/// Assemble the generator payload from a validated draft, the re-encoded
/// image and the location block.
pub fn build_payload(
    draft: &ValidDraft,
    image_data_url: String,
    location: Option<LocationBlock>,
) -> CertificatePayload {
    CertificatePayload {
        certificate: draft.fields.clone(),
        image: ImageDescriptor {
            name: draft.image.name.clone(),
            size: draft.image.bytes.len() as u64,
            mime_type: draft.image.mime_type.clone(),
            base64: image_data_url,
        },
        location,
        metadata: draft.metadata.as_ref().map(|m| m.to_block()),
    }
}
