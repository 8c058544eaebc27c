use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

/// Rendering a certificate can take a while on the generator side.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Generator answered with a non-success status.
    #[error("generator replied {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generator unreachable: {0}")]
    Transport(String),

    #[error("generator reply is not JSON: {0}")]
    Decode(String),
}

/// External service that turns a certificate payload into a document.
#[async_trait]
pub trait CertificateGenerator: Send + Sync {
    async fn generate(&self, payload: &Value) -> Result<Value, GeneratorError>;
}

pub struct HttpCertificateGenerator {
    url: String,
    client: reqwest::Client,
}

impl HttpCertificateGenerator {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CertificateGenerator for HttpCertificateGenerator {
    async fn generate(&self, payload: &Value) -> Result<Value, GeneratorError> {
        debug!("Forwarding certificate payload to {}", self.url);

        let response = self
            .client
            .post(&self.url)
            .timeout(GENERATE_TIMEOUT)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!("Generator request failed: {}", e);
                GeneratorError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Generator replied {}: {}", status, body);
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GeneratorError::Decode(e.to_string()))
    }
}
