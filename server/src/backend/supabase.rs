use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::types::{NewAccount, UserRole};
use tracing::{debug, warn};

use crate::backend::{
    AuthBackend, BackendError, BackendErrorKind, BackendSession, BackendUser,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the hosted auth API (`/auth/v1`) and its REST tables
/// (`/rest/v1`).
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    roles: Option<RoleRef>,
}

#[derive(Debug, Deserialize)]
struct RoleRef {
    id: Value,
    name: String,
}

impl From<RoleRef> for UserRole {
    fn from(role: RoleRef) -> Self {
        let id = match role.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        UserRole {
            id,
            name: role.name,
        }
    }
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.anon_key)
    }
}

/// Map a non-success reply to an error, keeping the service's own message.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    let kind = if status.is_client_error() {
        BackendErrorKind::Rejected
    } else {
        BackendErrorKind::Unexpected
    };
    warn!("Auth service replied {}: {}", status, message);
    Err(BackendError::new(kind, message))
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<BackendSession, BackendError> {
        debug!("Password sign-in against {}", self.base_url);

        let response = self
            .post("/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let token: TokenResponse = check_status(response).await?.json().await.map_err(|e| {
            BackendError::new(BackendErrorKind::Unexpected, format!("bad token reply: {e}"))
        })?;

        Ok(BackendSession {
            access_token: token.access_token,
            user: BackendUser {
                id: token.user.id,
                email: token.user.email,
            },
        })
    }

    async fn user_roles(&self, session: &BackendSession) -> Result<Vec<UserRole>, BackendError> {
        let filter = format!("eq.{}", session.user.id);
        let response = self
            .client
            .get(self.url("/rest/v1/user_roles"))
            .timeout(REQUEST_TIMEOUT)
            .query(&[("select", "roles(id,name)"), ("user_id", filter.as_str())])
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        let rows: Vec<RoleRow> = check_status(response).await?.json().await.map_err(|e| {
            BackendError::new(BackendErrorKind::Unexpected, format!("bad roles reply: {e}"))
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.roles.map(UserRole::from))
            .collect())
    }

    async fn sign_up(&self, account: &NewAccount) -> Result<(), BackendError> {
        debug!("Creating account for {}", account.email);

        let response = self
            .post("/auth/v1/signup")
            .json(&json!({
                "email": account.email,
                "password": account.password,
                "data": account,
            }))
            .send()
            .await?;

        check_status(response).await.map(|_| ())
    }

    async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .post("/auth/v1/recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await?;

        check_status(response).await.map(|_| ())
    }
}
