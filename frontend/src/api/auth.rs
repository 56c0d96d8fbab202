use reqwest::Method;

use super::{
    client::{parse_json, ApiClient},
    errors::extract_detail,
    types::{ApiError, CredentialAttempt, LoginResponse},
};
use crate::state::session::{Authenticator, Session};

const LOGIN_FAILED: &str = "Invalid username or password";

impl Authenticator for ApiClient {
    async fn authenticate(&self, attempt: &CredentialAttempt) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint("auth/login").await;
        let request = self.http_client().request(Method::POST, &url).json(attempt);
        let response = self.send(request).await?;

        let status = response.status();
        if status.is_success() {
            return parse_json(response).await;
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| extract_detail(&value));
        Err(ApiError::auth_rejected(detail.unwrap_or_else(|| LOGIN_FAILED.to_string()))
            .with_status(status.as_u16()))
    }
}

impl ApiClient {
    /// Logs in through this client's identity endpoint, falling back to the
    /// demo accounts when it fails.
    pub async fn login(&self, attempt: CredentialAttempt) -> Result<Session, ApiError> {
        self.session().login(self, attempt).await
    }

    /// Ends the local session. The API keeps no server-side session state.
    pub fn logout(&self) {
        self.session().logout();
    }

    /// `GET {base}/ping`, true when the API answers.
    pub async fn ping(&self) -> bool {
        let url = self.endpoint("ping").await;
        match self.send(self.http_client().get(&url)).await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                log::debug!("API ping failed: {}", err);
                false
            }
        }
    }
}
