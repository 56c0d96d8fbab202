use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, Method, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;

use crate::{
    api::{
        errors::{self, ErrorContext},
        types::ApiError,
    },
    config,
    state::session::SessionManager,
};

/// HTTP gateway to the dashboard API. Cheap to clone; clones share the
/// underlying connection pool and session.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Option<String>,
    session: SessionManager,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(SessionManager::default())
    }
}

impl ApiClient {
    pub fn new(session: SessionManager) -> Self {
        Self {
            client: Client::new(),
            base_url: None,
            session,
        }
    }

    pub fn new_with_base_url(base_url: impl Into<String>, session: SessionManager) -> Self {
        Self {
            client: Client::new(),
            base_url: Some(config::normalize_base_url(&base_url.into())),
            session,
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub(crate) async fn resolved_base_url(&self) -> String {
        if let Some(base) = &self.base_url {
            base.clone()
        } else {
            config::await_api_base_url().await
        }
    }

    pub(crate) async fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.resolved_base_url().await, path.trim_start_matches('/'))
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.client
    }

    fn get_auth_headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = self.session.token() {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| ApiError::unknown("Invalid token format"))?,
            );
        }
        Ok(headers)
    }

    /// Request builder with the bearer credential attached when logged in.
    pub(crate) fn authorized(&self, method: Method, url: &str) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .http_client()
            .request(method, url)
            .headers(self.get_auth_headers()?))
    }

    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let request = request
            .build()
            .map_err(|e| ApiError::request_failed(format!("Invalid request: {}", e)))?;
        log::debug!("{} {}", request.method(), request.url());
        self.dispatch(request).await
    }

    #[cfg(not(all(test, not(target_arch = "wasm32"))))]
    async fn dispatch(&self, request: reqwest::Request) -> Result<Response, ApiError> {
        self.client
            .execute(request)
            .await
            .map_err(|e| ApiError::request_failed(format!("Request failed: {}", e)))
    }

    #[cfg(all(test, not(target_arch = "wasm32")))]
    async fn dispatch(&self, request: reqwest::Request) -> Result<Response, ApiError> {
        if let Some(responder) = mock_registry::lookup(request.url().as_str()) {
            return responder.respond(&request)?.into_response();
        }
        self.client
            .execute(request)
            .await
            .map_err(|e| ApiError::request_failed(format!("Request failed: {}", e)))
    }

    /// Sends the request and turns any non-success status into a mapped
    /// error. 401/403 also go through [`SessionManager::check_error`].
    pub(crate) async fn send_checked(
        &self,
        ctx: &ErrorContext<'_>,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = self.send(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = errors::map_status(ctx, code, &body);
        // The mapped error is what screens see; check_error only ends the session.
        let _ = self.session.check_error(code);
        log::warn!(
            "{} {:?} failed ({}): {}",
            ctx.resource,
            ctx.operation,
            code,
            error
        );
        Err(error)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &ErrorContext<'_>,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path).await;
        let mut request = self.authorized(Method::GET, &url)?;
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.send_checked(ctx, request).await?;
        parse_json(response).await
    }
}

pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json()
        .await
        .map_err(|e| ApiError::unknown(format!("Failed to parse response: {}", e)))
}

/// Body as JSON, or `None` when the server sent nothing.
pub(crate) async fn parse_optional_json(
    response: Response,
) -> Result<Option<serde_json::Value>, ApiError> {
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::unknown(format!("Failed to read response: {}", e)))?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| ApiError::unknown(format!("Failed to parse response: {}", e)))
}

#[cfg(all(test, not(target_arch = "wasm32")))]
pub use mock_registry::{register_mock, MockResponse, TestResponder};
