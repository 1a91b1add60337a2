use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::types::{CodeFile, Project, SessionStatus};
use crate::store::{ProgressUpdate, StoreError, StoreResult};

/// Identity the client acts on behalf of, handed to it explicitly.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self { token: Some(token) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Status and body of a completed request.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Turn a non-2xx response into an error.
    pub fn error_for_status(self) -> StoreResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(StoreError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    auth: AuthContext,
    #[cfg(feature = "network")]
    http: reqwest::blocking::Client,
}

impl ApiClient {
    #[cfg(feature = "network")]
    pub fn new(base_url: &str, auth: AuthContext, timeout: Duration) -> StoreResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            http,
        })
    }

    #[cfg(not(feature = "network"))]
    pub fn new(base_url: &str, auth: AuthContext, _timeout: Duration) -> StoreResult<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    #[cfg(feature = "network")]
    pub fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&ProgressUpdate>,
    ) -> StoreResult<ApiResponse> {
        let url = self.url(path);
        let mut request = match method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        }
        .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(auth) = self.auth.authorization() {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        debug!(?method, %url, status, "api request");
        Ok(ApiResponse { status, body })
    }

    #[cfg(not(feature = "network"))]
    pub fn send(
        &self,
        method: Method,
        path: &str,
        _body: Option<&ProgressUpdate>,
    ) -> StoreResult<ApiResponse> {
        debug!(?method, path, "network disabled, request not sent");
        Err(StoreError::Disabled)
    }

    pub fn fetch_code(&self, id: &str) -> StoreResult<CodeFile> {
        let mut code: CodeFile = self
            .send(Method::Get, &format!("code/{id}"), None)?
            .error_for_status()?
            .json()?;
        if code.id.is_empty() {
            code.id = id.to_string();
        }
        Ok(code)
    }

    pub fn fetch_project(&self, id: &str) -> StoreResult<Project> {
        let mut project: Project = self
            .send(Method::Get, &format!("projects/{id}"), None)?
            .error_for_status()?
            .json()?;
        if project.id.is_empty() {
            project.id = id.to_string();
        }
        Ok(project)
    }

    /// A rejected session (401) is a normal answer, not an error.
    pub fn check_session(&self) -> StoreResult<SessionStatus> {
        let response = self.send(Method::Get, "auth/session", None)?;
        if response.status == 401 {
            return Ok(SessionStatus::default());
        }
        response.error_for_status()?.json()
    }
}

/// Where practice content comes from. The app only needs these two reads.
pub trait ContentSource: Send + Sync {
    fn fetch_code(&self, id: &str) -> StoreResult<CodeFile>;
    fn fetch_project(&self, id: &str) -> StoreResult<Project>;
}

impl ContentSource for ApiClient {
    fn fetch_code(&self, id: &str) -> StoreResult<CodeFile> {
        ApiClient::fetch_code(self, id)
    }

    fn fetch_project(&self, id: &str) -> StoreResult<Project> {
        ApiClient::fetch_project(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(
            "http://localhost:8080/",
            AuthContext::bearer("tok"),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_url_joins_version_root() {
        let c = client();
        assert_eq!(c.url("code/1/progress"), "http://localhost:8080/api/v1/code/1/progress");
        assert_eq!(c.url("/projects/2"), "http://localhost:8080/api/v1/projects/2");
    }

    #[test]
    fn test_bearer_header() {
        assert_eq!(client().auth().authorization().as_deref(), Some("Bearer tok"));
        assert!(AuthContext::anonymous().authorization().is_none());
        assert!(!AuthContext::bearer("  ").is_authenticated());
    }

    #[test]
    fn test_error_for_status() {
        let ok = ApiResponse {
            status: 201,
            body: "{}".to_string(),
        };
        assert!(ok.error_for_status().is_ok());

        let missing = ApiResponse {
            status: 404,
            body: "nope".to_string(),
        };
        assert!(missing.is_not_found());
        match missing.error_for_status() {
            Err(StoreError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "nope");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
