//! HTTP implementation of [`ComplianceApi`]

use crate::api::ComplianceApi;
use crate::config::ClientConfig;
use crate::error::{parse_error_body, RemoteError, RemoteResult};
use crate::payload::ApplicationPayload;
use async_trait::async_trait;
use rca_schema::{Application, Comment, NewComment, PrincipalInvestigator, ResearchActivity, StaffMember};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use urlencoding::encode;

/// REST client for the compliance backend
#[derive(Debug, Clone)]
pub struct HttpComplianceClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpComplianceClient {
    /// Build a client from settings.
    ///
    /// # Errors
    /// [`RemoteError::Config`] for an empty or non-HTTP base URL;
    /// [`RemoteError::Transport`] if the TLS backend cannot initialise.
    pub fn new(config: &ClientConfig) -> RemoteResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RemoteError::Config(format!(
                "base URL must be http(s): '{}'",
                config.base_url
            )));
        }
        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            base_url,
            token: config.api_token.clone(),
        })
    }

    /// Base URL requests are resolved against
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> RemoteResult<T> {
        tracing::debug!(path, "GET");
        let response = self.request(Method::GET, path).send().await?;
        Self::handle_response(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> RemoteResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(%method, path, "sending");
        let response = self.request(method, path).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = parse_error_body(&body);
        tracing::error!(status = status.as_u16(), message = message.as_deref().unwrap_or(""), "request failed");
        Err(RemoteError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ComplianceApi for HttpComplianceClient {
    async fn get_application(&self, id: &str) -> RemoteResult<Application> {
        self.get_json(&format!("/applications/{}", encode(id))).await
    }

    async fn list_principal_investigators(&self) -> RemoteResult<Vec<PrincipalInvestigator>> {
        self.get_json("/principal-investigators").await
    }

    async fn list_research_activities(
        &self,
        principal_investigator_id: Option<String>,
    ) -> RemoteResult<Vec<ResearchActivity>> {
        let path = match principal_investigator_id {
            Some(pi) => format!("/research-activities?principalInvestigatorId={}", encode(&pi)),
            None => "/research-activities".to_string(),
        };
        self.get_json(&path).await
    }

    async fn list_activity_staff(&self, activity_id: &str) -> RemoteResult<Vec<StaffMember>> {
        self.get_json(&format!("/research-activities/{}/staff", encode(activity_id)))
            .await
    }

    async fn list_comments(&self, application_id: &str) -> RemoteResult<Vec<Comment>> {
        self.get_json(&format!("/applications/{}/comments", encode(application_id)))
            .await
    }

    async fn patch_application(&self, id: &str, payload: ApplicationPayload) -> RemoteResult<Application> {
        self.send_json(Method::PATCH, &format!("/applications/{}", encode(id)), &payload)
            .await
    }

    async fn post_comment(&self, application_id: &str, comment: NewComment) -> RemoteResult<Comment> {
        self.send_json(
            Method::POST,
            &format!("/applications/{}/comments", encode(application_id)),
            &comment,
        )
        .await
    }

    async fn create_application(&self, payload: ApplicationPayload) -> RemoteResult<Application> {
        self.send_json(Method::POST, "/applications", &payload).await
    }
}
