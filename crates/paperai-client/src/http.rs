//! reqwest implementation of [`PaperApi`].

use async_trait::async_trait;
use paperai_common::{AnalysisResult, AuthToken, Credentials, EditMode, Registration};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::{Document, PaperApi};
use crate::error::{parse_error_message, ApiError, ApiResult};

pub struct HttpPaperApi {
    base_url: String,
    client: Client,
}

impl HttpPaperApi {
    /// `timeout` of `None` keeps reqwest's default (no overall timeout).
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    session_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct LoginReply {
    token: Option<String>,
}

#[derive(Deserialize)]
struct ChatReply {
    answer: String,
}

/// Maps non-2xx responses to [`ApiError::Rejected`], returning the body of
/// successful ones.
async fn check_response_status(resp: Response) -> ApiResult<String> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let message = parse_error_message(&body);
        warn!(status = status.as_u16(), message = message.as_deref().unwrap_or(""), "Backend rejected request");
        return Err(ApiError::Rejected { status: status.as_u16(), message });
    }
    Ok(body)
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(format!("{what}: {e}")))
}

#[async_trait]
impl PaperApi for HttpPaperApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthToken> {
        debug!(email = %credentials.email, "POST /api/login");
        let resp = self.client
            .post(self.url("/api/login"))
            .json(&LoginBody { email: &credentials.email, password: credentials.password() })
            .send()
            .await?;
        let body = check_response_status(resp).await?;
        let reply: LoginReply = decode(&body, "login response")?;

        match reply.token {
            Some(token) if !token.trim().is_empty() => Ok(AuthToken::new(token)),
            _ => Err(ApiError::Decode("login response did not include a token".to_string())),
        }
    }

    async fn signup(&self, registration: &Registration) -> ApiResult<()> {
        debug!(email = %registration.email, "POST /api/signup");
        let resp = self.client
            .post(self.url("/api/signup"))
            .json(&SignupBody {
                email: &registration.email,
                first_name: &registration.first_name,
                last_name: &registration.last_name,
                password: registration.password(),
            })
            .send()
            .await?;
        check_response_status(resp).await?;
        Ok(())
    }

    async fn upload(
        &self,
        token: &AuthToken,
        document: Document,
        mode: &EditMode,
    ) -> ApiResult<AnalysisResult> {
        debug!(file = %document.file_name, bytes = document.bytes.len(), mode = %mode, "POST /api/upload");
        let mime = document.mime().to_string();
        let part = reqwest::multipart::Part::bytes(document.bytes)
            .file_name(document.file_name)
            .mime_str(&mime)?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("edit_mode", mode.as_str().to_string());

        let resp = self.client
            .post(self.url("/api/upload"))
            .bearer_auth(token.expose())
            .multipart(form)
            .send()
            .await?;
        let body = check_response_status(resp).await?;
        decode(&body, "analysis result")
    }

    async fn chat(&self, token: &AuthToken, session_id: &str, message: &str) -> ApiResult<String> {
        debug!(session_id, "POST /api/chat");
        let resp = self.client
            .post(self.url("/api/chat"))
            .bearer_auth(token.expose())
            .json(&ChatBody { session_id, message })
            .send()
            .await?;
        let body = check_response_status(resp).await?;
        let reply: ChatReply = decode(&body, "chat response")?;
        Ok(reply.answer)
    }
}
