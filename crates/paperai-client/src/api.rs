//! Backend trait. Views depend on this, never on reqwest directly.

use async_trait::async_trait;
use paperai_common::{AnalysisResult, AuthToken, Credentials, EditMode, Registration};

use crate::error::ApiResult;

/// A document picked for upload.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { file_name: file_name.into(), content_type: None, bytes: bytes.into() }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// MIME type sent with the multipart part.
    pub fn mime(&self) -> &str {
        match self.content_type.as_deref() {
            Some(ct) if !ct.is_empty() => ct,
            _ => guess_mime(&self.file_name),
        }
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[async_trait]
pub trait PaperApi: Send + Sync {
    /// `POST /api/login`
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthToken>;

    /// `POST /api/signup`
    async fn signup(&self, registration: &Registration) -> ApiResult<()>;

    /// `POST /api/upload`, bearer-authenticated multipart.
    async fn upload(
        &self,
        token: &AuthToken,
        document: Document,
        mode: &EditMode,
    ) -> ApiResult<AnalysisResult>;

    /// `POST /api/chat`, bearer-authenticated. Returns the answer text.
    async fn chat(&self, token: &AuthToken, session_id: &str, message: &str) -> ApiResult<String>;
}
