//! Dashboard page and the upload form.

use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use paperai_client::{ApiResult, Document, PaperApi};
use paperai_common::{AnalysisResult, AuthToken, EditMode};
use tracing::{info, warn};

use crate::error::WebError;
use crate::session::{CookieSession, SessionStore};
use crate::state::SharedState;
use crate::views::ViewId;

/// Token of the current browser, or the redirect to send instead.
pub(crate) fn require_token(state: &SharedState, jar: &CookieJar) -> Result<AuthToken, Response> {
    CookieSession::new(jar.clone(), &state.config.session)
        .token()
        .ok_or_else(|| Redirect::to("/login").into_response())
}

pub async fn dashboard(State(state): State<SharedState>, jar: CookieJar) -> Result<Response, WebError> {
    if let Err(redirect) = require_token(&state, &jar) {
        return Ok(redirect);
    }
    let (view, jar) = ViewId::resolve(jar, &state.config.session);
    let snapshot = state.views.take_for_render(view).await;
    let html = state.templates.dashboard_page(&state.dashboard_page(), &snapshot)?;
    Ok((jar, Html(html)).into_response())
}

/// Fields of the upload form.
pub struct UploadForm {
    pub document: Option<Document>,
    pub edit_mode: Option<String>,
}

impl UploadForm {
    /// Reads `file` and `edit_mode`. A file part without a file name means
    /// nothing was picked.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self, MultipartError> {
        let mut form = UploadForm { document: None, edit_mode: None };

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("file") => {
                    let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    if file_name.trim().is_empty() {
                        continue;
                    }
                    let mut document = Document::new(file_name, bytes.to_vec());
                    if let Some(ct) = content_type {
                        document = document.with_content_type(ct);
                    }
                    form.document = Some(document);
                }
                Some("edit_mode") => {
                    let mode = field.text().await?;
                    if !mode.trim().is_empty() {
                        form.edit_mode = Some(mode.trim().to_string());
                    }
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

/// What an upload attempt produced: the submitted file name and the
/// backend's answer. `None` when no file was picked.
pub type UploadAttempt = Option<(String, ApiResult<AnalysisResult>)>;

/// Sends the picked document, if any. The form's edit mode wins over the
/// configured default.
pub async fn run_upload(
    api: &dyn PaperApi,
    token: &AuthToken,
    form: UploadForm,
    default_mode: EditMode,
) -> UploadAttempt {
    let document = form.document?;
    let mode = form.edit_mode.map(EditMode::new).unwrap_or(default_mode);
    let file_name = document.file_name.clone();

    let result = api.upload(token, document, &mode).await;
    match &result {
        Ok(analysis) => info!(
            file = %file_name,
            session_id = %analysis.session_id,
            corrections = analysis.corrections.len(),
            figures = analysis.figures.len(),
            "Document analyzed"
        ),
        Err(e) => warn!(file = %file_name, error = %e, "Upload failed"),
    }
    Some((file_name, result))
}

pub async fn upload(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let token = match require_token(&state, &jar) {
        Ok(token) => token,
        Err(redirect) => return redirect,
    };
    let (view, jar) = ViewId::resolve(jar, &state.config.session);
    let form = match UploadForm::from_multipart(&mut multipart).await {
        Ok(form) => form,
        Err(e) => {
            warn!(status = e.status().as_u16(), error = %e, "Unreadable upload");
            let reason = unreadable_upload_reason(&e, state.config.upload.max_bytes);
            state.views.update(view, |s| s.fail_upload(&reason)).await;
            return (jar, Redirect::to("/dashboard")).into_response();
        }
    };

    if let Some((file_name, result)) = run_upload(state.api.as_ref(), &token, form, state.edit_mode()).await {
        state.views.update(view, |s| s.apply_upload(&file_name, result)).await;
    }
    (jar, Redirect::to("/dashboard")).into_response()
}

/// Why a request body could not be read as an upload form.
fn unreadable_upload_reason(error: &MultipartError, max_bytes: usize) -> String {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large_message(max_bytes)
    } else {
        error.body_text()
    }
}

fn too_large_message(max_bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if max_bytes >= MIB {
        format!("File is larger than {} MB.", max_bytes / MIB)
    } else {
        format!("File is larger than {max_bytes} bytes.")
    }
}
