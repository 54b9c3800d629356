//! Login, signup and logout.
//!
//! The submit logic lives in [`submit_login`] / [`submit_signup`], which
//! reduce a form plus a backend result to an [`AuthOutcome`]. The axum
//! handlers only translate that outcome into a redirect or a re-rendered
//! form.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use paperai_client::PaperApi;
use paperai_common::{LoginForm, SignupForm};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::WebError;
use crate::render::SignupEcho;
use crate::session::{CookieSession, SessionStore};
use crate::state::SharedState;
use crate::views::{Notice, ViewId};

pub const LOGIN_FAILED: &str = "Login failed.";
pub const SIGNUP_FAILED: &str = "Signup failed.";
pub const SIGNUP_SUCCEEDED: &str = "Signup successful! Please log in.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Failed(String),
}

/// Validates locally, then exchanges credentials for a token and stores it.
pub async fn submit_login(
    api: &dyn PaperApi,
    session: &mut impl SessionStore,
    form: LoginForm,
) -> AuthOutcome {
    let credentials = match form.validate() {
        Ok(c) => c,
        Err(e) => return AuthOutcome::Failed(e.to_string()),
    };

    match api.login(&credentials).await {
        Ok(token) => {
            session.set_token(&token);
            info!(email = %credentials.email, "Login succeeded");
            AuthOutcome::Success
        }
        Err(e) => {
            warn!(email = %credentials.email, error = %e, "Login failed");
            AuthOutcome::Failed(e.message_or(LOGIN_FAILED).to_string())
        }
    }
}

pub async fn submit_signup(api: &dyn PaperApi, form: SignupForm) -> AuthOutcome {
    let registration = match form.validate() {
        Ok(r) => r,
        Err(e) => return AuthOutcome::Failed(e.to_string()),
    };

    match api.signup(&registration).await {
        Ok(()) => {
            info!(email = %registration.email, "Signup succeeded");
            AuthOutcome::Success
        }
        Err(e) => {
            warn!(email = %registration.email, error = %e, "Signup failed");
            AuthOutcome::Failed(e.message_or(SIGNUP_FAILED).to_string())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    registered: Option<String>,
}

/// Also serves every unknown path.
pub async fn login_page(
    State(state): State<SharedState>,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, WebError> {
    let notice = query.registered.map(|_| Notice::success(SIGNUP_SUCCEEDED));
    Ok(Html(state.templates.login_page("", notice.as_ref())?))
}

pub async fn login_submit(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let email = form.email.clone();
    let mut session = CookieSession::new(jar, &state.config.session);

    match submit_login(state.api.as_ref(), &mut session, form).await {
        AuthOutcome::Success => Ok((session.into_jar(), Redirect::to("/dashboard")).into_response()),
        AuthOutcome::Failed(message) => {
            let html = state.templates.login_page(&email, Some(&Notice::error(message)))?;
            Ok(Html(html).into_response())
        }
    }
}

pub async fn signup_page(State(state): State<SharedState>) -> Result<Html<String>, WebError> {
    Ok(Html(state.templates.signup_page(&SignupEcho::default(), None)?))
}

pub async fn signup_submit(
    State(state): State<SharedState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, WebError> {
    let email = form.email.clone();
    let first_name = form.first_name.clone();
    let last_name = form.last_name.clone();

    match submit_signup(state.api.as_ref(), form).await {
        AuthOutcome::Success => Ok(Redirect::to("/login?registered=1").into_response()),
        AuthOutcome::Failed(message) => {
            let echo = SignupEcho { email: &email, first_name: &first_name, last_name: &last_name };
            let html = state.templates.signup_page(&echo, Some(&Notice::error(message)))?;
            Ok(Html(html).into_response())
        }
    }
}

/// Drops the token and this browser's dashboard state.
pub async fn logout(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    let (view, jar) = ViewId::resolve(jar, &state.config.session);
    state.views.discard(view).await;

    let mut session = CookieSession::new(jar, &state.config.session);
    session.clear_token();
    info!("Logged out");
    (session.into_jar(), Redirect::to("/login"))
}
