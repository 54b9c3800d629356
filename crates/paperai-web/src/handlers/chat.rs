//! Questions about the analyzed paper.
//!
//! A send is split in two state updates around the backend call so the
//! view lock is never held across the network: [`DashboardState::begin_chat`]
//! appends the user turn and the typing placeholder, and
//! [`DashboardState::finish_chat`] swaps the placeholder for the answer.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::CookieJar;
use paperai_client::PaperApi;
use paperai_common::{AuthToken, ChatOutcome, ChatTurn};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::handlers::dashboard::require_token;
use crate::state::SharedState;
use crate::views::{ChatTicket, ViewId, ViewStore};

#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

/// Runs one send against the given view. Returns false when nothing was
/// sent (blank message, no analysis) or when the reply arrived for an
/// analysis that has since been replaced or logged out.
pub async fn send_message(
    api: &dyn PaperApi,
    views: &ViewStore,
    view: ViewId,
    token: &AuthToken,
    message: &str,
) -> bool {
    let Some(ticket) = views.update(view, |s| s.begin_chat(message)).await else {
        debug!("Chat send ignored");
        return false;
    };

    let outcome = ask(api, token, &ticket).await;
    let applied = views
        .update_existing(view, |s| s.finish_chat(ticket, outcome))
        .await
        .unwrap_or(false);
    if !applied {
        debug!("Dropped chat reply for a replaced or discarded view");
    }
    applied
}

async fn ask(api: &dyn PaperApi, token: &AuthToken, ticket: &ChatTicket) -> ChatOutcome {
    let result = api.chat(token, ticket.session_id(), ticket.message()).await;
    match &result {
        Ok(_) => info!(session_id = %ticket.session_id(), "Chat answered"),
        Err(e) => warn!(session_id = %ticket.session_id(), error = %e, "Chat failed"),
    }
    result.into()
}

pub async fn chat_submit(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> Response {
    let token = match require_token(&state, &jar) {
        Ok(token) => token,
        Err(redirect) => return redirect,
    };
    let (view, jar) = ViewId::resolve(jar, &state.config.session);
    send_message(state.api.as_ref(), &state.views, view, &token, &form.message).await;
    (jar, Redirect::to("/dashboard#chat")).into_response()
}

#[derive(Debug, Serialize)]
pub struct TranscriptBody {
    pub turns: Vec<ChatTurn>,
    pub waiting: bool,
}

/// Current transcript as JSON, polled by the page while a reply is pending.
pub async fn transcript(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if require_token(&state, &jar).is_err() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let (view, jar) = ViewId::resolve(jar, &state.config.session);
    let body = match state.views.peek(view).await {
        Some(s) => TranscriptBody { turns: s.transcript.turns().to_vec(), waiting: s.transcript.is_waiting() },
        None => TranscriptBody { turns: Vec::new(), waiting: false },
    };
    (jar, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperai_common::chat::{FALLBACK_REPLY, GREETING, TYPING_TEXT};
    use paperai_config::SessionConfig;
    use paperai_test_utils::{sample_analysis, Call, Reply, ScriptedApi};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    async fn analyzed_view(views: &ViewStore) -> ViewId {
        let (view, _) = ViewId::resolve(CookieJar::new(), &SessionConfig::default());
        views.update(view, |s| s.apply_upload("paper.pdf", Ok(sample_analysis("s1", 0)))).await;
        view
    }

    async fn turns(views: &ViewStore, view: ViewId) -> Vec<ChatTurn> {
        views.peek(view).await.unwrap().transcript.turns().to_vec()
    }

    #[tokio::test]
    async fn test_answer_appended_after_question() {
        let api = ScriptedApi::new().chat_reply(Reply::Ok("It shows X".into()));
        let views = ViewStore::new();
        let view = analyzed_view(&views).await;

        assert!(send_message(&api, &views, view, &AuthToken::new("abc"), "What is Figure 2?").await);
        assert_eq!(
            turns(&views, view).await,
            vec![ChatTurn::ai(GREETING), ChatTurn::user("What is Figure 2?"), ChatTurn::ai("It shows X")]
        );
        assert_eq!(
            api.calls(),
            vec![Call::Chat {
                token: "abc".into(),
                session_id: "s1".into(),
                message: "What is Figure 2?".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_failure_becomes_fallback_turn() {
        let api = ScriptedApi::new().chat_reply(Reply::Rejected { status: 500, message: None });
        let views = ViewStore::new();
        let view = analyzed_view(&views).await;

        send_message(&api, &views, view, &AuthToken::new("abc"), "hello").await;
        assert_eq!(turns(&views, view).await.last(), Some(&ChatTurn::ai(FALLBACK_REPLY)));
    }

    #[tokio::test]
    async fn test_each_send_resolves_independently() {
        let api = ScriptedApi::new().chat_reply(Reply::Ok("first answer".into()));
        let views = ViewStore::new();
        let view = analyzed_view(&views).await;
        let token = AuthToken::new("abc");

        send_message(&api, &views, view, &token, "one").await;
        api.set_chat_reply(Reply::Malformed("no answer field".into()));
        send_message(&api, &views, view, &token, "two").await;

        assert_eq!(
            turns(&views, view).await,
            vec![
                ChatTurn::ai(GREETING),
                ChatTurn::user("one"),
                ChatTurn::ai("first answer"),
                ChatTurn::user("two"),
                ChatTurn::ai(FALLBACK_REPLY),
            ]
        );
    }

    #[tokio::test]
    async fn test_reply_after_logout_is_dropped() {
        let api = Arc::new(ScriptedApi::new().gated_chat());
        let views = Arc::new(ViewStore::new());
        let view = analyzed_view(&views).await;

        let task = {
            let (api, views) = (api.clone(), views.clone());
            tokio::spawn(async move {
                send_message(api.as_ref(), &views, view, &AuthToken::new("abc"), "hi").await
            })
        };
        while api.call_count() == 0 {
            tokio::task::yield_now().await;
        }

        views.discard(view).await;
        views.update(view, |s| s.apply_upload("next.pdf", Ok(sample_analysis("s2", 0)))).await;
        api.release_chat();

        assert!(!task.await.unwrap());
        assert_eq!(turns(&views, view).await, vec![ChatTurn::ai(GREETING)]);
    }

    #[tokio::test]
    async fn test_blank_message_is_not_sent() {
        let api = ScriptedApi::new();
        let views = ViewStore::new();
        let view = analyzed_view(&views).await;

        assert!(!send_message(&api, &views, view, &AuthToken::new("abc"), "   ").await);
        assert_eq!(api.call_count(), 0);
        assert_eq!(turns(&views, view).await, vec![ChatTurn::ai(GREETING)]);
    }

    #[tokio::test]
    async fn test_placeholder_visible_while_waiting() {
        let api = Arc::new(ScriptedApi::new().gated_chat());
        let views = Arc::new(ViewStore::new());
        let view = analyzed_view(&views).await;

        let task = {
            let (api, views) = (api.clone(), views.clone());
            tokio::spawn(async move {
                send_message(api.as_ref(), &views, view, &AuthToken::new("abc"), "hi").await
            })
        };

        while api.call_count() == 0 {
            tokio::task::yield_now().await;
        }
        let pending = turns(&views, view).await;
        assert_eq!(pending.last().map(|t| (t.text.as_str(), t.typing)), Some((TYPING_TEXT, true)));

        api.release_chat();
        assert!(task.await.unwrap());
        let done = turns(&views, view).await;
        assert_eq!(done.last(), Some(&ChatTurn::ai("answer")));
        assert!(done.iter().all(|t| !t.typing));
    }
}
