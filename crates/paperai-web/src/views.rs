//! Per-browser dashboard state kept on the server between page requests.
//!
//! Each browser carries an opaque view id cookie; the id keys a
//! [`DashboardState`] holding the current analysis result, the chat
//! transcript and a one-shot notice. Nothing here survives a restart.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use paperai_client::ApiResult;
use paperai_common::{AnalysisResult, ChatOutcome, PendingSend, Transcript};
use paperai_config::SessionConfig;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Views untouched for this long are dropped when a new view is created.
const IDLE_VIEW_TTL_HOURS: i64 = 12;

/// Process-wide, so a discarded and recreated view never reuses one.
static NEXT_EPOCH: AtomicU64 = AtomicU64::new(1);

fn next_epoch() -> u64 {
    NEXT_EPOCH.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(Uuid);

impl ViewId {
    /// Reads the view id cookie, minting (and setting) a new one if absent
    /// or unparsable.
    pub fn resolve(jar: CookieJar, config: &SessionConfig) -> (Self, CookieJar) {
        let existing = jar
            .get(&config.view_cookie_name)
            .and_then(|c| Uuid::parse_str(c.value()).ok());

        match existing {
            Some(id) => (Self(id), jar),
            None => {
                let id = Uuid::new_v4();
                let cookie = Cookie::build((config.view_cookie_name.clone(), id.to_string()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .secure(config.secure_cookies)
                    .build();
                (Self(id), jar.add(cookie))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
    Success,
}

/// Banner shown once on the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, text: text.into() }
    }
}

/// An outstanding chat send, tied to the analysis it was asked about.
#[derive(Debug)]
pub struct ChatTicket {
    epoch: u64,
    session_id: String,
    pending: PendingSend,
}

impl ChatTicket {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn message(&self) -> &str {
        self.pending.message()
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub analysis: Option<AnalysisResult>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub file_name: Option<String>,
    pub transcript: Transcript,
    pub notice: Option<Notice>,
    /// Replaced with a fresh process-wide value whenever the analysis is
    /// replaced, so late chat replies for a previous paper are discarded.
    epoch: u64,
    touched_at: DateTime<Utc>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            analysis: None,
            analyzed_at: None,
            file_name: None,
            transcript: Transcript::new(),
            notice: None,
            epoch: next_epoch(),
            touched_at: Utc::now(),
        }
    }
}

impl DashboardState {
    /// Success replaces the analysis and seeds the greeting; failure resets
    /// to the initial state and leaves an error notice.
    pub fn apply_upload(&mut self, file_name: &str, result: ApiResult<AnalysisResult>) {
        self.epoch = next_epoch();
        match result {
            Ok(analysis) => {
                self.analysis = Some(analysis);
                self.analyzed_at = Some(Utc::now());
                self.file_name = Some(file_name.to_string());
                self.transcript = Transcript::seeded();
                self.notice = None;
            }
            Err(e) => self.fail_upload(&e.describe()),
        }
    }

    /// Back to the initial state, with `Upload failed: <reason>` shown once.
    pub fn fail_upload(&mut self, reason: &str) {
        self.epoch = next_epoch();
        self.analysis = None;
        self.analyzed_at = None;
        self.file_name = None;
        self.transcript = Transcript::new();
        self.notice = Some(Notice::error(format!("Upload failed: {reason}")));
    }

    /// `None` when the message is blank or there is no paper to talk about.
    pub fn begin_chat(&mut self, raw: &str) -> Option<ChatTicket> {
        let session_id = self.analysis.as_ref()?.chat_session()?.to_string();
        let pending = self.transcript.begin_send(raw)?;
        Some(ChatTicket { epoch: self.epoch, session_id, pending })
    }

    /// Returns false when the ticket belongs to an analysis that has since
    /// been replaced; its reply is dropped.
    pub fn finish_chat(&mut self, ticket: ChatTicket, outcome: ChatOutcome) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        self.transcript.resolve(ticket.pending, outcome);
        true
    }

    pub fn can_chat(&self) -> bool {
        self.analysis.as_ref().and_then(|a| a.chat_session()).is_some()
    }
}

#[derive(Default)]
pub struct ViewStore {
    views: RwLock<HashMap<ViewId, DashboardState>>,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` against the view's state, creating it on first use.
    pub async fn update<R>(&self, id: ViewId, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        let mut views = self.views.write().await;
        if !views.contains_key(&id) {
            prune_idle(&mut views);
        }
        let state = views.entry(id).or_default();
        state.touched_at = Utc::now();
        f(state)
    }

    /// Like [`ViewStore::update`], but a missing view stays missing.
    pub async fn update_existing<R>(&self, id: ViewId, f: impl FnOnce(&mut DashboardState) -> R) -> Option<R> {
        let mut views = self.views.write().await;
        let state = views.get_mut(&id)?;
        state.touched_at = Utc::now();
        Some(f(state))
    }

    /// Copy of the state for rendering. The notice is handed out once.
    pub async fn take_for_render(&self, id: ViewId) -> DashboardState {
        self.update(id, |state| {
            let snapshot = state.clone();
            state.notice = None;
            snapshot
        })
        .await
    }

    /// Read-only copy; does not consume the notice.
    pub async fn peek(&self, id: ViewId) -> Option<DashboardState> {
        self.views.read().await.get(&id).cloned()
    }

    pub async fn discard(&self, id: ViewId) {
        if self.views.write().await.remove(&id).is_some() {
            debug!("Discarded dashboard view state");
        }
    }

    pub async fn len(&self) -> usize {
        self.views.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn prune_idle(views: &mut HashMap<ViewId, DashboardState>) {
    let cutoff = Utc::now() - Duration::hours(IDLE_VIEW_TTL_HOURS);
    let before = views.len();
    views.retain(|_, state| state.touched_at >= cutoff);
    let pruned = before - views.len();
    if pruned > 0 {
        debug!(pruned, "Pruned idle dashboard views");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperai_client::ApiError;
    use paperai_common::chat::{FALLBACK_REPLY, GREETING};
    use paperai_common::ChatTurn;
    use pretty_assertions::assert_eq;

    fn analysis(session_id: &str) -> AnalysisResult {
        AnalysisResult {
            session_id: session_id.to_string(),
            original_text: "x".into(),
            corrected_text: "x".into(),
            corrections: vec![],
            figures: vec![],
        }
    }

    #[test]
    fn test_view_id_minted_once() {
        let config = SessionConfig::default();
        let (first, jar) = ViewId::resolve(CookieJar::new(), &config);
        let (second, _) = ViewId::resolve(jar, &config);
        assert_eq!(first, second);
    }

    #[test]
    fn test_garbage_view_cookie_is_replaced() {
        let config = SessionConfig::default();
        let jar = CookieJar::new().add(Cookie::new("paperai_view", "not-a-uuid"));
        let (id, jar) = ViewId::resolve(jar, &config);
        assert_eq!(jar.get("paperai_view").unwrap().value(), id.0.to_string());
    }

    #[test]
    fn test_successful_upload_seeds_greeting() {
        let mut state = DashboardState::default();
        state.apply_upload("paper.pdf", Ok(analysis("s1")));
        assert_eq!(state.transcript.turns(), &[ChatTurn::ai(GREETING)]);
        assert!(state.can_chat());
        assert_eq!(state.file_name.as_deref(), Some("paper.pdf"));
    }

    #[test]
    fn test_failed_upload_resets_to_initial_state() {
        let mut state = DashboardState::default();
        state.apply_upload("a.pdf", Ok(analysis("s1")));
        state.apply_upload(
            "b.pdf",
            Err(ApiError::Rejected { status: 413, message: Some("File too large".into()) }),
        );
        assert!(state.analysis.is_none());
        assert!(state.transcript.turns().is_empty());
        assert_eq!(state.notice, Some(Notice::error("Upload failed: File too large")));
    }

    #[test]
    fn test_chat_requires_session() {
        let mut state = DashboardState::default();
        assert!(state.begin_chat("hello").is_none());
        state.apply_upload("a.pdf", Ok(analysis("")));
        assert!(state.begin_chat("hello").is_none());
        assert_eq!(state.transcript.turns().len(), 1);
    }

    #[test]
    fn test_chat_round_trip() {
        let mut state = DashboardState::default();
        state.apply_upload("a.pdf", Ok(analysis("s1")));
        let ticket = state.begin_chat("What is Figure 2?").unwrap();
        assert_eq!(ticket.session_id(), "s1");
        assert_eq!(state.transcript.turns().len(), 3);

        assert!(state.finish_chat(ticket, ChatOutcome::Failed));
        assert_eq!(state.transcript.turns().last(), Some(&ChatTurn::ai(FALLBACK_REPLY)));
        assert_eq!(state.transcript.turns().len(), 3);
    }

    #[test]
    fn test_reply_for_replaced_analysis_is_dropped() {
        let mut state = DashboardState::default();
        state.apply_upload("a.pdf", Ok(analysis("s1")));
        let ticket = state.begin_chat("hello").unwrap();
        state.apply_upload("b.pdf", Ok(analysis("s2")));

        assert!(!state.finish_chat(ticket, ChatOutcome::Answered("late".into())));
        assert_eq!(state.transcript.turns(), &[ChatTurn::ai(GREETING)]);
    }

    #[tokio::test]
    async fn test_reply_after_discard_and_reupload_is_dropped() {
        let store = ViewStore::new();
        let (id, _) = ViewId::resolve(CookieJar::new(), &SessionConfig::default());
        store.update(id, |s| s.apply_upload("a.pdf", Ok(analysis("s1")))).await;
        let ticket = store.update(id, |s| s.begin_chat("hello")).await.unwrap();

        store.discard(id).await;
        store.update(id, |s| s.apply_upload("b.pdf", Ok(analysis("s2")))).await;

        let applied = store.update_existing(id, |s| s.finish_chat(ticket, ChatOutcome::Answered("stale".into()))).await;
        assert_eq!(applied, Some(false));
        let state = store.peek(id).await.unwrap();
        assert_eq!(state.transcript.turns(), &[ChatTurn::ai(GREETING)]);
        assert!(!state.transcript.is_waiting());
    }

    #[tokio::test]
    async fn test_update_existing_does_not_recreate_view() {
        let store = ViewStore::new();
        let (id, _) = ViewId::resolve(CookieJar::new(), &SessionConfig::default());
        store.update(id, |s| s.apply_upload("a.pdf", Ok(analysis("s1")))).await;
        let ticket = store.update(id, |s| s.begin_chat("hello")).await.unwrap();
        store.discard(id).await;

        let applied = store.update_existing(id, |s| s.finish_chat(ticket, ChatOutcome::Failed)).await;
        assert_eq!(applied, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_notice_is_shown_once() {
        let store = ViewStore::new();
        let (id, _) = ViewId::resolve(CookieJar::new(), &SessionConfig::default());
        store.update(id, |s| s.notice = Some(Notice::error("boom"))).await;

        assert!(store.take_for_render(id).await.notice.is_some());
        assert!(store.take_for_render(id).await.notice.is_none());
    }

    #[tokio::test]
    async fn test_discard_forgets_view() {
        let store = ViewStore::new();
        let (id, _) = ViewId::resolve(CookieJar::new(), &SessionConfig::default());
        store.update(id, |s| s.apply_upload("a.pdf", Ok(analysis("s1")))).await;
        assert_eq!(store.len().await, 1);
        store.discard(id).await;
        assert!(store.is_empty().await);
        assert!(store.peek(id).await.is_none());
    }
}
