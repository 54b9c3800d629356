//! Shared testing utilities: a scripted [`PaperApi`] that records every call
//! and answers with canned replies, plus analysis-result fixtures.

use async_trait::async_trait;
use paperai_client::{ApiError, ApiResult, Document, PaperApi};
use paperai_common::{
    AnalysisResult, AuthToken, Correction, Credentials, EditMode, Figure, Registration,
};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { email: String },
    Signup { email: String, first_name: String, last_name: String },
    Upload { token: String, file_name: String, edit_mode: String, bytes: usize },
    Chat { token: String, session_id: String, message: String },
}

/// Canned reply. `ApiError` itself is not `Clone`, so errors are rebuilt on
/// every call.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Rejected { status: u16, message: Option<String> },
    Malformed(String),
}

impl<T: Clone> Reply<T> {
    fn produce(&self) -> ApiResult<T> {
        match self {
            Reply::Ok(v) => Ok(v.clone()),
            Reply::Rejected { status, message } => {
                Err(ApiError::Rejected { status: *status, message: message.clone() })
            }
            Reply::Malformed(detail) => Err(ApiError::Decode(detail.clone())),
        }
    }
}

struct Script {
    login: Reply<String>,
    signup: Reply<()>,
    upload: Reply<AnalysisResult>,
    chat: Reply<String>,
}

pub struct ScriptedApi {
    script: Mutex<Script>,
    calls: Mutex<Vec<Call>>,
    chat_gate: Option<Arc<Notify>>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedApi {
    /// Every endpoint succeeds: token `test-token`, [`sample_analysis`] with
    /// two corrections, answer `answer`.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                login: Reply::Ok("test-token".to_string()),
                signup: Reply::Ok(()),
                upload: Reply::Ok(sample_analysis("s1", 2)),
                chat: Reply::Ok("answer".to_string()),
            }),
            calls: Mutex::new(Vec::new()),
            chat_gate: None,
        }
    }

    pub fn login_reply(self, reply: Reply<String>) -> Self {
        self.script.lock().unwrap().login = reply;
        self
    }

    pub fn signup_reply(self, reply: Reply<()>) -> Self {
        self.script.lock().unwrap().signup = reply;
        self
    }

    pub fn upload_reply(self, reply: Reply<AnalysisResult>) -> Self {
        self.script.lock().unwrap().upload = reply;
        self
    }

    pub fn chat_reply(self, reply: Reply<String>) -> Self {
        self.script.lock().unwrap().chat = reply;
        self
    }

    /// Chat calls block until [`ScriptedApi::release_chat`] is called once
    /// per call.
    pub fn gated_chat(mut self) -> Self {
        self.chat_gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release_chat(&self) {
        if let Some(gate) = &self.chat_gate {
            gate.notify_one();
        }
    }

    pub fn set_chat_reply(&self, reply: Reply<String>) {
        self.script.lock().unwrap().chat = reply;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PaperApi for ScriptedApi {
    async fn login(&self, credentials: &Credentials) -> ApiResult<AuthToken> {
        self.record(Call::Login { email: credentials.email.clone() });
        let reply = self.script.lock().unwrap().login.clone();
        reply.produce().map(AuthToken::new)
    }

    async fn signup(&self, registration: &Registration) -> ApiResult<()> {
        self.record(Call::Signup {
            email: registration.email.clone(),
            first_name: registration.first_name.clone(),
            last_name: registration.last_name.clone(),
        });
        let reply = self.script.lock().unwrap().signup.clone();
        reply.produce()
    }

    async fn upload(
        &self,
        token: &AuthToken,
        document: Document,
        mode: &EditMode,
    ) -> ApiResult<AnalysisResult> {
        self.record(Call::Upload {
            token: token.expose().to_string(),
            file_name: document.file_name,
            edit_mode: mode.as_str().to_string(),
            bytes: document.bytes.len(),
        });
        let reply = self.script.lock().unwrap().upload.clone();
        reply.produce()
    }

    async fn chat(&self, token: &AuthToken, session_id: &str, message: &str) -> ApiResult<String> {
        self.record(Call::Chat {
            token: token.expose().to_string(),
            session_id: session_id.to_string(),
            message: message.to_string(),
        });
        if let Some(gate) = &self.chat_gate {
            gate.notified().await;
        }
        let reply = self.script.lock().unwrap().chat.clone();
        reply.produce()
    }
}

/// Analysis result with `corrections` numbered pairs and two figures.
pub fn sample_analysis(session_id: &str, corrections: usize) -> AnalysisResult {
    AnalysisResult {
        session_id: session_id.to_string(),
        original_text: "Teh results <b>recieve</b> support.".to_string(),
        corrected_text: "<p>The results <em>receive</em> support.</p>".to_string(),
        corrections: (1..=corrections)
            .map(|i| Correction { original: format!("wrong{i}"), corrected: format!("right{i}") })
            .collect(),
        figures: vec![
            Figure {
                id: "1".to_string(),
                image: "https://backend.test/figures/1.png".to_string(),
                analysis: "Bar chart.\nShows growth.".to_string(),
            },
            Figure {
                id: "2".to_string(),
                image: "https://backend.test/figures/2.png".to_string(),
                analysis: "Scatter plot.".to_string(),
            },
        ],
    }
}

/// Same as [`sample_analysis`] without any figures.
pub fn analysis_without_figures(session_id: &str, corrections: usize) -> AnalysisResult {
    AnalysisResult { figures: Vec::new(), ..sample_analysis(session_id, corrections) }
}

