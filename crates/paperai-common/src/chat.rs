//! Chat transcript state machine.
//!
//! Each send moves through `idle -> sending -> (succeeded | failed)`:
//!   - [`Transcript::begin_send`] appends the user turn and the typing
//!     placeholder, and hands back a [`PendingSend`].
//!   - [`Transcript::resolve`] consumes that handle, drops the placeholder
//!     and appends exactly one assistant turn.
//!
//! Overlapping sends share a single placeholder which stays at the tail of
//! the transcript until the last outstanding send resolves.

use serde::{Deserialize, Serialize};

pub const GREETING: &str = "I've analyzed your paper. Ask me anything!";
pub const TYPING_TEXT: &str = "Thinking...";
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't respond. Try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub text: String,
    pub sender: Sender,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub typing: bool,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::User, typing: false }
    }

    pub fn ai(text: impl Into<String>) -> Self {
        Self { text: text.into(), sender: Sender::Ai, typing: false }
    }

    fn placeholder() -> Self {
        Self { text: TYPING_TEXT.to_string(), sender: Sender::Ai, typing: true }
    }
}

/// Proof that a send is outstanding. Must be handed back to
/// [`Transcript::resolve`] exactly once.
#[derive(Debug)]
#[must_use = "a pending send leaves the typing placeholder in place until resolved"]
pub struct PendingSend {
    message: String,
}

impl PendingSend {
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// How a send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Answered(String),
    Failed,
}

impl<E> From<Result<String, E>> for ChatOutcome {
    fn from(result: Result<String, E>) -> Self {
        match result {
            Ok(answer) => ChatOutcome::Answered(answer),
            Err(_) => ChatOutcome::Failed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
    #[serde(skip)]
    in_flight: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh transcript for a newly analyzed paper.
    pub fn seeded() -> Self {
        Self { turns: vec![ChatTurn::ai(GREETING)], in_flight: 0 }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_waiting(&self) -> bool {
        self.in_flight > 0
    }

    /// Returns `None` without touching the transcript when the message is
    /// blank.
    pub fn begin_send(&mut self, raw: &str) -> Option<PendingSend> {
        let message = raw.trim();
        if message.is_empty() {
            return None;
        }

        self.remove_placeholder();
        self.turns.push(ChatTurn::user(message));
        self.turns.push(ChatTurn::placeholder());
        self.in_flight += 1;

        Some(PendingSend { message: message.to_string() })
    }

    pub fn resolve(&mut self, pending: PendingSend, outcome: ChatOutcome) {
        let PendingSend { .. } = pending;
        self.in_flight = self.in_flight.saturating_sub(1);
        self.remove_placeholder();

        let reply = match outcome {
            ChatOutcome::Answered(answer) => answer,
            ChatOutcome::Failed => FALLBACK_REPLY.to_string(),
        };
        self.turns.push(ChatTurn::ai(reply));

        if self.in_flight > 0 {
            self.turns.push(ChatTurn::placeholder());
        }
    }

    fn remove_placeholder(&mut self) {
        self.turns.retain(|turn| !turn.typing);
    }
}
