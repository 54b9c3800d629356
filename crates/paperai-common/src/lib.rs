//! paperai-common: Shared types used across all PaperAI crates.
//!
//!   - Analysis result model returned by the document-analysis API
//!   - Login / signup form validation
//!   - Chat transcript state machine

pub mod models;
pub mod forms;
pub mod chat;

pub use models::{AnalysisResult, AuthToken, Correction, EditMode, Figure};
pub use forms::{Credentials, FormError, LoginForm, Registration, SignupForm};
pub use chat::{ChatOutcome, ChatTurn, PendingSend, Sender, Transcript};
