//! paperai-client: Typed access to the PaperAI backend.
//!
//! Endpoints:
//!   POST /api/login  : credentials → bearer token
//!   POST /api/signup : account creation
//!   POST /api/upload : multipart document → analysis result
//!   POST /api/chat   : question about an analyzed paper → answer

pub mod api;
pub mod error;
pub mod http;

pub use api::{Document, PaperApi};
pub use error::{ApiError, ApiResult};
pub use http::HttpPaperApi;
