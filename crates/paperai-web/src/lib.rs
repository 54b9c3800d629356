//! paperai-web: browser front end for the PaperAI analysis backend.
//!
//! Serves server-rendered pages for:
//!   - login and signup
//!   - uploading a paper and reviewing its corrections and figures
//!   - chatting with the assistant about the uploaded paper
//!
//! The bearer token lives in an HttpOnly cookie; everything else a
//! browser sees on the dashboard is kept server-side in [`views`].

pub mod error;
pub mod handlers;
pub mod render;
pub mod router;
pub mod session;
pub mod state;
pub mod views;
