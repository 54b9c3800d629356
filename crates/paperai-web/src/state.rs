//! Shared application state for the web server.

use paperai_client::PaperApi;
use paperai_common::EditMode;
use paperai_config::Config;
use std::sync::Arc;

use crate::error::WebError;
use crate::render::{DashboardPage, Templates};
use crate::views::ViewStore;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub config: Config,
    pub api: Arc<dyn PaperApi>,
    pub views: ViewStore,
    pub templates: Templates,
    /// Accepted file types, pre-joined for the file input.
    accept: String,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn PaperApi>) -> Result<Self, WebError> {
        let accept = config.upload.accept_attr();
        Ok(Self {
            config,
            api,
            views: ViewStore::new(),
            templates: Templates::new()?,
            accept,
        })
    }

    pub fn edit_mode(&self) -> EditMode {
        EditMode::new(self.config.upload.edit_mode.clone())
    }

    pub fn dashboard_page(&self) -> DashboardPage<'_> {
        DashboardPage {
            accept: &self.accept,
            edit_mode: &self.config.upload.edit_mode,
            trust_backend_html: self.config.render.trust_backend_html,
        }
    }
}

pub type SharedState = Arc<AppState>;
