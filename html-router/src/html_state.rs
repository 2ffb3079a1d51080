use std::sync::Arc;

use common::{
    create_template_engine,
    utils::template_engine::{ProvidesTemplateEngine, TemplateEngine},
};
use tracing::debug;

pub const PAGE_TITLE: &str = "Chatbot RAG con Groq";

#[derive(Clone)]
pub struct HtmlState {
    pub templates: Arc<TemplateEngine>,
    pub page_title: String,
}

impl HtmlState {
    pub fn new() -> Self {
        Self::with_template_engine(Arc::new(create_template_engine!()))
    }

    pub fn with_template_engine(templates: Arc<TemplateEngine>) -> Self {
        debug!("Template engine configured for html_router.");
        Self {
            templates,
            page_title: PAGE_TITLE.to_string(),
        }
    }
}

impl Default for HtmlState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvidesTemplateEngine for HtmlState {
    fn template_engine(&self) -> &Arc<TemplateEngine> {
        &self.templates
    }
}
