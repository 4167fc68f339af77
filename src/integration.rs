//! Exposing a helper to a host template engine.

use std::collections::HashMap;
use std::sync::Arc;

use crate::helper::CdnHtmlHelper;

/// Name under which templates find the helper.
pub const CONTEXT_NAME: &str = "cdn_html_helper";

/// Anything that can hold globals for template rendering.
pub trait TemplateContext {
    fn insert_global(&mut self, name: &str, helper: Arc<CdnHtmlHelper>);
}

pub fn install<C: TemplateContext + ?Sized>(context: &mut C, helper: Arc<CdnHtmlHelper>) {
    tracing::debug!(name = CONTEXT_NAME, "installing helper into template context");
    context.insert_global(CONTEXT_NAME, helper);
}

/// Plain name -> helper map for hosts without a context object of their own.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    globals: HashMap<String, Arc<CdnHtmlHelper>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CdnHtmlHelper>> {
        self.globals.get(name)
    }
}

impl TemplateContext for ContextRegistry {
    fn insert_global(&mut self, name: &str, helper: Arc<CdnHtmlHelper>) {
        self.globals.insert(name.to_string(), helper);
    }
}
