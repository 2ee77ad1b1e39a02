//! Handlebars-backed template engine.

use super::{TemplateEngine, TransformError};
use crate::settings::{FileSystemHandler, HandlebarsRegistration};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderErrorReason,
};
use serde_json::Value;
use std::sync::Arc;

/// Handlebars engine with a `file` helper backed by the injected
/// filesystem accessor and an optional embedder registration hook.
pub struct HandlebarsEngine {
    registry: Handlebars<'static>,
}

impl HandlebarsEngine {
    pub fn new(
        file_system: Arc<dyn FileSystemHandler>,
        registration: Option<&HandlebarsRegistration>,
    ) -> Self {
        let mut registry = Handlebars::new();
        // Templates produce HTTP payloads, not HTML.
        registry.register_escape_fn(handlebars::no_escape);

        registry.register_helper(
            "file",
            Box::new(
                move |h: &Helper,
                      _: &Handlebars,
                      _: &Context,
                      _: &mut RenderContext,
                      out: &mut dyn Output|
                      -> HelperResult {
                    let path = h
                        .param(0)
                        .and_then(|p| p.value().as_str())
                        .ok_or(RenderErrorReason::ParamNotFoundForIndex("file", 0))?;
                    let content = file_system.read_text(path).map_err(|e| {
                        RenderErrorReason::Other(format!("file helper failed for '{path}': {e}"))
                    })?;
                    out.write(&content)?;
                    Ok(())
                },
            ),
        );

        if let Some(hook) = registration {
            hook(&mut registry);
        }

        Self { registry }
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render(&self, template: &str, model: &Value) -> Result<String, TransformError> {
        self.registry
            .render_template(template, model)
            .map_err(|e| TransformError::Render(e.to_string()))
    }
}
