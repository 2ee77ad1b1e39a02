//! Templated transformation of webhook bodies and headers.
//!
//! A [`Transformer`] wraps one engine from the closed [`TransformerKind`]
//! set and rewrites a configured body/headers pair using the mapping and
//! the original request/response as the template model.

mod handlebars_engine;
mod liquid_engine;
mod model;

pub use handlebars_engine::HandlebarsEngine;
pub use liquid_engine::{LiquidEngine, LiquidFlavor};
pub use model::build_model;

use crate::mapping::Mapping;
use crate::model::{
    BodyData, HeaderMultiMap, ReplaceNodeOptions, RequestMessage, ResponseMessage, TransformerKind,
    WebhookBody,
};
use crate::settings::ServerSettings;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("template engine setup failed: {0}")]
    Engine(String),
    #[error("template render failed: {0}")]
    Render(String),
}

/// One templating engine: renders a template string against a JSON model.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, template: &str, model: &Value) -> Result<String, TransformError>;
}

/// Engine facade selected per webhook dispatch.
pub struct Transformer {
    engine: Box<dyn TemplateEngine>,
}

impl Transformer {
    /// Select and construct the engine for a transformer kind.
    ///
    /// The set is closed: every kind maps to exactly one constructor, and
    /// setup failures are fatal configuration errors at dispatch time.
    pub fn for_kind(
        kind: TransformerKind,
        settings: &ServerSettings,
    ) -> Result<Self, TransformError> {
        let engine: Box<dyn TemplateEngine> = match kind {
            TransformerKind::Handlebars => Box::new(HandlebarsEngine::new(
                settings.file_system.clone(),
                settings.handlebars_registration.as_ref(),
            )),
            TransformerKind::Liquid => Box::new(LiquidEngine::new(
                settings.file_system.clone(),
                LiquidFlavor::Plain,
            )?),
            TransformerKind::DotLiquid => Box::new(LiquidEngine::new(
                settings.file_system.clone(),
                LiquidFlavor::DotLiquid,
            )?),
        };
        Ok(Self { engine })
    }

    pub fn from_engine(engine: Box<dyn TemplateEngine>) -> Self {
        Self { engine }
    }

    /// Render the configured body and headers against the mapping and the
    /// original request/response.
    pub fn transform(
        &self,
        mapping: &Mapping,
        request: &RequestMessage,
        response: &ResponseMessage,
        body: Option<&WebhookBody>,
        headers: &HeaderMultiMap,
        replace_node: ReplaceNodeOptions,
    ) -> Result<(Option<BodyData>, HeaderMultiMap), TransformError> {
        let model = build_model(mapping, request, response);

        let mut transformed_headers = HeaderMultiMap::new();
        for (name, values) in headers.iter() {
            let name = self.engine.render(name, &model)?;
            for value in values {
                transformed_headers.add(&name, self.engine.render(value, &model)?);
            }
        }

        let transformed_body = match body {
            None => None,
            Some(WebhookBody::Text(text)) => {
                Some(BodyData::from_text(self.engine.render(text, &model)?))
            }
            Some(WebhookBody::Json(json)) => Some(BodyData::from_json(self.render_json(
                json,
                &model,
                replace_node,
            )?)),
        };

        Ok((transformed_body, transformed_headers))
    }

    /// Walk a JSON body, rendering every string node. [`ReplaceNodeOptions`]
    /// decides whether rendered text that parses as JSON is re-typed.
    fn render_json(
        &self,
        node: &Value,
        model: &Value,
        replace_node: ReplaceNodeOptions,
    ) -> Result<Value, TransformError> {
        Ok(match node {
            Value::String(template) => {
                let rendered = self.engine.render(template, model)?;
                match replace_node {
                    ReplaceNodeOptions::Evaluate => serde_json::from_str(&rendered)
                        .unwrap_or(Value::String(rendered)),
                    ReplaceNodeOptions::KeepAsString => Value::String(rendered),
                }
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.render_json(item, model, replace_node))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), self.render_json(value, model, replace_node)?);
                }
                Value::Object(out)
            }
            other => other.clone(),
        })
    }
}
