//! Liquid-backed template engine with two compatibility flavors.

use super::{TemplateEngine, TransformError};
use crate::settings::FileSystemHandler;
use liquid::partials::{LazyCompiler, PartialSource};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// Which Liquid dialect the engine emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidFlavor {
    /// Standard Liquid: the model is exposed under lowercase keys.
    Plain,
    /// DotLiquid compatibility: the model is additionally exposed under
    /// PascalCase keys, matching that dialect's C#-style conventions.
    DotLiquid,
}

/// Partial templates resolved through the injected filesystem accessor.
struct TemplateFileSource {
    file_system: Arc<dyn FileSystemHandler>,
}

impl std::fmt::Debug for TemplateFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateFileSource").finish()
    }
}

impl PartialSource for TemplateFileSource {
    fn contains(&self, name: &str) -> bool {
        self.file_system.read_text(name).is_ok()
    }

    fn names(&self) -> Vec<&str> {
        Vec::new()
    }

    fn try_get<'a>(&'a self, name: &str) -> Option<Cow<'a, str>> {
        self.file_system.read_text(name).ok().map(Cow::Owned)
    }
}

/// Liquid engine; partials load lazily through the filesystem accessor.
pub struct LiquidEngine {
    parser: liquid::Parser,
    flavor: LiquidFlavor,
}

impl LiquidEngine {
    pub fn new(
        file_system: Arc<dyn FileSystemHandler>,
        flavor: LiquidFlavor,
    ) -> Result<Self, TransformError> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .partials(LazyCompiler::new(TemplateFileSource { file_system }))
            .build()
            .map_err(|e| TransformError::Engine(e.to_string()))?;
        Ok(Self { parser, flavor })
    }
}

impl TemplateEngine for LiquidEngine {
    fn render(&self, template: &str, model: &Value) -> Result<String, TransformError> {
        let model = match self.flavor {
            LiquidFlavor::Plain => model.clone(),
            LiquidFlavor::DotLiquid => with_pascal_aliases(model),
        };
        let globals =
            liquid::model::to_object(&model).map_err(|e| TransformError::Render(e.to_string()))?;
        let template = self
            .parser
            .parse(template)
            .map_err(|e| TransformError::Render(e.to_string()))?;
        template
            .render(&globals)
            .map_err(|e| TransformError::Render(e.to_string()))
    }
}

/// Recursively add PascalCase aliases beside the original keys, leaving
/// the lowercase model intact for mixed templates.
fn with_pascal_aliases(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, inner) in map {
                let aliased = with_pascal_aliases(inner);
                out.insert(key.clone(), aliased.clone());
                let pascal = pascal_case(key);
                if pascal != *key && !map.contains_key(&pascal) {
                    out.insert(pascal, aliased);
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(with_pascal_aliases).collect()),
        other => other.clone(),
    }
}

fn pascal_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
