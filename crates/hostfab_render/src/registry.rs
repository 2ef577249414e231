//! Template registry: selector -> composition procedure.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{RenderError, RenderResult};
use crate::template::{Template, TemplateKey};

/// A registry of templates keyed by (family, engine, variant).
///
/// Populated once at startup and read-only afterwards; concurrent lookups
/// need no locking.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateKey, Template>,
}

impl TemplateRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Register a template under its own key.
    ///
    /// A template registered under an already-present key replaces it.
    pub fn register(&mut self, template: Template) {
        debug!(key = %template.key, version = template.version, "registering template");
        self.templates.insert(template.key, template);
    }

    /// Resolve a selector to its template.
    pub fn resolve(&self, key: TemplateKey) -> RenderResult<&Template> {
        self.templates
            .get(&key)
            .ok_or(RenderError::UnknownTemplate(key))
    }

    /// Check if a selector is registered.
    pub fn contains(&self, key: TemplateKey) -> bool {
        self.templates.contains_key(&key)
    }

    /// All registered selectors.
    pub fn keys(&self) -> Vec<TemplateKey> {
        self.templates.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Walk every registration's transitive includes, failing on a missing
    /// registration or an inclusion cycle.
    ///
    /// Both defects are deployment-time template-set errors; verifying at
    /// startup keeps them out of individual renders.
    pub fn verify(&self) -> RenderResult<()> {
        for key in self.templates.keys() {
            let mut path = Vec::new();
            self.check_includes(*key, &mut path)?;
        }
        Ok(())
    }

    fn check_includes(&self, key: TemplateKey, path: &mut Vec<TemplateKey>) -> RenderResult<()> {
        if path.contains(&key) {
            return Err(RenderError::CyclicInclusion {
                path: format_cycle(path, key),
            });
        }

        let template = self.resolve(key)?;
        path.push(key);
        for include in template.includes() {
            self.check_includes(include, path)?;
        }
        path.pop();
        Ok(())
    }
}

/// Render an inclusion path plus the repeated key as `a -> b -> a`.
pub(crate) fn format_cycle(path: &[TemplateKey], repeated: TemplateKey) -> String {
    let mut parts: Vec<String> = path.iter().map(|k| k.to_string()).collect();
    parts.push(repeated.to_string());
    parts.join(" -> ")
}
