//! The declarative template model.
//!
//! A template is data: an ordered sequence of [`Fragment`]s over typed field
//! references, with guards evaluated against the render context and explicit
//! inclusion of other templates. There is no scripting surface; everything a
//! template can do is enumerated here.

use serde::{Deserialize, Serialize};

use hostfab_spec::WebEngine;

use crate::encode::Syntax;
use crate::fields::{Field, FlagField, SeqField};

/// Families of artifacts the platform renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFamily {
    /// Web-server virtual-host block.
    VirtualHost,
    /// Application bootstrap settings file.
    AppSettings,
}

impl TemplateFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateFamily::VirtualHost => "vhost",
            TemplateFamily::AppSettings => "settings",
        }
    }
}

impl std::fmt::Display for TemplateFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Feature variants of a template family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateVariant {
    Base,
    Ssl,
    Disabled,
}

impl TemplateVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateVariant::Base => "base",
            TemplateVariant::Ssl => "ssl",
            TemplateVariant::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for TemplateVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Registry selector: (family, engine, variant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateKey {
    pub family: TemplateFamily,
    pub engine: WebEngine,
    pub variant: TemplateVariant,
}

impl TemplateKey {
    pub fn new(family: TemplateFamily, engine: WebEngine, variant: TemplateVariant) -> Self {
        Self {
            family,
            engine,
            variant,
        }
    }
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.family, self.engine, self.variant)
    }
}

/// One piece of an output line.
#[derive(Debug, Clone)]
pub enum Part {
    /// Literal text.
    Lit(&'static str),
    /// A context field, encoded for the destination syntax.
    Field { field: Field, syntax: Syntax },
    /// The current [`Fragment::ForEach`] item.
    Item { syntax: Syntax },
    /// Every item of a sequence, each prefixed with a single space.
    Each { seq: SeqField, syntax: Syntax },
}

impl Part {
    pub fn lit(text: &'static str) -> Self {
        Part::Lit(text)
    }

    pub fn field(field: Field, syntax: Syntax) -> Self {
        Part::Field { field, syntax }
    }

    pub fn item(syntax: Syntax) -> Self {
        Part::Item { syntax }
    }

    pub fn each(seq: SeqField, syntax: Syntax) -> Self {
        Part::Each { seq, syntax }
    }
}

/// A side-effect-free condition over context booleans and optionals.
#[derive(Debug, Clone)]
pub enum Guard {
    Flag(FlagField),
    Present(Field),
    NonEmpty(SeqField),
    Not(Box<Guard>),
    All(Vec<Guard>),
}

impl Guard {
    pub fn not(guard: Guard) -> Self {
        Guard::Not(Box::new(guard))
    }

    pub fn all(guards: Vec<Guard>) -> Self {
        Guard::All(guards)
    }
}

/// A unit of composition.
///
/// Fragments are expanded in declaration order; included templates expand
/// inline at their inclusion point. Output ordering is contractual: some
/// directives are position-sensitive in the consuming server.
#[derive(Debug, Clone)]
pub enum Fragment {
    /// Verbatim static text, newlines included.
    Text(&'static str),
    /// One output line assembled from parts. The whole line is omitted when
    /// any referenced field is absent from the context.
    Line(Vec<Part>),
    /// Body expanded once per item of the sequence; blank items are skipped
    /// by the resolver.
    ForEach { seq: SeqField, body: Vec<Fragment> },
    /// Body emitted only when the guard holds.
    When { guard: Guard, body: Vec<Fragment> },
    /// Exactly one of the two branches is emitted.
    Either {
        guard: Guard,
        then: Vec<Fragment>,
        otherwise: Vec<Fragment>,
    },
    /// An operator-supplied block, emitted as-is when present.
    Verbatim(Field),
    /// Inline expansion of another registered template.
    Include(TemplateKey),
}

impl Fragment {
    pub fn text(text: &'static str) -> Self {
        Fragment::Text(text)
    }

    pub fn line(parts: Vec<Part>) -> Self {
        Fragment::Line(parts)
    }

    pub fn for_each(seq: SeqField, body: Vec<Fragment>) -> Self {
        Fragment::ForEach { seq, body }
    }

    pub fn when(guard: Guard, body: Vec<Fragment>) -> Self {
        Fragment::When { guard, body }
    }

    pub fn either(guard: Guard, then: Vec<Fragment>, otherwise: Vec<Fragment>) -> Self {
        Fragment::Either {
            guard,
            then,
            otherwise,
        }
    }

    pub fn verbatim(field: Field) -> Self {
        Fragment::Verbatim(field)
    }

    pub fn include(key: TemplateKey) -> Self {
        Fragment::Include(key)
    }
}

/// A named, versioned unit of composition logic.
#[derive(Debug, Clone)]
pub struct Template {
    pub key: TemplateKey,
    pub version: &'static str,
    pub body: Vec<Fragment>,
}

impl Template {
    pub fn new(key: TemplateKey, version: &'static str, body: Vec<Fragment>) -> Self {
        Self { key, version, body }
    }

    /// Keys of templates this one expands inline, in declaration order.
    pub fn includes(&self) -> Vec<TemplateKey> {
        let mut keys = Vec::new();
        collect_includes(&self.body, &mut keys);
        keys
    }
}

fn collect_includes(fragments: &[Fragment], keys: &mut Vec<TemplateKey>) {
    for fragment in fragments {
        match fragment {
            Fragment::Include(key) => keys.push(*key),
            Fragment::ForEach { body, .. } | Fragment::When { body, .. } => {
                collect_includes(body, keys)
            }
            Fragment::Either {
                then, otherwise, ..
            } => {
                collect_includes(then, keys);
                collect_includes(otherwise, keys);
            }
            Fragment::Text(_) | Fragment::Line(_) | Fragment::Verbatim(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = TemplateKey::new(
            TemplateFamily::VirtualHost,
            WebEngine::Apache,
            TemplateVariant::Ssl,
        );
        assert_eq!(key.to_string(), "vhost/apache/ssl");
    }

    #[test]
    fn test_includes_are_collected_from_nested_fragments() {
        let base = TemplateKey::new(
            TemplateFamily::VirtualHost,
            WebEngine::Nginx,
            TemplateVariant::Base,
        );
        let ssl = TemplateKey::new(
            TemplateFamily::VirtualHost,
            WebEngine::Nginx,
            TemplateVariant::Ssl,
        );

        let template = Template::new(
            ssl,
            "1.0",
            vec![
                Fragment::when(
                    Guard::Flag(FlagField::SslEnabled),
                    vec![Fragment::text("server {}\n")],
                ),
                Fragment::include(base),
            ],
        );

        assert_eq!(template.includes(), vec![base]);
    }
}
