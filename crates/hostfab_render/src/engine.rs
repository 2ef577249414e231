//! Conditional composition engine.
//!
//! Expands a template against a render context into the final artifact
//! text. Expansion is pure: guards read context flags, fields resolve to
//! typed values, every interpolation passes through the escaping policy.

use tracing::{debug, info};

use hostfab_spec::RenderContext;

use crate::artifact::{target_path, Artifact};
use crate::encode::{encode, Syntax};
use crate::error::{RenderError, RenderResult};
use crate::fields::{Field, FieldResolver, FieldValue};
use crate::registry::{format_cycle, TemplateRegistry};
use crate::template::{Fragment, Guard, Part, TemplateKey};

/// Renders templates from one registry.
pub struct Renderer<'r> {
    registry: &'r TemplateRegistry,
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self { registry }
    }

    /// Render the selected template against a context.
    pub fn render(&self, key: TemplateKey, ctx: &RenderContext) -> RenderResult<Artifact> {
        let template = self.registry.resolve(key)?;
        let fields = FieldResolver::new(ctx);

        let mut content = String::new();
        let mut stack = vec![key];
        self.expand(&template.body, &fields, None, &mut content, &mut stack)?;

        info!(
            key = %key,
            site = %ctx.site.uri,
            bytes = content.len(),
            "rendered artifact"
        );

        Ok(Artifact::new(
            key,
            target_path(key.family, &ctx.site.uri),
            content,
            ctx.generator_version.clone(),
        ))
    }

    fn expand(
        &self,
        fragments: &[Fragment],
        fields: &FieldResolver<'_>,
        item: Option<&str>,
        out: &mut String,
        stack: &mut Vec<TemplateKey>,
    ) -> RenderResult<()> {
        for fragment in fragments {
            match fragment {
                Fragment::Text(text) => out.push_str(text),
                Fragment::Line(parts) => emit_line(parts, fields, item, out)?,
                Fragment::ForEach { seq, body } => {
                    for entry in fields.seq(*seq) {
                        self.expand(body, fields, Some(entry.as_str()), out, stack)?;
                    }
                }
                Fragment::When { guard, body } => {
                    if eval_guard(guard, fields) {
                        self.expand(body, fields, item, out, stack)?;
                    }
                }
                Fragment::Either {
                    guard,
                    then,
                    otherwise,
                } => {
                    let branch = if eval_guard(guard, fields) { then } else { otherwise };
                    self.expand(branch, fields, item, out, stack)?;
                }
                Fragment::Verbatim(field) => {
                    if let FieldValue::Str(block) = fields.resolve(*field) {
                        out.push_str(&block);
                        if !block.ends_with('\n') {
                            out.push('\n');
                        }
                    }
                }
                Fragment::Include(key) => {
                    if stack.contains(key) {
                        return Err(RenderError::CyclicInclusion {
                            path: format_cycle(stack, *key),
                        });
                    }
                    let template = self.registry.resolve(*key)?;
                    stack.push(*key);
                    self.expand(&template.body, fields, item, out, stack)?;
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}

fn eval_guard(guard: &Guard, fields: &FieldResolver<'_>) -> bool {
    match guard {
        Guard::Flag(flag) => fields.flag(*flag),
        Guard::Present(field) => fields.resolve(*field) != FieldValue::Absent,
        Guard::NonEmpty(seq) => !fields.seq(*seq).is_empty(),
        Guard::Not(inner) => !eval_guard(inner, fields),
        Guard::All(guards) => guards.iter().all(|g| eval_guard(g, fields)),
    }
}

/// Assemble one output line. A line referencing an absent field is omitted
/// entirely: emitting a directive with a hole would corrupt the target
/// config, and absence is the documented fallback, not an error.
fn emit_line(
    parts: &[Part],
    fields: &FieldResolver<'_>,
    item: Option<&str>,
    out: &mut String,
) -> RenderResult<()> {
    let mut line = String::new();

    for part in parts {
        match part {
            Part::Lit(text) => line.push_str(text),
            Part::Field { field, syntax } => match fields.resolve(*field) {
                FieldValue::Absent => {
                    debug!(field = field.name(), "line omitted: field absent");
                    return Ok(());
                }
                value => line.push_str(&encode_value(&value, *syntax, *field)?),
            },
            Part::Item { syntax } => match item {
                Some(value) => line.push_str(&encode_str(value, *syntax, "item")?),
                None => {
                    debug!("line omitted: item part outside for-each");
                    return Ok(());
                }
            },
            Part::Each { seq, syntax } => {
                for value in fields.seq(*seq) {
                    line.push(' ');
                    line.push_str(&encode_str(&value, *syntax, "sequence item")?);
                }
            }
        }
    }

    out.push_str(&line);
    out.push('\n');
    Ok(())
}

fn encode_value(value: &FieldValue, syntax: Syntax, field: Field) -> RenderResult<String> {
    match value {
        FieldValue::Str(s) => encode_str(s, syntax, field.name()),
        // Integers become text only here, at the escaping boundary.
        FieldValue::Int(n) => encode_str(&n.to_string(), syntax, field.name()),
        FieldValue::Path(p) => {
            let s = p.to_str().ok_or_else(|| RenderError::Encoding {
                field: field.name(),
                reason: "path is not valid UTF-8".to_string(),
            })?;
            encode_str(s, syntax, field.name())
        }
        FieldValue::Absent => Err(RenderError::Encoding {
            field: field.name(),
            reason: "absent value reached the encoder".to_string(),
        }),
    }
}

fn encode_str(value: &str, syntax: Syntax, field: &'static str) -> RenderResult<String> {
    encode(value, syntax).map_err(|e| RenderError::Encoding {
        field,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FlagField, SeqField};
    use crate::template::{Template, TemplateFamily, TemplateVariant};
    use hostfab_spec::{DbCredentials, Platform, Server, Site, WebEngine};

    fn context() -> RenderContext {
        RenderContext::new(
            Site::new("example.com")
                .with_alias("www.example.com")
                .with_alias("example.org"),
            Server::new("web1", WebEngine::Nginx, "203.0.113.10"),
            Platform::new("/var/platforms/app"),
            DbCredentials::new("mysql", "db", "user", "pw", "localhost", 3306),
        )
    }

    fn key(variant: TemplateVariant) -> TemplateKey {
        TemplateKey::new(TemplateFamily::VirtualHost, WebEngine::Nginx, variant)
    }

    #[test]
    fn test_render_is_deterministic() {
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new(
            key(TemplateVariant::Base),
            "1.0",
            vec![
                Fragment::line(vec![
                    Part::lit("server_name "),
                    Part::field(Field::PrimaryName, Syntax::Directive),
                    Part::each(SeqField::Aliases, Syntax::Directive),
                    Part::lit(";"),
                ]),
            ],
        ));

        let ctx = context();
        let renderer = Renderer::new(&registry);
        let first = renderer.render(key(TemplateVariant::Base), &ctx).unwrap();
        let second = renderer.render(key(TemplateVariant::Base), &ctx).unwrap();

        assert_eq!(
            first.content,
            "server_name example.com www.example.com example.org;\n"
        );
        assert_eq!(first.content, second.content);
    }

    #[test]
    fn test_line_with_absent_field_is_omitted() {
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new(
            key(TemplateVariant::Base),
            "1.0",
            vec![
                Fragment::line(vec![
                    Part::lit("ssl_certificate_key "),
                    Part::field(Field::SslKey, Syntax::PathArg),
                    Part::lit(";"),
                ]),
                Fragment::line(vec![Part::lit("root /srv;")]),
            ],
        ));

        let ctx = context();
        let renderer = Renderer::new(&registry);
        let artifact = renderer.render(key(TemplateVariant::Base), &ctx).unwrap();

        assert_eq!(artifact.content, "root /srv;\n");
    }

    #[test]
    fn test_guarded_block_and_for_each() {
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new(
            key(TemplateVariant::Base),
            "1.0",
            vec![Fragment::when(
                Guard::not(Guard::Flag(FlagField::SslEnabled)),
                vec![Fragment::for_each(
                    SeqField::Aliases,
                    vec![Fragment::line(vec![
                        Part::lit("alias "),
                        Part::item(Syntax::Directive),
                        Part::lit(";"),
                    ])],
                )],
            )],
        ));

        let ctx = context();
        let renderer = Renderer::new(&registry);
        let artifact = renderer.render(key(TemplateVariant::Base), &ctx).unwrap();

        assert_eq!(
            artifact.content,
            "alias www.example.com;\nalias example.org;\n"
        );
    }

    #[test]
    fn test_runtime_cycle_detection() {
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new(
            key(TemplateVariant::Base),
            "1.0",
            vec![Fragment::include(key(TemplateVariant::Base))],
        ));

        let ctx = context();
        let renderer = Renderer::new(&registry);
        let err = renderer.render(key(TemplateVariant::Base), &ctx).unwrap_err();
        assert!(matches!(err, RenderError::CyclicInclusion { .. }));
    }

    #[test]
    fn test_encoding_failure_names_the_field() {
        let mut registry = TemplateRegistry::new();
        registry.register(Template::new(
            key(TemplateVariant::Base),
            "1.0",
            vec![Fragment::line(vec![
                Part::lit("ServerName "),
                Part::field(Field::Uri, Syntax::Directive),
            ])],
        ));

        let mut ctx = context();
        ctx.site.uri = "bad\u{7}host".to_string();
        let renderer = Renderer::new(&registry);
        let err = renderer.render(key(TemplateVariant::Base), &ctx).unwrap_err();

        match err {
            RenderError::Encoding { field, .. } => assert_eq!(field, "uri"),
            other => panic!("expected Encoding error, got {:?}", other),
        }
    }
}
