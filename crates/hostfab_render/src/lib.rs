//! # hostfab_render
//!
//! Template composition and rendering engine for hostfab.
//!
//! Turns a [`hostfab_spec::RenderContext`] and a registered template into a
//! configuration artifact:
//!
//! - **Template model & registry**: declarative fragments over typed field
//!   references, resolved by (family, engine, variant) selector with
//!   transitive include verification.
//! - **Composition engine**: guard evaluation, inline include expansion,
//!   strict declaration-order output.
//! - **Escaping policy**: every interpolated value is encoded for its
//!   destination syntax.
//! - **Credential cloaking**: the server-environment indirection channel
//!   and its write-then-instruct-clear lifecycle.
//! - **Idempotence guard**: line-wise diff deciding whether a regenerated
//!   artifact needs writing.
//!
//! ## Example
//!
//! ```rust
//! use hostfab_render::{
//!     Field, Fragment, Part, Renderer, Syntax, Template, TemplateFamily, TemplateKey,
//!     TemplateRegistry, TemplateVariant,
//! };
//! use hostfab_spec::{DbCredentials, Platform, RenderContext, Server, Site, WebEngine};
//!
//! let key = TemplateKey::new(
//!     TemplateFamily::VirtualHost,
//!     WebEngine::Nginx,
//!     TemplateVariant::Base,
//! );
//!
//! let mut registry = TemplateRegistry::new();
//! registry.register(Template::new(
//!     key,
//!     "1.0",
//!     vec![Fragment::line(vec![
//!         Part::lit("server_name "),
//!         Part::field(Field::Uri, Syntax::Directive),
//!         Part::lit(";"),
//!     ])],
//! ));
//! registry.verify().unwrap();
//!
//! let ctx = RenderContext::new(
//!     Site::new("example.com"),
//!     Server::new("web1", WebEngine::Nginx, "203.0.113.10"),
//!     Platform::new("/var/platforms/app"),
//!     DbCredentials::new("mysql", "db", "user", "pw", "localhost", 3306),
//! );
//!
//! let artifact = Renderer::new(&registry).render(key, &ctx).unwrap();
//! assert_eq!(artifact.content, "server_name example.com;\n");
//! ```

pub mod artifact;
pub mod cloak;
pub mod diff;
pub mod encode;
pub mod engine;
pub mod error;
pub mod fields;
pub mod registry;
pub mod template;

pub use artifact::{target_path, Artifact, ArtifactMeta};
pub use cloak::{
    channel_writes, consume_channel, credential_url, parse_credential_url, seed_channel,
    BootstrapCredentials, CredentialChannel, EnvChannel, ParsedCredentialUrl, CHANNEL_KEYS,
    REDIRECT_PREFIX,
};
pub use diff::{ArtifactDiff, ChangeSet, DiffVerdict};
pub use encode::{encode, encode_at_segments, url_decode, url_encode, EncodeError, Syntax};
pub use engine::Renderer;
pub use error::{RenderError, RenderResult};
pub use fields::{Field, FieldResolver, FieldValue, FlagField, SeqField};
pub use registry::TemplateRegistry;
pub use template::{Fragment, Guard, Part, Template, TemplateFamily, TemplateKey, TemplateVariant};
