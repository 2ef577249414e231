//! # hostfab_templates
//!
//! The built-in template set: Apache and Nginx virtual hosts in
//! Base/Ssl/Disabled variants, plus the application bootstrap settings
//! file, all expressed in the declarative fragment model of
//! [`hostfab_render`].
//!
//! ## Example
//!
//! ```rust
//! use hostfab_render::{Renderer, TemplateFamily, TemplateKey, TemplateVariant};
//! use hostfab_spec::{DbCredentials, Platform, RenderContext, Server, Site, WebEngine};
//! use hostfab_templates::builtin_registry;
//!
//! let registry = builtin_registry();
//! registry.verify().unwrap();
//!
//! let ctx = RenderContext::new(
//!     Site::new("example.com"),
//!     Server::new("web1", WebEngine::Nginx, "203.0.113.10"),
//!     Platform::new("/var/platforms/app"),
//!     DbCredentials::new("mysql", "db", "user", "pw", "localhost", 3306),
//! );
//!
//! let key = TemplateKey::new(
//!     TemplateFamily::VirtualHost,
//!     WebEngine::Nginx,
//!     TemplateVariant::Ssl,
//! );
//! let artifact = Renderer::new(&registry).render(key, &ctx).unwrap();
//! assert!(artifact.content.contains("server_name"));
//! ```

pub mod apache;
pub mod nginx;
pub mod settings;

use tracing::debug;

use hostfab_render::TemplateRegistry;
use hostfab_spec::WebEngine;

/// Build the registry of built-in templates.
///
/// Call [`TemplateRegistry::verify`] once after startup so template-set
/// mistakes fail before the first render.
pub fn builtin_registry() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();

    registry.register(apache::vhost());
    registry.register(apache::vhost_ssl());
    registry.register(apache::vhost_disabled());

    registry.register(nginx::vhost());
    registry.register(nginx::vhost_ssl());
    registry.register(nginx::vhost_disabled());

    for engine in WebEngine::all() {
        registry.register(settings::app_settings(engine));
    }

    debug!(templates = registry.len(), "built-in registry populated");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_verifies() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), 8);
        registry.verify().unwrap();
    }
}
