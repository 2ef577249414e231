//! The read-only aggregate passed into every render call.

use std::path::PathBuf;

use crate::models::{CloakMode, DbCredentials, Platform, Server, Site, TlsMaterial};

/// Everything the rendering engine may consult for one site.
///
/// A context is assembled by the provisioning collaborator and never mutated
/// by the renderer; two renders of the same context produce byte-identical
/// artifacts.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub site: Site,
    pub server: Server,
    pub platform: Platform,
    pub credentials: DbCredentials,
    pub tls: Option<TlsMaterial>,
    pub ssl_enabled: bool,
    pub cloaking: CloakMode,
    /// Identifies the generator in artifact headers. Versions change the
    /// header, timestamps never appear in artifact text.
    pub generator_version: String,
}

impl RenderContext {
    pub fn new(site: Site, server: Server, platform: Platform, credentials: DbCredentials) -> Self {
        Self {
            site,
            server,
            platform,
            credentials,
            tls: None,
            ssl_enabled: false,
            cloaking: CloakMode::default(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_ssl_enabled(mut self, enabled: bool) -> Self {
        self.ssl_enabled = enabled;
        self
    }

    pub fn with_cloaking(mut self, mode: CloakMode) -> Self {
        self.cloaking = mode;
        self
    }

    pub fn with_generator_version(mut self, version: impl Into<String>) -> Self {
        self.generator_version = version.into();
        self
    }

    /// The hostname server-name directives bind to: the redirection target
    /// when one is set, the canonical uri otherwise.
    pub fn primary_name(&self) -> &str {
        self.site
            .redirection
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.site.uri)
    }

    /// Aliases with blank entries skipped, in record order.
    pub fn active_aliases(&self) -> Vec<&str> {
        self.site
            .aliases
            .iter()
            .map(|a| a.as_str())
            .filter(|a| !a.trim().is_empty())
            .collect()
    }

    /// Hostnames that permanently redirect to the redirection target: the
    /// canonical uri plus every alias, minus the target itself. Empty when
    /// no redirection is configured.
    pub fn redirect_sources(&self) -> Vec<&str> {
        let target = match self.site.redirection.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Vec::new(),
        };

        let mut sources = Vec::new();
        for name in std::iter::once(self.site.uri.as_str()).chain(self.active_aliases()) {
            if name != target && !sources.contains(&name) {
                sources.push(name);
            }
        }
        sources
    }

    /// Per-site directory under the platform root.
    pub fn site_path(&self) -> PathBuf {
        self.platform.root.join("sites").join(&self.site.uri)
    }

    /// The private key path, when TLS material carries one.
    pub fn tls_key(&self) -> Option<&std::path::Path> {
        self.tls.as_ref().and_then(|t| t.key.as_deref())
    }

    /// API version advertised to the platform; forced to zero while a
    /// backup is in progress so the application holds off on write APIs.
    pub fn effective_api_version(&self) -> u16 {
        if self.site.backup_in_progress {
            0
        } else {
            self.platform.api_version
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WebEngine;

    fn context() -> RenderContext {
        let site = Site::new("example.com")
            .with_alias("www.example.com")
            .with_alias("example.org");
        let server = Server::new("web1", WebEngine::Nginx, "203.0.113.10");
        let platform = Platform::new("/var/platforms/app");
        let creds = DbCredentials::new("mysql", "db", "user", "pw", "localhost", 3306);
        RenderContext::new(site, server, platform, creds)
    }

    #[test]
    fn test_primary_name_without_redirection() {
        let ctx = context();
        assert_eq!(ctx.primary_name(), "example.com");
        assert!(ctx.redirect_sources().is_empty());
    }

    #[test]
    fn test_redirect_sources_exclude_target() {
        let mut ctx = context();
        ctx.site.redirection = Some("www.example.com".to_string());

        assert_eq!(ctx.primary_name(), "www.example.com");
        assert_eq!(ctx.redirect_sources(), vec!["example.com", "example.org"]);
    }

    #[test]
    fn test_blank_aliases_skipped() {
        let mut ctx = context();
        ctx.site.aliases.insert(1, "  ".to_string());
        assert_eq!(
            ctx.active_aliases(),
            vec!["www.example.com", "example.org"]
        );
    }

    #[test]
    fn test_api_version_zero_during_backup() {
        let mut ctx = context();
        assert_eq!(ctx.effective_api_version(), 2);
        ctx.site.backup_in_progress = true;
        assert_eq!(ctx.effective_api_version(), 0);
    }
}
