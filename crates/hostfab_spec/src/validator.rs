//! Record validation utilities.

use regex::Regex;
use tracing::debug;

use crate::context::RenderContext;
use crate::models::{Server, Site};

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validator for site and server records.
pub struct RecordValidator {
    hostname: Regex,
}

impl Default for RecordValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordValidator {
    pub fn new() -> Self {
        Self {
            // RFC 1123 host labels joined by dots.
            hostname: Regex::new(
                r"^(?i)[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$",
            )
            .unwrap(),
        }
    }

    /// Validate a site record.
    pub fn validate_site(&self, site: &Site) -> ValidationResult {
        let mut result = ValidationResult::new();

        if site.uri.is_empty() {
            result.add_error("Site uri cannot be empty");
        } else if !self.hostname.is_match(&site.uri) {
            result.add_error(format!("Site uri is not a valid hostname: {}", site.uri));
        }

        for alias in &site.aliases {
            if alias.trim().is_empty() {
                result.add_warning("Blank alias entry will be skipped during rendering");
            } else if !self.hostname.is_match(alias) {
                result.add_error(format!("Alias is not a valid hostname: {}", alias));
            }
        }

        if let Some(target) = site.redirection.as_deref() {
            let known = target == site.uri || site.aliases.iter().any(|a| a == target);
            if !known {
                result.add_error(format!(
                    "Redirection target '{}' is neither the uri nor an alias of '{}'",
                    target, site.uri
                ));
            }
        }

        if site.profile.is_empty() {
            result.add_error(format!("Site '{}' has no install profile", site.uri));
        }

        result
    }

    /// Validate a server record.
    pub fn validate_server(&self, server: &Server) -> ValidationResult {
        let mut result = ValidationResult::new();

        if server.hostname.is_empty() {
            result.add_error("Server hostname cannot be empty");
        }

        if server.ip_address.is_empty() {
            result.add_error("Server ip_address cannot be empty");
        }

        if server.http_port == 0 {
            result.add_error("Server http_port cannot be zero");
        }

        if server.https_port == 0 {
            result.add_error("Server https_port cannot be zero");
        }

        if server.include_path.as_os_str().is_empty() {
            result.add_warning("Server has no include_path; shared fragments will be skipped");
        }

        result
    }

    /// Cross-validate a complete render context.
    pub fn validate_context(&self, ctx: &RenderContext) -> ValidationResult {
        let mut result = self.validate_site(&ctx.site);
        result.merge(self.validate_server(&ctx.server));

        if ctx.platform.root.as_os_str().is_empty() {
            result.add_error("Platform root cannot be empty");
        }

        if ctx.credentials.name.is_empty() || ctx.credentials.user.is_empty() {
            result.add_error(format!(
                "Site '{}' has incomplete database credentials",
                ctx.site.uri
            ));
        }

        if ctx.ssl_enabled && !ctx.server.ssl_capable {
            result.add_warning(format!(
                "Site '{}' requests TLS on server '{}' which is not SSL-capable",
                ctx.site.uri, ctx.server.hostname
            ));
        }

        if ctx.ssl_enabled && ctx.tls_key().is_none() {
            result.add_warning(format!(
                "Site '{}' requests TLS without a private key; the TLS block will be omitted",
                ctx.site.uri
            ));
        }

        debug!(
            site = %ctx.site.uri,
            valid = result.valid,
            "validated render context"
        );
        result
    }
}
