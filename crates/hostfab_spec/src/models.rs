//! Data models for sites, servers, platforms and credentials.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Web-server engines a [`Server`] can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebEngine {
    Apache,
    Nginx,
}

impl WebEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebEngine::Apache => "apache",
            WebEngine::Nginx => "nginx",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "apache" => Some(WebEngine::Apache),
            "nginx" => Some(WebEngine::Nginx),
            _ => None,
        }
    }

    pub fn all() -> Vec<Self> {
        vec![WebEngine::Apache, WebEngine::Nginx]
    }
}

impl std::fmt::Display for WebEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How database credentials are delivered into rendered artifacts.
///
/// `Cloaked` keeps credential literals out of the bootstrap settings file:
/// the consumer reads them once from the server-environment channel and then
/// clears every copy. `Embedded` writes them literally, each through the
/// escaping policy for its destination syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloakMode {
    #[default]
    Cloaked,
    Embedded,
}

/// A hosted site record.
///
/// Created on the provisioning request, mutated on each re-verify/re-deploy.
/// Disabling a site sets `enabled = false` rather than deleting the record,
/// so its configuration can be regenerated in maintenance form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: Uuid,
    /// Canonical domain name.
    pub uri: String,
    /// Alias domains; order defines fallback/redirect precedence.
    pub aliases: Vec<String>,
    /// Install profile name.
    pub profile: String,
    pub enabled: bool,
    /// Alias all other hostnames permanently redirect to, if set.
    pub redirection: Option<String>,
    /// Serve this site under a path segment of a shared domain.
    pub subdirs: bool,
    /// Administrative contact, emitted as the server-admin directive.
    pub mail: Option<String>,
    /// Verbatim operator-supplied configuration block.
    pub extra_config: Option<String>,
    /// Set while a backup of the site is running.
    pub backup_in_progress: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Site {
    /// Create an enabled site with the given canonical domain.
    pub fn new(uri: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            uri: uri.into(),
            aliases: Vec::new(),
            profile: "standard".to_string(),
            enabled: true,
            redirection: None,
            subdirs: false,
            mail: None,
            extra_config: None,
            backup_in_progress: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append an alias domain.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Set the redirection target.
    pub fn with_redirection(mut self, target: impl Into<String>) -> Self {
        self.redirection = Some(target.into());
        self
    }

    /// Set the install profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the administrative mail address.
    pub fn with_mail(mut self, mail: impl Into<String>) -> Self {
        self.mail = Some(mail.into());
        self
    }

    /// Attach a verbatim configuration block.
    pub fn with_extra_config(mut self, block: impl Into<String>) -> Self {
        self.extra_config = Some(block.into());
        self
    }

    /// Enable subdirectory-multisite mode.
    pub fn with_subdirs(mut self) -> Self {
        self.subdirs = true;
        self
    }

    /// Mark the site administratively disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A physical or virtual host running one web-server engine.
///
/// Immutable for the duration of a render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub hostname: String,
    pub engine: WebEngine,
    pub ip_address: String,
    pub http_port: u16,
    pub https_port: u16,
    /// Directory holding shared config fragments referenced by rendered
    /// artifacts. The renderer never opens these files itself.
    pub include_path: PathBuf,
    pub ssl_capable: bool,
}

impl Server {
    pub fn new(
        hostname: impl Into<String>,
        engine: WebEngine,
        ip_address: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            engine,
            ip_address: ip_address.into(),
            http_port: 80,
            https_port: 443,
            include_path: PathBuf::from("/var/hostfab/config/includes"),
            ssl_capable: true,
        }
    }

    pub fn with_ports(mut self, http: u16, https: u16) -> Self {
        self.http_port = http;
        self.https_port = https;
        self
    }

    pub fn with_include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_path = path.into();
        self
    }

    pub fn without_ssl(mut self) -> Self {
        self.ssl_capable = false;
        self
    }
}

/// Names of the file-path settings variables the platform consumes.
///
/// The variable names differ between platform generations, so templates
/// reference them through this indirection instead of hardcoding either set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsFileVars {
    pub file_public: String,
    pub file_temp: String,
    /// Absent when the platform has no private-files directory.
    pub file_private: Option<String>,
}

impl SettingsFileVars {
    /// Variable names used by current platform releases.
    pub fn current() -> Self {
        Self {
            file_public: "file_public_path".to_string(),
            file_temp: "file_temporary_path".to_string(),
            file_private: Some("file_private_path".to_string()),
        }
    }

    /// Variable names used by legacy platform releases.
    pub fn legacy() -> Self {
        Self {
            file_public: "file_directory_path".to_string(),
            file_temp: "file_directory_temp".to_string(),
            file_private: None,
        }
    }
}

impl Default for SettingsFileVars {
    fn default() -> Self {
        Self::current()
    }
}

/// An application codebase deployed on one [`Server`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// Codebase root, used as the document root of rendered virtual hosts.
    pub root: PathBuf,
    pub api_version: u16,
    /// Platform has a dedicated maintenance-mode variable; older releases
    /// only understand the legacy offline flag.
    pub maintenance_mode: bool,
    /// Platform requires a hash-salt variable in its settings file.
    pub hash_salt: bool,
    /// Platform can serve sites from subdirectories of a shared domain.
    pub subdirs_support: bool,
    pub settings_vars: SettingsFileVars,
}

impl Platform {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            api_version: 2,
            maintenance_mode: true,
            hash_salt: true,
            subdirs_support: false,
            settings_vars: SettingsFileVars::default(),
        }
    }

    /// A legacy platform: offline flag instead of maintenance mode, no
    /// hash salt, legacy settings variable names.
    pub fn legacy(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            api_version: 1,
            maintenance_mode: false,
            hash_salt: false,
            subdirs_support: false,
            settings_vars: SettingsFileVars::legacy(),
        }
    }

    pub fn with_subdirs_support(mut self) -> Self {
        self.subdirs_support = true;
        self
    }

    pub fn with_api_version(mut self, version: u16) -> Self {
        self.api_version = version;
        self
    }
}

/// Database credentials for exactly one site.
///
/// The password is held as a [`SecretString`] so it cannot leak through
/// `Debug` output and is zeroized on drop; rendering code exposes it only at
/// the sanctioned embedding points.
#[derive(Debug, Clone, Deserialize)]
pub struct DbCredentials {
    /// Database engine type, e.g. `mysql`.
    pub kind: String,
    pub name: String,
    pub user: String,
    pub password: SecretString,
    pub host: String,
    pub port: u16,
}

impl DbCredentials {
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            user: user.into(),
            password: SecretString::new(password.into()),
            host: host.into(),
            port,
        }
    }
}

/// TLS material for a site.
///
/// A render that requests TLS but has no private key silently omits the TLS
/// block rather than failing; the key is therefore optional here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsMaterial {
    pub certificate: PathBuf,
    pub key: Option<PathBuf>,
    pub chain: Option<PathBuf>,
}

impl TlsMaterial {
    pub fn new(certificate: impl Into<PathBuf>) -> Self {
        Self {
            certificate: certificate.into(),
            key: None,
            chain: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<PathBuf>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_chain(mut self, chain: impl Into<PathBuf>) -> Self {
        self.chain = Some(chain.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_engine_roundtrip() {
        assert_eq!(WebEngine::from_str("Apache"), Some(WebEngine::Apache));
        assert_eq!(WebEngine::from_str("nginx"), Some(WebEngine::Nginx));
        assert_eq!(WebEngine::from_str("iis"), None);
        assert_eq!(WebEngine::Nginx.as_str(), "nginx");
    }

    #[test]
    fn test_site_builder() {
        let site = Site::new("example.com")
            .with_alias("www.example.com")
            .with_alias("example.org")
            .with_redirection("www.example.com")
            .with_mail("admin@example.com");

        assert_eq!(site.uri, "example.com");
        assert_eq!(site.aliases.len(), 2);
        assert_eq!(site.redirection.as_deref(), Some("www.example.com"));
        assert!(site.enabled);
    }

    #[test]
    fn test_password_is_redacted_in_debug() {
        let creds = DbCredentials::new("mysql", "db", "user", "s3cret", "localhost", 3306);
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_site_deserializes_from_record_json() {
        let json = r#"{
            "id": "8f7f0f6e-2a5b-4a8e-9d35-0a4f2f4a2f10",
            "uri": "example.com",
            "aliases": ["www.example.com"],
            "profile": "standard",
            "enabled": true,
            "redirection": null,
            "subdirs": false,
            "mail": null,
            "extra_config": null,
            "backup_in_progress": false,
            "created_at": "2024-05-01T12:00:00Z",
            "updated_at": "2024-05-01T12:00:00Z"
        }"#;
        let site: Site = serde_json::from_str(json).unwrap();
        assert_eq!(site.uri, "example.com");
        assert_eq!(site.aliases, vec!["www.example.com"]);
    }
}
