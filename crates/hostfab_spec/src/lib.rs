//! # hostfab_spec
//!
//! Site, server and platform records for hostfab.
//!
//! This crate defines the data contracts exchanged with the provisioning and
//! persistence collaborators: the per-site records (domain, aliases, TLS
//! material, database credentials, feature flags) and the immutable
//! [`RenderContext`] aggregate that the rendering engine consumes.
//!
//! ## Example
//!
//! ```rust
//! use hostfab_spec::{
//!     CloakMode, DbCredentials, Platform, RenderContext, Site, Server, TlsMaterial, WebEngine,
//! };
//!
//! let site = Site::new("example.com")
//!     .with_alias("www.example.com")
//!     .with_redirection("www.example.com");
//!
//! let server = Server::new("web1", WebEngine::Nginx, "203.0.113.10");
//! let platform = Platform::new("/var/platforms/app-7.x");
//! let creds = DbCredentials::new("mysql", "site_db", "site_user", "hunter2", "db1", 3306);
//!
//! let ctx = RenderContext::new(site, server, platform, creds)
//!     .with_tls(TlsMaterial::new("/etc/ssl/example.crt").with_key("/etc/ssl/example.key"))
//!     .with_ssl_enabled(true)
//!     .with_cloaking(CloakMode::Cloaked);
//!
//! assert_eq!(ctx.primary_name(), "www.example.com");
//! ```

pub mod context;
pub mod error;
pub mod models;
pub mod validator;

pub use context::RenderContext;
pub use error::{SpecError, SpecResult};
pub use models::{
    CloakMode, DbCredentials, Platform, Server, SettingsFileVars, Site, TlsMaterial, WebEngine,
};
pub use validator::{RecordValidator, ValidationResult};
