//! Credential delivery: the indirection channel and its lifecycle.
//!
//! In cloaked mode the bootstrap settings artifact carries no credential
//! literals; the web server hands them to the application through six named
//! environment parameters which the consumer reads once and then clears,
//! duplicate echoes included. The renderer's side of that contract is
//! write-then-instruct-clear; it never reads the channel.

use std::collections::HashMap;

use secrecy::ExposeSecret;
use zeroize::Zeroizing;

use hostfab_spec::DbCredentials;

use crate::encode::{decode_at_segments, encode_at_segments, url_decode, url_encode};

/// The six keys of the server-environment credential channel.
pub const CHANNEL_KEYS: [&str; 6] = [
    "db_type", "db_name", "db_user", "db_passwd", "db_host", "db_port",
];

/// Server modules echo environment entries under this duplicate prefix; the
/// clear step must cover both copies.
pub const REDIRECT_PREFIX: &str = "REDIRECT_";

/// Key/value store standing in for the consumer's process environment.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialChannel {
    fn set(&mut self, key: &str, value: &str);
    fn take(&mut self, key: &str) -> Option<String>;
    fn clear(&mut self, key: &str);
}

/// In-memory channel whose stored values are zeroized when cleared or
/// dropped, mirroring the lifecycle the settings artifact instructs on the
/// real consumer.
#[derive(Default)]
pub struct EnvChannel {
    vars: HashMap<String, Zeroizing<String>>,
}

impl EnvChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Whether any stored value equals `needle`. Test hook for the
    /// non-observability property.
    pub fn contains_value(&self, needle: &str) -> bool {
        self.vars.values().any(|v| v.as_str() == needle)
    }
}

impl CredentialChannel for EnvChannel {
    fn set(&mut self, key: &str, value: &str) {
        self.vars
            .insert(key.to_string(), Zeroizing::new(value.to_string()));
    }

    fn take(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key).map(|v| v.to_string())
    }

    fn clear(&mut self, key: &str) {
        self.vars.remove(key);
    }
}

/// The URL-encoded key/value pairs a virtual-host render writes into the
/// channel. Matches the `SetEnv`/`fastcgi_param` lines of the vhost
/// templates byte for byte.
pub fn channel_writes(creds: &DbCredentials) -> Vec<(&'static str, String)> {
    vec![
        ("db_type", url_encode(&creds.kind)),
        ("db_name", url_encode(&creds.name)),
        ("db_user", encode_at_segments(&creds.user)),
        ("db_passwd", url_encode(creds.password.expose_secret())),
        ("db_host", url_encode(&creds.host)),
        ("db_port", url_encode(&creds.port.to_string())),
    ]
}

/// Load a channel the way a web server loads the vhost's environment
/// parameters, including the duplicate-prefixed echoes.
pub fn seed_channel(channel: &mut dyn CredentialChannel, creds: &DbCredentials) {
    for (key, value) in channel_writes(creds) {
        channel.set(key, &value);
        channel.set(&format!("{REDIRECT_PREFIX}{key}"), &value);
    }
}

/// Credentials as decoded by the consuming runtime.
pub struct BootstrapCredentials {
    pub kind: String,
    pub name: String,
    pub user: String,
    pub password: Zeroizing<String>,
    pub host: String,
    pub port: u16,
}

/// Consumer side of the channel contract: read each key once, then clear
/// every copy, duplicate echoes included.
///
/// Returns `None` when the channel does not carry a complete credential
/// set; the channel is cleared either way.
pub fn consume_channel(channel: &mut dyn CredentialChannel) -> Option<BootstrapCredentials> {
    let taken: Vec<Option<String>> = CHANNEL_KEYS
        .iter()
        .map(|key| channel.take(key))
        .collect();

    for key in CHANNEL_KEYS {
        channel.clear(key);
        channel.clear(&format!("{REDIRECT_PREFIX}{key}"));
    }

    let mut values = taken.into_iter();
    let kind = url_decode(&values.next()??)?;
    let name = url_decode(&values.next()??)?;
    let user = decode_at_segments(&values.next()??)?;
    let password = Zeroizing::new(url_decode(&values.next()??)?);
    let host = url_decode(&values.next()??)?;
    let port = url_decode(&values.next()??)?.parse().ok()?;

    Some(BootstrapCredentials {
        kind,
        name,
        user,
        password,
        host,
        port,
    })
}

/// Combined credential URL for embedded-mode settings artifacts.
///
/// The username is encoded per `@`-segment so the consumer's
/// outermost-`@` split stays unambiguous even for usernames containing
/// `@`; the remaining components are plain URL tokens.
pub fn credential_url(creds: &DbCredentials) -> String {
    format!(
        "{}://{}:{}@{}:{}/{}",
        creds.kind,
        encode_at_segments(&creds.user),
        url_encode(creds.password.expose_secret()),
        url_encode(&creds.host),
        creds.port,
        url_encode(&creds.name),
    )
}

/// Credential URL components as the consumer decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCredentialUrl {
    pub kind: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

/// Decode a [`credential_url`] by splitting userinfo on the outermost `@`.
pub fn parse_credential_url(url: &str) -> Option<ParsedCredentialUrl> {
    let (kind, rest) = url.split_once("://")?;
    let (userinfo, location) = rest.rsplit_once('@')?;
    // Encoded user segments cannot contain ':', so the first one starts
    // the password.
    let (user, password) = userinfo.split_once(':')?;
    let (host, port_and_name) = location.split_once(':')?;
    let (port, name) = port_and_name.split_once('/')?;

    Some(ParsedCredentialUrl {
        kind: kind.to_string(),
        user: decode_at_segments(user)?,
        password: url_decode(password)?,
        host: url_decode(host)?,
        port: port.parse().ok()?,
        name: url_decode(name)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn creds() -> DbCredentials {
        DbCredentials::new("mysql", "site_db", "owner@db1", "p@ss w0rd", "localhost", 3306)
    }

    #[test]
    fn test_channel_writes_are_url_encoded() {
        let writes = channel_writes(&creds());
        let passwd = &writes.iter().find(|(k, _)| *k == "db_passwd").unwrap().1;
        assert_eq!(passwd, "p%40ss%20w0rd");

        // Username keeps its separator visible, segments encoded.
        let user = &writes.iter().find(|(k, _)| *k == "db_user").unwrap().1;
        assert_eq!(user, "owner@db1");
    }

    #[test]
    fn test_seed_writes_both_copies() {
        let mut mock = MockCredentialChannel::new();
        for (key, _) in channel_writes(&creds()) {
            mock.expect_set()
                .with(eq(key), mockall::predicate::always())
                .times(1)
                .return_const(());
            let echoed = format!("{REDIRECT_PREFIX}{key}");
            mock.expect_set()
                .withf(move |k, _| k == echoed)
                .times(1)
                .return_const(());
        }

        seed_channel(&mut mock, &creds());
    }

    #[test]
    fn test_consume_clears_every_copy() {
        let mut channel = EnvChannel::new();
        seed_channel(&mut channel, &creds());

        let decoded = consume_channel(&mut channel).unwrap();
        assert_eq!(decoded.user, "owner@db1");
        assert_eq!(decoded.password.as_str(), "p@ss w0rd");
        assert_eq!(decoded.port, 3306);

        assert!(channel.is_empty());
        assert!(!channel.contains_value("p%40ss%20w0rd"));
    }

    #[test]
    fn test_consume_incomplete_channel_still_clears() {
        let mut channel = EnvChannel::new();
        channel.set("db_type", "mysql");
        channel.set("REDIRECT_db_type", "mysql");

        assert!(consume_channel(&mut channel).is_none());
        assert!(channel.is_empty());
    }

    #[test]
    fn test_credential_url_roundtrip_with_multi_at_user() {
        let creds = DbCredentials::new(
            "pgsql",
            "app",
            "user@tenant@realm",
            "sec:ret@pw",
            "db.internal",
            5432,
        );
        let url = credential_url(&creds);
        let parsed = parse_credential_url(&url).unwrap();

        assert_eq!(parsed.user, "user@tenant@realm");
        assert_eq!(parsed.password, "sec:ret@pw");
        assert_eq!(parsed.host, "db.internal");
        assert_eq!(parsed.name, "app");
    }
}
