//! Integration tests for record handling.

use hostfab_spec::{
    CloakMode, DbCredentials, Platform, RecordValidator, RenderContext, Server, Site, TlsMaterial,
    WebEngine,
};

fn context() -> RenderContext {
    let site = Site::new("shop.example.net")
        .with_alias("www.shop.example.net")
        .with_alias("shop.example.org")
        .with_redirection("www.shop.example.net")
        .with_mail("ops@example.net");
    let server = Server::new("web2", WebEngine::Nginx, "198.51.100.7").with_ports(8080, 8443);
    let platform = Platform::new("/var/platforms/commerce-7.x").with_subdirs_support();
    let creds = DbCredentials::new("mysql", "shop_db", "shop_user", "pw", "db2", 3306);

    RenderContext::new(site, server, platform, creds)
        .with_tls(TlsMaterial::new("/etc/ssl/shop.crt").with_key("/etc/ssl/shop.key"))
        .with_ssl_enabled(true)
        .with_cloaking(CloakMode::Cloaked)
}

#[test]
fn test_full_context_validates() {
    let validator = RecordValidator::new();
    let result = validator.validate_context(&context());

    assert!(result.valid, "errors: {:?}", result.errors);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
}

#[test]
fn test_context_derivations() {
    let ctx = context();

    assert_eq!(ctx.primary_name(), "www.shop.example.net");
    assert_eq!(
        ctx.redirect_sources(),
        vec!["shop.example.net", "shop.example.org"]
    );
    assert_eq!(
        ctx.site_path().to_str(),
        Some("/var/platforms/commerce-7.x/sites/shop.example.net")
    );
    assert_eq!(ctx.tls_key().and_then(|p| p.to_str()), Some("/etc/ssl/shop.key"));
}

#[test]
fn test_records_roundtrip_through_json() {
    let ctx = context();

    let json = serde_json::to_string(&ctx.site).unwrap();
    let site: Site = serde_json::from_str(&json).unwrap();
    assert_eq!(site.uri, ctx.site.uri);
    assert_eq!(site.aliases, ctx.site.aliases);
    assert_eq!(site.redirection, ctx.site.redirection);

    let json = serde_json::to_string(&ctx.server).unwrap();
    let server: Server = serde_json::from_str(&json).unwrap();
    assert_eq!(server.engine, WebEngine::Nginx);
    assert_eq!(server.https_port, 8443);
}

#[test]
fn test_credentials_deserialize_but_never_debug_print() {
    let json = r#"{
        "kind": "mysql",
        "name": "shop_db",
        "user": "shop_user",
        "password": "deeply-secret",
        "host": "db2",
        "port": 3306
    }"#;
    let creds: DbCredentials = serde_json::from_str(json).unwrap();

    assert_eq!(creds.user, "shop_user");
    assert!(!format!("{:?}", creds).contains("deeply-secret"));
}

#[test]
fn test_validator_rejects_malformed_records() {
    let validator = RecordValidator::new();

    let mut ctx = context();
    ctx.site.aliases.push("bad alias!".to_string());
    ctx.server.http_port = 0;

    let result = validator.validate_context(&ctx);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 2);
}
