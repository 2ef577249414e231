//! Apache virtual-host templates.

use hostfab_render::{
    Field, FlagField, Fragment, Guard, Part, SeqField, Syntax, Template, TemplateFamily,
    TemplateKey, TemplateVariant,
};
use hostfab_spec::WebEngine;

fn key(variant: TemplateVariant) -> TemplateKey {
    TemplateKey::new(TemplateFamily::VirtualHost, WebEngine::Apache, variant)
}

fn tls_guard() -> Guard {
    Guard::all(vec![
        Guard::Flag(FlagField::SslEnabled),
        Guard::Present(Field::SslKey),
    ])
}

fn admin_line() -> Fragment {
    Fragment::when(
        Guard::Present(Field::SiteMail),
        vec![
            Fragment::line(vec![
                Part::lit("  ServerAdmin "),
                Part::field(Field::SiteMail, Syntax::Directive),
            ]),
            Fragment::text("\n"),
        ],
    )
}

/// `SetEnv` lines carrying the credential channel into the application.
fn credential_env() -> Vec<Fragment> {
    vec![
        Fragment::line(vec![
            Part::lit("  SetEnv db_type "),
            Part::field(Field::DbKind, Syntax::UrlToken),
        ]),
        Fragment::line(vec![
            Part::lit("  SetEnv db_name "),
            Part::field(Field::DbName, Syntax::UrlToken),
        ]),
        Fragment::line(vec![
            Part::lit("  SetEnv db_user "),
            Part::field(Field::DbUser, Syntax::UrlSegments),
        ]),
        Fragment::line(vec![
            Part::lit("  SetEnv db_passwd "),
            Part::field(Field::DbPassword, Syntax::UrlToken),
        ]),
        Fragment::line(vec![
            Part::lit("  SetEnv db_host "),
            Part::field(Field::DbHost, Syntax::UrlToken),
        ]),
        Fragment::line(vec![
            Part::lit("  SetEnv db_port "),
            Part::field(Field::DbPort, Syntax::UrlToken),
        ]),
    ]
}

fn alias_block() -> Fragment {
    Fragment::when(
        Guard::all(vec![
            Guard::not(Guard::Present(Field::Redirection)),
            Guard::NonEmpty(SeqField::Aliases),
        ]),
        vec![
            Fragment::for_each(
                SeqField::Aliases,
                vec![Fragment::line(vec![
                    Part::lit("  ServerAlias "),
                    Part::item(Syntax::Directive),
                ])],
            ),
            Fragment::text("\n"),
        ],
    )
}

/// The rewrite section. The redirect rules must precede the generic file
/// rewrites or they are shadowed.
fn rewrite_section(scheme: &'static str) -> Vec<Fragment> {
    vec![
        Fragment::text(
            "  <IfModule mod_rewrite.c>
    RewriteEngine on

    # Block form-value injection probes before they reach the application.
    RewriteCond %{QUERY_STRING} (.*)(23value|23default_value|element_parents=%23)(.*) [NC]
    RewriteCond %{REQUEST_METHOD} POST [NC]
    RewriteRule ^.*$ - [R=403,L]

",
        ),
        Fragment::when(
            Guard::Present(Field::Redirection),
            vec![
                Fragment::text("    # Redirect every other hostname to the canonical alias.\n"),
                Fragment::for_each(
                    SeqField::RedirectSources,
                    vec![
                        Fragment::line(vec![
                            Part::lit("    RewriteCond %{HTTP_HOST} ^"),
                            Part::item(Syntax::Directive),
                            Part::lit("$ [NC]"),
                        ]),
                        Fragment::line(vec![
                            Part::lit("    RewriteRule ^/*(.*)$ "),
                            Part::lit(scheme),
                            Part::lit("://"),
                            Part::field(Field::Redirection, Syntax::Directive),
                            Part::lit("/$1 [NE,L,R=301]"),
                        ]),
                    ],
                ),
                Fragment::text("\n"),
            ],
        ),
        Fragment::line(vec![
            Part::lit("    RewriteRule ^/files/(.*)$ /sites/"),
            Part::field(Field::Uri, Syntax::Directive),
            Part::lit("/files/$1 [L]"),
        ]),
        Fragment::line(vec![
            Part::lit("    RewriteCond "),
            Part::field(Field::SitePath, Syntax::PathArg),
            Part::lit("/files/robots.txt -f"),
        ]),
        Fragment::line(vec![
            Part::lit("    RewriteRule ^/robots.txt /sites/"),
            Part::field(Field::Uri, Syntax::Directive),
            Part::lit("/files/robots.txt [L]"),
        ]),
        Fragment::text("  </IfModule>\n\n"),
    ]
}

fn extra_block() -> Fragment {
    Fragment::when(
        Guard::Present(Field::ExtraConfig),
        vec![Fragment::verbatim(Field::ExtraConfig), Fragment::text("\n")],
    )
}

fn security_directories() -> Fragment {
    Fragment::text(
        "  # Never execute platform code from user-uploaded files.
  <Directory ~ \"sites/.*/files\">
    <Files *>
      SetHandler none
    </Files>
    Options None
    Options +FollowSymLinks
  </Directory>

  # Private files are served by the application, never directly.
  <Directory ~ \"sites/.*/private\">
    <Files *>
      SetHandler none
    </Files>
    Deny from all
    Options None
    Options +FollowSymLinks
  </Directory>

",
    )
}

/// The plain HTTP virtual host.
pub fn vhost() -> Template {
    let mut body = vec![
        Fragment::line(vec![
            Part::lit("<VirtualHost "),
            Part::field(Field::IpAddress, Syntax::Directive),
            Part::lit(":"),
            Part::field(Field::HttpPort, Syntax::Directive),
            Part::lit(">"),
        ]),
        Fragment::text("\n"),
        admin_line(),
        Fragment::line(vec![
            Part::lit("  DocumentRoot "),
            Part::field(Field::DocumentRoot, Syntax::PathArg),
        ]),
        Fragment::line(vec![
            Part::lit("  ServerName "),
            Part::field(Field::PrimaryName, Syntax::Directive),
        ]),
        Fragment::text("\n"),
    ];
    body.extend(credential_env());
    body.push(Fragment::text("\n"));
    body.push(alias_block());
    body.extend(rewrite_section("http"));
    body.push(extra_block());
    body.push(security_directories());
    body.push(Fragment::text("</VirtualHost>\n"));

    Template::new(key(TemplateVariant::Base), "2.3", body)
}

/// The TLS virtual host. Always expands the base variant after its own
/// block so the two cannot drift; the TLS block itself only appears when
/// TLS is enabled and a private key is present.
pub fn vhost_ssl() -> Template {
    let mut tls = vec![
        Fragment::line(vec![
            Part::lit("<VirtualHost "),
            Part::field(Field::IpAddress, Syntax::Directive),
            Part::lit(":"),
            Part::field(Field::HttpsPort, Syntax::Directive),
            Part::lit(">"),
        ]),
        Fragment::text("\n"),
        admin_line(),
        Fragment::text("  <IfModule mod_http2.c>\n    Protocols h2 http/1.1\n  </IfModule>\n\n"),
        Fragment::line(vec![
            Part::lit("  DocumentRoot "),
            Part::field(Field::DocumentRoot, Syntax::PathArg),
        ]),
        Fragment::line(vec![
            Part::lit("  ServerName "),
            Part::field(Field::PrimaryName, Syntax::Directive),
        ]),
        Fragment::text("\n"),
    ];
    tls.extend(credential_env());
    tls.push(Fragment::text("\n  SSLEngine on\n"));
    tls.push(Fragment::line(vec![
        Part::lit("  SSLCertificateFile "),
        Part::field(Field::SslCert, Syntax::PathArg),
    ]));
    tls.push(Fragment::line(vec![
        Part::lit("  SSLCertificateKeyFile "),
        Part::field(Field::SslKey, Syntax::PathArg),
    ]));
    tls.push(Fragment::when(
        Guard::Present(Field::SslChain),
        vec![Fragment::line(vec![
            Part::lit("  SSLCertificateChainFile "),
            Part::field(Field::SslChain, Syntax::PathArg),
        ])],
    ));
    tls.push(Fragment::text("\n"));
    tls.push(alias_block());
    tls.extend(rewrite_section("https"));
    tls.push(extra_block());
    tls.push(security_directories());
    tls.push(Fragment::text("</VirtualHost>\n\n"));

    Template::new(
        key(TemplateVariant::Ssl),
        "2.3",
        vec![
            Fragment::when(tls_guard(), tls),
            Fragment::include(key(TemplateVariant::Base)),
        ],
    )
}

/// Maintenance form of the virtual host for administratively disabled
/// sites: every hostname stays bound, nothing of the platform is served.
pub fn vhost_disabled() -> Template {
    let names = vec![
        Fragment::line(vec![
            Part::lit("  ServerName "),
            Part::field(Field::PrimaryName, Syntax::Directive),
        ]),
        Fragment::for_each(
            SeqField::Aliases,
            vec![Fragment::line(vec![
                Part::lit("  ServerAlias "),
                Part::item(Syntax::Directive),
            ])],
        ),
        Fragment::text("\n  # Administratively disabled: serve only the stock document root.\n"),
        Fragment::text("  DocumentRoot /var/www/html\n"),
    ];

    let mut tls = vec![
        Fragment::line(vec![
            Part::lit("<VirtualHost "),
            Part::field(Field::IpAddress, Syntax::Directive),
            Part::lit(":"),
            Part::field(Field::HttpsPort, Syntax::Directive),
            Part::lit(">"),
        ]),
        Fragment::text("\n"),
    ];
    tls.extend(names.clone());
    tls.push(Fragment::text("\n  SSLEngine on\n"));
    tls.push(Fragment::line(vec![
        Part::lit("  SSLCertificateFile "),
        Part::field(Field::SslCert, Syntax::PathArg),
    ]));
    tls.push(Fragment::line(vec![
        Part::lit("  SSLCertificateKeyFile "),
        Part::field(Field::SslKey, Syntax::PathArg),
    ]));
    tls.push(Fragment::text("</VirtualHost>\n\n"));

    let mut plain = vec![
        Fragment::line(vec![
            Part::lit("<VirtualHost "),
            Part::field(Field::IpAddress, Syntax::Directive),
            Part::lit(":"),
            Part::field(Field::HttpPort, Syntax::Directive),
            Part::lit(">"),
        ]),
        Fragment::text("\n"),
    ];
    plain.extend(names);
    plain.push(Fragment::text("</VirtualHost>\n"));

    let mut body = vec![Fragment::when(tls_guard(), tls)];
    body.extend(plain);

    Template::new(key(TemplateVariant::Disabled), "2.1", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_variant_includes_base() {
        let template = vhost_ssl();
        assert_eq!(template.includes(), vec![key(TemplateVariant::Base)]);
    }

    #[test]
    fn test_base_variant_has_no_includes() {
        assert!(vhost().includes().is_empty());
        assert!(vhost_disabled().includes().is_empty());
    }
}
