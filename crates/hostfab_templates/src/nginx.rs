//! Nginx virtual-host templates.

use hostfab_render::{
    Field, FlagField, Fragment, Guard, Part, SeqField, Syntax, Template, TemplateFamily,
    TemplateKey, TemplateVariant,
};
use hostfab_spec::WebEngine;

fn key(variant: TemplateVariant) -> TemplateKey {
    TemplateKey::new(TemplateFamily::VirtualHost, WebEngine::Nginx, variant)
}

fn tls_guard() -> Guard {
    Guard::all(vec![
        Guard::Flag(FlagField::SslEnabled),
        Guard::Present(Field::SslKey),
    ])
}

fn listen_line(port: Field, tls: bool) -> Fragment {
    Fragment::line(vec![
        Part::lit("  listen        "),
        Part::field(Field::IpAddress, Syntax::Directive),
        Part::lit(":"),
        Part::field(port, Syntax::Directive),
        Part::lit(if tls { " ssl;" } else { ";" }),
    ])
}

fn ssl_directives() -> Vec<Fragment> {
    vec![
        Fragment::line(vec![
            Part::lit("  ssl_certificate            "),
            Part::field(Field::SslCert, Syntax::PathArg),
            Part::lit(";"),
        ]),
        Fragment::line(vec![
            Part::lit("  ssl_certificate_key        "),
            Part::field(Field::SslKey, Syntax::PathArg),
            Part::lit(";"),
        ]),
        Fragment::text(
            "  ssl_protocols              TLSv1.2 TLSv1.3;
  ssl_prefer_server_ciphers  on;
  keepalive_timeout          70;
",
        ),
    ]
}

/// `fastcgi_param` lines carrying the credential channel into the
/// application.
fn credential_params() -> Vec<Fragment> {
    vec![
        Fragment::line(vec![
            Part::lit("  fastcgi_param db_type   "),
            Part::field(Field::DbKind, Syntax::UrlToken),
            Part::lit(";"),
        ]),
        Fragment::line(vec![
            Part::lit("  fastcgi_param db_name   "),
            Part::field(Field::DbName, Syntax::UrlToken),
            Part::lit(";"),
        ]),
        Fragment::line(vec![
            Part::lit("  fastcgi_param db_user   "),
            Part::field(Field::DbUser, Syntax::UrlSegments),
            Part::lit(";"),
        ]),
        Fragment::line(vec![
            Part::lit("  fastcgi_param db_passwd "),
            Part::field(Field::DbPassword, Syntax::UrlToken),
            Part::lit(";"),
        ]),
        Fragment::line(vec![
            Part::lit("  fastcgi_param db_host   "),
            Part::field(Field::DbHost, Syntax::UrlToken),
            Part::lit(";"),
        ]),
        Fragment::line(vec![
            Part::lit("  fastcgi_param db_port   "),
            Part::field(Field::DbPort, Syntax::UrlToken),
            Part::lit(";"),
        ]),
    ]
}

/// One redirect server block per hostname that is not the redirection
/// target. Emitted before the main server block so the permanent
/// redirects win.
fn redirect_servers(port: Field, tls: bool, scheme: &'static str) -> Fragment {
    let mut body = vec![
        Fragment::text("server {\n"),
        listen_line(port, tls),
        Fragment::line(vec![
            Part::lit("  server_name   "),
            Part::item(Syntax::Directive),
            Part::lit(";"),
        ]),
    ];
    if tls {
        body.extend(ssl_directives());
    }
    body.push(Fragment::line(vec![
        Part::lit("  rewrite ^ "),
        Part::lit(scheme),
        Part::lit("://"),
        Part::field(Field::Redirection, Syntax::Directive),
        Part::lit("$request_uri? permanent;"),
    ]));
    body.push(Fragment::text("}\n\n"));

    Fragment::when(
        Guard::Present(Field::Redirection),
        vec![Fragment::for_each(SeqField::RedirectSources, body)],
    )
}

/// Without redirection every alias joins `server_name`; with redirection
/// only the canonical alias is bound here.
fn server_name_line() -> Fragment {
    Fragment::either(
        Guard::Present(Field::Redirection),
        vec![Fragment::line(vec![
            Part::lit("  server_name   "),
            Part::field(Field::PrimaryName, Syntax::Directive),
            Part::lit(";"),
        ])],
        vec![Fragment::line(vec![
            Part::lit("  server_name   "),
            Part::field(Field::PrimaryName, Syntax::Directive),
            Part::each(SeqField::Aliases, Syntax::Directive),
            Part::lit(";"),
        ])],
    )
}

fn extra_block() -> Fragment {
    Fragment::when(
        Guard::Present(Field::ExtraConfig),
        vec![Fragment::verbatim(Field::ExtraConfig)],
    )
}

/// The plain HTTP server block.
pub fn vhost() -> Template {
    let mut body = vec![
        redirect_servers(Field::HttpPort, false, "http"),
        Fragment::text(
            "server {\n  include       fastcgi_params;\n  fastcgi_param SCRIPT_FILENAME $document_root$fastcgi_script_name;\n",
        ),
    ];
    body.extend(credential_params());
    body.push(listen_line(Field::HttpPort, false));
    body.push(server_name_line());
    body.push(Fragment::line(vec![
        Part::lit("  root          "),
        Part::field(Field::DocumentRoot, Syntax::PathArg),
        Part::lit(";"),
    ]));
    body.push(extra_block());
    body.push(Fragment::line(vec![
        Part::lit("  include       "),
        Part::field(Field::IncludePath, Syntax::PathArg),
        Part::lit("/nginx_vhost_common.conf;"),
    ]));
    body.push(Fragment::text("}\n"));

    Template::new(key(TemplateVariant::Base), "2.3", body)
}

/// The TLS server blocks. Expands the base variant in the middle so the
/// plain HTTP host is always emitted too; every TLS block is guarded on
/// TLS being enabled with a private key present.
pub fn vhost_ssl() -> Template {
    let mut main = vec![
        redirect_servers(Field::HttpsPort, true, "https"),
        Fragment::text(
            "server {\n  include       fastcgi_params;\n  fastcgi_param SCRIPT_FILENAME $document_root$fastcgi_script_name;\n  fastcgi_param HTTPS on;\n",
        ),
    ];
    main.extend(credential_params());
    main.push(listen_line(Field::HttpsPort, true));
    main.push(server_name_line());
    main.push(Fragment::line(vec![
        Part::lit("  root          "),
        Part::field(Field::DocumentRoot, Syntax::PathArg),
        Part::lit(";"),
    ]));
    main.extend(ssl_directives());
    main.push(extra_block());
    main.push(Fragment::line(vec![
        Part::lit("  include       "),
        Part::field(Field::IncludePath, Syntax::PathArg),
        Part::lit("/nginx_vhost_common.conf;"),
    ]));
    main.push(Fragment::text("}\n\n"));

    Template::new(
        key(TemplateVariant::Ssl),
        "2.3",
        vec![
            Fragment::when(tls_guard(), main),
            Fragment::include(key(TemplateVariant::Base)),
        ],
    )
}

/// Maintenance form for administratively disabled sites: all hostnames
/// stay bound, only the stock default root is served.
pub fn vhost_disabled() -> Template {
    let names = Fragment::line(vec![
        Part::lit("  server_name   "),
        Part::field(Field::Uri, Syntax::Directive),
        Part::each(SeqField::Aliases, Syntax::Directive),
        Part::lit(";"),
    ]);

    let mut tls = vec![
        Fragment::text("server {\n"),
        Fragment::line(vec![
            Part::lit("  include       "),
            Part::field(Field::IncludePath, Syntax::PathArg),
            Part::lit("/fastcgi_ssl_params.conf;"),
        ]),
        listen_line(Field::HttpsPort, true),
        names.clone(),
    ];
    tls.extend(ssl_directives());
    tls.push(Fragment::text(
        "  root          /var/www/nginx-default;\n  index         index.html index.htm;\n  # Keep the control-plane hostname out of this block.\n}\n\n",
    ));

    let plain = vec![
        Fragment::text("server {\n"),
        listen_line(Field::HttpPort, false),
        names,
        Fragment::text(
            "  root          /var/www/nginx-default;\n  index         index.html index.htm;\n}\n",
        ),
    ];

    let mut body = vec![Fragment::when(tls_guard(), tls)];
    body.extend(plain);

    Template::new(key(TemplateVariant::Disabled), "2.1", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssl_variant_includes_base() {
        assert_eq!(vhost_ssl().includes(), vec![key(TemplateVariant::Base)]);
    }

    #[test]
    fn test_base_variant_has_no_includes() {
        assert!(vhost().includes().is_empty());
        assert!(vhost_disabled().includes().is_empty());
    }
}
