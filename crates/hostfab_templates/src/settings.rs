//! Application bootstrap settings template.
//!
//! Renders the per-site settings file the application loads on every
//! request. The credential section is the sharp edge: in cloaked mode the
//! file carries no credential literals and instructs the consumer to drain
//! the server-environment channel; in embedded mode the literals are
//! written through the source-string escaping policy.

use hostfab_render::{
    Field, FlagField, Fragment, Guard, Part, Syntax, Template, TemplateFamily, TemplateKey,
    TemplateVariant,
};
use hostfab_spec::WebEngine;

fn header() -> Vec<Fragment> {
    vec![
        Fragment::text("<?php\n\n/**\n * Generated bootstrap settings for a managed site.\n *\n"),
        Fragment::line(vec![
            Part::lit(" * Produced by hostfab "),
            Part::field(Field::GeneratorVersion, Syntax::Directive),
            Part::lit(". Regenerated on every verify or deploy;"),
        ]),
        Fragment::text(" * manual changes will be overwritten.\n */\n\n"),
    ]
}

fn subdirs_block() -> Fragment {
    Fragment::when(
        Guard::all(vec![
            Guard::Flag(FlagField::SubdirsSupported),
            Guard::Flag(FlagField::SubdirsRequested),
        ]),
        vec![Fragment::text(
            "// Subdirectory mode: the public base URL is only known at request time.
if (isset($_SERVER['SITE_SUBDIR']) && isset($_SERVER['RAW_HOST'])) {
  $base_url = 'http://' . $_SERVER['RAW_HOST'] . '/' . $_SERVER['SITE_SUBDIR'];
}

",
        )],
    )
}

fn cloaked_credentials() -> Vec<Fragment> {
    vec![Fragment::text(
        "// Database credentials arrive through the web server's environment
// parameters instead of living in this file, where any administrator of a
// co-hosted site could read them.
if (isset($_SERVER['db_name'])) {
  $databases['default']['default'] = array(
    'driver' => $_SERVER['db_type'],
    'database' => $_SERVER['db_name'],
    'username' => $_SERVER['db_user'],
    'password' => $_SERVER['db_passwd'],
    'host' => $_SERVER['db_host'],
    'port' => (string) $_SERVER['db_port'],
  );
  $db_url['default'] = $_SERVER['db_type'] . '://' . $_SERVER['db_user'] . ':' . $_SERVER['db_passwd'] . '@' . $_SERVER['db_host'] . ':' . $_SERVER['db_port'] . '/' . $_SERVER['db_name'];
}

// The channel is single-use: drop every copy, the duplicate REDIRECT_
// echoes included, so nothing lingers in reflected environment dumps.
if (function_exists('apache_setenv')) {
  apache_setenv('db_type', null);
  apache_setenv('db_name', null);
  apache_setenv('db_user', null);
  apache_setenv('db_passwd', null);
  apache_setenv('db_host', null);
  apache_setenv('db_port', null);
  apache_setenv('REDIRECT_db_type', null);
  apache_setenv('REDIRECT_db_name', null);
  apache_setenv('REDIRECT_db_user', null);
  apache_setenv('REDIRECT_db_passwd', null);
  apache_setenv('REDIRECT_db_host', null);
  apache_setenv('REDIRECT_db_port', null);
}
unset($_SERVER['db_type']);
unset($_SERVER['db_name']);
unset($_SERVER['db_user']);
unset($_SERVER['db_passwd']);
unset($_SERVER['db_host']);
unset($_SERVER['db_port']);
unset($_SERVER['REDIRECT_db_type']);
unset($_SERVER['REDIRECT_db_name']);
unset($_SERVER['REDIRECT_db_user']);
unset($_SERVER['REDIRECT_db_passwd']);
unset($_SERVER['REDIRECT_db_host']);
unset($_SERVER['REDIRECT_db_port']);

",
    )]
}

fn embedded_credentials() -> Vec<Fragment> {
    vec![
        Fragment::text("$databases['default']['default'] = array(\n"),
        Fragment::line(vec![
            Part::lit("  'driver' => '"),
            Part::field(Field::DbKind, Syntax::SourceString),
            Part::lit("',"),
        ]),
        Fragment::line(vec![
            Part::lit("  'database' => '"),
            Part::field(Field::DbName, Syntax::SourceString),
            Part::lit("',"),
        ]),
        Fragment::line(vec![
            Part::lit("  'username' => '"),
            Part::field(Field::DbUser, Syntax::SourceString),
            Part::lit("',"),
        ]),
        Fragment::line(vec![
            Part::lit("  'password' => '"),
            Part::field(Field::DbPassword, Syntax::SourceString),
            Part::lit("',"),
        ]),
        Fragment::line(vec![
            Part::lit("  'host' => '"),
            Part::field(Field::DbHost, Syntax::SourceString),
            Part::lit("',"),
        ]),
        Fragment::line(vec![
            Part::lit("  'port' => '"),
            Part::field(Field::DbPort, Syntax::SourceString),
            Part::lit("',"),
        ]),
        Fragment::text(");\n"),
        Fragment::line(vec![
            Part::lit("$db_url['default'] = '"),
            Part::field(Field::CredentialUrl, Syntax::SourceString),
            Part::lit("';"),
        ]),
        Fragment::text("\n"),
    ]
}

fn profile_block() -> Vec<Fragment> {
    vec![
        Fragment::line(vec![
            Part::lit("$profile = '"),
            Part::field(Field::Profile, Syntax::SourceString),
            Part::lit("';"),
        ]),
        Fragment::line(vec![
            Part::lit("$install_profile = '"),
            Part::field(Field::Profile, Syntax::SourceString),
            Part::lit("';"),
        ]),
        Fragment::text("\n"),
    ]
}

fn runtime_block() -> Fragment {
    Fragment::text(
        "@ini_set('session.cache_expire', 200000);
@ini_set('session.cache_limiter', 'none');
@ini_set('session.cookie_lifetime', 0);
@ini_set('session.gc_maxlifetime', 200000);
@ini_set('session.use_only_cookies', 1);
@ini_set('session.use_trans_sid', 0);

// New directories must stay group-writable for the deployment user.
umask(0002);

",
    )
}

fn conf_block() -> Vec<Fragment> {
    vec![
        Fragment::text("global $conf;\n"),
        Fragment::line(vec![
            Part::lit("$conf['install_profile'] = '"),
            Part::field(Field::Profile, Syntax::SourceString),
            Part::lit("';"),
        ]),
        Fragment::line(vec![
            Part::lit("$conf['"),
            Part::field(Field::FilePublicVar, Syntax::SourceString),
            Part::lit("'] = 'sites/"),
            Part::field(Field::Uri, Syntax::SourceString),
            Part::lit("/files';"),
        ]),
        Fragment::line(vec![
            Part::lit("$conf['"),
            Part::field(Field::FileTempVar, Syntax::SourceString),
            Part::lit("'] = 'sites/"),
            Part::field(Field::Uri, Syntax::SourceString),
            Part::lit("/private/temp';"),
        ]),
        Fragment::when(
            Guard::Present(Field::FilePrivateVar),
            vec![Fragment::line(vec![
                Part::lit("$conf['"),
                Part::field(Field::FilePrivateVar, Syntax::SourceString),
                Part::lit("'] = 'sites/"),
                Part::field(Field::Uri, Syntax::SourceString),
                Part::lit("/private/files';"),
            ])],
        ),
        Fragment::when(
            Guard::Flag(FlagField::HashSaltRequired),
            vec![Fragment::text("$conf['hash_salt'] = '';\n")],
        ),
        Fragment::text("$conf['clean_url'] = 1;\n"),
        Fragment::line(vec![
            Part::lit("$conf['hosting_api_version'] = "),
            Part::field(Field::ApiVersion, Syntax::Directive),
            Part::lit(";"),
        ]),
        Fragment::text("$conf['allow_authorize_operations'] = FALSE;\n"),
        Fragment::text(
            "// Nginx caches the admin menu unless the client cache is off.\n$conf['admin_menu_cache_client'] = FALSE;\n\n",
        ),
    ]
}

/// Exactly one of the two offline flags, matching what the platform
/// generation understands.
fn offline_block() -> Fragment {
    Fragment::when(
        Guard::not(Guard::Flag(FlagField::SiteEnabled)),
        vec![Fragment::either(
            Guard::Flag(FlagField::MaintenanceCapable),
            vec![Fragment::text("$conf['maintenance_mode'] = 1;\n\n")],
            vec![Fragment::text("$conf['site_offline'] = 1;\n\n")],
        )],
    )
}

fn extra_block() -> Fragment {
    Fragment::when(
        Guard::Present(Field::ExtraConfig),
        vec![Fragment::verbatim(Field::ExtraConfig), Fragment::text("\n")],
    )
}

fn includes_tail() -> Vec<Fragment> {
    vec![
        Fragment::text("// Host-wide overrides, included only when present on the server.\n"),
        Fragment::line(vec![
            Part::lit("if (is_readable('"),
            Part::field(Field::IncludePath, Syntax::SourceString),
            Part::lit("/global.inc')) {"),
        ]),
        Fragment::line(vec![
            Part::lit("  include_once('"),
            Part::field(Field::IncludePath, Syntax::SourceString),
            Part::lit("/global.inc');"),
        ]),
        Fragment::text("}\n\n// Site-local overrides.\n"),
        Fragment::line(vec![
            Part::lit("if (is_readable('"),
            Part::field(Field::SitePath, Syntax::SourceString),
            Part::lit("/local.settings.php')) {"),
        ]),
        Fragment::line(vec![
            Part::lit("  include_once('"),
            Part::field(Field::SitePath, Syntax::SourceString),
            Part::lit("/local.settings.php');"),
        ]),
        Fragment::text("}\n"),
    ]
}

/// The bootstrap settings file. Identical composition for both engines;
/// registered per engine so the selector triple stays uniform.
pub fn app_settings(engine: WebEngine) -> Template {
    let mut body = header();
    body.push(subdirs_block());
    body.push(Fragment::either(
        Guard::Flag(FlagField::Cloaked),
        cloaked_credentials(),
        embedded_credentials(),
    ));
    body.extend(profile_block());
    body.push(runtime_block());
    body.extend(conf_block());
    body.push(offline_block());
    body.push(extra_block());
    body.extend(includes_tail());

    Template::new(
        TemplateKey::new(TemplateFamily::AppSettings, engine, TemplateVariant::Base),
        "3.1",
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_registered_per_engine() {
        let apache = app_settings(WebEngine::Apache);
        let nginx = app_settings(WebEngine::Nginx);
        assert_eq!(apache.key.engine, WebEngine::Apache);
        assert_eq!(nginx.key.engine, WebEngine::Nginx);
        assert!(apache.includes().is_empty());
    }
}
