use crate::vestibule::auth::{config::DEFAULT_PROTECTED_PREFIXES, AuthConfig};
use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_COOKIE_NAME: &str = "session-cookie-name";
pub const ARG_SESSION_MAX_AGE_SECONDS: &str = "session-max-age-seconds";
pub const ARG_ADMIN_EMAILS: &str = "admin-emails";
pub const ARG_PRODUCTION: &str = "production";
pub const ARG_COOKIE_DOMAIN: &str = "cookie-domain";
pub const ARG_REQUIRE_ADMIN: &str = "require-admin";
pub const ARG_REQUIRE_EMAIL_VERIFIED: &str = "require-email-verified";
pub const ARG_CHECK_REVOKED: &str = "check-revoked";
pub const ARG_PROTECTED_PREFIXES: &str = "protected-prefixes";

#[derive(Debug, Clone)]
pub struct Options {
    pub session_cookie_name: String,
    pub session_max_age_seconds: u64,
    pub admin_emails: String,
    pub production: bool,
    pub cookie_domain: Option<String>,
    pub require_admin: bool,
    pub require_email_verified: bool,
    pub check_revoked: bool,
    pub protected_prefixes: Vec<String>,
}

impl Options {
    /// Parse session and cookie arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the session cookie name is empty.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let session_cookie_name = matches
            .get_one::<String>(ARG_SESSION_COOKIE_NAME)
            .map(|name| name.trim().to_string())
            .unwrap_or_default();
        if session_cookie_name.is_empty() {
            anyhow::bail!("--{ARG_SESSION_COOKIE_NAME} must not be empty");
        }

        let flag = |id: &str, default: bool| {
            matches.get_one::<bool>(id).copied().unwrap_or(default)
        };

        Ok(Self {
            session_cookie_name,
            session_max_age_seconds: matches
                .get_one::<u64>(ARG_SESSION_MAX_AGE_SECONDS)
                .copied()
                .unwrap_or(432_000),
            admin_emails: matches
                .get_one::<String>(ARG_ADMIN_EMAILS)
                .cloned()
                .unwrap_or_default(),
            production: flag(ARG_PRODUCTION, false),
            cookie_domain: matches
                .get_one::<String>(ARG_COOKIE_DOMAIN)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            require_admin: flag(ARG_REQUIRE_ADMIN, true),
            require_email_verified: flag(ARG_REQUIRE_EMAIL_VERIFIED, true),
            check_revoked: flag(ARG_CHECK_REVOKED, true),
            protected_prefixes: matches
                .get_many::<String>(ARG_PROTECTED_PREFIXES)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn into_config(self) -> AuthConfig {
        AuthConfig::new()
            .with_session_cookie_name(self.session_cookie_name)
            .with_session_max_age_seconds(self.session_max_age_seconds)
            .with_admin_emails(&self.admin_emails)
            .with_production(self.production)
            .with_cookie_domain(self.cookie_domain)
            .with_require_admin(self.require_admin)
            .with_require_email_verified(self.require_email_verified)
            .with_check_revoked(self.check_revoked)
            .with_protected_prefixes(self.protected_prefixes)
    }
}

fn bool_arg(id: &'static str, default: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .num_args(0..=1)
        .default_value(default)
        .default_missing_value("true")
        .value_parser(BoolishValueParser::new())
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_policy_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_COOKIE_NAME)
                .long(ARG_SESSION_COOKIE_NAME)
                .help("Name of the session cookie")
                .env("VESTIBULE_SESSION_COOKIE_NAME")
                .default_value("__session"),
        )
        .arg(
            Arg::new(ARG_SESSION_MAX_AGE_SECONDS)
                .long(ARG_SESSION_MAX_AGE_SECONDS)
                .help("Session lifetime in seconds")
                .env("VESTIBULE_SESSION_MAX_AGE_SECONDS")
                .default_value("432000")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            bool_arg(ARG_PRODUCTION, "false")
                .help("Production mode: Secure cookies scoped to --cookie-domain")
                .env("VESTIBULE_PRODUCTION"),
        )
        .arg(
            Arg::new(ARG_COOKIE_DOMAIN)
                .long(ARG_COOKIE_DOMAIN)
                .help("Cookie Domain attribute, applied only in production")
                .env("VESTIBULE_COOKIE_DOMAIN"),
        )
}

fn with_policy_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMIN_EMAILS)
                .long(ARG_ADMIN_EMAILS)
                .help("Comma-separated emails that are always admin")
                .env("VESTIBULE_ADMIN_EMAILS"),
        )
        .arg(
            bool_arg(ARG_REQUIRE_ADMIN, "true")
                .help("Only admins may sign in")
                .env("VESTIBULE_REQUIRE_ADMIN"),
        )
        .arg(
            bool_arg(ARG_REQUIRE_EMAIL_VERIFIED, "true")
                .help("Refuse sign-in for unverified emails")
                .env("VESTIBULE_REQUIRE_EMAIL_VERIFIED"),
        )
        .arg(
            bool_arg(ARG_CHECK_REVOKED, "true")
                .help("Ask the identity authority to check revocation on session verification")
                .env("VESTIBULE_CHECK_REVOKED"),
        )
        .arg(
            Arg::new(ARG_PROTECTED_PREFIXES)
                .long(ARG_PROTECTED_PREFIXES)
                .help("Comma-separated path prefixes that require a session cookie")
                .env("VESTIBULE_PROTECTED_PREFIXES")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .default_values(DEFAULT_PROTECTED_PREFIXES),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV: [&str; 9] = [
        "VESTIBULE_SESSION_COOKIE_NAME",
        "VESTIBULE_SESSION_MAX_AGE_SECONDS",
        "VESTIBULE_ADMIN_EMAILS",
        "VESTIBULE_PRODUCTION",
        "VESTIBULE_COOKIE_DOMAIN",
        "VESTIBULE_REQUIRE_ADMIN",
        "VESTIBULE_REQUIRE_EMAIL_VERIFIED",
        "VESTIBULE_CHECK_REVOKED",
        "VESTIBULE_PROTECTED_PREFIXES",
    ];

    fn parse(args: &[&str]) -> anyhow::Result<Options> {
        let matches = with_args(Command::new("vestibule"))
            .try_get_matches_from(std::iter::once("vestibule").chain(args.iter().copied()))?;
        Options::parse(&matches)
    }

    #[test]
    fn defaults() -> anyhow::Result<()> {
        temp_env::with_vars_unset(ENV, || {
            let options = parse(&[])?;
            assert_eq!(options.session_cookie_name, "__session");
            assert_eq!(options.session_max_age_seconds, 432_000);
            assert_eq!(options.admin_emails, "");
            assert!(!options.production);
            assert_eq!(options.cookie_domain, None);
            assert!(options.require_admin);
            assert!(options.require_email_verified);
            assert!(options.check_revoked);
            assert_eq!(options.protected_prefixes, ["/admin", "/api/respond"]);
            Ok(())
        })
    }

    #[test]
    fn bool_flags_accept_bare_and_explicit_values() -> anyhow::Result<()> {
        temp_env::with_vars_unset(ENV, || {
            let options = parse(&[
                "--production",
                "--require-admin",
                "false",
                "--require-email-verified=no",
            ])?;
            assert!(options.production);
            assert!(!options.require_admin);
            assert!(!options.require_email_verified);
            Ok(())
        })
    }

    #[test]
    fn env_overrides() -> anyhow::Result<()> {
        temp_env::with_vars(
            [
                ("VESTIBULE_SESSION_COOKIE_NAME", Some("sid")),
                ("VESTIBULE_SESSION_MAX_AGE_SECONDS", Some("3600")),
                ("VESTIBULE_ADMIN_EMAILS", Some("Ops@X.com, dev@x.com")),
                ("VESTIBULE_PRODUCTION", Some("true")),
                ("VESTIBULE_COOKIE_DOMAIN", Some(".site.example")),
                ("VESTIBULE_REQUIRE_ADMIN", Some("0")),
                ("VESTIBULE_REQUIRE_EMAIL_VERIFIED", None),
                ("VESTIBULE_CHECK_REVOKED", Some("false")),
                ("VESTIBULE_PROTECTED_PREFIXES", Some("/dashboard,/api/private")),
            ],
            || {
                let config = parse(&[])?.into_config();
                assert_eq!(config.session_cookie_name(), "sid");
                assert_eq!(config.session_max_age_seconds(), 3600);
                assert!(config.admin_allowlist().contains("ops@x.com"));
                assert!(config.production());
                assert!(!config.check_revoked());
                assert!(!config.login_options().require_admin);
                assert!(config.login_options().require_email_verified);
                assert_eq!(config.protected_prefixes(), ["/dashboard", "/api/private"]);
                assert_eq!(
                    config.cookie_defaults().domain.as_deref(),
                    Some(".site.example")
                );
                Ok(())
            },
        )
    }

    #[test]
    fn empty_cookie_name_is_rejected() {
        temp_env::with_vars_unset(ENV, || {
            assert!(parse(&["--session-cookie-name", " "]).is_err());
        });
    }
}
