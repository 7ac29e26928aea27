use crate::identity::AuthorityConfig;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_IDENTITY_AUTHORITY_URL: &str = "identity-authority-url";
pub const ARG_IDENTITY_AUTHORITY_API_KEY: &str = "identity-authority-api-key";
pub const ARG_IDENTITY_AUTHORITY_TIMEOUT_MS: &str = "identity-authority-timeout-ms";

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub api_key: Option<SecretString>,
    pub timeout_ms: u64,
}

impl Options {
    /// Parse identity authority arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the authority URL is missing or empty.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = match matches.get_one::<String>(ARG_IDENTITY_AUTHORITY_URL).cloned() {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => anyhow::bail!("missing required argument: --{ARG_IDENTITY_AUTHORITY_URL}"),
        };

        let api_key = matches
            .get_one::<String>(ARG_IDENTITY_AUTHORITY_API_KEY)
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::from(v.clone()));

        let timeout_ms = matches
            .get_one::<u64>(ARG_IDENTITY_AUTHORITY_TIMEOUT_MS)
            .copied()
            .unwrap_or(5000);

        Ok(Self {
            url,
            api_key,
            timeout_ms,
        })
    }

    #[must_use]
    pub fn into_config(self) -> AuthorityConfig {
        AuthorityConfig::new(self.url)
            .with_api_key(self.api_key)
            .with_timeout_ms(self.timeout_ms)
    }
}

// Global so `grant-admin` accepts them after the subcommand name.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_AUTHORITY_URL)
                .long(ARG_IDENTITY_AUTHORITY_URL)
                .help("Identity authority base URL")
                .long_help(
                    "Identity authority base URL. Identity tokens and session credentials \
                     are verified against it on every guarded request.",
                )
                .env("VESTIBULE_IDENTITY_AUTHORITY_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_IDENTITY_AUTHORITY_API_KEY)
                .long(ARG_IDENTITY_AUTHORITY_API_KEY)
                .help("Bearer credential sent to the identity authority")
                .env("VESTIBULE_IDENTITY_AUTHORITY_API_KEY")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_IDENTITY_AUTHORITY_TIMEOUT_MS)
                .long(ARG_IDENTITY_AUTHORITY_TIMEOUT_MS)
                .help("Total timeout for identity authority calls in milliseconds")
                .env("VESTIBULE_IDENTITY_AUTHORITY_TIMEOUT_MS")
                .default_value("5000")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
}
