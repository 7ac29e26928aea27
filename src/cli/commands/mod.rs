pub mod auth;
pub mod authority;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const CMD_GRANT_ADMIN: &str = "grant-admin";
pub const ARG_EMAIL: &str = "email";

fn grant_admin() -> Command {
    Command::new(CMD_GRANT_ADMIN)
        .about("Set the admin custom claims on an existing user")
        .arg(
            Arg::new(ARG_EMAIL)
                .long(ARG_EMAIL)
                .help("Email of the user to promote")
                .required(true),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("vestibule")
        .about("Session authentication and edge request gating")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("VESTIBULE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .subcommand(grant_admin());

    let command = auth::with_args(command);
    let command = authority::with_args(command);
    logging::with_args(command)
}
