//! Command-line driver for trying the flow against a running backend

use crate::models::{Credentials, RegistrationForm, Role};
use crate::navigation::Screen;
use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, ColorChoice, Command};
use secrecy::SecretString;

/// What the user asked the binary to do
#[derive(Debug)]
pub enum Action {
    Login(Credentials),
    Register(RegistrationForm),
    Google {
        token: SecretString,
        screen: Screen,
        paypal_client_id: Option<String>,
    },
    SignOut,
    Whoami,
}

#[must_use]
pub fn new() -> Command {
    Command::new("storefront-auth")
        .about("Sign in or sign up to the storefront with a password or a Google identity token")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("redirect")
                .long("redirect")
                .help("Path to continue to after signing in")
                .global(true)
                .default_value("/"),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in with email and password")
                .arg(email_arg())
                .arg(password_arg("password", "Password")),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account")
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Display name")
                        .required(true),
                )
                .arg(email_arg())
                .arg(password_arg("password", "Password"))
                .arg(password_arg("confirm-password", "Password again"))
                .arg(
                    Arg::new("role")
                        .long("role")
                        .help("Account role")
                        .value_parser(["buyer", "seller"])
                        .default_value("buyer"),
                )
                .arg(
                    Arg::new("paypal-client-id")
                        .long("paypal-client-id")
                        .help("PayPal client id for sellers (optional)"),
                ),
        )
        .subcommand(
            Command::new("google")
                .about("Sign in or sign up with a Google identity token")
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("Raw Google credential (JWT)")
                        .env("STOREFRONT_GOOGLE_TOKEN")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new("screen")
                        .long("screen")
                        .help("Screen the Google button was pressed on")
                        .value_parser(["signin", "signup"])
                        .default_value("signin"),
                )
                .arg(
                    Arg::new("paypal-client-id")
                        .long("paypal-client-id")
                        .help("PayPal client id sent if the Google account is new (sign-up only)"),
                ),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the stored session"))
}

fn email_arg() -> Arg {
    Arg::new("email")
        .short('e')
        .long("email")
        .help("Account email")
        .required(true)
}

fn password_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .required(true)
}

/// The `--redirect` argument as the query string the screens receive
#[must_use]
pub fn redirect_query(matches: &ArgMatches) -> String {
    let redirect = matches
        .get_one::<String>("redirect")
        .map_or("/", String::as_str);
    format!("redirect={}", urlencoding::encode(redirect))
}

/// Turn parsed arguments into an [`Action`]
///
/// # Errors
///
/// Returns an error if a required argument is missing or the subcommand is unknown
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let value = |sub: &ArgMatches, name: &str| -> Result<String> {
        sub.get_one::<String>(name)
            .cloned()
            .ok_or_else(|| anyhow!("missing required argument: --{name}"))
    };

    match matches.subcommand() {
        Some(("login", sub)) => Ok(Action::Login(Credentials::new(
            value(sub, "email")?,
            value(sub, "password")?,
        ))),
        Some(("register", sub)) => Ok(Action::Register(RegistrationForm {
            name: value(sub, "name")?,
            email: value(sub, "email")?,
            password: SecretString::from(value(sub, "password")?),
            confirm_password: SecretString::from(value(sub, "confirm-password")?),
            role: value(sub, "role")?
                .parse::<Role>()
                .context("invalid --role")?,
            paypal_client_id: sub.get_one::<String>("paypal-client-id").cloned(),
        })),
        Some(("google", sub)) => {
            let screen = match value(sub, "screen")?.as_str() {
                "signup" => Screen::SignUp,
                _ => Screen::SignIn,
            };
            Ok(Action::Google {
                token: SecretString::from(value(sub, "token")?),
                screen,
                paypal_client_id: sub.get_one::<String>("paypal-client-id").cloned(),
            })
        }
        Some(("logout", _)) => Ok(Action::SignOut),
        Some(("whoami", _)) => Ok(Action::Whoami),
        _ => Err(anyhow!("unknown command")),
    }
}
