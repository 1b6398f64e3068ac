#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{anyhow, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use storefront_auth::{
    cli::{self, Action},
    navigation::{Navigator, Screen},
    AuthFlow, AuthFlowError, AuthFlowFactory, FlowState, StorefrontSettings, UserSession,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::new().get_matches();
    let action = cli::handler(&matches)?;
    let redirect_query = cli::redirect_query(&matches);

    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = StorefrontSettings::load().context("Failed to load settings")?;
    let flow = AuthFlowFactory::from_settings(&settings)
        .context("Failed to build the sign-in flow")?;

    match action {
        Action::Login(credentials) => {
            let navigator = Navigator::new(Screen::SignIn, &redirect_query);
            report(&flow, &navigator, flow.submit_login(credentials).await)
        }
        Action::Register(form) => {
            let navigator = Navigator::new(Screen::SignUp, &redirect_query);
            report(&flow, &navigator, flow.submit_registration(form).await)
        }
        Action::Google {
            token,
            screen,
            paypal_client_id,
        } => {
            let navigator = Navigator::new(screen, &redirect_query);
            google(&flow, &navigator, &token, paypal_client_id).await
        }
        Action::SignOut => {
            flow.dispatcher().sign_out();
            println!("✓ Signed out");
            Ok(())
        }
        Action::Whoami => {
            match flow.store().current_user() {
                Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
                None => println!("Not signed in"),
            }
            Ok(())
        }
    }
}

async fn google(
    flow: &AuthFlow,
    navigator: &Navigator,
    token: &SecretString,
    paypal_client_id: Option<String>,
) -> Result<()> {
    let result = flow.identity_received(token.expose_secret()).await;

    let Ok(FlowState::AwaitingPasswordEntry(pending)) = &result else {
        if let Ok(FlowState::Resolved(user)) = &result {
            let destination = navigator
                .after_identity_login(&flow.store().snapshot())
                .unwrap_or_else(|| navigator.redirect().to_string());
            print_signed_in(user, &destination);
            return Ok(());
        }
        return report(flow, navigator, result);
    };

    println!(
        "No account exists for {}. Choose a password to create one:",
        pending.email
    );
    let password = read_password().await?;
    if password.is_empty() {
        flow.cancel_password_entry();
        return Err(anyhow!("Sign-up cancelled"));
    }

    let result = flow
        .password_entered(SecretString::from(password), paypal_client_id)
        .await;
    report(flow, navigator, result)
}

async fn read_password() -> Result<String> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn report(
    flow: &AuthFlow,
    navigator: &Navigator,
    result: Result<FlowState, AuthFlowError>,
) -> Result<()> {
    let state = result.map_err(|e| anyhow!(e.to_string()))?;
    if !state.is_terminal() {
        println!("Flow stopped in state: {}", state.name());
        return Ok(());
    }

    match state {
        FlowState::Resolved(user) => {
            let destination = navigator
                .destination(&flow.store().snapshot())
                .unwrap_or_else(|| navigator.redirect().to_string());
            print_signed_in(&user, &destination);
            Ok(())
        }
        FlowState::Failed { message } => Err(anyhow!(message)),
        _ => Ok(()),
    }
}

fn print_signed_in(user: &UserSession, destination: &str) {
    println!("✓ Signed in as {} ({})", user.email, user.role);
    println!("  Continue to {destination}");
}
