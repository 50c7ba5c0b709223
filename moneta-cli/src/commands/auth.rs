//! Auth commands - login, register, logout, whoami

use std::env;
use std::io::{self, BufRead};

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{Input, Password};
use moneta_core::{Endpoint, LogEvent, LoginOutcome, RegisterOutcome};

use super::{get_context, get_logger, log_event};
use crate::output;

/// Get password from --password flag, MONETA_PASSWORD env var, piped stdin, or prompt
fn get_password_or_prompt(password_flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if let Ok(p) = env::var("MONETA_PASSWORD") {
        return Ok(p);
    }

    if atty::isnt(atty::Stream::Stdin) {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read password from stdin")?;
        return Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string());
    }

    let p = Password::new().with_prompt(prompt).interact()?;
    Ok(p)
}

fn get_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

pub fn run_login(email: Option<String>, password: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    let email = get_or_prompt(email, "Email")?;
    let password = get_password_or_prompt(password, "Password")?;

    let outcome = output::with_spinner("Logging in...", json, || {
        ctx.auth_service.login(&email, &password)
    })?;

    match &outcome {
        LoginOutcome::Authenticated { email, .. } => {
            log_event(
                &logger,
                LogEvent::new("login_succeeded")
                    .with_command("login")
                    .with_endpoint(Endpoint::Login.template()),
            );
            if json {
                println!(
                    "{}",
                    serde_json::json!({"status": "authenticated", "email": email})
                );
            } else {
                output::success(&format!("Logged in as {}", email));
            }
            Ok(())
        }
        LoginOutcome::Rejected { message } => {
            log_event(
                &logger,
                LogEvent::new("login_failed")
                    .with_command("login")
                    .with_endpoint(Endpoint::Login.template())
                    .with_error("rejected"),
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            anyhow::bail!("Login failed: {}", message)
        }
    }
}

pub fn run_register(
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();

    let name = get_or_prompt(name, "Name")?;
    let email = get_or_prompt(email, "Email")?;
    let password = get_password_or_prompt(password, "Password")?;

    let outcome = output::with_spinner("Registering...", json, || {
        ctx.auth_service.register(&name, &email, &password)
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    match outcome {
        RegisterOutcome::Registered { email, message } => {
            log_event(
                &logger,
                LogEvent::new("registered")
                    .with_command("register")
                    .with_endpoint(Endpoint::Register.template()),
            );
            if !json {
                output::success(&message);
                println!("Log in with: mt login --email {}", email);
            }
            Ok(())
        }
        RegisterOutcome::Rejected { message } => {
            log_event(
                &logger,
                LogEvent::new("register_failed")
                    .with_command("register")
                    .with_endpoint(Endpoint::Register.template())
                    .with_error("rejected"),
            );
            anyhow::bail!("Registration failed: {}", message)
        }
    }
}

pub fn run_logout(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let was_logged_in = ctx.session.is_authenticated();
    ctx.auth_service.logout()?;
    log_event(&get_logger(), LogEvent::new("logout").with_command("logout"));

    if json {
        println!("{}", serde_json::json!({"logged_out": was_logged_in}));
    } else if was_logged_in {
        output::success("Logged out");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn run_whoami(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = ctx.auth_service.current_user();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "authenticated": user.is_some(),
                "email": user.as_ref().map(|u| u.user_email.clone()),
                "apiUrl": ctx.config.api_url,
            })
        );
        return Ok(());
    }

    match user {
        Some(user) => println!("Logged in as {}", user.user_email.bold()),
        None => println!("{}", "Not logged in. Run 'mt login'.".yellow()),
    }
    println!("{}", format!("API: {}", ctx.config.api_url).dimmed());
    Ok(())
}
