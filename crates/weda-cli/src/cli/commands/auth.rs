//! Auth command handlers.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use weda_core::auth::otp::{OTP_LEN, OtpFlow};
use weda_core::auth::{RegisterRequest, SessionManager};
use weda_core::credentials;

pub async fn register(manager: &SessionManager) -> Result<()> {
    let first_name = prompt_required("First name: ")?;
    let last_name = prompt_required("Last name: ")?;
    let email = prompt_required("Email: ")?;
    let phone = prompt_required("Phone: ")?;
    let password = loop {
        let password = prompt_password("Password: ")?;
        if password.is_empty() {
            println!("A value is required.");
            continue;
        }
        let confirm = prompt_password("Confirm password: ")?;
        if password == confirm {
            break password;
        }
        println!("Passwords do not match. Try again.");
    };

    let request = RegisterRequest {
        email: email.clone(),
        password,
        first_name,
        last_name,
        phone,
    };
    manager.register(&request).await?;

    println!("Registered {email}. Log in with `weda login`.");
    Ok(())
}

pub async fn login(manager: &SessionManager, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.to_string(),
        None => prompt_required("Email: ")?,
    };
    let password = prompt_password("Password: ")?;

    let session = manager.login(&email, &password).await?;
    let token = session.token.as_deref().unwrap_or_default();
    println!(
        "Logged in as {email} (token {})",
        credentials::mask_token(token)
    );
    Ok(())
}

pub fn logout(manager: &SessionManager) -> Result<()> {
    manager.logout();
    println!("Logged out.");
    Ok(())
}

pub fn status(manager: &SessionManager) -> Result<()> {
    let session = manager.session();
    if session.is_authenticated() {
        let email = session
            .user
            .as_ref()
            .and_then(|user| user.get("email"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("<unknown>");
        let token = session.token.as_deref().unwrap_or_default();
        println!(
            "Logged in as {email} (token {})",
            credentials::mask_token(token)
        );
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

/// Runs the full forgot-password flow: send an OTP, collect and verify the
/// code, then set the new password.
pub async fn forgot_password(manager: Arc<SessionManager>, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.to_string(),
        None => prompt_required("Email: ")?,
    };

    let mut flow = OtpFlow::new(Arc::clone(&manager), &email);
    flow.send_otp().await?;
    println!("Verification code sent to {}.", flow.state().masked_email);

    let code = loop {
        let entry = prompt_line("Code (or 'resend'/'cancel'): ")?;
        if entry == "cancel" {
            flow.reset();
            println!("Cancelled.");
            return Ok(());
        }
        if entry == "resend" {
            if flow.send_otp().await? {
                println!("Code resent to {}.", flow.state().masked_email);
            } else {
                println!("Resend available in {}s.", flow.state().cooldown_secs);
            }
            continue;
        }
        if entry.len() != OTP_LEN || !entry.bytes().all(|b| b.is_ascii_digit()) {
            println!("Enter the {OTP_LEN}-digit code from the email.");
            continue;
        }
        for (index, digit) in entry.chars().enumerate() {
            flow.submit_digit(index, &digit.to_string());
        }
        match flow.submit_code().await {
            Ok(true) => break entry,
            Ok(false) => println!("Enter all {OTP_LEN} digits."),
            Err(err) => println!("Verification failed: {err}"),
        }
    };

    let new_password = loop {
        let password = prompt_password("New password: ")?;
        if password.is_empty() {
            println!("A value is required.");
            continue;
        }
        let confirm = prompt_password("Confirm new password: ")?;
        if password == confirm {
            break password;
        }
        println!("Passwords do not match. Try again.");
    };

    manager.reset_password(&email, &code, &new_password).await?;
    println!("Password updated. Log in with `weda login`.");
    Ok(())
}

/// Prompts until the user enters a non-empty value.
fn prompt_required(label: &str) -> Result<String> {
    loop {
        let value = prompt_line(label)?;
        if !value.is_empty() {
            return Ok(value);
        }
        println!("A value is required.");
    }
}

/// Reads one line from stdin after printing a label.
fn prompt_line(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush().context("flush stdout")?;

    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).context("read input")?;
    if read == 0 {
        anyhow::bail!("stdin closed");
    }
    Ok(input.trim().to_string())
}

/// Hidden password prompt on a terminal; plain line read when piped.
fn prompt_password(label: &str) -> Result<String> {
    if io::stdin().is_terminal() {
        rpassword::prompt_password(label).context("read password")
    } else {
        prompt_line(label)
    }
}
