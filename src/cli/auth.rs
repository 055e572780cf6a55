//! taskdeck register/login/logout/whoami
//!
//! The session file is the only state these commands touch locally.

use serde::Serialize;

use super::Context;
use crate::commands;
use crate::error::Result;
use crate::events::EventKind;
use crate::model::RegistrationForm;
use crate::output::{emit_success, HumanOutput};

/// Options for `taskdeck register`
pub struct RegisterOptions {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
struct RegisterReport {
    name: String,
    email: String,
    response: serde_json::Value,
}

#[derive(Serialize)]
struct SessionReport {
    display_name: String,
    email: String,
    logged_in_at: String,
    session_file: String,
}

#[derive(Serialize)]
struct LogoutReport {
    removed: bool,
}

pub async fn run_register(ctx: &mut Context, options: RegisterOptions) -> Result<()> {
    let form = RegistrationForm {
        name: options.name,
        email: options.email,
        password: options.password,
        confirm_password: options.confirm_password,
    };
    let remote = ctx.remote()?;
    let response = commands::register(remote.as_ref(), &form).await?;

    let report = RegisterReport {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        response,
    };
    ctx.emit_event(
        EventKind::UserRegistered,
        Some(&report.name),
        serde_json::json!({ "email": report.email }),
    )?;

    let mut human = HumanOutput::new(format!("taskdeck register: {}", report.email));
    human.push_summary("name", report.name.clone());
    human.push_next_step(format!("taskdeck login --email {}", report.email));
    emit_success(ctx.output, "register", &report, Some(&human))
}

pub async fn run_login(ctx: &mut Context, email: String, password: String) -> Result<()> {
    let remote = ctx.remote()?;
    let session = commands::login(remote.as_ref(), &email, &password).await?;
    let store = ctx.sessions()?;
    store.save(&session)?;

    let report = SessionReport {
        display_name: session.display_name.clone(),
        email: session.email.clone(),
        logged_in_at: session.logged_in_at.to_rfc3339(),
        session_file: store.path().display().to_string(),
    };
    ctx.emit_event(
        EventKind::SessionStarted,
        Some(&session.display_name),
        serde_json::json!({ "email": session.email }),
    )?;

    let mut human = HumanOutput::new(format!("taskdeck login: welcome {}", report.display_name));
    human.push_summary("email", report.email.clone());
    human.push_summary("session", report.session_file.clone());
    human.push_next_step("taskdeck task list");
    emit_success(ctx.output, "login", &report, Some(&human))
}

pub fn run_logout(ctx: &mut Context) -> Result<()> {
    let store = ctx.sessions()?;
    let previous = store.load().ok().flatten();
    let removed = store.clear()?;
    if removed {
        ctx.emit_event(
            EventKind::SessionEnded,
            previous.as_ref().map(|s| s.display_name.as_str()),
            serde_json::json!({}),
        )?;
    }

    let header = if removed {
        "taskdeck logout: session removed"
    } else {
        "taskdeck logout: no session"
    };
    let human = HumanOutput::new(header);
    emit_success(ctx.output, "logout", &LogoutReport { removed }, Some(&human))
}

pub fn run_whoami(ctx: &mut Context) -> Result<()> {
    let store = ctx.sessions()?;
    let session = store.require()?;
    let report = SessionReport {
        display_name: session.display_name.clone(),
        email: session.email.clone(),
        logged_in_at: session.logged_in_at.to_rfc3339(),
        session_file: store.path().display().to_string(),
    };

    let mut human = HumanOutput::new(format!("taskdeck whoami: {}", report.display_name));
    if !report.email.is_empty() {
        human.push_summary("email", report.email.clone());
    }
    human.push_summary("since", report.logged_in_at.clone());
    emit_success(ctx.output, "whoami", &report, Some(&human))
}
