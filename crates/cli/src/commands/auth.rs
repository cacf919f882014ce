//! Account commands: signup, confirmation, login, logout.

use ramm_client::auth::LoginOutcome;
use ramm_core::Role;

use crate::context::Context;
use crate::{prompt, render};

pub async fn signup(
    ctx: &Context,
    email: &str,
    password: Option<String>,
    role: Role,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = prompt::password_or_prompt(password, "Password:")?;
    let mut flow = ctx.auth_flow()?;
    let next = flow.sign_up(email, &password, role).await?;

    let mut out = render::stdout();
    render::message(&mut out, "Signup successful! Check your email for the confirmation code.")?;
    render::message(&mut out, &format!("Next: ramm confirm -e {email} -c <code>  ({next})"))?;
    Ok(())
}

pub async fn confirm(ctx: &Context, email: &str, code: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut flow = ctx.auth_flow()?;
    let outcome = flow.confirm_registration(email, code).await;

    let mut out = render::stdout();
    render::message(&mut out, &outcome.message())?;
    render::message(&mut out, &format!("Next: ramm login  ({})", outcome.route()))?;
    Ok(())
}

pub async fn login(
    ctx: &Context,
    email: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut flow = ctx.auth_flow()?;
    let email = match email {
        Some(email) => email,
        None => match flow.prefill_email()? {
            Some(email) => {
                tracing::debug!(%email, "Using email from signup");
                email
            }
            None => prompt::line("Email:")?,
        },
    };
    let password = prompt::password_or_prompt(password, "Password:")?;

    let mut outcome = flow.login(&email, &password).await?;
    if matches!(outcome, LoginOutcome::NewPasswordRequired) {
        let new_password = prompt::secret("A new password is required. New password:")?;
        outcome = flow.complete_forced_password_change(&new_password).await?;
    }

    let mut out = render::stdout();
    match outcome {
        LoginOutcome::Authenticated { session, route } => {
            render::message(&mut out, &format!("Signed in as {} ({}).", session.email(), session.role()))?;
            render::message(&mut out, &format!("Landing page: {route}"))?;
        }
        LoginOutcome::ConfirmationRecovery(recovery) => {
            render::message(&mut out, &recovery.message())?;
        }
        LoginOutcome::NewPasswordRequired => {
            render::message(&mut out, "Password change was not completed.")?;
        }
    }
    Ok(())
}

pub fn logout(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut flow = ctx.auth_flow()?;
    let next = flow.logout()?;
    render::message(&mut render::stdout(), &format!("Signed out. ({next})"))?;
    Ok(())
}

pub fn whoami(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.session()?;
    render::session(&mut render::stdout(), &session)?;
    Ok(())
}
