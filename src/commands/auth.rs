use std::io::{self, IsTerminal};

use crate::auth::AuthService;
use crate::cli::AuthCommand;
use crate::config::{self, Settings};
use crate::context::{self, AppContext};
use crate::error::{AppError, AppResult};

pub async fn run(ctx: &AppContext, command: AuthCommand) -> AppResult<()> {
    match command {
        AuthCommand::Login => {
            let settings = ensure_login_settings(ctx)?;
            let result = AuthService::login(
                &ctx.profile,
                &settings,
                &ctx.token_store,
                &ctx.login_options,
            )
            .await?;

            let text = if let Some(email) = result.email.as_ref() {
                format!("{}: logged in as {}", result.profile, email)
            } else {
                format!("{}: {}", result.profile, result.note)
            };
            ctx.output.emit(&text, &result)
        }
        AuthCommand::Status => {
            let status = AuthService::status(&ctx.profile, &ctx.token_store).await?;
            let text = if status.logged_in {
                let refresh_hint = status
                    .has_refresh_token
                    .map(|has| {
                        if has {
                            " (refresh available)"
                        } else {
                            " (no refresh token)"
                        }
                    })
                    .unwrap_or_default();
                format!(
                    "{}: logged in{}{}",
                    status.profile,
                    status
                        .email
                        .as_ref()
                        .map(|email| format!(" as {email}"))
                        .unwrap_or_default(),
                    refresh_hint,
                )
            } else {
                format!("{}: logged out", status.profile)
            };

            ctx.output.emit(&text, &status)
        }
        AuthCommand::Logout => {
            let status = AuthService::logout(&ctx.profile, &ctx.token_store).await?;
            let text = format!("{}: logged out", status.profile);
            ctx.output.emit(&text, &status)
        }
    }
}

/// Makes sure the profile carries an oauth client id before starting the
/// flow, prompting for missing values when the session is interactive.
fn ensure_login_settings(ctx: &AppContext) -> AppResult<Settings> {
    let mut settings = ctx.settings.clone();
    let missing_client_id = settings
        .client_id
        .as_deref()
        .map(str::trim)
        .is_none_or(str::is_empty);

    if !missing_client_id {
        return Ok(settings);
    }

    let settings_path = ctx.paths.settings_file(&ctx.profile);
    if !io::stdin().is_terminal() {
        return Err(AppError::Config(format!(
            "missing oauth client_id in {}. run `galias auth login` in an interactive terminal to be prompted, or add it manually",
            settings_path.display(),
        )));
    }

    println!("OAuth client config is missing for profile `{}`.", ctx.profile);
    println!("Settings will be saved to {}.", settings_path.display());

    settings.client_id = Some(context::prompt_required("OAuth client_id: ")?);

    let client_secret =
        context::prompt_line("OAuth client_secret (empty for a public client): ")?;
    settings.client_secret = if client_secret.is_empty() {
        None
    } else {
        Some(client_secret)
    };

    let default_redirect = settings.redirect_uri();
    let redirect_uri =
        context::prompt_line(&format!("OAuth redirect_uri [{default_redirect}]: "))?;
    settings.redirect_uri = Some(if redirect_uri.is_empty() {
        default_redirect
    } else {
        redirect_uri
    });

    config::save_settings(&ctx.paths, &ctx.profile, &settings)?;
    println!("Saved profile settings to {}.", settings_path.display());

    Ok(settings)
}
