use std::io::{self, IsTerminal, Write as _};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::api::client::DirectoryClient;
use crate::auth::token_store::TokenStore;
use crate::auth::{AuthService, FileTokenStore, LoginOptions};
use crate::cli::Cli;
use crate::config::{self, AppPaths, Settings, WorkspaceConfig};
use crate::error::{AppError, AppResult};
use crate::output::Output;

/// Everything a command needs, resolved once at startup.
#[derive(Debug)]
pub struct AppContext {
    pub profile: String,
    pub verbose: u8,
    pub paths: AppPaths,
    pub settings: Settings,
    pub workspace: WorkspaceConfig,
    pub login_options: LoginOptions,
    pub token_store: FileTokenStore,
    pub directory: DirectoryClient,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(cli: &Cli) -> AppResult<Self> {
        let profile = config::resolve_profile(&cli.profile);
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let workspace = WorkspaceConfig::resolve(
            &paths,
            cli.username.clone(),
            cli.password.clone(),
            cli.domain.clone(),
        )?;

        if let Some(username) = &workspace.username {
            debug!(username, "operating as configured user");
        }

        let login_options = LoginOptions {
            no_local_server: cli.no_local_server,
            host: cli.auth_host.clone(),
            port: cli.auth_port,
        };

        let token_store = FileTokenStore::new(paths.clone());

        Ok(Self {
            profile,
            verbose: cli.verbose,
            paths,
            settings,
            workspace,
            login_options,
            token_store,
            directory: DirectoryClient::new(),
            output: Output::new(cli.json),
        })
    }

    /// A usable access token: the stored one when fresh, a silent refresh
    /// when expired, and an interactive login when there is nothing stored
    /// or the refresh token has been invalidated.
    pub async fn access_token(&self) -> AppResult<String> {
        match self.token_store.load(&self.profile)? {
            Some(token) if !token.is_expired(SystemTime::now()) => Ok(token.access_token),
            Some(_) => {
                match AuthService::refresh(&self.profile, &self.settings, &self.token_store).await
                {
                    Ok(token) => Ok(token.access_token),
                    Err(AppError::Auth(reason)) => {
                        warn!(%reason, "token refresh failed, re-authorizing");
                        self.interactive_login().await
                    }
                    Err(err) => Err(err),
                }
            }
            None => self.interactive_login().await,
        }
    }

    async fn interactive_login(&self) -> AppResult<String> {
        if !io::stdin().is_terminal() {
            return Err(AppError::Auth(
                "not logged in. run `galias auth login`".to_string(),
            ));
        }

        info!(profile = %self.profile, "no usable credentials, starting interactive login");
        AuthService::login(
            &self.profile,
            &self.settings,
            &self.token_store,
            &self.login_options,
        )
        .await?;

        let token = self
            .token_store
            .load(&self.profile)?
            .ok_or_else(|| AppError::Auth("login did not store a token".to_string()))?;
        Ok(token.access_token)
    }

    /// The domain to operate on; prompts when unset and stdin is a terminal.
    pub fn require_domain(&self) -> AppResult<String> {
        if let Some(domain) = &self.workspace.domain {
            let trimmed = domain.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }

        if !io::stdin().is_terminal() {
            return Err(AppError::Config(
                "no domain configured. pass --domain or set it under [galias] in galias.toml"
                    .to_string(),
            ));
        }

        prompt_required("Google Workspace domain: ")
    }
}

pub(crate) fn prompt_required(prompt: &str) -> AppResult<String> {
    loop {
        let value = prompt_line(prompt)?;
        if !value.is_empty() {
            return Ok(value);
        }
        eprintln!("value is required");
    }
}

pub(crate) fn prompt_line(prompt: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    stdout.write_all(prompt.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
