//! Workspace-level options: the admin username/password and the domain to
//! operate on. Values layer in increasing precedence: defaults, the
//! `[galias]` table of `galias.toml` (user config dir, then current
//! directory), then CLI flags. Resolution happens once at bootstrap; the
//! resolved struct is passed around explicitly.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::AppPaths;
use crate::error::AppResult;

const LOCAL_FILE: &str = "galias.toml";

#[derive(Debug, Clone, Default)]
pub struct WorkspaceConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WorkspaceFile {
    #[serde(default)]
    galias: WorkspaceSection,
}

#[derive(Debug, Default, Deserialize)]
struct WorkspaceSection {
    username: Option<String>,
    password: Option<String>,
    domain: Option<String>,
}

impl WorkspaceConfig {
    pub fn resolve(
        paths: &AppPaths,
        username: Option<String>,
        password: Option<String>,
        domain: Option<String>,
    ) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(section) = load_section(&paths.workspace_file())? {
            config.layer(section);
        }
        if let Some(section) = load_section(Path::new(LOCAL_FILE))? {
            config.layer(section);
        }

        if username.is_some() {
            config.username = username;
        }
        if password.is_some() {
            config.password = password;
        }
        if domain.is_some() {
            config.domain = domain;
        }

        Ok(config)
    }

    fn layer(&mut self, section: WorkspaceSection) {
        if section.username.is_some() {
            self.username = section.username;
        }
        if section.password.is_some() {
            self.password = section.password;
        }
        if section.domain.is_some() {
            self.domain = section.domain;
        }
    }
}

fn load_section(path: &Path) -> AppResult<Option<WorkspaceSection>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let file: WorkspaceFile = toml::from_str(&raw)?;
    Ok(Some(file.galias))
}
