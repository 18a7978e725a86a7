//! Run settings assembled from command-line flags and an optional YAML file.
//!
//! ```yaml
//! server:
//!   url: http://graph.internal:7474
//!   user: neo4j
//!   password: secret
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:7474";

/// The ontology being imported and how it is named in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologySettings {
    pub path: PathBuf,
    pub name: String,
    pub acronym: String,
}

/// Connection to the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub url: String,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            user: None,
            password: None,
        }
    }
}

impl ServerSettings {
    /// Overlays explicitly given values on top of `self`.
    #[must_use]
    pub fn merge(mut self, overlay: ServerOverlay) -> Self {
        if let Some(url) = overlay.url {
            self.url = url;
        }
        if overlay.user.is_some() {
            self.user = overlay.user;
        }
        if overlay.password.is_some() {
            self.password = overlay.password;
        }
        self.url = self.url.trim_end_matches('/').to_string();
        self
    }
}

/// Partial server settings; unset fields keep the value underneath.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerOverlay {
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    server: ServerOverlay,
}

/// Reads the `server:` section of a YAML configuration file.
///
/// # Errors
///
/// [`Error::ConfigFile`] when the file cannot be read or is not valid YAML.
pub fn load_server_overlay(path: &Path) -> Result<ServerOverlay> {
    let config_error = |reason: String| Error::ConfigFile {
        path: path.to_path_buf(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|err| config_error(err.to_string()))?;
    if content.trim().is_empty() {
        return Ok(ServerOverlay::default());
    }
    let file: ConfigFile =
        serde_yaml::from_str(&content).map_err(|err| config_error(err.to_string()))?;
    Ok(file.server)
}

/// Everything a run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSettings {
    pub ontology: OntologySettings,
    pub server: ServerSettings,
    pub dry_run: bool,
    pub constraints: bool,
}

impl ImportSettings {
    /// # Errors
    ///
    /// [`Error::Config`] for a blank name or acronym, or a server URL that is
    /// not an absolute `http`/`https` URL.
    pub fn validate(&self) -> Result<()> {
        if self.ontology.name.trim().is_empty() {
            return Err(Error::Config("ontology name must not be empty".to_string()));
        }
        if self.ontology.acronym.trim().is_empty() {
            return Err(Error::Config(
                "ontology abbreviation must not be empty".to_string(),
            ));
        }
        let url = reqwest::Url::parse(&self.server.url)
            .map_err(|err| Error::Config(format!("server URL `{}`: {err}", self.server.url)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::Config(format!(
                "server URL `{}` must be an absolute http(s) URL",
                self.server.url
            )));
        }
        Ok(())
    }
}
