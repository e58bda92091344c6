use super::ConfigError;
use crate::runtime::StatePaths;
use crate::shared::ids::validate_identifier_value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "AGENTSIM_API_KEY";
pub const SERVER_API_KEY_ENV: &str = "AGENTSIM_SERVER_API_KEY";
pub const PROXY_URL_ENV: &str = "AGENTSIM_PROXY_URL";
pub const BIND_ENV: &str = "AGENTSIM_BIND";

pub const DEFAULT_BIND: &str = "127.0.0.1:4000";
pub const DEFAULT_CLIENT_RUN_ID: &str = "sim1";
pub const DEFAULT_DEMO_DELAY_MS: u64 = 3000;
pub const DEFAULT_EXPLORER_BASE: &str = "https://monad-testnet.socialscan.io";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    /// When set, every request must carry `Authorization: Bearer <api_key>`.
    pub api_key: Option<String>,
    /// Snapshot directory; relative paths resolve against the state root.
    pub state_dir: Option<PathBuf>,
    pub script: ScriptSettings,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            api_key: None,
            state_dir: None,
            script: ScriptSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec!["tsx".to_string(), "scripts/sim-flow.ts".to_string()],
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub proxy_url: Option<String>,
    pub api_key: Option<String>,
    pub run_id: String,
    pub demo_delay_ms: u64,
    pub explorer_base: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            proxy_url: None,
            api_key: None,
            run_id: DEFAULT_CLIENT_RUN_ID.to_string(),
            demo_delay_ms: DEFAULT_DEMO_DELAY_MS,
            explorer_base: DEFAULT_EXPLORER_BASE.to_string(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// A missing settings file means defaults; any other read failure is an error.
    pub fn from_path_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::from_path(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = non_blank(lookup(API_KEY_ENV)) {
            self.client.api_key = Some(key);
        }
        if let Some(url) = non_blank(lookup(PROXY_URL_ENV)) {
            self.client.proxy_url = Some(url);
        }
        if let Some(key) = non_blank(lookup(SERVER_API_KEY_ENV)) {
            self.server.api_key = Some(key);
        }
        if let Some(bind) = non_blank(lookup(BIND_ENV)) {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() || !self.server.bind.contains(':') {
            return Err(ConfigError::Settings(format!(
                "`server.bind` must be a host:port address, got `{}`",
                self.server.bind
            )));
        }
        if self.server.script.program.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`server.script.program` must be non-empty".to_string(),
            ));
        }
        validate_identifier_value("client run id", &self.client.run_id)
            .map_err(|err| ConfigError::Settings(format!("`client.run_id`: {err}")))?;
        let base = self.client.explorer_base.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Settings(
                "`client.explorer_base` must be an http(s) url".to_string(),
            ));
        }
        if let Some(url) = non_blank(self.client.proxy_url.clone()) {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Settings(format!(
                    "`client.proxy_url` must be an http(s) url, got `{url}`"
                )));
            }
        }
        Ok(())
    }

    pub fn resolve_state_dir(&self, paths: &StatePaths) -> PathBuf {
        match &self.server.state_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => paths.root.join(dir),
            None => paths.snapshot_dir(),
        }
    }
}
