use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConfig {
    #[serde(default)]
    pub core_services: BTreeMap<String, RawService>,
    #[serde(default)]
    pub optional_services: BTreeMap<String, RawService>,
    #[serde(default)]
    pub global_env: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawService {
    pub command: String,
    #[serde(default)]
    pub modes: HashMap<String, RawMode>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    pub cwd: Option<String>,
    pub health_check: Option<RawHealthCheck>,
}

/// A mode is either a bare command line or a command with its own env.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawMode {
    Command(String),
    Detailed {
        command: String,
        #[serde(default)]
        env: HashMap<String, String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawHealthCheck {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub codes: Vec<u16>,
    #[serde(default)]
    pub interval_seconds: i64,
    #[serde(default)]
    pub timeout_seconds: i64,
}
