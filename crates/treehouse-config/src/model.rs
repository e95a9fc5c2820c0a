use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use treehouse_types::HealthCheckSpec;

use crate::{
    raw::{RawConfig, RawHealthCheck, RawMode, RawService},
    ConfigError,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub core_services: BTreeMap<String, Service>,
    pub optional_services: BTreeMap<String, Service>,
    pub global_env: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub command: String,
    pub modes: HashMap<String, ServiceMode>,
    pub env: HashMap<String, String>,
    pub cwd: Option<PathBuf>,
    pub health_check: Option<HealthCheckSpec>,
}

/// Per-mode override of a service's command, with optional extra env.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceMode {
    pub command: String,
    pub env: HashMap<String, String>,
}

impl From<RawMode> for ServiceMode {
    fn from(raw: RawMode) -> Self {
        match raw {
            RawMode::Command(command) => Self {
                command,
                env: HashMap::new(),
            },
            RawMode::Detailed { command, env } => Self { command, env },
        }
    }
}

impl Config {
    /// Looks a service up by name, core services first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Service> {
        self.core_services
            .get(name)
            .or_else(|| self.optional_services.get(name))
    }

    /// Command line for `name` in `mode`. A mode without an override falls
    /// back to the base command.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ServiceNotFound` if no such service exists.
    pub fn command_for(&self, name: &str, mode: &str) -> Result<&str, ConfigError> {
        let service = self
            .get(name)
            .ok_or_else(|| ConfigError::ServiceNotFound(name.to_owned()))?;

        Ok(service
            .modes
            .get(mode)
            .map_or(service.command.as_str(), |m| m.command.as_str()))
    }

    /// Global environment merged with the service's own, the service wins.
    #[must_use]
    pub fn env_for(&self, name: &str) -> BTreeMap<String, String> {
        let mut env: BTreeMap<String, String> = self
            .global_env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if let Some(service) = self.get(name) {
            env.extend(service.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        env
    }

    /// Like [`Config::env_for`], with the mode's own env layered on top.
    #[must_use]
    pub fn env_in_mode(&self, name: &str, mode: &str) -> BTreeMap<String, String> {
        let mut env = self.env_for(name);
        if let Some(mode) = self.get(name).and_then(|s| s.modes.get(mode)) {
            env.extend(mode.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        env
    }

    #[must_use]
    pub fn health_check(&self, name: &str) -> Option<&HealthCheckSpec> {
        self.get(name).and_then(|s| s.health_check.as_ref())
    }
}

fn convert_service(name: &str, raw: RawService) -> Result<Service, ConfigError> {
    if raw.command.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "service `{name}`: command is empty"
        )));
    }
    let modes: HashMap<String, ServiceMode> = raw
        .modes
        .into_iter()
        .map(|(mode, raw)| (mode, ServiceMode::from(raw)))
        .collect();
    if let Some(mode) = modes
        .iter()
        .find_map(|(mode, m)| m.command.trim().is_empty().then_some(mode))
    {
        return Err(ConfigError::Validation(format!(
            "service `{name}`: command for mode `{mode}` is empty"
        )));
    }

    Ok(Service {
        command: raw.command,
        modes,
        env: raw.env,
        cwd: raw.cwd.and_then(|cwd| cwd.parse().ok()),
        health_check: raw
            .health_check
            .and_then(|health| convert_health_check(name, health)),
    })
}

fn convert_health_check(name: &str, raw: RawHealthCheck) -> Option<HealthCheckSpec> {
    if raw.url.trim().is_empty() {
        tracing::debug!("service `{name}`: health check without url, skipping");
        return None;
    }
    if raw.codes.is_empty() {
        tracing::warn!("service `{name}`: health check has no accepted codes and will never pass");
    }

    Some(HealthCheckSpec {
        url: raw.url,
        codes: raw.codes,
        interval_seconds: raw.interval_seconds,
        timeout_seconds: raw.timeout_seconds,
    })
}

impl TryFrom<RawConfig> for Config {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        if let Some(name) = raw
            .core_services
            .keys()
            .find(|name| raw.optional_services.contains_key(*name))
        {
            return Err(ConfigError::Validation(format!(
                "service `{name}` is declared as both core and optional"
            )));
        }

        let core_services = raw
            .core_services
            .into_iter()
            .map(|(name, service)| convert_service(&name, service).map(|s| (name, s)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        let optional_services = raw
            .optional_services
            .into_iter()
            .map(|(name, service)| convert_service(&name, service).map(|s| (name, s)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Config {
            core_services,
            optional_services,
            global_env: raw.global_env,
        })
    }
}
