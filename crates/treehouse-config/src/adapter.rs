use treehouse_types::ServiceDescriptor;

use crate::{model::Config, ConfigError};

impl Config {
    /// Builds the descriptor for a single service in `mode`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ServiceNotFound` if no such service exists.
    pub fn descriptor(&self, name: &str, mode: &str) -> Result<ServiceDescriptor, ConfigError> {
        let command = self.command_for(name, mode)?.to_owned();
        let service = self
            .get(name)
            .ok_or_else(|| ConfigError::ServiceNotFound(name.to_owned()))?;

        Ok(ServiceDescriptor {
            name: name.to_owned(),
            command,
            env: self.env_in_mode(name, mode),
            cwd: service.cwd.clone(),
            health: service.health_check.clone(),
        })
    }

    /// Every core service plus the optional services named in `extra`,
    /// sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ServiceNotFound` if a name in `extra` is unknown.
    pub fn resolve(&self, mode: &str, extra: &[String]) -> Result<Vec<ServiceDescriptor>, ConfigError> {
        let mut names: Vec<&str> = self.core_services.keys().map(String::as_str).collect();
        for name in extra {
            if self.get(name).is_none() {
                return Err(ConfigError::ServiceNotFound(name.clone()));
            }
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names.sort_unstable();

        names
            .into_iter()
            .map(|name| self.descriptor(name, mode))
            .collect()
    }
}
