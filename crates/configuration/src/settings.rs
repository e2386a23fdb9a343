use std::collections::HashMap;

/// Where a lookup goes when no override is set.
#[derive(Debug, Clone, Default)]
pub enum Environment {
    /// Read the live process environment at lookup time.
    #[default]
    Process,
    /// A fixed snapshot of variables, independent of the process.
    Fixed(HashMap<String, String>),
}

impl Environment {
    fn get(&self, name: &str) -> Option<String> {
        match self {
            Environment::Process => std::env::var(name).ok(),
            Environment::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

/// A two-tier configuration lookup.
///
/// Values set explicitly through [`Config::set_config`] win; anything else is
/// read from the environment tier. A `Config` is handed to each service at
/// construction, so two services can see different settings in one process.
#[derive(Debug, Clone, Default)]
pub struct Config {
    overrides: HashMap<String, String>,
    environment: Environment,
}

impl Config {
    /// Creates a configuration backed by the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a `.env` file (if one exists) into the process environment and
    /// returns a configuration backed by it.
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment file {}", path.display()),
            Err(e) if e.not_found() => tracing::debug!("No .env file found, using process environment"),
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {}", e),
        }
        Self::new()
    }

    /// Creates a configuration whose environment tier is the given variables
    /// instead of the process environment.
    pub fn with_environment<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: HashMap::new(),
            environment: Environment::Fixed(
                vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ),
        }
    }

    /// Returns the value for `name`: the override if one was set, otherwise
    /// the environment variable of the same name.
    pub fn get_config(&self, name: &str) -> Option<String> {
        self.overrides
            .get(name)
            .cloned()
            .or_else(|| self.environment.get(name))
    }

    /// Sets an override for `name`, replacing any earlier override.
    pub fn set_config(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.overrides.insert(name.into(), value.into());
    }

    pub fn overrides(&self) -> &HashMap<String, String> {
        &self.overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_environment() {
        let config = Config::with_environment([("DB_PORT", "3307")]);
        assert_eq!(config.get_config("DB_PORT").as_deref(), Some("3307"));
        assert_eq!(config.get_config("DB_HOST"), None);
    }

    #[test]
    fn override_takes_precedence_over_environment() {
        let mut config = Config::with_environment([("DB_HOST", "env.example.com")]);
        config.set_config("DB_HOST", "override.example.com");
        assert_eq!(
            config.get_config("DB_HOST").as_deref(),
            Some("override.example.com")
        );
    }

    #[test]
    fn later_override_replaces_earlier_one() {
        let mut config = Config::with_environment(Vec::<(String, String)>::new());
        config.set_config("DB_USER", "alice");
        config.set_config("DB_USER", "bob");
        assert_eq!(config.get_config("DB_USER").as_deref(), Some("bob"));
        assert_eq!(config.overrides().len(), 1);
    }

    #[test]
    fn process_environment_is_read_at_lookup_time() {
        // PATH is set in every test environment we run in.
        let config = Config::new();
        assert_eq!(config.get_config("PATH"), std::env::var("PATH").ok());
    }
}
