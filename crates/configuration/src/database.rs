use crate::error::ConfigError;
use crate::settings::Config;
use std::fmt;

pub const DB_HOST: &str = "DB_HOST";
pub const DB_PORT: &str = "DB_PORT";
pub const DB_USER: &str = "DB_USER";
pub const DB_PW: &str = "DB_PW";

/// Connection parameters for the relational backend.
///
/// All four values are required; there are no built-in defaults.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl DatabaseSettings {
    /// Resolves `DB_HOST`, `DB_PORT`, `DB_USER` and `DB_PW` through the
    /// configuration's two-tier lookup.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let host = required(config, DB_HOST)?;
        let raw_port = required(config, DB_PORT)?;
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue {
                key: DB_PORT.to_string(),
                value: raw_port.clone(),
            })?;
        let user = required(config, DB_USER)?;
        let password = required(config, DB_PW)?;

        Ok(Self {
            host,
            port,
            user,
            password,
        })
    }
}

fn required(config: &Config, key: &str) -> Result<String, ConfigError> {
    config
        .get_config(key)
        .ok_or_else(|| ConfigError::MissingValue(key.to_string()))
}

// The password never reaches logs.
impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (DB_HOST, "db.internal"),
            (DB_PORT, "3307"),
            (DB_USER, "svc"),
            (DB_PW, "s3cret"),
        ]
    }

    #[test]
    fn resolves_and_parses_port_from_environment() {
        let settings = DatabaseSettings::from_config(&Config::with_environment(full_env())).unwrap();
        assert_eq!(settings.host, "db.internal");
        assert_eq!(settings.port, 3307);
        assert_eq!(settings.user, "svc");
        assert_eq!(settings.password, "s3cret");
    }

    #[test]
    fn overrides_win_over_environment() {
        let mut config = Config::with_environment(full_env());
        config.set_config(DB_HOST, "override.example.com");
        config.set_config(DB_PORT, "3306");

        let settings = DatabaseSettings::from_config(&config).unwrap();
        assert_eq!(settings.host, "override.example.com");
        assert_eq!(settings.port, 3306);
    }

    #[test]
    fn missing_value_is_reported_by_name() {
        let env: Vec<_> = full_env().into_iter().filter(|(k, _)| *k != DB_USER).collect();
        let err = DatabaseSettings::from_config(&Config::with_environment(env)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue(ref key) if key == DB_USER));
    }

    #[test]
    fn non_numeric_port_is_invalid() {
        let mut config = Config::with_environment(full_env());
        config.set_config(DB_PORT, "mysql");

        let err = DatabaseSettings::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref value, .. } if value == "mysql"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let settings = DatabaseSettings::from_config(&Config::with_environment(full_env())).unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("s3cret"));
        assert!(printed.contains("db.internal"));
    }
}
