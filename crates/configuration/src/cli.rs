use crate::database::{DB_HOST, DB_PORT, DB_PW, DB_USER};
use crate::settings::Config;
use clap::Args;

/// Command-line flags that override the database connection settings.
#[derive(Debug, Clone, Default, Args)]
pub struct DatabaseArgs {
    /// Database host (overrides DB_HOST).
    #[arg(long = "db-host", global = true)]
    pub db_host: Option<String>,

    /// Database port (overrides DB_PORT).
    #[arg(long = "db-port", global = true)]
    pub db_port: Option<u16>,

    /// Database user (overrides DB_USER).
    #[arg(long = "db-user", global = true)]
    pub db_user: Option<String>,

    /// Database password (overrides DB_PW).
    #[arg(long = "db-pw", global = true)]
    pub db_pw: Option<String>,
}

impl DatabaseArgs {
    /// Injects every flag that was given as an override on `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.db_host {
            config.set_config(DB_HOST, host.clone());
        }
        if let Some(port) = self.db_port {
            config.set_config(DB_PORT, port.to_string());
        }
        if let Some(user) = &self.db_user {
            config.set_config(DB_USER, user.clone());
        }
        if let Some(password) = &self.db_pw {
            config.set_config(DB_PW, password.clone());
        }
    }
}
