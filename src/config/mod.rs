use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Full connection URL; when set it takes precedence over the split fields
    pub database_url: Option<String>,
    #[serde(default = "default_host")]
    pub db_host: String,
    #[serde(default = "default_port")]
    pub db_port: u16,
    pub db_name: Option<String>,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    /// Default tracing filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;
        config.validate()?;

        Ok(config)
    }

    /// Build a configuration from explicit key/value pairs, as `load` would
    /// from the environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into()));
        let config = envy::from_iter::<_, Config>(pairs)?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database_url.is_none() && self.db_name.is_none() {
            anyhow::bail!("either DATABASE_URL or DB_NAME must be set");
        }
        Ok(())
    }

    /// Connection options for PostgreSQL
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = &self.database_url {
            return Ok(url.parse::<PgConnectOptions>()?);
        }

        let mut options = PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port);
        if let Some(name) = &self.db_name {
            options = options.database(name);
        }
        if let Some(user) = &self.db_user {
            options = options.username(user);
        }
        if let Some(password) = &self.db_password {
            options = options.password(password);
        }

        Ok(options)
    }

    /// Human-readable target for log lines, never including the password
    pub fn database_label(&self) -> String {
        match (&self.database_url, &self.db_name) {
            (Some(_), _) => "DATABASE_URL".to_string(),
            (None, Some(name)) => format!("{}:{}/{}", self.db_host, self.db_port, name),
            (None, None) => "<unset>".to_string(),
        }
    }
}
