use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "SPARKIFY_ENV";
const CONFIG_DIR_ENV: &str = "SPARKIFY_CONFIG_DIR";
const ENV_PREFIX: &str = "SPARKIFY";

/// Deployment environment the tool is running against.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub schema: SchemaSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(None, None)
    }

    /// Same as [`Settings::load`], with explicit overrides for the config
    /// directory and environment name (both fall back to their env vars).
    pub fn load_with(
        config_dir: Option<PathBuf>,
        environment: Option<String>,
    ) -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = environment
            .or_else(|| std::env::var(ENV_VAR_NAME).ok())
            .unwrap_or_else(|| DEFAULT_ENV.to_string());

        let config_dir = match config_dir
            .or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from))
        {
            Some(dir) => dir,
            None => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .with_context(|| "unable to resolve current directory")?,
        };

        Self::from_dir(&config_dir, &environment)
    }

    /// Build settings from `<config_dir>/base.toml`, `<config_dir>/<environment>.toml`
    /// and `SPARKIFY_*` environment variables, in that order of precedence.
    pub fn from_dir(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        Self::from_sources(config_dir, environment, None)
    }

    /// Like [`Settings::from_dir`], reading `SPARKIFY_*` variables from `vars`
    /// instead of the process environment when given.
    pub fn from_sources(
        config_dir: &Path,
        environment: &str,
        vars: Option<config::Map<String, String>>,
    ) -> anyhow::Result<Self> {
        let parsed_environment: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        // Values stay strings until deserialization so `007` or `TRUE` in a
        // password or database name is not rewritten as a number or bool.
        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(vars),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed_environment;
        settings.validate()?;

        Ok(settings)
    }

    /// Reject combinations that can never bootstrap successfully.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.name.trim().is_empty() {
            return Err(anyhow!("database.name must not be empty"));
        }
        if self.database.admin_database == self.database.name {
            return Err(anyhow!(
                "database.admin_database and database.name are both '{}'; \
                 the target cannot be dropped through its own connection",
                self.database.name
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_host")]
    pub host: String,
    #[serde(default = "DatabaseSettings::default_port")]
    pub port: u16,
    #[serde(default = "DatabaseSettings::default_user")]
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Database the administrative session connects to.
    #[serde(default = "DatabaseSettings::default_admin_database")]
    pub admin_database: String,
    /// Database that gets dropped and recreated.
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
    #[serde(default = "DatabaseSettings::default_encoding")]
    pub encoding: String,
    #[serde(default = "DatabaseSettings::default_template")]
    pub template: String,
    /// Append `WITH (FORCE)` to the drop (PostgreSQL 13+).
    #[serde(default)]
    pub force_drop: bool,
}

impl DatabaseSettings {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        5432
    }

    fn default_user() -> String {
        "postgres".to_string()
    }

    fn default_admin_database() -> String {
        "postgres".to_string()
    }

    fn default_name() -> String {
        "sparkifydb".to_string()
    }

    fn default_encoding() -> String {
        "utf8".to_string()
    }

    fn default_template() -> String {
        "template0".to_string()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            user: Self::default_user(),
            password: None,
            admin_database: Self::default_admin_database(),
            name: Self::default_name(),
            encoding: Self::default_encoding(),
            template: Self::default_template(),
            force_drop: false,
        }
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("admin_database", &self.admin_database)
            .field("name", &self.name)
            .field("encoding", &self.encoding)
            .field("template", &self.template)
            .field("force_drop", &self.force_drop)
            .finish()
    }
}

/// How the statements of one phase (drop tables, create tables) are committed.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    /// Every statement commits on its own; a failure keeps earlier statements.
    #[default]
    PerStatement,
    /// The whole phase runs in one transaction and rolls back on failure.
    Atomic,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchemaSettings {
    #[serde(default)]
    pub commit_mode: CommitMode,
    /// Optional file with `drop` and `create` statement lists; the built-in
    /// catalog is used when absent.
    #[serde(default)]
    pub statements_file: Option<PathBuf>,
    #[serde(default = "SchemaSettings::default_introspection_schema")]
    pub introspection_schema: String,
}

impl SchemaSettings {
    fn default_introspection_schema() -> String {
        "public".to_string()
    }
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            commit_mode: CommitMode::default(),
            statements_file: None,
            introspection_schema: Self::default_introspection_schema(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "TelemetrySettings::default_level")]
    pub level: String,
}

impl TelemetrySettings {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
