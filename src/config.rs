use std::{
    env, fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use sqlx::mysql::MySqlConnectOptions;
use thiserror::Error;

use crate::{
    analysis::DriftPolicy,
    pipeline::export::ExportLayout,
    taxonomy::RuleSetVersion,
};

/// Where the record source connects. Credentials never appear in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Dsn(String),
    Parts {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}

impl DatabaseTarget {
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the DSN cannot be parsed.
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, ConfigError> {
        match self {
            Self::Dsn(dsn) => MySqlConnectOptions::from_str(dsn).map_err(|error| {
                ConfigError::Invalid {
                    name: "PLACEMENT_DB_DSN",
                    source: anyhow::Error::new(error),
                }
            }),
            Self::Parts {
                host,
                port,
                user,
                password,
                database,
            } => Ok(MySqlConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(database)),
        }
    }
}

impl fmt::Debug for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dsn(_) => f.write_str("Dsn(<redacted>)"),
            Self::Parts {
                host,
                port,
                database,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("database", database)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    database: DatabaseTarget,
    db_max_connections: u32,
    db_acquire_timeout: Duration,
    model_path: PathBuf,
    columns_path: PathBuf,
    daily_query_path: Option<String>,
    reference_query_path: Option<String>,
    ruleset: RuleSetVersion,
    export: ExportLayout,
    drift: DriftPolicy,
    reference_mean_probability: f64,
    metrics_textfile: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// Reads and validates the configuration from the environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if no database is configured or a value does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database = database_target()?;
        database.connect_options()?;
        let db_max_connections = parse_u32("PLACEMENT_DB_MAX_CONNECTIONS", 2)?;
        if db_max_connections == 0 {
            return Err(ConfigError::Invalid {
                name: "PLACEMENT_DB_MAX_CONNECTIONS",
                source: anyhow::anyhow!("must be greater than zero"),
            });
        }
        let db_acquire_timeout = parse_duration_secs("PLACEMENT_DB_ACQUIRE_TIMEOUT_SECS", 30)?;

        let model_path = path_var("PLACEMENT_MODEL_PATH", "models/conversion_model.json");
        let columns_path = path_var("PLACEMENT_COLUMNS_PATH", "models/model_columns.json");
        let daily_query_path = optional_var("PLACEMENT_DAILY_QUERY_PATH");
        let reference_query_path = optional_var("PLACEMENT_REFERENCE_QUERY_PATH");

        let ruleset = env::var("PLACEMENT_RULESET")
            .ok()
            .map(|raw| raw.parse::<RuleSetVersion>())
            .transpose()
            .map_err(|error| ConfigError::Invalid {
                name: "PLACEMENT_RULESET",
                source: anyhow::Error::new(error),
            })?
            .unwrap_or_default();

        let export = ExportLayout {
            output_dir: path_var("PLACEMENT_OUTPUT_DIR", "data/predicciones"),
            analysis_dir: path_var("PLACEMENT_ANALYSIS_DIR", "data/analisis"),
            dialer_dir: path_var("PLACEMENT_DIALER_DIR", "data/upload_vicidial"),
            prefix: env::var("PLACEMENT_EXPORT_PREFIX").unwrap_or_else(|_| "COLSAGEM".to_string()),
        };

        let drift = DriftPolicy {
            gap_threshold_pct: parse_percentage("DRIFT_GAP_THRESHOLD_PCT", 30.0)?,
            recent_window_days: parse_u32("DRIFT_RECENT_WINDOW_DAYS", 60)?,
            recent_margin_pct: parse_percentage("DRIFT_RECENT_MARGIN_PCT", 10.0)?,
            min_recent_rows: parse_usize("DRIFT_MIN_RECENT_ROWS", 1000)?,
            designated_category: env::var("DRIFT_DESIGNATED_CATEGORY")
                .unwrap_or_else(|_| "bpo_callcenter".to_string()),
        };

        let reference_mean_probability = parse_f64("DRIFT_REFERENCE_MEAN_PROBABILITY", 0.47)?;
        if !(0.0..=1.0).contains(&reference_mean_probability) {
            return Err(ConfigError::Invalid {
                name: "DRIFT_REFERENCE_MEAN_PROBABILITY",
                source: anyhow::anyhow!("value must be between 0 and 1"),
            });
        }

        let metrics_textfile = optional_var("PLACEMENT_METRICS_TEXTFILE").map(PathBuf::from);

        Ok(Self {
            database,
            db_max_connections,
            db_acquire_timeout,
            model_path,
            columns_path,
            daily_query_path,
            reference_query_path,
            ruleset,
            export,
            drift,
            reference_mean_probability,
            metrics_textfile,
        })
    }

    #[must_use]
    pub fn database(&self) -> &DatabaseTarget {
        &self.database
    }

    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    #[must_use]
    pub fn db_acquire_timeout(&self) -> Duration {
        self.db_acquire_timeout
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    #[must_use]
    pub fn columns_path(&self) -> &Path {
        &self.columns_path
    }

    #[must_use]
    pub fn daily_query_path(&self) -> Option<&str> {
        self.daily_query_path.as_deref()
    }

    #[must_use]
    pub fn reference_query_path(&self) -> Option<&str> {
        self.reference_query_path.as_deref()
    }

    #[must_use]
    pub fn ruleset(&self) -> RuleSetVersion {
        self.ruleset
    }

    #[must_use]
    pub fn export(&self) -> &ExportLayout {
        &self.export
    }

    #[must_use]
    pub fn drift(&self) -> &DriftPolicy {
        &self.drift
    }

    #[must_use]
    pub fn reference_mean_probability(&self) -> f64 {
        self.reference_mean_probability
    }

    #[must_use]
    pub fn metrics_textfile(&self) -> Option<&Path> {
        self.metrics_textfile.as_deref()
    }
}

fn database_target() -> Result<DatabaseTarget, ConfigError> {
    if let Some(dsn) = optional_var("PLACEMENT_DB_DSN") {
        return Ok(DatabaseTarget::Dsn(dsn));
    }
    let host = env_var("DB_HOST").map_err(|_| ConfigError::Missing("PLACEMENT_DB_DSN or DB_HOST"))?;
    let port = parse_u16("DB_PORT", 3306)?;
    let user = env_var("DB_USER")?;
    let password = env::var("DB_PASSWORD").unwrap_or_default();
    let database = env_var("DB_NAME")?;
    Ok(DatabaseTarget::Parts {
        host,
        port,
        user,
        password,
        database,
    })
}

fn env_var(name: &'static str) -> Result<String, ConfigError> {
    optional_var(name).ok_or(ConfigError::Missing(name))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn path_var(name: &str, default: &str) -> PathBuf {
    PathBuf::from(optional_var(name).unwrap_or_else(|| default.to_string()))
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default_secs.to_string());
    let secs = raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    Ok(Duration::from_secs(secs))
}

fn parse_u16(name: &'static str, default: u16) -> Result<u16, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u16>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_usize(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<usize>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f64(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let value = raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be finite"),
        })
    }
}

fn parse_percentage(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let parsed = parse_f64(name, default)?;
    if !(0.0..=100.0).contains(&parsed) {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be between 0 and 100"),
        });
    }
    Ok(parsed)
}
