use derive_more::Display;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:9000";
const DEFAULT_ORIGINS: &str = "http://localhost:5173";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
    #[display("{_0} must be set")]
    Missing(&'static str),

    #[display("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub cookie_token: String,
    /// Pepper mixed into every password digest.
    pub login_token: String,
    pub production: bool,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub seed_tasks: bool,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid {
                    key: "MAX_UPLOAD_BYTES",
                    value,
                })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let seed_tasks = match lookup("SEED_TASKS").as_deref().map(str::trim) {
            None | Some("1" | "true") => true,
            Some("0" | "false") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "SEED_TASKS",
                    value: other.to_owned(),
                })
            }
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            cookie_token: required("COOKIE_TOKEN")?,
            login_token: required("LOGIN_TOKEN")?,
            // Production mode as default!
            production: lookup("MODE").map_or(true, |mode| mode != "dev"),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ORIGINS.to_owned())
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_owned)
                .collect(),
            max_upload_bytes,
            seed_tasks,
        })
    }
}
