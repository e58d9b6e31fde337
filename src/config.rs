use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BACKUP_ROOT: &str = "./backups";
const DEFAULT_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("failed to read private key from {path}: {source}")]
    PrivateKey {
        path: String,
        source: std::io::Error,
    },
}

/// Process configuration, loaded once at startup from the environment
/// (with `.env` support via dotenvy in `main`).
pub struct Config {
    pub port: u16,
    pub webhook_secret: String,
    pub app_id: String,
    pub installation_id: u64,
    pub private_key: String,
    pub backup_root: PathBuf,
    pub github_api_url: String,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_secret = required("WEBHOOK_SECRET")?;
        let app_id = required("APP_ID")?;

        let installation_id = required("INSTALLATION_ID")?;
        let installation_id =
            installation_id
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid {
                    name: "INSTALLATION_ID",
                    value: installation_id,
                })?;

        let private_key_path = required("PRIVATE_KEY_PATH")?;
        let private_key =
            std::fs::read_to_string(&private_key_path).map_err(|source| ConfigError::PrivateKey {
                path: private_key_path,
                source,
            })?;

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let backup_root =
            PathBuf::from(env::var("BACKUP_ROOT").unwrap_or_else(|_| DEFAULT_BACKUP_ROOT.into()));

        let github_api_url =
            env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE.into());

        Ok(Self {
            port,
            webhook_secret,
            app_id,
            installation_id,
            private_key,
            backup_root,
            github_api_url,
        })
    }
}
