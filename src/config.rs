use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub db_path: String,
    pub bind_address: String,
    pub max_workers: usize,
    pub log_level: String,
    /// Return the raw magic link in the request-link response (development only).
    pub expose_magic_links: bool,
    pub cloudinary: Option<CloudinaryConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "realestate.sqlite3".to_string(),
            bind_address: "127.0.0.1:5000".to_string(),
            max_workers: 8,
            log_level: "info".to_string(),
            expose_magic_links: false,
            cloudinary: None,
        }
    }
}

impl Config {
    /// Environment variables win over the file.
    fn apply_env(mut self) -> Self {
        if let Ok(path) = env::var("DATABASE_PATH") {
            self.db_path = path;
        }
        if let Ok(addr) = env::var("BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let (Ok(cloud_name), Ok(api_key), Ok(api_secret)) = (
            env::var("CLOUDINARY_CLOUD_NAME"),
            env::var("CLOUDINARY_API_KEY"),
            env::var("CLOUDINARY_API_SECRET"),
        ) {
            self.cloudinary = Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            });
        }
        self
    }
}

pub fn parse_config(raw: &str) -> Result<Config, String> {
    toml::from_str(raw).map_err(|e| e.to_string())
}

/// Loads `.env`, then the optional TOML file named by `CONFIG_PATH`.
/// A missing `CONFIG_PATH` means defaults; an unreadable file is fatal.
pub fn read_config() -> Config {
    dotenv().ok();
    let base = match env::var(CONFIG_PATH_ENV) {
        Ok(config_path) => std::fs::read_to_string(&config_path)
            .map_err(|e| format!("{config_path}: {e}"))
            .and_then(|raw| parse_config(&raw))
            .unwrap_or_else(|err| {
                // logging is not set up yet
                eprintln!("failed to read config: {err}");
                std::process::exit(1);
            }),
        Err(_) => Config::default(),
    };
    base.apply_env()
}
