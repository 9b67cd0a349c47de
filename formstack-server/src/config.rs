use config::{Config, ConfigError, Environment, File};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub jira: Option<JiraConfig>,
    pub salesforce: Option<SalesforceConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret for access tokens; generated at startup when empty
    #[serde(default)]
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SalesforceConfig {
    pub login_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub api_version: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: get_default_db_path(),
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                access_token_ttl_secs: 15 * 60,
                refresh_token_ttl_secs: 30 * 24 * 60 * 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            cors: CorsConfig::default(),
            jira: None,
            salesforce: None,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the config file (explicit path, or
    /// `~/.config/formstack/server.toml` when present), then `FORMSTACK__*`
    /// environment variables.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default(
                "database.path",
                defaults.database.path.to_string_lossy().to_string(),
            )?
            .set_default("auth.jwt_secret", defaults.auth.jwt_secret)?
            .set_default("auth.access_token_ttl_secs", defaults.auth.access_token_ttl_secs)?
            .set_default("auth.refresh_token_ttl_secs", defaults.auth.refresh_token_ttl_secs)?
            .set_default("logging.level", defaults.logging.level)?;

        let builder = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Message(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                builder.add_source(File::from(path.to_path_buf()))
            }
            None => builder.add_source(File::from(get_config_path()).required(false)),
        };

        let mut config: AppConfig = builder
            .add_source(Environment::with_prefix("FORMSTACK").separator("__"))
            .build()?
            .try_deserialize()?;

        config.database.path = expand_tilde(&config.database.path);

        Ok(config)
    }

    /// Fills in a random JWT secret when none is configured.
    pub fn ensure_jwt_secret(&mut self) {
        if self.auth.jwt_secret.is_empty() {
            self.auth.jwt_secret = generate_jwt_secret();
            tracing::warn!(
                "No auth.jwt_secret configured; generated a random one. Issued tokens will not survive a restart"
            );
        }
    }
}

fn get_config_path() -> PathBuf {
    if let Some(home) = home::home_dir() {
        home.join(".config/formstack/server.toml")
    } else {
        PathBuf::from("server.toml")
    }
}

fn get_default_db_path() -> PathBuf {
    if let Some(home) = home::home_dir() {
        home.join(".local/share/formstack/formstack.db")
    } else {
        PathBuf::from("formstack.db")
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    if path.starts_with("~") {
        if let Some(home) = home::home_dir() {
            let path_str = path.to_string_lossy();
            let expanded = path_str.replacen("~", &home.to_string_lossy(), 1);
            return PathBuf::from(expanded);
        }
    }
    path.to_path_buf()
}

/// Generates a cryptographically secure random JWT secret
/// Equivalent to `openssl rand -base64 48`
fn generate_jwt_secret() -> String {
    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..48).map(|_| rng.random()).collect();
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
host = "0.0.0.0"
port = 9000

[database]
path = "/tmp/formstack-test.db"

[auth]
jwt_secret = "from-file"

[jira]
base_url = "https://example.atlassian.net"
email = "bot@example.com"
api_token = "token"
project_key = "FS"
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, PathBuf::from("/tmp/formstack-test.db"));
        assert_eq!(config.auth.jwt_secret, "from-file");
        // Untouched keys keep their defaults
        assert_eq!(config.auth.access_token_ttl_secs, 900);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.jira.unwrap().project_key, "FS");
        assert!(config.salesforce.is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_ensure_jwt_secret() {
        let mut config = AppConfig::default();
        config.ensure_jwt_secret();
        let generated = config.auth.jwt_secret.clone();
        assert!(!generated.is_empty());

        // An existing secret is kept
        config.ensure_jwt_secret();
        assert_eq!(config.auth.jwt_secret, generated);
    }

    #[test]
    fn test_generated_secret() {
        let secret = generate_jwt_secret();
        assert_eq!(secret.len(), 64);
        assert_ne!(secret, generate_jwt_secret());
    }

    #[test]
    fn test_expand_tilde() {
        let plain = PathBuf::from("/var/lib/formstack.db");
        assert_eq!(expand_tilde(&plain), plain);

        if let Some(home) = home::home_dir() {
            let expanded = expand_tilde(Path::new("~/data/formstack.db"));
            assert_eq!(expanded, home.join("data/formstack.db"));
        }
    }
}
