use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Accounts offered on the login page and by `/api/test-login`.
pub const TEST_ACCOUNT_EMAILS: [&str; 2] = ["student@test.edu", "teacher@test.edu"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public name shown in the navigation bar
    #[serde(default = "default_site_name")]
    pub site_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            site_name: default_site_name(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_site_name() -> String {
    "Research Match".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Base URL of the hosted database (e.g. https://xyz.supabase.co)
    pub url: Option<String>,
    /// Service-role key sent as `apikey` and bearer token
    pub service_role_key: Option<String>,
    /// Local SQLite URL used when no hosted database is configured
    #[serde(default = "default_sqlite_url")]
    pub sqlite_url: String,
    /// Request timeout for the hosted client in seconds (default: 10)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_role_key: None,
            sqlite_url: default_sqlite_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_sqlite_url() -> String {
    "sqlite:./data/portal.db?mode=rwc".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl DatabaseConfig {
    /// Hosted credentials, present only when both URL and key are non-empty.
    pub fn hosted(&self) -> Option<(&str, &str)> {
        match (self.url.as_deref(), self.service_role_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_test_accounts")]
    pub test_accounts: Vec<String>,
    /// Name of the cookie holding the signed-in user's email
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            test_accounts: default_test_accounts(),
            session_cookie: default_session_cookie(),
        }
    }
}

fn default_test_accounts() -> Vec<String> {
    TEST_ACCOUNT_EMAILS.iter().map(|s| s.to_string()).collect()
}

fn default_session_cookie() -> String {
    "portal_user".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        Ok(config.normalized())
    }

    /// Trim, lower-case and dedupe the test-account allow-list.
    fn normalized(mut self) -> Self {
        let mut emails: Vec<String> = Vec::with_capacity(self.auth.test_accounts.len());
        for email in &self.auth.test_accounts {
            let email = email.trim().to_lowercase();
            if !email.is_empty() && !emails.contains(&email) {
                emails.push(email);
            }
        }
        self.auth.test_accounts = emails;
        self
    }

    /// Apply CLI/environment overrides on top of the file values.
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        service_role_key: Option<String>,
        sqlite_url: Option<String>,
    ) -> Self {
        if let Some(url) = database_url {
            self.database.url = Some(url);
        }
        if let Some(key) = service_role_key {
            self.database.service_role_key = Some(key);
        }
        if let Some(url) = sqlite_url {
            self.database.sqlite_url = url;
        }
        self
    }

    pub fn is_test_account(&self, email: &str) -> bool {
        let email = email.trim();
        self.auth
            .test_accounts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.test_accounts.len(), 2);
        assert!(config.database.hosted().is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            [server]
            port = 8081

            [database]
            url = "https://example.supabase.co"
            service_role_key = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.database.hosted(),
            Some(("https://example.supabase.co", "secret"))
        );
        assert_eq!(config.database.request_timeout, 10);
    }

    #[test]
    fn test_empty_key_is_not_hosted() {
        let config = Config::default().with_overrides(
            Some("https://example.supabase.co".to_string()),
            Some(String::new()),
            None,
        );
        assert!(config.database.hosted().is_none());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let config = Config::parse("[database]\nsqlite_url = \"sqlite::memory:\"\n")
            .unwrap()
            .with_overrides(None, None, Some("sqlite:./other.db".to_string()));
        assert_eq!(config.database.sqlite_url, "sqlite:./other.db");
    }

    #[test]
    fn test_is_test_account_ignores_case() {
        let config = Config::default();
        assert!(config.is_test_account("Student@Test.edu"));
        assert!(!config.is_test_account("someone@test.edu"));
    }

    #[test]
    fn test_test_accounts_are_normalized() {
        let config = Config::parse(
            r#"
            [auth]
            test_accounts = ["  Student@Test.edu ", "student@test.edu", "", "teacher@test.edu"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.auth.test_accounts,
            vec!["student@test.edu".to_string(), "teacher@test.edu".to_string()]
        );
        assert!(config.is_test_account(" teacher@TEST.edu"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/portal.toml")).unwrap();
        assert_eq!(config.server.site_name, "Research Match");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portal.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
    }
}
