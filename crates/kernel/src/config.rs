//! Configuration loaded from environment variables and the site file.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Path to the site file (default: ./webdesq.toml).
    pub site_config: PathBuf,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let site_config = env::var("WEBDESQ_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./webdesq.toml"));

        let cors_allowed_origins = parse_origins(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        Ok(Self {
            port,
            site_config,
            cors_allowed_origins,
        })
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// A user known to the host, authenticated by bearer token.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub id: String,
    pub token: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub coworkers: Vec<String>,
}

/// Site file: users and per-plugin settings.
///
/// ```toml
/// [[users]]
/// id = "editor"
/// token = "secret"
/// features = ["smartyellow/flatpages/seeMyFlatpages"]
///
/// [plugins."smartyellow/flatpages"]
/// preview = "https://www.example.com/preview/"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub users: Vec<UserEntry>,
    #[serde(default)]
    pub plugins: HashMap<String, toml::Table>,
}

impl SiteConfig {
    /// Read and parse the site file. A missing file yields an empty site.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "site file not found, starting without users");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read site file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid site file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse site TOML")
    }

    /// Configured settings for a plugin as a JSON map; empty when absent.
    pub fn plugin_settings(&self, plugin: &str) -> Result<Map<String, Value>> {
        let Some(table) = self.plugins.get(plugin) else {
            return Ok(Map::new());
        };

        match serde_json::to_value(table)
            .with_context(|| format!("settings for '{plugin}' are not representable as JSON"))?
        {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            parse_origins("https://a.example, https://b.example,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(parse_origins("*"), vec!["*"]);
    }

    #[test]
    fn site_file_parses_users_and_settings() {
        let site = SiteConfig::parse(
            r#"
            [[users]]
            id = "editor"
            token = "t0ken"
            features = ["smartyellow/flatpages/seeMyFlatpages"]
            coworkers = ["writer"]

            [plugins."smartyellow/flatpages"]
            preview = "https://www.example.com/preview/"
            channels = { website = "https://www.example.com" }
            "#,
        )
        .unwrap();

        assert_eq!(site.users.len(), 1);
        assert_eq!(site.users[0].coworkers, vec!["writer"]);

        let settings = site.plugin_settings("smartyellow/flatpages").unwrap();
        assert_eq!(settings["preview"], json!("https://www.example.com/preview/"));
        assert_eq!(
            settings["channels"],
            json!({ "website": "https://www.example.com" })
        );
    }

    #[test]
    fn unconfigured_plugin_has_empty_settings() {
        let site = SiteConfig::default();
        assert!(site.plugin_settings("acme/none").unwrap().is_empty());
    }

    #[test]
    fn user_without_token_is_rejected() {
        assert!(SiteConfig::parse("[[users]]\nid = \"x\"\n").is_err());
    }
}
