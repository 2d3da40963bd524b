//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bibharvest_pubmed::{EUTILS_BASE_URL, Identification};
use serde::Deserialize;

/// Global configuration for bibharvest
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub eutils: EutilsConfig,
    pub http: HttpConfig,
    pub pubmed: PubmedConfig,
    pub figures: FiguresConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EutilsConfig {
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub email: Option<String>,
    pub tool: Option<String>,
}

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            base_url: EUTILS_BASE_URL.to_string(),
            email: std::env::var("NCBI_EMAIL").ok(),
            tool: Some("bibharvest".to_string()),
        }
    }
}

impl EutilsConfig {
    /// Identification parameters, CLI values taking precedence.
    pub fn identification(&self, email: Option<String>, tool: Option<String>) -> Identification {
        Identification {
            email: email.or_else(|| self.email.clone()),
            tool: tool.or_else(|| self.tool.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub max_attempts: u32,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PubmedConfig {
    pub retmax: usize,
    pub out: PathBuf,
}

impl Default for PubmedConfig {
    fn default() -> Self {
        Self {
            retmax: 200,
            out: PathBuf::from("assets/pubmed.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FiguresConfig {
    pub pubmed: PathBuf,
    pub figures: PathBuf,
    pub out_dir: PathBuf,
    pub src_prefix: String,
    pub only_cc: bool,
}

impl Default for FiguresConfig {
    fn default() -> Self {
        Self {
            pubmed: PathBuf::from("assets/pubmed.json"),
            figures: PathBuf::from("assets/figures/figures.json"),
            out_dir: PathBuf::from("assets/figures"),
            src_prefix: "assets/figures/".to_string(),
            only_cc: true,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./bibharvest.toml (current directory)
    /// 2. ~/.config/bibharvest/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("bibharvest.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "bibharvest") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.http.max_attempts, 4);
        assert_eq!(config.pubmed.retmax, 200);
        assert_eq!(config.pubmed.out, PathBuf::from("assets/pubmed.json"));
        assert_eq!(config.figures.out_dir, PathBuf::from("assets/figures"));
        assert!(config.figures.only_cc);
        assert_eq!(config.eutils.tool.as_deref(), Some("bibharvest"));
    }

    #[test]
    fn expand_env_var_simple() {
        std::env::set_var("BIBHARVEST_TEST_EMAIL", "me@example.org");
        assert_eq!(
            expand_env_var("${BIBHARVEST_TEST_EMAIL}"),
            Some("me@example.org".to_string())
        );
        std::env::remove_var("BIBHARVEST_TEST_EMAIL");
    }

    #[test]
    fn expand_env_var_literal() {
        assert_eq!(expand_env_var("literal"), Some("literal".to_string()));
    }

    #[test]
    fn expand_env_var_missing() {
        assert_eq!(expand_env_var("${NONEXISTENT_VAR_12345}"), None);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[eutils]
email = "lab@example.org"

[http]
max_attempts = 6

[figures]
only_cc = false
out_dir = "public/img"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.eutils.email.as_deref(), Some("lab@example.org"));
        assert_eq!(config.eutils.base_url, EUTILS_BASE_URL);
        assert_eq!(config.http.max_attempts, 6);
        assert!(!config.figures.only_cc);
        assert_eq!(config.figures.out_dir, PathBuf::from("public/img"));
        assert_eq!(config.figures.src_prefix, "assets/figures/");
        assert_eq!(config.pubmed.retmax, 200);
    }

    #[test]
    fn cli_identification_wins() {
        let eutils = EutilsConfig {
            email: Some("config@example.org".to_string()),
            ..Default::default()
        };
        let ident = eutils.identification(Some("cli@example.org".to_string()), None);
        assert_eq!(ident.email.as_deref(), Some("cli@example.org"));
        assert_eq!(ident.tool.as_deref(), Some("bibharvest"));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bibharvest.toml");
        std::fs::write(&path, "[pubmed]\nretmax = 50\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.pubmed.retmax, 50);
        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
