use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub materials: MaterialsConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MaterialsConfig {
    #[serde(default = "default_materials_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for MaterialsConfig {
    fn default() -> Self {
        Self {
            root: default_materials_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_materials_root() -> PathBuf {
    PathBuf::from("./materials")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.pdf".to_string(), "**/*.docx".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override for the provider endpoint. Mainly for tests and
    /// self-hosted gateways.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Provider tried when the primary one fails.
    #[serde(default)]
    pub fallback_provider: Option<String>,
    #[serde(default)]
    pub fallback_model: Option<String>,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            max_output_tokens: default_max_output_tokens(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
            fallback_provider: None,
            fallback_model: None,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_output_tokens() -> u32 {
    150
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl AnswerConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// Derive the config used for the fallback attempt: same retry and
    /// timeout settings, the fallback provider/model, no further fallback.
    pub fn fallback(&self) -> Option<AnswerConfig> {
        let provider = self.fallback_provider.clone()?;
        Some(AnswerConfig {
            provider,
            model: self.fallback_model.clone(),
            url: None,
            fallback_provider: None,
            fallback_model: None,
            ..self.clone()
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    match config.answer.provider.as_str() {
        "disabled" | "openai" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown answer provider: '{}'. Must be disabled, openai, or gemini.",
            other
        ),
    }

    if config.answer.is_enabled() && config.answer.model.is_none() {
        anyhow::bail!(
            "answer.model must be specified when provider is '{}'",
            config.answer.provider
        );
    }

    if config.answer.max_output_tokens == 0 {
        anyhow::bail!("answer.max_output_tokens must be > 0");
    }

    if let Some(ref fallback) = config.answer.fallback_provider {
        match fallback.as_str() {
            "openai" | "gemini" => {}
            other => anyhow::bail!(
                "Unknown fallback provider: '{}'. Must be openai or gemini.",
                other
            ),
        }
        if config.answer.fallback_model.is_none() {
            anyhow::bail!("answer.fallback_model must be specified when fallback_provider is set");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    const MINIMAL: &str = r#"
[db]
path = "data/madrasa.sqlite"

[server]
bind = "127.0.0.1:7400"
"#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.answer.provider, "disabled");
        assert!(!config.answer.is_enabled());
        assert_eq!(config.answer.max_output_tokens, 150);
        assert_eq!(config.materials.include_globs.len(), 2);
    }

    #[test]
    fn test_enabled_provider_requires_model() {
        let toml_str = format!("{}\n[answer]\nprovider = \"openai\"\n", MINIMAL);
        assert!(parse(&toml_str).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let toml_str = format!(
            "{}\n[answer]\nprovider = \"arabert\"\nmodel = \"x\"\n",
            MINIMAL
        );
        assert!(parse(&toml_str).is_err());
    }

    #[test]
    fn test_fallback_requires_model() {
        let toml_str = format!(
            "{}\n[answer]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\nfallback_provider = \"gemini\"\n",
            MINIMAL
        );
        assert!(parse(&toml_str).is_err());
    }

    #[test]
    fn test_fallback_config_derivation() {
        let toml_str = format!(
            "{}\n[answer]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\nfallback_provider = \"gemini\"\nfallback_model = \"gemini-1.5-flash\"\n",
            MINIMAL
        );
        let config = parse(&toml_str).unwrap();
        let fallback = config.answer.fallback().unwrap();
        assert_eq!(fallback.provider, "gemini");
        assert_eq!(fallback.model.as_deref(), Some("gemini-1.5-flash"));
        assert!(fallback.fallback_provider.is_none());
        assert_eq!(fallback.max_retries, config.answer.max_retries);
    }

    #[test]
    fn test_no_fallback_configured() {
        let config = parse(MINIMAL).unwrap();
        assert!(config.answer.fallback().is_none());
    }
}
