//! The question pipeline.
//!
//! One shape, shared by the CLI `ask` command and the `POST /ask` handler:
//! material lookup → prompt construction → model call (with fallback) →
//! transliteration → response. [`answer_question`] is the core function;
//! [`run_ask`] is the CLI wrapper around it.

use serde::{Deserialize, Serialize};

use crate::answer;
use crate::config::Config;
use crate::store::{MaterialStore, SqliteStore};
use crate::translit::{TargetScript, SELECTORS};

/// A student question, as posted to `POST /ask`.
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub level: String,
    pub week: String,
    pub question: String,
    /// Target-script selector: `arabic`, `transliteration-hebrew`, or
    /// `transliteration-english`.
    #[serde(default = "default_language")]
    pub language: String,
    /// Accepted for compatibility with existing clients; not used by the
    /// pipeline.
    #[serde(default)]
    pub gender: Option<String>,
}

fn default_language() -> String {
    "arabic".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Pipeline failure, typed so the HTTP layer can map each case to a status
/// code without sniffing error strings.
#[derive(Debug)]
pub enum AskError {
    /// Empty or malformed request field.
    InvalidRequest(String),
    /// Unrecognized target-script selector.
    InvalidLanguage(String),
    /// No material stored for the requested level and week.
    MaterialNotFound { level: String, week: String },
    /// Every configured provider failed.
    Upstream(anyhow::Error),
    /// Store access failed.
    Internal(anyhow::Error),
}

impl std::fmt::Display for AskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AskError::InvalidRequest(msg) => write!(f, "{}", msg),
            AskError::InvalidLanguage(lang) => write!(
                f,
                "invalid language option: '{}'. Must be one of: {}",
                lang,
                SELECTORS.join(", ")
            ),
            AskError::MaterialNotFound { level, week } => {
                write!(f, "no material found for level '{}', week '{}'", level, week)
            }
            AskError::Upstream(e) => write!(f, "answering failed: {}", e),
            AskError::Internal(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AskError {}

/// Run the full pipeline for one question.
pub async fn answer_question(
    config: &Config,
    store: &dyn MaterialStore,
    request: &AskRequest,
) -> Result<AskResponse, AskError> {
    if request.question.trim().is_empty() {
        return Err(AskError::InvalidRequest(
            "question must not be empty".to_string(),
        ));
    }
    if request.level.trim().is_empty() || request.week.trim().is_empty() {
        return Err(AskError::InvalidRequest(
            "level and week must not be empty".to_string(),
        ));
    }

    // Resolve the selector before doing any work; rejecting bad options is
    // this boundary's job, not the transliterator's.
    let script = TargetScript::parse(&request.language)
        .ok_or_else(|| AskError::InvalidLanguage(request.language.clone()))?;

    let material = store
        .fetch(&request.level, &request.week)
        .await
        .map_err(AskError::Internal)?
        .ok_or_else(|| AskError::MaterialNotFound {
            level: request.level.clone(),
            week: request.week.clone(),
        })?;

    let answer = answer::ask_with_fallback(&config.answer, &request.question, &material.content)
        .await
        .map_err(AskError::Upstream)?;

    Ok(AskResponse {
        answer: script.render(&answer),
    })
}

/// CLI entry point — runs the pipeline once and prints the answer.
pub async fn run_ask(
    config: &Config,
    question: &str,
    level: &str,
    week: &str,
    language: &str,
) -> anyhow::Result<()> {
    let store = SqliteStore::open(config).await?;

    let request = AskRequest {
        level: level.to_string(),
        week: week.to_string(),
        question: question.to_string(),
        language: language.to_string(),
        gender: None,
    };

    let response = match answer_question(config, &store, &request).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", response.answer);

    store.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Material, MaterialSummary, NewMaterial};
    use anyhow::Result;
    use async_trait::async_trait;

    /// In-memory store so pipeline validation can be tested without SQLite.
    struct FixtureStore {
        material: Option<Material>,
    }

    #[async_trait]
    impl MaterialStore for FixtureStore {
        async fn fetch(&self, _level: &str, _week: &str) -> Result<Option<Material>> {
            Ok(self.material.clone())
        }
        async fn upsert(&self, _material: NewMaterial) -> Result<String> {
            unimplemented!("fixture store is read-only")
        }
        async fn list(&self) -> Result<Vec<MaterialSummary>> {
            Ok(Vec::new())
        }
    }

    fn fixture_config() -> Config {
        toml::from_str(
            r#"
[db]
path = "unused.sqlite"

[server]
bind = "127.0.0.1:0"
"#,
        )
        .unwrap()
    }

    fn request(language: &str) -> AskRequest {
        AskRequest {
            level: "beginner".to_string(),
            week: "week01".to_string(),
            question: "ما معنى مرحبا؟".to_string(),
            language: language.to_string(),
            gender: None,
        }
    }

    #[tokio::test]
    async fn test_invalid_language_rejected_before_lookup() {
        let store = FixtureStore { material: None };
        let err = answer_question(&fixture_config(), &store, &request("klingon"))
            .await
            .unwrap_err();
        assert!(matches!(err, AskError::InvalidLanguage(_)));
    }

    #[tokio::test]
    async fn test_missing_material_is_not_found() {
        let store = FixtureStore { material: None };
        let err = answer_question(&fixture_config(), &store, &request("arabic"))
            .await
            .unwrap_err();
        assert!(matches!(err, AskError::MaterialNotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let store = FixtureStore { material: None };
        let mut req = request("arabic");
        req.question = "   ".to_string();
        let err = answer_question(&fixture_config(), &store, &req)
            .await
            .unwrap_err();
        assert!(matches!(err, AskError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_disabled_provider_surfaces_as_upstream() {
        let store = FixtureStore {
            material: Some(Material {
                id: "m1".to_string(),
                level: "beginner".to_string(),
                week: "week01".to_string(),
                content: "مرحبا تعني أهلا.".to_string(),
                source_path: None,
                content_hash: "hash".to_string(),
                updated_at: 0,
            }),
        };
        let err = answer_question(&fixture_config(), &store, &request("arabic"))
            .await
            .unwrap_err();
        assert!(matches!(err, AskError::Upstream(_)));
    }

    #[test]
    fn test_gender_field_is_optional_on_the_wire() {
        let request: AskRequest = serde_json::from_str(
            r#"{"level":"beginner","week":"week01","question":"q","language":"arabic"}"#,
        )
        .unwrap();
        assert!(request.gender.is_none());

        let request: AskRequest = serde_json::from_str(
            r#"{"level":"beginner","week":"week01","question":"q","language":"arabic","gender":"male"}"#,
        )
        .unwrap();
        assert_eq!(request.gender.as_deref(), Some("male"));
    }

    #[test]
    fn test_language_defaults_to_arabic() {
        let request: AskRequest =
            serde_json::from_str(r#"{"level":"beginner","week":"week01","question":"q"}"#).unwrap();
        assert_eq!(request.language, "arabic");
    }
}
