//! Answer provider abstraction and implementations.
//!
//! Defines the [`AnswerProvider`] trait and concrete implementations:
//! - **[`DisabledProvider`]** — returns errors; used when answering is not configured.
//! - **[`OpenAiProvider`]** — calls the OpenAI chat completions API.
//! - **[`GeminiProvider`]** — calls the Gemini `generateContent` API.
//!
//! The question pipeline asks the configured primary provider and, when a
//! fallback is configured, retries the question there after a primary
//! failure ([`ask_with_fallback`]).
//!
//! # Retry Strategy
//!
//! Both HTTP providers use exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::AnswerConfig;

/// Trait for answer providers.
///
/// Carries provider metadata; the actual model call is performed by
/// [`ask_provider`] (kept as a free function due to async trait limitations).
pub trait AnswerProvider: Send + Sync {
    /// Returns the provider identifier (e.g. `"openai"`).
    fn provider_name(&self) -> &str;
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;
}

/// Assemble the tutoring prompt: the stored material is the only source the
/// model may answer from, and the answer must stay in Arabic script so that
/// transliteration can be applied afterwards.
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an Arabic teacher. You must answer only based on the given context.\n\n\
         Context:\n{}\n\n\
         Question:\n{}\n\n\
         Answer in Arabic.",
        context, question
    )
}

/// Ask the configured provider to answer `question` against `context`.
///
/// Dispatches on the config's `provider` field and returns the model's
/// answer text.
pub async fn ask_provider(config: &AnswerConfig, question: &str, context: &str) -> Result<String> {
    match config.provider.as_str() {
        "openai" => ask_openai(config, question, context).await,
        "gemini" => ask_gemini(config, question, context).await,
        "disabled" => bail!("Answer provider is disabled"),
        other => bail!("Unknown answer provider: {}", other),
    }
}

/// Ask the primary provider; on failure, report it and try the configured
/// fallback provider with the same question.
pub async fn ask_with_fallback(
    config: &AnswerConfig,
    question: &str,
    context: &str,
) -> Result<String> {
    match ask_provider(config, question, context).await {
        Ok(answer) => Ok(answer),
        Err(primary_err) => match config.fallback() {
            Some(fallback_config) => {
                eprintln!(
                    "Provider '{}' failed ({}); trying '{}'",
                    config.provider, primary_err, fallback_config.provider
                );
                ask_provider(&fallback_config, question, context).await
            }
            None => Err(primary_err),
        },
    }
}

// ============ Disabled Provider ============

/// A no-op answer provider that always returns errors.
///
/// Used when `answer.provider = "disabled"` in the configuration.
pub struct DisabledProvider;

impl AnswerProvider for DisabledProvider {
    fn provider_name(&self) -> &str {
        "disabled"
    }
    fn model_name(&self) -> &str {
        "disabled"
    }
}

// ============ OpenAI Provider ============

/// Answer provider using the OpenAI chat completions API.
///
/// Calls `POST /v1/chat/completions` with the configured model.
/// Requires the `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAiProvider {
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &AnswerConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("answer.model required for OpenAI provider"))?;

        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }

        Ok(Self { model })
    }
}

impl AnswerProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }
    fn model_name(&self) -> &str {
        &self.model
    }
}

async fn ask_openai(config: &AnswerConfig, question: &str, context: &str) -> Result<String> {
    let api_key =
        std::env::var("OPENAI_API_KEY").map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("answer.model required"))?;

    let base = config.url.as_deref().unwrap_or("https://api.openai.com");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "model": model,
        "messages": [
            { "role": "user", "content": build_prompt(question, context) }
        ],
        "max_tokens": config.max_output_tokens,
    });

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(format!("{}/v1/chat/completions", base))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_openai_answer(&json);
                }

                // Rate limited or server error — retry
                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!(
                        "OpenAI API error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }

                // Client error (not 429) — don't retry
                let body_text = response.text().await.unwrap_or_default();
                bail!("OpenAI API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("OpenAI request failed after retries")))
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_openai_answer(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))?;

    Ok(content.trim().to_string())
}

// ============ Gemini Provider ============

/// Answer provider using the Gemini `generateContent` API.
///
/// Calls `POST /v1beta/models/{model}:generateContent` on the configured
/// base URL (default: `https://generativelanguage.googleapis.com`).
/// Requires the `GEMINI_API_KEY` environment variable to be set.
pub struct GeminiProvider {
    model: String,
    #[allow(dead_code)]
    url: String,
}

impl GeminiProvider {
    pub fn new(config: &AnswerConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("answer.model required for Gemini provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());

        if std::env::var("GEMINI_API_KEY").is_err() {
            bail!("GEMINI_API_KEY environment variable not set");
        }

        Ok(Self { model, url })
    }
}

impl AnswerProvider for GeminiProvider {
    fn provider_name(&self) -> &str {
        "gemini"
    }
    fn model_name(&self) -> &str {
        &self.model
    }
}

async fn ask_gemini(config: &AnswerConfig, question: &str, context: &str) -> Result<String> {
    let api_key =
        std::env::var("GEMINI_API_KEY").map_err(|_| anyhow::anyhow!("GEMINI_API_KEY not set"))?;

    let model = config
        .model
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("answer.model required"))?;

    let base = config
        .url
        .as_deref()
        .unwrap_or("https://generativelanguage.googleapis.com");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;

    let body = serde_json::json!({
        "contents": [
            { "parts": [ { "text": build_prompt(question, context) } ] }
        ],
        "generationConfig": { "maxOutputTokens": config.max_output_tokens },
    });

    let mut last_err = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let resp = client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                base, model
            ))
            .header("x-goog-api-key", &api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    let json: serde_json::Value = response.json().await?;
                    return parse_gemini_answer(&json);
                }

                if status.as_u16() == 429 || status.is_server_error() {
                    let body_text = response.text().await.unwrap_or_default();
                    last_err = Some(anyhow::anyhow!(
                        "Gemini API error {}: {}",
                        status,
                        body_text
                    ));
                    continue;
                }

                let body_text = response.text().await.unwrap_or_default();
                bail!("Gemini API error {}: {}", status, body_text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Gemini request failed after retries")))
}

/// Extract and join `candidates[0].content.parts[].text` from a
/// `generateContent` response.
fn parse_gemini_answer(json: &serde_json::Value) -> Result<String> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Gemini response: missing candidate parts"))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        bail!("Invalid Gemini response: empty candidate text");
    }

    Ok(text.trim().to_string())
}

/// Create the appropriate [`AnswerProvider`] based on configuration.
///
/// # Errors
///
/// Returns an error for unknown provider names or if the provider cannot
/// be initialized (missing model or API key).
pub fn create_provider(config: &AnswerConfig) -> Result<Box<dyn AnswerProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledProvider)),
        "openai" => Ok(Box::new(OpenAiProvider::new(config)?)),
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        other => bail!("Unknown answer provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_contains_context_and_question() {
        let prompt = build_prompt("ما معنى مرحبا؟", "مرحبا تعني أهلا.");
        assert!(prompt.contains("Context:\nمرحبا تعني أهلا."));
        assert!(prompt.contains("Question:\nما معنى مرحبا؟"));
        assert!(prompt.contains("Answer in Arabic."));
    }

    #[test]
    fn test_parse_openai_answer() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  مرحبا تعني أهلا.  " } }
            ]
        });
        assert_eq!(parse_openai_answer(&json).unwrap(), "مرحبا تعني أهلا.");
    }

    #[test]
    fn test_parse_openai_answer_missing_choices() {
        let json = serde_json::json!({ "choices": [] });
        assert!(parse_openai_answer(&json).is_err());
    }

    #[test]
    fn test_parse_gemini_answer_joins_parts() {
        let json = serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "مرحبا " }, { "text": "تعني أهلا." } ] } }
            ]
        });
        assert_eq!(parse_gemini_answer(&json).unwrap(), "مرحبا تعني أهلا.");
    }

    #[test]
    fn test_parse_gemini_answer_empty() {
        let json = serde_json::json!({
            "candidates": [ { "content": { "parts": [] } } ]
        });
        assert!(parse_gemini_answer(&json).is_err());
    }

    #[tokio::test]
    async fn test_ask_disabled_provider_errors() {
        let config = AnswerConfig::default();
        assert!(ask_provider(&config, "q", "ctx").await.is_err());
    }

    #[test]
    fn test_create_provider_disabled() {
        let provider = create_provider(&AnswerConfig::default()).unwrap();
        assert_eq!(provider.provider_name(), "disabled");
    }

    #[test]
    fn test_create_provider_unknown() {
        let config = AnswerConfig {
            provider: "arabert".to_string(),
            ..AnswerConfig::default()
        };
        assert!(create_provider(&config).is_err());
    }
}
