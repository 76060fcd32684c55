//! OpenAI-compatible chat-completions adapter
//!
//! Every judgment is one JSON-mode completion. If the primary model's
//! request fails for any reason the same request is sent once to the backup
//! model before the error is reported.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Brief, Grade, Oracle, OracleError, Relevance, prompts};
use crate::utils::safe_truncate_chars;

/// Replies are cut to this many characters in logs and errors
const REPLY_LOG_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatOracleConfig {
    /// API root; `/chat/completions` is appended (default: `https://api.openai.com/v1`)
    pub base_url: String,
    /// Environment variable holding the bearer token (default: `OPENAI_API_KEY`)
    pub api_key_env: String,
    /// Primary model (default: `gpt-4o-mini`)
    pub model: String,
    /// Model tried once when the primary request fails (default: `gpt-4o`)
    pub backup_model: Option<String>,
    /// Per-request timeout in seconds (default: 60)
    pub request_timeout_secs: u64,
    pub temperature: f32,
}

impl Default for ChatOracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            backup_model: Some("gpt-4o".to_string()),
            request_timeout_secs: 60,
            temperature: 0.0,
        }
    }
}

pub struct ChatOracle {
    client: Client,
    config: ChatOracleConfig,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ScoreReply {
    score: i64,
}

#[derive(Deserialize)]
struct SummaryReply {
    summary: String,
}

#[derive(Deserialize)]
struct BudgetReply {
    budget: i64,
}

impl ChatOracle {
    /// Adapter for `config`, reading the API key from `config.api_key_env`
    pub fn new(config: ChatOracleConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            warn!(
                "{} is not set; oracle requests will be sent without authorization",
                config.api_key_env
            );
        }
        Self {
            client: Client::new(),
            config,
            api_key,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn config(&self) -> &ChatOracleConfig {
        &self.config
    }

    async fn complete<T: DeserializeOwned>(&self, system: &str, user: &str) -> Result<T, OracleError> {
        match self.request(&self.config.model, system, user).await {
            Ok(reply) => Ok(reply),
            Err(e) => match &self.config.backup_model {
                Some(backup) if *backup != self.config.model => {
                    warn!("Model {} failed ({e}); retrying with {backup}", self.config.model);
                    self.request(backup, system, user).await
                }
                _ => Err(e),
            },
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        model: &str,
        system: &str,
        user: &str,
    ) -> Result<T, OracleError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": model,
            "temperature": self.config.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
        });

        let mut request = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OracleError::Malformed("completion has no message content".into()))?;
        debug!(model, "Oracle reply: {}", safe_truncate_chars(&content, REPLY_LOG_CHARS));

        parse_reply(&content)
    }
}

/// Decode a JSON reply, tolerating a surrounding markdown code fence
fn parse_reply<T: DeserializeOwned>(content: &str) -> Result<T, OracleError> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced.trim())
        .map_err(|e| {
            OracleError::Malformed(format!(
                "{e} in reply {:?}",
                safe_truncate_chars(trimmed, REPLY_LOG_CHARS)
            ))
        })
}

#[async_trait]
impl Oracle for ChatOracle {
    async fn score_relevance(&self, query: &str, document: &str) -> Result<Relevance, OracleError> {
        let reply: ScoreReply = self
            .complete(prompts::RELEVANCE_SYSTEM, &prompts::relevance_user(query, document))
            .await?;
        Relevance::new(reply.score)
    }

    async fn compress(&self, query: &str, document: &str) -> Result<Brief, OracleError> {
        let reply: SummaryReply = self
            .complete(prompts::COMPRESS_SYSTEM, &prompts::compress_user(query, document))
            .await?;
        Ok(Brief::from_text(reply.summary))
    }

    async fn grade_sufficiency(&self, queries: &[String], corpus: &str) -> Result<Grade, OracleError> {
        self.complete(prompts::GRADE_SYSTEM, &prompts::grade_user(queries, corpus))
            .await
    }

    async fn assign_budget(&self, queries: &[String]) -> Result<Option<u32>, OracleError> {
        let reply: BudgetReply = self
            .complete(prompts::BUDGET_SYSTEM, &prompts::budget_user(queries))
            .await?;
        u32::try_from(reply.budget)
            .ok()
            .filter(|budget| *budget > 0)
            .map(Some)
            .ok_or_else(|| OracleError::Malformed(format!("budget {} is not positive", reply.budget)))
    }
}
