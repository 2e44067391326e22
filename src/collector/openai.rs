//! Analyst backed by the OpenAI Responses API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::SecretString;

use super::{Analyst, BarTable, CollectorError, build_user_message};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com".to_owned(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Clone)]
pub struct OpenAiAnalyst {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiAnalyst {
    pub fn new(config: OpenAiConfig) -> Result<Self, CollectorError> {
        if config.api_key.is_empty() {
            return Err(CollectorError::Analyst("API key is not configured".to_owned()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CollectorError::Analyst(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

fn output_text(body: ResponsesBody) -> String {
    body.output
        .into_iter()
        .flat_map(|item| item.content)
        .filter(|part| part.kind == "output_text")
        .map(|part| part.text)
        .collect::<Vec<_>>()
        .join("")
}

#[async_trait]
impl Analyst for OpenAiAnalyst {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "openai_analyze", skip_all, err)
    )]
    async fn analyze(
        &self,
        model: &str,
        system_prompt: &str,
        table: &BarTable,
    ) -> Result<String, CollectorError> {
        let url = format!("{}/v1/responses", self.config.base_url.trim_end_matches('/'));
        let payload = json!({
            "model": model,
            "input": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": build_user_message(table) },
            ],
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!(target: "rdx_dash::collector", "msg=\"analyst request failed\" error=\"{e}\"");
                CollectorError::Analyst(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            log::error!(target: "rdx_dash::collector", "msg=\"analyst returned error\" status={status}");
            return Err(CollectorError::Analyst(format!("{status}: {text}")));
        }

        let body: ResponsesBody = resp
            .json()
            .await
            .map_err(|e| CollectorError::MalformedResponse(e.to_string()))?;
        let text = output_text(body);
        if text.trim().is_empty() {
            return Err(CollectorError::MalformedResponse("empty output".to_owned()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_text_joins_text_parts() {
        let body: ResponsesBody = serde_json::from_value(json!({
            "output": [
                { "type": "reasoning", "content": [] },
                { "type": "message", "content": [
                    { "type": "output_text", "text": "{\"trend_summary\":" },
                    { "type": "refusal", "text": "ignored" },
                    { "type": "output_text", "text": "\"flat\"}" }
                ]}
            ]
        }))
        .unwrap();
        assert_eq!(output_text(body), "{\"trend_summary\":\"flat\"}");
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(OpenAiAnalyst::new(OpenAiConfig::new("")).is_err());
    }
}
