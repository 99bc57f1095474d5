use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::provider::{ChatModel, ModelError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// [`ChatModel`] backed by an OpenAI-compatible chat-completions endpoint.
///
/// Requests run with `temperature = 0`: classification should be as
/// repeatable as the service allows.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiChat {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        debug!(model = %self.model, url = %url, "Chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: serde_json::Value = response.json().await?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ModelError::Parse("missing choices[0].message.content".into()))?
            .to_string();

        Ok(content)
    }
}
