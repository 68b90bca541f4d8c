use super::LlmClient;
use crate::model::LlmResponse;
use async_trait::async_trait;
use serde_json::json;

/// Local inference through an Ollama server (`/api/generate`, non-streaming).
pub struct OllamaClient {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(model: String, base_url: String, temperature: f32) -> Self {
        Self {
            model,
            base_url,
            temperature,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<LlmResponse> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": self.temperature },
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama generate error: {}", error_text);
        }

        let json: serde_json::Value = resp.json().await?;
        let text = json
            .get("response")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Ollama response missing 'response' field"))?
            .to_string();

        Ok(LlmResponse {
            text,
            provider: "ollama".to_string(),
            model: self.model.clone(),
            meta: json!({
                "eval_count": json.get("eval_count"),
                "total_duration": json.get("total_duration"),
            }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}
