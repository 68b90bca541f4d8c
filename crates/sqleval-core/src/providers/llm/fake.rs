use super::LlmClient;
use crate::model::LlmResponse;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted client: answers with queued responses in order, or with a
/// handler computed from the prompt. Records every prompt it receives.
pub struct FakeClient {
    model: String,
    queue: Mutex<VecDeque<String>>,
    handler: Option<Box<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            queue: Mutex::new(VecDeque::new()),
            handler: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queue
            .lock()
            .unwrap()
            .extend(responses.into_iter().map(Into::into));
        self
    }

    pub fn with_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(f));
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let text = match self.queue.lock().unwrap().pop_front() {
            Some(t) => t,
            None => match &self.handler {
                Some(h) => h(prompt)?,
                None => anyhow::bail!("fake client '{}' has no scripted response left", self.model),
            },
        };

        Ok(LlmResponse {
            text,
            provider: "fake".into(),
            model: self.model.clone(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
