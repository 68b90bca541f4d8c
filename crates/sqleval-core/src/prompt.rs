use crate::errors::TemplateError;
use crate::providers::llm::registry::ModelRegistry;
use anyhow::Context;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tokio::time::{timeout, Duration};

pub const REASONING_OPEN: &str = "<reasoning>";
pub const REASONING_CLOSE: &str = "</reasoning>";
pub const ANSWER_OPEN: &str = "<final answer>";
pub const ANSWER_CLOSE: &str = "</final answer>";

/// Renders `{name}` placeholders. `{{` and `}}` produce literal braces.
/// Arguments without a matching placeholder are ignored.
pub fn render(template: &str, args: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    let mut literal_start = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                out.push_str(&template[literal_start..i]);
                out.push('{');
                i += 2;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                out.push_str(&template[literal_start..i]);
                out.push('}');
                i += 2;
                literal_start = i;
            }
            b'{' => {
                out.push_str(&template[literal_start..i]);
                let close = template[i + 1..]
                    .find('}')
                    .map(|off| i + 1 + off)
                    .ok_or(TemplateError::Unclosed(i))?;
                let name = template[i + 1..close].trim();
                let value = args
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| TemplateError::MissingArgument(name.to_string()))?;
                out.push_str(value);
                i = close + 1;
                literal_start = i;
            }
            b'}' => return Err(TemplateError::Unmatched(i)),
            _ => i += 1,
        }
    }
    out.push_str(&template[literal_start..]);
    Ok(out)
}

/// Outcome of pulling a delimited payload out of a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted<'a> {
    Tagged(&'a str),
    /// A marker was missing; the whole trimmed response stands in for the payload.
    Fallback(&'a str),
}

impl<'a> Extracted<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Extracted::Tagged(s) | Extracted::Fallback(s) => s,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Extracted::Fallback(_))
    }
}

pub fn extract_between<'a>(response: &'a str, open: &str, close: &str) -> Extracted<'a> {
    let Some(start) = response.find(open).map(|i| i + open.len()) else {
        return Extracted::Fallback(response.trim());
    };
    match response[start..].find(close) {
        Some(len) => Extracted::Tagged(response[start..start + len].trim()),
        None => Extracted::Fallback(response.trim()),
    }
}

pub fn extract_reasoning(response: &str) -> Extracted<'_> {
    extract_between(response, REASONING_OPEN, REASONING_CLOSE)
}

pub fn extract_final_answer(response: &str) -> Extracted<'_> {
    extract_between(response, ANSWER_OPEN, ANSWER_CLOSE)
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)```").expect("static regex")
    })
}

/// Strips Markdown code fences around SQL and trims whitespace. When several
/// fenced blocks are present the first one wins.
pub fn clean_sql(response: &str) -> String {
    if let Some(c) = fence_re().captures(response) {
        if let Some(m) = c.get(1) {
            return m.as_str().trim().to_string();
        }
    }
    response.trim().trim_matches('`').trim().to_string()
}

/// Delivers rendered prompts to the model resolved for an identifier.
#[derive(Clone)]
pub struct Prompter {
    registry: Arc<ModelRegistry>,
    timeout: Duration,
}

impl Prompter {
    pub fn new(registry: Arc<ModelRegistry>, timeout_seconds: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_seconds.max(1)),
        }
    }

    pub async fn prompt(
        &self,
        model: &str,
        template: &str,
        args: &[(&str, &str)],
    ) -> anyhow::Result<String> {
        let content = render(template, args)?;
        let client = self.registry.client(model)?;
        tracing::debug!(model, provider = client.provider_name(), prompt_len = content.len(), "prompting model");

        let resp = timeout(self.timeout, client.complete(&content))
            .await
            .with_context(|| format!("model '{}' timed out after {:?}", model, self.timeout))?
            .with_context(|| format!("model '{}' call failed", model))?;
        Ok(resp.text)
    }
}
