use super::{Capability, Tool, ToolArgs, ToolDescriptor, ToolOutput};
use crate::config::{AgentConfig, TranslationConfig};
use crate::resilience::OperationExecutor;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;
use url::Url;

/// Translation through an OpenAI-compatible chat-completion backend.
///
/// Takes `text` and an optional `target_lang`, answers with the original
/// text, the translation, and the language used.
pub struct TranslateTool {
    descriptor: ToolDescriptor,
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    default_target: String,
    executor: OperationExecutor,
}

impl TranslateTool {
    pub const NAME: &'static str = "translate";

    pub fn new(translation: &TranslationConfig, agent: &AgentConfig) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            descriptor: ToolDescriptor::new(Self::NAME, Capability::Translate),
            client,
            base_url: translation.base_url.trim_end_matches('/').to_string(),
            api_key: translation.api_key.clone(),
            model: translation.model.clone(),
            default_target: translation.target_language.clone(),
            executor: OperationExecutor::from_config(agent),
        })
    }

    fn completions_url(&self) -> Result<Url> {
        Url::parse(&format!("{}/chat/completions", self.base_url)).map_err(|e| Error::Parse {
            context: "translation url".to_string(),
            message: e.to_string(),
        })
    }

    fn system_prompt(target_lang: &str) -> String {
        format!(
            "You are a professional translator for biomedical literature. \
             Translate the user's text into {target_lang}, keeping the \
             terminology precise. If the text is a JSON record, translate only \
             the title and abstract fields and return the same JSON structure. \
             Return only the translation, with no commentary."
        )
    }

    async fn request_translation(
        &self,
        api_key: &str,
        text: &str,
        target_lang: &str,
    ) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": 0.3,
            "messages": [
                { "role": "system", "content": Self::system_prompt(target_lang) },
                { "role": "user", "content": text },
            ],
        });

        let response: Value = self
            .client
            .post(self.completions_url()?)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::Parse {
                context: "translation response".to_string(),
                message: "missing choices[0].message.content".to_string(),
            })
    }
}

#[async_trait]
impl Tool for TranslateTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke_async(&self, args: ToolArgs) -> Result<ToolOutput> {
        let text = args.get_str("text").unwrap_or_default();
        if text.is_empty() {
            return Err(Error::InvalidInput {
                field: "text".to_string(),
                reason: "text to translate is required".to_string(),
            });
        }
        let Some(api_key) = self.api_key.clone() else {
            return Err(Error::InvalidInput {
                field: "translation.api_key".to_string(),
                reason: "no API key configured for the translation backend".to_string(),
            });
        };
        let target_lang = args
            .get_str("target_lang")
            .unwrap_or(&self.default_target)
            .to_string();

        let translated = self
            .executor
            .execute(
                || self.request_translation(&api_key, text, &target_lang),
                args.exec_options(),
                "translation",
            )
            .await?;

        info!(target_lang = %target_lang, "translation finished");
        Ok(json!({
            "original_text": text,
            "translated_text": translated,
            "target_language": target_lang,
        }))
    }
}
