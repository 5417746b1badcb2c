//! Model API resource client
//!
//! OpenAI-compatible chat completions (text and vision) and audio
//! transcription.

use crate::client::HttpClient;
use crate::config::LlmConfig;
use crate::error::{SdkError, SdkResult};
use base64::Engine;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Content part for multimodal messages (text or image).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
    /// "auto", "low" or "high"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image_url_with_detail(url: impl Into<String>, detail: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.into(),
                detail: Some(detail.into()),
            },
        }
    }
}

/// Message content - either simple text or multimodal (text + images).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// Optional sampling parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChatOptions {
    /// Sampling temperature (0 = deterministic).
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn deterministic() -> Self {
        Self {
            temperature: Some(0.0),
            max_tokens: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Token usage information (if provided).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct TranscriptionBody {
    text: String,
}

/// Client for the model API
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Arc<HttpClient>,
    config: Arc<LlmConfig>,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> SdkResult<Self> {
        config.validate()?;
        let client = Arc::new(HttpClient::new(config.to_sdk_config())?);
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a chat completion and return the first choice's text.
    pub async fn chat(&self, messages: &[ChatMessage], options: ChatOptions) -> SdkResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let body: ChatResponseBody = self.client.post("/chat/completions", &request).await?;
        if let Some(usage) = body.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| SdkError::LlmError("no content in completion".to_string()))
    }

    /// System + user completion.
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
    ) -> SdkResult<String> {
        let mut messages = Vec::with_capacity(2);
        if !system.trim().is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(user));
        self.chat(&messages, options).await
    }

    /// Ask about one or more local images, sent inline as data URLs.
    pub async fn describe_images(
        &self,
        prompt: &str,
        images: &[impl AsRef<Path>],
        detail: &str,
        options: ChatOptions,
    ) -> SdkResult<String> {
        let mut parts = vec![ContentPart::text(prompt)];
        for path in images {
            let path = path.as_ref();
            let bytes = tokio::fs::read(path).await?;
            parts.push(ContentPart::image_url_with_detail(
                image_data_url(path, &bytes),
                detail,
            ));
        }
        info!(images = images.len(), model = %self.config.model, "Sending vision request");
        self.chat(&[ChatMessage::user_parts(parts)], options).await
    }

    /// Transcribe an audio file.
    pub async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> SdkResult<String> {
        let model = self.config.transcription_model.clone();
        let language = self.config.transcription_language.clone();
        let file_name = file_name.to_string();

        info!(file = %file_name, bytes = audio.len(), "Transcribing audio");
        let body: TranscriptionBody = self
            .client
            .post_multipart("/audio/transcriptions", || {
                let mut form = Form::new()
                    .text("model", model.clone())
                    .part("file", Part::bytes(audio.clone()).file_name(file_name.clone()));
                if let Some(language) = &language {
                    form = form.text("language", language.clone());
                }
                form
            })
            .await?;
        Ok(body.text.trim().to_string())
    }
}

/// `data:` URL for an image, with the MIME type taken from the extension.
pub fn image_data_url(path: &Path, bytes: &[u8]) -> String {
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    };
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, encoded)
}
