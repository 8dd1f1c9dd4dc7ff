//! Client for an OpenAI-compatible chat completions gateway.
//!
//! Three calls go through it: audio transcription (multimodal message with a
//! base64 `input_audio` part), event extraction from a transcript, and
//! free-form questions over the whole diary.

pub mod parse;
pub mod prompts;

use base64::Engine as _;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use parse::ExtractedEvent;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI gateway not configured (set MURMUR_AI_KEY)")]
    NotConfigured,

    #[error("rate limit exceeded, please try again later")]
    RateLimited,

    #[error("AI credits exhausted, payment required")]
    PaymentRequired,

    #[error("AI gateway error: {0}")]
    Backend(String),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    InputAudio { input_audio: InputAudio },
}

#[derive(Serialize)]
struct InputAudio {
    data: String,
    format: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatMessage {
    fn system(text: String) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text),
        }
    }

    fn user(content: MessageContent) -> Self {
        Self { role: "user", content }
    }
}

/// Normalize an upload's MIME type and pick the `input_audio` format tag.
/// Only wav and mp3 are distinguished; everything else is sent as wav.
pub fn audio_format(mime: &str) -> &'static str {
    let mime = match mime.trim() {
        "" | "audio/webm;codecs=opus" => "audio/webm",
        other => other,
    };
    if mime.contains("wav") {
        "wav"
    } else if mime.contains("mp3") {
        "mp3"
    } else {
        "wav"
    }
}

/// Used when the assistant returns an empty answer.
pub const FALLBACK_ANSWER: &str = "I couldn't process your question.";

#[derive(Clone)]
pub struct GatewayClient {
    url: String,
    key: String,
    transcribe_model: String,
    analysis_model: String,
    assistant_model: String,
    language: String,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Build a client, or `None` when no API key is configured.
    pub fn from_config(config: &AiConfig) -> anyhow::Result<Option<Self>> {
        if !config.is_enabled() {
            return Ok(None);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Some(Self {
            url: config.gateway_url.clone(),
            key: config.api_key.clone(),
            transcribe_model: config.transcribe_model.clone(),
            analysis_model: config.analysis_model.clone(),
            assistant_model: config.assistant_model.clone(),
            language: config.language.clone(),
            client,
        }))
    }

    async fn complete(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String, AiError> {
        let req = ChatRequest { model, messages };
        let start = std::time::Instant::now();
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.key)
            .json(&req)
            .send()
            .await
            .map_err(|e| AiError::Backend(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, model, "AI gateway error");
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AiError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => AiError::PaymentRequired,
                _ => AiError::Backend(format!("gateway returned {status}")),
            });
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Backend(format!("response parse failed: {e}")))?;
        tracing::debug!(model, duration_ms = start.elapsed().as_millis() as u64, "completion done");

        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    /// Literal transcription of an audio clip.
    pub async fn transcribe(&self, audio: &[u8], mime: &str) -> Result<String, AiError> {
        let format = audio_format(mime);
        tracing::info!(bytes = audio.len(), mime, format, "sending audio for transcription");

        let data = base64::engine::general_purpose::STANDARD.encode(audio);
        let messages = vec![
            ChatMessage::system(prompts::transcription_system(&self.language)),
            ChatMessage::user(MessageContent::Parts(vec![
                ContentPart::Text {
                    text: prompts::TRANSCRIPTION_REQUEST.to_string(),
                },
                ContentPart::InputAudio {
                    input_audio: InputAudio { data, format },
                },
            ])),
        ];
        let transcript = self.complete(&self.transcribe_model, messages).await?;
        Ok(transcript.trim().to_string())
    }

    /// Dated events mentioned in a transcript. An unreadable reply is an
    /// empty list, not an error.
    pub async fn extract_events(
        &self,
        transcript: &str,
        today: NaiveDate,
    ) -> Result<Vec<ExtractedEvent>, AiError> {
        let messages = vec![
            ChatMessage::system(prompts::extraction_system(today)),
            ChatMessage::user(MessageContent::Text(transcript.to_string())),
        ];
        let reply = self.complete(&self.analysis_model, messages).await?;
        tracing::debug!(reply = %reply, "extraction reply");
        Ok(parse::parse_events(&reply))
    }

    /// Answer a question given pre-rendered entry and event context.
    pub async fn answer(
        &self,
        question: &str,
        entries_context: &str,
        events_context: &str,
        today: NaiveDate,
    ) -> Result<String, AiError> {
        let messages = vec![
            ChatMessage::system(prompts::assistant_system(
                &self.language,
                today,
                entries_context,
                events_context,
            )),
            ChatMessage::user(MessageContent::Text(question.to_string())),
        ];
        let answer = self.complete(&self.assistant_model, messages).await?;
        if answer.trim().is_empty() {
            return Ok(FALLBACK_ANSWER.to_string());
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_format_mapping() {
        assert_eq!(audio_format("audio/wav"), "wav");
        assert_eq!(audio_format("audio/x-wav"), "wav");
        assert_eq!(audio_format("audio/mp3"), "mp3");
        assert_eq!(audio_format("audio/webm;codecs=opus"), "wav");
        assert_eq!(audio_format(""), "wav");
    }

    #[test]
    fn disabled_without_key() {
        let config = AiConfig::default();
        assert!(GatewayClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn multimodal_message_shape() {
        let msg = ChatMessage::user(MessageContent::Parts(vec![
            ContentPart::Text { text: "hi".into() },
            ContentPart::InputAudio {
                input_audio: InputAudio {
                    data: "AAAA".into(),
                    format: "wav",
                },
            },
        ]));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][1]["type"], "input_audio");
        assert_eq!(json["content"][1]["input_audio"]["format"], "wav");
    }
}
