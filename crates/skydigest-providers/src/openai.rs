//! OpenAI-compatible summarizer.
//!
//! Works with OpenAI's API and any endpoint speaking `/chat/completions`.

use crate::degraded::degraded_summary;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skydigest_core::{
    config::SummarizerConfig,
    conversation::Language,
    error::SkyError,
    traits::{Summarizer, Summary, SummaryRequest},
};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// OpenAI-compatible summarizer.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_input_chars: usize,
}

impl OpenAiSummarizer {
    /// Create from config values.
    pub fn from_config(config: &SummarizerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!("openai: failed to build http client ({e}), using defaults");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.trim().to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_input_chars: config.max_input_chars,
        }
    }

    async fn complete(&self, request: &SummaryRequest) -> Result<String, SkyError> {
        if self.api_key.is_empty() {
            return Err(SkyError::Provider("no API key configured".into()));
        }
        let start = Instant::now();

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(request.language).to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_transcript(request, self.max_input_chars),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("openai: POST {url} model={}", self.model);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SkyError::Provider(format!("openai request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(SkyError::Provider(format!(
                "openai returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| SkyError::Provider(format!("openai: failed to parse response: {e}")))?;

        let text = first_choice_text(&parsed)
            .ok_or_else(|| SkyError::Provider("openai: empty completion".into()))?;

        debug!(
            "openai: {} for {} in {}ms ({} tokens)",
            request.day_label,
            request.conversation_id,
            start.elapsed().as_millis(),
            parsed
                .usage
                .as_ref()
                .and_then(|u| u.total_tokens)
                .unwrap_or(0)
        );
        Ok(text)
    }
}

fn system_prompt(language: Language) -> &'static str {
    match language {
        Language::Zh => {
            "你是严谨的中文摘要助手，请总结群聊一天的内容，输出需：\n\
             • 保持关键事实与数字\n\
             • 使用条列式，避免冗长\n\
             • 若原文含任务、决策或未决事项，请条列标注"
        }
        Language::En => {
            "You summarize one day of a group chat. Requirements:\n\
             - keep key facts and numbers\n\
             - use concise bullet points\n\
             - call out tasks, decisions and open questions separately"
        }
    }
}

/// One line per message, clipped to `max_chars` on a char boundary.
fn build_transcript(request: &SummaryRequest, max_chars: usize) -> String {
    let joined = request
        .messages
        .iter()
        .map(|m| m.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    match joined.char_indices().nth(max_chars) {
        Some((idx, _)) => joined[..idx].to_string(),
        None => joined,
    }
}

fn first_choice_text(resp: &ChatCompletionResponse) -> Option<String> {
    resp.choices
        .as_ref()
        .and_then(|c| c.first())
        .and_then(|c| c.message.as_ref())
        .map(|m| m.content.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: Option<u64>,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    fn name(&self) -> &str {
        "openai"
    }

    async fn summarize(&self, request: &SummaryRequest) -> Summary {
        match self.complete(request).await {
            Ok(text) => Summary {
                text,
                degraded: false,
            },
            Err(e) => {
                warn!(
                    "openai: summary for {} failed, degrading: {e}",
                    request.conversation_id
                );
                let lines: Vec<&str> = request.messages.iter().map(|m| m.text.as_str()).collect();
                degraded_summary(&lines, request.language)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skydigest_core::message::StoredMessage;

    fn request(texts: &[&str], language: Language) -> SummaryRequest {
        SummaryRequest {
            conversation_id: "c1".into(),
            day_label: "2026-03-09".into(),
            language,
            messages: texts
                .iter()
                .enumerate()
                .map(|(i, t)| StoredMessage {
                    conversation_id: "c1".into(),
                    sender_id: Some("u1".into()),
                    text: t.to_string(),
                    timestamp_ms: i as i64,
                })
                .collect(),
        }
    }

    #[test]
    fn test_transcript_skips_blank_and_truncates() {
        let req = request(&["hello", "  ", "world"], Language::En);
        assert_eq!(build_transcript(&req, 100), "hello\nworld");
        assert_eq!(build_transcript(&req, 7), "hello\nw");

        let req = request(&["日報日報"], Language::Zh);
        assert_eq!(build_transcript(&req, 2), "日報");
    }

    #[test]
    fn test_system_prompt_follows_language() {
        assert!(system_prompt(Language::Zh).contains("中文"));
        assert!(system_prompt(Language::En).contains("bullet"));
    }

    #[test]
    fn test_request_serialization() {
        let body = ChatCompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![],
            temperature: 0.4,
            max_tokens: 900,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["max_tokens"], 900);
        assert_eq!(v["model"], "gpt-4o-mini");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":" - done \n"},"finish_reason":"stop"}],"usage":{"total_tokens":42}}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(first_choice_text(&resp).as_deref(), Some("- done"));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(first_choice_text(&empty).is_none());
    }

    #[tokio::test]
    async fn test_missing_key_degrades() {
        let s = OpenAiSummarizer::from_config(&SummarizerConfig::default());
        let summary = s.summarize(&request(&["a", "b"], Language::En)).await;
        assert!(summary.degraded);
        assert_eq!(summary.text, "(degraded summary)\n- a\n- b");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades() {
        let config = SummarizerConfig {
            api_key: "sk-test".into(),
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
            ..Default::default()
        };
        let s = OpenAiSummarizer::from_config(&config);
        let summary = s.summarize(&request(&["x"], Language::Zh)).await;
        assert!(summary.degraded);
        assert!(summary.text.starts_with("(降级摘要)"));
    }
}
