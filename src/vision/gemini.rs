//! Gemini API連携
//!
//! generateContent に画像（inline_data）とプロンプトを送り、
//! JSONモード + responseSchema で構造化された応答を得る。

use super::VisionModel;
use crate::config::Config;
use crate::error::{CardScanError, Result};
use async_trait::async_trait;
use card_scan_common::CardImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini APIリクエスト
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig<'a> {
    temperature: f32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: &'a Value,
}

/// Gemini APIレスポンス
#[derive(Deserialize, Default)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini APIクライアント
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CardScanError::Config(format!("HTTPクライアント作成失敗: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.1,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::new(
            config.get_api_key()?,
            config.model.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?;
        client.temperature = config.temperature;
        Ok(client)
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_API_BASE, self.model)
    }
}

fn build_request<'a>(
    prompt: &'a str,
    image: &'a CardImage,
    schema: &'a Value,
    temperature: f32,
) -> GeminiRequest<'a> {
    GeminiRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: prompt },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: &image.content_type,
                        data: image.to_base64(),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature,
            response_mime_type: "application/json",
            response_schema: schema,
        },
    }
}

/// 最初の候補のテキストを取り出す
fn response_text(response: GeminiResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
}

#[async_trait]
impl VisionModel for GeminiClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, image: &CardImage, schema: &Value) -> Result<String> {
        let request = build_request(prompt, image, schema, self.temperature);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| CardScanError::ModelUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CardScanError::ModelUnavailable(format!(
                "API error {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        let payload: GeminiResponse = response
            .json()
            .await
            .map_err(|e| CardScanError::ModelUnavailable(format!("invalid response body: {}", e)))?;

        let text = response_text(payload)
            .ok_or_else(|| CardScanError::ModelUnavailable("Empty response".into()))?;
        debug!(model = %self.model, chars = text.len(), "vision response received");
        Ok(text)
    }
}
