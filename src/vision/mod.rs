//! Visionモデル連携
//!
//! 画像をマルチモーダルモデルに送り、構造化されたカード情報を直接受け取る。
//! 応答なし・不正な応答は ModelUnavailable（再試行しない）。

mod gemini;

pub use gemini::GeminiClient;

use crate::error::{CardScanError, Result};
use async_trait::async_trait;
use card_scan_common::{
    build_extraction_prompt, extraction_schema, parse_vision_response, CardImage, Extraction,
    ExtractionSource, NameModifiers,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

const NOT_A_CARD_MESSAGE: &str = "not a Pokémon card";

/// マルチモーダルモデル
#[async_trait]
pub trait VisionModel: Send + Sync {
    fn name(&self) -> &str;

    /// プロンプト + 画像 + 出力スキーマを送り、応答テキストを返す
    async fn complete(&self, prompt: &str, image: &CardImage, schema: &Value) -> Result<String>;
}

/// Visionモデルによるカード情報抽出
#[derive(Clone)]
pub struct VisionExtractor {
    model: Arc<dyn VisionModel>,
    modifiers: NameModifiers,
    strict: bool,
}

impl VisionExtractor {
    pub fn new(model: Arc<dyn VisionModel>, modifiers: NameModifiers, strict: bool) -> Self {
        Self {
            model,
            modifiers,
            strict,
        }
    }

    /// Data URI形式の画像から抽出
    pub async fn extract_data_uri(&self, data_uri: &str) -> Result<Extraction> {
        let image = CardImage::from_data_uri(data_uri)?;
        self.extract_image(&image).await
    }

    pub async fn extract_image(&self, image: &CardImage) -> Result<Extraction> {
        let prompt = build_extraction_prompt(self.strict, &self.modifiers);
        let schema = extraction_schema(self.strict);

        debug!(model = self.model.name(), prompt_len = prompt.len(), "vision request");
        let response = self.model.complete(&prompt, image, &schema).await?;
        if response.trim().is_empty() {
            return Err(CardScanError::ModelUnavailable("empty response".into()));
        }

        let parsed = parse_vision_response(&response)
            .map_err(|e| CardScanError::ModelUnavailable(format!("malformed response: {}", e)))?;

        if parsed.is_pokemon_card == Some(false) {
            info!(model = self.model.name(), "image judged not to be a card");
            let mut extraction = Extraction::failed(
                ExtractionSource::Model,
                parsed.error.unwrap_or_else(|| NOT_A_CARD_MESSAGE.to_string()),
            );
            extraction.is_pokemon_card = Some(false);
            return Ok(extraction);
        }

        let mut fields = parsed.fields;
        let mut needs_review = false;
        if let Some(stripped) = fields.name().map(|name| self.modifiers.strip(name)) {
            if !stripped.removed.is_empty() {
                debug!(removed = ?stripped.removed, name = %stripped.name, "name modifiers removed");
            }
            needs_review = stripped.ambiguous;
            fields = fields.with_name(Some(&stripped.name));
        }

        Ok(Extraction {
            is_pokemon_card: parsed.is_pokemon_card,
            error: parsed.error,
            needs_review,
            ..Extraction::new(ExtractionSource::Model, fields)
        })
    }
}
