//! APIレスポンスパーサー
//!
//! VisionモデルのレスポンスからJSONオブジェクトを抽出し、
//! カード情報（VisionResponse）にパースする

use crate::error::{Error, Result};
use crate::types::{ExtractedFields, RawFields};
use serde::Deserialize;

/// Visionモデルの応答
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisionResponse {
    /// 正規化済みフィールド（空文字なし）
    pub fields: ExtractedFields,
    pub is_pokemon_card: Option<bool>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawVisionResponse {
    #[serde(flatten)]
    fields: RawFields,
    is_pokemon_card: Option<bool>,
    error: Option<String>,
}

/// APIレスポンスからJSONオブジェクト部分を抽出
///
/// 抽出優先順位:
/// 1. ```json ... ``` ブロック
/// 2. 生の {...} オブジェクト
/// 3. エラー
///
/// # Examples
/// ```
/// use card_scan_common::extract_json_object;
///
/// let response = "Result: {\"name\": \"Pikachu\"}";
/// let json = extract_json_object(response).unwrap();
/// assert_eq!(json, "{\"name\": \"Pikachu\"}");
/// ```
pub fn extract_json_object(response: &str) -> Result<&str> {
    if let Some(start_marker) = response.find("```json") {
        let start = start_marker + 7; // "```json" の長さ
        if let Some(end_offset) = response[start..].find("```") {
            let end = start + end_offset;
            return Ok(response[start..end].trim());
        }
    }

    if let Some(start) = response.find('{') {
        if let Some(end) = response.rfind('}') {
            if end >= start {
                return Ok(&response[start..=end]);
            }
        }
    }

    Err(Error::Parse("JSON object not found".into()))
}

/// Visionモデルのレスポンスをパース
///
/// フィールドは trim され、空文字は None に変換される。
pub fn parse_vision_response(response: &str) -> Result<VisionResponse> {
    let json_str = extract_json_object(response)?;
    let raw: RawVisionResponse = serde_json::from_str(json_str.trim())
        .map_err(|e| Error::Parse(format!("vision response JSON: {}", e)))?;

    Ok(VisionResponse {
        fields: raw.fields.into(),
        is_pokemon_card: raw.is_pokemon_card,
        error: raw
            .error
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
    })
}
