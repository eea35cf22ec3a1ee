//! プロンプト生成モジュール
//!
//! Visionモデルへのカード情報抽出プロンプトと、構造化出力スキーマを生成する。
//! - build_extraction_prompt: 抽出用プロンプト
//! - extraction_schema: responseSchema（JSON Schemaのサブセット）

use crate::modifiers::NameModifiers;
use serde_json::{json, Value};

/// カード情報抽出プロンプト生成
///
/// # Arguments
/// * `strict` - trueの場合、ポケモンカードかどうかの判定 (`isPokemonCard`) も要求する
/// * `modifiers` - 名前から除去すべき修飾語
pub fn build_extraction_prompt(strict: bool, modifiers: &NameModifiers) -> String {
    let modifier_list = modifiers
        .modifiers()
        .iter()
        .map(|m| format!("\"{}\"", m))
        .collect::<Vec<_>>()
        .join(", ");

    let strict_rules = if strict {
        r#"
## Card check
- First decide whether the image shows a Pokémon trading card.
- Set "isPokemonCard" to true or false.
- If it is not a Pokémon card, leave every other field empty and put a short reason in "error".
"#
    } else {
        ""
    };

    let strict_fields = if strict {
        r#",
  "isPokemonCard": true,
  "error": """#
    } else {
        ""
    };

    format!(
        r#"You are reading a photo of a single trading card. Extract the printed details.

## Fields
- name: the base card name only.
- set: the expansion/set name, if printed or identifiable from the set symbol.
- cardNumber: the collector number exactly as printed, e.g. "58/102" or "SV049".
- rarity: the rarity if it can be determined (e.g. "Common", "Rare Holo").

## Name rules
- Remove modifier tokens that are not part of the base name: {modifier_list}.
- Examples: "Pikachu VMAX" -> "Pikachu", "Radiant Greninja" -> "Greninja", "Charizard ex" -> "Charizard".
- Keep everything else exactly as printed.
{strict_rules}
## Output
- Return ONLY this JSON object, with no commentary.
- Use an empty string for any field you cannot read confidently. Do not guess.
{{
  "name": "",
  "set": "",
  "cardNumber": "",
  "rarity": ""{strict_fields}
}}
"#
    )
}

/// 構造化出力スキーマ
pub fn extraction_schema(strict: bool) -> Value {
    let mut properties = json!({
        "name": { "type": "STRING" },
        "set": { "type": "STRING" },
        "cardNumber": { "type": "STRING" },
        "rarity": { "type": "STRING" },
    });

    if strict {
        if let Some(map) = properties.as_object_mut() {
            map.insert("isPokemonCard".into(), json!({ "type": "BOOLEAN" }));
            map.insert("error".into(), json!({ "type": "STRING" }));
        }
    }

    let mut schema = json!({
        "type": "OBJECT",
        "properties": properties,
    });

    if strict {
        schema["required"] = json!(["isPokemonCard"]);
    }

    schema
}
