//! 対話式カード確認モジュール
//!
//! 識別結果の候補から1枚を選ぶか、抽出フィールドを手で修正して確定する。

use crate::error::{CardScanError, Result};
use card_scan_common::{CatalogCandidate, ExtractedFields, Identification};
use dialoguer::{Input, Select};
use serde::{Deserialize, Serialize};

/// 人が確定したカード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedCard {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    /// カタログ候補から選んだ場合のID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// 候補の表示ラベル
pub fn candidate_label(candidate: &CatalogCandidate) -> String {
    let mut label = candidate.name.clone();
    if !candidate.set.is_empty() {
        label.push_str(&format!(" / {}", candidate.set));
    }
    if !candidate.card_number.is_empty() {
        label.push_str(&format!(" #{}", candidate.card_number));
    }
    format!("{} ({})", label, candidate.id)
}

/// 候補を確定カードに変換（レアリティは抽出結果から引き継ぐ）
pub fn confirmed_from_candidate(candidate: &CatalogCandidate, fields: &ExtractedFields) -> ConfirmedCard {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    ConfirmedCard {
        name: candidate.name.clone(),
        set: non_empty(&candidate.set),
        card_number: non_empty(&candidate.card_number),
        rarity: fields.rarity().map(str::to_string),
        catalog_id: Some(candidate.id.clone()),
        image_url: candidate.image_url.clone(),
    }
}

/// 抽出フィールドを確定カードに変換（名前がなければNone）
pub fn confirmed_from_fields(fields: &ExtractedFields) -> Option<ConfirmedCard> {
    Some(ConfirmedCard {
        name: fields.name()?.to_string(),
        set: fields.set().map(str::to_string),
        card_number: fields.card_number().map(str::to_string),
        rarity: fields.rarity().map(str::to_string),
        catalog_id: None,
        image_url: None,
    })
}

/// 対話式で確定する（スキップ時はNone）
pub fn run_confirmation(identification: &Identification) -> Result<Option<ConfirmedCard>> {
    let fields = &identification.extraction.fields;

    if identification.extraction.needs_review {
        println!("⚠ 名前に曖昧な修飾語が含まれています。確認してください");
    }

    let mut items: Vec<String> = identification
        .candidates
        .iter()
        .map(candidate_label)
        .collect();
    let manual_index = items.len();
    items.push("手動で入力".to_string());
    items.push("スキップ".to_string());

    let selection = Select::new()
        .with_prompt("カードを選択")
        .items(&items)
        .default(0)
        .interact()
        .map_err(|e| CardScanError::Interactive(e.to_string()))?;

    if selection < manual_index {
        let candidate = &identification.candidates[selection];
        return Ok(Some(confirmed_from_candidate(candidate, fields)));
    }
    if selection > manual_index {
        return Ok(None);
    }

    let name = prompt_field("カード名", fields.name())?;
    let manual = ExtractedFields::from_parts(
        Some(&name),
        Some(&prompt_field("セット", fields.set())?),
        Some(&prompt_field("カード番号", fields.card_number())?),
        Some(&prompt_field("レアリティ", fields.rarity())?),
    );

    Ok(confirmed_from_fields(&manual))
}

fn prompt_field(label: &str, initial: Option<&str>) -> Result<String> {
    Input::<String>::new()
        .with_prompt(label)
        .with_initial_text(initial.unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(|e| CardScanError::Interactive(e.to_string()))
}
