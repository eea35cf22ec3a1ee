//! カード解析の型定義
//!
//! CLIとライブラリで共有される型:
//! - CardImage: 1回の解析リクエストで扱う画像
//! - ExtractedFields: OCR/Visionモデルどちらの経路でも共通の抽出結果
//! - CatalogCandidate: カードカタログの検索結果1件
//! - CardQuery: カタログ検索条件
//! - Extraction / Identification: パイプラインの部分結果

use serde::{Deserialize, Serialize};

/// 前後の空白を除去し、空文字は「未検出」(None) として扱う
///
/// ExtractedFields / CardQuery の全フィールドはこの関数を通して設定される。
pub fn clean_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// カード画像（生バイト + Content-Type）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl CardImage {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }
}

/// 抽出されたカード情報
///
/// 空文字のフィールドは存在しない。確信を持って読み取れなかった項目は `None`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFields")]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rarity: Option<String>,
}

/// デシリアライズ用の未正規化フィールド
///
/// `cardNumber` の代わりに `number` を返すモデルもあるため alias で受ける。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFields {
    pub name: Option<String>,
    pub set: Option<String>,
    #[serde(alias = "number")]
    pub card_number: Option<String>,
    pub rarity: Option<String>,
}

impl From<RawFields> for ExtractedFields {
    fn from(raw: RawFields) -> Self {
        Self::from_parts(
            raw.name.as_deref(),
            raw.set.as_deref(),
            raw.card_number.as_deref(),
            raw.rarity.as_deref(),
        )
    }
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        name: Option<&str>,
        set: Option<&str>,
        card_number: Option<&str>,
        rarity: Option<&str>,
    ) -> Self {
        Self {
            name: clean_field(name),
            set: clean_field(set),
            card_number: clean_field(card_number),
            rarity: clean_field(rarity),
        }
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = clean_field(name);
        self
    }

    pub fn with_set(mut self, set: Option<&str>) -> Self {
        self.set = clean_field(set);
        self
    }

    pub fn with_card_number(mut self, card_number: Option<&str>) -> Self {
        self.card_number = clean_field(card_number);
        self
    }

    pub fn with_rarity(mut self, rarity: Option<&str>) -> Self {
        self.rarity = clean_field(rarity);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set(&self) -> Option<&str> {
        self.set.as_deref()
    }

    pub fn card_number(&self) -> Option<&str> {
        self.card_number.as_deref()
    }

    pub fn rarity(&self) -> Option<&str> {
        self.rarity.as_deref()
    }

    /// 1項目も読み取れていない
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.set.is_none() && self.card_number.is_none() && self.rarity.is_none()
    }
}

/// カードカタログの検索結果1件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogCandidate {
    /// カタログ側の一意ID
    pub id: String,
    pub name: String,
    /// セット表示名
    pub set: String,
    pub card_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// カタログ検索条件
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardQuery {
    name: Option<String>,
    set: Option<String>,
    card_number: Option<String>,
}

impl CardQuery {
    pub fn new(name: Option<&str>, set: Option<&str>, card_number: Option<&str>) -> Self {
        Self {
            name: clean_field(name),
            set: clean_field(set),
            card_number: clean_field(card_number),
        }
    }

    pub fn from_fields(fields: &ExtractedFields) -> Self {
        Self::new(fields.name(), fields.set(), fields.card_number())
    }

    /// セット条件を外したクエリ（1回目の検索用）
    pub fn without_set(&self) -> Self {
        Self {
            set: None,
            ..self.clone()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set(&self) -> Option<&str> {
        self.set.as_deref()
    }

    pub fn card_number(&self) -> Option<&str> {
        self.card_number.as_deref()
    }

    /// 検索条件が1つもない
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.set.is_none() && self.card_number.is_none()
    }
}

/// 抽出経路
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Ocr,
    Model,
}

impl std::fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionSource::Ocr => write!(f, "OCR"),
            ExtractionSource::Model => write!(f, "Vision model"),
        }
    }
}

/// 1経路分の抽出結果（部分結果を許容）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub source: ExtractionSource,

    #[serde(default)]
    pub fields: ExtractedFields,

    /// 厳格モードでのカード判定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pokemon_card: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// 人手での確認が必要（曖昧な名前など）
    #[serde(default)]
    pub needs_review: bool,

    /// OCR生テキスト
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl Extraction {
    pub fn new(source: ExtractionSource, fields: ExtractedFields) -> Self {
        Self {
            source,
            fields,
            is_pokemon_card: None,
            error: None,
            needs_review: false,
            raw_text: None,
        }
    }

    /// フィールドなし + エラーメッセージ
    pub fn failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(source, ExtractedFields::default())
        }
    }
}

/// パイプライン最終結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub extraction: Extraction,

    #[serde(default)]
    pub candidates: Vec<CatalogCandidate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_error: Option<String>,
}
