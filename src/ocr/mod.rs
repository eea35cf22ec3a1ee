//! OCR（文字認識）モジュール
//!
//! エンジンは呼び出しごとに初期化し、成功・失敗どちらの経路でも必ず解放する。
//! 認識エラーは空テキスト + エラーメッセージに変換し、呼び出し元へは伝播させない。

mod tesseract;

pub use tesseract::TesseractEngine;

use crate::error::Result;
use async_trait::async_trait;
use card_scan_common::CardImage;
use serde::Serialize;
use tracing::{debug, warn};

/// 認識を許可する文字（英数字 + 空白 + ./-'&）
pub const CHAR_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 ./-'&";

/// 自動ページ分割
pub const PSM_AUTO: u8 = 3;

/// OCR設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrOptions {
    pub language: String,
    pub char_whitelist: String,
    pub page_seg_mode: u8,
    pub preserve_interword_spaces: bool,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "eng".into(),
            char_whitelist: CHAR_WHITELIST.into(),
            page_seg_mode: PSM_AUTO,
            preserve_interword_spaces: true,
        }
    }
}

impl OcrOptions {
    pub fn with_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }
}

/// OCR結果（失敗時は text が空で error が入る）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OcrOutput {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrOutput {
    fn failed(error: impl ToString) -> Self {
        Self {
            text: String::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// 初期化済みのOCRセッション（1リクエスト専用、共有しない）
#[async_trait]
pub trait OcrSession: Send {
    async fn recognize(&mut self, image: &[u8]) -> Result<String>;

    /// セッションの資源を解放
    async fn terminate(self: Box<Self>) -> Result<()>;
}

/// OCRエンジン
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &'static str;

    async fn init(&self, options: &OcrOptions) -> Result<Box<dyn OcrSession>>;
}

/// 画像バイト列からテキストを抽出
pub async fn extract_text(engine: &dyn OcrEngine, image: &[u8], options: &OcrOptions) -> OcrOutput {
    let mut session = match engine.init(options).await {
        Ok(session) => session,
        Err(e) => {
            warn!(engine = engine.name(), error = %e, "OCR engine init failed");
            return OcrOutput::failed(e);
        }
    };

    let recognized = session.recognize(image).await;

    if let Err(e) = session.terminate().await {
        warn!(engine = engine.name(), error = %e, "OCR engine release failed");
    }

    match recognized {
        Ok(text) => {
            debug!(engine = engine.name(), chars = text.len(), "OCR finished");
            OcrOutput { text, error: None }
        }
        Err(e) => {
            warn!(engine = engine.name(), error = %e, "OCR recognition failed");
            OcrOutput::failed(e)
        }
    }
}

/// Data URIからテキストを抽出
pub async fn extract_text_from_data_uri(
    engine: &dyn OcrEngine,
    data_uri: &str,
    options: &OcrOptions,
) -> OcrOutput {
    match CardImage::from_data_uri(data_uri) {
        Ok(image) => extract_text(engine, &image.bytes, options).await,
        Err(e) => OcrOutput::failed(e),
    }
}
