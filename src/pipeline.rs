//! カード識別パイプライン
//!
//! 2つの抽出経路を同じ `FieldExtractor` として扱う:
//! - OCR経路: 前処理 → OCR → フィールドパーサー
//! - モデル経路: 画像 → Visionモデル（構造化出力）
//!
//! 抽出結果をカタログ照合に渡し、候補一覧を返す。
//! どの段階のエラーも部分結果に変換し、呼び出し元には返さない。

use crate::catalog::{find_matches, CatalogClient, CatalogTransport};
use crate::error::{CardScanError, Result};
use crate::ocr::{extract_text, OcrEngine, OcrOptions};
use crate::preprocess::prepare_for_ocr;
use crate::vision::VisionExtractor;
use async_trait::async_trait;
use card_scan_common::{parse_fields, CardImage, Extraction, ExtractionSource, Identification};
use clap::ValueEnum;
use std::sync::Arc;
use tracing::{info, warn};

/// 画像からカード情報を抽出する
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    fn source(&self) -> ExtractionSource;

    async fn extract(&self, image: &CardImage) -> Result<Extraction>;
}

/// 抽出モード
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExtractionMode {
    /// Visionモデル → 失敗時OCR
    Auto,
    /// Visionモデルのみ
    Model,
    /// OCRのみ
    Ocr,
}

/// OCR経路
pub struct OcrExtractor {
    engine: Arc<dyn OcrEngine>,
    options: OcrOptions,
    preprocess: bool,
}

impl OcrExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>, options: OcrOptions) -> Self {
        Self {
            engine,
            options,
            preprocess: true,
        }
    }

    /// 前処理（グレースケール + 上部切り出し）を行うか
    pub fn with_preprocess(mut self, preprocess: bool) -> Self {
        self.preprocess = preprocess;
        self
    }
}

#[async_trait]
impl FieldExtractor for OcrExtractor {
    fn source(&self) -> ExtractionSource {
        ExtractionSource::Ocr
    }

    async fn extract(&self, image: &CardImage) -> Result<Extraction> {
        let bytes = if self.preprocess {
            prepare_for_ocr(&image.bytes)
        } else {
            image.bytes.clone()
        };

        let output = extract_text(self.engine.as_ref(), &bytes, &self.options).await;
        let fields = parse_fields(&output.text);

        Ok(Extraction {
            error: output.error,
            raw_text: Some(output.text),
            ..Extraction::new(ExtractionSource::Ocr, fields)
        })
    }
}

#[async_trait]
impl FieldExtractor for VisionExtractor {
    fn source(&self) -> ExtractionSource {
        ExtractionSource::Model
    }

    async fn extract(&self, image: &CardImage) -> Result<Extraction> {
        self.extract_image(image).await
    }
}

/// パイプライン本体
pub struct Pipeline<T: CatalogTransport> {
    extractors: Vec<Arc<dyn FieldExtractor>>,
    catalog: Option<CatalogClient<T>>,
}

impl<T: CatalogTransport> Pipeline<T> {
    /// 抽出器は先頭から順に試す（失敗時のみ次へ）
    pub fn new(extractors: Vec<Arc<dyn FieldExtractor>>, catalog: Option<CatalogClient<T>>) -> Self {
        Self {
            extractors,
            catalog,
        }
    }

    /// モードに応じた抽出器の並びでパイプラインを作る
    pub fn for_mode(
        mode: ExtractionMode,
        vision: Option<Arc<VisionExtractor>>,
        ocr: Arc<OcrExtractor>,
        catalog: Option<CatalogClient<T>>,
    ) -> Self {
        let mut extractors: Vec<Arc<dyn FieldExtractor>> = Vec::new();
        if matches!(mode, ExtractionMode::Auto | ExtractionMode::Model) {
            if let Some(vision) = vision {
                extractors.push(vision);
            }
        }
        if matches!(mode, ExtractionMode::Auto | ExtractionMode::Ocr) {
            extractors.push(ocr);
        }
        Self::new(extractors, catalog)
    }

    pub fn catalog(&self) -> Option<&CatalogClient<T>> {
        self.catalog.as_ref()
    }

    /// フィールド抽出のみ
    pub async fn extract(&self, image: &CardImage) -> Extraction {
        let mut last_error: Option<(ExtractionSource, String)> = None;

        for extractor in &self.extractors {
            match extractor.extract(image).await {
                Ok(extraction) => return extraction,
                Err(e) => {
                    warn!(source = %extractor.source(), error = %e, "extraction path failed");
                    last_error = Some((extractor.source(), e.to_string()));
                }
            }
        }

        match last_error {
            Some((source, message)) => Extraction::failed(source, message),
            None => Extraction::failed(ExtractionSource::Ocr, "no extractor configured"),
        }
    }

    /// 抽出 → カタログ照合
    pub async fn identify(&self, image: &CardImage) -> Identification {
        let extraction = self.extract(image).await;

        let mut identification = Identification {
            extraction,
            candidates: Vec::new(),
            search_error: None,
        };

        let Some(catalog) = &self.catalog else {
            return identification;
        };

        match find_matches(catalog, &identification.extraction.fields).await {
            Ok(candidates) => {
                info!(hits = candidates.len(), "catalog candidates found");
                identification.candidates = candidates;
            }
            Err(CardScanError::Validation(_)) => {
                info!("nothing to search for, catalog lookup skipped");
            }
            Err(e) => {
                warn!(error = %e, "catalog search failed");
                identification.search_error = Some(e.to_string());
            }
        }

        identification
    }
}
