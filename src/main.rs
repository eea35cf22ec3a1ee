use card_scan::catalog::{find_matches, CatalogClient, PokemonTcgTransport};
use card_scan::confirm::{run_confirmation, ConfirmedCard};
use card_scan::ocr::{OcrOptions, TesseractEngine};
use card_scan::pipeline::{ExtractionMode, FieldExtractor, OcrExtractor, Pipeline};
use card_scan::vision::{GeminiClient, VisionExtractor};
use card_scan::scanner::ScanRecord;
use card_scan::{cli, config, error, logging, preprocess, scanner};
use card_scan_common::{CardQuery, CatalogCandidate, ExtractedFields, Identification};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::{CardScanError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// `identify` の出力
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdentifyOutput {
    #[serde(flatten)]
    identification: Identification,
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmed: Option<ConfirmedCard>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    logging::init(&config.log_level, cli.verbose);

    match cli.command {
        Commands::Identify { image, mode, no_search, confirm, output } => {
            println!("🃏 card-scan - カード識別\n");

            let card = scanner::load_card_image(&image)?;
            let pipeline = build_pipeline(&config, mode, !no_search)?;

            let spinner = spinner("カードを解析中...");
            let identification = pipeline.identify(&card).await;
            spinner.finish_and_clear();

            print_identification(&identification);

            let confirmed = if confirm {
                let confirmed = run_confirmation(&identification)?;
                match &confirmed {
                    Some(card) => println!("\n✔ 確定: {}", card.name),
                    None => println!("\nスキップしました"),
                }
                confirmed
            } else {
                None
            };

            let json = serde_json::to_string_pretty(&IdentifyOutput { identification, confirmed })?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("\n✔ 結果を保存: {}", path.display());
                }
                None => println!("\n{}", json),
            }
        }

        Commands::Scan { folder, mode, output, no_search } => {
            println!("📦 card-scan - 一括識別\n");

            // 1. 画像スキャン
            println!("[1/3] 画像をスキャン中...");
            let images = scanner::scan_folder(&folder)?;
            if images.is_empty() {
                return Err(CardScanError::NoImagesFound(folder.display().to_string()));
            }
            println!("✔ {}枚の画像を検出\n", images.len());

            // 2. 識別
            println!("[2/3] カードを識別中...");
            let pipeline = build_pipeline(&config, mode, !no_search)?;
            let progress = ProgressBar::new(images.len() as u64);
            progress.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let mut records = Vec::with_capacity(images.len());
            for info in &images {
                progress.set_message(info.file_name.clone());
                let record = match scanner::load_card_image(&info.path) {
                    Ok(card) => ScanRecord::identified(info, pipeline.identify(&card).await),
                    Err(e) => {
                        warn!(file = %info.file_name, error = %e, "failed to read image");
                        ScanRecord::unreadable(info, &e)
                    }
                };
                records.push(record);
                progress.inc(1);
            }
            progress.finish_and_clear();
            let identified = records.iter().filter(|r| r.is_identified()).count();
            let unreadable = records.iter().filter(|r| r.error.is_some()).count();
            println!("✔ {}/{}枚で名前またはカタログ候補を取得", identified, records.len());
            if unreadable > 0 {
                println!("⚠ 読み込めなかった画像: {}枚", unreadable);
            }
            println!();

            // 3. 結果保存
            println!("[3/3] 結果を保存中...");
            let output = output.unwrap_or_else(|| folder.join("cards.json"));
            let json = serde_json::to_string_pretty(&records)?;
            std::fs::write(&output, json)?;
            println!("✔ 結果を保存: {}", output.display());

            println!("\n✅ 完了");
        }

        Commands::Ocr { image, lang, no_preprocess } => {
            println!("🔤 card-scan - OCR\n");

            let card = scanner::load_card_image(&image)?;
            let options = OcrOptions::with_language(lang.unwrap_or_else(|| config.ocr_language.clone()));
            let extractor = OcrExtractor::new(
                Arc::new(TesseractEngine::new(config.tesseract_path.clone())),
                options,
            )
            .with_preprocess(!no_preprocess);

            let spinner = spinner("OCR実行中...");
            let extraction = extractor.extract(&card).await?;
            spinner.finish_and_clear();

            println!("--- OCRテキスト ---");
            println!("{}", extraction.raw_text.as_deref().unwrap_or_default());
            println!("-------------------\n");
            if let Some(err) = &extraction.error {
                println!("⚠ OCRエラー: {}", err);
            }
            print_fields(&extraction.fields);
        }

        Commands::Preprocess { image, output } => {
            let bytes = std::fs::read(&image).map_err(|_| CardScanError::FileNotFound(image.display().to_string()))?;
            let processed = preprocess::preprocess(&bytes)?;
            let output = output.unwrap_or_else(|| default_preprocess_output(&image));
            std::fs::write(&output, processed)?;
            println!("✔ 前処理画像を保存: {}", output.display());
        }

        Commands::Search { name, set, number, two_phase } => {
            let client = CatalogClient::new(PokemonTcgTransport::from_config(&config)?);

            let spinner = spinner("カタログ検索中...");
            let result = if two_phase {
                let fields = ExtractedFields::from_parts(name.as_deref(), set.as_deref(), number.as_deref(), None);
                find_matches(&client, &fields).await
            } else {
                let query = CardQuery::new(name.as_deref(), set.as_deref(), number.as_deref());
                client.search(&query).await
            };
            spinner.finish_and_clear();

            print_candidates(&result?);
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model);
                println!("  温度: {}", config.temperature);
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
                println!("  カタログURL: {}", config.catalog_url);
                println!("  カタログAPIキー: {}", if config.get_catalog_api_key().is_some() { "設定済み" } else { "未設定" });
                println!("  OCR言語: {}", config.ocr_language);
                println!("  Tesseract: {}", config.tesseract_path);
                println!("  カード判定: {}", if config.strict_card_check { "有効" } else { "無効" });
                println!("  修飾語: {}", config.name_modifiers.join(", "));
            }
        }
    }

    Ok(())
}

/// モードに応じたパイプラインを組み立てる
///
/// auto ではAPIキーがなければOCRのみで続行する。
fn build_pipeline(config: &Config, mode: ExtractionMode, search: bool) -> Result<Pipeline<PokemonTcgTransport>> {
    let ocr = Arc::new(OcrExtractor::new(
        Arc::new(TesseractEngine::new(config.tesseract_path.clone())),
        OcrOptions::with_language(config.ocr_language.clone()),
    ));

    let vision = match mode {
        ExtractionMode::Ocr => None,
        ExtractionMode::Model => Some(vision_extractor(config)?),
        ExtractionMode::Auto => match vision_extractor(config) {
            Ok(extractor) => Some(extractor),
            Err(e) => {
                warn!(error = %e, "vision model disabled, falling back to OCR only");
                None
            }
        },
    };

    let catalog = if search {
        Some(CatalogClient::new(PokemonTcgTransport::from_config(config)?))
    } else {
        None
    };

    Ok(Pipeline::for_mode(mode, vision, ocr, catalog))
}

fn vision_extractor(config: &Config) -> Result<Arc<VisionExtractor>> {
    let model = GeminiClient::from_config(config)?;
    Ok(Arc::new(VisionExtractor::new(
        Arc::new(model),
        config.name_modifiers(),
        config.strict_card_check,
    )))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn default_preprocess_output(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "card".to_string());
    image.with_file_name(format!("{}.ocr.png", stem))
}

fn print_identification(identification: &Identification) {
    let extraction = &identification.extraction;
    println!("抽出経路: {}", extraction.source);
    if let Some(err) = &extraction.error {
        println!("⚠ 抽出エラー: {}", err);
    }
    print_fields(&extraction.fields);
    if extraction.needs_review {
        println!("⚠ 要確認: 名前に曖昧な接頭語があります");
    }

    println!();
    if let Some(err) = &identification.search_error {
        println!("⚠ {}", err);
    } else {
        print_candidates(&identification.candidates);
    }
}

fn print_fields(fields: &ExtractedFields) {
    let show = |value: Option<&str>| value.unwrap_or("-").to_string();
    println!("  名前: {}", show(fields.name()));
    println!("  セット: {}", show(fields.set()));
    println!("  番号: {}", show(fields.card_number()));
    println!("  レアリティ: {}", show(fields.rarity()));
}

fn print_candidates(candidates: &[CatalogCandidate]) {
    if candidates.is_empty() {
        println!("候補なし");
        return;
    }
    println!("候補 {}件:", candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, card_scan::confirm::candidate_label(candidate));
    }
}
