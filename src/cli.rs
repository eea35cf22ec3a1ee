use clap::{Parser, Subcommand};
use crate::pipeline::ExtractionMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "card-scan")]
#[command(about = "トレーディングカード画像解析・カタログ照合ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// カード画像1枚を識別
    Identify {
        /// カード画像のパス
        #[arg(required = true)]
        image: PathBuf,

        /// 抽出モード (auto/model/ocr)
        #[arg(short, long, value_enum, default_value = "auto")]
        mode: ExtractionMode,

        /// カタログ検索を行わない
        #[arg(long)]
        no_search: bool,

        /// 候補を対話的に確定する
        #[arg(short, long)]
        confirm: bool,

        /// 結果JSONの出力先（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// フォルダ内のカード画像を一括識別
    Scan {
        /// 画像フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 抽出モード (auto/model/ocr)
        #[arg(short, long, value_enum, default_value = "auto")]
        mode: ExtractionMode,

        /// 出力JSONファイル（デフォルト: 入力フォルダ/cards.json）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// カタログ検索を行わない
        #[arg(long)]
        no_search: bool,
    },

    /// OCRのみ実行してテキストとフィールドを表示
    Ocr {
        /// カード画像のパス
        #[arg(required = true)]
        image: PathBuf,

        /// Tesseractの言語（省略時は設定値）
        #[arg(short, long)]
        lang: Option<String>,

        /// 前処理（グレースケール + 上部切り出し）を省略
        #[arg(long)]
        no_preprocess: bool,
    },

    /// OCR用の前処理画像をPNGで保存
    Preprocess {
        /// カード画像のパス
        #[arg(required = true)]
        image: PathBuf,

        /// 出力PNG（デフォルト: 入力名.ocr.png）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// カタログを直接検索
    Search {
        /// カード名
        #[arg(short, long)]
        name: Option<String>,

        /// セット名またはセットID
        #[arg(short, long)]
        set: Option<String>,

        /// カード番号（例: 58/102）
        #[arg(long)]
        number: Option<String>,

        /// 名前+番号で検索し、0件ならセット付きで再検索
        #[arg(long)]
        two_phase: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
