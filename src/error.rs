use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardScanError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`card-scan config --set-api-key YOUR_KEY` で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像を読み込めません: {0}")]
    Decode(String),

    #[error("OCRエラー: {0}")]
    Recognition(String),

    #[error("Visionモデルから応答がありません: {0}")]
    ModelUnavailable(String),

    #[error("カタログ検索エラー{}: {message}", http_status(.status))]
    Search { status: Option<u16>, message: String },

    #[error("検索条件がありません: {0}")]
    Validation(String),

    #[error("対話入力エラー: {0}")]
    Interactive(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] card_scan_common::Error),
}

pub type Result<T> = std::result::Result<T, CardScanError>;

fn http_status(status: &Option<u16>) -> String {
    status
        .map(|s| format!(" (HTTP {})", s))
        .unwrap_or_default()
}
