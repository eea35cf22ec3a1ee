//! tesseract CLI連携
//!
//! セッションごとに専用の一時ディレクトリを作り、画像を書き出して
//! `tesseract <画像> stdout ...` を実行する。

use super::{OcrEngine, OcrOptions, OcrSession};
use crate::error::{CardScanError, Result};
use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

const INPUT_FILE_NAME: &str = "card-input";

/// tesseractコマンドを使うOCRエンジン
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

/// tesseractの引数を構築（入力パスの後ろに付ける部分）
pub(crate) fn build_args(options: &OcrOptions) -> Vec<String> {
    let mut args = vec![
        "stdout".to_string(),
        "-l".to_string(),
        options.language.clone(),
        "--psm".to_string(),
        options.page_seg_mode.to_string(),
        "-c".to_string(),
        format!("tessedit_char_whitelist={}", options.char_whitelist),
    ];
    if options.preserve_interword_spaces {
        args.push("-c".to_string());
        args.push("preserve_interword_spaces=1".to_string());
    }
    args
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn init(&self, options: &OcrOptions) -> Result<Box<dyn OcrSession>> {
        // 実行ファイルの存在確認を兼ねる
        let status = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                CardScanError::Recognition(format!("{} を起動できません: {}", self.binary, e))
            })?;
        if !status.status.success() {
            return Err(CardScanError::Recognition(format!(
                "{} --version failed (code {:?})",
                self.binary,
                status.status.code()
            )));
        }

        let workdir = tempfile::Builder::new().prefix("card-scan-ocr").tempdir()?;
        debug!(dir = %workdir.path().display(), "tesseract session started");

        Ok(Box::new(TesseractSession {
            binary: self.binary.clone(),
            args: build_args(options),
            workdir,
        }))
    }
}

/// 1回分のtesseractセッション（一時ディレクトリはdropでも削除される）
struct TesseractSession {
    binary: String,
    args: Vec<String>,
    workdir: TempDir,
}

#[async_trait]
impl OcrSession for TesseractSession {
    async fn recognize(&mut self, image: &[u8]) -> Result<String> {
        let input = self.workdir.path().join(INPUT_FILE_NAME);
        tokio::fs::write(&input, image).await?;

        let output = Command::new(&self.binary)
            .arg(&input)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| CardScanError::Recognition(format!("tesseract実行エラー: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CardScanError::Recognition(format!(
                "tesseract failed (code {:?}): {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn terminate(self: Box<Self>) -> Result<()> {
        self.workdir.close()?;
        Ok(())
    }
}
