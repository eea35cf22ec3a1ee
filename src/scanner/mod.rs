use crate::error::{CardScanError, Result};
use card_scan_common::{content_type_for_extension, CardImage, Identification};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "JPG", "JPEG", "PNG", "WEBP"];

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.is_dir() {
        return Err(CardScanError::FolderNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy();
            if is_image_extension(&ext_str) {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();

                images.push(ImageInfo {
                    path: path.to_path_buf(),
                    file_name,
                });
            }
        }
    }

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// Check if a file extension is a supported image format
fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext)
}

/// 画像ファイルを読み込み、拡張子からContent-Typeを決める
pub fn load_card_image(path: &Path) -> Result<CardImage> {
    if !path.is_file() {
        return Err(CardScanError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let content_type = path
        .extension()
        .map(|ext| content_type_for_extension(&ext.to_string_lossy()))
        .unwrap_or("image/jpeg");

    Ok(CardImage::new(bytes, content_type))
}

/// `scan` の1画像分の出力（読めなかった画像も error 付きで残す）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub file_name: String,
    pub file_path: String,
    pub scanned_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub identification: Option<Identification>,
}

impl ScanRecord {
    fn base(info: &ImageInfo) -> Self {
        Self {
            file_name: info.file_name.clone(),
            file_path: info.path.display().to_string(),
            scanned_at: chrono::Local::now().to_rfc3339(),
            error: None,
            identification: None,
        }
    }

    pub fn identified(info: &ImageInfo, identification: Identification) -> Self {
        Self {
            identification: Some(identification),
            ..Self::base(info)
        }
    }

    pub fn unreadable(info: &ImageInfo, error: &CardScanError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::base(info)
        }
    }

    /// 名前またはカタログ候補が取れたか
    pub fn is_identified(&self) -> bool {
        self.identification.as_ref().is_some_and(|id| {
            !id.candidates.is_empty() || id.extraction.fields.name().is_some()
        })
    }
}
