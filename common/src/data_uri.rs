//! Data URI（`data:<mime>;base64,<data>`）の変換

use crate::error::{Error, Result};
use crate::types::CardImage;
use base64::{engine::general_purpose, Engine as _};

const DEFAULT_MIME_TYPE: &str = "image/jpeg";

/// Data URLからBase64データ部分を抽出
///
/// # Arguments
/// * `data_url` - "data:image/jpeg;base64,/9j/4AAQ..." 形式のData URL
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .map(|(_, data)| data)
}

/// Data URLからMIMEタイプを抽出（不明ならimage/jpeg）
pub fn extract_mime_type_from_data_url(data_url: &str) -> &str {
    data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split([';', ',']).next())
        .filter(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// 拡張子からContent-Typeを推定
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => DEFAULT_MIME_TYPE,
    }
}

impl CardImage {
    /// Data URIから画像を復元
    pub fn from_data_uri(data_uri: &str) -> Result<Self> {
        let data = extract_base64_from_data_url(data_uri)
            .ok_or_else(|| Error::Parse("not a data URI".into()))?;
        let bytes = general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| Error::Parse(format!("invalid base64 payload: {}", e)))?;
        Ok(Self::new(bytes, extract_mime_type_from_data_url(data_uri)))
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.to_base64())
    }
}
