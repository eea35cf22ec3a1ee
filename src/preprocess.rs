//! OCR前処理
//!
//! グレースケール化し、カード名・番号が載りやすい上部30%の帯だけを切り出す。

use crate::error::{CardScanError, Result};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use tracing::{debug, warn};

/// 切り出し領域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 上部帯の切り出し領域: (0, 0) から 幅そのまま × floor(高さ × 0.3)
///
/// 高さが0になる極小画像は1pxに切り上げる。
pub fn crop_region(width: u32, height: u32) -> CropRegion {
    let band = (u64::from(height) * 3 / 10) as u32;
    CropRegion {
        x: 0,
        y: 0,
        width,
        height: band.max(1).min(height),
    }
}

/// グレースケール + 上部切り出しを行い、PNGバイト列を返す
pub fn preprocess(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).map_err(|e| CardScanError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();
    let region = crop_region(width, height);

    // アルファ・16bitを含む入力も8bit単一チャンネルにそろえる
    let cropped = DynamicImage::ImageLuma8(img.to_luma8())
        .crop_imm(region.x, region.y, region.width, region.height);

    let mut buffer = Vec::new();
    cropped
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| CardScanError::Decode(format!("PNGエンコード失敗: {}", e)))?;

    debug!(width, height, crop_height = region.height, "preprocessed card image");
    Ok(buffer)
}

/// OCR用の画像を用意する
///
/// 前処理に失敗した場合は元画像をそのまま返す。
pub fn prepare_for_ocr(bytes: &[u8]) -> Vec<u8> {
    match preprocess(bytes) {
        Ok(processed) => processed,
        Err(e) => {
            warn!(error = %e, "preprocessing failed, using original image");
            bytes.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_crop_region_standard_card() {
        assert_eq!(
            crop_region(1000, 1400),
            CropRegion { x: 0, y: 0, width: 1000, height: 420 }
        );
    }

    #[test]
    fn test_crop_region_floors() {
        // 333 * 0.3 = 99.9 -> 99
        assert_eq!(crop_region(10, 333).height, 99);
    }

    #[test]
    fn test_crop_region_tiny_image() {
        assert_eq!(crop_region(5, 2).height, 1);
        assert_eq!(crop_region(5, 0).height, 0);
    }

    #[test]
    fn test_preprocess_crops_and_grayscales() {
        let output = preprocess(&png_bytes(1000, 1400)).unwrap();
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.dimensions(), (1000, 420));
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_preprocess_drops_alpha_channel() {
        let img = RgbaImage::from_pixel(100, 140, Rgba([10, 200, 10, 128]));
        let mut input = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut input), ImageFormat::Png)
            .unwrap();

        let output = preprocess(&input).unwrap();
        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!(decoded.dimensions(), (100, 42));
        assert_eq!(decoded.color().channel_count(), 1);
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_preprocess_corrupt_image() {
        let result = preprocess(b"definitely not an image");
        assert!(matches!(result, Err(CardScanError::Decode(_))));
    }

    #[test]
    fn test_prepare_for_ocr_falls_back_to_original() {
        let original = b"not an image".to_vec();
        assert_eq!(prepare_for_ocr(&original), original);
    }

    #[test]
    fn test_prepare_for_ocr_uses_processed_image() {
        let original = png_bytes(100, 140);
        let prepared = prepare_for_ocr(&original);
        let decoded = image::load_from_memory(&prepared).unwrap();
        assert_eq!(decoded.dimensions(), (100, 42));
    }
}
