//! logo 处理：base64 图片 → 400×400 透明底 PNG

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

use super::render::encode_png;
use crate::errors::{Result, StudioError};

pub const LOGO_CANVAS: u32 = 400;

/// 去掉 `data:image/...;base64,` 前缀后解码
pub fn decode_logo_base64(input: &str, max_bytes: usize) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let payload = match trimmed.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => trimmed,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| StudioError::validation(format!("Logo is not valid base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(StudioError::validation("Logo is empty"));
    }
    if bytes.len() > max_bytes {
        return Err(StudioError::validation(format!(
            "Logo exceeds the {} byte limit",
            max_bytes
        )));
    }
    Ok(bytes)
}

/// 等比缩放后居中放入 400×400 透明画布
pub fn normalize_logo(bytes: &[u8]) -> Result<Vec<u8>> {
    let source = image::load_from_memory(bytes)
        .map_err(|e| StudioError::validation(format!("Unsupported logo image: {}", e)))?;
    let fitted = source
        .resize(LOGO_CANVAS, LOGO_CANVAS, FilterType::Lanczos3)
        .to_rgba8();

    let mut canvas = RgbaImage::new(LOGO_CANVAS, LOGO_CANVAS);
    let x = (LOGO_CANVAS - fitted.width()) / 2;
    let y = (LOGO_CANVAS - fitted.height()) / 2;
    imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);

    encode_png(DynamicImage::ImageRgba8(canvas))
}

/// 解码并规范化上传的 logo
pub fn process_logo(input: &str, max_bytes: usize) -> Result<Vec<u8>> {
    normalize_logo(&decode_logo_base64(input, max_bytes)?)
}
