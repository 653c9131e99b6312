//! 样式校验与派生规则
//!
//! - 颜色必须是 `#RRGGBB`，前景与背景的相对亮度对比度不低于 3:1
//! - logo 尺寸比例限制在 [0.10, 0.30]
//! - 嵌入 logo 时纠错等级强制为 H

use crate::errors::{Result, StudioError};
use crate::storage::models::{EccLevel, QrStyle};

pub const MIN_CONTRAST_RATIO: f64 = 3.0;
pub const MIN_LOGO_RATIO: f64 = 0.10;
pub const MAX_LOGO_RATIO: f64 = 0.30;
pub const DEFAULT_LOGO_RATIO: f64 = 0.22;
pub const MAX_QUIET_ZONE: u32 = 16;

/// 解析 `#RRGGBB`（`#` 可省略）
pub fn parse_hex_color(raw: &str) -> Option<[u8; 3]> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

pub fn format_hex_color(rgb: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

/// WCAG 相对亮度
pub fn relative_luminance(rgb: [u8; 3]) -> f64 {
    let linear = |v: u8| {
        let c = v as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(rgb[0]) + 0.7152 * linear(rgb[1]) + 0.0722 * linear(rgb[2])
}

pub fn contrast_ratio(a: [u8; 3], b: [u8; 3]) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    (la.max(lb) + 0.05) / (la.min(lb) + 0.05)
}

pub fn clamp_logo_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() {
        ratio.clamp(MIN_LOGO_RATIO, MAX_LOGO_RATIO)
    } else {
        DEFAULT_LOGO_RATIO
    }
}

/// 实际编码使用的纠错等级
pub fn effective_ecc(style: &QrStyle) -> EccLevel {
    if style.with_logo {
        EccLevel::H
    } else {
        style.ecc
    }
}

fn require_color(field: &str, raw: &str) -> Result<[u8; 3]> {
    parse_hex_color(raw).ok_or_else(|| {
        StudioError::validation(format!("{} must be a #RRGGBB color, got '{}'", field, raw))
    })
}

fn require_contrast(field: &str, fg: [u8; 3], bg: [u8; 3]) -> Result<()> {
    let ratio = contrast_ratio(fg, bg);
    if ratio < MIN_CONTRAST_RATIO {
        return Err(StudioError::validation(format!(
            "{} contrast ratio {:.2}:1 is below the 3:1 minimum for reliable scanning",
            field, ratio
        )));
    }
    Ok(())
}

/// 校验并规范化样式：颜色统一为大写 `#RRGGBB`，比例被限制在允许范围内
pub fn validate_style(style: &QrStyle) -> Result<QrStyle> {
    let fg = require_color("fg_color", &style.fg_color)?;
    let bg = require_color("bg_color", &style.bg_color)?;
    require_contrast("Foreground/background", fg, bg)?;

    let gradient = match &style.gradient {
        Some([from, to]) => {
            let from = require_color("gradient[0]", from)?;
            let to = require_color("gradient[1]", to)?;
            require_contrast("Gradient start/background", from, bg)?;
            require_contrast("Gradient end/background", to, bg)?;
            Some([format_hex_color(from), format_hex_color(to)])
        }
        None => None,
    };

    if style.quiet_zone > MAX_QUIET_ZONE {
        return Err(StudioError::validation(format!(
            "quiet_zone must be at most {} modules",
            MAX_QUIET_ZONE
        )));
    }

    Ok(QrStyle {
        fg_color: format_hex_color(fg),
        bg_color: format_hex_color(bg),
        gradient,
        logo_size_ratio: clamp_logo_ratio(style.logo_size_ratio),
        ..style.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0080"), Some([255, 0, 128]));
        assert_eq!(parse_hex_color("ff0080"), Some([255, 0, 128]));
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }

    #[test]
    fn test_contrast_ratio_extremes() {
        let ratio = contrast_ratio([0, 0, 0], [255, 255, 255]);
        assert!((ratio - 21.0).abs() < 0.01);
        assert!((contrast_ratio([10, 10, 10], [10, 10, 10]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_low_contrast_rejected() {
        let style = QrStyle {
            fg_color: "#777777".to_string(),
            bg_color: "#888888".to_string(),
            ..Default::default()
        };
        let err = validate_style(&style).unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));
    }

    #[test]
    fn test_gradient_contrast_checked() {
        let style = QrStyle {
            gradient: Some(["#000000".to_string(), "#FEFEFE".to_string()]),
            ..Default::default()
        };
        assert!(validate_style(&style).is_err());
    }

    #[test]
    fn test_normalization() {
        let style = QrStyle {
            fg_color: "1a2b3c".to_string(),
            logo_size_ratio: 0.9,
            ..Default::default()
        };
        let normalized = validate_style(&style).unwrap();
        assert_eq!(normalized.fg_color, "#1A2B3C");
        assert!((normalized.logo_size_ratio - MAX_LOGO_RATIO).abs() < f64::EPSILON);
        assert!((clamp_logo_ratio(0.01) - MIN_LOGO_RATIO).abs() < f64::EPSILON);
        assert!((clamp_logo_ratio(f64::NAN) - DEFAULT_LOGO_RATIO).abs() < f64::EPSILON);
    }

    #[test]
    fn test_effective_ecc_forced_high_with_logo() {
        let mut style = QrStyle {
            ecc: EccLevel::L,
            ..Default::default()
        };
        assert_eq!(effective_ecc(&style), EccLevel::L);
        style.with_logo = true;
        assert_eq!(effective_ecc(&style), EccLevel::H);
    }
}
