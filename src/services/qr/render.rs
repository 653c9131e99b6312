//! 二维码矩阵编码与 SVG / 位图渲染

use std::fmt::Write as _;
use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use qrcode::{Color, EcLevel, QrCode};

use super::style::{clamp_logo_ratio, effective_ecc, parse_hex_color};
use crate::errors::{Result, StudioError};
use crate::storage::models::{EccLevel, EyeStyle, ModuleStyle, QrStyle};

/// 允许的 PNG 边长
pub const PNG_SIZES: [u32; 2] = [512, 2048];

/// 定位图案边长（模块数）
const FINDER_SIZE: usize = 7;

fn to_ec_level(ecc: EccLevel) -> EcLevel {
    match ecc {
        EccLevel::L => EcLevel::L,
        EccLevel::M => EcLevel::M,
        EccLevel::Q => EcLevel::Q,
        EccLevel::H => EcLevel::H,
    }
}

/// 编码后的模块矩阵
#[derive(Debug, Clone)]
pub struct QrMatrix {
    width: usize,
    dark: Vec<bool>,
}

impl QrMatrix {
    pub fn encode(payload: &str, ecc: EccLevel) -> Result<Self> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), to_ec_level(ecc))
            .map_err(|e| StudioError::render(format!("QR encoding failed: {}", e)))?;
        let width = code.width();
        let dark = code
            .to_colors()
            .into_iter()
            .map(|c| c == Color::Dark)
            .collect();
        Ok(Self { width, dark })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.width && self.dark[y * self.width + x]
    }

    /// 三个定位图案的左上角
    fn finder_origins(&self) -> [(usize, usize); 3] {
        let far = self.width - FINDER_SIZE;
        [(0, 0), (far, 0), (0, far)]
    }

    fn finder_at(&self, x: usize, y: usize) -> Option<(usize, usize)> {
        self.finder_origins().into_iter().find(|&(ox, oy)| {
            x >= ox && x < ox + FINDER_SIZE && y >= oy && y < oy + FINDER_SIZE
        })
    }
}

/// 按样式的有效纠错等级编码
pub fn encode_for_style(payload: &str, style: &QrStyle) -> Result<QrMatrix> {
    QrMatrix::encode(payload, effective_ecc(style))
}

fn color_or_default(raw: &str, fallback: [u8; 3]) -> [u8; 3] {
    parse_hex_color(raw).unwrap_or(fallback)
}

/// 圆角矩形内点测试
fn in_rounded_rect(x: f64, y: f64, x0: f64, y0: f64, size: f64, radius: f64) -> bool {
    if x < x0 || y < y0 || x >= x0 + size || y >= y0 + size {
        return false;
    }
    let cx = x.clamp(x0 + radius, x0 + size - radius);
    let cy = y.clamp(y0 + radius, y0 + size - radius);
    (x - cx).powi(2) + (y - cy).powi(2) <= radius.powi(2)
}

/// 定位图案半径：(外框, 内孔, 中心)
fn eye_radii(eye: EyeStyle) -> (f64, f64, f64) {
    match eye {
        EyeStyle::Square => (0.0, 0.0, 0.0),
        EyeStyle::Rounded => (2.0, 1.5, 1.0),
    }
}

/// 定位图案内（局部坐标 0..7）是否着色
fn eye_covers(eye: EyeStyle, lx: f64, ly: f64) -> bool {
    let (outer, hole, center) = eye_radii(eye);
    let ring = in_rounded_rect(lx, ly, 0.0, 0.0, 7.0, outer)
        && !in_rounded_rect(lx, ly, 1.0, 1.0, 5.0, hole);
    ring || in_rounded_rect(lx, ly, 2.0, 2.0, 3.0, center)
}

/// 单个模块内（局部坐标 0..1）是否着色
fn module_covers(shape: ModuleStyle, fx: f64, fy: f64) -> bool {
    match shape {
        ModuleStyle::Square => true,
        ModuleStyle::Rounded => in_rounded_rect(fx, fy, 0.05, 0.05, 0.9, 0.3),
        ModuleStyle::Dot => (fx - 0.5).powi(2) + (fy - 0.5).powi(2) <= 0.45f64.powi(2),
    }
}

/// logo 区域（模块单位）：(logo 边长, 垫底边长)
fn logo_extent(matrix: &QrMatrix, style: &QrStyle) -> (f64, f64) {
    let logo = matrix.width() as f64 * clamp_logo_ratio(style.logo_size_ratio);
    (logo, logo + 1.0)
}

fn fmt_num(v: f64) -> String {
    let s = format!("{:.3}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// 渲染 SVG
pub fn render_svg(matrix: &QrMatrix, style: &QrStyle, logo_png: Option<&[u8]>) -> String {
    let qz = style.quiet_zone as f64;
    let total = matrix.width() as f64 + 2.0 * qz;
    let fg = style.fg_color.as_str();
    let bg = style.bg_color.as_str();
    let fill = if style.gradient.is_some() {
        "url(#qr-gradient)"
    } else {
        fg
    };

    let mut svg = String::with_capacity(matrix.width() * matrix.width() * 48);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {t} {t}" width="1024" height="1024">"#,
        t = fmt_num(total)
    );
    if let Some([from, to]) = &style.gradient {
        let _ = write!(
            svg,
            r#"<defs><linearGradient id="qr-gradient" gradientUnits="userSpaceOnUse" x1="0" y1="0" x2="{t}" y2="{t}"><stop offset="0" stop-color="{from}"/><stop offset="1" stop-color="{to}"/></linearGradient></defs>"#,
            t = fmt_num(total),
        );
    }
    let _ = write!(
        svg,
        r#"<rect width="{t}" height="{t}" fill="{bg}"/>"#,
        t = fmt_num(total)
    );

    let _ = write!(svg, r#"<g fill="{}">"#, fill);
    for y in 0..matrix.width() {
        for x in 0..matrix.width() {
            if !matrix.is_dark(x, y) || matrix.finder_at(x, y).is_some() {
                continue;
            }
            let (mx, my) = (x as f64 + qz, y as f64 + qz);
            match style.module_style {
                ModuleStyle::Square => {
                    let _ = write!(
                        svg,
                        r#"<rect x="{}" y="{}" width="1" height="1"/>"#,
                        fmt_num(mx),
                        fmt_num(my)
                    );
                }
                ModuleStyle::Rounded => {
                    let _ = write!(
                        svg,
                        r#"<rect x="{}" y="{}" width="0.9" height="0.9" rx="0.3"/>"#,
                        fmt_num(mx + 0.05),
                        fmt_num(my + 0.05)
                    );
                }
                ModuleStyle::Dot => {
                    let _ = write!(
                        svg,
                        r#"<circle cx="{}" cy="{}" r="0.45"/>"#,
                        fmt_num(mx + 0.5),
                        fmt_num(my + 0.5)
                    );
                }
            }
        }
    }
    svg.push_str("</g>");

    let (outer, hole, center) = eye_radii(style.eye_style);
    for (ox, oy) in matrix.finder_origins() {
        let (ex, ey) = (ox as f64 + qz, oy as f64 + qz);
        let _ = write!(
            svg,
            r#"<rect x="{}" y="{}" width="7" height="7" rx="{}" fill="{fill}"/><rect x="{}" y="{}" width="5" height="5" rx="{}" fill="{bg}"/><rect x="{}" y="{}" width="3" height="3" rx="{}" fill="{fill}"/>"#,
            fmt_num(ex),
            fmt_num(ey),
            fmt_num(outer),
            fmt_num(ex + 1.0),
            fmt_num(ey + 1.0),
            fmt_num(hole),
            fmt_num(ex + 2.0),
            fmt_num(ey + 2.0),
            fmt_num(center),
        );
    }

    if let (true, Some(logo)) = (style.with_logo, logo_png) {
        let (logo_size, pad) = logo_extent(matrix, style);
        let mid = total / 2.0;
        let _ = write!(
            svg,
            r#"<rect x="{}" y="{}" width="{p}" height="{p}" rx="0.5" fill="{bg}"/><image x="{}" y="{}" width="{l}" height="{l}" href="data:image/png;base64,{}"/>"#,
            fmt_num(mid - pad / 2.0),
            fmt_num(mid - pad / 2.0),
            fmt_num(mid - logo_size / 2.0),
            fmt_num(mid - logo_size / 2.0),
            STANDARD.encode(logo),
            p = fmt_num(pad),
            l = fmt_num(logo_size),
        );
    }

    svg.push_str("</svg>");
    svg
}

fn lerp(a: [u8; 3], b: [u8; 3], t: f64) -> [u8; 3] {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// 光栅化为 RGBA 位图（边长 `size` 像素）
pub fn render_raster(
    matrix: &QrMatrix,
    style: &QrStyle,
    logo_png: Option<&[u8]>,
    size: u32,
) -> Result<RgbaImage> {
    if size == 0 {
        return Err(StudioError::validation("Image size must be positive"));
    }
    let fg = color_or_default(&style.fg_color, [0, 0, 0]);
    let bg = color_or_default(&style.bg_color, [255, 255, 255]);
    let gradient = style.gradient.as_ref().map(|[from, to]| {
        (
            color_or_default(from, fg),
            color_or_default(to, fg),
        )
    });

    let qz = style.quiet_zone as f64;
    let width = matrix.width();
    let scale = size as f64 / (width as f64 + 2.0 * qz);
    let denom = (2 * size.saturating_sub(1)).max(1) as f64;

    let mut img = RgbaImage::from_pixel(size, size, Rgba([bg[0], bg[1], bg[2], 255]));
    for py in 0..size {
        for px in 0..size {
            let u = (px as f64 + 0.5) / scale - qz;
            let v = (py as f64 + 0.5) / scale - qz;
            if u < 0.0 || v < 0.0 || u >= width as f64 || v >= width as f64 {
                continue;
            }
            let (mx, my) = (u.floor() as usize, v.floor() as usize);
            let covered = match matrix.finder_at(mx, my) {
                Some((ox, oy)) => eye_covers(style.eye_style, u - ox as f64, v - oy as f64),
                None => {
                    matrix.is_dark(mx, my)
                        && module_covers(style.module_style, u - mx as f64, v - my as f64)
                }
            };
            if covered {
                let c = match gradient {
                    Some((from, to)) => lerp(from, to, (px + py) as f64 / denom),
                    None => fg,
                };
                img.put_pixel(px, py, Rgba([c[0], c[1], c[2], 255]));
            }
        }
    }

    if let (true, Some(logo)) = (style.with_logo, logo_png) {
        let (logo_modules, pad_modules) = logo_extent(matrix, style);
        let logo_px = (logo_modules * scale).round().max(1.0) as u32;
        let pad_px = (pad_modules * scale).round() as u32;
        let pad_origin = (size.saturating_sub(pad_px) / 2) as i64;
        let pad = RgbaImage::from_pixel(pad_px, pad_px, Rgba([bg[0], bg[1], bg[2], 255]));
        imageops::overlay(&mut img, &pad, pad_origin, pad_origin);

        let logo = image::load_from_memory(logo)?
            .resize(logo_px, logo_px, FilterType::Lanczos3)
            .to_rgba8();
        let lx = (size as i64 - logo.width() as i64) / 2;
        let ly = (size as i64 - logo.height() as i64) / 2;
        imageops::overlay(&mut img, &logo, lx, ly);
    }

    Ok(img)
}

/// 渲染 PNG；边长只允许 512 或 2048
pub fn render_png(
    matrix: &QrMatrix,
    style: &QrStyle,
    logo_png: Option<&[u8]>,
    size: u32,
) -> Result<Vec<u8>> {
    if !PNG_SIZES.contains(&size) {
        return Err(StudioError::validation(format!(
            "Unsupported PNG size {}, expected 512 or 2048",
            size
        )));
    }
    let img = render_raster(matrix, style, logo_png, size)?;
    encode_png(DynamicImage::ImageRgba8(img))
}

pub fn encode_png(img: DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> QrMatrix {
        QrMatrix::encode("https://qr.example.com/l/menu", EccLevel::H).unwrap()
    }

    #[test]
    fn test_encode_has_finder_patterns() {
        let m = matrix();
        assert!(m.width() >= 21);
        // 定位图案左上角与外框都是深色
        assert!(m.is_dark(0, 0));
        assert!(m.is_dark(6, 6));
        assert!(!m.is_dark(1, 1));
        assert!(m.finder_at(3, 3).is_some());
        assert!(m.finder_at(m.width() - 1, m.width() - 1).is_none());
    }

    #[test]
    fn test_svg_contains_expected_parts() {
        let style = QrStyle {
            gradient: Some(["#112233".to_string(), "#334455".to_string()]),
            ..Default::default()
        };
        let svg = render_svg(&matrix(), &style, None);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("linearGradient"));
        assert!(svg.contains("<circle"));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_svg_embeds_logo_only_when_enabled() {
        let logo = encode_png(DynamicImage::ImageRgba8(RgbaImage::new(4, 4))).unwrap();
        let mut style = QrStyle::default();
        assert!(!render_svg(&matrix(), &style, Some(&logo)).contains("<image"));
        style.with_logo = true;
        assert!(render_svg(&matrix(), &style, Some(&logo)).contains("data:image/png;base64,"));
    }

    #[test]
    fn test_png_sizes() {
        let style = QrStyle {
            module_style: ModuleStyle::Square,
            ..Default::default()
        };
        let png = render_png(&matrix(), &style, None, 512).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 512);
        assert_eq!(decoded.height(), 512);
        assert!(render_png(&matrix(), &style, None, 300).is_err());
    }

    #[test]
    fn test_raster_quiet_zone_is_background() {
        let style = QrStyle::default();
        let img = render_raster(&matrix(), &style, None, 256).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_rounded_rect_corner() {
        assert!(in_rounded_rect(3.5, 3.5, 0.0, 0.0, 7.0, 2.0));
        assert!(!in_rounded_rect(0.05, 0.05, 0.0, 0.0, 7.0, 2.0));
        assert!(in_rounded_rect(0.05, 0.05, 0.0, 0.0, 7.0, 0.0));
    }
}
