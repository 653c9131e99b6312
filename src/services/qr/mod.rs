//! 二维码资源生成
//!
//! 二维码内容是记录的公开地址 `{origin}/l/{slug}`，资源可导出为 SVG、PNG 或 PDF。

pub mod logo;
pub mod pdf;
pub mod render;
pub mod style;

use serde::Deserialize;
use strum::{AsRefStr, Display, EnumString};

use crate::errors::Result;
use crate::storage::models::{QrStyle, ShortRecord};

pub use logo::process_logo;
pub use pdf::{PdfContent, render_pdf};
pub use render::{PNG_SIZES, QrMatrix, encode_for_style, render_png, render_raster, render_svg};
pub use style::{effective_ecc, validate_style};

/// PDF 中二维码栅格的边长
const PDF_RASTER_SIZE: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssetFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl AssetFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            AssetFormat::Svg => "image/svg+xml",
            AssetFormat::Png => "image/png",
            AssetFormat::Pdf => "application/pdf",
        }
    }
}

/// 生成好的资源
#[derive(Debug, Clone)]
pub struct QrAsset {
    pub bytes: Vec<u8>,
    pub format: AssetFormat,
    pub filename: String,
}

/// 二维码内容：记录的公开地址
pub fn public_qr_url(origin: Option<&str>, slug: &str) -> String {
    crate::utils::origin::absolute_url(origin, &format!("/l/{}", slug))
}

/// 按格式渲染资源
///
/// `size` 只对 PNG 生效。
pub fn render_asset(
    record: &ShortRecord,
    public_url: &str,
    style: &QrStyle,
    logo_png: Option<&[u8]>,
    format: AssetFormat,
    size: u32,
    jpeg_quality: u8,
) -> Result<QrAsset> {
    let matrix = encode_for_style(public_url, style)?;

    let bytes = match format {
        AssetFormat::Svg => render_svg(&matrix, style, logo_png).into_bytes(),
        AssetFormat::Png => render_png(&matrix, style, logo_png, size)?,
        AssetFormat::Pdf => {
            let raster = render_raster(&matrix, style, logo_png, PDF_RASTER_SIZE)?;
            let content = PdfContent {
                title: &record.title,
                public_url,
                destinations: record
                    .destinations
                    .iter()
                    .map(|d| (d.title.as_str(), d.url.as_str()))
                    .collect(),
            };
            render_pdf(&content, &raster, jpeg_quality)?
        }
    };

    let filename = match format {
        AssetFormat::Png => format!("qr-{}-{}.png", record.slug, size),
        _ => format!("qr-{}.{}", record.slug, format),
    };

    Ok(QrAsset {
        bytes,
        format,
        filename,
    })
}
