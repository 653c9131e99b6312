//! 可打印的 A4 PDF
//!
//! 单页：标题、二维码（JPEG 图像 XObject）、公开地址、目的地列表。

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};

use crate::errors::{Result, StudioError};

const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 56.0;
const QR_SIDE: f64 = 300.0;
const LINE_HEIGHT: f64 = 16.0;

/// PDF 内容
#[derive(Debug, Clone)]
pub struct PdfContent<'a> {
    pub title: &'a str,
    pub public_url: &'a str,
    /// (标题, URL)
    pub destinations: Vec<(&'a str, &'a str)>,
}

/// PDF 字符串转义；Helvetica 不支持的字符替换为 '?'
fn pdf_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// 超长文本按字符截断
fn truncate(raw: &str, max_chars: usize) -> String {
    if raw.chars().count() <= max_chars {
        return raw.to_string();
    }
    let mut s: String = raw.chars().take(max_chars.saturating_sub(3)).collect();
    s.push_str("...");
    s
}

/// 透明像素按白底合成后编码为 JPEG
fn encode_jpeg(qr: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let mut rgb = RgbImage::new(qr.width(), qr.height());
    for (x, y, px) in qr.enumerate_pixels() {
        let a = px[3] as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }

    let mut buf = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.encode_image(&rgb)?;
    Ok(buf.into_inner())
}

fn content_stream(content: &PdfContent<'_>) -> String {
    let mut ops = String::new();
    let mut y = PAGE_HEIGHT - MARGIN - 24.0;

    ops.push_str(&format!(
        "BT /F2 24 Tf {:.2} {:.2} Td ({}) Tj ET\n",
        MARGIN,
        y,
        pdf_text(&truncate(content.title, 40))
    ));

    y -= 24.0 + QR_SIDE;
    let qr_x = (PAGE_WIDTH - QR_SIDE) / 2.0;
    ops.push_str(&format!(
        "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im1 Do Q\n",
        QR_SIDE, QR_SIDE, qr_x, y
    ));

    y -= 28.0;
    ops.push_str(&format!(
        "BT /F1 12 Tf {:.2} {:.2} Td ({}) Tj ET\n",
        MARGIN,
        y,
        pdf_text(&truncate(content.public_url, 80))
    ));

    if !content.destinations.is_empty() {
        y -= 32.0;
        ops.push_str(&format!(
            "BT /F2 14 Tf {:.2} {:.2} Td (Destinations) Tj ET\n",
            MARGIN, y
        ));
        for (idx, (title, url)) in content.destinations.iter().enumerate() {
            y -= LINE_HEIGHT;
            if y < MARGIN {
                break;
            }
            let line = format!("{}. {} - {}", idx + 1, title, url);
            ops.push_str(&format!(
                "BT /F1 10 Tf {:.2} {:.2} Td ({}) Tj ET\n",
                MARGIN,
                y,
                pdf_text(&truncate(&line, 95))
            ));
        }
    }
    ops
}

/// 生成 PDF 字节
pub fn render_pdf(content: &PdfContent<'_>, qr: &RgbaImage, jpeg_quality: u8) -> Result<Vec<u8>> {
    if qr.width() == 0 || qr.height() == 0 {
        return Err(StudioError::render("QR raster is empty"));
    }
    let jpeg = encode_jpeg(qr, jpeg_quality)?;
    let stream = content_stream(content);

    let mut out: Vec<u8> = Vec::with_capacity(jpeg.len() + stream.len() + 2048);
    let mut offsets: Vec<usize> = Vec::with_capacity(7);
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut object = |out: &mut Vec<u8>, body: &[u8]| {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", offsets.len()).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    };

    object(&mut out, b"<< /Type /Catalog /Pages 2 0 R >>");
    object(&mut out, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>");
    object(
        &mut out,
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /F1 4 0 R /F2 5 0 R >> /XObject << /Im1 6 0 R >> >> \
             /Contents 7 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT
        )
        .as_bytes(),
    );
    object(
        &mut out,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    object(
        &mut out,
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );

    let mut image_obj = format!(
        "<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB \
         /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
        qr.width(),
        qr.height(),
        jpeg.len()
    )
    .into_bytes();
    image_obj.extend_from_slice(&jpeg);
    image_obj.extend_from_slice(b"\nendstream");
    object(&mut out, &image_obj);

    let content_obj = format!(
        "<< /Length {} >>\nstream\n{}\nendstream",
        stream.len(),
        stream
    );
    object(&mut out, content_obj.as_bytes());

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
    for offset in &offsets {
        xref.push_str(&format!("{:010} 00000 n \n", offset));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        xref_offset
    ));
    out.extend_from_slice(xref.as_bytes());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_pdf_text_escaping() {
        assert_eq!(pdf_text("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(pdf_text("café"), "caf?");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_render_pdf_structure() {
        let qr = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
        let content = PdfContent {
            title: "Cafe (Menu)",
            public_url: "https://qr.example.com/l/menu",
            destinations: vec![("Food", "https://a.example"), ("Drinks", "https://b.example")],
        };
        let pdf = render_pdf(&content, &qr, 90).unwrap();
        let text = String::from_utf8_lossy(&pdf);
        assert!(pdf.starts_with(b"%PDF-1.4"));
        assert!(text.contains("/Filter /DCTDecode"));
        assert!(text.contains("/MediaBox [0 0 595 842]"));
        assert!(text.contains("Cafe \\(Menu\\)"));
        assert!(text.contains("1. Food - https://a.example"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }
}
