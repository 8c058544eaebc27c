use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use thiserror::Error;

/// Edge length of the rendered code in pixels.
pub const QR_WIDTH: u32 = 300;
/// Quiet zone in modules.
pub const QR_MARGIN: u32 = 2;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("data does not fit a QR code: {0}")]
    Encode(String),

    #[error("could not write PNG: {0}")]
    Png(#[from] image::ImageError),
}

/// Render `data` as a black-on-white square of [`QR_WIDTH`] pixels.
pub fn render_qr(data: &str) -> Result<GrayImage, QrError> {
    let code = QrCode::new(data.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))?;
    let modules = code.width() as u32;
    let colors = code.to_colors();

    let total = modules + 2 * QR_MARGIN;
    let scale = (QR_WIDTH / total).max(1);
    let size = QR_WIDTH.max(total * scale);
    // Centre the code; leftover pixels widen the quiet zone evenly.
    let offset = (size - total * scale) / 2 + QR_MARGIN * scale;

    let mut img = GrayImage::from_pixel(size, size, Luma([255]));
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = i as u32 % modules;
        let my = i as u32 / modules;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(offset + mx * scale + dx, offset + my * scale + dy, Luma([0]));
            }
        }
    }
    Ok(img)
}

/// PNG `data:` URL of the code for `data`.
pub fn render_qr_data_url(data: &str) -> Result<String, QrError> {
    let img = render_qr(data)?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_square_with_quiet_zone() {
        let img = render_qr("https://www.google.com/maps?q=51.5136,7.4653").unwrap();
        assert_eq!(img.dimensions(), (QR_WIDTH, QR_WIDTH));
        // Corners are quiet zone, the finder pattern starts right after it.
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(QR_WIDTH - 1, QR_WIDTH - 1)[0], 255);
        assert!(img.pixels().any(|p| p[0] == 0));
    }

    #[test]
    fn finder_pattern_is_dark() {
        let data = "https://www.google.com/maps?q=1,2";
        let code = QrCode::new(data.as_bytes()).unwrap();
        let total = code.width() as u32 + 2 * QR_MARGIN;
        let scale = QR_WIDTH / total;
        let offset = (QR_WIDTH - total * scale) / 2 + QR_MARGIN * scale;

        let img = render_qr(data).unwrap();
        assert_eq!(img.get_pixel(offset, offset)[0], 0);
        assert_eq!(img.get_pixel(offset - 1, offset - 1)[0], 255);
    }

    #[test]
    fn data_url_is_png() {
        let url = render_qr_data_url("hallo").unwrap();
        let b64 = url.strip_prefix("data:image/png;base64,").unwrap();
        let png = STANDARD.decode(b64).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
