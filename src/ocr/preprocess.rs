use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};

/// Prepares a capture for Tesseract: grayscale, then upscale by `factor`.
///
/// Game UI text is small at typical window sizes; Tesseract reads CJK
/// glyphs far more reliably at 2x.
pub fn prepare_for_ocr(img: &RgbaImage, factor: u32) -> GrayImage {
    let gray = imageops::grayscale(img);
    if factor <= 1 || gray.width() == 0 || gray.height() == 0 {
        return gray;
    }
    imageops::resize(
        &gray,
        gray.width() * factor,
        gray.height() * factor,
        FilterType::CatmullRom,
    )
}

/// Strips all whitespace from OCR output.
pub fn normalize_text(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
