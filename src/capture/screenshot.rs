//! Screen-region grab using GDI.
//!
//! Copies the requested rectangle of the desktop into a memory bitmap with
//! `BitBlt`, reads it back as top-down 32-bit BGRA and converts to RGBA.

use image::{ImageBuffer, Rgba, RgbaImage};

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, SRCCOPY,
};

use crate::capture::geometry::Rect;
use crate::error::{QuizError, Result};

/// Captures the pixels of `rect` (absolute screen coordinates).
pub fn grab_screen_region(rect: Rect) -> Result<RgbaImage> {
    if rect.is_empty() {
        return Err(QuizError::capture(format!(
            "zero-size region {}x{}",
            rect.width(),
            rect.height()
        )));
    }

    let width = rect.width();
    let height = rect.height();
    let mut bgra: Vec<u8> = vec![0; (width as usize) * (height as usize) * 4];

    unsafe {
        let screen_dc = GetDC(HWND::default());
        if screen_dc.is_invalid() {
            return Err(QuizError::capture("GetDC failed"));
        }
        let mem_dc = CreateCompatibleDC(screen_dc);
        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        let old_obj = SelectObject(mem_dc, bitmap);

        let blit = BitBlt(
            mem_dc, 0, 0, width, height, screen_dc, rect.left, rect.top, SRCCOPY,
        );

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height requests a top-down DIB
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let lines = if blit.is_ok() {
            SelectObject(mem_dc, old_obj);
            GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(bgra.as_mut_ptr() as *mut std::ffi::c_void),
                &mut info,
                DIB_RGB_COLORS,
            )
        } else {
            SelectObject(mem_dc, old_obj);
            0
        };

        let _ = DeleteObject(bitmap);
        let _ = DeleteDC(mem_dc);
        ReleaseDC(HWND::default(), screen_dc);

        if let Err(e) = blit {
            return Err(QuizError::capture(format!("BitBlt: {}", e)));
        }
        if lines == 0 {
            return Err(QuizError::capture("GetDIBits returned no scan lines"));
        }
    }

    Ok(bgra_to_rgba(width as u32, height as u32, &bgra))
}

/// Converts tightly packed BGRA rows into an opaque RGBA image.
fn bgra_to_rgba(width: u32, height: u32, src: &[u8]) -> RgbaImage {
    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(width, height);
    for (i, pixel) in img.pixels_mut().enumerate() {
        let offset = i * 4;
        let b = src[offset];
        let g = src[offset + 1];
        let r = src[offset + 2];
        *pixel = Rgba([r, g, b, 255]);
    }
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bgra_to_rgba() {
        let src = [1u8, 2, 3, 0, 10, 20, 30, 0];
        let img = bgra_to_rgba(2, 1, &src);
        assert_eq!(img.get_pixel(0, 0), &Rgba([3, 2, 1, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([30, 20, 10, 255]));
    }

    #[test]
    fn test_zero_size_region_is_rejected() {
        let err = grab_screen_region(Rect::new(10, 10, 10, 40)).unwrap_err();
        assert!(matches!(err, QuizError::CaptureFailure(_)));
    }
}
