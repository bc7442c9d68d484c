//! PDF round-trip through the real pdfium library.
//!
//! Skipped unless pdfium is already available locally (`PDFIUM_LIB_PATH` or
//! the pdfium-auto cache), so the suite never downloads the engine.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test pdf_roundtrip -- --nocapture

use edgequake_pages2pdf::{DocumentAssembler, FetchedPage, PdfiumAssembler};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use pdfium_render::prelude::*;
use std::io::Cursor;

/// Skip this test unless a pdfium library is available without network.
macro_rules! skip_unless_pdfium {
    () => {{
        match pdfium_auto::cached_pdfium_path() {
            Some(p) => p,
            None => {
                println!("SKIP — no local pdfium library (set PDFIUM_LIB_PATH)");
                return;
            }
        }
    }};
}

fn page(index: u32, width: u32, height: u32, format: ImageFormat) -> FetchedPage {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 120, 220])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode test image");
    FetchedPage { index, bytes }
}

#[test]
fn one_page_per_image_at_native_size() {
    let lib = skip_unless_pdfium!();

    let sizes = [(120, 200), (300, 80), (64, 64)];
    let pages: Vec<FetchedPage> = sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            let format = if i % 2 == 0 { ImageFormat::Png } else { ImageFormat::Jpeg };
            page(i as u32, w, h, format)
        })
        .collect();

    let bytes = PdfiumAssembler::with_library(&lib)
        .assemble(&pages)
        .expect("assemble should succeed");
    assert!(bytes.starts_with(b"%PDF"));

    let pdfium = pdfium_auto::bind_pdfium_from_path(&lib).expect("bind pdfium");
    let document = pdfium
        .load_pdf_from_byte_slice(&bytes, None)
        .expect("generated PDF should load");

    assert_eq!(document.pages().len() as usize, sizes.len());
    for (pdf_page, &(w, h)) in document.pages().iter().zip(&sizes) {
        assert!((pdf_page.width().value - w as f32).abs() < 0.5, "width");
        assert!((pdf_page.height().value - h as f32).abs() < 0.5, "height");
    }
}
