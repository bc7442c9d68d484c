//! Document assembly: fetched page images → one PDF, one page per image.
//!
//! ## Why decode before touching pdfium?
//!
//! A page that is not a raster image must abort the whole document. Decoding
//! every buffer up front with the `image` crate means that failure surfaces
//! as [`Pages2PdfError::ImageDecode`] before a pdfium document exists, so no
//! partial PDF is ever built, let alone written.
//!
//! ## Page geometry
//!
//! Each page measures one PDF point per source pixel and the image is drawn
//! at the origin filling the page, so the document keeps every scan's native
//! size and aspect ratio.

use crate::error::Pages2PdfError;
use crate::output::FetchedPage;
use image::{DynamicImage, GenericImageView};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Turns ordered page images into document bytes.
///
/// Implementations are synchronous and may block; the orchestrator calls
/// them from `spawn_blocking`.
pub trait DocumentAssembler: Send + Sync {
    /// Build a document with one page per entry of `pages`, in order.
    ///
    /// `pages` is never empty.
    fn assemble(&self, pages: &[FetchedPage]) -> Result<Vec<u8>, Pages2PdfError>;
}

/// [`DocumentAssembler`] producing PDF bytes through pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumAssembler {
    /// Explicit pdfium library; `None` uses pdfium-auto's cache/download.
    library_path: Option<PathBuf>,
}

impl PdfiumAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the pdfium library at `path` instead of the auto-managed one.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, Pages2PdfError> {
        let bound = match &self.library_path {
            Some(path) => pdfium_auto::bind_pdfium_from_path(path),
            None => pdfium_auto::bind_pdfium_silent(),
        };
        bound.map_err(|e| Pages2PdfError::PdfiumBindingFailed(e.to_string()))
    }
}

impl DocumentAssembler for PdfiumAssembler {
    fn assemble(&self, pages: &[FetchedPage]) -> Result<Vec<u8>, Pages2PdfError> {
        let images = decode_pages(pages)?;
        let pdfium = self.bind()?;
        build_pdf(&pdfium, &images)
    }
}

/// Decode every page, failing on the first one that is not an image.
pub fn decode_pages(pages: &[FetchedPage]) -> Result<Vec<DynamicImage>, Pages2PdfError> {
    pages
        .iter()
        .map(|page| {
            let img = image::load_from_memory(&page.bytes).map_err(|e| {
                Pages2PdfError::ImageDecode {
                    page: page.index,
                    detail: e.to_string(),
                }
            })?;
            debug!(
                "Decoded page {} → {}x{} px",
                page.index,
                img.width(),
                img.height()
            );
            Ok(img)
        })
        .collect()
}

/// Page size for `img`: one PDF point per source pixel.
fn page_size(img: &DynamicImage) -> (PdfPoints, PdfPoints) {
    let (w, h) = img.dimensions();
    (PdfPoints::new(w as f32), PdfPoints::new(h as f32))
}

fn build_pdf(pdfium: &Pdfium, images: &[DynamicImage]) -> Result<Vec<u8>, Pages2PdfError> {
    let build_err = |e: PdfiumError| Pages2PdfError::DocumentBuildFailed(format!("{:?}", e));

    let mut document = pdfium.create_new_pdf().map_err(build_err)?;

    for img in images {
        let (width, height) = page_size(img);

        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(width, height))
            .map_err(build_err)?;

        page.objects_mut()
            .create_image_object(PdfPoints::ZERO, PdfPoints::ZERO, img, Some(width), Some(height))
            .map_err(build_err)?;
    }

    let bytes = document.save_to_bytes().map_err(build_err)?;
    info!("Built PDF: {} pages, {} bytes", images.len(), bytes.len());
    Ok(bytes)
}

/// Write `bytes` to `path` atomically (temp file + rename).
///
/// A crash mid-write leaves at most a `.pdf.tmp` file behind, never a
/// truncated document under the final name.
pub async fn write_document(path: &Path, bytes: &[u8]) -> Result<(), Pages2PdfError> {
    let write_err = |source: std::io::Error| Pages2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("PDF saved as {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 10, 10])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode png");
        buf
    }

    #[test]
    fn decode_keeps_order_and_dimensions() {
        let pages = vec![
            FetchedPage { index: 4, bytes: png(30, 40) },
            FetchedPage { index: 7, bytes: png(12, 8) },
        ];
        let images = decode_pages(&pages).unwrap();
        assert_eq!(images[0].dimensions(), (30, 40));
        assert_eq!(images[1].dimensions(), (12, 8));
    }

    #[test]
    fn pages_measure_one_point_per_pixel() {
        let pages = vec![
            FetchedPage { index: 0, bytes: png(120, 200) },
            FetchedPage { index: 1, bytes: png(300, 80) },
            FetchedPage { index: 2, bytes: png(1, 1) },
        ];
        let sizes: Vec<(f32, f32)> = decode_pages(&pages)
            .unwrap()
            .iter()
            .map(|img| {
                let (w, h) = page_size(img);
                (w.value, h.value)
            })
            .collect();
        assert_eq!(sizes, vec![(120.0, 200.0), (300.0, 80.0), (1.0, 1.0)]);
    }

    #[test]
    fn undecodable_page_aborts_with_its_index() {
        let pages = vec![
            FetchedPage { index: 1, bytes: png(5, 5) },
            FetchedPage { index: 2, bytes: b"<html>not found</html>".to_vec() },
            FetchedPage { index: 3, bytes: png(5, 5) },
        ];
        let err = decode_pages(&pages).unwrap_err();
        assert!(
            matches!(err, Pages2PdfError::ImageDecode { page: 2, .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn assembler_rejects_garbage_before_binding_pdfium() {
        // Points at a library that does not exist: the decode error must win.
        let assembler = PdfiumAssembler::with_library("/nonexistent/libpdfium.so");
        let pages = vec![FetchedPage { index: 0, bytes: vec![0, 1, 2, 3] }];
        let err = assembler.assemble(&pages).unwrap_err();
        assert!(matches!(err, Pages2PdfError::ImageDecode { page: 0, .. }));
    }

    #[tokio::test]
    async fn write_document_is_atomic_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/book.pdf");
        write_document(&path, b"%PDF-1.7 test").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 test");
        assert!(!path.with_extension("pdf.tmp").exists());
    }
}
