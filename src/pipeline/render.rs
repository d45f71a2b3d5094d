//! PDF rasterisation: render page 1 of a resume via pdfium.
//!
//! ## Blocking work
//!
//! pdfium is CPU-bound and not async-aware, so rasterisation and PNG
//! encoding run under `tokio::task::spawn_blocking`.
//!
//! ## Locating pdfium
//!
//! pdfium is a host dependency. [`locate_pdfium`] resolves it once at startup
//! from, in order: the configured path (library file or a directory holding
//! it), the current directory, then the system library search path. Failure
//! is a fatal configuration error, not a per-request one.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::pipeline::encode::{encode_page, EncodedImagePart};
use crate::pipeline::input::UploadedDocument;
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where the pdfium shared library was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfiumLocation {
    /// An explicit library file.
    File(PathBuf),
    /// Whatever the platform loader finds on its default search path.
    System,
}

/// Resolve the pdfium library without binding it.
///
/// An explicitly configured path that does not exist is an error; it never
/// silently falls back to the system library.
pub fn locate_pdfium(configured: Option<&Path>) -> Result<PdfiumLocation, AnalyzerError> {
    if let Some(path) = configured {
        let file = if path.is_dir() {
            PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(path))
        } else {
            path.to_path_buf()
        };
        if !file.is_file() {
            return Err(AnalyzerError::PdfiumBindingFailed(format!(
                "configured library '{}' does not exist",
                file.display()
            )));
        }
        return Ok(PdfiumLocation::File(file));
    }

    let local = PathBuf::from(Pdfium::pdfium_platform_library_name_at_path("./"));
    if local.is_file() {
        return Ok(PdfiumLocation::File(local));
    }

    Ok(PdfiumLocation::System)
}

/// Bind to pdfium at the given location.
pub fn bind_pdfium(location: &PdfiumLocation) -> Result<Pdfium, AnalyzerError> {
    let bindings = match location {
        PdfiumLocation::File(path) => Pdfium::bind_to_library(path),
        PdfiumLocation::System => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| AnalyzerError::PdfiumBindingFailed(format!("{location:?}: {e:?}")))?;

    Ok(Pdfium::new(bindings))
}

/// Converts an uploaded resume into the image part sent to the model.
///
/// The [`crate::Analyzer`] applies `render_timeout_secs` around this call.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Rasterise page 1 only and return it as a base64 PNG part.
    async fn render_first_page(
        &self,
        document: &UploadedDocument,
    ) -> Result<EncodedImagePart, AnalyzerError>;
}

/// Page 1 of a resume as pixels.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: DynamicImage,
    /// Page count of the source document; only page 1 was rendered.
    pub total_pages: usize,
}

/// The production renderer.
///
/// The library location is resolved and test-bound at startup; each render
/// binds again inside the blocking task, since a `Pdfium` handle is not
/// shared across threads.
#[derive(Debug, Clone)]
pub struct PdfiumRenderer {
    location: PdfiumLocation,
    dpi: u32,
    max_rendered_pixels: u32,
}

impl PdfiumRenderer {
    /// Locate pdfium according to `config` and check that it binds.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let location = locate_pdfium(config.pdfium_lib_path.as_deref())?;
        drop(bind_pdfium(&location)?);
        info!("pdfium bound from {:?}", location);
        Ok(Self::with_location(location, config))
    }

    /// Use an already resolved location without binding it.
    pub fn with_location(location: PdfiumLocation, config: &AnalyzerConfig) -> Self {
        Self {
            location,
            dpi: config.dpi,
            max_rendered_pixels: config.max_rendered_pixels,
        }
    }

    pub fn location(&self) -> &PdfiumLocation {
        &self.location
    }
}

#[async_trait]
impl DocumentRenderer for PdfiumRenderer {
    async fn render_first_page(
        &self,
        document: &UploadedDocument,
    ) -> Result<EncodedImagePart, AnalyzerError> {
        document.validate()?;

        let location = self.location.clone();
        let bytes = document.as_bytes().to_vec();
        let dpi = self.dpi;
        let max_pixels = self.max_rendered_pixels;

        tokio::task::spawn_blocking(move || {
            let pdfium = bind_pdfium(&location)?;
            let page = rasterise_first_page(&pdfium, bytes, dpi, max_pixels)?;
            encode_page(&page.image).map_err(|e| AnalyzerError::RasterisationFailed {
                detail: format!("PNG encoding failed: {e}"),
            })
        })
        .await
        .map_err(|e| AnalyzerError::Internal(format!("Render task panicked: {e}")))?
    }
}

/// Blocking implementation: load the PDF from memory and render page 1.
pub fn rasterise_first_page(
    pdfium: &Pdfium,
    bytes: Vec<u8>,
    dpi: u32,
    max_pixels: u32,
) -> Result<RenderedPage, AnalyzerError> {
    let document = pdfium.load_pdf_from_byte_vec(bytes, None).map_err(|e| {
        let err_str = format!("{e:?}");
        if err_str.contains("Password") || err_str.contains("password") {
            AnalyzerError::PasswordProtected
        } else {
            AnalyzerError::CorruptPdf { detail: err_str }
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    if total_pages == 0 {
        return Err(AnalyzerError::EmptyDocument);
    }
    debug!("PDF loaded: {} pages, rendering page 1 only", total_pages);

    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(dpi as f32 / 72.0)
        .set_maximum_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages
        .get(0)
        .map_err(|e| AnalyzerError::RasterisationFailed {
            detail: format!("{e:?}"),
        })?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| AnalyzerError::RasterisationFailed {
            detail: format!("{e:?}"),
        })?;

    let image = bitmap.as_image();
    debug!("Rendered page 1 → {}x{} px", image.width(), image.height());

    Ok(RenderedPage { image, total_pages })
}
