//! # wordify
//!
//! Converts PDF documents and raster images into editable Word (DOCX)
//! documents, applying OCR when the native text layer is missing or
//! insufficient.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wordify::{convert_file, ConvertOptions};
//!
//! fn main() -> wordify::Result<()> {
//!     let result = convert_file("report.pdf", ConvertOptions::default())?;
//!     std::fs::write(&result.file_name, &result.bytes)?;
//!     println!("{} paragraphs written", result.paragraph_count);
//!     Ok(())
//! }
//! ```
//!
//! ## How it works
//!
//! - **Extraction**: each unit (PDF page or standalone image) yields text
//!   fragments, from the native text layer, OCR, or both, according to
//!   [`OcrMode`].
//! - **Selection**: fragments can be included/excluded individually in
//!   advanced mode; the default includes everything.
//! - **Assembly**: selected fragments become output paragraphs in source
//!   order, one paragraph per fragment.
//!
//! External tools (`tesseract`, `pdftoppm`) back the default OCR and
//! rasterization; both sit behind traits and can be replaced.

pub mod assemble;
pub mod detect;
pub mod error;
pub mod extract;
pub mod options;
pub mod sanitize;
pub mod select;
pub mod session;
pub mod writer;

// Re-export commonly used types
pub use assemble::{assemble as assemble_document, OutputDocument};
pub use detect::{detect_kind_from_bytes, detect_kind_from_path, SourceKind};
pub use error::{Error, Result};
pub use extract::{
    Fragment, FragmentKey, FragmentOrigin, LopdfReader, OcrEngine, PdfReader,
    PdftoppmRasterizer, Rasterizer, TesseractOcr, UnitExtractor, UnitOutcome,
    BLANK_UNIT_SENTINEL,
};
pub use options::{ConvertOptions, Granularity, InteractionMode, OcrMode, PageSelection};
pub use sanitize::{sanitize, sanitize_bytes};
pub use select::{BulkAction, SelectionSet};
pub use session::{Assembled, ExtractSummary, Session, SessionState, Source};
pub use writer::{output_filename, DocumentWriter, DocxWriter, DOCX_MIME};

use std::path::Path;

/// Convert a file in one step (automatic mode, all fragments included).
pub fn convert_file<P: AsRef<Path>>(path: P, options: ConvertOptions) -> Result<Assembled> {
    let mut session = Session::new(automatic(options));
    session.load_path(path)?;
    session.extract()?;
    take_output(session)
}

/// Convert an uploaded byte blob in one step. `name` supplies the declared
/// type and the output filename base.
pub fn convert_bytes(name: &str, data: Vec<u8>, options: ConvertOptions) -> Result<Assembled> {
    let mut session = Session::new(automatic(options));
    session.load_bytes(name, data)?;
    session.extract()?;
    take_output(session)
}

fn automatic(mut options: ConvertOptions) -> ConvertOptions {
    options.interaction = InteractionMode::Automatic;
    options
}

fn take_output(session: Session) -> Result<Assembled> {
    session
        .output()
        .cloned()
        .ok_or_else(|| Error::Other("conversion produced no output".to_string()))
}

/// Builder for one-shot conversions.
///
/// # Example
///
/// ```no_run
/// use wordify::{OcrMode, Wordify};
///
/// let result = Wordify::new()
///     .with_ocr_mode(OcrMode::Force)
///     .with_pages("1-3")?
///     .sequential()
///     .convert("scan.pdf")?;
/// std::fs::write(&result.file_name, &result.bytes)?;
/// # Ok::<(), wordify::Error>(())
/// ```
pub struct Wordify {
    options: ConvertOptions,
}

impl Wordify {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
        }
    }

    /// Set the OCR mode.
    pub fn with_ocr_mode(mut self, mode: OcrMode) -> Self {
        self.options = self.options.with_ocr_mode(mode);
        self
    }

    /// Set fragment granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.options = self.options.with_granularity(granularity);
        self
    }

    /// Select pages from a spec string like `"1,3,5-7"` or `"all"`.
    pub fn with_pages(mut self, spec: &str) -> Result<Self> {
        let pages = PageSelection::parse(spec).map_err(Error::InvalidPageRange)?;
        self.options = self.options.with_pages(pages);
        Ok(self)
    }

    /// Set the OCR language hint.
    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.options = self.options.with_ocr_language(language);
        self
    }

    /// Set rasterization DPI.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.options = self.options.with_dpi(dpi);
        self
    }

    /// Disable parallel extraction.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Run the conversion.
    pub fn convert<P: AsRef<Path>>(self, path: P) -> Result<Assembled> {
        convert_file(path, self.options)
    }

    /// Run the conversion on an in-memory blob.
    pub fn convert_bytes(self, name: &str, data: Vec<u8>) -> Result<Assembled> {
        convert_bytes(name, data, self.options)
    }
}

impl Default for Wordify {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_options() {
        let builder = Wordify::new()
            .with_ocr_mode(OcrMode::Off)
            .with_granularity(Granularity::WholeUnit)
            .sequential()
            .with_dpi(150);

        assert_eq!(builder.options.ocr_mode, OcrMode::Off);
        assert_eq!(builder.options.granularity, Granularity::WholeUnit);
        assert!(!builder.options.parallel);
        assert_eq!(builder.options.dpi, 150);
    }

    #[test]
    fn test_builder_page_spec() {
        let builder = Wordify::new().with_pages("2-4").unwrap();
        assert!(matches!(builder.options.pages, PageSelection::Range(_)));

        assert!(Wordify::new().with_pages("x-y").is_err());
    }

    #[test]
    fn test_convert_bytes_rejects_unknown_type() {
        let result = convert_bytes("notes.txt", b"plain text".to_vec(), ConvertOptions::default());
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
    }

    #[test]
    fn test_convert_bytes_rejects_corrupt_pdf() {
        let result = convert_bytes(
            "broken.pdf",
            b"%PDF-1.4\ngarbage".to_vec(),
            ConvertOptions::default(),
        );
        assert!(matches!(result, Err(Error::SourceUnreadable(_))));
    }
}
