//! External collaborator abstraction layer.
//!
//! Trait-based interfaces for the PDF reader, rasterizer, and OCR engine,
//! isolating the concrete libraries and subprocess tools from the extraction
//! policy. Tests substitute mocks for any of them.

use std::io;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::sanitize::sanitize_bytes;

/// Default wall-clock bound for one subprocess invocation. The original had
/// no per-unit timeout; extraction of a single unit must not block forever.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Read access to one loaded PDF document.
pub trait PdfReader: Send + Sync {
    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Native text of the given 1-based page. Empty string for pages with
    /// no text layer.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Whether the page contains embedded raster images (the AutoDetect
    /// signal for supplemental OCR).
    fn page_has_images(&self, page: u32) -> bool;
}

/// Produces a raster image of one PDF page, suitable for OCR.
pub trait Rasterizer: Send + Sync {
    /// Rasterize the given 1-based page of `pdf` to an image byte stream.
    fn rasterize(&self, pdf: &[u8], page: u32) -> Result<Vec<u8>>;
}

/// Recognizes text in a raster image.
pub trait OcrEngine: Send + Sync {
    /// Return the recognized text. May be empty; may fail.
    fn recognize(&self, image: &[u8]) -> Result<String>;
}

// ---------------------------------------------------------------------------
// LopdfReader: concrete PdfReader backed by lopdf + pdf-extract
// ---------------------------------------------------------------------------

/// Concrete [`PdfReader`] backed by `lopdf` for structure and `pdf-extract`
/// for the text layer.
///
/// Per-page text is extracted once at load; a text-layer failure is
/// downgraded to empty pages (AutoDetect then falls back to OCR) rather than
/// failing the whole document.
pub struct LopdfReader {
    doc: LopdfDocument,
    page_texts: Vec<String>,
}

impl LopdfReader {
    /// Load from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        let page_texts = match pdf_extract::extract_text_from_mem_by_pages(data) {
            Ok(pages) => pages,
            Err(e) => {
                log::warn!("text layer extraction failed, treating pages as textless: {e}");
                Vec::new()
            }
        };
        Ok(Self { doc, page_texts })
    }

    /// Load from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    fn page_id(&self, page: u32) -> Option<(u32, u16)> {
        self.doc.get_pages().get(&page).copied()
    }

    fn resolved_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Dictionary(d) => Some(d),
            Object::Reference(r) => match self.doc.get_object(*r).ok()? {
                Object::Dictionary(d) => Some(d),
                Object::Stream(s) => Some(&s.dict),
                _ => None,
            },
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    fn dict_has_image_xobject(&self, resources: &Dictionary) -> bool {
        let Ok(xobjects) = resources.get(b"XObject") else {
            return false;
        };
        let Some(xobjects) = self.resolved_dict(xobjects) else {
            return false;
        };
        xobjects.iter().any(|(_, obj)| {
            self.resolved_dict(obj)
                .and_then(|d| d.get(b"Subtype").ok())
                .and_then(|s| s.as_name().ok())
                .is_some_and(|name| name == b"Image")
        })
    }
}

impl PdfReader for LopdfReader {
    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        if page == 0 || page > self.page_count() {
            return Err(Error::PageOutOfRange(page, self.page_count()));
        }
        Ok(self
            .page_texts
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    fn page_has_images(&self, page: u32) -> bool {
        let Some(page_id) = self.page_id(page) else {
            return false;
        };

        let (direct, referenced) = self.doc.get_page_resources(page_id);
        if let Some(dict) = direct {
            if self.dict_has_image_xobject(dict) {
                return true;
            }
        }
        referenced.into_iter().any(|id| {
            self.doc
                .get_object(id)
                .ok()
                .and_then(|obj| obj.as_dict().ok())
                .is_some_and(|dict| self.dict_has_image_xobject(dict))
        })
    }
}

// ---------------------------------------------------------------------------
// Subprocess backends
// ---------------------------------------------------------------------------

/// Run a command to completion, killing it once `timeout` elapses.
fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> io::Result<Output> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let deadline = Instant::now() + timeout;
    loop {
        if child.try_wait()?.is_some() {
            return child.wait_with_output();
        }
        if Instant::now() >= deadline {
            child.kill()?;
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out after {}s", timeout.as_secs()),
            ));
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

/// Check that a tool is on PATH and answers `--version`.
fn probe_tool(name: &str) -> bool {
    Command::new(name)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

/// Concrete [`Rasterizer`] shelling out to `pdftoppm` (Poppler).
pub struct PdftoppmRasterizer {
    dpi: u32,
    timeout: Duration,
}

impl PdftoppmRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Override the per-page timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether `pdftoppm` is installed.
    pub fn is_available() -> bool {
        probe_tool("pdftoppm")
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new(300)
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &[u8], page: u32) -> Result<Vec<u8>> {
        let dir = tempfile::tempdir()?;
        let pdf_path = dir.path().join("source.pdf");
        std::fs::write(&pdf_path, pdf)?;
        let out_prefix = dir.path().join("page");

        let mut cmd = Command::new("pdftoppm");
        cmd.arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile")
            .arg(&pdf_path)
            .arg(&out_prefix);

        let output = run_with_timeout(&mut cmd, self.timeout)
            .map_err(|e| Error::Rasterize(format!("pdftoppm: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Rasterize(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let png_path = out_prefix.with_extension("png");
        std::fs::read(&png_path).map_err(|e| Error::Rasterize(format!("reading raster: {e}")))
    }
}

/// Concrete [`OcrEngine`] shelling out to the `tesseract` binary.
pub struct TesseractOcr {
    language: String,
    timeout: Duration,
}

impl TesseractOcr {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    /// Override the per-image timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether `tesseract` is installed.
    pub fn is_available() -> bool {
        probe_tool("tesseract")
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("eng")
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> Result<String> {
        let dir = tempfile::tempdir()?;
        let image_path = dir.path().join("input.png");
        std::fs::write(&image_path, image)?;

        let mut cmd = Command::new("tesseract");
        cmd.arg(&image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg("3");

        let output = run_with_timeout(&mut cmd, self.timeout)
            .map_err(|e| Error::Ocr(format!("tesseract: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        // Tesseract output is UTF-8 in practice; be lossy rather than fail.
        Ok(sanitize_bytes(&output.stdout).trim().to_string())
    }
}
