//! Conversion options and page selection.

use std::ops::RangeInclusive;

/// OCR policy for a conversion, applied per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrMode {
    /// Attempt native extraction first; fall back to or supplement with OCR
    /// when the unit has no text layer or contains embedded raster images.
    #[default]
    Auto,
    /// Always rasterize and OCR; never attempt native extraction.
    Force,
    /// Native extraction only; units without readable text get a sentinel
    /// fragment so page accounting stays 1:1.
    Off,
}

/// How extracted text is split into fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// One fragment per non-blank line. Required whenever per-fragment
    /// selection is offered; also the default, since each fragment becomes
    /// one output paragraph.
    #[default]
    Line,
    /// One fragment per unit, text kept as a single blob.
    WholeUnit,
}

/// How the conversion session is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Extract, select everything, assemble in one step.
    #[default]
    Automatic,
    /// Stop after extraction so fragments can be included/excluded
    /// individually before assembly.
    Advanced,
}

/// Options for a conversion session.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// OCR policy.
    pub ocr_mode: OcrMode,

    /// Fragment granularity.
    pub granularity: Granularity,

    /// Which units (1-based) to extract.
    pub pages: PageSelection,

    /// Automatic or advanced (interactive selection) flow.
    pub interaction: InteractionMode,

    /// Whether to extract units in parallel.
    pub parallel: bool,

    /// Rasterization resolution for OCR, in DPI.
    pub dpi: u32,

    /// OCR language hint (Tesseract language code).
    pub ocr_language: String,
}

impl ConvertOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the OCR mode.
    pub fn with_ocr_mode(mut self, mode: OcrMode) -> Self {
        self.ocr_mode = mode;
        self
    }

    /// Set fragment granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.pages = PageSelection::Range(range);
        self
    }

    /// Switch to the advanced (interactive selection) flow.
    pub fn advanced(mut self) -> Self {
        self.interaction = InteractionMode::Advanced;
        self
    }

    /// Disable parallel extraction.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set rasterization DPI.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the OCR language hint.
    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.ocr_language = language.into();
        self
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            ocr_mode: OcrMode::Auto,
            granularity: Granularity::Line,
            pages: PageSelection::All,
            interaction: InteractionMode::Automatic,
            parallel: true,
            dpi: 300,
            ocr_language: "eng".to_string(),
        }
    }
}

/// Unit selection for extraction (1-based page numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All units.
    #[default]
    All,
    /// An inclusive range of pages.
    Range(RangeInclusive<u32>),
    /// Specific pages.
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Resolve to the ordered list of selected pages for a document with
    /// `total` pages. Explicit out-of-range pages are an error; an empty
    /// resolution (e.g. range entirely past the end) is not.
    pub fn resolve(&self, total: u32) -> crate::error::Result<Vec<u32>> {
        match self {
            PageSelection::All => Ok((1..=total).collect()),
            PageSelection::Range(range) => {
                if range.start() < &1 {
                    return Err(crate::error::Error::InvalidPageRange(format!(
                        "{}-{}: pages are 1-based",
                        range.start(),
                        range.end()
                    )));
                }
                Ok((1..=total).filter(|p| range.contains(p)).collect())
            }
            PageSelection::Pages(pages) => {
                for &p in pages {
                    if p < 1 || p > total {
                        return Err(crate::error::Error::PageOutOfRange(p, total));
                    }
                }
                let mut sorted = pages.clone();
                sorted.sort_unstable();
                sorted.dedup();
                Ok(sorted)
            }
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10", "all").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        // Simple range (e.g., "1-10")
        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid start page")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid end page")?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        // Comma-separated list with possible ranges
        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid page number")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid page number")?;
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p: u32 = part.parse().map_err(|_| "Invalid page number")?;
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort();
        Ok(PageSelection::Pages(pages))
    }
}
