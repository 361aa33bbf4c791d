//! Per-unit text extraction.
//!
//! A unit is one PDF page or one standalone image. For each unit the
//! extractor chooses between the native text layer and OCR according to
//! [`OcrMode`], splits the resolved text into fragments, and reports the
//! outcome. A failing unit never aborts the batch: the failure is recorded
//! on the [`UnitOutcome`] and processing continues.

mod backend;

pub use backend::{
    LopdfReader, OcrEngine, PdfReader, PdftoppmRasterizer, Rasterizer, TesseractOcr,
};

use crate::error::Result;
use crate::options::{Granularity, OcrMode};
use crate::sanitize::sanitize;
use serde::Serialize;

/// Placeholder emitted for a unit that resolved to no readable text, so
/// page accounting stays 1:1 with the input.
pub const BLANK_UNIT_SENTINEL: &str = "[page is blank or unreadable]";

/// Where a fragment's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentOrigin {
    /// Pulled from the PDF's embedded text layer.
    Native,
    /// Recognized from a raster image.
    Ocr,
}

/// Identity of a fragment: position within the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FragmentKey {
    /// 1-based unit (page) index.
    pub unit_index: u32,
    /// 0-based order of the fragment within its unit.
    pub order_in_unit: u32,
}

impl FragmentKey {
    pub fn new(unit_index: u32, order_in_unit: u32) -> Self {
        Self {
            unit_index,
            order_in_unit,
        }
    }

    /// Parse a key written as `unit:order` (e.g. `2:0`).
    pub fn parse(s: &str) -> Result<Self> {
        let (unit, order) = s.split_once(':').ok_or_else(|| {
            crate::error::Error::Other(format!("invalid fragment key '{s}': expected unit:order"))
        })?;
        let unit_index = unit
            .trim()
            .parse()
            .map_err(|_| crate::error::Error::Other(format!("invalid unit index in '{s}'")))?;
        let order_in_unit = order
            .trim()
            .parse()
            .map_err(|_| crate::error::Error::Other(format!("invalid fragment order in '{s}'")))?;
        Ok(Self::new(unit_index, order_in_unit))
    }
}

impl std::fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.unit_index, self.order_in_unit)
    }
}

/// A piece of extracted, sanitized text carrying its source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// 1-based unit index.
    pub unit_index: u32,
    /// 0-based order within the unit.
    pub order_in_unit: u32,
    /// Sanitized text.
    pub text: String,
    /// Native text layer or OCR.
    pub origin: FragmentOrigin,
}

impl Fragment {
    pub fn new(
        unit_index: u32,
        order_in_unit: u32,
        text: impl Into<String>,
        origin: FragmentOrigin,
    ) -> Self {
        Self {
            unit_index,
            order_in_unit,
            text: text.into(),
            origin,
        }
    }

    /// Identity key for selection and ordering.
    pub fn key(&self) -> FragmentKey {
        FragmentKey::new(self.unit_index, self.order_in_unit)
    }
}

/// Result of extracting one unit.
///
/// A unit can produce fragments and still record a failure (e.g. the native
/// text layer was readable but supplemental OCR errored). A unit whose whole
/// pipeline failed has no fragments and a reason.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    /// 1-based unit index.
    pub unit_index: u32,
    /// Fragments produced for this unit, in source order.
    pub fragments: Vec<Fragment>,
    /// Failure recorded for this unit, if any.
    pub failure: Option<String>,
}

impl UnitOutcome {
    fn ok(unit_index: u32, fragments: Vec<Fragment>) -> Self {
        Self {
            unit_index,
            fragments,
            failure: None,
        }
    }

    fn failed(unit_index: u32, reason: impl Into<String>) -> Self {
        Self {
            unit_index,
            fragments: Vec::new(),
            failure: Some(reason.into()),
        }
    }
}

/// Text resolved for one unit before fragment splitting: ordered parts with
/// their origin.
struct ResolvedText {
    parts: Vec<(String, FragmentOrigin)>,
    failure: Option<String>,
}

/// Drives native extraction and OCR for individual units.
pub struct UnitExtractor {
    rasterizer: Box<dyn Rasterizer>,
    ocr: Box<dyn OcrEngine>,
    ocr_mode: OcrMode,
    granularity: Granularity,
}

impl UnitExtractor {
    pub fn new(
        rasterizer: Box<dyn Rasterizer>,
        ocr: Box<dyn OcrEngine>,
        ocr_mode: OcrMode,
        granularity: Granularity,
    ) -> Self {
        Self {
            rasterizer,
            ocr,
            ocr_mode,
            granularity,
        }
    }

    /// Extract one PDF page. `raw_pdf` is the original source blob, needed
    /// when the page must be rasterized for OCR.
    pub fn extract_pdf_page(
        &self,
        reader: &dyn PdfReader,
        raw_pdf: &[u8],
        page: u32,
    ) -> UnitOutcome {
        let resolved = self.resolve_pdf_page(reader, raw_pdf, page);
        self.into_outcome(page, resolved)
    }

    /// Extract a standalone image (always unit 1). Images have no text
    /// layer: with OCR off, the unit resolves blank and gets the sentinel.
    pub fn extract_image(&self, bytes: &[u8]) -> UnitOutcome {
        let resolved = match self.ocr_mode {
            OcrMode::Off => ResolvedText {
                parts: Vec::new(),
                failure: None,
            },
            OcrMode::Force | OcrMode::Auto => match self.ocr.recognize(bytes) {
                Ok(text) => ResolvedText {
                    parts: vec![(text, FragmentOrigin::Ocr)],
                    failure: None,
                },
                Err(e) => ResolvedText {
                    parts: Vec::new(),
                    failure: Some(e.to_string()),
                },
            },
        };
        self.into_outcome(1, resolved)
    }

    /// Apply the per-page OCR policy.
    fn resolve_pdf_page(&self, reader: &dyn PdfReader, raw_pdf: &[u8], page: u32) -> ResolvedText {
        match self.ocr_mode {
            OcrMode::Off => match reader.page_text(page) {
                Ok(text) => ResolvedText {
                    parts: vec![(text, FragmentOrigin::Native)],
                    failure: None,
                },
                Err(e) => ResolvedText {
                    parts: Vec::new(),
                    failure: Some(e.to_string()),
                },
            },
            OcrMode::Force => match self.ocr_page(raw_pdf, page) {
                Ok(text) => ResolvedText {
                    parts: vec![(text, FragmentOrigin::Ocr)],
                    failure: None,
                },
                Err(e) => ResolvedText {
                    parts: Vec::new(),
                    failure: Some(e.to_string()),
                },
            },
            OcrMode::Auto => {
                let (native, native_failure) = match reader.page_text(page) {
                    Ok(text) => (text, None),
                    Err(e) => (String::new(), Some(e.to_string())),
                };
                let native_blank = native.trim().is_empty();
                let wants_ocr = native_blank || reader.page_has_images(page);

                if !wants_ocr {
                    return ResolvedText {
                        parts: vec![(native, FragmentOrigin::Native)],
                        failure: native_failure,
                    };
                }

                match self.ocr_page(raw_pdf, page) {
                    Ok(ocr_text) => {
                        let mut parts = Vec::new();
                        if !native_blank {
                            // Native first, OCR appended: recovers text
                            // trapped inside embedded images without
                            // discarding the text layer.
                            parts.push((native, FragmentOrigin::Native));
                        }
                        if !ocr_text.trim().is_empty() {
                            parts.push((ocr_text, FragmentOrigin::Ocr));
                        }
                        ResolvedText {
                            parts,
                            failure: native_failure,
                        }
                    }
                    Err(e) => {
                        log::warn!("page {page}: OCR failed, keeping native text: {e}");
                        let parts = if native_blank {
                            Vec::new()
                        } else {
                            vec![(native, FragmentOrigin::Native)]
                        };
                        ResolvedText {
                            parts,
                            failure: Some(e.to_string()),
                        }
                    }
                }
            }
        }
    }

    fn ocr_page(&self, raw_pdf: &[u8], page: u32) -> Result<String> {
        let image = self.rasterizer.rasterize(raw_pdf, page)?;
        self.ocr.recognize(&image)
    }

    /// Sanitize resolved text and split it into fragments.
    fn into_outcome(&self, unit_index: u32, resolved: ResolvedText) -> UnitOutcome {
        // A wholly failed unit contributes nothing; the reason is recorded.
        if resolved.parts.is_empty() {
            if let Some(reason) = resolved.failure {
                log::warn!("unit {unit_index}: extraction failed: {reason}");
                return UnitOutcome::failed(unit_index, reason);
            }
        }

        let mut fragments = Vec::new();
        match self.granularity {
            Granularity::Line => {
                let mut order = 0u32;
                for (raw, origin) in &resolved.parts {
                    let clean = sanitize(raw);
                    for line in clean.lines() {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        fragments.push(Fragment::new(unit_index, order, line, *origin));
                        order += 1;
                    }
                }
            }
            Granularity::WholeUnit => {
                // One blob per unit: native and OCR parts joined with a
                // line break, never split into separate fragments.
                let origin = resolved
                    .parts
                    .first()
                    .map(|(_, o)| *o)
                    .unwrap_or(FragmentOrigin::Native);
                let joined = resolved
                    .parts
                    .iter()
                    .map(|(t, _)| t.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                let clean = sanitize(&joined);
                let trimmed = clean.trim();
                if !trimmed.is_empty() {
                    fragments.push(Fragment::new(unit_index, 0, trimmed, origin));
                }
            }
        }

        // Blank unit: sentinel keeps accounting 1:1 with the input.
        if fragments.is_empty() {
            fragments.push(Fragment::new(
                unit_index,
                0,
                BLANK_UNIT_SENTINEL,
                FragmentOrigin::Native,
            ));
        }

        UnitOutcome {
            unit_index,
            fragments,
            failure: resolved.failure,
        }
    }
}
