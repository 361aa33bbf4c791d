//! Conversion session controller.
//!
//! One [`Session`] owns the state for one conversion request: the loaded
//! source, the accumulated fragments, the selection, and the assembled
//! output. Nothing survives a reset or a new upload; a prior session's
//! output is never reused.

use rayon::prelude::*;

use crate::assemble::{assemble, OutputDocument};
use crate::detect::{validate_source, SourceKind};
use crate::error::{Error, Result};
use crate::extract::{
    Fragment, LopdfReader, OcrEngine, PdfReader, PdftoppmRasterizer, Rasterizer, TesseractOcr,
    UnitExtractor, UnitOutcome,
};
use crate::options::{ConvertOptions, InteractionMode};
use crate::select::SelectionSet;
use crate::writer::{output_filename, DocumentWriter, DocxWriter};

/// Lifecycle of one conversion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No source loaded.
    #[default]
    Idle,
    /// Source parsed, unit count known.
    Loaded,
    /// Units are being extracted.
    Extracting,
    /// Extraction finished; waiting for fragment selection (advanced mode).
    AwaitingSelection,
    /// Output document built and retrievable.
    Assembled,
    /// Unrecoverable error; a fresh upload is required.
    Failed,
}

impl SessionState {
    fn name(self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Loaded => "Loaded",
            SessionState::Extracting => "Extracting",
            SessionState::AwaitingSelection => "AwaitingSelection",
            SessionState::Assembled => "Assembled",
            SessionState::Failed => "Failed",
        }
    }
}

/// A loaded source document: an ordered sequence of units.
pub enum Source {
    /// PDF document. `raw` is kept for rasterization.
    Pdf {
        reader: Box<dyn PdfReader>,
        raw: Vec<u8>,
    },
    /// A single standalone image (one unit).
    Image { bytes: Vec<u8> },
}

impl Source {
    fn unit_count(&self) -> u32 {
        match self {
            Source::Pdf { reader, .. } => reader.page_count(),
            Source::Image { .. } => 1,
        }
    }
}

/// Summary of one extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Units processed.
    pub units_processed: usize,
    /// Fragments accumulated.
    pub fragment_count: usize,
    /// Units whose extraction recorded a failure.
    pub failed_units: usize,
}

/// The assembled, downloadable result.
#[derive(Debug, Clone)]
pub struct Assembled {
    /// Derived output filename (`<base> (converted).docx`).
    pub file_name: String,
    /// Serialized document.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub mime_type: &'static str,
    /// Paragraphs in the document.
    pub paragraph_count: usize,
    /// True when the user confirmed assembly with zero fragments selected.
    /// A warning, not an error.
    pub empty_selection: bool,
    /// Units that recorded an extraction failure.
    pub failed_units: usize,
}

/// Controller for one conversion session.
pub struct Session {
    options: ConvertOptions,
    extractor: UnitExtractor,
    writer: Box<dyn DocumentWriter>,
    state: SessionState,
    source_name: Option<String>,
    source_kind: Option<SourceKind>,
    source: Option<Source>,
    fragments: Vec<Fragment>,
    failed_units: Vec<(u32, String)>,
    selection: SelectionSet,
    output: Option<Assembled>,
}

impl Session {
    /// Create a session with the default backends (`pdftoppm` rasterizer,
    /// `tesseract` OCR, DOCX writer).
    pub fn new(options: ConvertOptions) -> Self {
        let rasterizer = Box::new(PdftoppmRasterizer::new(options.dpi));
        let ocr = Box::new(TesseractOcr::new(options.ocr_language.clone()));
        Self::with_backends(options, rasterizer, ocr)
    }

    /// Create a session with custom rasterizer and OCR backends.
    pub fn with_backends(
        options: ConvertOptions,
        rasterizer: Box<dyn Rasterizer>,
        ocr: Box<dyn OcrEngine>,
    ) -> Self {
        let extractor = UnitExtractor::new(rasterizer, ocr, options.ocr_mode, options.granularity);
        Self {
            options,
            extractor,
            writer: Box::new(DocxWriter::new()),
            state: SessionState::Idle,
            source_name: None,
            source_kind: None,
            source: None,
            fragments: Vec::new(),
            failed_units: Vec::new(),
            selection: SelectionSet::empty(),
            output: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Unit count of the loaded source, if any.
    pub fn unit_count(&self) -> Option<u32> {
        self.source.as_ref().map(Source::unit_count)
    }

    /// Detected kind of the loaded source, if any.
    pub fn source_kind(&self) -> Option<SourceKind> {
        self.source_kind
    }

    /// Accumulated sanitized fragments, in source order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Units that recorded an extraction failure, with reasons.
    pub fn failed_units(&self) -> &[(u32, String)] {
        &self.failed_units
    }

    /// The selection over extracted fragments. Meaningful once extraction
    /// has run; defaults to all-included.
    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Mutable selection access for include/exclude toggles and bulk
    /// actions (advanced mode, between extraction and assembly).
    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    /// The assembled output, once built.
    pub fn output(&self) -> Option<&Assembled> {
        self.output.as_ref()
    }

    /// Discard everything and return to `Idle`. Also the clean abort path.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.source_name = None;
        self.source_kind = None;
        self.source = None;
        self.fragments.clear();
        self.failed_units.clear();
        self.selection = SelectionSet::empty();
        self.output = None;
    }

    /// Load a source from a file on disk. Returns the unit count.
    pub fn load_path<P: AsRef<std::path::Path>>(&mut self, path: P) -> Result<u32> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| Error::UnsupportedFileType(path.display().to_string()))?;
        let data = std::fs::read(path)?;
        self.load_bytes(&name, data)
    }

    /// Load a source from an uploaded byte blob. Any previous session state
    /// is discarded first. Returns the unit count.
    pub fn load_bytes(&mut self, name: &str, data: Vec<u8>) -> Result<u32> {
        self.reset();

        let kind = validate_source(name, &data)?;
        let source = match kind {
            SourceKind::Pdf => {
                let reader = LopdfReader::from_bytes(&data).map_err(|e| {
                    self.state = SessionState::Failed;
                    match e {
                        Error::SourceUnreadable(_) => e,
                        other => Error::SourceUnreadable(other.to_string()),
                    }
                })?;
                Source::Pdf {
                    reader: Box::new(reader),
                    raw: data,
                }
            }
            SourceKind::Png | SourceKind::Jpeg => Source::Image { bytes: data },
        };

        self.install_source(name, kind, source)
    }

    /// Load a pre-built source (custom [`PdfReader`] implementations).
    pub fn load_source(&mut self, name: &str, kind: SourceKind, source: Source) -> Result<u32> {
        self.reset();
        self.install_source(name, kind, source)
    }

    fn install_source(&mut self, name: &str, kind: SourceKind, source: Source) -> Result<u32> {
        let count = source.unit_count();
        log::debug!("loaded {name}: {kind}, {count} unit(s)");
        self.source_name = Some(name.to_string());
        self.source_kind = Some(kind);
        self.source = Some(source);
        self.state = SessionState::Loaded;
        Ok(count)
    }

    /// Extract the units chosen by `options.pages`.
    ///
    /// In automatic mode this also selects everything and assembles; in
    /// advanced mode the session stops at `AwaitingSelection`.
    pub fn extract(&mut self) -> Result<ExtractSummary> {
        if self.state != SessionState::Loaded {
            return Err(Error::InvalidState {
                expected: "Loaded",
                actual: self.state.name(),
            });
        }
        let source = self.source.as_ref().ok_or(Error::InvalidState {
            expected: "Loaded",
            actual: "Idle",
        })?;

        let units = self.options.pages.resolve(source.unit_count())?;
        self.state = SessionState::Extracting;

        let extractor = &self.extractor;
        let outcomes: Vec<UnitOutcome> = match source {
            Source::Pdf { reader, raw } => {
                let reader = reader.as_ref();
                if self.options.parallel {
                    // Pages are independent; collect() keeps input order, so
                    // assembly does not depend on completion order.
                    units
                        .par_iter()
                        .map(|&page| extractor.extract_pdf_page(reader, raw, page))
                        .collect()
                } else {
                    units
                        .iter()
                        .map(|&page| extractor.extract_pdf_page(reader, raw, page))
                        .collect()
                }
            }
            Source::Image { bytes } => units
                .iter()
                .map(|_| extractor.extract_image(bytes))
                .collect(),
        };

        self.fragments.clear();
        self.failed_units.clear();
        for outcome in outcomes {
            if let Some(reason) = outcome.failure {
                self.failed_units.push((outcome.unit_index, reason));
            }
            self.fragments.extend(outcome.fragments);
        }
        self.selection = SelectionSet::all_included(&self.fragments);

        let summary = ExtractSummary {
            units_processed: units.len(),
            fragment_count: self.fragments.len(),
            failed_units: self.failed_units.len(),
        };
        log::debug!(
            "extracted {} fragment(s) from {} unit(s), {} failure(s)",
            summary.fragment_count,
            summary.units_processed,
            summary.failed_units
        );

        match self.options.interaction {
            InteractionMode::Advanced => {
                self.state = SessionState::AwaitingSelection;
            }
            InteractionMode::Automatic => {
                self.build_output()?;
            }
        }
        Ok(summary)
    }

    /// Assemble the output document from the current selection
    /// (advanced mode).
    pub fn assemble(&mut self) -> Result<&Assembled> {
        if self.state != SessionState::AwaitingSelection {
            return Err(Error::InvalidState {
                expected: "AwaitingSelection",
                actual: self.state.name(),
            });
        }
        self.build_output()?;
        self.output
            .as_ref()
            .ok_or_else(|| Error::Other("assembly produced no output".to_string()))
    }

    fn build_output(&mut self) -> Result<()> {
        let document: OutputDocument = assemble(&self.fragments, &self.selection);
        let empty_selection = self.selection.included_count() == 0;
        if empty_selection {
            log::warn!("assembly requested with zero fragments selected");
        }

        let bytes = self.writer.write(&document).map_err(|e| {
            self.state = SessionState::Failed;
            e
        })?;

        let source_name = self.source_name.as_deref().unwrap_or("document");
        self.output = Some(Assembled {
            file_name: output_filename(source_name, self.writer.extension()),
            bytes,
            mime_type: self.writer.mime_type(),
            paragraph_count: document.paragraph_count(),
            empty_selection,
            failed_units: self.failed_units.len(),
        });
        self.state = SessionState::Assembled;
        Ok(())
    }
}
