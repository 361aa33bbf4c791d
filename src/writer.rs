//! Word document serialization.

use std::io::Cursor;
use std::path::Path;

use docx_rs::{Docx, Paragraph, Run};

use crate::assemble::OutputDocument;
use crate::error::{Error, Result};

/// MIME type of the generated document.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Suffix appended to the source base name for the output file.
const CONVERTED_SUFFIX: &str = " (converted)";

/// Serializes an assembled document to a downloadable byte stream.
pub trait DocumentWriter: Send + Sync {
    /// Serialize the document.
    fn write(&self, document: &OutputDocument) -> Result<Vec<u8>>;

    /// Output file extension, without the leading dot.
    fn extension(&self) -> &'static str;

    /// Output MIME type.
    fn mime_type(&self) -> &'static str;
}

/// [`DocumentWriter`] producing DOCX via `docx-rs`.
#[derive(Debug, Default)]
pub struct DocxWriter;

impl DocxWriter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentWriter for DocxWriter {
    fn write(&self, document: &OutputDocument) -> Result<Vec<u8>> {
        let mut docx = Docx::new();
        for text in document.paragraphs() {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text.clone())));
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|e| Error::Writer(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn extension(&self) -> &'static str {
        "docx"
    }

    fn mime_type(&self) -> &'static str {
        DOCX_MIME
    }
}

/// Derive the output filename from the uploaded name:
/// `report.pdf` becomes `report (converted).docx`.
pub fn output_filename(input_name: &str, extension: &str) -> String {
    let stem = Path::new(input_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(input_name);
    format!("{stem}{CONVERTED_SUFFIX}.{extension}")
}
