//! Source file type detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Supported source kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// PDF document (sequence of pages).
    Pdf,
    /// PNG image (single unit).
    Png,
    /// JPEG image (single unit).
    Jpeg,
}

impl SourceKind {
    /// Whether this kind is a standalone raster image.
    pub fn is_image(self) -> bool {
        matches!(self, SourceKind::Png | SourceKind::Jpeg)
    }

    /// Canonical lowercase extension for this kind.
    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Png => "png",
            SourceKind::Jpeg => "jpg",
        }
    }

    /// Map a file extension to a kind. Case-insensitive.
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Ok(SourceKind::Pdf),
            "png" => Ok(SourceKind::Png),
            "jpg" | "jpeg" => Ok(SourceKind::Jpeg),
            other => Err(Error::UnsupportedFileType(other.to_string())),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "PDF"),
            SourceKind::Png => write!(f, "PNG"),
            SourceKind::Jpeg => write!(f, "JPEG"),
        }
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
/// PNG signature.
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
/// JPEG SOI marker plus the leading marker byte of the first segment.
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Detect the source kind from leading bytes.
///
/// # Returns
/// * `Ok(SourceKind)` if the data starts with a recognized signature
/// * `Err(Error::UnsupportedFileType)` otherwise
pub fn detect_kind_from_bytes(data: &[u8]) -> Result<SourceKind> {
    if data.starts_with(PDF_MAGIC) {
        return Ok(SourceKind::Pdf);
    }
    if data.starts_with(PNG_MAGIC) {
        return Ok(SourceKind::Png);
    }
    if data.starts_with(JPEG_MAGIC) {
        return Ok(SourceKind::Jpeg);
    }
    Err(Error::UnsupportedFileType("unknown signature".to_string()))
}

/// Detect the source kind from a file path, by content.
pub fn detect_kind_from_path<P: AsRef<Path>>(path: P) -> Result<SourceKind> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 16];
    let n = reader.read(&mut header)?;
    detect_kind_from_bytes(&header[..n])
}

/// Check bytes against the kind the file extension declared.
///
/// Rejects the upload before any processing when the content does not match
/// a supported type. A mismatch between extension and content is resolved in
/// favor of the content.
pub fn validate_source(name: &str, data: &[u8]) -> Result<SourceKind> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnsupportedFileType(format!("{name}: no extension")))?;
    SourceKind::from_extension(ext)?;
    detect_kind_from_bytes(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        assert_eq!(detect_kind_from_bytes(data).unwrap(), SourceKind::Pdf);
    }

    #[test]
    fn test_detect_png() {
        let data = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(detect_kind_from_bytes(&data).unwrap(), SourceKind::Png);
    }

    #[test]
    fn test_detect_jpeg() {
        let data = [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        assert_eq!(detect_kind_from_bytes(&data).unwrap(), SourceKind::Jpeg);
    }

    #[test]
    fn test_detect_unknown() {
        let result = detect_kind_from_bytes(b"<!DOCTYPE html>");
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
    }

    #[test]
    fn test_detect_empty() {
        let result = detect_kind_from_bytes(b"");
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(SourceKind::from_extension("pdf").unwrap(), SourceKind::Pdf);
        assert_eq!(SourceKind::from_extension("PDF").unwrap(), SourceKind::Pdf);
        assert_eq!(SourceKind::from_extension("jpeg").unwrap(), SourceKind::Jpeg);
        assert_eq!(SourceKind::from_extension("jpg").unwrap(), SourceKind::Jpeg);
        assert!(SourceKind::from_extension("docx").is_err());
        assert!(SourceKind::from_extension("tiff").is_err());
    }

    #[test]
    fn test_validate_source_rejects_bad_extension() {
        let result = validate_source("scan.tiff", b"%PDF-1.4\n");
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
    }

    #[test]
    fn test_validate_source_trusts_content() {
        // Extension says PNG, content says PDF: content wins.
        let kind = validate_source("scan.png", b"%PDF-1.4\n").unwrap();
        assert_eq!(kind, SourceKind::Pdf);
    }

    #[test]
    fn test_is_image() {
        assert!(!SourceKind::Pdf.is_image());
        assert!(SourceKind::Png.is_image());
        assert!(SourceKind::Jpeg.is_image());
    }
}
