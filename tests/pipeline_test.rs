//! End-to-end pipeline tests over the public API, with mock backends
//! standing in for the PDF reader, rasterizer, and OCR engine.

use std::collections::HashMap;

use wordify::{
    BulkAction, ConvertOptions, Error, FragmentKey, FragmentOrigin, OcrEngine, OcrMode,
    PageSelection, PdfReader, Rasterizer, Result, Session, SessionState, Source, SourceKind,
};

struct MockReader {
    texts: HashMap<u32, String>,
    image_pages: Vec<u32>,
}

impl MockReader {
    fn new(texts: &[(u32, &str)]) -> Self {
        Self {
            texts: texts.iter().map(|(p, t)| (*p, t.to_string())).collect(),
            image_pages: Vec::new(),
        }
    }

    fn with_images(mut self, pages: &[u32]) -> Self {
        self.image_pages = pages.to_vec();
        self
    }
}

impl PdfReader for MockReader {
    fn page_count(&self) -> u32 {
        self.texts.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        Ok(self.texts.get(&page).cloned().unwrap_or_default())
    }

    fn page_has_images(&self, page: u32) -> bool {
        self.image_pages.contains(&page)
    }
}

/// Encodes the page number as the image payload so the mock OCR engine can
/// tell pages apart.
struct MockRasterizer;

impl Rasterizer for MockRasterizer {
    fn rasterize(&self, _pdf: &[u8], page: u32) -> Result<Vec<u8>> {
        Ok(vec![page as u8])
    }
}

struct MockOcr {
    responses: HashMap<u8, String>,
    fail_keys: Vec<u8>,
}

impl MockOcr {
    fn new(responses: &[(u8, &str)]) -> Self {
        Self {
            responses: responses.iter().map(|(k, t)| (*k, t.to_string())).collect(),
            fail_keys: Vec::new(),
        }
    }

    fn failing_on(mut self, keys: &[u8]) -> Self {
        self.fail_keys = keys.to_vec();
        self
    }
}

impl OcrEngine for MockOcr {
    fn recognize(&self, image: &[u8]) -> Result<String> {
        let key = image.first().copied().unwrap_or(0);
        if self.fail_keys.contains(&key) {
            return Err(Error::Ocr(format!("engine crashed on image {key}")));
        }
        Ok(self.responses.get(&key).cloned().unwrap_or_default())
    }
}

fn session_with(options: ConvertOptions, ocr: MockOcr) -> Session {
    Session::with_backends(options, Box::new(MockRasterizer), Box::new(ocr))
}

fn load_pdf(session: &mut Session, name: &str, pages: &[(u32, &str)]) {
    load_pdf_with_images(session, name, pages, &[]);
}

fn load_pdf_with_images(
    session: &mut Session,
    name: &str,
    pages: &[(u32, &str)],
    image_pages: &[u32],
) {
    session
        .load_source(
            name,
            SourceKind::Pdf,
            Source::Pdf {
                reader: Box::new(MockReader::new(pages).with_images(image_pages)),
                raw: b"%PDF-1.4".to_vec(),
            },
        )
        .unwrap();
}

fn docx_paragraphs(bytes: &[u8]) -> Vec<String> {
    let parsed = docx_rs::read_docx(bytes).unwrap();
    let mut texts = Vec::new();
    for child in &parsed.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            let mut para = String::new();
            for run in &p.children {
                if let docx_rs::ParagraphChild::Run(r) = run {
                    for node in &r.children {
                        if let docx_rs::RunChild::Text(t) = node {
                            para.push_str(&t.text);
                        }
                    }
                }
            }
            texts.push(para);
        }
    }
    texts
}

#[test]
fn test_mixed_native_and_ocr_document() {
    // Page 1 has a text layer, page 2 is a scan: the output interleaves
    // native and recognized paragraphs in page order.
    let mut session = session_with(
        ConvertOptions::default().sequential(),
        MockOcr::new(&[(2, "Scanned")]),
    );
    load_pdf(&mut session, "mixed.pdf", &[(1, "Hello\nWorld"), (2, "")]);

    let summary = session.extract().unwrap();
    assert_eq!(summary.units_processed, 2);
    assert_eq!(summary.failed_units, 0);

    let output = session.output().unwrap();
    assert_eq!(output.file_name, "mixed (converted).docx");
    assert_eq!(
        docx_paragraphs(&output.bytes),
        vec!["Hello", "World", "Scanned"]
    );

    let origins: Vec<FragmentOrigin> = session.fragments().iter().map(|f| f.origin).collect();
    assert_eq!(
        origins,
        vec![
            FragmentOrigin::Native,
            FragmentOrigin::Native,
            FragmentOrigin::Ocr
        ]
    );
}

#[test]
fn test_unit_failure_does_not_poison_batch() {
    // OCR crashes on page 3 of 5; the other four pages come through and the
    // failure is reported against page 3 only.
    let pages: Vec<(u32, String)> = (1..=5).map(|p| (p, String::new())).collect();
    let pages_ref: Vec<(u32, &str)> = pages.iter().map(|(p, t)| (*p, t.as_str())).collect();
    let responses: Vec<(u8, String)> = (1..=5).map(|p| (p, format!("text of page {p}"))).collect();
    let responses_ref: Vec<(u8, &str)> =
        responses.iter().map(|(k, t)| (*k, t.as_str())).collect();

    let mut session = session_with(
        ConvertOptions::default()
            .with_ocr_mode(OcrMode::Force)
            .sequential(),
        MockOcr::new(&responses_ref).failing_on(&[3]),
    );
    load_pdf(&mut session, "scan.pdf", &pages_ref);

    let summary = session.extract().unwrap();
    assert_eq!(summary.units_processed, 5);
    assert_eq!(summary.failed_units, 1);

    let texts: Vec<&str> = session.fragments().iter().map(|f| f.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "text of page 1",
            "text of page 2",
            "text of page 4",
            "text of page 5"
        ]
    );

    let (failed_unit, reason) = &session.failed_units()[0];
    assert_eq!(*failed_unit, 3);
    assert!(reason.contains("crashed"));

    let output = session.output().unwrap();
    assert_eq!(output.failed_units, 1);
    assert_eq!(output.paragraph_count, 4);
}

#[test]
fn test_auto_supplements_native_with_image_text() {
    let mut session = session_with(
        ConvertOptions::default().sequential(),
        MockOcr::new(&[(1, "Inside the figure")]),
    );
    load_pdf_with_images(&mut session, "report.pdf", &[(1, "Figure 1 caption")], &[1]);

    session.extract().unwrap();
    let output = session.output().unwrap();
    assert_eq!(
        docx_paragraphs(&output.bytes),
        vec!["Figure 1 caption", "Inside the figure"]
    );
}

#[test]
fn test_advanced_selection_round_trip() {
    let mut session = session_with(
        ConvertOptions::default()
            .with_ocr_mode(OcrMode::Off)
            .advanced()
            .sequential(),
        MockOcr::new(&[]),
    );
    load_pdf(
        &mut session,
        "doc.pdf",
        &[(1, "keep one\ndrop this"), (2, "keep two")],
    );

    session.extract().unwrap();
    assert_eq!(session.state(), SessionState::AwaitingSelection);

    session.selection_mut().set(FragmentKey::new(1, 1), false);
    let output = session.assemble().unwrap();
    assert_eq!(docx_paragraphs(&output.bytes), vec!["keep one", "keep two"]);
}

#[test]
fn test_only_selection_via_clear_all() {
    let mut session = session_with(
        ConvertOptions::default()
            .with_ocr_mode(OcrMode::Off)
            .advanced()
            .sequential(),
        MockOcr::new(&[]),
    );
    load_pdf(&mut session, "doc.pdf", &[(1, "a\nb\nc")]);

    session.extract().unwrap();
    session.selection_mut().apply_bulk(BulkAction::ClearAll);
    session.selection_mut().set(FragmentKey::new(1, 2), true);

    let output = session.assemble().unwrap();
    assert_eq!(docx_paragraphs(&output.bytes), vec!["c"]);
    assert!(!output.empty_selection);
}

#[test]
fn test_output_filename_tracks_each_upload() {
    let mut session = session_with(
        ConvertOptions::default().with_ocr_mode(OcrMode::Off).sequential(),
        MockOcr::new(&[]),
    );

    load_pdf(&mut session, "alpha.pdf", &[(1, "first")]);
    session.extract().unwrap();
    assert_eq!(session.output().unwrap().file_name, "alpha (converted).docx");

    load_pdf(&mut session, "beta.pdf", &[(1, "second")]);
    session.extract().unwrap();
    let output = session.output().unwrap();
    assert_eq!(output.file_name, "beta (converted).docx");
    assert_eq!(docx_paragraphs(&output.bytes), vec!["second"]);
}

#[test]
fn test_image_upload_single_unit() {
    // PNG magic so validation passes; the mock OCR keys off the first byte.
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    png.extend_from_slice(&[0u8; 8]);

    let mut session = session_with(
        ConvertOptions::default().sequential(),
        MockOcr::new(&[(0x89, "Text in the photo")]),
    );
    session.load_bytes("photo.png", png).unwrap();
    assert_eq!(session.unit_count(), Some(1));

    session.extract().unwrap();
    let output = session.output().unwrap();
    assert_eq!(output.file_name, "photo (converted).docx");
    assert_eq!(docx_paragraphs(&output.bytes), vec!["Text in the photo"]);
}

#[test]
fn test_page_subset_selection() {
    let mut session = session_with(
        ConvertOptions::default()
            .with_ocr_mode(OcrMode::Off)
            .with_pages(PageSelection::Pages(vec![1, 3]))
            .sequential(),
        MockOcr::new(&[]),
    );
    load_pdf(&mut session, "doc.pdf", &[(1, "one"), (2, "two"), (3, "three")]);

    session.extract().unwrap();
    assert_eq!(
        docx_paragraphs(&session.output().unwrap().bytes),
        vec!["one", "three"]
    );
}

#[test]
fn test_explicit_out_of_range_page_is_error() {
    let mut session = session_with(
        ConvertOptions::default()
            .with_ocr_mode(OcrMode::Off)
            .with_pages(PageSelection::Pages(vec![7]))
            .sequential(),
        MockOcr::new(&[]),
    );
    load_pdf(&mut session, "doc.pdf", &[(1, "only page")]);

    let err = session.extract().unwrap_err();
    assert!(matches!(err, Error::PageOutOfRange(7, 1)));
}

#[test]
fn test_parallel_extraction_is_deterministic() {
    let pages: Vec<(u32, String)> = (1..=12).map(|p| (p, format!("line a {p}\nline b {p}"))).collect();
    let pages_ref: Vec<(u32, &str)> = pages.iter().map(|(p, t)| (*p, t.as_str())).collect();

    let mut parallel = session_with(
        ConvertOptions::default().with_ocr_mode(OcrMode::Off),
        MockOcr::new(&[]),
    );
    load_pdf(&mut parallel, "big.pdf", &pages_ref);
    parallel.extract().unwrap();

    let mut sequential = session_with(
        ConvertOptions::default().with_ocr_mode(OcrMode::Off).sequential(),
        MockOcr::new(&[]),
    );
    load_pdf(&mut sequential, "big.pdf", &pages_ref);
    sequential.extract().unwrap();

    assert_eq!(parallel.fragments(), sequential.fragments());
    assert_eq!(
        docx_paragraphs(&parallel.output().unwrap().bytes),
        docx_paragraphs(&sequential.output().unwrap().bytes)
    );
}
