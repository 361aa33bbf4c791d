//! wordify CLI - convert PDFs and scanned images to Word documents

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use wordify::{
    BulkAction, ConvertOptions, FragmentKey, Granularity, LopdfReader, OcrMode, PageSelection,
    PdfReader, PdftoppmRasterizer, Session, SourceKind, TesseractOcr,
};

#[derive(Parser)]
#[command(name = "wordify")]
#[command(version)]
#[command(about = "Convert PDF documents and scanned images to Word documents", long_about = None)]
struct Cli {
    /// Input file (shortcut for `wordify convert FILE`)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF or image to a Word document
    Convert {
        /// Input file (pdf, png, jpg)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (default: `<base> (converted).docx` in the current directory)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page selection (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// OCR policy
        #[arg(long, value_enum, default_value = "auto")]
        ocr: OcrPolicy,

        /// OCR language (Tesseract language code)
        #[arg(long, default_value = "eng")]
        lang: String,

        /// Rasterization resolution for OCR
        #[arg(long, default_value = "300")]
        dpi: u32,

        /// Keep each page as a single paragraph instead of one per line
        #[arg(long)]
        whole_pages: bool,

        /// Process pages one at a time
        #[arg(long)]
        sequential: bool,

        /// Exclude fragments by key (comma-separated `page:index`, e.g. "2:0,3:4")
        #[arg(long, value_name = "KEYS")]
        exclude: Option<String>,

        /// Include only these fragments (comma-separated `page:index`)
        #[arg(long, value_name = "KEYS", conflicts_with = "exclude")]
        only: Option<String>,
    },

    /// List extracted fragments with their keys (preview for --exclude/--only)
    List {
        /// Input file (pdf, png, jpg)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page selection (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// OCR policy
        #[arg(long, value_enum, default_value = "auto")]
        ocr: OcrPolicy,

        /// OCR language (Tesseract language code)
        #[arg(long, default_value = "eng")]
        lang: String,

        /// Rasterization resolution for OCR
        #[arg(long, default_value = "300")]
        dpi: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show source information (type, page count, embedded images)
    Info {
        /// Input file (pdf, png, jpg)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OcrPolicy {
    /// Native text first, OCR fallback for scanned or image-heavy pages
    Auto,
    /// Always OCR, never read the text layer
    Force,
    /// Native text only
    Off,
}

impl From<OcrPolicy> for OcrMode {
    fn from(policy: OcrPolicy) -> Self {
        match policy {
            OcrPolicy::Auto => OcrMode::Auto,
            OcrPolicy::Force => OcrMode::Force,
            OcrPolicy::Off => OcrMode::Off,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            pages,
            ocr,
            lang,
            dpi,
            whole_pages,
            sequential,
            exclude,
            only,
        }) => run_convert(
            &input,
            output.as_deref(),
            pages.as_deref(),
            ocr,
            &lang,
            dpi,
            whole_pages,
            sequential,
            exclude.as_deref(),
            only.as_deref(),
        ),
        Some(Commands::List {
            input,
            pages,
            ocr,
            lang,
            dpi,
            json,
        }) => run_list(&input, pages.as_deref(), ocr, &lang, dpi, json),
        Some(Commands::Info { input }) => run_info(&input),
        None => match cli.input {
            Some(input) => run_convert(
                &input,
                None,
                None,
                OcrPolicy::Auto,
                "eng",
                300,
                false,
                false,
                None,
                None,
            ),
            None => {
                eprintln!("{}", "No input file. Try: wordify convert <FILE>".red());
                process::exit(2);
            }
        },
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn build_options(
    pages: Option<&str>,
    ocr: OcrPolicy,
    lang: &str,
    dpi: u32,
) -> Result<ConvertOptions, wordify::Error> {
    let mut options = ConvertOptions::new()
        .with_ocr_mode(ocr.into())
        .with_ocr_language(lang)
        .with_dpi(dpi);
    if let Some(spec) = pages {
        let selection = PageSelection::parse(spec).map_err(wordify::Error::InvalidPageRange)?;
        options = options.with_pages(selection);
    }
    Ok(options)
}

fn warn_missing_tools(mode: OcrMode, kind: Option<SourceKind>) {
    if mode == OcrMode::Off {
        return;
    }
    if !TesseractOcr::is_available() {
        eprintln!(
            "{} tesseract not found; pages needing OCR will be reported as failed",
            "Warning:".yellow().bold()
        );
    }
    if kind == Some(SourceKind::Pdf) && !PdftoppmRasterizer::is_available() {
        eprintln!(
            "{} pdftoppm not found; PDF pages cannot be rasterized for OCR",
            "Warning:".yellow().bold()
        );
    }
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(std::time::Duration::from_millis(80));
    bar
}

fn parse_keys(spec: &str) -> Result<Vec<FragmentKey>, wordify::Error> {
    spec.split(',')
        .map(|part| FragmentKey::parse(part.trim()))
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn run_convert(
    input: &Path,
    output: Option<&Path>,
    pages: Option<&str>,
    ocr: OcrPolicy,
    lang: &str,
    dpi: u32,
    whole_pages: bool,
    sequential: bool,
    exclude: Option<&str>,
    only: Option<&str>,
) -> Result<(), wordify::Error> {
    let mut options = build_options(pages, ocr, lang, dpi)?;
    if whole_pages {
        options = options.with_granularity(Granularity::WholeUnit);
    }
    if sequential {
        options = options.sequential();
    }
    let advanced = exclude.is_some() || only.is_some();
    if advanced {
        options = options.advanced();
    }

    let mut session = Session::new(options.clone());
    let unit_count = session.load_path(input)?;
    warn_missing_tools(options.ocr_mode, session.source_kind());
    println!(
        "{} {} ({} unit{})",
        "Loaded".green().bold(),
        input.display(),
        unit_count,
        if unit_count == 1 { "" } else { "s" }
    );

    let bar = spinner("Extracting text...");
    let summary = session.extract()?;
    bar.finish_and_clear();
    if summary.units_processed == 0 {
        eprintln!(
            "{} the page selection matched no pages",
            "Warning:".yellow().bold()
        );
    }
    println!(
        "{} {} fragment{} from {} unit{}",
        "Extracted".green().bold(),
        summary.fragment_count,
        if summary.fragment_count == 1 { "" } else { "s" },
        summary.units_processed,
        if summary.units_processed == 1 { "" } else { "s" },
    );

    if advanced {
        if let Some(spec) = only {
            session.selection_mut().apply_bulk(BulkAction::ClearAll);
            for key in parse_keys(spec)? {
                session.selection_mut().set(key, true);
            }
        } else if let Some(spec) = exclude {
            for key in parse_keys(spec)? {
                session.selection_mut().set(key, false);
            }
        }
        session.assemble()?;
    }

    let assembled = session
        .output()
        .cloned()
        .ok_or_else(|| wordify::Error::Other("no output produced".to_string()))?;

    if assembled.failed_units > 0 {
        eprintln!(
            "{} {} unit{} failed extraction",
            "Warning:".yellow().bold(),
            assembled.failed_units,
            if assembled.failed_units == 1 { "" } else { "s" },
        );
    }
    if assembled.empty_selection {
        eprintln!(
            "{} no fragments selected; the document is empty",
            "Warning:".yellow().bold()
        );
    }

    let out_path = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&assembled.file_name),
    };
    std::fs::write(&out_path, &assembled.bytes)?;
    println!(
        "{} {} ({} paragraph{})",
        "Wrote".green().bold(),
        out_path.display(),
        assembled.paragraph_count,
        if assembled.paragraph_count == 1 { "" } else { "s" },
    );
    Ok(())
}

fn run_list(
    input: &Path,
    pages: Option<&str>,
    ocr: OcrPolicy,
    lang: &str,
    dpi: u32,
    json: bool,
) -> Result<(), wordify::Error> {
    let options = build_options(pages, ocr, lang, dpi)?.advanced();
    let mut session = Session::new(options.clone());
    session.load_path(input)?;
    warn_missing_tools(options.ocr_mode, session.source_kind());

    let bar = spinner("Extracting text...");
    session.extract()?;
    bar.finish_and_clear();

    if json {
        let rendered = serde_json::to_string_pretty(session.fragments())
            .map_err(|e| wordify::Error::Other(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    let mut current_unit = 0;
    for fragment in session.fragments() {
        if fragment.unit_index != current_unit {
            current_unit = fragment.unit_index;
            println!("{}", format!("Page {current_unit}:").bold());
        }
        println!("  [{}] {}", fragment.key().to_string().cyan(), fragment.text);
    }
    for (unit, reason) in session.failed_units() {
        eprintln!(
            "{} unit {} failed: {}",
            "Warning:".yellow().bold(),
            unit,
            reason
        );
    }
    Ok(())
}

fn run_info(input: &Path) -> Result<(), wordify::Error> {
    let kind = wordify::detect_kind_from_path(input)?;
    println!("{} {}", "File:".bold(), input.display());
    println!("{} {}", "Type:".bold(), kind);

    match kind {
        SourceKind::Pdf => {
            let reader = LopdfReader::open(input)?;
            let count = reader.page_count();
            println!("{} {}", "Pages:".bold(), count);
            for page in 1..=count {
                let has_text = reader
                    .page_text(page)
                    .map(|t| !t.trim().is_empty())
                    .unwrap_or(false);
                let has_images = reader.page_has_images(page);
                println!(
                    "  page {page}: text layer {}, embedded images {}",
                    if has_text { "yes".green() } else { "no".red() },
                    if has_images { "yes".green() } else { "no".normal() },
                );
            }
        }
        SourceKind::Png | SourceKind::Jpeg => {
            println!("{} 1 (standalone image)", "Units:".bold());
        }
    }
    Ok(())
}
