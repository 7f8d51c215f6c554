//! access-aide - EPUB accessibility annotator

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use access_aide::editor::InventoryDump;
use access_aide::{AcceptSuggestions, AltTextEditor, EpubContainer, OverrideFile};

#[derive(Parser)]
#[command(name = "access-aide")]
#[command(version, about = "Add accessibility metadata, ARIA roles and alt text to an EPUB", long_about = None)]
#[command(after_help = "EXAMPLES:
    access-aide book.epub                       Annotate in place
    access-aide book.epub -o accessible.epub    Write to a new file
    access-aide book.epub --dump-images a.json  Also list images and proposed alt text
    access-aide book.epub --alt-map alt.json    Apply hand-written alt text")]
struct Cli {
    /// Input EPUB
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output EPUB (defaults to rewriting INPUT)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// JSON array of {image, document, index, alt} overrides
    #[arg(long, value_name = "FILE")]
    alt_map: Option<PathBuf>,

    /// Write the image inventory with proposed alt text as JSON
    /// (only when the book has images)
    #[arg(long, value_name = "FILE")]
    dump_images: Option<PathBuf>,

    /// Preferences file (thumbnail width)
    #[arg(long, value_name = "FILE")]
    prefs: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match annotate(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(status) => ExitCode::from(u8::try_from(status).unwrap_or(1)),
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn annotate(cli: &Cli) -> access_aide::Result<i32> {
    let mut book = EpubContainer::open(&cli.input)?;
    if let Some(path) = &cli.prefs {
        book = book.with_prefs_file(path);
    }

    let editor: Box<dyn AltTextEditor> = match &cli.alt_map {
        Some(path) => Box::new(OverrideFile::load(path)?),
        None => Box::new(AcceptSuggestions),
    };
    let mut editor: Box<dyn AltTextEditor> = match &cli.dump_images {
        Some(path) => Box::new(InventoryDump::new(editor, path)),
        None => editor,
    };

    let status = access_aide::run(&mut book, editor.as_mut());
    if status == 0 {
        book.save(cli.output.as_ref().unwrap_or(&cli.input))?;
    }
    Ok(status)
}
