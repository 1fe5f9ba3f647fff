//! Wombat CLI
//!
//! Lays out a JSON box-tree document headlessly, then prints the layout
//! and/or renders it to a PNG.

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use owo_colors::OwoColorize;
use tracing::Level;
use wombat_layout::{BoxKind, BoxSnapshot, Document, DocumentSettings, LayoutSnapshot, Size, WordKind, tree_from_json};
use wombat_render::{FileImageLoader, SystemFonts, render};

/// How long to wait for asynchronous image loads before painting.
const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Wombat: lay out and render box-tree documents
#[derive(Parser, Debug)]
#[command(name = "wombat")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the laid-out box tree
    wombat --layout page.json

    # Render to a PNG at 1024px wide
    wombat -o page.png --width 1024 page.json

    # Dump box geometry as JSON, sizing the page to its content
    wombat --json --width 0 page.json

    # Use a settings file and load images synchronously
    wombat --settings print.json --sync-images -o page.png page.json
"#)]
struct Cli {
    /// JSON box-tree document
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Render the document and save it to this PNG file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Layout width in pixels; 0 sizes the document to its content
    #[arg(long)]
    width: Option<f32>,

    /// Height of the rendered image (default: the content height)
    #[arg(long)]
    height: Option<u32>,

    /// Document settings JSON; flags override its values
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Print the laid-out box tree with its geometry
    #[arg(long)]
    layout: bool,

    /// Print the layout snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Load images synchronously during layout
    #[arg(long)]
    sync_images: bool,

    /// More logging: -v for debug, -vv for trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(&cli)?;
    let source = fs::read_to_string(&cli.input).with_context(|| format!("failed to read '{}'", cli.input.display()))?;
    let tree = tree_from_json(&source).with_context(|| format!("failed to build '{}'", cli.input.display()))?;

    let base_dir = cli.input.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let fonts = Rc::new(SystemFonts::discover());
    let mut doc = Document::new(tree, settings, Box::new(Rc::clone(&fonts)), Box::new(Rc::clone(&fonts)))
        .with_loader(Box::new(FileImageLoader::new(base_dir)));

    let size = lay_out(&mut doc)?;
    tracing::info!(width = size.width, height = size.height, boxes = doc.tree().len(), "document laid out");

    if cli.layout {
        print_layout(&doc.snapshot(), size);
    }
    if cli.json {
        let json = doc.snapshot().to_json().context("failed to serialize layout")?;
        println!("{json}");
    }
    if let Some(output) = &cli.output {
        let width = size.width.ceil().max(1.0) as u32;
        let height = cli.height.unwrap_or_else(|| size.height.ceil().max(1.0) as u32);
        let surface = render(&mut doc, fonts, width, height).context("failed to render document")?;
        surface.save_png(output)?;
        println!("Rendered {width}x{height} to: {}", output.display());
    }
    if !cli.layout && !cli.json && cli.output.is_none() {
        println!("Laid out {} boxes: {:.1}x{:.1}", doc.tree().len(), size.width, size.height);
    }

    doc.dispose();
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> Result<DocumentSettings> {
    let mut settings = match &cli.settings {
        Some(path) => {
            let json =
                fs::read_to_string(path).with_context(|| format!("failed to read settings '{}'", path.display()))?;
            DocumentSettings::from_json(&json).with_context(|| format!("invalid settings '{}'", path.display()))?
        }
        None => DocumentSettings::default(),
    };
    if let Some(width) = cli.width {
        settings.max_size.width = width;
    }
    if cli.sync_images {
        settings.avoid_async_image_loading = true;
    }
    Ok(settings)
}

/// Lay out, then again once if asynchronous images arrived in time.
fn lay_out(doc: &mut Document) -> Result<Size> {
    let mut size = doc.layout().context("layout failed")?;
    if doc.pending_images() > 0 {
        let applied = doc.wait_for_images(IMAGE_TIMEOUT);
        if applied && doc.take_refresh() == Some(true) {
            size = doc.layout().context("layout failed")?;
        }
        if doc.pending_images() > 0 {
            tracing::warn!(pending = doc.pending_images(), "images still loading, painting placeholders");
        }
    }
    Ok(size)
}

/// Print every box with its geometry, indented by depth.
fn print_layout(snapshot: &LayoutSnapshot, size: Size) {
    let color = std::io::stdout().is_terminal();
    println!("=== Layout Tree ({:.1}x{:.1}) ===\n", size.width, size.height);
    for b in &snapshot.boxes {
        let indent = "  ".repeat(b.depth);
        let name = box_name(b);
        let geometry = format!(
            "x={:.1} y={:.1} w={:.1} h={:.1}",
            b.location.x, b.location.y, b.size.width, b.size.height
        );
        if color {
            println!("{indent}{} {} {}", name.cyan(), b.display.dimmed(), geometry.green());
        } else {
            println!("{indent}{name} {} {geometry}", b.display);
        }

        if let Some(preview) = text_preview(b) {
            if color {
                println!("{indent}  {}", preview.yellow());
            } else {
                println!("{indent}  {preview}");
            }
        }
        if b.rectangles.len() > 1 {
            println!("{indent}  {} line rectangles", b.rectangles.len());
        }
    }
}

fn box_name(b: &BoxSnapshot) -> String {
    let tag = if b.tag.is_empty() {
        "anonymous".to_string()
    } else {
        format!("<{}>", b.tag)
    };
    match b.kind {
        BoxKind::Generic => format!("{tag} {}", b.id),
        BoxKind::ListMarker => format!("marker {}", b.id),
        BoxKind::SpacingPlaceholder { extends, .. } => format!("placeholder {} for {extends}", b.id),
        ref other => format!("{tag} {} {other:?}", b.id),
    }
}

fn text_preview(b: &BoxSnapshot) -> Option<String> {
    let text: Vec<&str> = b
        .words
        .iter()
        .filter_map(|w| match &w.kind {
            WordKind::Text(t) => Some(t.as_str()),
            WordKind::LineBreak | WordKind::Image => None,
        })
        .collect();
    if text.is_empty() {
        return None;
    }
    let joined = text.join(" ");
    let preview: String = joined.chars().take(50).collect();
    let suffix = if joined.chars().count() > 50 { "..." } else { "" };
    Some(format!("\"{preview}{suffix}\""))
}
