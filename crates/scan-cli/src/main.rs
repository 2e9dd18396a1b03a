mod logger;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scan_async_runtime::{ScanCommand, ScanUpdate, spawn_worker};
use scan_document::{Point, RawImage, Rect};
use scan_library::{
    CaptureSession, Catalog, DeleteOutcome, DocumentHandle, GestureEvent, LibraryOptions,
    open_library,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scand", about = "Scan pages into a local PDF library", version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Library directory (overrides the configuration)
    #[arg(short, long, global = true)]
    library: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture an image file into the library as a new document
    Scan {
        /// Input image (PNG or JPEG)
        #[arg(short, long)]
        input: PathBuf,

        /// Rotation in degrees, clockwise
        #[arg(long, allow_negative_numbers = true)]
        rotate: Option<f64>,

        /// Crop rectangle in display coordinates: x,y,width,height
        #[arg(long, value_parser = parse_rect)]
        crop: Option<Rect>,

        /// Display position of the preview's top-left pixel: x,y
        #[arg(long, value_parser = parse_point, default_value = "0,0")]
        origin: Point,

        /// Preview pixels per display unit
        #[arg(long, default_value = "1.0")]
        scale: f64,
    },

    /// List stored documents, oldest first
    List,

    /// Rename a stored document
    Rename {
        /// Document file name, as shown by `list`
        id: String,
        /// New name (the extension is added)
        name: String,
    },

    /// Delete a stored document
    Delete {
        /// Document file name, as shown by `list`
        id: String,
    },

    /// Show page count and size of a stored document
    Info {
        /// Document file name, as shown by `list`
        id: String,
    },

    /// Render the first page of a document to a PNG thumbnail
    Thumbnail {
        /// Document file name, as shown by `list`
        id: String,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Longest edge in pixels (defaults to the configured size)
        #[arg(long)]
        max_edge: Option<u32>,
    },

    /// Write the effective configuration (defaults plus overrides) to a file
    InitConfig {
        /// Output JSON file
        path: PathBuf,
    },
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("{s:?}: {e}"))?;
    values
        .try_into()
        .map_err(|_| format!("expected {N} comma-separated numbers, got {s:?}"))
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let [x, y, width, height] = parse_numbers::<4>(s)?;
    Ok(Rect::new(x, y, width, height))
}

fn parse_point(s: &str) -> Result<Point, String> {
    let [x, y] = parse_numbers::<2>(s)?;
    Ok(Point::new(x, y))
}

async fn load_options(cli: &Cli) -> Result<LibraryOptions> {
    let mut options = match &cli.config {
        Some(path) => LibraryOptions::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LibraryOptions::default(),
    };
    if let Some(dir) = &cli.library {
        options.library_dir = dir.clone();
    }
    options.validate()?;
    Ok(options)
}

fn load_image(path: &Path) -> Result<RawImage> {
    let decoded =
        image::open(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(RawImage::try_from(decoded)?)
}

/// Drive one capture through the worker, the way an interactive front end would
async fn scan(
    catalog: Arc<Catalog>,
    options: &LibraryOptions,
    image: RawImage,
    rotation: Option<f64>,
    crop: Option<Rect>,
    origin: Point,
    scale: f64,
) -> Result<()> {
    let session = CaptureSession::from_options(options);
    let (command_tx, mut update_rx, _worker) = spawn_worker(session, catalog);

    let mut commands = vec![
        ScanCommand::StartCapture,
        ScanCommand::Deliver { image },
        ScanCommand::Gesture(GestureEvent::Viewport { origin, scale }),
    ];
    if let Some(degrees) = rotation {
        commands.push(ScanCommand::Gesture(GestureEvent::Rotation(degrees)));
    }
    if let Some(rect) = crop {
        commands.push(ScanCommand::Gesture(GestureEvent::CropRect(rect)));
    }
    commands.push(ScanCommand::Save);
    for command in commands {
        command_tx.send(command)?;
    }

    while let Some(update) = update_rx.recv().await {
        match update {
            ScanUpdate::SessionChanged {
                phase, preview, ..
            } => {
                if let Some(preview) = preview {
                    log::info!(
                        "Session {}: preview {}x{}",
                        phase,
                        preview.width(),
                        preview.height()
                    );
                } else {
                    log::info!("Session {}", phase);
                }
            }
            ScanUpdate::Saved { entry } => {
                println!("Saved {} → {}", entry.display_name, entry.id);
                return Ok(());
            }
            ScanUpdate::Error { message } => bail!(message),
            other => log::debug!("Ignoring update {:?}", other),
        }
    }
    bail!("Scan worker stopped before the document was saved")
}

async fn open_catalog(options: &LibraryOptions) -> Result<Arc<Catalog>> {
    let catalog = open_library(options).await.with_context(|| {
        format!("Failed to open library {}", options.library_dir.display())
    })?;
    Ok(Arc::new(catalog))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::CliLogger::new(cli.verbose).init()?;
    let options = load_options(&cli).await?;

    match cli.command {
        Commands::Scan {
            input,
            rotate,
            crop,
            origin,
            scale,
        } => {
            let image = load_image(&input)?;
            let catalog = open_catalog(&options).await?;
            scan(catalog, &options, image, rotate, crop, origin, scale).await?;
        }

        Commands::List => {
            let catalog = open_catalog(&options).await?;
            let entries = catalog.snapshot();
            if entries.is_empty() {
                println!("No documents in {}", options.library_dir.display());
            }
            for entry in entries.iter() {
                println!(
                    "{}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.id
                );
            }
        }

        Commands::Rename { id, name } => {
            let catalog = open_catalog(&options).await?;
            let id = DocumentHandle::new(id);
            let entry = catalog.rename(&id, &name).await?;
            println!("Renamed {} → {}", id, entry.id);
        }

        Commands::Delete { id } => {
            let catalog = open_catalog(&options).await?;
            let id = DocumentHandle::new(id);
            match catalog.delete(&id).await? {
                DeleteOutcome::Removed => println!("Deleted {}", id),
                DeleteOutcome::AlreadyMissing => println!("{} was already gone", id),
            }
        }

        Commands::Info { id } => {
            let catalog = open_catalog(&options).await?;
            let id = DocumentHandle::new(id);
            let pages = catalog.page_count(&id).await?;
            let size = catalog.open(&id).await?.len();
            println!("{}", id);
            println!("  Pages: {}", pages);
            println!("  Size: {} bytes", size);
            if let Some(entry) = catalog.get(&id) {
                println!("  Created: {}", entry.created_at.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        Commands::Thumbnail {
            id,
            output,
            max_edge,
        } => {
            let catalog = open_catalog(&options).await?;
            let id = DocumentHandle::new(id);
            let max_edge = max_edge.unwrap_or(options.thumbnail_max_edge);
            let thumb = catalog.thumbnail(&id, max_edge).await?;
            thumb
                .to_dynamic()?
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!(
                "Thumbnail {}x{} → {}",
                thumb.width(),
                thumb.height(),
                output.display()
            );
        }

        Commands::InitConfig { path } => {
            options.save(&path).await?;
            println!("Wrote configuration → {}", path.display());
        }
    }

    Ok(())
}
