use std::env;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing::info;

use triage::library::{LocalMediaService, MediaService};
use triage::preload::FsLoader;
use triage::{TriageSession, ViewerConfig};

const DEFAULT_VIEWPORT_HEIGHT: f64 = 900.0;
const DEFAULT_VIEWPORT_WIDTH: f64 = 1200.0;

#[derive(Debug, Clone)]
struct Args {
    path: PathBuf,
    viewport_height: f64,
    viewport_width: f64,
    config: ViewerConfig,
}

fn parse_args() -> Result<Args> {
    let mut config = ViewerConfig::from_env();
    let mut path: Option<PathBuf> = None;
    let mut viewport_height = DEFAULT_VIEWPORT_HEIGHT;
    let mut viewport_width = DEFAULT_VIEWPORT_WIDTH;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--path" => {
                let value = args.next().context("Missing value for --path")?;
                path = Some(PathBuf::from(value));
            }
            "--recursive" => config.scan.recursive = true,
            "--follow-symlinks" => config.scan.follow_symlinks = true,
            "--max-depth" => {
                let value = args.next().context("Missing value for --max-depth")?;
                config.scan.max_depth = value
                    .parse::<usize>()
                    .context("Failed to parse --max-depth as a positive integer")?;
            }
            "--viewport" => {
                let value = args.next().context("Missing value for --viewport")?;
                viewport_height = value
                    .parse::<f64>()
                    .context("Failed to parse --viewport as a height in pixels")?;
            }
            "--width" => {
                let value = args.next().context("Missing value for --width")?;
                viewport_width = value
                    .parse::<f64>()
                    .context("Failed to parse --width as a width in pixels")?;
            }
            "--concurrency" => {
                let value = args.next().context("Missing value for --concurrency")?;
                config.preload.max_concurrent = value
                    .parse::<usize>()
                    .context("Failed to parse --concurrency as a positive integer")?;
            }
            _ => {
                if path.is_none() && !arg.starts_with('-') {
                    path = Some(PathBuf::from(arg));
                } else {
                    bail!("Unknown argument: {}", arg);
                }
            }
        }
    }

    if config.preload.max_concurrent == 0 {
        bail!("--concurrency must be greater than 0");
    }
    if config.scan.max_depth == 0 {
        bail!("--max-depth must be greater than 0");
    }
    if !(viewport_height.is_finite() && viewport_height > 0.0) {
        bail!("--viewport must be a positive height");
    }
    if !(viewport_width.is_finite() && viewport_width > 0.0) {
        bail!("--width must be a positive width");
    }

    let path = match path {
        Some(path) => path,
        None => env::current_dir().context("Failed to resolve the current directory")?,
    };

    Ok(Args {
        path,
        viewport_height,
        viewport_width,
        config,
    })
}

fn run(args: Args) -> Result<()> {
    if !args.path.is_dir() {
        bail!("Path is not a directory: {}", args.path.display());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(async move {
        let start = Instant::now();
        let service = LocalMediaService::with_symlinks(args.config.scan.follow_symlinks);
        let pending = service
            .count_items(&args.path)
            .with_context(|| format!("Failed to read {}", args.path.display()))?;
        println!("path={} top_level_photos={}", args.path.display(), pending);

        let loader = FsLoader::current()?;
        let mut session = TriageSession::new(service, loader, args.config);
        session
            .load_directory(&args.path)
            .with_context(|| format!("Failed to load {}", args.path.display()))?;
        session.set_viewport(args.viewport_width, args.viewport_height);

        let window = session.window();
        println!(
            "window start={} end={} columns={} rows={}..{}",
            window.start_index,
            window.end_index,
            window.columns_per_row,
            window.start_row(),
            window.end_row()
        );

        if let Some(meta) = session.current_metadata() {
            let exif = meta.exif.unwrap_or_default();
            println!(
                "first size={} camera={} {} settings={} {} {}",
                meta.size,
                exif.camera_make.unwrap_or_default(),
                exif.camera_model.unwrap_or_default(),
                exif.aperture.unwrap_or_default(),
                exif.shutter_speed.unwrap_or_default(),
                exif.iso.unwrap_or_default()
            );
        }

        // Walk the whole selection the way a user holding ArrowRight would.
        loop {
            session.pump();
            let progress = session.progress();
            if let Some(item) = session.current() {
                println!(
                    "select index={} of={} file={} {}x{} {} remaining={:.2}",
                    progress.position,
                    progress.total,
                    item.file_name(),
                    item.width,
                    item.height,
                    item.orientation,
                    progress.remaining
                );
            }
            if !session.next() {
                break;
            }
            tokio::task::yield_now().await;
        }
        session.settle_preloads().await;

        let stats = session.preloader().stats();
        let window = session.window();
        info!(
            items = session.items().len(),
            loaded = stats.loaded,
            failed = stats.failed,
            discarded = stats.discarded_total,
            warm_bytes = session.preloader().warm().current_bytes(),
            warm_budget = session.preloader().warm().max_bytes(),
            window_start = window.start_index,
            window_end = window.end_index,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Triage walk complete"
        );
        Ok::<(), anyhow::Error>(())
    })
}

fn init_tracing() -> Result<()> {
    let directive = "triage=info"
        .parse::<tracing_subscriber::filter::Directive>()
        .context("Failed to parse default log directive")?;
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(directive);
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn main() {
    let result = init_tracing().and_then(|()| parse_args()).and_then(run);
    if let Err(e) = result {
        eprintln!("triage: {:#}", e);
        std::process::exit(1);
    }
}
