use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures_util::future::join_all;
use sticker_grid::{
    dimensions_of, FitMode, OutputFormat, StickerConfig, StickerSession, StickerSize,
};

/// Cut AI-generated sticker sheets into individual stickers.
#[derive(Parser, Debug)]
#[command(name = "stickers")]
#[command(about = "✂️  Slice sticker sheets into individual stickers")]
#[command(long_about = "Slice a sticker sheet into a grid of independent stickers, optionally
resize them and ask the backend for labels, then write them to a directory.")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file
    #[arg(long, global = true, help = "Load settings from a JSON file")]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true, help = "Backend base URL (overrides config and STICKERS_BACKEND_URL)")]
    backend: Option<String>,

    /// Output image format
    #[arg(long, global = true, value_enum, help = "Encoding for written stickers")]
    format: Option<OutputFormat>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Slice an existing sheet
    Slice {
        /// Sheet image to slice
        input: PathBuf,

        #[command(flatten)]
        opts: SheetOpts,
    },
    /// Generate a sheet from a prompt, then slice it
    Generate {
        /// What the stickers should show
        prompt: String,

        /// Reference pictures sent along with the prompt
        #[arg(long = "reference", help = "Reference image (repeatable)")]
        references: Vec<PathBuf>,

        #[command(flatten)]
        opts: SheetOpts,
    },
    /// Print the dimensions of an image without decoding it
    Inspect {
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct SheetOpts {
    /// Directory the stickers are written to
    #[arg(short, long, default_value = "stickers", help = "Output directory")]
    output: PathBuf,

    #[arg(long, help = "Grid rows (default 4)")]
    rows: Option<u32>,

    #[arg(long, help = "Grid columns (default 4)")]
    cols: Option<u32>,

    /// Resize every sticker to this square size
    #[arg(short, long, value_enum, help = "Final sticker size: 256, 512, 1024 or 2048")]
    size: Option<StickerSize>,

    /// How non-square stickers are fitted when resized
    #[arg(long, value_enum, help = "stretch (default) or pad with transparency")]
    fit: Option<FitMode>,

    /// Ask the backend to name each sticker
    #[arg(long, help = "Request labels from the backend")]
    labels: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Inspect { ref file } => inspect(file).await,
        Command::Slice { ref input, ref opts } => {
            let session = build_session(&cli, opts)?;
            let sheet = tokio::fs::read(input)
                .await
                .with_context(|| format!("reading {}", input.display()))?;
            let stickers = session.load_sheet(sheet).await?;
            println!("Sliced {} into {} stickers", input.display(), stickers.len());
            finish(&session, opts).await
        }
        Command::Generate {
            ref prompt,
            ref references,
            ref opts,
        } => {
            let session = build_session(&cli, opts)?;
            let mut refs = Vec::with_capacity(references.len());
            for path in references {
                refs.push(
                    tokio::fs::read(path)
                        .await
                        .with_context(|| format!("reading reference {}", path.display()))?,
                );
            }
            println!("Generating sheet via {} ...", session.config().backend.base_url);
            let stickers = session.generate_sheet(prompt, &refs).await?;
            println!("Generated sheet with {} stickers", stickers.len());
            finish(&session, opts).await
        }
    }
}

/// Merge file, environment and flag settings into a session.
fn build_session(cli: &Cli, opts: &SheetOpts) -> Result<StickerSession> {
    let mut config = match &cli.config {
        Some(path) => StickerConfig::from_json_file(path)?,
        None => StickerConfig::default(),
    }
    .with_env_overrides();

    if let Some(url) = &cli.backend {
        config.backend.base_url = url.clone();
    }
    if let Some(format) = cli.format {
        config.output_format = format;
    }
    if let Some(rows) = opts.rows {
        config.rows = rows;
    }
    if let Some(cols) = opts.cols {
        config.cols = cols;
    }
    if let Some(fit) = opts.fit {
        config.square_fit = fit;
    }

    Ok(StickerSession::builder().with_config(config).build()?)
}

/// Optional labelling and resizing, then export.
async fn finish(session: &StickerSession, opts: &SheetOpts) -> Result<()> {
    if opts.labels {
        match session.enrich_labels().await {
            Ok(applied) => println!("Labelled {} stickers", applied),
            Err(e) => println!("⚠️  Keeping default labels: {}", e),
        }
    }

    if let Some(size) = opts.size {
        let side = size.side();
        let ids: Vec<u32> = session.segments().iter().map(|s| s.id()).collect();
        let results = join_all(ids.iter().map(|&id| session.adjust_resolution(id, side))).await;
        let failed = results.iter().filter(|r| r.is_err()).count();
        for (id, result) in ids.iter().zip(&results) {
            if let Err(e) = result {
                println!("⚠️  Sticker {} kept its size: {}", id + 1, e);
            }
        }
        println!("Resized {} stickers to {}px", ids.len() - failed, side);
    }

    let written = session.export_to_dir(&opts.output).await?;
    for path in &written {
        println!("  {}", path.display());
    }
    println!("✅ Wrote {} stickers to {}", written.len(), opts.output.display());
    Ok(())
}

async fn inspect(file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let dims = dimensions_of(&bytes)?;
    println!(
        "{}: {}x{} ({} bytes)",
        file.display(),
        dims.width,
        dims.height,
        bytes.len()
    );
    Ok(())
}
