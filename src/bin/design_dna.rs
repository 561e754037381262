use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{Level, info};

use design_dna::{
    CANVAS_SIZE, DEFAULT_MAX_COLORS, DEFAULT_TOP_K, DatedDesign, DesignColor, ExtractOptions,
    ExtractedColor, HexEntry, assign_roles, build_profile, cluster_entries, extract_colors_with,
};

/// Pull design DNA color palettes out of screenshots.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Log progress at debug level (to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the dominant colors of one or more images
    Extract {
        /// Input image paths (PNG, JPEG or WEBP)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Maximum number of colors per image
        #[arg(short = 'k', long, default_value_t = DEFAULT_MAX_COLORS)]
        max_colors: usize,

        /// Side of the square canvas images are resized onto (at most 4096)
        #[arg(long, default_value_t = CANVAS_SIZE)]
        canvas: u32,

        /// Label colors with background/primary/secondary/accent roles
        #[arg(long)]
        roles: bool,
    },
    /// Build a consensus palette from JSON palettes written by `extract`
    /// (or plain arrays of `{ "hex": ... }`)
    Cluster {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Number of consensus colors to keep
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Summarize a JSON array of `{ "created_at", "dna" }` records
    Taste { input: PathBuf },
}

#[derive(Serialize)]
#[serde(untagged)]
enum Palette {
    Extracted(Vec<ExtractedColor>),
    Labeled(Vec<DesignColor>),
}

#[derive(Serialize)]
struct FilePalette {
    file: String,
    colors: Palette,
}

#[derive(Deserialize)]
struct PaletteRecord {
    colors: Vec<HexEntry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PaletteFile {
    Records(Vec<PaletteRecord>),
    Colors(Vec<HexEntry>),
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn extract_file(path: &Path, options: &ExtractOptions, roles: bool) -> Result<FilePalette> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let colors = extract_colors_with(&bytes, options)
        .with_context(|| format!("extracting colors from {}", path.display()))?;
    info!(file = %path.display(), colors = colors.len(), "extracted palette");

    let colors = if roles {
        Palette::Labeled(assign_roles(&colors))
    } else {
        Palette::Extracted(colors)
    };
    Ok(FilePalette {
        file: path.display().to_string(),
        colors,
    })
}

fn read_palette(path: &Path) -> Result<Vec<HexEntry>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let parsed: PaletteFile =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(match parsed {
        PaletteFile::Records(records) => records.into_iter().flat_map(|r| r.colors).collect(),
        PaletteFile::Colors(colors) => colors,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let output = match args.command {
        Command::Extract {
            inputs,
            max_colors,
            canvas,
            roles,
        } => {
            let options = ExtractOptions {
                max_colors,
                canvas_width: canvas,
                canvas_height: canvas,
                ..ExtractOptions::default()
            };
            options.validate()?;
            let palettes = inputs
                .par_iter()
                .map(|path| extract_file(path, &options, roles))
                .collect::<Result<Vec<_>>>()?;
            serde_json::to_string_pretty(&palettes)?
        }
        Command::Cluster { inputs, top_k } => {
            let mut entries = Vec::new();
            for path in &inputs {
                entries.extend(read_palette(path)?);
            }
            info!(files = inputs.len(), colors = entries.len(), "clustering palettes");
            serde_json::to_string_pretty(&cluster_entries(&entries, top_k)?)?
        }
        Command::Taste { input } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let designs: Vec<DatedDesign> = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", input.display()))?;
            serde_json::to_string_pretty(&build_profile(&designs)?)?
        }
    };

    println!("{output}");
    Ok(())
}
