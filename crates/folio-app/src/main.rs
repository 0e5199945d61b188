// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — turn a stack of photos into a one-image-per-page PDF.
//
// Entry point. Initialises logging, loads the config, and runs one command.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use folio_core::error::Result;
use folio_core::human_errors::humanize_error;
use folio_core::types::{AspectRatio, FlipAxis, Orientation, PaperSize};
use folio_core::AppConfig;
use folio_document::{DocumentComposer, PdfReader};
use folio_editor::{CropBox, CropSettings};

use services::data_dir;
use services::inputs::{self, parse_crop_box};
use services::pipeline::{self, EditPlan};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Turn images into a one-image-per-page PDF", long_about = None)]
struct Cli {
    /// Settings file (defaults to the folio data directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a PDF from images, one image per page, in the order given
    Build {
        /// Image files
        #[arg(value_name = "IMAGES", required = true)]
        images: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out: PathBuf,

        /// Paper size: a4, a3, a5, letter, legal, tabloid, or WxH in mm
        #[arg(long, value_name = "SIZE")]
        paper: Option<PaperSize>,

        /// Landscape pages
        #[arg(long)]
        landscape: bool,

        /// Blank border around each image, in millimetres
        #[arg(long, value_name = "MM")]
        margin: Option<f32>,

        /// Title stored in the PDF metadata
        #[arg(long, value_name = "TEXT")]
        title: Option<String>,

        /// Rotate every image clockwise by this many degrees
        #[arg(long, value_name = "DEG", allow_hyphen_values = true)]
        rotate: Option<f32>,

        /// Flip every image (h or v); may be repeated
        #[arg(long, value_name = "AXIS")]
        flip: Vec<FlipAxis>,

        /// Brightness, -100 to 100
        #[arg(long, value_name = "N", allow_hyphen_values = true)]
        brightness: Option<i32>,

        /// Contrast, -100 to 100
        #[arg(long, value_name = "N", allow_hyphen_values = true)]
        contrast: Option<i32>,

        /// Saturation, -100 to 100
        #[arg(long, value_name = "N", allow_hyphen_values = true)]
        saturation: Option<i32>,

        /// Crop box in source pixels after the other edits (x,y,width,height)
        #[arg(long, value_name = "X,Y,W,H", value_parser = parse_crop_box)]
        crop: Option<CropBox>,

        /// Crop aspect ratio: free, W:H, or a number
        #[arg(long, value_name = "RATIO")]
        aspect: Option<AspectRatio>,
    },

    /// Print the page count and page sizes of a PDF
    Inspect {
        /// PDF file
        input: PathBuf,
    },

    /// Show the effective settings and where they are read from
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(data_dir::config_path);
    let config = AppConfig::load(&config_path)?;
    tracing::debug!(path = %config_path.display(), ?config, "Config loaded");

    match cli.command {
        Commands::Build {
            images,
            out,
            paper,
            landscape,
            margin,
            title,
            rotate,
            flip,
            brightness,
            contrast,
            saturation,
            crop,
            aspect,
        } => {
            let mut config = config;
            if let Some(paper) = paper {
                config.paper_size = paper;
            }
            if landscape {
                config.orientation = Orientation::Landscape;
            }
            let mut composer = DocumentComposer::from_config(&config);
            if let Some(margin) = margin {
                composer.set_margin_mm(margin);
            }
            if let Some(title) = title {
                composer.set_title(title);
            }

            let plan = EditPlan {
                rotate,
                flips: flip,
                brightness,
                contrast,
                saturation,
                crop,
                aspect,
            };

            let inputs = images
                .iter()
                .map(|path| inputs::read_input(path))
                .collect::<Result<Vec<_>>>()?;

            let crop_settings = CropSettings::from(&config);
            let doc = pipeline::build_document(inputs, &plan, crop_settings, &composer).await?;

            std::fs::create_dir_all(&out)?;
            let path = out.join(&doc.filename);
            std::fs::write(&path, &doc.bytes)?;
            tracing::info!(path = %path.display(), pages = doc.page_count, "PDF written");
            println!("{}", path.display());
        }

        Commands::Inspect { input } => {
            let reader = PdfReader::open(&input)?;
            println!("{}: {} page(s)", input.display(), reader.page_count());
            for (index, (w, h)) in reader.page_sizes_pt()?.into_iter().enumerate() {
                println!("  page {}: {:.1} x {:.1} pt", index + 1, w, h);
            }
        }

        Commands::Config { save } => {
            println!("{}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save(&config_path)?;
                tracing::info!(path = %config_path.display(), "Config saved");
            }
        }
    }
    Ok(())
}
