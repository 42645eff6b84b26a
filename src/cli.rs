use crate::align::process_raw_annotations;
use crate::config::load_config;
use crate::dump::write_marker_dump;
use crate::ir::{GraphModel, RawAnnotation};
use crate::pipeline::{MarkerOptions, build_markers};
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Deserialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "annot",
    version,
    about = "Align chart annotations to a metric series and merge overlapping markers"
)]
pub struct Args {
    /// Input JSON file with `annotations` and `graphModel`, or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output JSON file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Chart width in pixels
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Minimum pixel gap between markers before they are merged
    #[arg(short = 's', long = "space")]
    pub space: Option<f64>,

    /// Only align annotations; skip positioning and grouping
    #[arg(long = "align-only")]
    pub align_only: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationInput {
    #[serde(default)]
    pub annotations: Vec<RawAnnotation>,
    pub graph_model: GraphModel,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.markers.width = width;
    }
    if let Some(space) = args.space {
        config.markers.space_per_annotation = space;
    }

    let raw = read_input(args.input.as_deref())?;
    let input: AnnotationInput =
        serde_json::from_str(&raw).context("failed to parse annotation input")?;
    info!(
        "read {} annotation(s) and {} graph point(s)",
        input.annotations.len(),
        input.graph_model.graph_data.len()
    );

    let markers = if args.align_only {
        process_raw_annotations(&input.annotations, &input.graph_model)?
    } else {
        let options = MarkerOptions::from_config(&config.markers);
        build_markers(&input.annotations, &input.graph_model, &options)?
    };
    info!("emitting {} marker(s)", markers.len());

    write_marker_dump(args.output.as_deref(), &markers, &input.graph_model)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    let _ = env_logger::Builder::new().filter_level(level).try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
