use clap::Parser;
use needlefind::source::{FileSource, ImageSource};
use needlefind::visualize::{render_matches, render_rotated_matches};
use needlefind::{
    DensityCorrection, Finder, MatchOptions, MatchOverrides, MatchResult, Method, PixelDensity,
    Region, RotatedMatch, RotationOptions,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "needlefind CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MethodConfig {
    Sqdiff,
    SqdiffNormed,
    Ccorr,
    CcorrNormed,
    Ccoeff,
    CcoeffNormed,
}

impl From<MethodConfig> for Method {
    fn from(value: MethodConfig) -> Self {
        match value {
            MethodConfig::Sqdiff => Method::Sqdiff,
            MethodConfig::SqdiffNormed => Method::SqdiffNormed,
            MethodConfig::Ccorr => Method::Ccorr,
            MethodConfig::CcorrNormed => Method::CcorrNormed,
            MethodConfig::Ccoeff => Method::Ccoeff,
            MethodConfig::CcoeffNormed => Method::CcoeffNormed,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DensityCorrectionConfig {
    UniformOnly,
    PerAxis,
}

impl From<DensityCorrectionConfig> for DensityCorrection {
    fn from(value: DensityCorrectionConfig) -> Self {
        match value {
            DensityCorrectionConfig::UniformOnly => DensityCorrection::UniformOnly,
            DensityCorrectionConfig::PerAxis => DensityCorrection::PerAxis,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Mode {
    Best,
    #[default]
    All,
    Rotated,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RotationJson {
    tolerance_deg: f64,
    max_overlap: Option<f64>,
    min_reduced_area: usize,
    max_results: usize,
    stop_layer: usize,
    subpixel: bool,
}

impl Default for RotationJson {
    fn default() -> Self {
        let cfg = RotationOptions::default();
        Self {
            tolerance_deg: cfg.tolerance_deg,
            max_overlap: cfg.max_overlap,
            min_reduced_area: cfg.min_reduced_area,
            max_results: cfg.max_results,
            stop_layer: cfg.stop_layer,
            subpixel: cfg.subpixel,
        }
    }
}

impl From<RotationJson> for RotationOptions {
    fn from(value: RotationJson) -> Self {
        Self {
            tolerance_deg: value.tolerance_deg,
            max_overlap: value.max_overlap,
            min_reduced_area: value.min_reduced_area,
            max_results: value.max_results,
            stop_layer: value.stop_layer,
            subpixel: value.subpixel,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
struct RegionJson {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl From<Region> for RegionJson {
    fn from(value: Region) -> Self {
        Self {
            left: value.left,
            top: value.top,
            width: value.width,
            height: value.height,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct OptionsJson {
    confidence: f64,
    search_multiple_scales: bool,
    method: MethodConfig,
    scale_steps: Vec<f64>,
    rotation: Option<RotationJson>,
    roi: Option<RegionJson>,
    debug: bool,
    density_correction: DensityCorrectionConfig,
}

impl Default for OptionsJson {
    fn default() -> Self {
        let cfg = MatchOptions::default();
        Self {
            confidence: cfg.confidence,
            search_multiple_scales: cfg.search_multiple_scales,
            method: MethodConfig::CcoeffNormed,
            scale_steps: cfg.scale_steps,
            rotation: None,
            roi: None,
            debug: cfg.debug,
            density_correction: DensityCorrectionConfig::UniformOnly,
        }
    }
}

impl From<OptionsJson> for MatchOptions {
    fn from(value: OptionsJson) -> Self {
        Self {
            confidence: value.confidence,
            search_multiple_scales: value.search_multiple_scales,
            method: value.method.into(),
            scale_steps: value.scale_steps,
            rotation: value.rotation.map(Into::into),
            roi: value
                .roi
                .map(|r| Region::new(r.left, r.top, r.width, r.height)),
            debug: value.debug,
            density_correction: value.density_correction.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DensityJson {
    scale_x: f64,
    scale_y: f64,
}

impl Default for DensityJson {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    haystack_path: String,
    needle_path: String,
    output_path: Option<String>,
    debug_image_path: Option<String>,
    mode: Mode,
    density: DensityJson,
    options: OptionsJson,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    confidence: f64,
    location: RegionJson,
}

impl From<&MatchResult> for MatchRecord {
    fn from(value: &MatchResult) -> Self {
        Self {
            confidence: value.confidence,
            location: value.location.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RotatedRecord {
    score: f64,
    angle_deg: f64,
    center: [f64; 2],
    corners: [[f64; 2]; 4],
}

impl From<&RotatedMatch> for RotatedRecord {
    fn from(value: &RotatedMatch) -> Self {
        Self {
            score: value.score,
            angle_deg: value.angle_deg,
            center: [value.center.x, value.center.y],
            corners: value.corners().map(|p| [p.x, p.y]),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Output {
    Axis { matches: Vec<MatchRecord> },
    Rotated { matches: Vec<RotatedRecord> },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("needlefind=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.haystack_path.is_empty() || config.needle_path.is_empty() {
        return Err("haystack_path and needle_path must be set in the config".into());
    }

    let source = FileSource::new();
    let haystack = source
        .load(&config.haystack_path)?
        .with_density(PixelDensity {
            scale_x: config.density.scale_x,
            scale_y: config.density.scale_y,
        });
    let needle = source.load(&config.needle_path)?;
    let finder = Finder::new(config.options.into());
    let overrides = MatchOverrides::default();
    tracing::debug!(mode = ?config.mode, "searching");

    let (output, overlay) = match config.mode {
        Mode::Best | Mode::All => {
            let matches = match config.mode {
                Mode::Best => vec![finder.find_match_with(&haystack, &needle, &overrides)?],
                _ => finder.find_matches_with(&haystack, &needle, &overrides)?,
            };
            let overlay = match &config.debug_image_path {
                Some(_) => Some(render_matches(&haystack, &matches)?),
                None => None,
            };
            let records = matches.iter().map(MatchRecord::from).collect();
            (Output::Axis { matches: records }, overlay)
        }
        Mode::Rotated => {
            let matches = finder.find_rotated_matches(&haystack, &needle, &overrides)?;
            let overlay = match &config.debug_image_path {
                Some(_) => Some(render_rotated_matches(&haystack, &matches)?),
                None => None,
            };
            let records = matches.iter().map(RotatedRecord::from).collect();
            (Output::Rotated { matches: records }, overlay)
        }
    };

    if let (Some(path), Some(img)) = (&config.debug_image_path, overlay) {
        img.save(path)?;
    }

    let json = serde_json::to_string_pretty(&output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
