use anyhow::{Context, Result};
use clap::Parser;
use lumatrace::params::{
    FillStrategy, ParamsUpdate, PosterizeUpdate, RangeDistribution, Steps, Threshold, TurnPolicy,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "lumatrace")]
#[command(about = "Trace a bitmap into SVG outlines, optionally posterized into tonal layers")]
#[command(version)]
pub struct Cli {
    /// Input image file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output SVG file (default: input path with .svg extension)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file with options; flags given here take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stack several thresholds with partial opacity
    #[arg(short, long)]
    pub posterize: bool,

    /// Layer count, comma separated thresholds, or "auto"
    #[arg(long)]
    pub steps: Option<Steps>,

    /// Binarization threshold 0-255, or "auto"
    #[arg(short, long)]
    pub threshold: Option<Threshold>,

    /// black, white, left, right, minority or majority
    #[arg(long)]
    pub turn_policy: Option<TurnPolicy>,

    /// Drop shapes enclosing this many pixels or fewer (default: 2)
    #[arg(long)]
    pub turd_size: Option<u32>,

    /// Corner threshold (default: 1.0)
    #[arg(long)]
    pub alpha_max: Option<f64>,

    /// Curve optimization tolerance (default: 0.2)
    #[arg(long)]
    pub opt_tolerance: Option<f64>,

    /// Keep every fitted segment instead of merging them
    #[arg(long)]
    pub no_opt_curve: bool,

    /// Trace light shapes on a dark background
    #[arg(long)]
    pub white_on_black: bool,

    /// Fill color (default: auto)
    #[arg(long)]
    pub color: Option<String>,

    /// Background color (default: transparent)
    #[arg(long)]
    pub background: Option<String>,

    /// spread, dominant, median or mean
    #[arg(long)]
    pub fill_strategy: Option<FillStrategy>,

    /// auto or equal
    #[arg(long)]
    pub range_distribution: Option<RangeDistribution>,

    /// Output width in pixels (default: image width)
    #[arg(long)]
    pub width: Option<f64>,

    /// Output height in pixels (default: image height)
    #[arg(long)]
    pub height: Option<f64>,
}

/// Options read from `--config`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub posterize: bool,
    #[serde(flatten)]
    pub trace: ParamsUpdate,
    #[serde(flatten)]
    pub layers: PosterizeUpdate,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let mut path = self.input.clone();
            path.set_extension("svg");
            path
        })
    }

    /// Tracing options from the config file with flags applied on top.
    pub fn trace_update(&self, base: ParamsUpdate) -> ParamsUpdate {
        ParamsUpdate {
            turn_policy: self.turn_policy.or(base.turn_policy),
            turd_size: self.turd_size.or(base.turd_size),
            alpha_max: self.alpha_max.or(base.alpha_max),
            opt_curve: if self.no_opt_curve { Some(false) } else { base.opt_curve },
            opt_tolerance: self.opt_tolerance.or(base.opt_tolerance),
            threshold: self.threshold.or(base.threshold),
            black_on_white: if self.white_on_black { Some(false) } else { base.black_on_white },
            color: self.color.clone().or(base.color),
            background: self.background.clone().or(base.background),
        }
    }

    pub fn posterize_update(&self, base: PosterizeUpdate) -> PosterizeUpdate {
        PosterizeUpdate {
            steps: self.steps.clone().or(base.steps),
            fill_strategy: self.fill_strategy.or(base.fill_strategy),
            range_distribution: self.range_distribution.or(base.range_distribution),
        }
    }
}
