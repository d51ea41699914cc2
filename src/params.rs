//! Tracing and posterization options.
//!
//! Every option enum parses from the same keywords the command line and the
//! JSON config file use (`"auto"`, `"minority"`, `"dominant"`, ...).

use crate::error::{Result, TraceError};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Fill color keyword resolved to black or white depending on polarity.
pub const COLOR_AUTO: &str = "auto";
/// Background keyword meaning "no background rectangle".
pub const COLOR_TRANSPARENT: &str = "transparent";

/// Tie-breaking rule for ambiguous diagonal turns while following a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPolicy {
    Black,
    White,
    Left,
    Right,
    #[default]
    Minority,
    Majority,
}

impl TurnPolicy {
    pub const ALL: [TurnPolicy; 6] = [
        TurnPolicy::Black,
        TurnPolicy::White,
        TurnPolicy::Left,
        TurnPolicy::Right,
        TurnPolicy::Minority,
        TurnPolicy::Majority,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TurnPolicy::Black => "black",
            TurnPolicy::White => "white",
            TurnPolicy::Left => "left",
            TurnPolicy::Right => "right",
            TurnPolicy::Minority => "minority",
            TurnPolicy::Majority => "majority",
        }
    }
}

impl fmt::Display for TurnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TurnPolicy {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        TurnPolicy::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| TraceError::invalid_parameter(format!("bad turn policy value \"{s}\"")))
    }
}

/// Binarization cut point: automatic (Otsu) or a fixed luminance level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "LevelRepr")]
pub enum Threshold {
    #[default]
    Auto,
    Level(u8),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Number(i64),
    Keyword(String),
}

impl TryFrom<i64> for Threshold {
    type Error = TraceError;

    fn try_from(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map(Threshold::Level)
            .map_err(|_| TraceError::invalid_parameter(format!("bad threshold value {value}, expected 0..255")))
    }
}

impl TryFrom<LevelRepr> for Threshold {
    type Error = TraceError;

    fn try_from(repr: LevelRepr) -> Result<Self> {
        match repr {
            LevelRepr::Number(value) => Threshold::try_from(value),
            LevelRepr::Keyword(keyword) => keyword.parse(),
        }
    }
}

impl FromStr for Threshold {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "auto" {
            return Ok(Threshold::Auto);
        }
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| TraceError::invalid_parameter(format!("bad threshold value \"{s}\"")))?;
        Threshold::try_from(value)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Auto => f.write_str("auto"),
            Threshold::Level(level) => write!(f, "{level}"),
        }
    }
}

/// Number of posterization layers, or the explicit thresholds to use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "StepsRepr")]
pub enum Steps {
    #[default]
    Auto,
    Count(u32),
    /// Explicit cut points; duplicates and values outside 0..=255 are ignored.
    Thresholds(Vec<i32>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StepsRepr {
    Count(i64),
    Thresholds(Vec<i32>),
    Keyword(String),
}

impl Steps {
    pub fn validate(&self) -> Result<()> {
        match self {
            Steps::Count(count) if !(1..=255).contains(count) => Err(TraceError::invalid_parameter(
                format!("bad steps value {count}, expected 1..255"),
            )),
            _ => Ok(()),
        }
    }
}

impl TryFrom<StepsRepr> for Steps {
    type Error = TraceError;

    fn try_from(repr: StepsRepr) -> Result<Self> {
        let steps = match repr {
            StepsRepr::Count(count) => Steps::Count(
                u32::try_from(count).map_err(|_| TraceError::invalid_parameter(format!("bad steps value {count}")))?,
            ),
            StepsRepr::Thresholds(list) => Steps::Thresholds(list),
            StepsRepr::Keyword(keyword) => keyword.parse()?,
        };
        steps.validate()?;
        Ok(steps)
    }
}

impl FromStr for Steps {
    type Err = TraceError;

    /// Accepts `auto`, a layer count (`4`) or a comma separated list of
    /// thresholds (`40,120,200`).
    fn from_str(s: &str) -> Result<Self> {
        let bad = || TraceError::invalid_parameter(format!("bad steps value \"{s}\""));
        let steps = if s == "auto" {
            Steps::Auto
        } else if s.contains(',') {
            let list = s
                .split(',')
                .filter(|item| !item.trim().is_empty())
                .map(|item| item.trim().parse::<i32>().map_err(|_| bad()))
                .collect::<Result<Vec<_>>>()?;
            Steps::Thresholds(list)
        } else {
            Steps::Count(s.trim().parse().map_err(|_| bad())?)
        };
        steps.validate()?;
        Ok(steps)
    }
}

/// How a posterization layer picks its representative color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    Spread,
    #[default]
    Dominant,
    Median,
    Mean,
}

impl FromStr for FillStrategy {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "spread" => Ok(FillStrategy::Spread),
            "dominant" => Ok(FillStrategy::Dominant),
            "median" => Ok(FillStrategy::Median),
            "mean" => Ok(FillStrategy::Mean),
            other => Err(TraceError::invalid_parameter(format!("bad fill strategy \"{other}\""))),
        }
    }
}

/// How posterization thresholds are spread across the luminance range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeDistribution {
    #[default]
    Auto,
    Equal,
}

impl FromStr for RangeDistribution {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(RangeDistribution::Auto),
            "equal" => Ok(RangeDistribution::Equal),
            other => Err(TraceError::invalid_parameter(format!("bad range distribution \"{other}\""))),
        }
    }
}

/// Parameters of a single tracing pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TraceParams {
    /// Rule for ambiguous turns (default: minority)
    pub turn_policy: TurnPolicy,
    /// Contours enclosing this many pixels or fewer are dropped (default: 2)
    pub turd_size: u32,
    /// Corner threshold; larger values give smoother output (default: 1.0)
    pub alpha_max: f64,
    /// Merge adjacent Bezier segments when possible (default: true)
    pub opt_curve: bool,
    /// Maximum deviation allowed when merging segments (default: 0.2)
    pub opt_tolerance: f64,
    pub threshold: Threshold,
    /// Trace dark shapes on a light background (default: true)
    pub black_on_white: bool,
    /// Fill color, or `auto` (default: auto)
    pub color: String,
    /// Background color, or `transparent` (default: transparent)
    pub background: String,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            turn_policy: TurnPolicy::Minority,
            turd_size: 2,
            alpha_max: 1.0,
            opt_curve: true,
            opt_tolerance: 0.2,
            threshold: Threshold::Auto,
            black_on_white: true,
            color: COLOR_AUTO.to_string(),
            background: COLOR_TRANSPARENT.to_string(),
        }
    }
}

impl TraceParams {
    /// Fill color with `auto` resolved against the polarity.
    pub fn fill_color(&self) -> &str {
        match self.color.as_str() {
            COLOR_AUTO if self.black_on_white => "black",
            COLOR_AUTO => "white",
            color => color,
        }
    }

    pub fn apply(&mut self, update: &ParamsUpdate) {
        if let Some(turn_policy) = update.turn_policy {
            self.turn_policy = turn_policy;
        }
        if let Some(turd_size) = update.turd_size {
            self.turd_size = turd_size;
        }
        if let Some(alpha_max) = update.alpha_max {
            self.alpha_max = alpha_max;
        }
        if let Some(opt_curve) = update.opt_curve {
            self.opt_curve = opt_curve;
        }
        if let Some(opt_tolerance) = update.opt_tolerance {
            self.opt_tolerance = opt_tolerance;
        }
        if let Some(threshold) = update.threshold {
            self.threshold = threshold;
        }
        if let Some(black_on_white) = update.black_on_white {
            self.black_on_white = black_on_white;
        }
        if let Some(color) = &update.color {
            self.color.clone_from(color);
        }
        if let Some(background) = &update.background {
            self.background.clone_from(background);
        }
    }
}

/// Partial update of [`TraceParams`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParamsUpdate {
    pub turn_policy: Option<TurnPolicy>,
    pub turd_size: Option<u32>,
    pub alpha_max: Option<f64>,
    pub opt_curve: Option<bool>,
    pub opt_tolerance: Option<f64>,
    pub threshold: Option<Threshold>,
    pub black_on_white: Option<bool>,
    pub color: Option<String>,
    pub background: Option<String>,
}

impl ParamsUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(alpha_max) = self.alpha_max {
            if !alpha_max.is_finite() || alpha_max < 0.0 {
                return Err(TraceError::invalid_parameter(format!("bad alpha_max value {alpha_max}")));
            }
        }
        if let Some(opt_tolerance) = self.opt_tolerance {
            if !opt_tolerance.is_finite() || opt_tolerance < 0.0 {
                return Err(TraceError::invalid_parameter(format!(
                    "bad opt_tolerance value {opt_tolerance}"
                )));
            }
        }
        Ok(())
    }

    /// Whether applying this update changes the traced geometry.
    /// Color and background are cosmetic.
    pub fn affects_geometry(&self) -> bool {
        self.turn_policy.is_some()
            || self.turd_size.is_some()
            || self.alpha_max.is_some()
            || self.opt_curve.is_some()
            || self.opt_tolerance.is_some()
            || self.threshold.is_some()
            || self.black_on_white.is_some()
    }
}

/// Posterization-only parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PosterizeParams {
    pub steps: Steps,
    pub fill_strategy: FillStrategy,
    pub range_distribution: RangeDistribution,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PosterizeUpdate {
    pub steps: Option<Steps>,
    pub fill_strategy: Option<FillStrategy>,
    pub range_distribution: Option<RangeDistribution>,
}

impl PosterizeUpdate {
    pub fn validate(&self) -> Result<()> {
        match &self.steps {
            Some(steps) => steps.validate(),
            None => Ok(()),
        }
    }
}

impl PosterizeParams {
    pub fn apply(&mut self, update: &PosterizeUpdate) {
        if let Some(steps) = &update.steps {
            self.steps = steps.clone();
        }
        if let Some(fill_strategy) = update.fill_strategy {
            self.fill_strategy = fill_strategy;
        }
        if let Some(range_distribution) = update.range_distribution {
            self.range_distribution = range_distribution;
        }
    }
}
