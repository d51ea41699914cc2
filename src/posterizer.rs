//! Multi-threshold tracing: splits the luminance range into color stops,
//! traces one layer per stop and assigns each layer an opacity so that the
//! stacked layers approximate the original tones.

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::histogram::Histogram;
use crate::image_processor::ImageData;
use crate::outline::round_to_thousandths;
use crate::params::{
    FillStrategy, ParamsUpdate, PosterizeParams, PosterizeUpdate, RangeDistribution, Steps, Threshold, TraceParams,
};
use crate::path::Path;
use crate::potrace::{trace_bitmap, LoadTicket, Potrace, FALLBACK_THRESHOLD};
use rayon::prelude::*;
use tracing::debug;

/// Extra stops are only considered once this many stops exist.
const EXTRA_STOP_MIN_RANGES: usize = 10;
/// Darkest range width (in levels) above which an extra stop is added.
const EXTRA_STOP_SPAN: f64 = 25.0;

/// A threshold and the intensity of the layer traced at it; intensity is
/// 0 for the background tone and 1 for full black (or white when tracing
/// white on black).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub value: f64,
    pub intensity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PosterizedLayer {
    pub threshold: f64,
    pub opacity: f64,
    pub paths: Vec<Path>,
}

impl PosterizedLayer {
    pub fn fill_opacity(&self) -> String {
        format!("{:.3}", self.opacity)
    }
}

#[derive(Debug, Default)]
pub struct Posterizer {
    potrace: Potrace,
    posterize: PosterizeParams,
}

impl Posterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(trace: TraceParams, posterize: PosterizeParams) -> Result<Self> {
        posterize.steps.validate()?;
        Ok(Self {
            potrace: Potrace::with_params(trace),
            posterize,
        })
    }

    pub fn params(&self) -> &TraceParams {
        self.potrace.params()
    }

    pub fn posterize_params(&self) -> &PosterizeParams {
        &self.posterize
    }

    pub fn set_parameters(&mut self, update: &ParamsUpdate) -> Result<()> {
        self.potrace.set_parameters(update)
    }

    pub fn set_posterize_parameters(&mut self, update: &PosterizeUpdate) -> Result<()> {
        update.validate()?;
        self.posterize.apply(update);
        Ok(())
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.potrace.begin_load()
    }

    pub fn finish_load(&mut self, ticket: LoadTicket, image: &ImageData) -> Result<()> {
        self.potrace.finish_load(ticket, image)
    }

    pub fn load_image_data(&mut self, image: &ImageData) -> Result<()> {
        self.potrace.load_image_data(image)
    }

    pub fn load_bitmap(&mut self, bitmap: Bitmap) -> Result<()> {
        self.potrace.load_bitmap(bitmap)
    }

    pub fn load_image(&mut self, path: &std::path::Path) -> anyhow::Result<()> {
        self.potrace.load_image(path)
    }

    pub fn bitmap(&self) -> Result<&Bitmap> {
        self.potrace.bitmap()
    }

    /// Primary threshold: the configured level, or the upper (black on
    /// white) or lower of two automatic cut points.
    pub fn threshold(&self) -> Result<f64> {
        let black_on_white = self.params().black_on_white;
        match self.params().threshold {
            Threshold::Level(level) => Ok(f64::from(level)),
            Threshold::Auto => {
                let stops = self.bitmap()?.histogram().multilevel_thresholding(2, 0, 255)?;
                let picked = if black_on_white { stops.get(1) } else { stops.first() };
                let level = picked.copied().filter(|&level| level != 0).unwrap_or(FALLBACK_THRESHOLD);
                Ok(f64::from(level))
            }
        }
    }

    /// Number of layers to aim for, never more than the levels between the
    /// threshold and the background extreme.
    pub fn step_count(&self) -> Result<usize> {
        let threshold = self.threshold()?;
        Ok(self.step_count_for(threshold))
    }

    fn step_count_for(&self, threshold: f64) -> usize {
        let colors = self.colors_to_threshold(threshold) as usize;
        match &self.posterize.steps {
            Steps::Auto if self.params().threshold == Threshold::Auto => 4,
            Steps::Auto if colors > 200 => 4,
            Steps::Auto => 3,
            Steps::Count(count) => colors.min((*count as usize).max(2)),
            Steps::Thresholds(list) => list.len(),
        }
    }

    fn colors_to_threshold(&self, threshold: f64) -> f64 {
        if self.params().black_on_white {
            threshold
        } else {
            255.0 - threshold
        }
    }

    /// Color stops ordered from the background tone toward full intensity.
    pub fn ranges(&self) -> Result<Vec<ColorStop>> {
        let threshold = self.threshold()?;
        let values = match &self.posterize.steps {
            Steps::Thresholds(list) => self.explicit_stops(list, threshold),
            _ => match self.posterize.range_distribution {
                RangeDistribution::Auto => self.auto_stops(threshold)?,
                RangeDistribution::Equal => self.equal_stops(threshold),
            },
        };
        self.color_intensities(&values, threshold)
    }

    fn explicit_stops(&self, list: &[i32], threshold: f64) -> Vec<f64> {
        let black_on_white = self.params().black_on_white;
        let mut stops: Vec<f64> = Vec::with_capacity(list.len() + 1);
        for &value in list {
            let value = f64::from(value);
            if (0.0..=255.0).contains(&value) && !stops.contains(&value) {
                stops.push(value);
            }
        }
        if stops.is_empty() {
            stops.push(threshold);
        }

        if black_on_white {
            stops.sort_by(|a, b| b.total_cmp(a));
            if stops[0] < threshold {
                stops.insert(0, threshold);
            }
        } else {
            stops.sort_by(f64::total_cmp);
            if stops[stops.len() - 1] < threshold {
                stops.push(threshold);
            }
        }
        stops
    }

    fn auto_stops(&self, threshold: f64) -> Result<Vec<f64>> {
        let histogram = self.bitmap()?.histogram();
        let black_on_white = self.params().black_on_white;
        let steps = self.step_count_for(threshold);

        let mut stops: Vec<f64> = if self.params().threshold == Threshold::Auto {
            to_levels(histogram.multilevel_thresholding(steps, 0, 255)?)
        } else if black_on_white {
            let mut stops = to_levels(histogram.multilevel_thresholding(steps.saturating_sub(1), 0, threshold)?);
            stops.push(threshold);
            stops
        } else {
            let mut stops = to_levels(histogram.multilevel_thresholding(steps.saturating_sub(1), threshold, 255)?);
            stops.insert(0, threshold);
            stops
        };

        if black_on_white {
            stops.reverse();
        }
        Ok(stops)
    }

    fn equal_stops(&self, threshold: f64) -> Vec<f64> {
        let black_on_white = self.params().black_on_white;
        let colors = self.colors_to_threshold(threshold);
        let steps = self.step_count_for(threshold);
        let step_size = colors / steps as f64;

        (0..steps)
            .rev()
            .map(|i| {
                let stop = colors.min((i + 1) as f64 * step_size);
                if black_on_white { stop } else { 255.0 - stop }
            })
            .collect()
    }

    fn color_intensities(&self, stops: &[f64], threshold: f64) -> Result<Vec<ColorStop>> {
        let black_on_white = self.params().black_on_white;
        let strategy = self.posterize.fill_strategy;
        let histogram = self.bitmap()?.histogram();
        let full_range = (threshold - if black_on_white { 0.0 } else { 255.0 }).abs();
        let count = stops.len();

        let mut result = Vec::with_capacity(count);
        for (index, &value) in stops.iter().enumerate() {
            let next = match stops.get(index + 1) {
                Some(&next) => next,
                None if black_on_white => -1.0,
                None => 256.0,
            };
            let range_start = js_round(if black_on_white { next + 1.0 } else { value });
            let range_end = js_round(if black_on_white { value } else { next - 1.0 });
            let factor = if count > 1 { index as f64 / (count - 1) as f64 } else { 0.0 };
            let interval = range_end - range_start;

            let stats = match strategy {
                FillStrategy::Spread => None,
                _ => Some(histogram.stats(range_start, range_end, false)?),
            };
            if stats.is_some_and(|stats| stats.pixels == 0) {
                result.push(ColorStop { value, intensity: 0.0 });
                continue;
            }

            let mut color = match strategy {
                FillStrategy::Spread => {
                    let (origin, direction) = if black_on_white { (range_start, 1.0) } else { (range_end, -1.0) };
                    origin + direction * interval * (full_range / 255.0).max(0.5) * factor
                }
                FillStrategy::Dominant => dominant_level(histogram, range_start, range_end, interval)?,
                FillStrategy::Mean => stats.map_or(f64::NAN, |stats| stats.levels.mean),
                FillStrategy::Median => stats.map_or(f64::NAN, |stats| stats.levels.median),
            };

            // keep neighbouring layers apart
            if index != 0 {
                let margin = js_round(interval * 0.1);
                color = if black_on_white {
                    clamp(color, range_start, range_end - margin)
                } else {
                    clamp(color, range_start + margin, range_end)
                };
            }

            let intensity = if color == -1.0 {
                0.0
            } else {
                (if black_on_white { 255.0 - color } else { color }) / 255.0
            };
            result.push(ColorStop { value, intensity });
        }
        Ok(result)
    }

    /// Appends a stop for the darkest pixels when the most intense range is
    /// wide and not yet fully saturated.
    fn add_extra_color_stop(&self, ranges: &mut Vec<ColorStop>) -> Result<()> {
        let Some(last) = ranges.last().copied() else {
            return Ok(());
        };
        let black_on_white = self.params().black_on_white;
        let histogram = self.bitmap()?.histogram();
        let (from, to) = if black_on_white { (0.0, last.value) } else { (last.value, 255.0) };

        if to - from <= EXTRA_STOP_SPAN || last.intensity == 1.0 {
            return Ok(());
        }

        let levels = histogram.stats(from, to, false)?.levels;
        let stop = if levels.mean + levels.std_dev <= EXTRA_STOP_SPAN {
            levels.mean + levels.std_dev
        } else if levels.mean - levels.std_dev <= EXTRA_STOP_SPAN {
            levels.mean - levels.std_dev
        } else {
            EXTRA_STOP_SPAN
        };

        let stats = if black_on_white {
            histogram.stats(0.0, stop, false)?
        } else {
            histogram.stats(stop, 255.0, false)?
        };
        let color = stats.levels.mean;

        ranges.push(ColorStop {
            value: ((if black_on_white { 0.0 } else { 255.0 }) - stop).abs(),
            intensity: if color.is_nan() {
                0.0
            } else {
                (if black_on_white { 255.0 - color } else { color }) / 255.0
            },
        });
        Ok(())
    }

    /// Traces every visible layer, in parallel, from lightest to most
    /// intense.
    pub fn layers(&self) -> Result<Vec<PosterizedLayer>> {
        let bitmap = self.bitmap()?;
        let params = self.params();

        let mut ranges = self.ranges()?;
        if ranges.len() >= EXTRA_STOP_MIN_RANGES {
            self.add_extra_color_stop(&mut ranges)?;
        }

        let intensities: Vec<f64> = ranges.iter().map(|stop| stop.intensity).collect();
        let planned: Vec<(f64, f64)> = ranges
            .iter()
            .zip(layer_opacities(&intensities))
            .filter(|(_, opacity)| *opacity > 0.0)
            .map(|(stop, opacity)| (stop.value, opacity))
            .collect();

        let traced: Vec<PosterizedLayer> = planned
            .into_par_iter()
            .map(|(threshold, opacity)| PosterizedLayer {
                threshold,
                opacity,
                paths: trace_bitmap(bitmap, params, threshold),
            })
            .collect();

        let layers: Vec<PosterizedLayer> = traced.into_iter().filter(|layer| !layer.paths.is_empty()).collect();
        debug!(stops = ranges.len(), layers = layers.len(), "posterized");
        Ok(layers)
    }
}

/// Opacity per stop such that painting the layers in order over the
/// background reaches each stop's intensity. Zero-intensity stops get 0.
pub fn layer_opacities(intensities: &[f64]) -> Vec<f64> {
    let mut reached = 0.0;
    intensities
        .iter()
        .map(|&intensity| {
            if intensity == 0.0 {
                return 0.0;
            }
            let opacity = if reached == 0.0 || intensity == 1.0 {
                intensity
            } else {
                (reached - intensity) / (reached - 1.0)
            };
            let opacity = clamp(round_to_thousandths(opacity), 0.0, 1.0);
            reached += (1.0 - reached) * opacity;
            opacity
        })
        .collect()
}

fn dominant_level(histogram: &Histogram, start: f64, end: f64, interval: f64) -> Result<f64> {
    let tolerance = (interval as i32).clamp(1, 5);
    Ok(f64::from(histogram.dominant_color(start, end, tolerance)?))
}

fn to_levels(levels: Vec<u8>) -> Vec<f64> {
    levels.into_iter().map(f64::from).collect()
}

/// Rounds halves toward positive infinity.
fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    include!("posterizer_tests.rs");
}
