//! 256-bin luminance histogram with Otsu-style multilevel thresholding.

use crate::error::{Result, TraceError};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{debug, warn};

const COLOR_DEPTH: usize = 256;
const COLOR_RANGE_END: usize = COLOR_DEPTH - 1;

/// Position of the `(column, row)` cell in the flattened lookup tables.
/// `index(c, r) + 1 == index(c, r + 1)`, which the first-row pass relies on.
fn index(column: usize, row: usize) -> usize {
    COLOR_DEPTH * column + row
}

/// Rounds and clamps a level range, rejecting `min > max`.
fn normalize_range(level_min: f64, level_max: f64) -> Result<(usize, usize)> {
    let clamp = |level: f64| {
        if level.is_nan() {
            0.0
        } else {
            level.round().clamp(0.0, COLOR_RANGE_END as f64)
        }
    };
    let (min, max) = (clamp(level_min), clamp(level_max));
    if min > max {
        return Err(TraceError::InvalidRange {
            min: level_min,
            max: level_max,
        });
    }
    Ok((min as usize, max as usize))
}

/// Pixel-value statistics for a level range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStats {
    pub mean: f64,
    /// Walks levels ordered by pixel count, not by level.
    pub median: f64,
    pub std_dev: f64,
    /// Levels with at least one pixel.
    pub unique: u32,
}

/// Bar-height statistics for a level range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelsPerLevel {
    pub mean: f64,
    /// `pixels / unique`; `NaN` for a range without pixels.
    pub median: f64,
    pub peak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub levels: LevelStats,
    pub pixels_per_level: PixelsPerLevel,
    pub pixels: u32,
}

#[derive(Debug)]
pub struct Histogram {
    data: [u32; COLOR_DEPTH],
    pixels: u32,
    sorted_levels: OnceLock<Vec<usize>>,
    lookup: OnceLock<Vec<f64>>,
    stats_cache: Mutex<HashMap<(usize, usize), Stats>>,
}

impl Histogram {
    pub fn from_levels(levels: &[u8]) -> Self {
        let mut data = [0u32; COLOR_DEPTH];
        for &level in levels {
            data[usize::from(level)] += 1;
        }
        Self {
            data,
            pixels: levels.len() as u32,
            sorted_levels: OnceLock::new(),
            lookup: OnceLock::new(),
            stats_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Pixel count per luminance level.
    pub fn data(&self) -> &[u32; COLOR_DEPTH] {
        &self.data
    }

    pub fn pixels(&self) -> u32 {
        self.pixels
    }

    /// Levels ordered by ascending pixel count; ties keep level order.
    fn sorted_levels(&self) -> &[usize] {
        self.sorted_levels.get_or_init(|| {
            let mut levels: Vec<usize> = (0..COLOR_DEPTH).collect();
            levels.sort_by_key(|&level| self.data[level]);
            levels
        })
    }

    /// Between-class variance table H built from the cumulative
    /// probability table P and first-moment table S.
    fn lookup_table(&self) -> &[f64] {
        self.lookup.get_or_init(|| {
            let size = COLOR_DEPTH * COLOR_DEPTH;
            let total = f64::from(self.pixels);
            let mut p = vec![0.0; size];
            let mut s = vec![0.0; size];
            let mut h = vec![0.0; size];

            for col in 1..COLOR_DEPTH {
                let idx = index(col, col);
                let tmp = f64::from(self.data[col]) / total;
                p[idx] = tmp;
                s[idx] = col as f64 * tmp;
            }

            // row 0 stays zero
            for col in 1..COLOR_DEPTH - 1 {
                let idx = index(1, col);
                let tmp = f64::from(self.data[col + 1]) / total;
                p[idx + 1] = p[idx] + tmp;
                s[idx + 1] = s[idx] + (col + 1) as f64 * tmp;
            }

            for col in 2..COLOR_DEPTH {
                for row in col + 1..COLOR_DEPTH {
                    p[index(col, row)] = p[index(1, row)] - p[index(1, col - 1)];
                    s[index(col, row)] = s[index(1, row)] - s[index(1, col - 1)];
                }
            }

            for col in 1..COLOR_DEPTH {
                for row in col + 1..COLOR_DEPTH {
                    let idx = index(col, row);
                    h[idx] = if p[idx] == 0.0 { 0.0 } else { s[idx] * s[idx] / p[idx] };
                }
            }
            h
        })
    }

    /// Picks up to `amount` cut points strictly inside `(level_min, level_max)`
    /// maximising between-class variance. Variances always come from the
    /// whole-image table, whatever the range.
    pub fn multilevel_thresholding(
        &self,
        amount: usize,
        level_min: impl Into<f64>,
        level_max: impl Into<f64>,
    ) -> Result<Vec<u8>> {
        let (min, max) = normalize_range(level_min.into(), level_max.into())?;
        let amount = amount.min((max - min).saturating_sub(2));
        if amount < 1 {
            return Ok(Vec::new());
        }
        if amount > 4 {
            warn!(amount, "threshold computation for more than 5 levels may take a long time");
        }

        let mut search = CutSearch {
            table: self.lookup_table(),
            amount,
            max,
            best_variance: 0.0,
            indexes: vec![0; amount],
            stops: Vec::new(),
        };
        search.descend(min, 0.0, 0);
        debug!(amount, min, max, stops = ?search.stops, "multilevel thresholding");

        Ok(search.stops.into_iter().map(|stop| stop as u8).collect())
    }

    /// Single Otsu cut point over the full range, if the image has one.
    pub fn auto_threshold(&self) -> Option<u8> {
        self.multilevel_thresholding(1, 0, 255)
            .ok()
            .and_then(|stops| stops.first().copied())
    }

    /// Level in `[level_min, level_max]` whose window of `tolerance`
    /// neighbouring levels holds the most pixels, or `-1` when the range is
    /// empty.
    pub fn dominant_color(
        &self,
        level_min: impl Into<f64>,
        level_max: impl Into<f64>,
        tolerance: i32,
    ) -> Result<i32> {
        let (min, max) = normalize_range(level_min.into(), level_max.into())?;
        let colors = &self.data;

        if min == max {
            return Ok(if colors[min] > 0 { min as i32 } else { -1 });
        }

        let mut dominant_index: i32 = -1;
        let mut dominant_value: i64 = -1;

        for level in min..=max {
            let mut windowed: i64 = 0;
            for offset in -(tolerance / 2)..tolerance {
                let neighbour = level as i64 + i64::from(offset);
                if (0..COLOR_DEPTH as i64).contains(&neighbour) {
                    windowed += i64::from(colors[neighbour as usize]);
                }
            }

            let bigger = windowed > dominant_value;
            let tie_with_brighter_peak = windowed == dominant_value
                && (dominant_index < 0 || colors[level] > colors[dominant_index as usize]);

            if bigger || tie_with_brighter_peak {
                dominant_index = level as i32;
                dominant_value = windowed;
            }
        }

        Ok(if dominant_value <= 0 { -1 } else { dominant_index })
    }

    /// Statistics for `[level_min, level_max]`, cached per normalized range
    /// unless `refresh` is set. Empty ranges yield `NaN` mean, median and
    /// standard deviation.
    pub fn stats(&self, level_min: impl Into<f64>, level_max: impl Into<f64>, refresh: bool) -> Result<Stats> {
        let (min, max) = normalize_range(level_min.into(), level_max.into())?;
        let mut cache = self.stats_cache.lock().unwrap_or_else(PoisonError::into_inner);

        if !refresh {
            if let Some(stats) = cache.get(&(min, max)) {
                return Ok(*stats);
            }
        }

        let stats = self.compute_stats(min, max);
        cache.insert((min, max), stats);
        Ok(stats)
    }

    fn compute_stats(&self, min: usize, max: usize) -> Stats {
        let data = &self.data;
        let mut pixels_total: u32 = 0;
        let mut weighted_sum = 0.0;
        let mut unique: u32 = 0;
        let mut peak: u32 = 0;

        for (level, &count) in data.iter().enumerate().take(max + 1).skip(min) {
            pixels_total += count;
            weighted_sum += f64::from(count) * level as f64;
            if count != 0 {
                unique += 1;
            }
            peak = peak.max(count);
        }

        let total = f64::from(pixels_total);
        let mean = weighted_sum / total;
        let median_position = pixels_total / 2;
        let mut median = f64::NAN;
        let mut iterated: u32 = 0;
        let mut deviations = 0.0;

        if pixels_total > 0 {
            for &level in self.sorted_levels() {
                if level < min || level > max {
                    continue;
                }
                let count = data[level];
                iterated += count;
                deviations += (level as f64 - mean).powi(2) * f64::from(count);
                if median.is_nan() && iterated >= median_position {
                    median = level as f64;
                }
            }
        }

        Stats {
            levels: LevelStats {
                mean,
                median,
                std_dev: (deviations / total).sqrt(),
                unique,
            },
            pixels_per_level: PixelsPerLevel {
                mean: total / (max - min) as f64,
                median: total / f64::from(unique),
                peak,
            },
            pixels: pixels_total,
        }
    }
}

/// Exhaustive search over cut-point combinations.
struct CutSearch<'a> {
    table: &'a [f64],
    amount: usize,
    max: usize,
    best_variance: f64,
    indexes: Vec<usize>,
    stops: Vec<usize>,
}

impl CutSearch<'_> {
    fn descend(&mut self, starting_point: usize, prev_variance: f64, previous_depth: usize) {
        let start = starting_point + 1;
        let depth = previous_depth + 1;
        let end = self.max + previous_depth - self.amount;

        for i in start..end {
            let mut variance = prev_variance + self.table[index(start, i)];
            self.indexes[depth - 1] = i;

            if depth < self.amount {
                self.descend(i, variance, depth);
            } else {
                variance += self.table[index(i + 1, self.max)];
                if self.best_variance < variance {
                    self.best_variance = variance;
                    self.stops.clone_from(&self.indexes);
                }
            }
        }
    }
}
