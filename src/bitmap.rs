//! Luminance and binary rasters, and contour extraction over the latter.

use crate::error::{Result, TraceError};
use crate::geometry::Point;
use crate::histogram::Histogram;
use crate::image_processor::ImageData;
use crate::params::TurnPolicy;
use crate::path::{Path, Sign};
use rgb::RGBA8;
use std::sync::OnceLock;

/// Luminance of a pixel after blending it over white by its alpha.
pub fn luminance(pixel: RGBA8) -> u8 {
    let opacity = f64::from(pixel.a) / 255.0;
    let blend = |channel: u8| 255.0 + (f64::from(channel) - 255.0) * opacity;
    let (r, g, b) = (blend(pixel.r), blend(pixel.g), blend(pixel.b));
    (0.2126 * r + 0.7153 * g + 0.0721 * b).round() as u8
}

/// Grayscale raster, one luminance byte per pixel, row-major.
#[derive(Debug)]
pub struct Bitmap {
    width: usize,
    height: usize,
    data: Vec<u8>,
    histogram: OnceLock<Histogram>,
}

impl Bitmap {
    pub fn from_luminance(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(TraceError::DimensionMismatch {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            data,
            histogram: OnceLock::new(),
        })
    }

    pub fn from_image_data(image: &ImageData) -> Result<Self> {
        let (width, height) = (image.width as usize, image.height as usize);
        if image.pixels.len() != width * height {
            return Err(TraceError::DimensionMismatch {
                len: image.pixels.len(),
                width,
                height,
            });
        }
        let data = image.pixels.iter().copied().map(luminance).collect();
        Self::from_luminance(width, height, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn value_at(&self, x: i64, y: i64) -> Option<u8> {
        point_to_index(self.width, self.height, x, y).map(|index| self.data[index])
    }

    /// Histogram of the luminance values, built on first use.
    pub fn histogram(&self) -> &Histogram {
        self.histogram.get_or_init(|| Histogram::from_levels(&self.data))
    }

    /// Foreground is darker than `threshold` when tracing black on white,
    /// lighter than it otherwise.
    pub fn binarize(&self, threshold: f64, black_on_white: bool) -> BinaryBitmap {
        let data = self
            .data
            .iter()
            .map(|&lum| {
                let lum = f64::from(lum);
                let foreground = if black_on_white { lum < threshold } else { lum > threshold };
                u8::from(foreground)
            })
            .collect();
        BinaryBitmap {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

fn point_to_index(width: usize, height: usize, x: i64, y: i64) -> Option<usize> {
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        return None;
    }
    Some(width * y as usize + x as usize)
}

/// Foreground (1) / background (0) raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryBitmap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BinaryBitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Foreground test; everything outside the raster is background.
    pub fn at(&self, x: i64, y: i64) -> bool {
        point_to_index(self.width, self.height, x, y).is_some_and(|index| self.data[index] == 1)
    }

    pub fn set(&mut self, x: i64, y: i64, foreground: bool) {
        if let Some(index) = point_to_index(self.width, self.height, x, y) {
            self.data[index] = u8::from(foreground);
        }
    }

    fn flip(&mut self, x: i64, y: i64) {
        if let Some(index) = point_to_index(self.width, self.height, x, y) {
            self.data[index] ^= 1;
        }
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|&&value| value == 1).count()
    }

    /// Extracts every closed contour, outer boundaries and holes alike,
    /// dropping those enclosing `turd_size` pixels or fewer.
    pub fn trace_contours(&self, turn_policy: TurnPolicy, turd_size: u32) -> Vec<Path> {
        let mut tracer = ContourTracer {
            original: self,
            work: self.clone(),
            turn_policy,
        };

        let mut paths = Vec::new();
        let mut cursor = 0;
        while let Some(start) = tracer.find_next(cursor) {
            let path = tracer.find_path(start);
            tracer.xor_path(&path);
            if path.area.unsigned_abs() > u64::from(turd_size) {
                paths.push(path);
            }
            cursor = start;
        }
        paths
    }
}

/// Walks pixel-edge boundaries on a scratch copy that gets xor-cleared
/// after each contour.
struct ContourTracer<'a> {
    original: &'a BinaryBitmap,
    work: BinaryBitmap,
    turn_policy: TurnPolicy,
}

impl ContourTracer<'_> {
    fn find_next(&self, from: usize) -> Option<usize> {
        (from..self.work.data.len()).find(|&index| self.work.data[index] == 1)
    }

    fn find_path(&self, start: usize) -> Path {
        let width = self.work.width;
        let (x0, y0) = ((start % width) as i64, (start / width) as i64);
        let sign = if self.original.at(x0, y0) {
            Sign::Positive
        } else {
            Sign::Negative
        };

        let (mut x, mut y) = (x0, y0);
        let (mut dirx, mut diry) = (0i64, 1i64);
        let mut points = Vec::new();
        let mut area = 0i64;
        let (mut min_x, mut min_y) = (i64::MAX, i64::MAX);
        let (mut max_x, mut max_y) = (i64::MIN, i64::MIN);

        loop {
            points.push(Point::new(x as f64, y as f64));
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            x += dirx;
            y += diry;
            area -= x * diry;

            if x == x0 && y == y0 {
                break;
            }

            let left = self.work.at(x + (dirx + diry - 1) / 2, y + (diry - dirx - 1) / 2);
            let right = self.work.at(x + (dirx - diry - 1) / 2, y + (diry + dirx - 1) / 2);

            if right && !left {
                if self.turns_right(sign, x, y) {
                    (dirx, diry) = (-diry, dirx);
                } else {
                    (dirx, diry) = (diry, -dirx);
                }
            } else if right {
                (dirx, diry) = (-diry, dirx);
            } else if !left {
                (dirx, diry) = (diry, -dirx);
            }
        }

        Path::new(points, area, sign, (min_x, min_y, max_x, max_y))
    }

    fn turns_right(&self, sign: Sign, x: i64, y: i64) -> bool {
        match self.turn_policy {
            TurnPolicy::Right => true,
            TurnPolicy::Left => false,
            TurnPolicy::Black => sign == Sign::Positive,
            TurnPolicy::White => sign == Sign::Negative,
            TurnPolicy::Majority => self.majority(x, y),
            TurnPolicy::Minority => !self.majority(x, y),
        }
    }

    /// Foreground majority in growing square rings around a corner point;
    /// undecided after three rings counts as background.
    fn majority(&self, x: i64, y: i64) -> bool {
        for i in 2..5 {
            let mut ct = 0;
            for a in (-i + 1)..=(i - 1) {
                ct += if self.work.at(x + a, y + i - 1) { 1 } else { -1 };
                ct += if self.work.at(x + i - 1, y + a - 1) { 1 } else { -1 };
                ct += if self.work.at(x + a - 1, y - i) { 1 } else { -1 };
                ct += if self.work.at(x - i, y + a) { 1 } else { -1 };
            }
            if ct > 0 {
                return true;
            } else if ct < 0 {
                return false;
            }
        }
        false
    }

    /// Inverts every pixel enclosed by the contour, row by row.
    fn xor_path(&mut self, path: &Path) {
        let Some(first) = path.points.first() else {
            return;
        };
        let mut y1 = first.y as i64;
        for point in &path.points[1..] {
            let (x, y) = (point.x as i64, point.y as i64);
            if y != y1 {
                let min_y = y1.min(y);
                for j in x..path.max_x {
                    self.work.flip(j, min_y);
                }
                y1 = y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    include!("bitmap_tests.rs");
}
