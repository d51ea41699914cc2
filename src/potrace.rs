//! Single-threshold tracer: binarize, extract contours, fit polygons and
//! curves, and hand the outlines to a renderer.

use crate::bitmap::Bitmap;
use crate::error::{Result, TraceError};
use crate::image_processor::{self, ImageData};
use crate::outline::{self, Scale, TracedPath};
use crate::params::{ParamsUpdate, Threshold, TraceParams};
use crate::path::{Path, Sign};
use anyhow::Context;
use rayon::prelude::*;
use tracing::debug;

/// Cut point used when automatic thresholding finds nothing to split.
pub const FALLBACK_THRESHOLD: u8 = 128;

/// Proof that a load was started; only the most recent ticket can finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Default)]
pub struct Potrace {
    params: TraceParams,
    bitmap: Option<Bitmap>,
    cached_paths: Option<Vec<Path>>,
    generation: u64,
}

impl Potrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: TraceParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn params(&self) -> &TraceParams {
        &self.params
    }

    /// Validates the whole update before applying any of it. Cached paths
    /// survive updates that only touch colors.
    pub fn set_parameters(&mut self, update: &ParamsUpdate) -> Result<()> {
        update.validate()?;
        if update.affects_geometry() {
            self.cached_paths = None;
        }
        self.params.apply(update);
        Ok(())
    }

    /// Starts a load, superseding any load still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    /// Installs decoded pixels for `ticket`. A stale ticket is rejected and
    /// leaves the tracer untouched.
    pub fn finish_load(&mut self, ticket: LoadTicket, image: &ImageData) -> Result<()> {
        self.check_ticket(ticket)?;
        let bitmap = Bitmap::from_image_data(image)?;
        self.install(bitmap);
        Ok(())
    }

    /// Installs a precomputed luminance bitmap for `ticket`.
    pub fn finish_load_bitmap(&mut self, ticket: LoadTicket, bitmap: Bitmap) -> Result<()> {
        self.check_ticket(ticket)?;
        self.install(bitmap);
        Ok(())
    }

    pub fn load_image_data(&mut self, image: &ImageData) -> Result<()> {
        let ticket = self.begin_load();
        self.finish_load(ticket, image)
    }

    pub fn load_bitmap(&mut self, bitmap: Bitmap) -> Result<()> {
        let ticket = self.begin_load();
        self.finish_load_bitmap(ticket, bitmap)
    }

    /// Decodes an image file and loads it.
    pub fn load_image(&mut self, path: &std::path::Path) -> anyhow::Result<()> {
        let ticket = self.begin_load();
        let image = image_processor::load_image(path)?;
        self.finish_load(ticket, &image)
            .with_context(|| format!("Failed to load {}", path.display()))
    }

    fn check_ticket(&self, ticket: LoadTicket) -> Result<()> {
        if ticket.0 == self.generation {
            Ok(())
        } else {
            Err(TraceError::SupersededLoad)
        }
    }

    fn install(&mut self, bitmap: Bitmap) {
        debug!(width = bitmap.width(), height = bitmap.height(), "bitmap loaded");
        self.bitmap = Some(bitmap);
        self.cached_paths = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.bitmap.is_some()
    }

    pub fn bitmap(&self) -> Result<&Bitmap> {
        self.bitmap.as_ref().ok_or(TraceError::NotLoaded)
    }

    /// Binarization threshold in effect for the loaded bitmap.
    pub fn threshold(&self) -> Result<f64> {
        Ok(resolve_threshold(self.bitmap()?, self.params.threshold))
    }

    /// Fitted paths, traced on first request after a load or a geometry
    /// change.
    pub fn paths(&mut self) -> Result<&[Path]> {
        let bitmap = self.bitmap.as_ref().ok_or(TraceError::NotLoaded)?;
        let params = &self.params;
        let paths = self.cached_paths.get_or_insert_with(|| {
            let threshold = resolve_threshold(bitmap, params.threshold);
            trace_bitmap(bitmap, params, threshold)
        });
        Ok(paths)
    }

    pub fn traced_paths(&mut self, scale: Scale) -> Result<Vec<TracedPath>> {
        Ok(render_paths(self.paths()?, scale))
    }

    /// All outlines as one path-data string.
    pub fn path_data(&mut self, scale: Scale) -> Result<String> {
        Ok(outline::path_data(&self.traced_paths(scale)?))
    }
}

/// Threshold level for `bitmap`, running Otsu on its histogram when asked
/// for `auto`.
pub fn resolve_threshold(bitmap: &Bitmap, threshold: Threshold) -> f64 {
    match threshold {
        Threshold::Level(level) => f64::from(level),
        Threshold::Auto => f64::from(bitmap.histogram().auto_threshold().unwrap_or(FALLBACK_THRESHOLD)),
    }
}

/// Runs the full pipeline on `bitmap` at `threshold`. Contours are
/// extracted sequentially, then fitted in parallel.
pub fn trace_bitmap(bitmap: &Bitmap, params: &TraceParams, threshold: f64) -> Vec<Path> {
    let binary = bitmap.binarize(threshold, params.black_on_white);
    let mut paths = binary.trace_contours(params.turn_policy, params.turd_size);
    paths.par_iter_mut().for_each(|path| fit_path(path, params));
    debug!(threshold, paths = paths.len(), "traced bitmap");
    paths
}

fn fit_path(path: &mut Path, params: &TraceParams) {
    path.calc_sums();
    path.calc_lon();
    path.best_polygon();
    let mut curve = path.adjust_vertices();
    if path.sign == Sign::Negative {
        curve.reverse();
    }
    curve.smooth(params.alpha_max);
    if params.opt_curve {
        curve = curve.optimize(params.opt_tolerance);
    }
    path.curve = Some(curve);
}

pub fn render_paths(paths: &[Path], scale: Scale) -> Vec<TracedPath> {
    paths
        .iter()
        .filter_map(|path| {
            path.curve.as_ref().map(|curve| TracedPath {
                sign: path.sign,
                area: path.area,
                commands: curve.render(scale),
            })
        })
        .collect()
}
