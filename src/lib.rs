//! lumatrace - bitmap to SVG tracing library
//!
//! This library turns raster images into smooth vector outlines. A single
//! threshold pass produces one filled path; the posterizer stacks several
//! passes at different thresholds with partial opacity to keep tonal detail.
//!
//! ## Features
//!
//! - **Contour decomposition** of the binarized bitmap with configurable turn policy
//! - **Optimal polygons** fitted to each contour
//! - **Bezier smoothing** with corner detection and optional segment merging
//! - **Multilevel thresholding** for automatic cut points and posterization
//!
//! ## Example
//!
//! ```rust,no_run
//! use lumatrace::{convert, ConversionOptions, TraceParams, Threshold};
//! use std::path::Path;
//!
//! let options = ConversionOptions {
//!     trace: TraceParams {
//!         threshold: Threshold::Level(120),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//!
//! convert(Path::new("input.png"), Path::new("output.svg"), &options)
//!     .expect("Conversion failed");
//! ```

pub mod bitmap;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod histogram;
pub mod image_processor;
pub mod outline;
pub mod params;
pub mod path;
pub mod posterizer;
pub mod potrace;
pub mod svg_generator;

pub use bitmap::{Bitmap, BinaryBitmap};
pub use error::{Result, TraceError};
pub use histogram::{Histogram, Stats};
pub use image_processor::{load_image, ImageData};
pub use outline::{DrawCommand, Scale, TracedPath};
pub use params::{
    FillStrategy, ParamsUpdate, PosterizeParams, PosterizeUpdate, RangeDistribution, Steps, Threshold,
    TraceParams, TurnPolicy,
};
pub use posterizer::{ColorStop, PosterizedLayer, Posterizer};
pub use potrace::{LoadTicket, Potrace};

use svg::Document;

/// Options for bitmap to SVG conversion
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub trace: TraceParams,
    /// Posterize with these settings instead of a single threshold pass
    pub posterize: Option<PosterizeParams>,
    /// Output width in pixels (default: image width)
    pub width: Option<f64>,
    /// Output height in pixels (default: image height)
    pub height: Option<f64>,
}

impl ConversionOptions {
    fn output_size(&self, image_width: usize, image_height: usize) -> svg_generator::OutputSize {
        if self.width.is_none() && self.height.is_none() {
            return None;
        }
        Some((
            self.width.unwrap_or(image_width as f64),
            self.height.unwrap_or(image_height as f64),
        ))
    }
}

/// Trace an image file and write the SVG next to it
///
/// # Arguments
///
/// * `input_path` - Path to the input image file
/// * `output_path` - Path to the output SVG file
/// * `options` - Conversion options
pub fn convert(
    input_path: &std::path::Path,
    output_path: &std::path::Path,
    options: &ConversionOptions,
) -> anyhow::Result<()> {
    let image_data = load_image(input_path)?;
    let document = convert_image(&image_data, options)?;
    svg_generator::save_svg(&document, output_path)
}

/// Trace in-memory image data into an SVG document.
pub fn convert_image(image_data: &ImageData, options: &ConversionOptions) -> Result<Document> {
    match &options.posterize {
        Some(posterize) => {
            let mut posterizer = Posterizer::with_params(options.trace.clone(), posterize.clone())?;
            posterizer.load_image_data(image_data)?;
            let bitmap = posterizer.bitmap()?;
            let size = options.output_size(bitmap.width(), bitmap.height());
            svg_generator::posterized_svg(&posterizer, size)
        }
        None => {
            let mut potrace = Potrace::with_params(options.trace.clone());
            potrace.load_image_data(image_data)?;
            let bitmap = potrace.bitmap()?;
            let size = options.output_size(bitmap.width(), bitmap.height());
            svg_generator::trace_svg(&mut potrace, size)
        }
    }
}

/// Convert image data directly to an SVG string
///
/// This is useful when you have image data in memory and want the SVG
/// content without writing to a file.
pub fn convert_to_svg_string(image_data: &ImageData, options: &ConversionOptions) -> Result<String> {
    Ok(convert_image(image_data, options)?.to_string())
}
