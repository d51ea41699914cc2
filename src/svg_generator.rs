use crate::error::Result;
use crate::outline::{self, FillRule, Scale};
use crate::params::{TraceParams, COLOR_TRANSPARENT};
use crate::posterizer::Posterizer;
use crate::potrace::{render_paths, Potrace};
use anyhow::Context;
use std::path::Path;
use svg::node::element::{Path as PathElement, Rectangle, Symbol};
use svg::Document;

/// Output size in pixels; `None` keeps the bitmap size.
pub type OutputSize = Option<(f64, f64)>;

/// Builds a `<path>` for the given path data. With `fill` set to `None`
/// the element carries no fill, so a `<use>` can pick it.
pub fn path_element(data: String, fill: Option<&str>) -> PathElement {
    let element = PathElement::new()
        .set("d", data)
        .set("stroke", "none")
        .set("fill-rule", FillRule::EvenOdd.as_str());
    match fill {
        Some(color) => element.set("fill", color),
        None => element,
    }
}

fn document(params: &TraceParams, width: f64, height: f64) -> Document {
    let document = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0.0, 0.0, width, height))
        .set("version", "1.1");

    if params.background == COLOR_TRANSPARENT {
        document
    } else {
        document.add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", params.background.as_str()),
        )
    }
}

fn resolve_size(bitmap_width: usize, bitmap_height: usize, size: OutputSize) -> (f64, f64, Scale) {
    let (width, height) = size.unwrap_or((bitmap_width as f64, bitmap_height as f64));
    (width, height, Scale::fit(bitmap_width, bitmap_height, width, height))
}

/// Single-threshold trace as a standalone SVG document.
pub fn trace_svg(potrace: &mut Potrace, size: OutputSize) -> Result<Document> {
    let bitmap = potrace.bitmap()?;
    let (width, height, scale) = resolve_size(bitmap.width(), bitmap.height(), size);

    let data = potrace.path_data(scale)?;
    let params = potrace.params();
    let document = document(params, width, height);
    if data.is_empty() {
        return Ok(document);
    }
    Ok(document.add(path_element(data, Some(params.fill_color()))))
}

/// Single-threshold trace as a `<symbol>` without fill or background.
pub fn trace_symbol(potrace: &mut Potrace, id: &str) -> Result<Symbol> {
    let bitmap = potrace.bitmap()?;
    let (width, height) = (bitmap.width(), bitmap.height());
    let data = potrace.path_data(Scale::default())?;

    let symbol = Symbol::new()
        .set("viewBox", (0.0, 0.0, width as f64, height as f64))
        .set("id", id);
    if data.is_empty() {
        return Ok(symbol);
    }
    Ok(symbol.add(path_element(data, None)))
}

fn layer_elements(posterizer: &Posterizer, scale: Scale, fill: Option<&str>) -> Result<Vec<PathElement>> {
    let layers = posterizer.layers()?;
    Ok(layers
        .iter()
        .map(|layer| {
            let data = outline::path_data(&render_paths(&layer.paths, scale));
            path_element(data, fill).set("fill-opacity", layer.fill_opacity())
        })
        .collect())
}

/// Posterized layers stacked in one SVG document.
pub fn posterized_svg(posterizer: &Posterizer, size: OutputSize) -> Result<Document> {
    let bitmap = posterizer.bitmap()?;
    let (width, height, scale) = resolve_size(bitmap.width(), bitmap.height(), size);
    let params = posterizer.params();

    let elements = layer_elements(posterizer, scale, Some(params.fill_color()))?;
    Ok(elements
        .into_iter()
        .fold(document(params, width, height), |document, element| document.add(element)))
}

/// Posterized layers as a `<symbol>` without fill or background.
pub fn posterized_symbol(posterizer: &Posterizer, id: &str) -> Result<Symbol> {
    let bitmap = posterizer.bitmap()?;
    let (width, height) = (bitmap.width(), bitmap.height());
    let symbol = Symbol::new()
        .set("viewBox", (0.0, 0.0, width as f64, height as f64))
        .set("id", id);

    let elements = layer_elements(posterizer, Scale::default(), None)?;
    Ok(elements.into_iter().fold(symbol, |symbol, element| symbol.add(element)))
}

pub fn save_svg(document: &Document, output_path: &Path) -> anyhow::Result<()> {
    svg::save(output_path, document).with_context(|| format!("Failed to write {}", output_path.display()))
}
