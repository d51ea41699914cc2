//! Renderer-facing output of a trace: draw commands per closed path, and
//! their path-data text form.

use crate::geometry::Point;
use crate::path::Sign;
use std::fmt;

/// Multiplier applied to coordinates on output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

impl Scale {
    /// Scale mapping a `width` x `height` bitmap onto the requested size.
    pub fn fit(width: usize, height: usize, target_width: f64, target_height: f64) -> Self {
        let ratio = |target: f64, size: usize| if size == 0 { 1.0 } else { target / size as f64 };
        Self {
            x: ratio(target_width, width),
            y: ratio(target_height, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
}

impl fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawCommand::MoveTo(p) => write!(f, "M {} {}", fixed(p.x), fixed(p.y)),
            DrawCommand::LineTo(p) => write!(f, "L {} {}", fixed(p.x), fixed(p.y)),
            DrawCommand::CurveTo(a, b, c) => write!(
                f,
                "C {} {}, {} {}, {} {}",
                fixed(a.x),
                fixed(a.y),
                fixed(b.x),
                fixed(b.y),
                fixed(c.x),
                fixed(c.y)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    EvenOdd,
}

impl FillRule {
    pub fn as_str(self) -> &'static str {
        match self {
            FillRule::EvenOdd => "evenodd",
        }
    }
}

/// One closed outline ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedPath {
    pub sign: Sign,
    pub area: i64,
    pub commands: Vec<DrawCommand>,
}

impl TracedPath {
    /// Path data for this outline alone. Two consecutive line commands,
    /// as emitted for a corner, share a single `L`.
    pub fn to_path_data(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.commands.len());
        let mut pending_line: Option<Point> = None;

        for command in &self.commands {
            match (command, pending_line.take()) {
                (DrawCommand::LineTo(second), Some(first)) => parts.push(format!(
                    "L {} {} {} {}",
                    fixed(first.x),
                    fixed(first.y),
                    fixed(second.x),
                    fixed(second.y)
                )),
                (DrawCommand::LineTo(p), None) => pending_line = Some(*p),
                (other, Some(first)) => {
                    parts.push(DrawCommand::LineTo(first).to_string());
                    parts.push(other.to_string());
                }
                (other, None) => parts.push(other.to_string()),
            }
        }
        if let Some(last) = pending_line {
            parts.push(DrawCommand::LineTo(last).to_string());
        }

        parts.join(" ")
    }
}

/// Path data for a set of outlines, joined by spaces.
pub fn path_data(paths: &[TracedPath]) -> String {
    paths
        .iter()
        .map(TracedPath::to_path_data)
        .filter(|data| !data.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats with three decimals, ties rounded away from zero, dropping a
/// `.000` fraction.
pub fn fixed(value: f64) -> String {
    let digits = thousandths(value.abs());
    let text = if value < 0.0 { format!("-{digits}") } else { digits };
    text.replacen(".000", "", 1)
}

/// `value` rounded to three decimals the way [`fixed`] prints it. Rounding
/// works on the exact decimal expansion, so `0.2045` (stored just below the
/// tie) becomes `0.204`.
pub fn round_to_thousandths(value: f64) -> f64 {
    let magnitude = value.abs();
    let rounded = thousandths(magnitude).parse().unwrap_or(magnitude);
    if value < 0.0 && rounded != 0.0 { -rounded } else { rounded }
}

fn thousandths(magnitude: f64) -> String {
    // only multiples of 1/16 can sit exactly halfway between two thousandths
    if (magnitude * 16.0).fract() == 0.0 {
        format!("{:.3}", (magnitude * 1000.0).round() / 1000.0)
    } else {
        format!("{magnitude:.3}")
    }
}
