//! Small geometric building blocks shared by the polygon and curve passes.

use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Running moments of a contour's vertices, relative to its first vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sum {
    pub x: f64,
    pub y: f64,
    pub xy: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Symmetric 3x3 quadratic form used while placing polygon vertices.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quad {
    data: [f64; 9],
}

impl Quad {
    /// Outer product `v * v^T / scale`.
    pub fn from_outer(v: [f64; 3], scale: f64) -> Self {
        let mut quad = Quad::default();
        for l in 0..3 {
            for k in 0..3 {
                quad.data[l * 3 + k] = v[l] * v[k] / scale;
            }
        }
        quad
    }

    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * 3 + col]
    }

    pub fn add_outer(&mut self, v: [f64; 3], scale: f64) {
        for l in 0..3 {
            for k in 0..3 {
                self.data[l * 3 + k] += v[l] * v[k] / scale;
            }
        }
    }

    /// Evaluates `(w.x, w.y, 1) Q (w.x, w.y, 1)^T`.
    pub fn eval(&self, w: Point) -> f64 {
        let v = [w.x, w.y, 1.0];
        let mut sum = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                sum += v[i] * self.at(i, j) * v[j];
            }
        }
        sum
    }
}

impl Add for Quad {
    type Output = Quad;

    fn add(self, other: Quad) -> Quad {
        let mut data = self.data;
        for (slot, value) in data.iter_mut().zip(other.data) {
            *slot += value;
        }
        Quad { data }
    }
}

/// Index arithmetic over a closed sequence of `len` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    len: usize,
}

impl Cycle {
    pub fn new(len: usize) -> Self {
        Self { len }
    }

    pub fn len(self) -> usize {
        self.len
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Maps any signed position onto `0..len`.
    pub fn wrap(self, index: i64) -> usize {
        index.rem_euclid(self.len as i64) as usize
    }

    pub fn offset(self, index: usize, by: i64) -> usize {
        self.wrap(index as i64 + by)
    }

    pub fn next(self, index: usize) -> usize {
        self.offset(index, 1)
    }

    pub fn prev(self, index: usize) -> usize {
        self.offset(index, -1)
    }
}

/// True when `b` lies in the half-open cyclic interval `[a, c)`.
pub fn cyclic(a: usize, b: usize, c: usize) -> bool {
    if a <= c {
        a <= b && b < c
    } else {
        a <= b || b < c
    }
}

pub fn sign(value: f64) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

pub fn xprod(p1: Point, p2: Point) -> f64 {
    p1.x * p2.y - p1.y * p2.x
}

/// Point at fraction `lambda` on the segment `a -> b`.
pub fn interval(lambda: f64, a: Point, b: Point) -> Point {
    Point::new(a.x + lambda * (b.x - a.x), a.y + lambda * (b.y - a.y))
}

/// Unit vector, in the L-infinity sense, orthogonal to `p2 - p0`.
fn dorth_infty(p0: Point, p2: Point) -> Point {
    Point::new(-f64::from(sign(p2.y - p0.y)), f64::from(sign(p2.x - p0.x)))
}

pub fn ddenom(p0: Point, p2: Point) -> f64 {
    let r = dorth_infty(p0, p2);
    r.y * (p2.x - p0.x) - r.x * (p2.y - p0.y)
}

/// Twice the signed area of the triangle `p0 p1 p2`.
pub fn dpara(p0: Point, p1: Point, p2: Point) -> f64 {
    let x1 = p1.x - p0.x;
    let y1 = p1.y - p0.y;
    let x2 = p2.x - p0.x;
    let y2 = p2.y - p0.y;
    x1 * y2 - x2 * y1
}

/// Cross product of `p1 - p0` and `p3 - p2`.
pub fn cprod(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    let x1 = p1.x - p0.x;
    let y1 = p1.y - p0.y;
    let x2 = p3.x - p2.x;
    let y2 = p3.y - p2.y;
    x1 * y2 - x2 * y1
}

/// Inner product of `p1 - p0` and `p2 - p0`.
pub fn iprod(p0: Point, p1: Point, p2: Point) -> f64 {
    let x1 = p1.x - p0.x;
    let y1 = p1.y - p0.y;
    let x2 = p2.x - p0.x;
    let y2 = p2.y - p0.y;
    x1 * x2 + y1 * y2
}

/// Inner product of `p1 - p0` and `p3 - p2`.
pub fn iprod1(p0: Point, p1: Point, p2: Point, p3: Point) -> f64 {
    let x1 = p1.x - p0.x;
    let y1 = p1.y - p0.y;
    let x2 = p3.x - p2.x;
    let y2 = p3.y - p2.y;
    x1 * x2 + y1 * y2
}

pub fn ddist(p: Point, q: Point) -> f64 {
    ((p.x - q.x) * (p.x - q.x) + (p.y - q.y) * (p.y - q.y)).sqrt()
}

/// Cubic Bezier evaluated at `t`.
pub fn bezier(t: f64, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    let s = 1.0 - t;
    Point::new(
        s * s * s * p0.x + 3.0 * (s * s * t) * p1.x + 3.0 * (t * t * s) * p2.x + t * t * t * p3.x,
        s * s * s * p0.y + 3.0 * (s * s * t) * p1.y + 3.0 * (t * t * s) * p2.y + t * t * t * p3.y,
    )
}

/// Parameter in `[0, 1]` where the Bezier's tangent is parallel to
/// `q0 -> q1`, or `-1.0` when there is none.
pub fn tangent(p0: Point, p1: Point, p2: Point, p3: Point, q0: Point, q1: Point) -> f64 {
    let big_a = cprod(p0, p1, q0, q1);
    let big_b = cprod(p1, p2, q0, q1);
    let big_c = cprod(p2, p3, q0, q1);

    let a = big_a - 2.0 * big_b + big_c;
    let b = -2.0 * big_a + 2.0 * big_b;
    let c = big_a;

    let d = b * b - 4.0 * a * c;
    if a == 0.0 || d < 0.0 {
        return -1.0;
    }

    let s = d.sqrt();
    let r1 = (-b + s) / (2.0 * a);
    let r2 = (-b - s) / (2.0 * a);

    if (0.0..=1.0).contains(&r1) {
        r1
    } else if (0.0..=1.0).contains(&r2) {
        r2
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    include!("geometry_tests.rs");
}
