//! Polygon fitting over a traced contour.
//!
//! A contour is first reduced to its straight runs (`calc_lon`), then the
//! cheapest closed polygon made of such runs is picked by dynamic programming
//! (`best_polygon`), and finally each polygon vertex is moved to the point
//! minimising the squared distance to its two adjoining lines
//! (`adjust_vertices`).

use crate::curve::Curve;
use crate::geometry::{cyclic, sign, xprod, Cycle, Point, Quad, Sum};
use std::fmt;

/// Orientation of a contour: `+` bounds foreground, `-` bounds a hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    pub fn as_char(self) -> char {
        match self {
            Sign::Positive => '+',
            Sign::Negative => '-',
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Closed pixel-edge contour and the polygon fitted over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub area: i64,
    pub sign: Sign,
    pub points: Vec<Point>,
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
    /// Prefix moments of `points`, relative to `points[0]`.
    pub sums: Vec<Sum>,
    /// For each vertex, the furthest vertex reachable along a straight run.
    pub lon: Vec<usize>,
    /// Indices of the vertices of the optimal polygon.
    pub polygon: Vec<usize>,
    pub curve: Option<Curve>,
}

/// Least-squares line through a run of contour vertices.
struct Segment {
    center: Point,
    direction: Point,
}

impl Path {
    pub fn new(points: Vec<Point>, area: i64, sign: Sign, bounds: (i64, i64, i64, i64)) -> Self {
        let (min_x, min_y, max_x, max_y) = bounds;
        Self {
            area,
            sign,
            points,
            min_x,
            min_y,
            max_x,
            max_y,
            sums: Vec::new(),
            lon: Vec::new(),
            polygon: Vec::new(),
            curve: None,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn origin(&self) -> Point {
        self.points.first().copied().unwrap_or_default()
    }

    pub fn calc_sums(&mut self) {
        let origin = self.origin();
        let mut sums = Vec::with_capacity(self.points.len() + 1);
        let mut acc = Sum::default();
        sums.push(acc);
        for point in &self.points {
            let x = point.x - origin.x;
            let y = point.y - origin.y;
            acc = Sum {
                x: acc.x + x,
                y: acc.y + y,
                xy: acc.xy + x * y,
                x2: acc.x2 + x * x,
                y2: acc.y2 + y * y,
            };
            sums.push(acc);
        }
        self.sums = sums;
    }

    /// Computes `lon`: for every vertex `i`, the furthest `k` such that the
    /// vertices `i..k` all stay within one pixel of some straight line.
    pub fn calc_lon(&mut self) {
        let n = self.points.len();
        if n == 0 {
            self.lon.clear();
            return;
        }
        let cycle = Cycle::new(n);
        let pt = &self.points;
        let mut pivk = vec![0usize; n];
        let mut nc = vec![0usize; n];

        // nc[i]: next index after i where both coordinates changed
        let mut k = 0;
        for i in (0..n).rev() {
            if pt[i].x != pt[k].x && pt[i].y != pt[k].y {
                k = i + 1;
            }
            nc[i] = k;
        }

        for i in (0..n).rev() {
            let mut ct = [0u32; 4];
            let next = pt[cycle.next(i)];
            ct[direction_slot(next.x - pt[i].x, next.y - pt[i].y)] += 1;

            let mut constraint = [Point::default(), Point::default()];
            let mut k = nc[i];
            let mut k1 = i;
            let mut found = false;

            loop {
                ct[direction_slot(
                    f64::from(sign(pt[k].x - pt[k1].x)),
                    f64::from(sign(pt[k].y - pt[k1].y)),
                )] += 1;

                if ct.iter().all(|&count| count > 0) {
                    pivk[i] = k1;
                    found = true;
                    break;
                }

                let cur = pt[k] - pt[i];
                if xprod(constraint[0], cur) < 0.0 || xprod(constraint[1], cur) > 0.0 {
                    break;
                }

                if cur.x.abs() > 1.0 || cur.y.abs() > 1.0 {
                    let off = Point::new(
                        cur.x + if cur.y >= 0.0 && (cur.y > 0.0 || cur.x < 0.0) { 1.0 } else { -1.0 },
                        cur.y + if cur.x <= 0.0 && (cur.x < 0.0 || cur.y < 0.0) { 1.0 } else { -1.0 },
                    );
                    if xprod(constraint[0], off) >= 0.0 {
                        constraint[0] = off;
                    }
                    let off = Point::new(
                        cur.x + if cur.y <= 0.0 && (cur.y < 0.0 || cur.x < 0.0) { 1.0 } else { -1.0 },
                        cur.y + if cur.x >= 0.0 && (cur.x > 0.0 || cur.y < 0.0) { 1.0 } else { -1.0 },
                    );
                    if xprod(constraint[1], off) <= 0.0 {
                        constraint[1] = off;
                    }
                }

                k1 = k;
                k = nc[k1];
                if !cyclic(k, i, k1) {
                    break;
                }
            }

            if !found {
                let dk = Point::new(
                    f64::from(sign(pt[k].x - pt[k1].x)),
                    f64::from(sign(pt[k].y - pt[k1].y)),
                );
                let cur = pt[k1] - pt[i];
                let a = xprod(constraint[0], cur);
                let b = xprod(constraint[0], dk);
                let c = xprod(constraint[1], cur);
                let d = xprod(constraint[1], dk);

                let mut j: i64 = 10_000_000;
                if b < 0.0 {
                    j = (a / -b).floor() as i64;
                }
                if d > 0.0 {
                    j = j.min((-c / d).floor() as i64);
                }
                pivk[i] = cycle.offset(k1, j);
            }
        }

        let mut lon = vec![0usize; n];
        let mut j = pivk[n - 1];
        lon[n - 1] = j;
        for i in (0..n - 1).rev() {
            if cyclic(i + 1, pivk[i], j) {
                j = pivk[i];
            }
            lon[i] = j;
        }

        let mut i = n - 1;
        while cyclic(cycle.next(i), j, lon[i]) {
            lon[i] = j;
            if i == 0 {
                break;
            }
            i -= 1;
        }

        self.lon = lon;
    }

    /// Penalty of replacing vertices `i..=j` (`j` may wrap past `n`) by one
    /// straight segment: roughly the standard deviation of their distance
    /// to it, scaled by its length.
    pub fn penalty3(&self, i: usize, j: usize) -> f64 {
        let n = self.points.len();
        let sums = &self.sums;
        let pt = &self.points;

        let (j, wrapped) = if j >= n { (j - n, true) } else { (j, false) };

        let (x, y, xy, x2, y2, k) = if wrapped {
            (
                sums[j + 1].x - sums[i].x + sums[n].x,
                sums[j + 1].y - sums[i].y + sums[n].y,
                sums[j + 1].xy - sums[i].xy + sums[n].xy,
                sums[j + 1].x2 - sums[i].x2 + sums[n].x2,
                sums[j + 1].y2 - sums[i].y2 + sums[n].y2,
                (j + 1 + n - i) as f64,
            )
        } else {
            (
                sums[j + 1].x - sums[i].x,
                sums[j + 1].y - sums[i].y,
                sums[j + 1].xy - sums[i].xy,
                sums[j + 1].x2 - sums[i].x2,
                sums[j + 1].y2 - sums[i].y2,
                (j + 1 - i) as f64,
            )
        };

        let px = (pt[i].x + pt[j].x) / 2.0 - pt[0].x;
        let py = (pt[i].y + pt[j].y) / 2.0 - pt[0].y;
        let ey = pt[j].x - pt[i].x;
        let ex = -(pt[j].y - pt[i].y);

        let a = (x2 - 2.0 * x * px) / k + px * px;
        let b = (xy - x * py - y * px) / k + px * py;
        let c = (y2 - 2.0 * y * py) / k + py * py;

        let s = ex * ex * a + 2.0 * ex * ey * b + ey * ey * c;
        s.sqrt()
    }

    /// Finds the polygon with the fewest segments allowed by `lon`, breaking
    /// ties by total `penalty3`.
    pub fn best_polygon(&mut self) {
        let n = self.points.len();
        let cycle = Cycle::new(n);
        let mut pen = vec![0.0f64; n + 1];
        let mut prev = vec![0usize; n + 1];
        let mut clip0 = vec![0usize; n];
        let mut clip1 = vec![0usize; n + 1];
        let mut seg0 = vec![0usize; n + 1];
        let mut seg1 = vec![0usize; n + 1];

        for i in 0..n {
            let mut c = cycle.wrap(self.lon[cycle.prev(i)] as i64 - 1);
            if c == i {
                c = cycle.next(i);
            }
            clip0[i] = if c < i { n } else { c };
        }

        let mut j = 1;
        for i in 0..n {
            while j <= clip0[i] {
                clip1[j] = i;
                j += 1;
            }
        }

        let mut i = 0;
        let mut j = 0;
        while i < n {
            seg0[j] = i;
            i = clip0[i];
            j += 1;
        }
        seg0[j] = n;
        let m = j;

        let mut i = n;
        for j in (1..=m).rev() {
            seg1[j] = i;
            i = clip1[i];
        }
        seg1[0] = 0;

        pen[0] = 0.0;
        for j in 1..=m {
            for i in seg1[j]..=seg0[j] {
                let mut best = -1.0;
                for k in (clip1[i]..=seg0[j - 1]).rev() {
                    let this_pen = self.penalty3(k, i) + pen[k];
                    if best < 0.0 || this_pen < best {
                        prev[i] = k;
                        best = this_pen;
                    }
                }
                pen[i] = best;
            }
        }

        let mut polygon = vec![0usize; m];
        let mut i = n;
        for slot in polygon.iter_mut().rev() {
            i = prev[i];
            *slot = i;
        }
        self.polygon = polygon;
    }

    /// Least-squares line through vertices `i..=j` (indices may leave
    /// `0..n`; they wrap), as its center and unit direction.
    fn pointslope(&self, i: i64, j: i64) -> Segment {
        let n = self.points.len() as i64;
        let sums = &self.sums;
        let (mut i, mut j, mut r) = (i, j, 0i64);

        while j >= n {
            j -= n;
            r += 1;
        }
        while i >= n {
            i -= n;
            r -= 1;
        }
        while j < 0 {
            j += n;
            r -= 1;
        }
        while i < 0 {
            i += n;
            r += 1;
        }

        let (iu, ju, nu) = (i as usize, j as usize, n as usize);
        let rf = r as f64;
        let x = sums[ju + 1].x - sums[iu].x + rf * sums[nu].x;
        let y = sums[ju + 1].y - sums[iu].y + rf * sums[nu].y;
        let x2 = sums[ju + 1].x2 - sums[iu].x2 + rf * sums[nu].x2;
        let xy = sums[ju + 1].xy - sums[iu].xy + rf * sums[nu].xy;
        let y2 = sums[ju + 1].y2 - sums[iu].y2 + rf * sums[nu].y2;
        let k = (j + 1 - i + r * n) as f64;

        let center = Point::new(x / k, y / k);

        let mut a = (x2 - x * x / k) / k;
        let b = (xy - x * y / k) / k;
        let mut c = (y2 - y * y / k) / k;

        // larger eigenvalue
        let lambda2 = (a + c + ((a - c) * (a - c) + 4.0 * b * b).sqrt()) / 2.0;

        a -= lambda2;
        c -= lambda2;

        let direction = if a.abs() >= c.abs() {
            let l = (a * a + b * b).sqrt();
            if l != 0.0 { Point::new(-b / l, a / l) } else { Point::default() }
        } else {
            let l = (c * c + b * b).sqrt();
            if l != 0.0 { Point::new(-c / l, b / l) } else { Point::default() }
        };

        Segment { center, direction }
    }

    /// Places each polygon vertex where the squared distance to the two
    /// adjoining best-fit lines is minimal, constrained to the unit square
    /// around the original vertex. Returns the resulting curve skeleton.
    pub fn adjust_vertices(&self) -> Curve {
        let m = self.polygon.len();
        let n = self.points.len();
        let po = &self.polygon;
        let ring = Cycle::new(m);
        let contour = Cycle::new(n);
        let origin = self.origin();
        let mut curve = Curve::new(m);

        let segments: Vec<Segment> = (0..m)
            .map(|i| {
                let j = po[ring.next(i)];
                let j = contour.wrap(j as i64 - po[i] as i64) + po[i];
                self.pointslope(po[i] as i64, j as i64)
            })
            .collect();

        let quads: Vec<Quad> = segments
            .iter()
            .map(|segment| {
                let dir = segment.direction;
                let d = dir.x * dir.x + dir.y * dir.y;
                if d == 0.0 {
                    Quad::default()
                } else {
                    let v0 = dir.y;
                    let v1 = -dir.x;
                    let v2 = -v1 * segment.center.y - v0 * segment.center.x;
                    Quad::from_outer([v0, v1, v2], d)
                }
            })
            .collect();

        for i in 0..m {
            let s = self.points[po[i]] - origin;
            let mut q = quads[ring.prev(i)] + quads[i];
            let mut w = Point::default();

            loop {
                let det = q.at(0, 0) * q.at(1, 1) - q.at(0, 1) * q.at(1, 0);
                if det != 0.0 {
                    w.x = (-q.at(0, 2) * q.at(1, 1) + q.at(1, 2) * q.at(0, 1)) / det;
                    w.y = (q.at(0, 2) * q.at(1, 0) - q.at(1, 2) * q.at(0, 0)) / det;
                    break;
                }

                // singular: the lines are parallel, add an orthogonal one through s
                let (v0, v1) = if q.at(0, 0) > q.at(1, 1) {
                    (-q.at(0, 1), q.at(0, 0))
                } else if q.at(1, 1) != 0.0 {
                    (-q.at(1, 1), q.at(1, 0))
                } else {
                    (1.0, 0.0)
                };
                let d = v0 * v0 + v1 * v1;
                let v2 = -v1 * s.y - v0 * s.x;
                q.add_outer([v0, v1, v2], d);
            }

            let dx = (w.x - s.x).abs();
            let dy = (w.y - s.y).abs();
            if dx <= 0.5 && dy <= 0.5 {
                curve.vertex[i] = w + origin;
                continue;
            }

            // the minimum lies outside the unit square; search its boundary
            let mut min = q.eval(s);
            let mut best = s;

            if q.at(0, 0) != 0.0 {
                for z in 0..2 {
                    let wy = s.y - 0.5 + f64::from(z);
                    let candidate = Point::new(-(q.at(0, 1) * wy + q.at(0, 2)) / q.at(0, 0), wy);
                    let cost = q.eval(candidate);
                    if (candidate.x - s.x).abs() <= 0.5 && cost < min {
                        min = cost;
                        best = candidate;
                    }
                }
            }

            if q.at(1, 1) != 0.0 {
                for z in 0..2 {
                    let wx = s.x - 0.5 + f64::from(z);
                    let candidate = Point::new(wx, -(q.at(1, 0) * wx + q.at(1, 2)) / q.at(1, 1));
                    let cost = q.eval(candidate);
                    if (candidate.y - s.y).abs() <= 0.5 && cost < min {
                        min = cost;
                        best = candidate;
                    }
                }
            }

            // corners, row by row
            for l in 0..2 {
                for k in 0..2 {
                    let candidate = Point::new(s.x - 0.5 + f64::from(k), s.y - 0.5 + f64::from(l));
                    let cost = q.eval(candidate);
                    if cost < min {
                        min = cost;
                        best = candidate;
                    }
                }
            }

            curve.vertex[i] = best + origin;
        }

        curve
    }
}

/// Slot in a four-direction histogram for a unit step `(dx, dy)`.
fn direction_slot(dx: f64, dy: f64) -> usize {
    ((3.0 + 3.0 * dx + dy) / 2.0) as usize
}
