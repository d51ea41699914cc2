//! Bezier fitting over an adjusted polygon.

use crate::geometry::{bezier, cprod, ddenom, ddist, dpara, interval, iprod, iprod1, sign, tangent, Cycle, Point};
use crate::outline::{DrawCommand, Scale};

/// Cosine bound (about 179 degrees) used to reject merges across turns.
const MERGE_COS_LIMIT: f64 = -0.999847695156;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tag {
    #[default]
    Curve,
    Corner,
}

/// Closed sequence of segments, one per polygon vertex. Each segment owns
/// three control points: for a `Curve` the two Bezier handles and the end
/// point, for a `Corner` an unused slot, the vertex and the end point.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub tag: Vec<Tag>,
    pub control_points: Vec<Point>,
    pub vertex: Vec<Point>,
    pub alpha: Vec<f64>,
    pub alpha0: Vec<f64>,
    pub beta: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Opti {
    pen: f64,
    c: [Point; 2],
    t: f64,
    s: f64,
    alpha: f64,
}

impl Curve {
    pub fn new(segments: usize) -> Self {
        Self {
            tag: vec![Tag::default(); segments],
            control_points: vec![Point::default(); segments * 3],
            vertex: vec![Point::default(); segments],
            alpha: vec![0.0; segments],
            alpha0: vec![0.0; segments],
            beta: vec![0.0; segments],
        }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.vertex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty()
    }

    /// End point of segment `i`.
    fn end(&self, i: usize) -> Point {
        self.control_points[i * 3 + 2]
    }

    /// Reverses the vertex order, flipping the orientation.
    pub fn reverse(&mut self) {
        self.vertex.reverse();
    }

    /// Tags each vertex as a corner or a smooth curve depending on how far it
    /// sits from the chord of its neighbours, and places the Bezier handles.
    pub fn smooth(&mut self, alpha_max: f64) {
        let m = self.len();
        let ring = Cycle::new(m);

        for i in 0..m {
            let j = ring.next(i);
            let k = ring.offset(i, 2);
            let (vi, vj, vk) = (self.vertex[i], self.vertex[j], self.vertex[k]);
            let p4 = interval(0.5, vk, vj);

            let denom = ddenom(vi, vk);
            let mut alpha = if denom != 0.0 {
                let dd = (dpara(vi, vj, vk) / denom).abs();
                let alpha = if dd > 1.0 { 1.0 - 1.0 / dd } else { 0.0 };
                alpha / 0.75
            } else {
                4.0 / 3.0
            };
            self.alpha0[j] = alpha;

            if alpha >= alpha_max {
                self.tag[j] = Tag::Corner;
                self.control_points[3 * j + 1] = vj;
                self.control_points[3 * j + 2] = p4;
            } else {
                alpha = alpha.clamp(0.55, 1.0);
                self.tag[j] = Tag::Curve;
                self.control_points[3 * j] = interval(0.5 + 0.5 * alpha, vi, vj);
                self.control_points[3 * j + 1] = interval(0.5 + 0.5 * alpha, vk, vj);
                self.control_points[3 * j + 2] = p4;
            }
            self.alpha[j] = alpha;
            self.beta[j] = 0.5;
        }
    }

    /// Merges runs of consecutive curve segments into single Bezier segments
    /// wherever the result stays within `tolerance` of the original, using
    /// the fewest segments possible and the lowest penalty among those.
    pub fn optimize(&self, tolerance: f64) -> Curve {
        let m = self.len();
        if m == 0 {
            return self.clone();
        }
        let ring = Cycle::new(m);
        let vert = &self.vertex;

        let convc: Vec<i32> = (0..m)
            .map(|i| match self.tag[i] {
                Tag::Curve => sign(dpara(vert[ring.prev(i)], vert[i], vert[ring.next(i)])),
                Tag::Corner => 0,
            })
            .collect();

        // cumulative area under the curve, relative to vertex 0
        let mut areac = vec![0.0; m + 1];
        let mut area = 0.0;
        let p0 = vert[0];
        for i in 0..m {
            let i1 = ring.next(i);
            if self.tag[i1] == Tag::Curve {
                let alpha = self.alpha[i1];
                area += 0.3 * alpha * (4.0 - alpha) * dpara(self.end(i), vert[i1], self.end(i1)) / 2.0;
                area += dpara(p0, self.end(i), self.end(i1)) / 2.0;
            }
            areac[i + 1] = area;
        }

        let mut pt = vec![0usize; m + 1];
        let mut pen = vec![0.0f64; m + 1];
        let mut len = vec![0usize; m + 1];
        let mut opt: Vec<Option<Opti>> = vec![None; m + 1];

        for j in 1..=m {
            pt[j] = j - 1;
            pen[j] = pen[j - 1];
            len[j] = len[j - 1] + 1;

            for i in (0..j - 1).rev() {
                let Some(o) = self.opti_penalty(i, ring.wrap(j as i64), tolerance, &convc, &areac) else {
                    break;
                };
                if len[j] > len[i] + 1 || (len[j] == len[i] + 1 && pen[j] > pen[i] + o.pen) {
                    pt[j] = i;
                    pen[j] = pen[i] + o.pen;
                    len[j] = len[i] + 1;
                    opt[j] = Some(o);
                }
            }
        }

        let om = len[m];
        let mut merged = Curve::new(om);
        let mut s = vec![0.0; om];
        let mut t = vec![0.0; om];

        let mut j = m;
        for i in (0..om).rev() {
            let jm = ring.wrap(j as i64);
            match opt[j] {
                None => {
                    merged.tag[i] = self.tag[jm];
                    merged.control_points[i * 3..i * 3 + 3].copy_from_slice(&self.control_points[jm * 3..jm * 3 + 3]);
                    merged.vertex[i] = vert[jm];
                    merged.alpha[i] = self.alpha[jm];
                    merged.alpha0[i] = self.alpha0[jm];
                    merged.beta[i] = self.beta[jm];
                    s[i] = 1.0;
                    t[i] = 1.0;
                }
                Some(o) => {
                    merged.tag[i] = Tag::Curve;
                    merged.control_points[i * 3] = o.c[0];
                    merged.control_points[i * 3 + 1] = o.c[1];
                    merged.control_points[i * 3 + 2] = self.end(jm);
                    merged.vertex[i] = interval(o.s, self.end(jm), vert[jm]);
                    merged.alpha[i] = o.alpha;
                    merged.alpha0[i] = o.alpha;
                    s[i] = o.s;
                    t[i] = o.t;
                }
            }
            j = pt[j];
        }

        let merged_ring = Cycle::new(om);
        for i in 0..om {
            let i1 = merged_ring.next(i);
            merged.beta[i] = s[i] / (s[i] + t[i1]);
        }

        merged
    }

    /// Tries to replace segments `i+1..=j` by one Bezier; `None` when the
    /// merge is not allowed.
    fn opti_penalty(&self, i: usize, j: usize, tolerance: f64, convc: &[i32], areac: &[f64]) -> Option<Opti> {
        let m = self.len();
        let ring = Cycle::new(m);
        let vertex = &self.vertex;

        if i == j {
            return None;
        }

        let i1 = ring.next(i);
        let mut k1 = ring.next(i);
        let conv = convc[k1];
        if conv == 0 {
            return None;
        }

        // all segments must turn the same way and no turn may exceed 179 degrees
        let d = ddist(vertex[i], vertex[i1]);
        let mut k = k1;
        while k != j {
            k1 = ring.next(k);
            let k2 = ring.offset(k, 2);
            if convc[k1] != conv {
                return None;
            }
            if sign(cprod(vertex[i], vertex[i1], vertex[k1], vertex[k2])) != conv {
                return None;
            }
            if iprod1(vertex[i], vertex[i1], vertex[k1], vertex[k2]) < d * ddist(vertex[k1], vertex[k2]) * MERGE_COS_LIMIT {
                return None;
            }
            k = k1;
        }

        let p0 = self.end(i);
        let mut p1 = vertex[i1];
        let mut p2 = vertex[j];
        let p3 = self.end(j);

        let mut area = areac[j] - areac[i];
        area -= dpara(vertex[0], self.end(i), self.end(j)) / 2.0;
        if i >= j {
            area += areac[m];
        }

        let a1 = dpara(p0, p1, p2);
        let a2 = dpara(p0, p1, p3);
        let a3 = dpara(p0, p2, p3);
        let a4 = a1 + a3 - a2;

        if a2 == a1 {
            return None;
        }

        let t = a3 / (a3 - a4);
        let s = a2 / (a2 - a1);
        let triangle = a2 * t / 2.0;
        if triangle == 0.0 {
            return None;
        }

        let r = area / triangle;
        let alpha = 2.0 - (4.0 - r / 0.3).sqrt();

        p1 = interval(t * alpha, p0, p1);
        p2 = interval(s * alpha, p3, p2);
        let mut pen = 0.0;

        // the new curve must stay close to every original edge
        let mut k = ring.next(i);
        while k != j {
            let k1 = ring.next(k);
            let tt = tangent(p0, p1, p2, p3, vertex[k], vertex[k1]);
            if tt < -0.5 {
                return None;
            }
            let point = bezier(tt, p0, p1, p2, p3);
            let d = ddist(vertex[k], vertex[k1]);
            if d == 0.0 {
                return None;
            }
            let d1 = dpara(vertex[k], vertex[k1], point) / d;
            if d1.abs() > tolerance {
                return None;
            }
            if iprod(vertex[k], vertex[k1], point) < 0.0 || iprod(vertex[k1], vertex[k], point) < 0.0 {
                return None;
            }
            pen += d1 * d1;
            k = k1;
        }

        // and must not cut the corners of the original curve
        let mut k = i;
        while k != j {
            let k1 = ring.next(k);
            let tt = tangent(p0, p1, p2, p3, self.end(k), self.end(k1));
            if tt < -0.5 {
                return None;
            }
            let point = bezier(tt, p0, p1, p2, p3);
            let d = ddist(self.end(k), self.end(k1));
            if d == 0.0 {
                return None;
            }
            let mut d1 = dpara(self.end(k), self.end(k1), point) / d;
            let mut d2 = dpara(self.end(k), self.end(k1), vertex[k1]) / d;
            d2 *= 0.75 * self.alpha[k1];
            if d2 < 0.0 {
                d1 = -d1;
                d2 = -d2;
            }
            if d1 < d2 - tolerance {
                return None;
            }
            if d1 < d2 {
                pen += (d1 - d2) * (d1 - d2);
            }
            k = k1;
        }

        Some(Opti {
            pen,
            c: [p1, p2],
            t,
            s,
            alpha,
        })
    }

    /// Draw commands for this closed curve, starting at the end point of the
    /// last segment.
    pub fn render(&self, scale: Scale) -> Vec<DrawCommand> {
        let m = self.len();
        if m == 0 {
            return Vec::new();
        }
        let scaled = |p: Point| Point::new(p.x * scale.x, p.y * scale.y);

        let mut commands = Vec::with_capacity(m * 2 + 1);
        commands.push(DrawCommand::MoveTo(scaled(self.end(m - 1))));
        for (i, tag) in self.tag.iter().enumerate() {
            let c = &self.control_points[i * 3..i * 3 + 3];
            match tag {
                Tag::Curve => commands.push(DrawCommand::CurveTo(scaled(c[0]), scaled(c[1]), scaled(c[2]))),
                Tag::Corner => {
                    commands.push(DrawCommand::LineTo(scaled(c[1])));
                    commands.push(DrawCommand::LineTo(scaled(c[2])));
                }
            }
        }
        commands
    }
}
