#[cfg(test)]
mod tests {
    use super::super::*;

    fn square(side: f64) -> Curve {
        let mut curve = Curve::new(4);
        curve.vertex = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, side),
            Point::new(side, side),
            Point::new(side, 0.0),
        ];
        curve
    }

    #[test]
    fn test_new_curve_sizes() {
        let curve = Curve::new(5);
        assert_eq!(curve.len(), 5);
        assert_eq!(curve.control_points.len(), 15);
        assert!(Curve::new(0).is_empty());
    }

    #[test]
    fn test_reverse_twice_is_identity() {
        let mut curve = square(4.0);
        let original = curve.clone();
        curve.reverse();
        assert_eq!(curve.vertex[0], Point::new(4.0, 0.0));
        assert_ne!(curve, original);
        curve.reverse();
        assert_eq!(curve, original);
    }

    #[test]
    fn test_smooth_below_alpha_max_makes_curves() {
        let mut curve = square(4.0);
        curve.smooth(1.0);
        assert!(curve.tag.iter().all(|&tag| tag == Tag::Curve));
        for j in 0..4 {
            assert!((curve.alpha[j] - 2.0 / 3.0).abs() < 1e-12);
            assert!((curve.alpha0[j] - 2.0 / 3.0).abs() < 1e-12);
            assert_eq!(curve.beta[j], 0.5);
        }
        // handle between (0,0) and (0,4), weighted toward the vertex
        let expected = 0.5 + 0.5 * (2.0 / 3.0);
        assert!((curve.control_points[3].y - 4.0 * expected).abs() < 1e-12);
        assert_eq!(curve.control_points[5], Point::new(2.0, 4.0));
    }

    #[test]
    fn test_smooth_above_alpha_max_makes_corners() {
        let mut curve = square(4.0);
        curve.smooth(0.5);
        assert!(curve.tag.iter().all(|&tag| tag == Tag::Corner));
        for j in 0..4 {
            assert_eq!(curve.control_points[3 * j + 1], curve.vertex[j]);
        }

        let mut pointed = square(4.0);
        pointed.smooth(0.0);
        assert!(pointed.tag.iter().all(|&tag| tag == Tag::Corner));
    }

    #[test]
    fn test_render_corners() {
        let mut curve = square(4.0);
        curve.smooth(0.5);
        let commands = curve.render(Scale::default());
        assert_eq!(commands.len(), 9);
        assert_eq!(commands[0], DrawCommand::MoveTo(Point::new(2.0, 0.0)));
        assert_eq!(commands[1], DrawCommand::LineTo(Point::new(0.0, 0.0)));
        assert_eq!(commands[2], DrawCommand::LineTo(Point::new(0.0, 2.0)));

        let doubled = curve.render(Scale { x: 2.0, y: 3.0 });
        assert_eq!(doubled[0], DrawCommand::MoveTo(Point::new(4.0, 0.0)));
        assert_eq!(doubled[2], DrawCommand::LineTo(Point::new(0.0, 6.0)));
    }

    #[test]
    fn test_render_curves() {
        let mut curve = square(4.0);
        curve.smooth(1.0);
        let commands = curve.render(Scale::default());
        assert_eq!(commands.len(), 5);
        assert!(matches!(commands[0], DrawCommand::MoveTo(_)));
        assert!(commands[1..].iter().all(|command| matches!(command, DrawCommand::CurveTo(..))));
        assert!(Curve::new(0).render(Scale::default()).is_empty());
    }

    #[test]
    fn test_optimize_keeps_corner_segments() {
        let mut curve = square(4.0);
        curve.smooth(0.5);
        let optimized = curve.optimize(0.2);
        assert_eq!(optimized.len(), 4);
        for i in 0..4 {
            let source = (i + 1) % 4;
            assert_eq!(optimized.tag[i], Tag::Corner);
            assert_eq!(optimized.vertex[i], curve.vertex[source]);
            assert_eq!(optimized.beta[i], 0.5);
        }
    }

    fn polygon(radii: impl Fn(usize) -> f64) -> Curve {
        let sides = 16;
        let mut curve = Curve::new(sides);
        for (i, vertex) in curve.vertex.iter_mut().enumerate() {
            let angle = std::f64::consts::TAU * i as f64 / sides as f64;
            let radius = radii(i);
            *vertex = Point::new(20.0 + radius * angle.cos(), 20.0 + radius * angle.sin());
        }
        curve.smooth(1.0);
        curve
    }

    #[test]
    fn test_optimize_merges_regular_polygon() {
        let curve = polygon(|_| 15.0);
        assert!(curve.tag.iter().all(|&tag| tag == Tag::Curve));

        let optimized = curve.optimize(0.2);
        assert_eq!(optimized.len(), 4);
        assert_eq!(optimized.control_points.len(), 12);
        assert!(optimized.tag.iter().all(|&tag| tag == Tag::Curve));

        // merged segments end where segments 4, 7, 11 and 0 ended
        for (i, source) in [4, 7, 11, 0].into_iter().enumerate() {
            assert_eq!(optimized.control_points[i * 3 + 2], curve.control_points[source * 3 + 2]);
        }

        // beta[i] = s[i] / (s[i] + t[i + 1]) over the merged runs
        let expected = [0.599456183689828, 0.40054381631017033, 0.40054381631017055, 0.5994561836898294];
        for (beta, expected) in optimized.beta.iter().zip(expected) {
            assert!((beta - expected).abs() < 1e-9, "{beta} vs {expected}");
        }
        let alpha = [0.5453642781461443, 0.5930671367669349, 0.5453642781461445, 0.4714035090022317];
        for (alpha, expected) in optimized.alpha.iter().zip(alpha) {
            assert!((alpha - expected).abs() < 1e-9, "{alpha} vs {expected}");
        }
    }

    #[test]
    fn test_optimize_stops_at_convexity_change() {
        // alternating radii make every other vertex turn the other way
        let curve = polygon(|i| if i % 2 == 0 { 15.0 } else { 13.0 });
        assert!(curve.tag.iter().all(|&tag| tag == Tag::Curve));

        let optimized = curve.optimize(0.2);
        assert_eq!(optimized.len(), 16);
        for i in 0..16 {
            let source = (i + 1) % 16;
            assert_eq!(optimized.tag[i], Tag::Curve);
            assert_eq!(optimized.vertex[i], curve.vertex[source]);
            assert_eq!(optimized.control_points[i * 3..i * 3 + 3], curve.control_points[source * 3..source * 3 + 3]);
            assert_eq!(optimized.beta[i], 0.5);
        }

        // the same outline turning one way throughout does merge
        let convex = polygon(|i| if i % 2 == 0 { 15.0 } else { 14.0 });
        assert_eq!(convex.optimize(0.2).len(), 7);
    }

    #[test]
    fn test_optimize_never_adds_segments() {
        let curve = polygon(|i| 15.0 + (i % 3) as f64);
        let optimized = curve.optimize(0.2);
        assert!(!optimized.is_empty());
        assert!(optimized.len() <= curve.len());
        assert_eq!(optimized.control_points.len(), optimized.len() * 3);
    }
}
