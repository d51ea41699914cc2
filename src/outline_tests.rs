#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_fixed_formatting() {
        assert_eq!(fixed(255.456342), "255.456");
        assert_eq!(fixed(12.0), "12");
        assert_eq!(fixed(0.0), "0");
        assert_eq!(fixed(2.5), "2.500");
        assert_eq!(fixed(-3.25), "-3.250");
        assert_eq!(fixed(-4.0), "-4");
    }

    #[test]
    fn test_fixed_rounds_ties_away_from_zero() {
        assert_eq!(fixed(0.0625), "0.063");
        assert_eq!(fixed(-0.0625), "-0.063");
        assert_eq!(fixed(1.1875), "1.188");
        assert_eq!(fixed(0.1234), "0.123");
    }

    #[test]
    fn test_round_to_thousandths_uses_exact_decimal() {
        // 0.2045 is stored as 0.20449999..., but 0.2045 * 1000.0 lands on 204.5
        assert_eq!((0.2045f64 * 1000.0).round() / 1000.0, 0.205);
        assert_eq!(round_to_thousandths(0.2045), 0.204);
        assert_eq!(fixed(0.2045), "0.204");

        assert_eq!(round_to_thousandths(0.0625), 0.063);
        assert_eq!(round_to_thousandths(-0.0625), -0.063);
        assert_eq!(round_to_thousandths(0.37549), 0.375);
        assert_eq!(round_to_thousandths(1.0), 1.0);

        let zero = round_to_thousandths(-0.0001);
        assert_eq!(zero, 0.0);
        assert!(zero.is_sign_positive());
    }

    #[test]
    fn test_tiny_negative_keeps_sign() {
        assert_eq!(fixed(-0.0001), "-0");
        assert_eq!(fixed(-0.0), "0");
    }

    #[test]
    fn test_command_display() {
        let curve = DrawCommand::CurveTo(Point::new(1.0, 2.0), Point::new(3.5, 4.0), Point::new(5.0, 6.25));
        assert_eq!(curve.to_string(), "C 1 2, 3.500 4, 5 6.250");
        assert_eq!(DrawCommand::MoveTo(Point::new(0.0, 10.0)).to_string(), "M 0 10");
    }

    #[test]
    fn test_corner_lines_share_one_command() {
        let path = TracedPath {
            sign: Sign::Positive,
            area: 4,
            commands: vec![
                DrawCommand::MoveTo(Point::new(2.0, 0.0)),
                DrawCommand::LineTo(Point::new(0.0, 0.0)),
                DrawCommand::LineTo(Point::new(0.0, 2.0)),
                DrawCommand::CurveTo(Point::new(0.0, 3.0), Point::new(1.0, 4.0), Point::new(2.0, 4.0)),
            ],
        };
        assert_eq!(path.to_path_data(), "M 2 0 L 0 0 0 2 C 0 3, 1 4, 2 4");
    }

    #[test]
    fn test_path_data_joins_paths() {
        let square = |offset: f64| TracedPath {
            sign: Sign::Positive,
            area: 1,
            commands: vec![
                DrawCommand::MoveTo(Point::new(offset, 0.0)),
                DrawCommand::LineTo(Point::new(offset, 1.0)),
                DrawCommand::LineTo(Point::new(offset + 1.0, 1.0)),
            ],
        };
        assert_eq!(path_data(&[square(0.0), square(5.0)]), "M 0 0 L 0 1 1 1 M 5 0 L 5 1 6 1");
        assert_eq!(path_data(&[]), "");
    }

    #[test]
    fn test_scale_fit() {
        assert_eq!(Scale::default(), Scale { x: 1.0, y: 1.0 });
        assert_eq!(Scale::fit(100, 50, 200.0, 25.0), Scale { x: 2.0, y: 0.5 });
        assert_eq!(Scale::fit(0, 0, 10.0, 10.0), Scale::default());
        assert_eq!(FillRule::default().as_str(), "evenodd");
    }
}
