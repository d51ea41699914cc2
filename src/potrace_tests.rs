#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::outline::DrawCommand;
    use crate::params::TurnPolicy;
    use rgb::RGBA8;

    const BLACK: RGBA8 = RGBA8::new(0, 0, 0, 255);
    const WHITE: RGBA8 = RGBA8::new(255, 255, 255, 255);

    /// White canvas with a black square at `(x0, y0)` of side `side`.
    fn square_image(size: u32, x0: u32, y0: u32, side: u32) -> ImageData {
        let mut image = ImageData::filled(size, size, WHITE);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                image.pixels[(y * size + x) as usize] = BLACK;
            }
        }
        image
    }

    #[test]
    fn test_paths_before_load() {
        let mut potrace = Potrace::new();
        assert!(!potrace.is_loaded());
        assert_eq!(potrace.paths().unwrap_err(), TraceError::NotLoaded);
        assert_eq!(potrace.bitmap().unwrap_err(), TraceError::NotLoaded);
        assert_eq!(potrace.path_data(Scale::default()).unwrap_err(), TraceError::NotLoaded);
    }

    #[test]
    fn test_superseded_load_is_rejected() {
        let mut potrace = Potrace::new();
        let first = potrace.begin_load();
        let second = potrace.begin_load();

        let black = ImageData::filled(4, 4, BLACK);
        assert_eq!(potrace.finish_load(first, &black), Err(TraceError::SupersededLoad));
        assert!(!potrace.is_loaded());

        potrace.finish_load(second, &black).unwrap();
        assert_eq!(potrace.bitmap().unwrap().width(), 4);
        assert_eq!(potrace.finish_load(first, &black), Err(TraceError::SupersededLoad));
    }

    #[test]
    fn test_invalid_update_changes_nothing() {
        let mut potrace = Potrace::new();
        let update = ParamsUpdate {
            turd_size: Some(10),
            alpha_max: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(potrace.set_parameters(&update), Err(TraceError::InvalidParameter(_))));
        assert_eq!(potrace.params(), &TraceParams::default());
    }

    #[test]
    fn test_color_update_keeps_cached_paths() {
        let mut potrace = Potrace::new();
        potrace.load_image_data(&square_image(10, 2, 2, 5)).unwrap();
        potrace.paths().unwrap();
        assert!(potrace.cached_paths.is_some());

        let colors = ParamsUpdate {
            color: Some("red".to_string()),
            background: Some("blue".to_string()),
            ..Default::default()
        };
        potrace.set_parameters(&colors).unwrap();
        assert!(potrace.cached_paths.is_some());
        assert_eq!(potrace.params().fill_color(), "red");

        let geometry = ParamsUpdate {
            turn_policy: Some(TurnPolicy::Black),
            ..Default::default()
        };
        potrace.set_parameters(&geometry).unwrap();
        assert!(potrace.cached_paths.is_none());
    }

    #[test]
    fn test_square_traces_to_one_positive_path() {
        let mut potrace = Potrace::new();
        potrace.load_image_data(&square_image(12, 3, 3, 6)).unwrap();
        let paths = potrace.paths().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].sign, Sign::Positive);
        assert_eq!(paths[0].area, 36);
        assert!(paths[0].curve.is_some());

        let traced = potrace.traced_paths(Scale::default()).unwrap();
        assert_eq!(traced.len(), 1);
        assert!(matches!(traced[0].commands[0], DrawCommand::MoveTo(_)));
        assert!(potrace.path_data(Scale::default()).unwrap().starts_with("M "));
    }

    #[test]
    fn test_hole_is_reversed_and_kept() {
        let mut image = square_image(12, 2, 2, 8);
        for y in 4..8 {
            for x in 4..8 {
                image.pixels[y * 12 + x] = WHITE;
            }
        }
        let mut potrace = Potrace::new();
        potrace.load_image_data(&image).unwrap();
        let paths = potrace.paths().unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].sign, Sign::Positive);
        assert_eq!(paths[1].sign, Sign::Negative);
    }

    #[test]
    fn test_resolve_threshold() {
        let bitmap = Bitmap::from_luminance(4, 1, vec![30, 30, 200, 200]).unwrap();
        assert_eq!(resolve_threshold(&bitmap, Threshold::Level(77)), 77.0);
        assert_eq!(resolve_threshold(&bitmap, Threshold::Auto), 30.0);

        let blank = Bitmap::from_luminance(2, 2, vec![0; 4]).unwrap();
        assert_eq!(resolve_threshold(&blank, Threshold::Auto), f64::from(FALLBACK_THRESHOLD));
    }

    #[test]
    fn test_trace_bitmap_despeckles() {
        let mut data = vec![255u8; 100];
        data[11] = 0;
        for y in 5..8 {
            for x in 5..8 {
                data[y * 10 + x] = 0;
            }
        }
        let bitmap = Bitmap::from_luminance(10, 10, data).unwrap();
        let params = TraceParams::default();
        let paths = trace_bitmap(&bitmap, &params, 128.0);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].area, 9);
    }

    #[test]
    fn test_load_bitmap_directly() {
        let mut potrace = Potrace::new();
        let bitmap = Bitmap::from_luminance(3, 3, vec![0; 9]).unwrap();
        potrace.load_bitmap(bitmap).unwrap();
        assert_eq!(potrace.threshold().unwrap(), f64::from(FALLBACK_THRESHOLD));
        assert_eq!(potrace.paths().unwrap().len(), 1);
    }
}
