#[cfg(test)]
mod tests {
    use super::super::*;
    use rgb::RGBA8;

    #[test]
    fn test_filled_image() {
        let img = ImageData::filled(10, 4, RGBA8::new(255, 0, 0, 255));
        assert_eq!(img.width, 10);
        assert_eq!(img.height, 4);
        assert_eq!(img.pixels.len(), 40);
        assert!(img.pixels.iter().all(|p| p.r == 255 && p.g == 0));
    }

    #[test]
    fn test_from_rgba_bytes() {
        let bytes = [0, 0, 0, 255, 10, 20, 30, 40];
        let img = ImageData::from_rgba_bytes(2, 1, &bytes).unwrap();
        assert_eq!(img.pixels[0], RGBA8::new(0, 0, 0, 255));
        assert_eq!(img.pixels[1], RGBA8::new(10, 20, 30, 40));
    }

    #[test]
    fn test_from_rgba_bytes_rejects_short_buffer() {
        let err = ImageData::from_rgba_bytes(2, 2, &[0; 12]).unwrap_err();
        assert_eq!(
            err,
            TraceError::DimensionMismatch {
                len: 12,
                width: 2,
                height: 2
            }
        );
    }

    #[test]
    fn test_load_image_round_trip_through_png() {
        let path = std::env::temp_dir().join("lumatrace_image_processor_test.png");
        let mut buffer = image::RgbaImage::new(3, 2);
        buffer.put_pixel(1, 0, image::Rgba([200, 100, 50, 255]));
        buffer.save(&path).unwrap();

        let img = load_image(&path).unwrap();
        assert_eq!(img.width, 3);
        assert_eq!(img.height, 2);
        assert_eq!(img.pixels[1], RGBA8::new(200, 100, 50, 255));
        assert_eq!(img.pixels[0], RGBA8::new(0, 0, 0, 0));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_image_fails() {
        let result = load_image(std::path::Path::new("/definitely/not/here.png"));
        assert!(result.is_err());
    }
}
