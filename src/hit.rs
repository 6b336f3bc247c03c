//! Pixel-accurate hit testing against a sprite's ink.

use image::RgbaImage;

/// Alpha a pixel must exceed to count as ink.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 10;

/// Tests points against a sprite drawn at some display size.
#[derive(Debug, Clone, Copy)]
pub struct HitTester<'a> {
    sprite: &'a RgbaImage,
    display: (f64, f64),
    threshold: u8,
}

impl<'a> HitTester<'a> {
    /// A tester for `sprite` displayed at its natural size.
    pub fn new(sprite: &'a RgbaImage) -> Self {
        Self {
            sprite,
            display: (sprite.width() as f64, sprite.height() as f64),
            threshold: DEFAULT_ALPHA_THRESHOLD,
        }
    }

    /// Size the sprite is drawn at. Points are given in this space.
    pub fn with_display_size(mut self, width: f64, height: f64) -> Self {
        self.display = (width, height);
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    /// Raster pixel under a display-space point, or `None` outside the raster.
    ///
    /// Coordinates are scaled by `raster / display` and truncated toward zero.
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<(u32, u32)> {
        let (dw, dh) = self.display;
        if !(x.is_finite() && y.is_finite()) || !(dw > 0.0 && dh > 0.0) {
            return None;
        }
        let (w, h) = self.sprite.dimensions();
        let px = (x * w as f64 / dw).trunc();
        let py = (y * h as f64 / dh).trunc();
        if px < 0.0 || py < 0.0 || px >= w as f64 || py >= h as f64 {
            return None;
        }
        Some((px as u32, py as u32))
    }

    /// Whether the point lands on a pixel whose alpha exceeds the threshold.
    pub fn is_over_ink(&self, x: f64, y: f64) -> bool {
        self.pixel_at(x, y)
            .map(|(px, py)| self.sprite.get_pixel(px, py)[3] > self.threshold)
            .unwrap_or(false)
    }
}

/// [`HitTester::is_over_ink`] at natural size with the default threshold.
pub fn is_over_ink(sprite: &RgbaImage, x: f64, y: f64) -> bool {
    HitTester::new(sprite).is_over_ink(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sprite() -> RgbaImage {
        // Left half ink, right half faint
        RgbaImage::from_fn(4, 2, |x, _| if x < 2 { Rgba([0, 0, 0, 200]) } else { Rgba([0, 0, 0, 10]) })
    }

    #[test]
    fn test_natural_size() {
        let s = sprite();
        assert!(is_over_ink(&s, 0.0, 0.0));
        assert!(is_over_ink(&s, 1.9, 1.9));
        assert!(!is_over_ink(&s, 2.0, 0.0));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let s = sprite();
        assert!(!HitTester::new(&s).is_over_ink(3.0, 1.0));
        assert!(HitTester::new(&s).with_threshold(9).is_over_ink(3.0, 1.0));
    }

    #[test]
    fn test_display_scaling() {
        let s = sprite();
        let tester = HitTester::new(&s).with_display_size(40.0, 20.0);
        assert_eq!(tester.pixel_at(19.0, 19.0), Some((1, 1)));
        assert_eq!(tester.pixel_at(20.0, 0.0), Some((2, 0)));
        assert!(tester.is_over_ink(19.0, 5.0));
        assert!(!tester.is_over_ink(25.0, 5.0));
    }

    #[test]
    fn test_outside_raster_is_a_miss() {
        let s = sprite();
        let tester = HitTester::new(&s);
        assert_eq!(tester.pixel_at(4.0, 0.0), None);
        assert_eq!(tester.pixel_at(0.0, 2.0), None);
        assert_eq!(tester.pixel_at(-1.0, 0.0), None);
        assert!(!tester.is_over_ink(100.0, 100.0));
    }

    #[test]
    fn test_truncates_toward_zero() {
        let s = sprite();
        assert_eq!(HitTester::new(&s).pixel_at(-0.5, 0.5), Some((0, 0)));
    }

    #[test]
    fn test_zero_display_size() {
        let s = sprite();
        assert!(!HitTester::new(&s).with_display_size(0.0, 10.0).is_over_ink(0.0, 0.0));
    }

    #[test]
    fn test_non_finite_point_is_a_miss() {
        let s = sprite();
        let tester = HitTester::new(&s);
        assert_eq!(tester.pixel_at(f64::NAN, 0.0), None);
        assert_eq!(tester.pixel_at(0.0, f64::NAN), None);
        assert_eq!(tester.pixel_at(f64::INFINITY, 0.0), None);
        assert!(!tester.is_over_ink(f64::NAN, f64::NAN));
        assert_eq!(HitTester::new(&s).with_display_size(f64::NAN, 2.0).pixel_at(0.0, 0.0), None);
    }
}
