//! Conversion between simulation space (meters, Y-up) and screen space
//! (pixels, Y-down).

use glam::Vec2;

/// Default simulation-to-screen scale
pub const PIXELS_PER_METER: f32 = 30.0;

/// Default canvas height in pixels, used to flip the vertical axis
pub const CANVAS_HEIGHT: f32 = 480.0;

/// Default canvas width in pixels
pub const CANVAS_WIDTH: f32 = 640.0;

/// Maps positions between the physics world and the canvas.
///
/// Holds only the two constants the transform needs, so it is `Copy` and
/// freely shared between the registry and the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pixels_per_meter: f32,
    canvas_height: f32,
}

impl CoordinateMapper {
    pub fn new(pixels_per_meter: f32, canvas_height: f32) -> Self {
        Self {
            pixels_per_meter,
            canvas_height,
        }
    }

    pub fn pixels_per_meter(&self) -> f32 {
        self.pixels_per_meter
    }

    pub fn meters_per_pixel(&self) -> f32 {
        1.0 / self.pixels_per_meter
    }

    pub fn canvas_height(&self) -> f32 {
        self.canvas_height
    }

    /// Simulation position to pixel-aligned screen position.
    ///
    /// NaN and infinite inputs propagate into the result.
    pub fn to_screen(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            (position.x * self.pixels_per_meter).round(),
            self.canvas_height - (position.y * self.pixels_per_meter).round(),
        )
    }

    /// Screen position to simulation position (inverse of [`Self::to_screen`]
    /// up to rounding).
    pub fn to_simulation(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            screen.x / self.pixels_per_meter,
            (self.canvas_height - screen.y) / self.pixels_per_meter,
        )
    }

    /// Converts a length in pixels to meters, no axis flip.
    pub fn pixels_to_meters(&self, pixels: Vec2) -> Vec2 {
        pixels / self.pixels_per_meter
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(PIXELS_PER_METER, CANVAS_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_screen_flips_and_scales() {
        let mapper = CoordinateMapper::default();
        let screen = mapper.to_screen(Vec2::new(1.0, 2.0));
        assert_eq!(screen, Vec2::new(30.0, 420.0));
    }

    #[test]
    fn test_to_screen_rounds_to_pixel_grid() {
        let mapper = CoordinateMapper::default();
        // 0.51 m * 30 = 15.3 px, 0.49 m * 30 = 14.7 px
        let screen = mapper.to_screen(Vec2::new(0.51, 0.49));
        assert_eq!(screen.x, 15.0);
        assert_eq!(screen.y, 480.0 - 15.0);
    }

    #[test]
    fn test_click_at_100_100() {
        let mapper = CoordinateMapper::default();
        let sim = mapper.to_simulation(Vec2::new(100.0, 100.0));
        assert!((sim.x - 3.333).abs() < 0.001);
        assert!((sim.y - 12.667).abs() < 0.001);
    }

    #[test]
    fn test_round_trip_within_one_pixel() {
        let mapper = CoordinateMapper::default();
        for y in (0..=480).step_by(7) {
            for x in (0..=640).step_by(11) {
                let p = Vec2::new(x as f32 + 0.25, y as f32 + 0.75);
                let back = mapper.to_screen(mapper.to_simulation(p));
                assert!((back.x - p.x).abs() <= 1.0, "x drifted for {:?}", p);
                assert!((back.y - p.y).abs() <= 1.0, "y drifted for {:?}", p);
            }
        }
    }

    #[test]
    fn test_integer_pixels_round_trip_exactly() {
        let mapper = CoordinateMapper::default();
        for p in [Vec2::ZERO, Vec2::new(320.0, 240.0), Vec2::new(639.0, 479.0)] {
            assert_eq!(mapper.to_screen(mapper.to_simulation(p)), p);
        }
    }

    #[test]
    fn test_non_finite_inputs_propagate() {
        let mapper = CoordinateMapper::default();
        let nan = mapper.to_screen(Vec2::new(f32::NAN, f32::NAN));
        assert!(nan.x.is_nan());
        assert!(nan.y.is_nan());

        let inf = mapper.to_screen(Vec2::new(f32::INFINITY, f32::INFINITY));
        assert_eq!(inf.x, f32::INFINITY);
        assert_eq!(inf.y, f32::NEG_INFINITY);

        let sim = mapper.to_simulation(Vec2::new(f32::NEG_INFINITY, f32::NAN));
        assert_eq!(sim.x, f32::NEG_INFINITY);
        assert!(sim.y.is_nan());
    }

    #[test]
    fn test_custom_scale() {
        let mapper = CoordinateMapper::new(10.0, 100.0);
        assert_eq!(mapper.to_screen(Vec2::new(2.0, 3.0)), Vec2::new(20.0, 70.0));
        assert_eq!(mapper.to_simulation(Vec2::new(20.0, 70.0)), Vec2::new(2.0, 3.0));
        assert_eq!(mapper.meters_per_pixel(), 0.1);
    }
}
