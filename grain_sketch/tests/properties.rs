//! Property-based tests for the gesture normalizer and the drawing surface.
//!
//! Uses proptest for randomized pointer positions and region geometry.

use grain_sketch::region::{DrawingRegion, RawPoint};
use grain_sketch::surface::{ColorMode, DrawingSurface};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Any pointer position, however far outside, normalizes into the unit
    /// square on both axes.
    #[test]
    fn normalize_always_lands_in_unit_square(
        ox in -500.0f32..500.0f32,
        oy in -500.0f32..500.0f32,
        w  in 1.0f32..2000.0f32,
        h  in 1.0f32..2000.0f32,
        x  in -1.0e6f32..1.0e6f32,
        y  in -1.0e6f32..1.0e6f32,
    ) {
        let region = DrawingRegion::new(ox, oy, w, h).unwrap();
        let n = region.normalize(RawPoint::new(x, y));
        prop_assert!((0.0..=1.0).contains(&n.x()), "x = {}", n.x());
        prop_assert!((0.0..=1.0).contains(&n.y()), "y = {}", n.y());
    }

    /// Points strictly inside the region map back to the same local pixel.
    #[test]
    fn inside_points_round_trip_to_local(
        fx in 0.01f32..0.99f32,
        fy in 0.01f32..0.99f32,
    ) {
        let region = DrawingRegion::new(150.0, 0.0, 650.0, 600.0).unwrap();
        let p = RawPoint::new(150.0 + fx * 650.0, fy * 600.0);
        prop_assert!(region.contains(p));
        let (lx, ly) = region.to_local(region.normalize(p));
        prop_assert!((lx - fx * 650.0).abs() < 1e-2);
        prop_assert!((ly - fy * 600.0).abs() < 1e-2);
    }

    /// The hue stays within [0, 360) however many segments are drawn.
    #[test]
    fn hue_stays_wrapped(steps in 0usize..2000, step in 0.5f32..90.0f32) {
        let mut surface = DrawingSurface::new(64, 64).with_hue_step(step);
        surface.set_color_mode(ColorMode::CyclingHue);
        for _ in 0..steps {
            surface.next_color();
        }
        prop_assert!(surface.hue() >= 0.0 && surface.hue() < 360.0);
    }

    /// Segments never write outside the surface, wherever their endpoints are.
    #[test]
    fn segments_are_clipped(
        x0 in -200.0f32..400.0f32, y0 in -200.0f32..400.0f32,
        x1 in -200.0f32..400.0f32, y1 in -200.0f32..400.0f32,
    ) {
        let mut surface = DrawingSurface::new(100, 80);
        surface.append_segment(Some((x0, y0)), (x1, y1), 0xFF00FF00, 2);
        prop_assert_eq!(surface.pixels().len(), 100 * 80);
        prop_assert!(surface.pixel(100, 0).is_none());
    }
}
