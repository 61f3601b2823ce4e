//! The drawing region and the gesture normalizer.
//!
//! Both the ink and the synth parameters go through [`DrawingRegion::normalize`],
//! so what you see on the canvas and what you hear always agree.

/// A pointer position in window pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawPoint {
    pub x: f32,
    pub y: f32,
}

impl RawPoint {
    pub fn new(x: f32, y: f32) -> Self { RawPoint { x, y } }
}

/// A position expressed as a fraction of the region, both axes in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedPoint {
    x: f32,
    y: f32,
}

impl NormalizedPoint {
    pub fn x(&self) -> f32 { self.x }
    pub fn y(&self) -> f32 { self.y }
}

/// Immutable capture rectangle.  Width and height are always positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawingRegion {
    origin_x: f32,
    origin_y: f32,
    width:    f32,
    height:   f32,
}

impl DrawingRegion {
    /// Returns `None` unless both dimensions are finite and positive.
    pub fn new(origin_x: f32, origin_y: f32, width: f32, height: f32) -> Option<Self> {
        let valid = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0
            && origin_x.is_finite() && origin_y.is_finite();
        valid.then_some(DrawingRegion { origin_x, origin_y, width, height })
    }

    pub fn origin(&self) -> (f32, f32) { (self.origin_x, self.origin_y) }
    pub fn width(&self)  -> f32 { self.width }
    pub fn height(&self) -> f32 { self.height }

    /// Strictly inside on every edge.
    pub fn contains(&self, p: RawPoint) -> bool {
        p.x > self.origin_x
            && p.x < self.origin_x + self.width
            && p.y > self.origin_y
            && p.y < self.origin_y + self.height
    }

    /// Map to the unit square.  Points outside saturate at the edges.
    pub fn normalize(&self, p: RawPoint) -> NormalizedPoint {
        let x = (p.x - self.origin_x) / self.width;
        let y = (p.y - self.origin_y) / self.height;
        NormalizedPoint { x: saturate(x), y: saturate(y) }
    }

    /// Region-local pixel coordinates of a normalized point.
    pub fn to_local(&self, p: NormalizedPoint) -> (f32, f32) {
        (p.x * self.width, p.y * self.height)
    }
}

fn saturate(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> DrawingRegion {
        DrawingRegion::new(0.0, 0.0, 650.0, 600.0).unwrap()
    }

    fn norm(x: f32, y: f32) -> (f32, f32) {
        let n = region().normalize(RawPoint::new(x, y));
        (n.x(), n.y())
    }

    #[test]
    fn corners_and_outside() {
        assert_eq!(norm(0.0, 0.0), (0.0, 0.0));
        assert_eq!(norm(650.0, 600.0), (1.0, 1.0));
        assert_eq!(norm(-50.0, 300.0), (0.0, 0.5));
        assert_eq!(norm(10_000.0, -10_000.0), (1.0, 0.0));
    }

    #[test]
    fn offset_origin() {
        let r = DrawingRegion::new(150.0, 0.0, 650.0, 600.0).unwrap();
        let n = r.normalize(RawPoint::new(475.0, 150.0));
        assert_eq!((n.x(), n.y()), (0.5, 0.25));
        assert_eq!(r.to_local(n), (325.0, 150.0));
    }

    #[test]
    fn degenerate_regions_are_rejected() {
        assert!(DrawingRegion::new(0.0, 0.0, 0.0, 600.0).is_none());
        assert!(DrawingRegion::new(0.0, 0.0, 650.0, -1.0).is_none());
        assert!(DrawingRegion::new(0.0, 0.0, f32::NAN, 1.0).is_none());
    }

    #[test]
    fn contains_is_strict() {
        let r = DrawingRegion::new(150.0, 0.0, 650.0, 600.0).unwrap();
        assert!(r.contains(RawPoint::new(151.0, 1.0)));
        assert!(!r.contains(RawPoint::new(150.0, 300.0)));
        assert!(!r.contains(RawPoint::new(800.0, 300.0)));
        assert!(!r.contains(RawPoint::new(400.0, 0.0)));
    }

    #[test]
    fn nan_saturates_to_zero() {
        let n = region().normalize(RawPoint::new(f32::NAN, 300.0));
        assert_eq!(n.x(), 0.0);
    }
}
