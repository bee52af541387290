//! Collision detection for the arcade simulators
//!
//! The obstacle game treats the body as a circle and obstacles as vertical
//! bands with an opening. The scratch cover needs per-pixel disc coverage.

use glam::Vec2;

/// A vertical band spanning the full viewport height except for an opening
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapBand {
    /// Left edge
    pub left: f32,
    /// Right edge
    pub right: f32,
    /// Top of the opening
    pub gap_top: f32,
    /// Bottom of the opening
    pub gap_bottom: f32,
}

/// True if a circle touches or crosses the top or bottom of the viewport
#[inline]
pub fn circle_hits_bounds(center: Vec2, radius: f32, height: f32) -> bool {
    center.y - radius <= 0.0 || center.y + radius >= height
}

/// True if a circle's horizontal extent overlaps the band while its vertical
/// extent is not fully inside the opening
///
/// Both tests are on the bounding box of the circle, so corners of the
/// opening are forgiving in neither direction.
pub fn circle_hits_band(center: Vec2, radius: f32, band: &GapBand) -> bool {
    let overlaps_x = center.x + radius > band.left && center.x - radius < band.right;
    if !overlaps_x {
        return false;
    }
    center.y - radius < band.gap_top || center.y + radius > band.gap_bottom
}

/// Fraction of a pixel (centered at `pixel`) covered by a disc
///
/// Linear falloff over one pixel at the rim, which is what a canvas
/// anti-aliased fill produces closely enough for coverage sampling.
#[inline]
pub fn disc_coverage(pixel: Vec2, center: Vec2, radius: f32) -> f32 {
    let dist = pixel.distance(center);
    (radius + 0.5 - dist).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band() -> GapBand {
        GapBand {
            left: 100.0,
            right: 148.0,
            gap_top: 100.0,
            gap_bottom: 250.0,
        }
    }

    #[test]
    fn test_bounds() {
        assert!(circle_hits_bounds(Vec2::new(50.0, 15.0), 15.0, 400.0));
        assert!(circle_hits_bounds(Vec2::new(50.0, 385.0), 15.0, 400.0));
        assert!(!circle_hits_bounds(Vec2::new(50.0, 200.0), 15.0, 400.0));
    }

    #[test]
    fn test_band_inside_gap() {
        assert!(!circle_hits_band(Vec2::new(120.0, 175.0), 15.0, &band()));
    }

    #[test]
    fn test_band_clips_gap_edge() {
        // Vertical extent 90..120 pokes above the opening at 100
        assert!(circle_hits_band(Vec2::new(120.0, 105.0), 15.0, &band()));
        // 235..265 pokes below 250
        assert!(circle_hits_band(Vec2::new(120.0, 250.0), 15.0, &band()));
    }

    #[test]
    fn test_band_no_horizontal_overlap() {
        assert!(!circle_hits_band(Vec2::new(50.0, 20.0), 15.0, &band()));
        assert!(!circle_hits_band(Vec2::new(170.0, 20.0), 15.0, &band()));
        // Touching edges do not count
        assert!(!circle_hits_band(Vec2::new(85.0, 20.0), 15.0, &band()));
    }

    #[test]
    fn test_disc_coverage() {
        let center = Vec2::new(10.0, 10.0);
        assert!((disc_coverage(Vec2::new(10.5, 10.5), center, 5.0) - 1.0).abs() < 1e-6);
        assert_eq!(disc_coverage(Vec2::new(30.5, 10.5), center, 5.0), 0.0);
        let rim = disc_coverage(Vec2::new(15.0, 10.0), center, 5.0);
        assert!(rim > 0.0 && rim < 1.0);
    }
}
