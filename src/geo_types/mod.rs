use geo_types::{coord, Coord};

/// Segment/segment and line/line intersection.
pub mod intersect;

/// Polyline length and resampling at fixed arc-length spacing, with tangents.
pub mod arc_length;

/// Parallel offset of a polyline with mitered joins.
pub mod offset;

/// Error bounded vertex reduction (Ramer-Douglas-Peucker).

/// Overlap test for two closed rings.
pub mod overlap;

/// A range-query quadtree over rectangles and points. Insert only.
pub mod quadtree;

/// Trims or drops geometry that wanders off the page.
pub mod clip;

/// Drawing passes to SVG documents.
pub mod svg;

/// Direction used wherever a zero-length vector has to be normalized.
pub const FALLBACK_DIRECTION: Coord<f64> = Coord { x: 1., y: 0. };

/// Treats a [`geo_types::Coord`] as a 2D vector.
pub trait CoordVector {
    /// Scalar distance between two coords.
    fn distance(&self, other: &Coord<f64>) -> f64;

    /// Length of the coord as if it were a vector.
    fn length(&self) -> f64;

    /// z component of the 3D cross product.
    fn cross(&self, other: &Coord<f64>) -> f64;

    fn dot(&self, other: &Coord<f64>) -> f64;

    /// Unit vector in the same direction, or [`FALLBACK_DIRECTION`] for a
    /// zero-length (or non-finite) vector.
    fn normalized(&self) -> Coord<f64>;

    /// The vector rotated a quarter turn: (-y, x).
    fn left_normal(&self) -> Coord<f64>;
}

impl CoordVector for Coord<f64> {
    fn distance(&self, other: &Coord<f64>) -> f64 {
        (*self - *other).length()
    }

    fn length(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    fn cross(&self, other: &Coord<f64>) -> f64 {
        self.x * other.y - self.y * other.x
    }

    fn dot(&self, other: &Coord<f64>) -> f64 {
        self.x * other.x + self.y * other.y
    }

    fn normalized(&self) -> Coord<f64> {
        let len = self.length();
        if len > 0. && len.is_finite() {
            *self / len
        } else {
            FALLBACK_DIRECTION
        }
    }

    fn left_normal(&self) -> Coord<f64> {
        coord! {x: -self.y, y: self.x}
    }
}

/// Unit vector pointing along `angle` (radians).
pub fn from_angle(angle: f64) -> Coord<f64> {
    coord! {x: angle.cos(), y: angle.sin()}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length() {
        let p = coord! {x: 10.0f64, y: 0.0f64};
        assert!((p.length() - 10.0).abs() < 0.0001)
    }

    #[test]
    fn test_distance() {
        let d = coord! {x: 10.0, y: 0.0}.distance(&coord! {x: 0.0, y: 10.0});
        assert!((d - (10.0f64.powi(2) + 10.0f64.powi(2)).sqrt()).abs() < 0.0001)
    }

    #[test]
    fn test_normalized_zero_falls_back() {
        assert_eq!(coord! {x: 0.0, y: 0.0}.normalized(), FALLBACK_DIRECTION);
        let n = coord! {x: 3.0, y: 4.0}.normalized();
        assert!((n.x - 0.6).abs() < 1e-12 && (n.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_left_normal_is_perpendicular() {
        let v = coord! {x: 2.0, y: 1.0};
        assert_eq!(v.dot(&v.left_normal()), 0.0);
        assert!(v.cross(&v.left_normal()) > 0.0);
    }
}
