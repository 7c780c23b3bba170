use geo::Intersects;
use geo_types::{LineString, Polygon};

/// True when the two rings cross, touch, or one sits entirely inside the other.
/// Rings don't need to be explicitly closed.
pub fn polygons_overlap(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    if a.0.is_empty() || b.0.is_empty() {
        return false;
    }
    Polygon::new(a.clone(), vec![]).intersects(&Polygon::new(b.clone(), vec![]))
}
