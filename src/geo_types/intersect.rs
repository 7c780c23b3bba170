use geo_types::{Coord, Line};

use super::CoordVector;

/// Cross products smaller than this are treated as parallel.
pub const PARALLEL_EPSILON: f64 = 1e-8;

/// Intersection point of two segments, or `None` when they are parallel or
/// the crossing lies outside either segment.
pub fn intersect(a: &Line<f64>, b: &Line<f64>) -> Option<Coord<f64>> {
    let r = a.delta();
    let s = b.delta();
    let denom = r.cross(&s);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let qp = b.start - a.start;
    let t = qp.cross(&s) / denom;
    let u = qp.cross(&r) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some(a.start + r * t)
}

/// Intersection of two infinite lines given as a point and a direction each.
pub fn line_intersection(
    a_start: Coord<f64>,
    a_dir: Coord<f64>,
    b_start: Coord<f64>,
    b_dir: Coord<f64>,
) -> Option<Coord<f64>> {
    let denom = a_dir.cross(&b_dir);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (b_start - a_start).cross(&b_dir) / denom;
    Some(a_start + a_dir * t)
}

#[cfg(test)]
mod test {
    use super::*;
    use geo_types::coord;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Line<f64> {
        Line::new(coord! {x: x0, y: y0}, coord! {x: x1, y: y1})
    }

    #[test]
    fn test_crossing_segments() {
        let hit = intersect(&seg(0., 0., 10., 10.), &seg(0., 10., 10., 0.))
            .expect("Diagonals should cross");
        assert!((hit.x - 5.).abs() < 1e-12 && (hit.y - 5.).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let a = seg(1.3, -2.0, 7.7, 4.1);
        let b = seg(0.0, 3.3, 9.2, -1.4);
        let ab = intersect(&a, &b).unwrap();
        let ba = intersect(&b, &a).unwrap();
        assert!(ab.distance(&ba) < 1e-9);
    }

    #[test]
    fn test_parallel_is_none() {
        assert!(intersect(&seg(0., 0., 10., 0.), &seg(0., 1., 10., 1.)).is_none());
        assert!(intersect(&seg(0., 0., 10., 0.), &seg(2., 0., 12., 0.)).is_none());
    }

    #[test]
    fn test_out_of_range() {
        // The infinite lines cross at (5, 5) but the second segment stops short.
        assert!(intersect(&seg(0., 0., 10., 10.), &seg(0., 10., 4., 6.)).is_none());
    }

    #[test]
    fn test_touching_endpoint_counts() {
        let hit = intersect(&seg(0., 0., 10., 0.), &seg(10., 0., 10., 10.)).unwrap();
        assert_eq!(hit, coord! {x: 10., y: 0.});
    }

    #[test]
    fn test_line_intersection() {
        let hit = line_intersection(
            coord! {x: 0., y: 1.},
            coord! {x: 1., y: 0.},
            coord! {x: 3., y: -5.},
            coord! {x: 0., y: 2.},
        )
        .unwrap();
        assert!(hit.distance(&coord! {x: 3., y: 1.}) < 1e-12);
    }
}
