use geo_types::{Coord, LineString};

use super::intersect::line_intersection;
use super::CoordVector;

pub trait ParallelOffset {
    /// Shifts the polyline `distance` along each segment's left normal.
    /// Interior vertices become the intersection of the neighbouring offset
    /// segments (a miter). When those segments are parallel the vertex is
    /// just translated along the incoming segment's normal; no miter
    /// correction is attempted.
    fn parallel_offset(&self, distance: f64) -> LineString<f64>;
}

impl ParallelOffset for LineString<f64> {
    fn parallel_offset(&self, distance: f64) -> LineString<f64> {
        let points = &self.0;
        if points.len() < 2 {
            return self.clone();
        }
        let directions: Vec<Coord<f64>> = self.lines().map(|l| l.delta().normalized()).collect();
        let normals: Vec<Coord<f64>> = directions.iter().map(|d| d.left_normal()).collect();

        let mut out = Vec::with_capacity(points.len());
        out.push(points[0] + normals[0] * distance);
        for i in 1..points.len() - 1 {
            let incoming = points[i - 1] + normals[i - 1] * distance;
            let outgoing = points[i] + normals[i] * distance;
            match line_intersection(incoming, directions[i - 1], outgoing, directions[i]) {
                Some(join) => out.push(join),
                None => out.push(points[i] + normals[i - 1] * distance),
            }
        }
        let last = points.len() - 1;
        out.push(points[last] + normals[last - 1] * distance);
        LineString::new(out)
    }
}
