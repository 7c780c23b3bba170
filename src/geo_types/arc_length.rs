use geo_types::{Coord, LineString};

use super::CoordVector;

/// A position along a polyline and the unit tangent of the segment it sits on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcSample {
    pub point: Coord<f64>,
    pub direction: Coord<f64>,
}

pub trait ArcLength {
    /// Sum of all segment lengths.
    fn arc_length(&self) -> f64;

    /// Samples taken every `step` units of arc length, starting at the first
    /// point. Zero-length segments report the fallback direction.
    fn resample(&self, step: f64) -> Vec<ArcSample>;
}

impl ArcLength for LineString<f64> {
    fn arc_length(&self) -> f64 {
        self.lines().map(|line| line.delta().length()).sum()
    }

    fn resample(&self, step: f64) -> Vec<ArcSample> {
        let mut samples = vec![];
        if !(step > 0. && step.is_finite()) || self.0.len() < 2 {
            return samples;
        }
        let mut count = 0usize;
        let mut walked = 0.;
        for line in self.lines() {
            let delta = line.delta();
            let len = delta.length();
            let direction = delta.normalized();
            loop {
                let target = count as f64 * step;
                if target > walked + len {
                    break;
                }
                let t = if len > 0. { (target - walked) / len } else { 0. };
                samples.push(ArcSample {
                    point: line.start + delta * t,
                    direction,
                });
                count += 1;
            }
            walked += len;
        }
        samples
    }
}
