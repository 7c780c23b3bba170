use std::collections::HashMap;

use geo_types::{Coord, LineString, MultiLineString};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo_types::CoordVector;

/// How far apart two consecutive strokes may be and still be drawn without
/// lifting the pen.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Copy)]
pub enum KeepdownStrategy {
    /// Only strokes that meet exactly are joined.
    #[default]
    None,
    PenWidthAuto,
    PenWidthMultiple(f64),
    Static(f64),
}

impl KeepdownStrategy {
    pub fn threshold(&self, penwidth: f64) -> f64 {
        match self {
            KeepdownStrategy::None => 0.,
            KeepdownStrategy::PenWidthAuto => 1.414f64 * penwidth,
            KeepdownStrategy::PenWidthMultiple(mul) => mul * penwidth,
            KeepdownStrategy::Static(val) => *val,
        }
    }
}

/// Line stitching: greedy nearest-endpoint ordering, then merging of strokes
/// that meet.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimizer {
    max_keepdown: f64,
}

impl Optimizer {
    pub fn new(max_keepdown: f64) -> Optimizer {
        Optimizer {
            max_keepdown: max_keepdown.max(0.),
        }
    }

    /// Orders (and where needed reverses) every line with 2+ points so each
    /// one starts at the endpoint nearest to where the previous one ended.
    /// The first line is kept first and untouched. Nothing is added, dropped
    /// or merged beyond lines that are too short to draw.
    pub fn link(&self, mls: &MultiLineString<f64>) -> MultiLineString<f64> {
        let mut lines: Vec<Option<LineString<f64>>> = mls
            .iter()
            .filter(|line| line.0.len() > 1)
            .cloned()
            .map(Some)
            .collect();
        let mut lines_out = MultiLineString::new(vec![]);
        let Some(first) = lines.first_mut().and_then(|line| line.take()) else {
            return lines_out;
        };

        let mut index = EndpointIndex::new();
        for (line_id, line) in lines.iter().enumerate().skip(1) {
            if let Some(line) = line {
                index.insert(line_id, line);
            }
        }
        lines_out.0.push(first);

        while let Some(pen) = lines_out.0.last().and_then(|line| line.0.last()).copied() {
            let Some((endpoint, line_id)) = index.take_nearest(&pen) else {
                break;
            };
            let Some(mut next_line) = lines.get_mut(line_id).and_then(|line| line.take()) else {
                continue;
            };
            if next_line.0.first() != Some(&endpoint) {
                next_line.0.reverse();
            }
            if let Some(far_end) = next_line.0.last() {
                index.detach(far_end, line_id);
            }
            lines_out.0.push(next_line);
        }
        debug!(
            "Linked {} lines, pen-up travel {:.2} -> {:.2}",
            lines_out.0.len(),
            travel_distance(mls),
            travel_distance(&lines_out)
        );
        lines_out
    }

    /// Joins consecutive lines whose gap is at most the keep-down distance.
    /// Where the gap is exactly zero the duplicated joint point is dropped.
    pub fn merge(&self, mls: &MultiLineString<f64>) -> MultiLineString<f64> {
        let mut lines_out = MultiLineString::new(vec![]);
        let mut current_line: LineString<f64> = LineString::new(vec![]);
        for source_line in mls.0.iter() {
            let Some(source_start) = source_line.0.first() else {
                continue;
            };
            match current_line.0.last().copied() {
                None => current_line.0.extend_from_slice(&source_line.0),
                Some(last) if last == *source_start => {
                    current_line.0.extend_from_slice(&source_line.0[1..])
                }
                Some(last) if last.distance(source_start) <= self.max_keepdown => {
                    current_line.0.extend_from_slice(&source_line.0)
                }
                Some(_) => {
                    lines_out.0.push(current_line);
                    current_line = source_line.clone();
                }
            }
        }
        if !current_line.0.is_empty() {
            lines_out.0.push(current_line)
        }
        lines_out
    }

    /// [`Optimizer::link`] followed by [`Optimizer::merge`].
    pub fn optimize(&self, mls: &MultiLineString<f64>) -> MultiLineString<f64> {
        self.merge(&self.link(mls))
    }
}

/// Total pen-up distance between the end of each line and the start of the next.
pub fn travel_distance(mls: &MultiLineString<f64>) -> f64 {
    mls.0
        .windows(2)
        .filter_map(|pair| match (pair[0].0.last(), pair[1].0.first()) {
            (Some(end), Some(start)) => Some(end.distance(start)),
            _ => None,
        })
        .sum()
}

/// Bit-exact identity of a coordinate, with -0.0 folded into 0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EndpointKey(u64, u64);

impl From<&Coord<f64>> for EndpointKey {
    fn from(coord: &Coord<f64>) -> Self {
        EndpointKey((coord.x + 0.).to_bits(), (coord.y + 0.).to_bits())
    }
}

/// A line endpoint in the rtree. One entry per distinct coordinate, however
/// many lines end there.
#[derive(Clone, Debug, PartialEq)]
pub struct EndpointRef {
    coord: [f64; 2],
}

impl EndpointRef {
    pub fn new(coord: &Coord<f64>) -> EndpointRef {
        EndpointRef {
            coord: [coord.x, coord.y],
        }
    }
}

impl RTreeObject for EndpointRef {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coord)
    }
}

impl PointDistance for EndpointRef {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let d_x = self.coord[0] - point[0];
        let d_y = self.coord[1] - point[1];
        d_x * d_x + d_y * d_y
    }
}

/// Nearest-neighbour-and-remove index over line endpoints. Each distinct
/// coordinate carries the ids of the lines that start or end there; the
/// coordinate leaves the tree once no lines remain attached.
struct EndpointIndex {
    tree: RTree<EndpointRef>,
    lines_at: HashMap<EndpointKey, (Coord<f64>, Vec<usize>)>,
}

impl EndpointIndex {
    fn new() -> EndpointIndex {
        EndpointIndex {
            tree: RTree::new(),
            lines_at: HashMap::new(),
        }
    }

    fn insert(&mut self, line_id: usize, line: &LineString<f64>) {
        let ends = [line.0.first(), line.0.last()];
        for point in ends.into_iter().flatten() {
            let tree = &mut self.tree;
            let (_, ids) = self
                .lines_at
                .entry(EndpointKey::from(point))
                .or_insert_with(|| {
                    tree.insert(EndpointRef::new(point));
                    (*point, vec![])
                });
            ids.push(line_id);
        }
    }

    /// Pops one line attached to the endpoint nearest `point`, returning the
    /// endpoint's exact coordinate and the line id.
    fn take_nearest(&mut self, point: &Coord<f64>) -> Option<(Coord<f64>, usize)> {
        loop {
            let nearest = self.tree.nearest_neighbor(&[point.x, point.y])?.clone();
            let coord = Coord {
                x: nearest.coord[0],
                y: nearest.coord[1],
            };
            let key = EndpointKey::from(&coord);
            let popped = self.lines_at.get_mut(&key).and_then(|(_, ids)| ids.pop());
            let exhausted = self.lines_at.get(&key).map_or(true, |(_, ids)| ids.is_empty());
            if exhausted {
                self.lines_at.remove(&key);
                self.tree.remove(&nearest);
            }
            if let Some(line_id) = popped {
                return Some((coord, line_id));
            }
        }
    }

    /// Removes one attachment of `line_id` at `point`.
    fn detach(&mut self, point: &Coord<f64>, line_id: usize) {
        let key = EndpointKey::from(point);
        let Some((coord, ids)) = self.lines_at.get_mut(&key) else {
            return;
        };
        if let Some(pos) = ids.iter().position(|id| *id == line_id) {
            ids.remove(pos);
        }
        if ids.is_empty() {
            let endpoint = EndpointRef::new(coord);
            self.lines_at.remove(&key);
            self.tree.remove(&endpoint);
        }
    }
}
