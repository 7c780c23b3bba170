use geo_types::{Coord, Line, LineString, MultiLineString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::intersect::intersect;
use super::CoordVector;
use crate::plotter::{DrawingPass, PageRect};

/// What to do with lines that leave the page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overdraw {
    /// Leave everything alone.
    #[default]
    Ignore,
    /// Drop any line with a vertex off the page.
    Destroy,
    /// Cut lines at the page border, splitting them where they leave and re-enter.
    Trim,
}

pub trait PageClip {
    /// Lines with any vertex off the page are discarded, as are lines too
    /// short to draw.
    fn destroy_outside(&self, page: &PageRect) -> MultiLineString<f64>;

    /// Lines are cut at the page border. Each resulting line has its
    /// interior vertices on the page; any end that was produced by a cut is
    /// the exact border crossing.
    fn trim_to(&self, page: &PageRect) -> MultiLineString<f64>;
}

/// All page border crossings of `segment`, nearest to `segment.start` first.
fn border_crossings(page: &PageRect, segment: &Line<f64>) -> Vec<Coord<f64>> {
    let mut crossings: Vec<Coord<f64>> = page
        .borders()
        .iter()
        .filter_map(|border| intersect(segment, border))
        .collect();
    crossings.sort_by(|a, b| {
        a.distance(&segment.start)
            .partial_cmp(&b.distance(&segment.start))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    // A crossing through a corner shows up once per border.
    crossings.dedup();
    crossings
}

/// Only for crossings; vertices of the input are always kept as they are.
fn push_distinct(line: &mut Vec<Coord<f64>>, point: Coord<f64>) {
    if line.last() != Some(&point) {
        line.push(point);
    }
}

fn finish(lines: &mut Vec<LineString<f64>>, current: &mut Vec<Coord<f64>>) {
    let done = std::mem::take(current);
    if done.len() > 1 {
        lines.push(LineString::new(done));
    }
}

fn trim_line(line: &LineString<f64>, page: &PageRect, out: &mut Vec<LineString<f64>>) {
    let points = &line.0;
    let mut current: Vec<Coord<f64>> = vec![];
    let Some(first) = points.first() else {
        return;
    };
    if page.contains(first) {
        current.push(*first);
    }
    for pair in points.windows(2) {
        let (prev, point) = (pair[0], pair[1]);
        let segment = Line::new(prev, point);
        match (page.contains(&prev), page.contains(&point)) {
            (true, true) => current.push(point),
            (true, false) => {
                // Leaving. No crossing found means the vertex is just dropped.
                if let Some(exit) = border_crossings(page, &segment).first() {
                    push_distinct(&mut current, *exit);
                }
                finish(out, &mut current);
            }
            (false, true) => {
                if let Some(entry) = border_crossings(page, &segment).last() {
                    if *entry != point {
                        push_distinct(&mut current, *entry);
                    }
                }
                current.push(point);
            }
            (false, false) => {
                // Both ends off the page, but the segment may still cut a corner.
                let crossings = border_crossings(page, &segment);
                if crossings.len() > 1 {
                    out.push(LineString::new(vec![crossings[0], crossings[crossings.len() - 1]]));
                }
            }
        }
    }
    finish(out, &mut current);
}

impl PageClip for MultiLineString<f64> {
    fn destroy_outside(&self, page: &PageRect) -> MultiLineString<f64> {
        MultiLineString::new(
            self.iter()
                .filter(|line| line.0.len() > 1 && line.0.iter().all(|point| page.contains(point)))
                .cloned()
                .collect(),
        )
    }

    fn trim_to(&self, page: &PageRect) -> MultiLineString<f64> {
        let mut out = vec![];
        for line in self.iter() {
            trim_line(line, page, &mut out);
        }
        MultiLineString::new(out)
    }
}

/// Applies `overdraw` to every pass, producing new passes.
pub fn clip_passes(passes: &[DrawingPass], page: &PageRect, overdraw: Overdraw) -> Vec<DrawingPass> {
    passes
        .iter()
        .map(|pass| {
            let lines = match overdraw {
                Overdraw::Ignore => pass.lines.clone(),
                Overdraw::Destroy => pass.lines.destroy_outside(page),
                Overdraw::Trim => pass.lines.trim_to(page),
            };
            debug!(
                "Clipped pass '{}' with {:?}: {} lines in, {} out",
                pass.pen_color,
                overdraw,
                pass.lines.0.len(),
                lines.0.len()
            );
            pass.with_lines(lines)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plotter::Pen;
    use geo_types::coord;

    fn page() -> PageRect {
        PageRect::new(300., 400.)
    }

    fn on_page(point: &Coord<f64>, page: &PageRect) -> bool {
        let eps = 1e-9;
        point.x >= -eps && point.y >= -eps && point.x <= page.width + eps && point.y <= page.height + eps
    }

    #[test]
    fn test_inside_line_untouched_by_all_policies() {
        let line = LineString::new(vec![
            coord! {x: 10., y: 10.},
            coord! {x: 150., y: 200.},
            coord! {x: 290., y: 390.},
        ]);
        let mut pass = DrawingPass::new(&Pen::default());
        pass.push(line.clone());
        for overdraw in [Overdraw::Ignore, Overdraw::Destroy, Overdraw::Trim] {
            let clipped = clip_passes(&[pass.clone()], &page(), overdraw);
            assert_eq!(clipped[0].lines.0, vec![line.clone()]);
        }
    }

    #[test]
    fn test_destroy() {
        let mls = MultiLineString::new(vec![
            LineString::new(vec![coord! {x: 10., y: 10.}, coord! {x: 20., y: 20.}]),
            LineString::new(vec![coord! {x: 10., y: 10.}, coord! {x: 301., y: 20.}]),
            LineString::new(vec![coord! {x: -0.1, y: 10.}, coord! {x: 20., y: 20.}]),
        ]);
        let out = mls.destroy_outside(&page());
        assert_eq!(out.0.len(), 1);
        let stubs = MultiLineString::new(vec![
            LineString::new(vec![coord! {x: 10., y: 10.}]),
            LineString::new(vec![]),
        ]);
        assert!(stubs.destroy_outside(&page()).0.is_empty());
        assert!(out.iter().all(|l| l.0.iter().all(|p| page().contains(p))));
    }

    #[test]
    fn test_trim_keeps_repeated_vertices() {
        let line = LineString::new(vec![
            coord! {x: 10., y: 10.},
            coord! {x: 10., y: 10.},
            coord! {x: 20., y: 30.},
        ]);
        let mls = MultiLineString::new(vec![line.clone()]);
        assert_eq!(mls.trim_to(&page()).0, vec![line]);

        // Repeats survive next to a cut too, but the cut is not doubled.
        let mls = MultiLineString::new(vec![LineString::new(vec![
            coord! {x: -10., y: 50.},
            coord! {x: 0., y: 50.},
            coord! {x: 20., y: 50.},
            coord! {x: 20., y: 50.},
        ])]);
        assert_eq!(
            mls.trim_to(&page()).0[0].0,
            vec![coord! {x: 0., y: 50.}, coord! {x: 20., y: 50.}, coord! {x: 20., y: 50.}]
        );
    }

    #[test]
    fn test_trim_exit_and_reenter() {
        // Leaves through the right edge and comes back in.
        let mls = MultiLineString::new(vec![LineString::new(vec![
            coord! {x: 280., y: 10.},
            coord! {x: 290., y: 10.},
            coord! {x: 310., y: 20.},
            coord! {x: 290., y: 30.},
            coord! {x: 280., y: 30.},
        ])]);
        let out = mls.trim_to(&page());
        assert_eq!(out.0.len(), 2);
        assert_eq!(
            out.0[0].0,
            vec![coord! {x: 280., y: 10.}, coord! {x: 290., y: 10.}, coord! {x: 300., y: 15.}]
        );
        assert_eq!(
            out.0[1].0,
            vec![coord! {x: 300., y: 25.}, coord! {x: 290., y: 30.}, coord! {x: 280., y: 30.}]
        );
    }

    #[test]
    fn test_trim_first_vertex_outside() {
        let mls = MultiLineString::new(vec![LineString::new(vec![
            coord! {x: -10., y: 50.},
            coord! {x: 10., y: 50.},
            coord! {x: 20., y: 60.},
        ])]);
        let out = mls.trim_to(&page());
        assert_eq!(out.0.len(), 1);
        assert_eq!(out.0[0].0[0], coord! {x: 0., y: 50.});
        assert_eq!(out.0[0].0.len(), 3);
    }

    #[test]
    fn test_trim_corner_cut() {
        // Both ends are off the page but the segment slices across the corner.
        let mls = MultiLineString::new(vec![LineString::new(vec![
            coord! {x: -10., y: 20.},
            coord! {x: 20., y: -10.},
        ])]);
        let out = mls.trim_to(&page());
        assert_eq!(out.0.len(), 1);
        assert_eq!(out.0[0].0.len(), 2);
        assert!(out.0[0].0[0].distance(&coord! {x: 0., y: 10.}) < 1e-9);
        assert!(out.0[0].0[1].distance(&coord! {x: 10., y: 0.}) < 1e-9);
    }

    #[test]
    fn test_trim_entirely_outside_and_short_leftovers() {
        let mls = MultiLineString::new(vec![
            LineString::new(vec![coord! {x: -10., y: -10.}, coord! {x: -20., y: -5.}]),
            // Only one vertex inside; after trimming it is still a 2 point line.
            LineString::new(vec![coord! {x: 5., y: 5.}, coord! {x: -5., y: 5.}]),
        ]);
        let out = mls.trim_to(&page());
        assert_eq!(out.0.len(), 1);
        assert_eq!(out.0[0].0, vec![coord! {x: 5., y: 5.}, coord! {x: 0., y: 5.}]);
    }

    #[test]
    fn test_trim_interior_vertices_on_page() {
        let mls = MultiLineString::new(vec![LineString::new(
            (0..200)
                .map(|i| {
                    let t = i as f64 * 0.1;
                    coord! {x: 150. + 200. * t.cos(), y: 200. + 250. * (t * 1.3).sin()}
                })
                .collect(),
        )]);
        let out = mls.trim_to(&page());
        assert!(out.0.len() > 1);
        for line in out.iter() {
            assert!(line.0.len() > 1);
            for point in line.0.iter() {
                assert!(on_page(point, &page()));
            }
            for point in &line.0[1..line.0.len() - 1] {
                assert!(page().contains(point));
            }
        }
    }
}
