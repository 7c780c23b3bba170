use geo_types::{coord, Coord, Line, LineString, MultiLineString, Rect};
use serde::{Deserialize, Serialize};

pub mod pen;
pub use pen::*;

/// The drawable area. Origin at (0,0), far corner at (width, height), in mm.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub width: f64,
    pub height: f64,
}

impl Default for PageRect {
    fn default() -> Self {
        PageRect {
            width: 300.,
            height: 400.,
        }
    }
}

impl PageRect {
    pub fn new(width: f64, height: f64) -> PageRect {
        PageRect { width, height }
    }

    pub fn rect(&self) -> Rect<f64> {
        Rect::new(coord! {x: 0., y: 0.}, coord! {x: self.width, y: self.height})
    }

    /// Inclusive of the border itself.
    pub fn contains(&self, point: &Coord<f64>) -> bool {
        point.x >= 0. && point.y >= 0. && point.x <= self.width && point.y <= self.height
    }

    /// The four page edges, walking left, bottom, right, top.
    pub fn borders(&self) -> [Line<f64>; 4] {
        let (w, h) = (self.width, self.height);
        [
            Line::new(coord! {x: 0., y: 0.}, coord! {x: 0., y: h}),
            Line::new(coord! {x: 0., y: h}, coord! {x: w, y: h}),
            Line::new(coord! {x: w, y: h}, coord! {x: w, y: 0.}),
            Line::new(coord! {x: w, y: 0.}, coord! {x: 0., y: 0.}),
        ]
    }
}

/// Everything one physical pen draws.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingPass {
    pub pen_width: f64,
    pub pen_color: String,
    pub lines: MultiLineString<f64>,
}

impl DrawingPass {
    pub fn new(pen: &Pen) -> DrawingPass {
        let pen = pen.sanitized();
        DrawingPass {
            pen_width: pen.width,
            pen_color: pen.color,
            lines: MultiLineString::new(vec![]),
        }
    }

    /// Same pen, different lines. Stages never mutate a pass in place.
    pub fn with_lines(&self, lines: MultiLineString<f64>) -> DrawingPass {
        DrawingPass {
            pen_width: self.pen_width,
            pen_color: self.pen_color.clone(),
            lines,
        }
    }

    /// Adds a line, silently dropping anything with fewer than two points.
    pub fn push(&mut self, line: LineString<f64>) {
        if line.0.len() > 1 {
            self.lines.0.push(line);
        }
    }

    pub fn point_count(&self) -> usize {
        self.lines.iter().map(|line| line.0.len()).sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_drops_degenerate_lines() {
        let mut pass = DrawingPass::new(&Pen::default());
        pass.push(LineString::new(vec![coord! {x: 1., y: 1.}]));
        pass.push(LineString::new(vec![]));
        pass.push(LineString::new(vec![coord! {x: 1., y: 1.}, coord! {x: 2., y: 2.}]));
        assert_eq!(pass.lines.0.len(), 1);
        assert_eq!(pass.point_count(), 2);
    }

    #[test]
    fn test_page_contains_border() {
        let page = PageRect::new(300., 400.);
        assert!(page.contains(&coord! {x: 0., y: 0.}));
        assert!(page.contains(&coord! {x: 300., y: 400.}));
        assert!(!page.contains(&coord! {x: 300.0001, y: 10.}));
        assert!(!page.contains(&coord! {x: 10., y: -0.0001}));
    }
}
