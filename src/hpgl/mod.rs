//! Module which provides Line->HPGL post-processing.
//!
//! Each drawing pass becomes one [`Program`]: a prelude, one pen-up move and
//! one pen-down coordinate list per stroke, and an epilog. Coordinates are
//! scaled to integer plotter units and written in (y,x) order. The directives
//! come from a [`Tera`] template set so other dialects can be plugged in with
//! [`PostMachine::Custom`].
use geo_types::{coord, MultiLineString, Rect};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::errors::PostError;

/// Scale applied when the configuration does not say otherwise.
pub const DEFAULT_UNITS_PER_MM: f64 = 40.;

/// Available plotter dialects.
pub enum PostMachine {
    Hpgl,
    Custom(Tera),
}

impl PostMachine {
    /// Template set for a dialect. A custom set must provide `prelude`,
    /// `moveto`, `lineto` and `epilog`.
    pub fn templates(self) -> Result<Tera, PostError> {
        let tera = match self {
            PostMachine::Hpgl => {
                let mut hpgl = Tera::default();
                hpgl.add_raw_templates(vec![
                    ("prelude", "IN;"),
                    ("moveto", "PU{{start.y}},{{start.x}};"),
                    (
                        "lineto",
                        "PD{% for p in points %}{{p.y}},{{p.x}}{% if not loop.last %},{% endif %}{% endfor %};",
                    ),
                    ("epilog", "PU0,0;"),
                ])?;
                hpgl
            }
            PostMachine::Custom(tera) => tera,
        };
        for name in ["prelude", "moveto", "lineto", "epilog"] {
            if !tera.get_template_names().any(|t| t == name) {
                return Err(PostError::NoSuchTemplate(name.to_string()));
            }
        }
        Ok(tera)
    }
}

/// A scaled plotter coordinate.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
struct Unit {
    x: i64,
    y: i64,
}

/// A serialized pen program for one drawing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub text: String,
    /// Extent of every emitted coordinate, in plotter units.
    pub bounds: Option<Rect<i64>>,
    pub strokes: usize,
}

impl Program {
    /// A pen-up trace around [`Program::bounds`], handy for checking paper
    /// placement before committing ink.
    pub fn frame(&self) -> Option<String> {
        let bounds = self.bounds?;
        let (min, max) = (bounds.min(), bounds.max());
        Some(format!(
            "IN;PU{},{},{},{},{},{},{},{},{},{};",
            min.y, min.x, min.y, max.x, max.y, max.x, max.y, min.x, min.y, min.x
        ))
    }

    pub fn file_name(uid: &str, part: usize) -> String {
        format!("plot-{}-{}.plt", uid, part + 1)
    }
}

fn to_units(value: f64, units_per_mm: f64) -> i64 {
    (value * units_per_mm).round() as i64
}

/// Given a set of (already linked) lines, generate a program. Lines with
/// fewer than 2 points are skipped; if none are left the result is `None`,
/// which callers treat as "nothing to export".
pub fn post(
    lines: &MultiLineString<f64>,
    units_per_mm: f64,
    post_template: &Tera,
) -> Result<Option<Program>, PostError> {
    let mut text = post_template.render("prelude", &Context::new())?;
    let mut min = coord! {x: i64::MAX, y: i64::MAX};
    let mut max = coord! {x: i64::MIN, y: i64::MIN};
    let mut strokes = 0;

    for line in lines.iter().filter(|line| line.0.len() > 1) {
        let points: Vec<Unit> = line
            .0
            .iter()
            .map(|c| Unit {
                x: to_units(c.x, units_per_mm),
                y: to_units(c.y, units_per_mm),
            })
            .collect();
        for p in points.iter() {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        let mut context = Context::new();
        context.insert("start", &points[0]);
        text.push_str(&post_template.render("moveto", &context)?);
        let mut context = Context::new();
        context.insert("points", &points[1..]);
        text.push_str(&post_template.render("lineto", &context)?);
        strokes += 1;
    }
    if strokes == 0 {
        return Ok(None);
    }
    text.push_str(&post_template.render("epilog", &Context::new())?);
    let bounds = Rect::new(min, max);
    debug!(
        "Posted {} strokes, bounds {:?} -> {:?}",
        strokes,
        bounds.min(),
        bounds.max()
    );
    Ok(Some(Program {
        text,
        bounds: Some(bounds),
        strokes,
    }))
}
