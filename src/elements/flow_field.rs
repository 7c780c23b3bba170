use std::f64::consts::PI;

use geo::simplify::Simplify;
use geo::BoundingRect;
use geo_types::{coord, Coord, LineString, Rect};
use noise::Perlin;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{noise_seed, unit_noise, Generator};
use crate::context::run::RunContext;
use crate::errors::GenerateError;
use crate::geo_types::arc_length::ArcLength;
use crate::geo_types::offset::ParallelOffset;
use crate::geo_types::overlap::polygons_overlap;
use crate::geo_types::quadtree::{QuadTree, SpatialEntry};
use crate::geo_types::{from_angle, CoordVector};
use crate::plotter::{DrawingPass, PageRect, Pen};

/// What gets drawn for each traced path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TraceVariant {
    /// The simplified centerline.
    Lines,
    /// A closed outline around the centerline, `min_width..=max_width` wide
    /// (picked per line), optionally hatched across with strokes every
    /// `fill_spacing`. Later lines keep clear of squares `footprint_spacing`
    /// apart along the outline's spine.
    Rectangles {
        min_width: f64,
        max_width: f64,
        fill: bool,
        fill_spacing: f64,
        footprint_spacing: f64,
    },
}

impl Default for TraceVariant {
    fn default() -> Self {
        TraceVariant::Lines
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FlowFieldConfig {
    pub pens: Vec<Pen>,
    /// Number of seed points tried. Lines that die immediately are dropped,
    /// so this is an upper bound on the output.
    pub attempts: usize,
    pub noise_spread: f64,
    /// Half turns swept across the noise range.
    pub folds: f64,
    pub destroy_on_collision: bool,
    pub collision_radius: f64,
    /// Ceiling on steps per growth direction.
    pub max_iterations: usize,
    pub max_length: Option<f64>,
    pub simplify_tolerance: f64,
    pub variant: TraceVariant,
}

impl Default for FlowFieldConfig {
    fn default() -> Self {
        FlowFieldConfig {
            pens: vec![Pen::default()],
            attempts: 1000,
            noise_spread: 100.,
            folds: 4.,
            destroy_on_collision: false,
            collision_radius: 0.2,
            max_iterations: 1000,
            max_length: None,
            simplify_tolerance: 0.05,
            variant: TraceVariant::Lines,
        }
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0. {
        value
    } else {
        fallback
    }
}

impl FlowFieldConfig {
    /// Same config with every unusable value replaced by its default.
    pub fn sanitized(&self) -> FlowFieldConfig {
        let defaults = FlowFieldConfig::default();
        let pens = if self.pens.is_empty() {
            defaults.pens.clone()
        } else {
            self.pens.iter().map(|pen| pen.sanitized()).collect()
        };
        let variant = match &self.variant {
            TraceVariant::Lines => TraceVariant::Lines,
            TraceVariant::Rectangles {
                min_width,
                max_width,
                fill,
                fill_spacing,
                footprint_spacing,
            } => {
                let min_width = positive_or(*min_width, 1.);
                let max_width = positive_or(*max_width, min_width).max(min_width);
                TraceVariant::Rectangles {
                    min_width,
                    max_width,
                    fill: *fill,
                    fill_spacing: positive_or(*fill_spacing, 0.5),
                    footprint_spacing: positive_or(*footprint_spacing, 0.5),
                }
            }
        };
        FlowFieldConfig {
            pens,
            attempts: self.attempts,
            noise_spread: positive_or(self.noise_spread, defaults.noise_spread),
            folds: if self.folds.is_finite() {
                self.folds
            } else {
                defaults.folds
            },
            destroy_on_collision: self.destroy_on_collision,
            collision_radius: positive_or(self.collision_radius, defaults.collision_radius),
            max_iterations: self.max_iterations,
            max_length: self.max_length.filter(|len| len.is_finite() && *len > 0.),
            simplify_tolerance: if self.simplify_tolerance.is_finite() {
                self.simplify_tolerance.max(0.)
            } else {
                defaults.simplify_tolerance
            },
            variant,
        }
    }
}

/// Angle (radians) of travel at a point.
pub trait DirectionField {
    fn angle(&self, point: &Coord<f64>) -> f64;
}

impl<F> DirectionField for F
where
    F: Fn(&Coord<f64>) -> f64,
{
    fn angle(&self, point: &Coord<f64>) -> f64 {
        self(point)
    }
}

/// Perlin noise sampled at `point / spread`, mapped onto `0..PI * folds`.
pub struct PerlinField {
    perlin: Perlin,
    spread: f64,
    folds: f64,
}

impl PerlinField {
    pub fn new(seed: u64, spread: f64, folds: f64) -> PerlinField {
        PerlinField {
            perlin: Perlin::new(noise_seed(seed)),
            spread,
            folds,
        }
    }
}

impl DirectionField for PerlinField {
    fn angle(&self, point: &Coord<f64>) -> f64 {
        unit_noise(&self.perlin, point.x / self.spread, point.y / self.spread) * PI * self.folds
    }
}

/// Grows paths through a [`DirectionField`] and keeps track of everything
/// already committed so new paths can steer clear of it.
pub struct FieldTracer<F> {
    field: F,
    page: PageRect,
    config: FlowFieldConfig,
    footprint: QuadTree<()>,
    outlines: QuadTree<usize>,
    outline_rings: Vec<LineString<f64>>,
    passes: Vec<DrawingPass>,
    rng: SmallRng,
}

impl<F: DirectionField> FieldTracer<F> {
    pub fn new(field: F, page: PageRect, config: FlowFieldConfig, seed: u64) -> FieldTracer<F> {
        let config = config.sanitized();
        let passes = config.pens.iter().map(DrawingPass::new).collect();
        FieldTracer {
            field,
            page,
            footprint: QuadTree::new(page.rect()),
            outlines: QuadTree::new(page.rect()),
            outline_rings: vec![],
            passes,
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn footprint(&self) -> &QuadTree<()> {
        &self.footprint
    }

    pub fn passes(&self) -> &[DrawingPass] {
        &self.passes
    }

    fn on_page(&self, point: &Coord<f64>) -> bool {
        point.x >= 0. && point.y >= 0. && point.x < self.page.width && point.y < self.page.height
    }

    fn collides(&self, point: &Coord<f64>) -> bool {
        let radius = self.config.collision_radius;
        let query = Rect::new(
            coord! {x: point.x - radius, y: point.y - radius},
            coord! {x: point.x + radius, y: point.y + radius},
        );
        self.footprint
            .any(&query, |entry| entry.distance_2(point) < radius * radius)
    }

    /// True when a path may not step onto `candidate` having drawn `length`.
    fn is_dead(&self, candidate: &Coord<f64>, length: f64) -> bool {
        !self.on_page(candidate)
            || self.config.max_length.is_some_and(|max| length > max)
            || (self.config.destroy_on_collision && self.collides(candidate))
    }

    /// Steps from `start` along the field (or against it, for a negative
    /// `sign`), appending every surviving point to `line`.
    fn grow(&self, line: &mut Vec<Coord<f64>>, start: Coord<f64>, sign: f64, length: &mut f64) {
        let mut particle = start;
        for _ in 0..self.config.max_iterations {
            let step = from_angle(self.field.angle(&particle)).normalized() * sign;
            let candidate = particle + step;
            let walked = *length + step.length();
            if self.is_dead(&candidate, walked) {
                break;
            }
            *length = walked;
            particle = candidate;
            line.push(particle);
        }
    }

    /// Grows a path forward from `seed`, then backward from the first point
    /// of that growth. `None` when the very first step forward is already dead.
    pub fn trace(&self, seed: Coord<f64>) -> Option<LineString<f64>> {
        let mut line = vec![];
        let mut length = 0.;
        self.grow(&mut line, seed, 1., &mut length);
        let head = *line.first()?;
        line.reverse();
        self.grow(&mut line, head, -1., &mut length);
        Some(LineString::new(line))
    }

    /// Adds a traced path to a random pen and registers its footprint.
    /// Returns false if it was dropped instead.
    pub fn commit(&mut self, line: LineString<f64>) -> bool {
        if line.0.len() < 2 {
            return false;
        }
        let simplified = line.simplify(&self.config.simplify_tolerance);
        let pen = self.rng.gen_range(0..self.passes.len());
        match self.config.variant.clone() {
            TraceVariant::Lines => {
                self.passes[pen].push(simplified);
                for point in line.0.iter() {
                    self.footprint.insert(SpatialEntry::point(*point, ()));
                }
            }
            TraceVariant::Rectangles {
                min_width,
                max_width,
                fill,
                fill_spacing,
                footprint_spacing,
            } => {
                let width = if max_width > min_width {
                    self.rng.gen_range(min_width..=max_width)
                } else {
                    min_width
                };
                let half = width / 2.;
                let outline = outline(&simplified, half);
                if self.config.destroy_on_collision && self.overlaps_outline(&outline) {
                    return false;
                }
                if let Some(bounds) = outline.bounding_rect() {
                    self.outlines
                        .insert(SpatialEntry { rect: bounds, payload: self.outline_rings.len() });
                    self.outline_rings.push(outline.clone());
                }
                self.passes[pen].push(outline);
                if fill {
                    for sample in simplified.resample(fill_spacing) {
                        let across = sample.direction.left_normal() * half;
                        self.passes[pen]
                            .push(LineString::new(vec![sample.point + across, sample.point - across]));
                    }
                }
                for sample in line.resample(footprint_spacing) {
                    let p = sample.point;
                    self.footprint
                        .insert(SpatialEntry::rect(p.x - half, p.y - half, width, width, ()));
                }
            }
        }
        true
    }

    fn overlaps_outline(&self, outline: &LineString<f64>) -> bool {
        let Some(bounds) = outline.bounding_rect() else {
            return false;
        };
        self.outlines.any(&bounds, |entry| {
            self.outline_rings
                .get(entry.payload)
                .is_some_and(|ring| polygons_overlap(ring, outline))
        })
    }

    fn random_seed(&mut self) -> Coord<f64> {
        coord! {
            x: self.rng.gen::<f64>() * self.page.width,
            y: self.rng.gen::<f64>() * self.page.height,
        }
    }

    /// Traces `attempts` random seeds, yielding through `ctx` between seeds.
    pub fn run(mut self, ctx: &mut RunContext<'_>) -> Result<Vec<DrawingPass>, GenerateError> {
        let attempts = self.config.attempts;
        debug!(
            "Tracing {} seeds on {}x{} with {} pens",
            attempts,
            self.page.width,
            self.page.height,
            self.passes.len()
        );
        ctx.checkpoint(&format!("0 / {}", attempts))?;
        let mut committed = 0;
        for i in 0..attempts {
            let seed = self.random_seed();
            if let Some(line) = self.trace(seed) {
                if self.commit(line) {
                    committed += 1;
                }
            }
            ctx.tick(|| format!("{} / {}", i, attempts))?;
        }
        info!(
            "Flow field committed {} of {} seeds, {} footprint entries",
            committed,
            attempts,
            self.footprint.len()
        );
        Ok(self.passes)
    }
}

/// Closed ring `half` either side of `spine`.
fn outline(spine: &LineString<f64>, half: f64) -> LineString<f64> {
    let mut ring = spine.parallel_offset(half).0;
    let mut right = spine.parallel_offset(-half).0;
    right.reverse();
    ring.extend(right);
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    LineString::new(ring)
}

impl Generator for FlowFieldConfig {
    fn generate(
        &self,
        page: &PageRect,
        seed: u64,
        ctx: &mut RunContext<'_>,
    ) -> Result<Vec<DrawingPass>, GenerateError> {
        let field = PerlinField::new(seed, self.noise_spread, self.folds);
        FieldTracer::new(field, *page, self.clone(), seed).run(ctx)
    }
}
