use geo_types::{coord, LineString};
use noise::Perlin;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{noise_seed, unit_noise, Generator};
use crate::context::run::RunContext;
use crate::errors::GenerateError;
use crate::plotter::{DrawingPass, PageRect, Pen};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DeviateConfig {
    pub pen: Pen,
    pub margin: f64,
    pub vertical_spacing: f64,
    /// Noise frequency.
    pub delta: f64,
    /// Noise amplitude.
    pub alpha: f64,
}

impl Default for DeviateConfig {
    fn default() -> Self {
        DeviateConfig {
            pen: Pen::new(0.3, "black"),
            margin: 2.,
            vertical_spacing: 1.,
            delta: 0.006,
            alpha: 200.,
        }
    }
}

impl DeviateConfig {
    pub fn sanitized(&self) -> DeviateConfig {
        let defaults = DeviateConfig::default();
        let finite_or = |value: f64, fallback: f64| if value.is_finite() { value } else { fallback };
        DeviateConfig {
            pen: self.pen.sanitized(),
            margin: finite_or(self.margin, defaults.margin).max(0.),
            vertical_spacing: if self.vertical_spacing.is_finite() && self.vertical_spacing > 0. {
                self.vertical_spacing
            } else {
                defaults.vertical_spacing
            },
            delta: finite_or(self.delta, defaults.delta),
            alpha: finite_or(self.alpha, defaults.alpha),
        }
    }
}

impl Generator for DeviateConfig {
    fn generate(
        &self,
        page: &PageRect,
        seed: u64,
        ctx: &mut RunContext<'_>,
    ) -> Result<Vec<DrawingPass>, GenerateError> {
        let config = self.sanitized();
        let perlin = Perlin::new(noise_seed(seed));
        ctx.checkpoint("generating lines...")?;

        let mut pass = DrawingPass::new(&config.pen);
        let margin = config.margin;
        let rows = ((page.height - margin * 2.) / config.vertical_spacing).round().max(0.) as usize;
        let line_width = (page.width - margin * 4.) / 3.;

        let mut left = margin;
        for column in 0..3 {
            for row in 0..rows {
                let y = margin + row as f64 * config.vertical_spacing;
                let mut points = vec![];
                let mut i = 0.;
                while i < line_width {
                    // Flat in the middle of the column, bending more towards the ends.
                    let bend = (i / (line_width / 2.)).powi(2);
                    let n = unit_noise(
                        &perlin,
                        (left + i) * config.delta,
                        y * config.delta * 2.,
                    ) - 0.5;
                    points.push(coord! {x: left + i, y: y + bend * n * config.alpha});
                    i += 1.;
                }
                pass.push(LineString::new(points));
                ctx.tick(|| format!("column {} row {} / {}", column + 1, row, rows))?;
            }
            left += line_width + margin;
        }
        info!("Deviate drew {} lines", pass.lines.0.len());
        Ok(vec![pass])
    }
}
