use std::f64::consts::PI;
use std::path::PathBuf;

use geo_types::{coord, Coord, LineString};
use image::RgbImage;
use noise::Perlin;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{noise_seed, unit_noise, Generator};
use crate::context::run::RunContext;
use crate::errors::GenerateError;
use crate::plotter::{DrawingPass, PageRect, Pen};

const SEGMENTS_PER_LOOP: f64 = 20.;

/// Grid rotation (degrees) and darkness bias (-1 to 1) for one ink.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ChannelConfig {
    pub rotation: f64,
    pub modifier: f64,
}

impl ChannelConfig {
    pub fn new(rotation: f64) -> ChannelConfig {
        ChannelConfig {
            rotation,
            modifier: 0.,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PhotoSpiralsConfig {
    pub image: PathBuf,
    /// Four passes (cyan, magenta, yellow, black) instead of one greyscale pass.
    pub cmyk: bool,
    /// Colour is ignored in CMYK mode.
    pub pen: Pen,
    pub spiral_radius: f64,
    pub spiral_gap: f64,
    /// Greyscale only: light areas get the big spirals.
    pub inverted: bool,
    pub cyan: ChannelConfig,
    pub magenta: ChannelConfig,
    pub yellow: ChannelConfig,
    /// Also the greyscale channel.
    pub black: ChannelConfig,
}

impl Default for PhotoSpiralsConfig {
    fn default() -> Self {
        PhotoSpiralsConfig {
            image: PathBuf::from("photo.jpg"),
            cmyk: true,
            pen: Pen::new(0.3, "black"),
            spiral_radius: 1.5,
            spiral_gap: 0.5,
            inverted: false,
            cyan: ChannelConfig::new(22.),
            magenta: ChannelConfig::new(33.),
            yellow: ChannelConfig::new(44.),
            black: ChannelConfig::new(11.),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ink {
    Grey,
    Cyan,
    Magenta,
    Yellow,
    Black,
}

impl Ink {
    fn color(&self) -> &'static str {
        match self {
            Ink::Grey | Ink::Black => "black",
            Ink::Cyan => "cyan",
            Ink::Magenta => "magenta",
            Ink::Yellow => "yellow",
        }
    }
}

/// The photo scaled to cover the page, sampled in page coordinates.
struct CoverFit<'i> {
    image: &'i RgbImage,
    ratio: f64,
    shift: Coord<f64>,
}

impl<'i> CoverFit<'i> {
    fn new(image: &'i RgbImage, page: &PageRect) -> CoverFit<'i> {
        let (w, h) = (image.width() as f64, image.height() as f64);
        let ratio = (page.width / w).max(page.height / h);
        CoverFit {
            image,
            ratio,
            shift: coord! {x: (page.width - w * ratio) / 2., y: (page.height - h * ratio) / 2.},
        }
    }

    fn rgb(&self, point: &Coord<f64>) -> [f64; 3] {
        let max_x = self.image.width().saturating_sub(1) as f64;
        let max_y = self.image.height().saturating_sub(1) as f64;
        let px = ((point.x - self.shift.x) / self.ratio).floor().clamp(0., max_x);
        let py = ((point.y - self.shift.y) / self.ratio).floor().clamp(0., max_y);
        let [r, g, b] = self.image.get_pixel(px as u32, py as u32).0;
        [r as f64 / 255., g as f64 / 255., b as f64 / 255.]
    }

    /// How much ink `ink` wants at `point`, 0 to 1.
    fn darkness(&self, point: &Coord<f64>, ink: Ink, inverted: bool) -> f64 {
        let [r, g, b] = self.rgb(point);
        if ink == Ink::Grey {
            let luminance = 0.2125 * r + 0.7154 * g + 0.0721 * b;
            return if inverted { luminance } else { 1. - luminance };
        }
        let (c, m, y) = (1. - r, 1. - g, 1. - b);
        let k = c.min(m).min(y);
        let pure = |v: f64| {
            let v = (v - k) / (1. - k);
            if v.is_nan() {
                0.
            } else {
                v
            }
        };
        match ink {
            Ink::Cyan => pure(c),
            Ink::Magenta => pure(m),
            Ink::Yellow => pure(y),
            _ => k,
        }
    }
}

impl PhotoSpiralsConfig {
    pub fn sanitized(&self) -> PhotoSpiralsConfig {
        let positive_or = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0. {
                value
            } else {
                fallback
            }
        };
        let channel = |c: &ChannelConfig| ChannelConfig {
            rotation: if c.rotation.is_finite() { c.rotation } else { 0. },
            modifier: if c.modifier.is_finite() {
                c.modifier.clamp(-1., 1.)
            } else {
                0.
            },
        };
        PhotoSpiralsConfig {
            image: self.image.clone(),
            cmyk: self.cmyk,
            pen: self.pen.sanitized(),
            spiral_radius: positive_or(self.spiral_radius, 1.),
            spiral_gap: positive_or(self.spiral_gap, 0.1),
            inverted: self.inverted,
            cyan: channel(&self.cyan),
            magenta: channel(&self.magenta),
            yellow: channel(&self.yellow),
            black: channel(&self.black),
        }
    }

    fn inks(&self) -> Vec<(Ink, ChannelConfig)> {
        if self.cmyk {
            vec![
                (Ink::Cyan, self.cyan),
                (Ink::Magenta, self.magenta),
                (Ink::Yellow, self.yellow),
                (Ink::Black, self.black),
            ]
        } else {
            vec![(Ink::Grey, self.black)]
        }
    }

    /// Spirals for an already decoded photo.
    pub fn spirals(
        &self,
        photo: &RgbImage,
        page: &PageRect,
        seed: u64,
        ctx: &mut RunContext<'_>,
    ) -> Result<Vec<DrawingPass>, GenerateError> {
        let config = self.sanitized();
        if photo.width() == 0 || photo.height() == 0 {
            return Err(ctx.abandon("Unable to load image"));
        }
        let fit = CoverFit::new(photo, page);
        let perlin = Perlin::new(noise_seed(seed));

        let radius = config.spiral_radius;
        let loops = radius / (config.pen.width + config.spiral_gap);
        let steps = SEGMENTS_PER_LOOP * loops;
        let diagonal = (page.width.powi(2) + page.height.powi(2)).sqrt();
        let start = coord! {x: (page.width - diagonal) / 2., y: (page.height - diagonal) / 2.};
        let center = coord! {x: page.width / 2., y: page.height / 2.};

        let mut passes = vec![];
        for (ink, channel) in config.inks() {
            let pen = if ink == Ink::Grey {
                config.pen.clone()
            } else {
                Pen::new(config.pen.width, ink.color())
            };
            let mut pass = DrawingPass::new(&pen);
            let (sin, cos) = channel.rotation.to_radians().sin_cos();
            let bias = 1. - channel.modifier;

            let mut y = start.y;
            while y < page.height - start.y {
                let mut x = start.x;
                while x < page.width - start.x {
                    let (dx, dy) = (x - center.x, y - center.y);
                    let p = coord! {x: dx * cos - dy * sin + center.x, y: dx * sin + dy * cos + center.y};
                    x += radius * 2.;
                    if !page.contains(&p) {
                        continue;
                    }
                    let amount = fit.darkness(&p, ink, config.inverted) * bias + (1. - bias);
                    let mut angle = unit_noise(&perlin, p.x / 200., p.y / 200.) * 2. * PI;
                    let mut points = vec![];
                    let mut i = 0.;
                    while i <= steps * amount {
                        let rr = (i / steps) * radius;
                        angle += 2. * PI / SEGMENTS_PER_LOOP;
                        points.push(coord! {x: p.x + rr * angle.cos(), y: p.y + rr * angle.sin()});
                        i += 1.;
                    }
                    pass.push(LineString::new(points));
                }
                ctx.tick(|| format!("{} row {:.0} / {:.0}", ink.color(), y - start.y, diagonal))?;
                y += radius * 2.;
            }
            passes.push(pass);
        }
        info!(
            "Photo spirals: {} passes, {} spirals",
            passes.len(),
            passes.iter().map(|p| p.lines.0.len()).sum::<usize>()
        );
        Ok(passes)
    }
}

impl Generator for PhotoSpiralsConfig {
    fn generate(
        &self,
        page: &PageRect,
        seed: u64,
        ctx: &mut RunContext<'_>,
    ) -> Result<Vec<DrawingPass>, GenerateError> {
        ctx.checkpoint("generating spirals")?;
        let photo = match image::open(&self.image) {
            Ok(photo) => photo.to_rgb8(),
            Err(err) => {
                warn!("Could not open {}: {}", self.image.display(), err);
                return Err(ctx.abandon("Unable to load image"));
            }
        };
        self.spirals(&photo, page, seed, ctx)
    }
}
