//! Generators: procedures that turn a configuration record into drawing passes.
use noise::{NoiseFn, Perlin};

use crate::context::run::RunContext;
use crate::errors::GenerateError;
use crate::plotter::{DrawingPass, PageRect};

/// Noise driven line tracing with collision avoidance.
pub mod flow_field;

/// Three columns of horizontal lines, bent by noise towards their ends.
pub mod deviate;

/// Halftone spirals sampled from a photo, greyscale or CMYK.
pub mod photo_spirals;

pub trait Generator {
    /// Produces one [`DrawingPass`] per pen. Implementations must yield
    /// through `ctx` often enough that a superseded run stops promptly.
    fn generate(
        &self,
        page: &PageRect,
        seed: u64,
        ctx: &mut RunContext<'_>,
    ) -> Result<Vec<DrawingPass>, GenerateError>;
}

/// Perlin noise remapped from [-1, 1] to [0, 1].
pub fn unit_noise(perlin: &Perlin, x: f64, y: f64) -> f64 {
    ((perlin.get([x, y]) + 1.) / 2.).clamp(0., 1.)
}

/// Noise seeds are 32 bit; fold the high half in rather than dropping it.
pub fn noise_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unit_noise_range() {
        let perlin = Perlin::new(noise_seed(42));
        for i in 0..500 {
            let v = unit_noise(&perlin, i as f64 * 0.137, i as f64 * 0.071);
            assert!((0. ..=1.).contains(&v));
        }
    }

    #[test]
    fn test_noise_is_seeded() {
        let a = Perlin::new(noise_seed(1));
        let b = Perlin::new(noise_seed(1));
        assert_eq!(unit_noise(&a, 1.3, 2.7), unit_noise(&b, 1.3, 2.7));
    }
}
