//! Plot configuration, stored as RON.
//!
//! Every field has a default so partial documents load, and
//! [`PlotConfig::sanitized`] replaces anything unusable with a fallback
//! instead of failing the run.
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::context::run::RunContext;
use crate::elements::deviate::DeviateConfig;
use crate::elements::flow_field::FlowFieldConfig;
use crate::elements::photo_spirals::PhotoSpiralsConfig;
use crate::elements::Generator;
use crate::errors::{ConfigError, GenerateError};
use crate::geo_types::clip::Overdraw;
use crate::hpgl::DEFAULT_UNITS_PER_MM;
use crate::optimizer::KeepdownStrategy;
use crate::plotter::{parse_css_color, DrawingPass, PageRect};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
    /// Preview background only; never plotted.
    pub color: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        let page = PageRect::default();
        PageConfig {
            width: page.width,
            height: page.height,
            color: "white".to_string(),
        }
    }
}

/// One variant per generator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum GeneratorConfig {
    FlowField(FlowFieldConfig),
    Deviate(DeviateConfig),
    PhotoSpirals(PhotoSpiralsConfig),
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::FlowField(FlowFieldConfig::default())
    }
}

impl GeneratorConfig {
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorConfig::FlowField(_) => "flow field",
            GeneratorConfig::Deviate(_) => "deviate",
            GeneratorConfig::PhotoSpirals(_) => "photo spirals",
        }
    }

    pub fn sanitized(&self) -> GeneratorConfig {
        match self {
            GeneratorConfig::FlowField(c) => GeneratorConfig::FlowField(c.sanitized()),
            GeneratorConfig::Deviate(c) => GeneratorConfig::Deviate(c.sanitized()),
            GeneratorConfig::PhotoSpirals(c) => GeneratorConfig::PhotoSpirals(c.sanitized()),
        }
    }
}

impl Generator for GeneratorConfig {
    fn generate(
        &self,
        page: &PageRect,
        seed: u64,
        ctx: &mut RunContext<'_>,
    ) -> Result<Vec<DrawingPass>, GenerateError> {
        match self {
            GeneratorConfig::FlowField(c) => c.generate(page, seed, ctx),
            GeneratorConfig::Deviate(c) => c.generate(page, seed, ctx),
            GeneratorConfig::PhotoSpirals(c) => c.generate(page, seed, ctx),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlotConfig {
    pub page: PageConfig,
    pub units_per_mm: f64,
    pub overdraw: Overdraw,
    pub keepdown: KeepdownStrategy,
    pub seed: u64,
    pub generator: GeneratorConfig,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            page: PageConfig::default(),
            units_per_mm: DEFAULT_UNITS_PER_MM,
            overdraw: Overdraw::default(),
            keepdown: KeepdownStrategy::default(),
            seed: 0,
            generator: GeneratorConfig::default(),
        }
    }
}

impl PlotConfig {
    /// Same config with every unusable value replaced by its fallback.
    pub fn sanitized(&self) -> PlotConfig {
        let defaults = PageConfig::default();
        let usable = |v: f64| v.is_finite() && v > 0.;
        let (width, height) = if usable(self.page.width) && usable(self.page.height) {
            (self.page.width, self.page.height)
        } else {
            (defaults.width, defaults.height)
        };
        let color = self.page.color.trim().to_lowercase();
        let color = if parse_css_color(&color).is_ok() {
            color
        } else {
            defaults.color
        };
        PlotConfig {
            page: PageConfig {
                width,
                height,
                color,
            },
            units_per_mm: if usable(self.units_per_mm) {
                self.units_per_mm
            } else {
                DEFAULT_UNITS_PER_MM
            },
            overdraw: self.overdraw,
            keepdown: self.keepdown,
            seed: self.seed,
            generator: self.generator.sanitized(),
        }
    }

    pub fn page_rect(&self) -> PageRect {
        PageRect::new(self.page.width, self.page.height)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, PrettyConfig::default())?)
    }

    pub fn to_file(&self, path: &Path) -> Result<()> {
        let path = path.with_extension("ron");
        let tmp_path = path.with_extension(format!("ron.tmp-{}", rand::random::<u32>()));
        std::fs::write(&tmp_path, self.to_ron()?)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<PlotConfig> {
        let mut reader = std::fs::File::open(path)?;
        let mut data = String::new();
        reader.read_to_string(&mut data)?;
        Ok(data.parse()?)
    }
}

impl FromStr for PlotConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::from_str(s)?)
    }
}
