pub use csscolorparser::Color as CssColor;
pub use csscolorparser::parse as parse_css_color;
use serde::{Deserialize, Serialize};

/// Width used when a configured pen width is missing or nonsense.
pub const DEFAULT_PEN_WIDTH: f64 = 0.3;

/// Colour used when a configured pen colour can't be parsed.
pub const DEFAULT_PEN_COLOR: &str = "black";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pen {
    #[serde(default = "default_width")]
    pub width: f64, // mm
    #[serde(default = "default_color")]
    pub color: String, // Any CSS colour string.
}

fn default_width() -> f64 {
    0.2
}

fn default_color() -> String {
    "#000000".to_string()
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            width: default_width(),
            color: default_color(),
        }
    }
}

impl Pen {
    pub fn new(width: f64, color: &str) -> Pen {
        Pen {
            width,
            color: color.to_string(),
        }
    }

    /// Coerces bad form values instead of failing: widths that are not
    /// positive and finite become [`DEFAULT_PEN_WIDTH`], colours that don't
    /// parse become [`DEFAULT_PEN_COLOR`]. Colours are lower-cased.
    pub fn sanitized(&self) -> Pen {
        let width = if self.width.is_finite() && self.width > 0. {
            self.width
        } else {
            DEFAULT_PEN_WIDTH
        };
        let color = self.color.trim().to_lowercase();
        let color = match parse_css_color(&color) {
            Ok(_) => color,
            Err(_) => DEFAULT_PEN_COLOR.to_string(),
        };
        Pen { width, color }
    }

    pub fn css(&self) -> CssColor {
        parse_css_color(&self.color).unwrap_or(CssColor::from_rgba8(0, 0, 0, 255))
    }
}
