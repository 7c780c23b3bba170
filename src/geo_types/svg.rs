use geo_types::MultiLineString;
use svg::node::element::Path;
use svg::Document;

use crate::errors::SvgCreationError;
use crate::plotter::{DrawingPass, PageRect};

pub trait ToSvg {
    /// SVG path data ("M x y L x y x y ...") with every coordinate multiplied by `scale`.
    fn to_path_data(&self, scale: f64) -> String;
}

impl ToSvg for MultiLineString<f64> {
    fn to_path_data(&self, scale: f64) -> String {
        self.iter()
            .filter(|line| !line.0.is_empty())
            .map(|line| {
                line.0
                    .iter()
                    .enumerate()
                    .map(|(i, point)| {
                        let cmd = match i {
                            0 => "M",
                            1 => "L",
                            _ => "",
                        };
                        format!("{}{:.2} {:.2}", cmd, point.x * scale, point.y * scale)
                    })
                    .collect::<Vec<String>>()
                    .join(" ")
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// One stroked path per pass, on a page-sized canvas.
pub fn passes_to_svg(
    passes: &[DrawingPass],
    page: &PageRect,
    scale: f64,
) -> Result<Document, SvgCreationError> {
    if passes.is_empty() || !(page.width > 0. && page.height > 0.) {
        return Err(SvgCreationError::NullGeometry);
    }
    let (width, height) = (page.width * scale, page.height * scale);
    let mut document = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0., 0., width, height));
    for pass in passes {
        document = document.add(
            Path::new()
                .set("fill", "none")
                .set("stroke", pass.pen_color.as_str())
                .set("stroke-width", pass.pen_width * scale)
                .set("d", pass.lines.to_path_data(scale)),
        );
    }
    Ok(document)
}
