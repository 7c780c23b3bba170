//! Flow field line art and toolpath preparation for pen plotters.
//!
//! A generator (most interestingly the noise driven [`elements::flow_field`]
//! tracer) produces one drawing pass per pen. Passes are then clipped to the
//! page, their lines reordered and stitched to cut pen-up travel, and each
//! pass is posted as an HPGL program ready to send to the plotter.
//!
//! Geometry is plain [`geo_types`](::geo_types) throughout, so anything that
//! speaks geo can feed or consume the pipeline.
//!
//! *Runs are cooperative: a run started later supersedes the current one,
//! which notices at its next progress report and stops without output.*

/// Extensions/Traits for geo_types geometry: intersections, offsets,
/// overlap tests, a quadtree, page clipping and SVG export.
pub mod geo_types;

/// Pens, pages and drawing passes.
pub mod plotter;

/// Generators that turn a configuration into drawing passes.
pub mod elements;

/// Reorders and stitches lines to minimize pen-up travel.
pub mod optimizer;

/// Lines to HPGL (or any other templated dialect).
pub mod hpgl;

/// Cancellation, progress and the generate/clip/link/post pipeline.
pub mod context;

/// RON configuration records.
pub mod config;

pub mod errors;

/// Make your life easy! Just import prelude::* and get the pipeline plus the
/// geometry traits.
pub mod prelude {
    pub use crate::config::{GeneratorConfig, PageConfig, PlotConfig};
    pub use crate::context::run::{Progress, RunContext, RunRegistry, RunToken};
    pub use crate::context::{run_uid, Pipeline, Plot, RunOutcome};
    pub use crate::elements::deviate::DeviateConfig;
    pub use crate::elements::flow_field::{FieldTracer, FlowFieldConfig, TraceVariant};
    pub use crate::elements::photo_spirals::PhotoSpiralsConfig;
    pub use crate::elements::Generator;
    pub use crate::errors::{ConfigError, GenerateError, PostError, SvgCreationError};
    pub use crate::geo_types::arc_length::ArcLength;
    pub use crate::geo_types::clip::{clip_passes, Overdraw, PageClip};
    pub use crate::geo_types::offset::ParallelOffset;
    pub use crate::geo_types::svg::{passes_to_svg, ToSvg};
    pub use crate::geo_types::CoordVector;
    pub use crate::hpgl::{post, PostMachine, Program};
    pub use crate::optimizer::{KeepdownStrategy, Optimizer};
    pub use crate::plotter::{DrawingPass, PageRect, Pen};
}
