//! Run orchestration: configuration in, clipped and linked drawing passes plus
//! plotter programs out.
//!
//! ```no_run
//! use plotflow::prelude::*;
//!
//! let registry = RunRegistry::new();
//! let pipeline = Pipeline::new(PlotConfig::default()).unwrap();
//! let mut ctx = RunContext::new(registry.begin(), |status: &str| println!("{}", status));
//! if let RunOutcome::Completed(plot) = pipeline.run(&mut ctx) {
//!     let uid = run_uid();
//!     for (name, program) in plot.files(&uid) {
//!         std::fs::write(name, &program.text).unwrap();
//!     }
//! }
//! ```
use tera::Tera;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PlotConfig;
use crate::elements::Generator;
use crate::errors::{GenerateError, PostError};
use crate::geo_types::clip::clip_passes;
use crate::hpgl::{post, PostMachine, Program};
use crate::optimizer::Optimizer;
use crate::plotter::DrawingPass;

pub mod run;

use run::RunContext;

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    /// Clipped and linked, one per pen.
    pub passes: Vec<DrawingPass>,
    /// Parallel to `passes`; `None` where a pass had nothing to draw.
    pub programs: Vec<Option<Program>>,
}

impl Plot {
    /// File name and program for every pass that has one. Parts are numbered
    /// by pass index, so gaps show which pens had nothing to draw.
    pub fn files(&self, uid: &str) -> Vec<(String, &Program)> {
        self.programs
            .iter()
            .enumerate()
            .filter_map(|(part, program)| {
                program
                    .as_ref()
                    .map(|program| (Program::file_name(uid, part), program))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(Plot),
    /// A newer run took over; nothing was produced.
    Superseded,
    /// The generator gave up after reporting why.
    Abandoned(String),
}

/// Short id used to tie together the files written for one run.
pub fn run_uid() -> String {
    Uuid::new_v4().simple().to_string().chars().take(6).collect()
}

pub struct Pipeline {
    config: PlotConfig,
    templates: Tera,
}

impl Pipeline {
    /// A pipeline for the (sanitized) config, posting HPGL.
    pub fn new(config: PlotConfig) -> Result<Pipeline, PostError> {
        Ok(Pipeline {
            config: config.sanitized(),
            templates: PostMachine::Hpgl.templates()?,
        })
    }

    pub fn with_machine(self, machine: PostMachine) -> Result<Pipeline, PostError> {
        Ok(Pipeline {
            templates: machine.templates()?,
            ..self
        })
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    pub fn run(&self, ctx: &mut RunContext<'_>) -> RunOutcome {
        match self.try_run(ctx) {
            Ok(plot) => RunOutcome::Completed(plot),
            Err(GenerateError::Superseded) => {
                info!("Run {} superseded", ctx.token().id());
                RunOutcome::Superseded
            }
            Err(GenerateError::Abandoned(reason)) => RunOutcome::Abandoned(reason),
        }
    }

    fn try_run(&self, ctx: &mut RunContext<'_>) -> Result<Plot, GenerateError> {
        let page = self.config.page_rect();
        info!(
            "Run {}: {} on {}x{}",
            ctx.token().id(),
            self.config.generator.name(),
            page.width,
            page.height
        );
        let raw = self.config.generator.generate(&page, self.config.seed, ctx)?;

        ctx.checkpoint("clipping")?;
        let clipped = clip_passes(&raw, &page, self.config.overdraw);

        ctx.checkpoint("linking")?;
        let mut passes = Vec::with_capacity(clipped.len());
        let mut programs = Vec::with_capacity(clipped.len());
        for pass in clipped.iter() {
            let optimizer = Optimizer::new(self.config.keepdown.threshold(pass.pen_width));
            let lines = optimizer.optimize(&pass.lines);
            let program = match post(&lines, self.config.units_per_mm, &self.templates) {
                Ok(program) => program,
                Err(err) => {
                    // No cooldown: retrying the same templates cannot help.
                    warn!("Post processing {} failed: {}", pass.pen_color, err);
                    let reason = err.to_string();
                    ctx.checkpoint(&reason)?;
                    return Err(GenerateError::Abandoned(reason));
                }
            };
            ctx.tick(|| format!("linked {} / {}", passes.len() + 1, clipped.len()))?;
            passes.push(pass.with_lines(lines));
            programs.push(program);
        }
        ctx.checkpoint("done")?;
        Ok(Plot { passes, programs })
    }
}

#[cfg(test)]
mod test {
    use super::run::RunRegistry;
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::elements::deviate::DeviateConfig;
    use std::time::Duration;

    #[test]
    fn test_run_uid() {
        let uid = run_uid();
        assert_eq!(uid.len(), 6);
        assert!(uid.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(uid, run_uid());
    }

    #[test]
    fn test_deviate_pipeline() {
        let config = PlotConfig {
            generator: GeneratorConfig::Deviate(DeviateConfig::default()),
            ..PlotConfig::default()
        };
        let registry = RunRegistry::new();
        let mut messages = vec![];
        let mut ctx = RunContext::new(registry.begin(), |m: &str| messages.push(m.to_string()));
        let outcome = Pipeline::new(config).unwrap().run(&mut ctx);
        drop(ctx);
        let RunOutcome::Completed(plot) = outcome else {
            panic!("run did not complete");
        };
        assert_eq!(plot.passes.len(), 1);
        let program = plot.programs[0].as_ref().unwrap();
        assert!(program.text.starts_with("IN;PU"));
        assert!(program.text.ends_with("PU0,0;"));
        assert_eq!(plot.files("abc123")[0].0, "plot-abc123-1.plt");
        assert_eq!(messages.first().map(String::as_str), Some("generating lines..."));
        assert_eq!(messages.last().map(String::as_str), Some("done"));
    }

    #[test]
    fn test_template_failure_abandons_without_cooldown() {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("prelude", "IN;"),
            ("moveto", "PU{{start.x}},{{start.y}};"),
            ("lineto", "PD{{ no_such_value }};"),
            ("epilog", "PU0,0;"),
        ])
        .unwrap();
        let config = PlotConfig {
            generator: GeneratorConfig::Deviate(DeviateConfig::default()),
            ..PlotConfig::default()
        };
        let pipeline = Pipeline::new(config)
            .unwrap()
            .with_machine(PostMachine::Custom(tera))
            .unwrap();
        let registry = RunRegistry::new();
        let mut ctx = RunContext::new(registry.begin(), |_: &str| {});
        let started = std::time::Instant::now();
        let outcome = pipeline.run(&mut ctx);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(matches!(outcome, RunOutcome::Abandoned(_)));
    }

    #[test]
    fn test_abandoned_run_has_no_output() {
        let mut tera = Tera::default();
        tera.add_raw_template("prelude", "IN;").unwrap();
        let pipeline = Pipeline::new(PlotConfig::default()).unwrap();
        assert!(pipeline.with_machine(PostMachine::Custom(tera)).is_err());

        let config = PlotConfig {
            generator: GeneratorConfig::PhotoSpirals(Default::default()),
            ..PlotConfig::default()
        };
        let registry = RunRegistry::new();
        let mut ctx = RunContext::new(registry.begin(), |_: &str| {})
            .with_cooldown(Duration::from_millis(1));
        let pipeline = Pipeline::new(config).unwrap();
        assert_eq!(
            pipeline.run(&mut ctx),
            RunOutcome::Abandoned("Unable to load image".to_string())
        );
    }
}
