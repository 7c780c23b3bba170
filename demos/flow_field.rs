//! Traces a flow field, then writes the HPGL programs, a frame trace per pen,
//! an SVG preview and the config that made them.
//!
//! `cargo run --example flow_field [config.ron]`
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use plotflow::prelude::*;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

fn default_config() -> PlotConfig {
    PlotConfig {
        page: PageConfig {
            width: 210.,
            height: 297.,
            ..PageConfig::default()
        },
        overdraw: Overdraw::Trim,
        keepdown: KeepdownStrategy::PenWidthAuto,
        seed: 20240,
        generator: GeneratorConfig::FlowField(FlowFieldConfig {
            pens: vec![Pen::new(0.3, "black"), Pen::new(0.5, "#d01c1c")],
            attempts: 4000,
            destroy_on_collision: true,
            collision_radius: 0.8,
            ..FlowFieldConfig::default()
        }),
        ..PlotConfig::default()
    }
}

fn main() -> Result<()> {
    init_logging();
    let config = match std::env::args().nth(1) {
        Some(path) => PlotConfig::from_file(Path::new(&path))?,
        None => default_config(),
    };

    let out_dir = PathBuf::from("plot-output");
    std::fs::create_dir_all(&out_dir)?;
    let uid = run_uid();

    let registry = RunRegistry::new();
    let pipeline = Pipeline::new(config)?;
    let mut ctx = RunContext::new(registry.begin(), |status: &str| info!("{}", status));
    let plot = match pipeline.run(&mut ctx) {
        RunOutcome::Completed(plot) => plot,
        RunOutcome::Superseded => return Err(anyhow!("run was superseded")),
        RunOutcome::Abandoned(reason) => return Err(anyhow!("run abandoned: {}", reason)),
    };

    for (name, program) in plot.files(&uid) {
        let path = out_dir.join(&name);
        std::fs::write(&path, &program.text)?;
        if let Some(frame) = program.frame() {
            std::fs::write(path.with_extension("frame.plt"), frame)?;
        }
        info!("Wrote {} ({} strokes)", path.display(), program.strokes);
    }

    let page = pipeline.config().page_rect();
    let document = passes_to_svg(&plot.passes, &page, 1.)?;
    let svg_path = out_dir.join(format!("plot-{}.svg", uid));
    svg::save(&svg_path, &document)?;
    pipeline.config().to_file(&out_dir.join(format!("plot-{}", uid)))?;
    info!("Preview at {}", svg_path.display());
    Ok(())
}
