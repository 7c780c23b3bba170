use std::cell::RefCell;
use std::time::Duration;

use geo_types::{coord, LineString, MultiLineString};
use plotflow::optimizer::travel_distance;
use plotflow::prelude::*;

fn flow_config(overdraw: Overdraw) -> PlotConfig {
    PlotConfig {
        page: PageConfig {
            width: 150.,
            height: 100.,
            ..PageConfig::default()
        },
        overdraw,
        seed: 17,
        generator: GeneratorConfig::FlowField(FlowFieldConfig {
            pens: vec![Pen::new(0.3, "black"), Pen::new(0.3, "red")],
            attempts: 300,
            destroy_on_collision: true,
            ..FlowFieldConfig::default()
        }),
        ..PlotConfig::default()
    }
}

fn run(config: PlotConfig) -> (RunOutcome, Vec<String>) {
    let registry = RunRegistry::new();
    let messages = RefCell::new(vec![]);
    let mut ctx = RunContext::new(registry.begin(), |m: &str| {
        messages.borrow_mut().push(m.to_string())
    });
    let outcome = Pipeline::new(config).unwrap().run(&mut ctx);
    drop(ctx);
    (outcome, messages.into_inner())
}

#[test]
fn flow_field_end_to_end() {
    let (outcome, messages) = run(flow_config(Overdraw::Trim));
    let RunOutcome::Completed(plot) = outcome else {
        panic!("flow field run did not complete");
    };
    assert_eq!(messages[0], "0 / 300");
    assert_eq!(plot.passes.len(), 2);
    assert_eq!(plot.programs.len(), 2);
    let page = PageRect::new(150., 100.);
    for (pass, program) in plot.passes.iter().zip(plot.programs.iter()) {
        assert!(pass.lines.iter().all(|l| l.0.len() >= 2));
        assert!(pass.lines.iter().flat_map(|l| l.0.iter()).all(|p| page.contains(p)));
        if let Some(program) = program {
            assert!(program.text.starts_with("IN;"));
            assert!(program.text.ends_with("PU0,0;"));
            assert_eq!(program.strokes, pass.lines.0.len());
            let bounds = program.bounds.unwrap();
            assert!(bounds.min().x >= 0 && bounds.max().x <= 150 * 40);
            assert!(bounds.min().y >= 0 && bounds.max().y <= 100 * 40);
        } else {
            assert!(pass.lines.0.is_empty());
        }
    }
    let svg = passes_to_svg(&plot.passes, &page, 2.).unwrap().to_string();
    assert_eq!(svg.matches("<path").count(), 2);
}

#[test]
fn same_seed_same_plot() {
    let (a, _) = run(flow_config(Overdraw::Ignore));
    let (b, _) = run(flow_config(Overdraw::Ignore));
    assert_eq!(a, b);
}

#[test]
fn newer_run_supersedes_older() {
    let registry = RunRegistry::new();
    let pipeline = Pipeline::new(flow_config(Overdraw::Destroy)).unwrap();
    let restarter = registry.clone();
    let reports = RefCell::new(0);
    // The host restarts with new parameters as soon as the first progress
    // message arrives.
    let mut ctx = RunContext::new(registry.begin(), |_: &str| {
        *reports.borrow_mut() += 1;
        restarter.begin();
    });
    assert_eq!(pipeline.run(&mut ctx), RunOutcome::Superseded);
    drop(ctx);
    assert_eq!(reports.into_inner(), 1);

    let mut ctx = RunContext::new(registry.begin(), |_: &str| {});
    assert!(matches!(pipeline.run(&mut ctx), RunOutcome::Completed(_)));
}

#[test]
fn cancel_from_another_thread() {
    let registry = RunRegistry::new();
    let token = registry.begin();
    let canceller = registry.clone();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(5));
        canceller.cancel();
    });
    let config = PlotConfig {
        generator: GeneratorConfig::FlowField(FlowFieldConfig {
            attempts: usize::MAX,
            ..FlowFieldConfig::default()
        }),
        ..PlotConfig::default()
    };
    let mut ctx = RunContext::new(token, |_: &str| {});
    assert_eq!(Pipeline::new(config).unwrap().run(&mut ctx), RunOutcome::Superseded);
    handle.join().unwrap();
}

#[test]
fn stitched_touching_lines() {
    let lines = MultiLineString::new(vec![
        LineString::new(vec![coord! {x: 0., y: 0.}, coord! {x: 10., y: 0.}]),
        LineString::new(vec![coord! {x: 10., y: 0.}, coord! {x: 10., y: 10.}]),
    ]);
    let optimized = Optimizer::new(KeepdownStrategy::None.threshold(0.3)).optimize(&lines);
    assert_eq!(
        optimized.0,
        vec![LineString::new(vec![
            coord! {x: 0., y: 0.},
            coord! {x: 10., y: 0.},
            coord! {x: 10., y: 10.},
        ])]
    );
    assert_eq!(travel_distance(&optimized), 0.);
    let tera = PostMachine::Hpgl.templates().unwrap();
    let program = post(&optimized, 40., &tera).unwrap().unwrap();
    assert_eq!(program.text, "IN;PU0,0;PD0,400,400,400;PU0,0;");
    assert_eq!(program.strokes, 1);
}
