//! Catenary Solver Example - Two-span hanging chain
//!
//! Pass a path to a JSON `ChainModel` to relax your own network instead.

use anyhow::{Context, Result};
use catenary_solver::prelude::*;

fn two_span_model() -> ChainModel {
    // A 10 m chain resting on three supports
    //
    //   A1 ~~~~~~~~ A2 ~~~~~~~~ A3
    //   fixed      free       fixed
    //
    let mut model = ChainModel::new();
    model.add_chain(ChainSpec::new(
        Line::from_coords([0.0, 0.0, 0.0], [10.0, 0.0, 0.0]),
        0.75,
        0.5,
        0.25,
    ));

    model.add_anchor(Anchor::fixed(Point3::new(0.0, 0.0, 0.0)));
    model.add_anchor(Anchor::fixed(Point3::new(5.0, 0.0, 0.0)).with_freedom(Freedom::slider_z()));
    model.add_anchor(Anchor::fixed(Point3::new(10.0, 0.0, 0.0)));

    // 2 kg hanging at the middle of the first span
    model.add_load(Load::point(Point3::new(2.5, 0.0, 0.0), 0.01, 2.0));
    model
}

fn main() -> Result<()> {
    env_logger::init();

    let model = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read model file {}", path))?;
            ChainModel::from_json(&json).context("Failed to parse model")?
        }
        None => two_span_model(),
    };

    let mut network = model.build().context("Failed to build network")?;
    for warning in network.warnings() {
        println!("warning: {}", warning);
    }

    // Downward gravity gives the hanging form; flip Z for the arch
    let options = SolverOptions::new()
        .with_gravity(Vec3::new(0.0, 0.0, -0.01))
        .with_max_iter(5000)
        .parallel();

    let outcome = run(&mut network, &options).context("Simulation failed")?;
    let summary = SimulationSummary::new(&network, &outcome);

    println!("=== Catenary Solver: {} ===\n", outcome.state.description());
    for line in summary.info_lines() {
        println!("  {}", line);
    }

    println!("\nAnchors:");
    for node in network.anchors() {
        let report = NodeReport::from_node(node);
        println!(
            "  node {}: ({:.4}, {:.4}, {:.4})",
            report.index, report.position.x, report.position.y, report.position.z
        );
    }

    let lowest = network
        .nodes()
        .iter()
        .min_by(|a, b| a.position().z.total_cmp(&b.position().z));
    if let Some(node) = lowest {
        println!("\nLowest node {}: z = {:.4}", node.index(), node.position().z);
    }

    println!("\n{}", summary.to_json()?);
    Ok(())
}
