use approx::assert_relative_eq;
use catenary_solver::math::remove_duplicate_points;
use catenary_solver::prelude::*;

fn down() -> Vec3 {
    Vec3::new(0.0, 0.0, -0.01)
}

fn single_span(length: f64) -> ChainModel {
    let mut model = ChainModel::new();
    model.add_chain(ChainSpec::from_line(Line::from_coords(
        [0.0, 0.0, 0.0],
        [length, 0.0, 0.0],
    )));
    model.add_anchor(Anchor::fixed(Point3::new(0.0, 0.0, 0.0)));
    model.add_anchor(Anchor::fixed(Point3::new(length, 0.0, 0.0)));
    model
}

/// 10 m chain on fixed end anchors with an unconstrained anchor at the middle
fn two_span() -> Network {
    let mut model = single_span(10.0);
    model.add_anchor(Anchor::fixed(Point3::new(5.0, 0.0, 0.0)).with_freedom(Freedom::free()));
    model.build().unwrap()
}

fn node_near(network: &Network, x: f64) -> &Node {
    network
        .nodes()
        .iter()
        .find(|n| (n.initial_position().x - x).abs() < 1e-9)
        .unwrap()
}

#[test]
fn two_span_chain_sags_symmetrically() {
    let mut network = two_span();
    assert_eq!(network.num_chains(), 2);
    // 20 segments per half, sharing the midpoint node
    assert_eq!(network.num_nodes(), 41);

    let options = SolverOptions::new()
        .with_gravity(down())
        .with_max_iter(1000)
        .with_termination(1e-6);
    run(&mut network, &options).unwrap();

    let left = node_near(&network, 2.5).position();
    let right = node_near(&network, 7.5).position();
    assert!(left.z < -0.01, "left span should sag, z = {}", left.z);
    assert_relative_eq!(left.z, right.z, epsilon = 1e-6);

    let middle = node_near(&network, 5.0).position();
    assert!(middle.z < 0.0, "free midpoint should sag, z = {}", middle.z);

    for x in [0.0, 10.0] {
        let anchor = node_near(&network, x);
        assert_eq!(anchor.position(), anchor.initial_position());
    }
}

#[test]
fn straight_chain_without_gravity_stays_put() {
    let mut network = single_span(4.0).build().unwrap();
    let options = SolverOptions::new().with_gravity(Vec3::zeros());
    let outcome = run(&mut network, &options).unwrap();

    assert!(outcome.converged);
    assert_eq!(outcome.iterations, 1);
    for node in network.nodes() {
        assert_relative_eq!((node.position() - node.initial_position()).norm(), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn free_end_slider_respects_constraints() {
    let mut model = ChainModel::new();
    model.add_chain(ChainSpec::new(
        Line::from_coords([0.0, 0.0, 0.0], [4.0, 0.0, 0.0]),
        0.5,
        0.5,
        0.25,
    ));
    model.add_anchor(Anchor::fixed(Point3::new(0.0, 0.0, 0.0)));
    model.add_anchor(Anchor::fixed(Point3::new(4.0, 0.0, 0.0)).with_freedom(Freedom::slider_z()));
    let mut network = model.build().unwrap();

    let options = SolverOptions::new().with_gravity(down()).with_max_iter(300);
    run(&mut network, &options).unwrap();

    let slider = node_near(&network, 4.0).position();
    assert_eq!(slider.x, 4.0);
    assert_eq!(slider.y, 0.0);
    assert!(slider.z < 0.0);

    let chain = network.chain(0).unwrap();
    assert_relative_eq!(chain.max_length(), 8.0, epsilon = 1e-12);
    assert!(chain.poly_length() <= chain.max_length());
}

#[test]
fn mass_is_conserved_through_relaxation() {
    let mut model = single_span(6.0);
    model.add_chain(ChainSpec::new(
        Line::from_coords([3.0, 0.0, 0.0], [3.0, 3.0, 0.0]),
        1.0,
        2.0,
        0.5,
    ));
    model.add_anchor(Anchor::fixed(Point3::new(3.0, 3.0, 0.0)));
    let mut network = model.build().unwrap();

    // 6 m at 0.5 kg/m plus 3 m at 2 kg/m
    assert_relative_eq!(network.total_mass(), 9.0, epsilon = 1e-9);

    let options = SolverOptions::new().with_gravity(down()).with_max_iter(50);
    run(&mut network, &options).unwrap();

    let expected: f64 = network
        .chains()
        .iter()
        .map(|c| c.poly_length() * c.mass_per_length())
        .sum();
    assert_relative_eq!(network.total_mass(), expected, epsilon = 1e-9);
}

#[test]
fn anchors_only_move_along_free_axes() {
    let mut model = single_span(6.0);
    model.add_anchor(Anchor::fixed(Point3::new(3.0, 0.0, 0.0)).with_freedom(Freedom::planar_xy()));
    let mut network = model.build().unwrap();

    let options = SolverOptions::new()
        .with_gravity(Vec3::new(0.003, 0.002, -0.01))
        .with_max_iter(100);
    run(&mut network, &options).unwrap();

    for node in network.anchors() {
        let delta = node.displacement();
        let freedom = node.freedom();
        if !freedom.x {
            assert_eq!(delta.x, 0.0);
        }
        if !freedom.y {
            assert_eq!(delta.y, 0.0);
        }
        if !freedom.z {
            assert_eq!(delta.z, 0.0);
        }
    }
    let planar = node_near(&network, 3.0);
    assert!(planar.displacement().norm() > 0.0);
}

#[test]
fn substep_force_never_exceeds_amplitude() {
    let mut network = single_span(10.0).build().unwrap();
    let options = SolverOptions::new()
        .with_gravity(Vec3::new(0.0, 0.0, -50.0))
        .with_max_amplitude(0.2)
        .with_substeps(4)
        .with_max_iter(5);
    let mut session = SolverSession::new();

    for _ in 0..5 {
        session.advance(&mut network, &options, Some(1)).unwrap();
        for node in network.nodes() {
            assert!(node.force_magnitude() <= 0.2 / 4.0 + 1e-12);
        }
    }
}

#[test]
fn reset_is_idempotent() {
    let mut network = two_span();
    let built_mass = network.mass_and_load();

    let options = SolverOptions::new().with_gravity(down()).with_max_iter(20);
    run(&mut network, &options).unwrap();
    assert_eq!(network.phase(), SimulationPhase::Simulated);

    network.reset();
    let once = network.positions_and_forces();
    network.reset();
    let twice = network.positions_and_forces();

    assert_eq!(once, twice);
    assert_eq!(network.phase(), SimulationPhase::Ready);
    for node in network.nodes() {
        assert_eq!(node.position(), node.initial_position());
        assert!(node.force().is_none());
    }
    for (a, b) in network.mass_and_load().mass.iter().zip(&built_mass.mass) {
        assert_relative_eq!(*a, *b, epsilon = 1e-12);
    }
}

#[test]
fn duplicate_points_and_nodes_are_merged() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(0.009, 0.0, 0.0),
        Point3::new(0.011, 0.0, 0.0),
    ];
    let unique = remove_duplicate_points(&points, 0.01);
    assert_eq!(unique, vec![points[0], points[2]]);

    let network = two_span();
    let tol = network.tolerance();
    let nodes = network.nodes();
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            assert!((a.initial_position() - b.initial_position()).norm() >= tol);
        }
    }
}

#[test]
fn termination_boundaries() {
    let mut network = single_span(4.0).build().unwrap();

    let instant = SolverOptions::new().with_termination(f64::INFINITY);
    let outcome = run(&mut network, &instant).unwrap();
    assert_eq!(outcome.state, SolverState::Converged);
    assert_eq!(outcome.iterations, 1);

    let never = SolverOptions::new()
        .with_gravity(down())
        .with_termination(0.0)
        .with_max_iter(25);
    let outcome = run(&mut network, &never).unwrap();
    assert_eq!(outcome.state, SolverState::CappedByUser);
    assert_eq!(outcome.iterations, 25);
    assert!(!outcome.converged);
}

#[test]
fn sequential_and_parallel_agree() {
    let options = SolverOptions::new().with_gravity(down()).with_max_iter(60);
    let mut sequential = two_span();
    let mut parallel = two_span();

    let a = run(&mut sequential, &options).unwrap();
    let b = run(&mut parallel, &options.clone().parallel()).unwrap();

    assert_eq!(a.iterations, b.iterations);
    assert_eq!(a.displacement, b.displacement);
    assert_eq!(
        sequential.positions_and_forces(),
        parallel.positions_and_forces()
    );
}

#[test]
fn incremental_updates_match_full_run() {
    let options = SolverOptions::new()
        .with_gravity(down())
        .with_termination(0.0)
        .with_max_iter(40)
        .with_preview_nth(10);

    let mut full = two_span();
    run(&mut full, &options).unwrap();

    let mut incremental = two_span();
    let mut session = SolverSession::new();
    let mut updates = 0;
    while !session.is_finished() {
        session
            .update(&mut incremental, &options, SessionControl::running())
            .unwrap();
        updates += 1;
    }

    assert_eq!(updates, 4);
    assert_eq!(session.state(), SolverState::CappedByUser);
    assert_eq!(full.positions_and_forces(), incremental.positions_and_forces());
}

#[test]
fn restart_discards_progress() {
    let options = SolverOptions::new().with_gravity(down()).with_max_iter(100);
    let mut network = two_span();
    let mut session = SolverSession::new();

    session
        .update(&mut network, &options, SessionControl::running())
        .unwrap();
    session
        .update(&mut network, &options, SessionControl::running())
        .unwrap();
    assert_eq!(session.iteration(), 20);

    session
        .update(&mut network, &options, SessionControl::restart())
        .unwrap();
    assert_eq!(session.iteration(), 10);
}

#[test]
fn unprepared_network_is_rejected() {
    let json = two_span().to_json().unwrap().replace("\"Ready\"", "\"PreProcessing\"");
    let mut network = Network::from_json(&json).unwrap();
    let result = run(&mut network, &SolverOptions::new());
    assert!(matches!(result, Err(CatenaryError::NotReady)));
}

#[test]
fn dangling_neighbour_index_is_rejected_on_load() {
    let json = two_span().to_json().unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["nodes"][1]["neighbours"][0] = serde_json::json!(999);

    let result = Network::from_json(&value.to_string());
    assert!(matches!(result, Err(CatenaryError::InvalidGeometry(_))));
}
