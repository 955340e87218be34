//! Chain model - collects input geometry and builds the simulation network

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::elements::{Anchor, Chain, ChainSpec, Freedom, Node, SimulationPhase, MIN_SEARCH_TOLERANCE};
use crate::error::{BuildWarning, CatenaryError, CatenaryResult};
use crate::loads::Load;
use crate::math::{
    closest_point_index, is_point_on_lines, point_on_closest_lines, remove_duplicate_points, Line,
    Point3,
};
use crate::network::Network;

/// Default model tolerance
pub const DEFAULT_TOLERANCE: f64 = 0.001;
/// Anchors closer than this to a line are left where they are
pub const SNAP_THRESHOLD: f64 = 1e-6;
/// Multiple of the model tolerance used for merging points
pub const MERGE_FACTOR: f64 = 10.0;

/// Input container for a chain network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainModel {
    /// Straight chains to discretize
    pub chains: Vec<ChainSpec>,
    /// Anchors pinning the network
    pub anchors: Vec<Anchor>,
    /// External masses
    pub loads: Vec<Load>,
    /// Tolerance for node merging and line splitting
    pub tolerance: f64,
}

impl Default for ChainModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainModel {
    /// Create an empty model with the default tolerance
    pub fn new() -> Self {
        Self {
            chains: Vec::new(),
            anchors: Vec::new(),
            loads: Vec::new(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.abs().max(MIN_SEARCH_TOLERANCE);
        self
    }

    // ========================
    // Model Building Methods
    // ========================

    /// Add a chain to the model
    pub fn add_chain(&mut self, chain: ChainSpec) -> &mut Self {
        self.chains.push(chain);
        self
    }

    /// Add an anchor to the model
    pub fn add_anchor(&mut self, anchor: Anchor) -> &mut Self {
        self.anchors.push(anchor);
        self
    }

    /// Add a load to the model
    pub fn add_load(&mut self, load: Load) -> &mut Self {
        self.loads.push(load);
        self
    }

    pub fn from_json(json: &str) -> CatenaryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // ========================
    // Network Construction
    // ========================

    /// Build the simulation network.
    ///
    /// Invalid inputs are dropped with a [`BuildWarning`]; the build only
    /// fails when too few chains or anchors survive.
    pub fn build(&self) -> CatenaryResult<Network> {
        let tol = self.tolerance.abs().max(MIN_SEARCH_TOLERANCE);
        let merge_distance = tol * MERGE_FACTOR;
        let mut warnings = Vec::new();

        let specs: Vec<ChainSpec> = self.chains.iter().filter(|c| c.is_valid()).copied().collect();
        record(&mut warnings, self.chains.len() - specs.len(), BuildWarning::DiscardedChains);

        let anchors: Vec<Anchor> = self.anchors.iter().filter(|a| a.is_valid()).copied().collect();
        record(&mut warnings, self.anchors.len() - anchors.len(), BuildWarning::DiscardedAnchors);

        let loads: Vec<Load> = self.loads.iter().filter(|l| l.is_valid()).copied().collect();
        let mut discarded_loads = self.loads.len() - loads.len();

        if specs.is_empty() {
            return Err(fail(CatenaryError::NotEnoughChains));
        }
        if anchors.len() < 2 {
            return Err(fail(CatenaryError::NotEnoughAnchors(anchors.len())));
        }

        let lines: Vec<Line> = specs.iter().map(|s| s.line).collect();

        let mut anchors = snap_anchors(anchors, &lines, merge_distance, &mut warnings)?;

        if !anchors.iter().any(|a| a.freedom.is_fixed()) {
            anchors[0].freedom = Freedom::fixed();
            warn!("{}", BuildWarning::ForcedFixedAnchor);
            warnings.push(BuildWarning::ForcedFixedAnchor);
        }

        let (loads, mut loads_off_chains) = snap_point_loads(loads, &lines);

        let mut split_points: Vec<Point3> = anchors.iter().map(|a| a.position).collect();
        split_points.extend(loads.iter().filter_map(|l| match l {
            Load::Point { position, .. } => Some(*position),
            _ => None,
        }));
        split_points.extend(lines.iter().flat_map(|l| [l.from, l.to]));
        let split_points = remove_duplicate_points(&split_points, merge_distance);

        let segments = split_chains(&specs, &split_points, tol, merge_distance);
        if segments.is_empty() {
            return Err(fail(CatenaryError::NotEnoughChains));
        }

        let (mut nodes, chains) = discretize(&segments, &anchors, tol);
        if nodes.len() < 2 {
            return Err(fail(CatenaryError::NotEnoughNodes(nodes.len())));
        }

        for chain in &chains {
            chain.connect_neighbours(&mut nodes);
        }

        for load in &loads {
            if !distribute_load(load, &mut nodes) {
                debug!("{:?} load matched no nodes", load.load_type());
                match load {
                    Load::Point { .. } => loads_off_chains += 1,
                    _ => discarded_loads += 1,
                }
            }
        }
        record(&mut warnings, discarded_loads, BuildWarning::DiscardedLoads);
        record(&mut warnings, loads_off_chains, BuildWarning::PointLoadsOffChains);

        let mut network = Network::from_parts(nodes, chains, tol, warnings);
        network.set_phase(SimulationPhase::Ready);

        info!(
            "Built network: {} chains, {} nodes, {} anchors, total mass {:.4}",
            network.num_chains(),
            network.num_nodes(),
            network.num_anchors(),
            network.total_mass()
        );

        Ok(network)
    }
}

fn fail(err: CatenaryError) -> CatenaryError {
    warn!("Build failed: {}", err);
    err
}

fn record(warnings: &mut Vec<BuildWarning>, count: usize, make: fn(usize) -> BuildWarning) {
    if count > 0 {
        let warning = make(count);
        warn!("{}", warning);
        warnings.push(warning);
    }
}

/// Snap anchors onto the chain lines, then drop stray and duplicate ones
fn snap_anchors(
    mut anchors: Vec<Anchor>,
    lines: &[Line],
    merge_distance: f64,
    warnings: &mut Vec<BuildWarning>,
) -> CatenaryResult<Vec<Anchor>> {
    for anchor in anchors.iter_mut() {
        if let Some(hit) = point_on_closest_lines(&anchor.position, lines) {
            if hit.distance < anchor.tolerance && hit.distance > SNAP_THRESHOLD {
                anchor.position = hit.point;
            }
        }
    }

    let before = anchors.len();
    anchors.retain(|a| is_point_on_lines(&a.position, lines, a.tolerance));
    record(warnings, before - anchors.len(), BuildWarning::AnchorsOffChains);
    if anchors.len() < 2 {
        return Err(fail(CatenaryError::NotEnoughAnchorsNearChains(anchors.len())));
    }

    let before = anchors.len();
    let mut unique: Vec<Anchor> = Vec::with_capacity(before);
    for anchor in anchors {
        let duplicate = unique
            .iter()
            .any(|u| (u.position - anchor.position).norm() < merge_distance);
        if !duplicate {
            unique.push(anchor);
        }
    }
    record(warnings, before - unique.len(), BuildWarning::DuplicateAnchors);
    if unique.len() < 2 {
        return Err(fail(CatenaryError::NotEnoughAnchorsNearChains(unique.len())));
    }

    Ok(unique)
}

/// Move point loads onto their closest line; returns kept loads and the drop count
fn snap_point_loads(loads: Vec<Load>, lines: &[Line]) -> (Vec<Load>, usize) {
    let mut dropped = 0;
    let kept: Vec<Load> = loads
        .into_iter()
        .filter_map(|load| match load {
            Load::Point {
                position,
                tolerance,
                mass,
            } => match point_on_closest_lines(&position, lines) {
                Some(hit) if hit.distance < tolerance => Some(Load::Point {
                    position: hit.point,
                    tolerance,
                    mass,
                }),
                _ => {
                    dropped += 1;
                    None
                }
            },
            other => Some(other),
        })
        .collect();
    (kept, dropped)
}

/// Split every chain at the split points lying on its interior
fn split_chains(
    specs: &[ChainSpec],
    split_points: &[Point3],
    tol: f64,
    merge_distance: f64,
) -> Vec<ChainSpec> {
    let mut segments = Vec::with_capacity(specs.len());
    for spec in specs {
        let line = spec.line;
        let params: Vec<f64> = split_points
            .iter()
            .filter(|p| line.distance_to(p) < tol)
            .filter(|p| (*p - line.from).norm() > merge_distance && (*p - line.to).norm() > merge_distance)
            .map(|p| line.closest_parameter(p))
            .collect();

        let pieces = line.split_at(&params, tol);
        if pieces.len() > 1 {
            debug!("Split chain into {} segments", pieces.len());
        }
        segments.extend(pieces.into_iter().map(|piece| spec.with_line(piece)));
    }
    segments
}

/// Sample nodes along every segment, merging shared endpoints
fn discretize(segments: &[ChainSpec], anchors: &[Anchor], tol: f64) -> (Vec<Node>, Vec<Chain>) {
    let anchor_points: Vec<Point3> = anchors.iter().map(|a| a.position).collect();
    let mut nodes: Vec<Node> = Vec::new();
    let mut chains: Vec<Chain> = Vec::with_capacity(segments.len());

    for (index, spec) in segments.iter().enumerate() {
        let mut chain = Chain::from_spec(index, spec);
        let divisions = spec.divisions();
        let share = spec.line.length() * spec.mass_per_length / divisions as f64;
        let samples = spec.line.divide_by_count(divisions);
        let last = samples.len() - 1;

        for (i, pt) in samples.into_iter().enumerate() {
            let node = if i == 0 || i == last {
                match find_node(&nodes, &pt, tol) {
                    Some(existing) => {
                        nodes[existing].mass += share * 0.5;
                        existing
                    }
                    None => push_node(&mut nodes, pt, anchors, &anchor_points, share * 0.5),
                }
            } else {
                push_node(&mut nodes, pt, anchors, &anchor_points, share)
            };
            chain.nodes.push(node);
        }

        chains.push(chain);
    }

    (nodes, chains)
}

/// Index of the closest node within `tol` of `pt`
fn find_node(nodes: &[Node], pt: &Point3, tol: f64) -> Option<usize> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (i, (n.position - pt).norm()))
        .filter(|(_, d)| *d < tol)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn push_node(
    nodes: &mut Vec<Node>,
    pt: Point3,
    anchors: &[Anchor],
    anchor_points: &[Point3],
    mass: f64,
) -> usize {
    let freedom = closest_point_index(anchor_points, &pt)
        .map(|i| &anchors[i])
        .filter(|a| (a.position - pt).norm() < a.tolerance)
        .map(|a| a.freedom);

    let index = nodes.len();
    let mut node = Node::new(pt, freedom);
    node.index = index;
    node.mass = mass;
    nodes.push(node);
    index
}

/// Add a load's mass to the nodes it selects; false if it selects none
fn distribute_load(load: &Load, nodes: &mut [Node]) -> bool {
    match load {
        Load::Point {
            position,
            tolerance,
            mass,
        } => match find_node(nodes, position, *tolerance) {
            Some(i) => {
                nodes[i].load += mass;
                true
            }
            None => false,
        },
        Load::Line {
            line, tolerance, ..
        } => {
            let selected: Vec<usize> = nodes
                .iter()
                .filter(|n| line.distance_to(&n.initial_position) < *tolerance)
                .map(|n| n.index)
                .collect();
            spread(nodes, &selected, load.total_mass())
        }
        Load::Region {
            region,
            tolerance,
            mass,
        } => {
            let selected: Vec<usize> = nodes
                .iter()
                .filter(|n| region.contains(&n.position, *tolerance))
                .map(|n| n.index)
                .collect();
            spread(nodes, &selected, *mass)
        }
    }
}

fn spread(nodes: &mut [Node], selected: &[usize], mass: f64) -> bool {
    if selected.is_empty() {
        return false;
    }
    let share = mass / selected.len() as f64;
    for &i in selected {
        nodes[i].load += share;
    }
    true
}
