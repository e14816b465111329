//! Force-directed layout for ungrouped graphs.
//!
//! Every step accumulates pairwise repulsion (`repulsion / d^2`, pushing nodes apart) and
//! edge attraction (`attraction * d`, pulling endpoints together), then integrates
//! `velocity = (velocity + force) * damping` and `position += velocity`.
//!
//! Damping alone does not make the motion settle: with `max_speed` unset, dense graphs can
//! oscillate and end a run faster than they started. The `max_speed` clamp (on by default)
//! bounds every step and is what keeps the final speed below the early one.
//!
//! Repulsion is computed for all pairs, so a step costs O(n^2). That is fine for graphs of
//! a few hundred nodes; larger graphs should use the grid layouts.

use crate::config::ForceConfig;
use crate::error::Result;
use crate::geometry::{Point, Rect, Size};
use crate::state::LayoutState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use refscope_graph::GraphEdge;
use std::collections::{BTreeMap, HashMap};

/// Output of a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct ForceLayout {
    /// Final node centres, centred around the origin
    pub positions: HashMap<String, Point>,

    /// Sum of node speeds after each step
    pub speed_trace: Vec<f32>,
}

impl ForceLayout {
    /// Convert centres into top-left rectangles, shifted so the layout starts at `origin`
    pub fn to_state(
        &self,
        sizes: &HashMap<String, Size>,
        default_size: Size,
        origin: Point,
    ) -> LayoutState {
        let mut rects: BTreeMap<String, Rect> = self
            .positions
            .iter()
            .map(|(id, center)| {
                let size = sizes.get(id).copied().unwrap_or(default_size);
                let top_left = center.sub_point(Point::new(size.width / 2.0, size.height / 2.0));
                (id.clone(), Rect::new(top_left, size))
            })
            .collect();

        let min_x = rects.values().map(|r| r.x).fold(f32::INFINITY, f32::min);
        let min_y = rects.values().map(|r| r.y).fold(f32::INFINITY, f32::min);
        if min_x.is_finite() && min_y.is_finite() {
            let shift = origin.sub_point(Point::new(min_x, min_y));
            for rect in rects.values_mut() {
                *rect = rect.translate(shift);
            }
        }

        LayoutState::Flat { nodes: rects }
    }
}

/// Run the simulation over `nodes` connected by `edges`.
///
/// Duplicate node ids are ignored, as are edges whose endpoints are not in `nodes` and
/// self-edges. With `config.seed` set the result is reproducible.
pub fn simulate(
    nodes: &[String],
    edges: &[GraphEdge],
    config: &ForceConfig,
) -> Result<ForceLayout> {
    config.validate()?;

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    let mut ids: Vec<&str> = Vec::with_capacity(nodes.len());
    for id in nodes {
        if !index.contains_key(id.as_str()) {
            index.insert(id.as_str(), ids.len());
            ids.push(id.as_str());
        }
    }

    let springs: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|edge| {
            let source = index.get(edge.source.as_str())?;
            let target = index.get(edge.target.as_str())?;
            (source != target).then_some((*source, *target))
        })
        .collect();
    if springs.len() < edges.len() {
        log::debug!(
            "Ignoring {} edges with unknown or identical endpoints",
            edges.len() - springs.len()
        );
    }

    let mut positions = initial_positions(ids.len(), config);
    let mut velocities = vec![Point::ZERO; ids.len()];
    let mut forces = vec![Point::ZERO; ids.len()];
    let mut speed_trace = Vec::with_capacity(config.steps);

    for _ in 0..config.steps {
        forces.fill(Point::ZERO);

        // Repulsion between all pairs
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                let delta = positions[i].sub_point(positions[j]);
                let distance = delta.hypot();
                if distance == 0.0 {
                    continue;
                }
                let magnitude = config.repulsion / (distance * distance);
                let push = delta.scale(magnitude / distance);
                forces[i] = forces[i].add_point(push);
                forces[j] = forces[j].sub_point(push);
            }
        }

        // Attraction along edges
        for &(source, target) in &springs {
            let delta = positions[source].sub_point(positions[target]);
            let distance = delta.hypot();
            if distance == 0.0 {
                continue;
            }
            let pull = delta.scale(config.attraction);
            forces[source] = forces[source].sub_point(pull);
            forces[target] = forces[target].add_point(pull);
        }

        let mut total_speed = 0.0;
        for ((position, velocity), force) in positions
            .iter_mut()
            .zip(velocities.iter_mut())
            .zip(&forces)
        {
            let mut next = velocity.add_point(*force).scale(config.damping);
            if let Some(max_speed) = config.max_speed {
                let speed = next.hypot();
                if speed > max_speed {
                    next = next.scale(max_speed / speed);
                }
            }
            *velocity = next;
            *position = position.add_point(next);
            total_speed += next.hypot();
        }
        speed_trace.push(total_speed);
    }

    center_layout(&mut positions);

    log::debug!(
        "Force layout: {} nodes, {} edges, {} steps, final speed {:.4}",
        ids.len(),
        springs.len(),
        config.steps,
        speed_trace.last().copied().unwrap_or_default()
    );

    Ok(ForceLayout {
        positions: ids
            .into_iter()
            .map(str::to_string)
            .zip(positions)
            .collect(),
        speed_trace,
    })
}

fn initial_positions(n: usize, config: &ForceConfig) -> Vec<Point> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let half = config.spread / 2.0;

    (0..n)
        .map(|_| Point::new(rng.random_range(-half..half), rng.random_range(-half..half)))
        .collect()
}

/// Move the bounding box centre to the origin
fn center_layout(positions: &mut [Point]) {
    if positions.is_empty() {
        return;
    }

    let mut min = Point::new(f32::MAX, f32::MAX);
    let mut max = Point::new(f32::MIN, f32::MIN);
    for pos in positions.iter() {
        min = Point::new(min.x.min(pos.x), min.y.min(pos.y));
        max = Point::new(max.x.max(pos.x), max.y.max(pos.y));
    }

    let center = min.add_point(max).scale(0.5);
    for pos in positions.iter_mut() {
        *pos = pos.sub_point(center);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn edge(source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn seeded(steps: usize) -> ForceConfig {
        ForceConfig {
            steps,
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn motion_settles_under_damping() {
        let nodes = ids(&["A", "B", "C", "D", "E", "F"]);
        let edges = vec![
            edge("A", "B"),
            edge("B", "C"),
            edge("C", "D"),
            edge("D", "E"),
            edge("E", "F"),
            edge("F", "A"),
        ];
        let config = ForceConfig {
            damping: 0.95,
            ..seeded(1200)
        };

        let layout = simulate(&nodes, &edges, &config).unwrap();
        assert_eq!(layout.speed_trace.len(), 1200);
        let early = layout.speed_trace[9];
        let last = *layout.speed_trace.last().unwrap();
        assert!(last < early, "final speed {last} not below step-10 speed {early}");
    }

    #[test]
    fn clamped_ring_graphs_settle_for_every_seed() {
        let nodes: Vec<String> = (0..30).map(|i| format!("N{i}")).collect();
        let edges: Vec<GraphEdge> = (0..30)
            .map(|i| edge(&nodes[i], &nodes[(i + 1) % 30]))
            .collect();

        for seed in 0..20 {
            let config = ForceConfig {
                steps: 1000,
                damping: 0.95,
                seed: Some(seed),
                ..Default::default()
            };
            assert!(config.max_speed.is_some());

            let layout = simulate(&nodes, &edges, &config).unwrap();
            let early = layout.speed_trace[9];
            let last = *layout.speed_trace.last().unwrap();
            assert!(last < early, "seed {seed}: final speed {last} not below {early}");
        }
    }

    #[test]
    fn seed_makes_layout_reproducible() {
        let nodes = ids(&["A", "B", "C"]);
        let edges = vec![edge("A", "B")];

        let first = simulate(&nodes, &edges, &seeded(50)).unwrap();
        let second = simulate(&nodes, &edges, &seeded(50)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn connected_nodes_end_closer_than_unconnected() {
        let nodes = ids(&["A", "B", "C"]);
        let edges = vec![edge("A", "B")];

        let layout = simulate(&nodes, &edges, &seeded(800)).unwrap();
        let a = layout.positions["A"];
        let b = layout.positions["B"];
        let c = layout.positions["C"];

        let ab = a.sub_point(b).hypot();
        assert!(ab < a.sub_point(c).hypot());
        assert!(ab < b.sub_point(c).hypot());
    }

    #[test]
    fn ignores_unknown_endpoints_and_duplicates() {
        let nodes = ids(&["A", "A", "B"]);
        let edges = vec![edge("A", "Ghost"), edge("B", "B")];

        let layout = simulate(&nodes, &edges, &seeded(10)).unwrap();
        assert_eq!(layout.positions.len(), 2);
    }

    #[test]
    fn empty_graph_is_empty_layout() {
        let layout = simulate(&[], &[], &seeded(10)).unwrap();
        assert!(layout.positions.is_empty());
        let state = layout.to_state(&HashMap::new(), Size::new(10.0, 10.0), Point::ZERO);
        assert_eq!(state.node_count(), 0);
    }

    #[test]
    fn invalid_damping_is_rejected() {
        let config = ForceConfig {
            damping: 1.0,
            ..seeded(10)
        };
        assert!(simulate(&ids(&["A"]), &[], &config).is_err());
    }

    #[test]
    fn state_starts_at_origin() {
        let nodes = ids(&["A", "B"]);
        let layout = simulate(&nodes, &[edge("A", "B")], &seeded(100)).unwrap();
        let state =
            layout.to_state(&HashMap::new(), Size::new(20.0, 10.0), Point::new(5.0, 5.0));
        let rects = state.flatten();

        let min_x = rects.values().map(|r| r.x).fold(f32::INFINITY, f32::min);
        let min_y = rects.values().map(|r| r.y).fold(f32::INFINITY, f32::min);
        assert!((min_x - 5.0).abs() < 1e-3);
        assert!((min_y - 5.0).abs() < 1e-3);
    }
}
