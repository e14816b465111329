use crate::config::LayoutConfig;
use crate::coordinator::{GeometryCoordinator, MeasuredSizes, Phase, ReportOutcome};
use crate::error::{LayoutError, Result};
use crate::force::simulate;
use crate::geometry::{Rect, Size};
use crate::grid::{layout_groups, pack_group, GroupMembers};
use crate::state::{LayoutState, LayoutTarget};
use crate::uniform::layout_uniform;
use refscope_graph::{GraphEdge, ReferenceGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Group that collects nodes without an explicit group in grouped mode
pub const UNGROUPED: &str = "ungrouped";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Every node packed into one grid
    Grid,
    /// Nodes packed per group, groups packed against each other
    #[default]
    Grouped,
    /// Force-directed simulation over the graph's edges
    Force,
    /// Identical cells on a golden-ratio grid
    Uniform,
}

impl LayoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutMode::Grid => "grid",
            LayoutMode::Grouped => "grouped",
            LayoutMode::Force => "force",
            LayoutMode::Uniform => "uniform",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(LayoutMode::Grid),
            "grouped" => Ok(LayoutMode::Grouped),
            "force" => Ok(LayoutMode::Force),
            "uniform" => Ok(LayoutMode::Uniform),
            other => Err(LayoutError::invalid_config(format!(
                "unknown layout mode {other:?} (expected grid, grouped, force or uniform)"
            ))),
        }
    }
}

/// The nodes, groups and edges one layout pass works on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPlan {
    /// Node ids in layout order
    pub nodes: Vec<String>,
    /// Node id -> group name
    pub groups: HashMap<String, String>,
    pub edges: Vec<GraphEdge>,
    /// Nodes left out of the pass
    pub hidden: Vec<String>,
}

impl LayoutPlan {
    /// Every node of the graph
    pub fn from_graph(graph: &ReferenceGraph) -> Self {
        Self {
            nodes: graph.node_ids(),
            groups: group_map(graph),
            edges: graph.edges(),
            hidden: Vec::new(),
        }
    }

    /// Only nodes with at least one edge; the rest are reported as hidden
    pub fn connected_only(graph: &ReferenceGraph) -> Self {
        let (connected, hidden) = graph.partition_connected();
        log::info!(
            "Connected-only layout: {} nodes kept, {} hidden",
            connected.len(),
            hidden.len()
        );
        Self {
            nodes: connected,
            groups: group_map(graph),
            edges: graph.edges(),
            hidden,
        }
    }

    /// Group members in first-seen order.
    ///
    /// Group-less nodes share one fallback group, kept apart from any real group and only
    /// named `UNGROUPED` in the output.
    fn group_members(&self, sizes: &MeasuredSizes, default_size: Size) -> Vec<GroupMembers> {
        let mut order: Vec<Option<&str>> = Vec::new();
        let mut members: HashMap<Option<&str>, GroupMembers> = HashMap::new();

        for id in &self.nodes {
            let group = self.groups.get(id).map(String::as_str);
            let entry = members.entry(group).or_insert_with(|| {
                order.push(group);
                GroupMembers::new(group.unwrap_or(UNGROUPED))
            });
            let size = sizes.get(id).copied().unwrap_or(default_size);
            entry.nodes.push((id.clone(), size));
        }

        order
            .into_iter()
            .filter_map(|key| members.remove(&key))
            .collect()
    }
}

fn group_map(graph: &ReferenceGraph) -> HashMap<String, String> {
    graph
        .nodes()
        .filter_map(|node| Some((node.id.clone(), node.group.clone()?)))
        .collect()
}

/// Compute a layout for `plan` from measured sizes.
///
/// Nodes without a measured size use the uniform grid's default size.
pub fn compute_layout(
    plan: &LayoutPlan,
    mode: LayoutMode,
    sizes: &MeasuredSizes,
    config: &LayoutConfig,
) -> Result<LayoutState> {
    let default_size = config.uniform.default_size;
    let size_of = |id: &String| sizes.get(id).copied().unwrap_or(default_size);

    let state = match mode {
        LayoutMode::Grid => {
            let node_sizes: Vec<Size> = plan.nodes.iter().map(size_of).collect();
            let packing = pack_group(&node_sizes, &config.grid);
            let nodes: BTreeMap<String, Rect> = plan
                .nodes
                .iter()
                .zip(node_sizes.iter().zip(&packing.positions))
                .map(|(id, (size, origin))| (id.clone(), Rect::new(*origin, *size)))
                .collect();
            LayoutState::Flat { nodes }
        }
        LayoutMode::Grouped => {
            let groups = plan.group_members(sizes, default_size);
            layout_groups(&groups, &config.grid)
        }
        LayoutMode::Force => {
            let layout = simulate(&plan.nodes, &plan.edges, &config.force)?;
            layout.to_state(sizes, default_size, config.uniform.origin)
        }
        LayoutMode::Uniform => layout_uniform(&plan.nodes, sizes, &config.uniform),
    };

    Ok(state)
}

/// Binds a geometry coordinator to a layout mode and a target.
///
/// Once every node of the plan has reported its size the layout is computed and applied to
/// the target exactly once. Refreshing means dropping the session and starting a new one.
pub struct LayoutSession {
    coordinator: GeometryCoordinator,
    mode: LayoutMode,
    result: Arc<Mutex<Option<LayoutState>>>,
    hidden: Vec<String>,
}

impl LayoutSession {
    pub fn new<T>(
        plan: LayoutPlan,
        mode: LayoutMode,
        config: LayoutConfig,
        target: T,
    ) -> Result<Self>
    where
        T: LayoutTarget + Send + 'static,
    {
        config.validate()?;

        let coordinator = GeometryCoordinator::new(plan.nodes.iter().cloned());
        let result = Arc::new(Mutex::new(None));
        let hidden = plan.hidden.clone();

        let slot = Arc::clone(&result);
        let mut target = target;
        coordinator.on_ready(move |sizes| {
            match compute_layout(&plan, mode, &sizes, &config) {
                Ok(state) => {
                    state.apply(&mut target);
                    log::info!("Applied {mode} layout to {} nodes", state.node_count());
                    let mut guard = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                    *guard = Some(state);
                }
                Err(e) => log::warn!("{mode} layout failed: {e}"),
            }
        });

        Ok(Self {
            coordinator,
            mode,
            result,
            hidden,
        })
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.coordinator.phase()
    }

    pub fn is_done(&self) -> bool {
        self.phase() == Phase::Done
    }

    /// Nodes excluded from this session's plan
    pub fn hidden(&self) -> &[String] {
        &self.hidden
    }

    pub fn report_size(&self, id: &str, size: Size) -> ReportOutcome {
        self.coordinator.report_size(id, size)
    }

    /// The applied layout, once the pass has run
    pub fn state(&self) -> Option<LayoutState> {
        self.result
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForceConfig;
    use pretty_assertions::assert_eq;
    use refscope_graph::GraphNode;

    /// Target that shares what it receives with the test
    #[derive(Clone, Default)]
    struct SharedTarget {
        nodes: Arc<Mutex<BTreeMap<String, Rect>>>,
        groups: Arc<Mutex<Vec<String>>>,
    }

    impl LayoutTarget for SharedTarget {
        fn set_node_rect(&mut self, id: &str, rect: Rect) {
            self.nodes.lock().unwrap().insert(id.to_string(), rect);
        }

        fn set_group_rect(&mut self, name: &str, _rect: Rect) {
            self.groups.lock().unwrap().push(name.to_string());
        }
    }

    fn graph() -> ReferenceGraph {
        let mut graph = ReferenceGraph::new();
        graph.add_node(GraphNode::new("A").in_group("core")).unwrap();
        graph.add_node(GraphNode::new("B").in_group("core")).unwrap();
        graph.add_node(GraphNode::new("C")).unwrap();
        graph.add_node(GraphNode::new("Lonely").in_group("misc")).unwrap();
        graph.add_edge("A", "B").unwrap();
        graph.add_edge("B", "C").unwrap();
        graph
    }

    #[test]
    fn parses_modes() {
        assert_eq!("Grid".parse::<LayoutMode>().unwrap(), LayoutMode::Grid);
        assert_eq!(" force ".parse::<LayoutMode>().unwrap(), LayoutMode::Force);
        assert!("spiral".parse::<LayoutMode>().is_err());
    }

    #[test]
    fn session_applies_once_after_all_sizes_arrive() {
        let target = SharedTarget::default();
        let session = LayoutSession::new(
            LayoutPlan::from_graph(&graph()),
            LayoutMode::Grouped,
            LayoutConfig::default(),
            target.clone(),
        )
        .unwrap();

        for id in ["A", "B", "C"] {
            session.report_size(id, Size::new(100.0, 50.0));
        }
        assert_eq!(session.phase(), Phase::Collecting);
        assert!(session.state().is_none());
        assert!(target.nodes.lock().unwrap().is_empty());

        session.report_size("Lonely", Size::new(40.0, 40.0));
        assert!(session.is_done());
        assert_eq!(target.nodes.lock().unwrap().len(), 4);
        assert_eq!(
            *target.groups.lock().unwrap(),
            vec!["core", "ungrouped", "misc"]
        );

        // late reports change nothing
        session.report_size("A", Size::new(500.0, 500.0));
        let state = session.state().unwrap();
        assert_eq!(state.node_rect("A").unwrap().size(), Size::new(100.0, 50.0));
    }

    #[test]
    fn real_group_named_ungrouped_stays_separate_from_fallback() {
        let plan = LayoutPlan {
            nodes: vec!["A".into(), "B".into()],
            groups: HashMap::from([("A".to_string(), UNGROUPED.to_string())]),
            ..Default::default()
        };

        let state = compute_layout(
            &plan,
            LayoutMode::Grouped,
            &HashMap::new(),
            &LayoutConfig::default(),
        )
        .unwrap();
        let LayoutState::Grouped { groups, .. } = state else {
            panic!("grouped layout expected");
        };
        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|group| group.nodes.len() == 1));
        assert!(!groups[0].rect.overlaps(&groups[1].rect));
    }

    #[test]
    fn connected_only_plan_hides_isolated_nodes() {
        let plan = LayoutPlan::connected_only(&graph());
        assert_eq!(plan.nodes, vec!["A", "B", "C"]);
        assert_eq!(plan.hidden, vec!["Lonely"]);

        let session = LayoutSession::new(
            plan,
            LayoutMode::Uniform,
            LayoutConfig::default(),
            BTreeMap::<String, Rect>::new(),
        )
        .unwrap();
        assert_eq!(session.hidden(), ["Lonely".to_string()]);
        for id in ["A", "B", "C"] {
            session.report_size(id, Size::new(10.0, 10.0));
        }
        let state = session.state().unwrap();
        assert_eq!(state.node_count(), 3);
        assert!(state.node_rect("Lonely").is_none());
    }

    #[test]
    fn grid_mode_packs_every_node_together() {
        let plan = LayoutPlan {
            nodes: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            ..Default::default()
        };
        let sizes: MeasuredSizes = plan
            .nodes
            .iter()
            .map(|id| (id.clone(), Size::new(100.0, 100.0)))
            .collect();
        let mut config = LayoutConfig::default();
        config.grid.padding = 20.0;

        let state = compute_layout(&plan, LayoutMode::Grid, &sizes, &config).unwrap();
        let rects = state.flatten();
        assert_eq!(rects["D"].origin(), crate::geometry::Point::new(140.0, 140.0));
    }

    #[test]
    fn force_mode_places_every_node() {
        let plan = LayoutPlan::from_graph(&graph());
        let mut config = LayoutConfig::default();
        config.force = ForceConfig {
            steps: 50,
            seed: Some(3),
            ..Default::default()
        };

        let state = compute_layout(&plan, LayoutMode::Force, &HashMap::new(), &config).unwrap();
        assert_eq!(state.node_count(), 4);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = LayoutConfig::default();
        config.force.damping = 2.0;
        let result = LayoutSession::new(
            LayoutPlan::default(),
            LayoutMode::Force,
            config,
            BTreeMap::<String, Rect>::new(),
        );
        assert!(matches!(result, Err(LayoutError::InvalidConfig(_))));
    }
}
