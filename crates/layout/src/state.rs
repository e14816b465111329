use crate::geometry::{Rect, Size};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Anything that can receive computed rectangles (a canvas, a test recorder, a map)
pub trait LayoutTarget {
    fn set_node_rect(&mut self, id: &str, rect: Rect);

    /// Groups are optional for targets that only draw nodes
    fn set_group_rect(&mut self, _name: &str, _rect: Rect) {}
}

impl LayoutTarget for HashMap<String, Rect> {
    fn set_node_rect(&mut self, id: &str, rect: Rect) {
        self.insert(id.to_string(), rect);
    }
}

impl LayoutTarget for BTreeMap<String, Rect> {
    fn set_node_rect(&mut self, id: &str, rect: Rect) {
        self.insert(id.to_string(), rect);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub id: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub name: String,
    pub rect: Rect,
    pub nodes: Vec<NodeLayout>,
}

/// Result of one layout invocation. Produced fresh each time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutState {
    Grouped {
        groups: Vec<GroupLayout>,
        size: Size,
    },
    Flat {
        nodes: BTreeMap<String, Rect>,
    },
}

impl LayoutState {
    pub fn empty() -> Self {
        LayoutState::Flat {
            nodes: BTreeMap::new(),
        }
    }

    /// Push every rectangle to the target: groups first, then their nodes
    pub fn apply(&self, target: &mut dyn LayoutTarget) {
        match self {
            LayoutState::Grouped { groups, .. } => {
                for group in groups {
                    target.set_group_rect(&group.name, group.rect);
                    for node in &group.nodes {
                        target.set_node_rect(&node.id, node.rect);
                    }
                }
            }
            LayoutState::Flat { nodes } => {
                for (id, rect) in nodes {
                    target.set_node_rect(id, *rect);
                }
            }
        }
    }

    /// Absolute rectangle of a node, whichever shape the state has
    pub fn node_rect(&self, id: &str) -> Option<Rect> {
        match self {
            LayoutState::Grouped { groups, .. } => groups
                .iter()
                .flat_map(|group| group.nodes.iter())
                .find(|node| node.id == id)
                .map(|node| node.rect),
            LayoutState::Flat { nodes } => nodes.get(id).copied(),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            LayoutState::Grouped { groups, .. } => {
                groups.iter().map(|group| group.nodes.len()).sum()
            }
            LayoutState::Flat { nodes } => nodes.len(),
        }
    }

    /// Every node rectangle keyed by id
    pub fn flatten(&self) -> BTreeMap<String, Rect> {
        let mut out = BTreeMap::new();
        self.apply(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl LayoutTarget for Recorder {
        fn set_node_rect(&mut self, id: &str, _rect: Rect) {
            self.calls.push(format!("node:{id}"));
        }

        fn set_group_rect(&mut self, name: &str, _rect: Rect) {
            self.calls.push(format!("group:{name}"));
        }
    }

    fn rect(x: f32, y: f32) -> Rect {
        Rect::new(Point::new(x, y), Size::new(10.0, 10.0))
    }

    #[test]
    fn apply_visits_groups_before_their_nodes() {
        let state = LayoutState::Grouped {
            groups: vec![
                GroupLayout {
                    name: "core".into(),
                    rect: rect(0.0, 0.0),
                    nodes: vec![NodeLayout {
                        id: "A".into(),
                        rect: rect(1.0, 1.0),
                    }],
                },
                GroupLayout {
                    name: "ui".into(),
                    rect: rect(50.0, 0.0),
                    nodes: vec![],
                },
            ],
            size: Size::new(100.0, 20.0),
        };

        let mut recorder = Recorder::default();
        state.apply(&mut recorder);
        assert_eq!(recorder.calls, vec!["group:core", "node:A", "group:ui"]);
        assert_eq!(state.node_rect("A"), Some(rect(1.0, 1.0)));
        assert_eq!(state.node_count(), 1);
    }

    #[test]
    fn flat_state_serializes_with_kind_tag() {
        let mut nodes = BTreeMap::new();
        nodes.insert("A".to_string(), rect(0.0, 0.0));
        let state = LayoutState::Flat { nodes };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["kind"], "flat");
        assert_eq!(json["nodes"]["A"]["width"], 10.0);
    }
}
