use crate::types::ReferenceGraph;
use petgraph::Direction;
use std::collections::BTreeSet;

impl ReferenceGraph {
    /// Ids of nodes that `id` references (outgoing edges), sorted
    pub fn dependencies(&self, id: &str) -> Vec<String> {
        self.neighbors_sorted(id, Direction::Outgoing)
    }

    /// Ids of nodes that reference `id` (incoming edges), sorted
    pub fn dependents(&self, id: &str) -> Vec<String> {
        self.neighbors_sorted(id, Direction::Incoming)
    }

    /// Whether the node takes part in at least one edge
    pub fn is_connected(&self, id: &str) -> bool {
        self.find_node(id).is_some_and(|idx| {
            self.graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_some()
                || self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_some()
        })
    }

    /// Split node ids into (connected, isolated), both in insertion order.
    ///
    /// Used to hide disconnected nodes and relayout only the connected ones.
    pub fn partition_connected(&self) -> (Vec<String>, Vec<String>) {
        self.nodes()
            .map(|node| node.id.clone())
            .partition(|id| self.is_connected(id))
    }

    /// Distinct group names in first-seen order
    pub fn groups(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.nodes()
            .filter_map(|node| node.group.clone())
            .filter(|group| seen.insert(group.clone()))
            .collect()
    }

    /// Ids of nodes in `group`, in insertion order
    pub fn members_of(&self, group: &str) -> Vec<String> {
        self.nodes()
            .filter(|node| node.group.as_deref() == Some(group))
            .map(|node| node.id.clone())
            .collect()
    }

    fn neighbors_sorted(&self, id: &str, direction: Direction) -> Vec<String> {
        let Some(idx) = self.find_node(id) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].id.clone())
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{GraphNode, ReferenceGraph};
    use pretty_assertions::assert_eq;

    fn sample() -> ReferenceGraph {
        let mut graph = ReferenceGraph::new();
        graph.add_node(GraphNode::new("A").in_group("core")).unwrap();
        graph.add_node(GraphNode::new("B").in_group("core")).unwrap();
        graph.add_node(GraphNode::new("C").in_group("ui")).unwrap();
        graph.add_node(GraphNode::new("Lonely")).unwrap();
        graph.add_edge("A", "B").unwrap();
        graph.add_edge("B", "C").unwrap();
        graph
    }

    #[test]
    fn dependencies_and_dependents() {
        let graph = sample();
        assert_eq!(graph.dependencies("A"), vec!["B".to_string()]);
        assert_eq!(graph.dependents("C"), vec!["B".to_string()]);
        assert!(graph.dependencies("C").is_empty());
        assert!(graph.dependencies("Missing").is_empty());
    }

    #[test]
    fn partition_separates_isolated_nodes() {
        let graph = sample();
        let (connected, isolated) = graph.partition_connected();
        assert_eq!(connected, vec!["A", "B", "C"]);
        assert_eq!(isolated, vec!["Lonely"]);
    }

    #[test]
    fn groups_in_first_seen_order() {
        let graph = sample();
        assert_eq!(graph.groups(), vec!["core", "ui"]);
        assert_eq!(graph.members_of("core"), vec!["A", "B"]);
    }
}
