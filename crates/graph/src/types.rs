use crate::error::{GraphError, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Caller-supplied (label, value) pair shown on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProperty {
    pub label: String,
    pub value: String,
}

impl NodeProperty {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Node in the reference graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unit name or arbitrary caller-supplied label
    pub id: String,

    /// Group the node is laid out in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<NodeProperty>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            group: None,
            properties: Vec::new(),
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }
}

/// Directed edge `source -> target` between node ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

/// What `add_edge` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    Added,
    /// The ordered pair already existed
    Duplicate,
    /// Source and target were the same node
    SelfLoop,
}

/// Serializable adjacency-list form of a ReferenceGraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyList {
    pub nodes: Vec<GraphNode>,
    /// Node id -> sorted target ids (every node present, possibly empty)
    pub adjacency: BTreeMap<String, Vec<String>>,
}

/// Reference graph with unique node ids and at most one edge per ordered pair
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    /// Directed graph (node -> referenced node)
    pub graph: DiGraph<GraphNode, ()>,

    /// Node id -> NodeIndex mapping for fast lookup
    pub node_index: HashMap<String, NodeIndex>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add node to graph; ids must be unique
    pub fn add_node(&mut self, node: GraphNode) -> Result<NodeIndex> {
        if self.node_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }

        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        Ok(idx)
    }

    /// Add edge between two existing nodes.
    ///
    /// Re-adding an existing pair is a no-op and self-edges are rejected; both are
    /// reported through the returned outcome rather than as errors.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<EdgeOutcome> {
        let from = self
            .find_node(source)
            .ok_or_else(|| GraphError::NodeNotFound(source.to_string()))?;
        let to = self
            .find_node(target)
            .ok_or_else(|| GraphError::NodeNotFound(target.to_string()))?;

        if from == to {
            return Ok(EdgeOutcome::SelfLoop);
        }
        if self.graph.find_edge(from, to).is_some() {
            return Ok(EdgeOutcome::Duplicate);
        }

        self.graph.add_edge(from, to, ());
        Ok(EdgeOutcome::Added)
    }

    /// Assign a node to a group
    pub fn set_group(&mut self, id: &str, group: impl Into<String>) -> Result<()> {
        let node = self.node_mut(id)?;
        node.group = Some(group.into());
        Ok(())
    }

    /// Replace a node's properties, keeping at most `max` of them
    pub fn set_properties(
        &mut self,
        id: &str,
        properties: impl IntoIterator<Item = NodeProperty>,
        max: usize,
    ) -> Result<()> {
        let node = self.node_mut(id)?;
        node.properties = properties.into_iter().take(max).collect();
        Ok(())
    }

    /// Find node by id
    pub fn find_node(&self, id: &str) -> Option<NodeIndex> {
        self.node_index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Get node data
    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.find_node(id)
            .and_then(|idx| self.graph.node_weight(idx))
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx))
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes().map(|node| node.id.clone()).collect()
    }

    /// Edges sorted by (source, target)
    pub fn edges(&self) -> Vec<GraphEdge> {
        let mut edges: Vec<GraphEdge> = self
            .graph
            .edge_references()
            .map(|edge| GraphEdge {
                source: self.graph[edge.source()].id.clone(),
                target: self.graph[edge.target()].id.clone(),
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        match (self.find_node(source), self.find_node(target)) {
            (Some(from), Some(to)) => self.graph.find_edge(from, to).is_some(),
            _ => false,
        }
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn to_adjacency_list(&self) -> AdjacencyList {
        let mut adjacency: BTreeMap<String, Vec<String>> = self
            .nodes()
            .map(|node| (node.id.clone(), Vec::new()))
            .collect();
        for edge in self.edges() {
            adjacency.entry(edge.source).or_default().push(edge.target);
        }

        AdjacencyList {
            nodes: self.nodes().cloned().collect(),
            adjacency,
        }
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut GraphNode> {
        let idx = self
            .find_node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        self.graph
            .node_weight_mut(idx)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }
}
