//! # Refscope Graph
//!
//! Reference graph between source units, built from the extractor's output.
//!
//! ## Architecture
//!
//! ```text
//! SourceUnit[]
//!     │
//!     ├──> Graph Builder (bounded parallel fan-out)
//!     │      ├─ Extract ReferenceSet per unit (worker-local alias tables)
//!     │      └─ Collect into a shared unit -> references map
//!     │
//!     ├──> Resolution
//!     │      ├─ One node per unit
//!     │      ├─ Strip namespace qualifiers to the last segment
//!     │      ├─ Exact match on unit id -> edge (idempotent, no self-edges)
//!     │      └─ Unresolved names -> warning, no edge
//!     │
//!     └──> Reference Graph (petgraph)
//!            ├─ Nodes: units or caller-supplied labels (+ group, properties)
//!            └─ Edges: unit -> referenced unit
//! ```

mod builder;
mod error;
mod graph;
mod limits;
mod types;

pub use builder::{resolve_name, GraphBuilder};
pub use error::{GraphError, Result};
pub use limits::{
    extract_concurrency, hardware_concurrency, parse_extract_concurrency, EXTRACT_CONCURRENCY_ENV,
};
pub use types::{AdjacencyList, EdgeOutcome, GraphEdge, GraphNode, NodeProperty, ReferenceGraph};
