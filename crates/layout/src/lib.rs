//! # Refscope Layout
//!
//! 2D placement for reference graphs and ad-hoc node/group collections.
//!
//! ## Modes
//!
//! ```text
//! grouped  ── pack nodes per group (near-square grid) ── pack groups ── offset nodes
//! grid     ── pack every node into one grid
//! uniform  ── identical cells, golden-ratio column count
//! force    ── repulsion + edge springs + damping, O(n^2) per step
//! ```
//!
//! Node sizes are usually unknown until a renderer has measured them. A [`LayoutSession`]
//! waits on a [`GeometryCoordinator`] until every node has reported a size, then computes
//! the [`LayoutState`] and applies it to a [`LayoutTarget`] exactly once.
//!
//! ```
//! use refscope_layout::{pack, PackObjective, Size};
//!
//! let packing = pack(&[Size::new(100.0, 100.0); 4], 20.0, PackObjective::MinArea);
//! assert_eq!((packing.rows, packing.columns), (2, 2));
//! assert_eq!(packing.size, Size::new(260.0, 260.0));
//! ```

mod batch;
mod config;
mod coordinator;
mod error;
mod force;
mod geometry;
mod grid;
mod session;
mod state;
mod uniform;

pub use batch::{run_batched, synthetic_nodes, BatchMetrics, BatchReport, BatchRun, BatchSummary};
pub use config::{
    BatchConfig, ForceConfig, GridConfig, LayoutConfig, PackObjective, UniformGridConfig,
};
pub use coordinator::{GeometryCoordinator, MeasuredSizes, Phase, ReportOutcome};
pub use error::{LayoutError, Result};
pub use force::{simulate, ForceLayout};
pub use geometry::{Point, Rect, Size};
pub use grid::{layout_groups, pack, pack_group, pack_groups, GridPacking, GroupMembers};
pub use session::{compute_layout, LayoutMode, LayoutPlan, LayoutSession, UNGROUPED};
pub use state::{GroupLayout, LayoutState, LayoutTarget, NodeLayout};
pub use uniform::{column_count, layout_uniform};
