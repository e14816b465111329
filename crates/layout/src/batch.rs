use crate::config::{BatchConfig, UniformGridConfig};
use crate::error::Result;
use crate::state::LayoutState;
use crate::uniform::layout_uniform;
use refscope_graph::{GraphNode, ReferenceGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Timing of one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    /// 1-based
    pub batch_number: usize,
    pub nodes_in_batch: usize,
    /// Milliseconds since the run started, when the batch began
    pub started_at_ms: f64,
    pub creation_ms: f64,
    pub layout_ms: f64,
    pub total_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_nodes: usize,
    pub batches: usize,
    pub total_seconds: f64,
    pub avg_ms_per_node: f64,
    pub avg_creation_ms: f64,
    pub avg_layout_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub metrics: Vec<BatchMetrics>,
    pub summary: BatchSummary,
}

/// Output of a batched run: the graph holding every created node, one layout per batch and
/// the timings
#[derive(Debug)]
pub struct BatchRun {
    pub graph: ReferenceGraph,
    pub layouts: Vec<LayoutState>,
    pub report: BatchReport,
}

/// `Node 0`, `Node 1`, ...
pub fn synthetic_nodes(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Node {i}")).collect()
}

/// Create and lay out nodes batch by batch.
///
/// At most `config.max_nodes` of `nodes` are used. Each batch is added to the graph and then
/// laid out on its own with the uniform grid, so batches do not see each other's sizes.
pub fn run_batched(
    nodes: &[String],
    config: &BatchConfig,
    grid: &UniformGridConfig,
) -> Result<BatchRun> {
    config.validate()?;
    grid.validate()?;

    let nodes = &nodes[..nodes.len().min(config.max_nodes)];
    let run_start = Instant::now();
    let mut graph = ReferenceGraph::new();
    let mut layouts = Vec::with_capacity(nodes.len().div_ceil(config.batch_size));
    let mut metrics = Vec::with_capacity(layouts.capacity());

    for (index, batch) in nodes.chunks(config.batch_size).enumerate() {
        let started_at_ms = millis(run_start);

        let creation_start = Instant::now();
        for id in batch {
            graph.add_node(GraphNode::new(id.clone()))?;
        }
        let creation_ms = millis(creation_start);

        let layout_start = Instant::now();
        layouts.push(layout_uniform(batch, &HashMap::new(), grid));
        let layout_ms = millis(layout_start);

        log::debug!(
            "Batch {}: {} nodes, creation {:.2} ms, layout {:.2} ms",
            index + 1,
            batch.len(),
            creation_ms,
            layout_ms
        );

        metrics.push(BatchMetrics {
            batch_number: index + 1,
            nodes_in_batch: batch.len(),
            started_at_ms,
            creation_ms,
            layout_ms,
            total_ms: creation_ms + layout_ms,
        });
    }

    let total_ms = millis(run_start);
    let summary = summarize(&metrics, nodes.len(), total_ms);
    log::info!(
        "Batched layout: {} nodes in {} batches, {:.2} s",
        summary.total_nodes,
        summary.batches,
        summary.total_seconds
    );

    Ok(BatchRun {
        graph,
        layouts,
        report: BatchReport { metrics, summary },
    })
}

fn summarize(metrics: &[BatchMetrics], total_nodes: usize, total_ms: f64) -> BatchSummary {
    let average = |f: fn(&BatchMetrics) -> f64| {
        if metrics.is_empty() {
            0.0
        } else {
            metrics.iter().map(f).sum::<f64>() / metrics.len() as f64
        }
    };

    BatchSummary {
        total_nodes,
        batches: metrics.len(),
        total_seconds: total_ms / 1000.0,
        avg_ms_per_node: if total_nodes == 0 {
            0.0
        } else {
            total_ms / total_nodes as f64
        },
        avg_creation_ms: average(|m| m.creation_ms),
        avg_layout_ms: average(|m| m.layout_ms),
    }
}

fn millis(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
