use crate::config::UniformGridConfig;
use crate::geometry::{Point, Rect, Size};
use crate::state::LayoutState;
use std::collections::{BTreeMap, HashMap};

/// Columns for `n` cells so the grid approaches the configured aspect ratio
pub fn column_count(n: usize, aspect_ratio: f32) -> usize {
    ((n as f32 * aspect_ratio).sqrt().round() as usize).max(1)
}

/// Lay nodes out row-major on a grid of identical cells.
///
/// The cell is as large as the largest measured node (never smaller than the default size).
/// Each node keeps its own measured size, or the cell size when it never reported one.
pub fn layout_uniform(
    nodes: &[String],
    measured: &HashMap<String, Size>,
    config: &UniformGridConfig,
) -> LayoutState {
    if nodes.is_empty() {
        return LayoutState::empty();
    }

    let columns = column_count(nodes.len(), config.aspect_ratio);
    let rows = nodes.len().div_ceil(columns);
    let cell = nodes
        .iter()
        .filter_map(|id| measured.get(id))
        .fold(config.default_size, |acc, size| acc.max(*size));

    log::debug!(
        "Uniform grid: {rows}x{columns}, {} nodes, cell {}x{}",
        nodes.len(),
        cell.width,
        cell.height
    );

    let mut out = BTreeMap::new();
    for (i, id) in nodes.iter().enumerate() {
        let row = i / columns;
        let col = i % columns;
        let origin = Point::new(
            config.origin.x + col as f32 * (cell.width + config.horizontal_spacing),
            config.origin.y + row as f32 * (cell.height + config.vertical_spacing),
        );
        let size = measured.get(id).copied().unwrap_or(cell);
        out.insert(id.clone(), Rect::new(origin, size));
    }

    LayoutState::Flat { nodes: out }
}
