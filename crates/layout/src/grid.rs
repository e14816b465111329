//! Near-square grid packing for nodes inside a group and for groups against each other.
//!
//! Items are sorted by descending area, then every row count `1..=ceil(sqrt(n))` is tried.
//! Each column is as wide as its widest item and each row as tall as its tallest, with
//! `padding` between and around cells:
//!
//! ```text
//! width  = padding + Σ (column width  + padding)
//! height = padding + Σ (row height    + padding)
//! ```
//!
//! The candidate with the best score for the configured [`PackObjective`] wins; ties keep the
//! candidate with fewer rows.

use crate::config::{GridConfig, PackObjective};
use crate::geometry::{Point, Rect, Size};
use crate::state::{GroupLayout, LayoutState, NodeLayout};

/// Result of packing one list of items
#[derive(Debug, Clone, PartialEq)]
pub struct GridPacking {
    /// Top-left of each item, in input order, relative to the packed area's top-left
    pub positions: Vec<Point>,
    /// Bounding size including outer padding
    pub size: Size,
    pub rows: usize,
    pub columns: usize,
}

impl GridPacking {
    fn empty() -> Self {
        Self {
            positions: Vec::new(),
            size: Size::ZERO,
            rows: 0,
            columns: 0,
        }
    }
}

/// A named group and the measured sizes of its members
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMembers {
    pub name: String,
    pub nodes: Vec<(String, Size)>,
}

impl GroupMembers {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    pub fn with_node(mut self, id: impl Into<String>, size: Size) -> Self {
        self.nodes.push((id.into(), size));
        self
    }
}

struct Candidate {
    score: f32,
    columns: usize,
    column_widths: Vec<f32>,
    row_heights: Vec<f32>,
    size: Size,
}

/// Pack `sizes` into a grid. Deterministic for identical input.
pub fn pack(sizes: &[Size], padding: f32, objective: PackObjective) -> GridPacking {
    let n = sizes.len();
    if n == 0 {
        return GridPacking::empty();
    }

    // Stable: equal areas keep input order
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| sizes[b].area().total_cmp(&sizes[a].area()));

    let max_rows = (n as f64).sqrt().ceil() as usize;
    let mut best: Option<Candidate> = None;

    for rows in 1..=max_rows.max(1) {
        let candidate = measure(sizes, &order, rows, padding, objective);
        let better = match &best {
            Some(current) => candidate.score < current.score,
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    let Some(best) = best else {
        return GridPacking::empty();
    };

    let column_x = offsets(&best.column_widths, padding);
    let row_y = offsets(&best.row_heights, padding);

    let mut positions = vec![Point::ZERO; n];
    for (slot, &idx) in order.iter().enumerate() {
        let row = slot / best.columns;
        let col = slot % best.columns;
        positions[idx] = Point::new(column_x[col], row_y[row]);
    }

    log::debug!(
        "Packed {} items into {}x{} grid ({}x{})",
        n,
        best.row_heights.len(),
        best.columns,
        best.size.width,
        best.size.height
    );

    GridPacking {
        positions,
        size: best.size,
        rows: best.row_heights.len(),
        columns: best.columns,
    }
}

/// Pack the members of a single group
pub fn pack_group(sizes: &[Size], config: &GridConfig) -> GridPacking {
    pack(sizes, config.padding, config.objective)
}

/// Pack groups whose sizes are treated as opaque
pub fn pack_groups(group_sizes: &[Size], config: &GridConfig) -> GridPacking {
    pack(group_sizes, config.group_padding, config.group_objective)
}

/// Two-level grouped layout: pack each group's nodes, pack the groups, then offset every
/// node by its group's position.
///
/// A group without members keeps a zero size.
pub fn layout_groups(groups: &[GroupMembers], config: &GridConfig) -> LayoutState {
    let inner: Vec<GridPacking> = groups
        .iter()
        .map(|group| {
            let sizes: Vec<Size> = group.nodes.iter().map(|(_, size)| *size).collect();
            pack_group(&sizes, config)
        })
        .collect();

    let group_sizes: Vec<Size> = inner.iter().map(|packing| packing.size).collect();
    let outer = pack_groups(&group_sizes, config);

    let layouts = groups
        .iter()
        .zip(&inner)
        .zip(&outer.positions)
        .map(|((group, packing), &origin)| GroupLayout {
            name: group.name.clone(),
            rect: Rect::new(origin, packing.size),
            nodes: group
                .nodes
                .iter()
                .zip(&packing.positions)
                .map(|((id, size), &local)| NodeLayout {
                    id: id.clone(),
                    rect: Rect::new(origin.add_point(local), *size),
                })
                .collect(),
        })
        .collect();

    log::info!(
        "Grouped layout: {} groups, {} nodes, total {}x{}",
        groups.len(),
        groups.iter().map(|group| group.nodes.len()).sum::<usize>(),
        outer.size.width,
        outer.size.height
    );

    LayoutState::Grouped {
        groups: layouts,
        size: outer.size,
    }
}

fn measure(
    sizes: &[Size],
    order: &[usize],
    rows: usize,
    padding: f32,
    objective: PackObjective,
) -> Candidate {
    let n = order.len();
    let columns = n.div_ceil(rows);
    let used_rows = n.div_ceil(columns);

    let mut column_widths = vec![0.0f32; columns];
    let mut row_heights = vec![0.0f32; used_rows];
    for (slot, &idx) in order.iter().enumerate() {
        let row = slot / columns;
        let col = slot % columns;
        column_widths[col] = column_widths[col].max(sizes[idx].width);
        row_heights[row] = row_heights[row].max(sizes[idx].height);
    }

    let width = column_widths.iter().sum::<f32>() + padding * (columns + 1) as f32;
    let height = row_heights.iter().sum::<f32>() + padding * (used_rows + 1) as f32;
    let size = Size::new(width, height);

    Candidate {
        score: score(size, objective),
        columns,
        column_widths,
        row_heights,
        size,
    }
}

fn score(size: Size, objective: PackObjective) -> f32 {
    match objective {
        PackObjective::MinArea => size.area(),
        PackObjective::SquareAspect => {
            if size.height > 0.0 {
                (size.width / size.height - 1.0).abs()
            } else if size.width > 0.0 {
                f32::INFINITY
            } else {
                0.0
            }
        }
    }
}

/// Start coordinate of each track: `padding`, then accumulated `extent + padding`
fn offsets(extents: &[f32], padding: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(extents.len());
    let mut cursor = padding;
    for extent in extents {
        out.push(cursor);
        cursor += extent + padding;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square(side: f32) -> Size {
        Size::new(side, side)
    }

    #[test]
    fn four_equal_nodes_form_two_by_two() {
        let sizes = vec![square(100.0); 4];
        for objective in [PackObjective::MinArea, PackObjective::SquareAspect] {
            let packing = pack(&sizes, 20.0, objective);
            assert_eq!((packing.rows, packing.columns), (2, 2));
            assert_eq!(packing.size, Size::new(260.0, 260.0));
            assert_eq!(
                packing.positions,
                vec![
                    Point::new(20.0, 20.0),
                    Point::new(140.0, 20.0),
                    Point::new(20.0, 140.0),
                    Point::new(140.0, 140.0),
                ]
            );
        }
    }

    #[test]
    fn empty_input_is_zero_sized() {
        let packing = pack(&[], 20.0, PackObjective::MinArea);
        assert!(packing.positions.is_empty());
        assert_eq!(packing.size, Size::ZERO);
    }

    #[test]
    fn single_item_is_padded_on_all_sides() {
        let packing = pack(&[Size::new(80.0, 40.0)], 15.0, PackObjective::SquareAspect);
        assert_eq!(packing.positions, vec![Point::new(15.0, 15.0)]);
        assert_eq!(packing.size, Size::new(110.0, 70.0));
    }

    #[test]
    fn largest_items_are_placed_first() {
        let sizes = vec![square(10.0), square(50.0)];
        let packing = pack(&sizes, 0.0, PackObjective::MinArea);
        // one row wins: the big square takes the first column
        assert_eq!(packing.positions[1], Point::new(0.0, 0.0));
        assert_eq!(packing.positions[0], Point::new(50.0, 0.0));
    }

    #[test]
    fn objective_changes_the_chosen_grid() {
        // Wide items: one row is smallest, a column stack is squarer
        let sizes = vec![Size::new(300.0, 10.0); 4];
        let area = pack(&sizes, 0.0, PackObjective::MinArea);
        let square = pack(&sizes, 0.0, PackObjective::SquareAspect);

        assert_eq!(area.size.area(), 1200.0 * 10.0);
        assert_eq!((area.rows, area.columns), (1, 4));
        assert_eq!((square.rows, square.columns), (2, 2));
    }

    #[test]
    fn grouped_layout_offsets_nodes_by_group_position() {
        let config = GridConfig {
            padding: 10.0,
            group_padding: 30.0,
            ..Default::default()
        };
        let groups = vec![
            GroupMembers::new("big")
                .with_node("A", square(100.0))
                .with_node("B", square(100.0)),
            GroupMembers::new("small").with_node("C", square(20.0)),
            GroupMembers::new("empty"),
        ];

        let state = layout_groups(&groups, &config);
        let LayoutState::Grouped { groups: laid, size } = &state else {
            panic!("expected grouped state");
        };

        assert_eq!(laid.len(), 3);
        for group in laid {
            for node in &group.nodes {
                assert!(group.rect.contains_rect(&node.rect), "{} escapes", node.id);
            }
        }
        for (i, a) in laid.iter().enumerate() {
            for b in &laid[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect), "{} overlaps {}", a.name, b.name);
            }
        }

        let empty = laid.iter().find(|g| g.name == "empty").unwrap();
        assert_eq!(empty.rect.size(), Size::ZERO);

        let small = laid.iter().find(|g| g.name == "small").unwrap();
        assert_eq!(small.nodes[0].rect.x, small.rect.x + 10.0);
        assert!(size.width > 0.0 && size.height > 0.0);
    }
}
