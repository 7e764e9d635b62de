//! Depth leveling along foreign keys and per-level grid placement.

use std::collections::BTreeMap;

use super::analysis::Graph;
use super::placement::grid_cell;
use super::types::{HierarchyParams, Vec3, ViewMode};

fn assign_level(graph: &Graph, node: usize, level: i64, levels: &mut [Option<i64>]) {
    if let Some(current) = levels[node] {
        levels[node] = Some(current.max(level));
        return;
    }
    levels[node] = Some(level);
    for &parent in &graph.parents[node] {
        assign_level(graph, parent, level - 1, levels);
    }
    for &child in &graph.children[node] {
        assign_level(graph, child, level + 1, levels);
    }
}

/// Level per table. Walks from every root (no parents or no children) at
/// level 0, putting referenced tables one level above and referencing
/// tables one level below; a table seen again keeps the larger level.
/// Tables the walk never reaches get 0, then levels are shifted so the
/// smallest is 0.
pub fn assign_levels(graph: &Graph) -> Vec<i64> {
    let n = graph.len();
    let mut levels: Vec<Option<i64>> = vec![None; n];
    for root in (0..n).filter(|&i| graph.parents[i].is_empty() || graph.children[i].is_empty()) {
        assign_level(graph, root, 0, &mut levels);
    }

    let levels: Vec<i64> = levels.into_iter().map(|l| l.unwrap_or(0)).collect();
    let min = levels.iter().copied().min().unwrap_or(0);
    levels.into_iter().map(|l| l - min).collect()
}

/// X advances with the level. In 3D each level is a grid in the YZ plane
/// that also rises with the level; in 2D a level is a row along Z.
pub fn place(graph: &Graph, mode: ViewMode, params: &HierarchyParams) -> Vec<Vec3> {
    let levels = assign_levels(graph);
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (i, &level) in levels.iter().enumerate() {
        groups.entry(level).or_default().push(i);
    }

    let mut positions = vec![Vec3::ZERO; graph.len()];
    for (&level, members) in &groups {
        let x = level as f64 * params.level_spacing;
        let count = members.len();
        for (k, &i) in members.iter().enumerate() {
            positions[i] = match mode {
                ViewMode::ThreeD => {
                    let (row, col) = grid_cell(k, count);
                    Vec3::new(
                        x,
                        level as f64 * params.level_rise + row * params.grid_spacing,
                        col * params.grid_spacing,
                    )
                }
                ViewMode::TwoD => {
                    let offset = k as f64 - (count as f64 - 1.0) / 2.0;
                    Vec3::new(x, 0.0, offset * params.grid_spacing)
                }
            };
        }
    }

    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::analysis::Edge;

    fn graph(n: usize, edges: &[(usize, usize)]) -> Graph {
        let mut g = Graph {
            edges: Vec::new(),
            parents: vec![Vec::new(); n],
            children: vec![Vec::new(); n],
            columns: vec![1; n],
        };
        for &(child, parent) in edges {
            g.edges.push(Edge { child, parent });
            g.parents[child].push(parent);
            g.children[parent].push(child);
        }
        g
    }

    #[test]
    fn test_chain_levels() {
        // comments -> posts -> users
        let g = graph(3, &[(1, 0), (2, 1)]);
        assert_eq!(assign_levels(&g), vec![0, 1, 2]);
    }

    #[test]
    fn test_revisit_keeps_larger_level() {
        // 3 references 0 directly and through 2 -> 1; pulling 0 up from 3
        // lands it below 1.
        let g = graph(4, &[(1, 0), (2, 1), (3, 2), (3, 0)]);
        assert_eq!(assign_levels(&g), vec![1, 0, 1, 2]);
    }

    #[test]
    fn test_pure_cycle_is_level_zero() {
        let g = graph(2, &[(0, 1), (1, 0)]);
        assert_eq!(assign_levels(&g), vec![0, 0]);
    }

    #[test]
    fn test_cycle_with_root_terminates() {
        let g = graph(3, &[(0, 1), (1, 0), (2, 0)]);
        assert_eq!(assign_levels(&g), vec![0, 1, 1]);
    }

    #[test]
    fn test_place_2d_rows() {
        let g = graph(3, &[(1, 0), (2, 0)]);
        let points = place(&g, ViewMode::TwoD, &HierarchyParams::default());
        assert_eq!(points[0], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(points[1], Vec3::new(12.0, 0.0, -3.0));
        assert_eq!(points[2], Vec3::new(12.0, 0.0, 3.0));
    }

    #[test]
    fn test_place_3d_grid() {
        let g = graph(5, &[(1, 0), (2, 0), (3, 0), (4, 0)]);
        let points = place(&g, ViewMode::ThreeD, &HierarchyParams::default());
        assert_eq!(points[0], Vec3::new(0.0, 0.0, 0.0));
        // four children: 2x2 grid at level 1
        assert_eq!(points[1], Vec3::new(12.0, 7.0, -3.0));
        assert_eq!(points[4], Vec3::new(12.0, 13.0, 3.0));
    }
}
