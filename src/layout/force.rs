//! Force-directed spring/repulsion simulation.

use super::analysis::Graph;
use super::placement::{circle, sphere_spiral};
use super::types::{CircularParams, ForceParams, Vec3, ViewMode};

/// Run the fixed-length simulation from the spiral (3D) or circle (2D)
/// start. Each iteration applies repulsion, then centering, then springs,
/// then integrates with fresh velocities.
pub fn simulate(graph: &Graph, mode: ViewMode, params: &ForceParams, start: &CircularParams) -> Vec<Vec3> {
    let n = graph.len();
    let radius = start.radius(n);
    let mut positions = match mode {
        ViewMode::ThreeD => sphere_spiral(n, radius),
        ViewMode::TwoD => circle(n, radius),
    };
    let masses: Vec<f64> = graph
        .columns
        .iter()
        .map(|&c| 1.0 + params.mass_per_column * c as f64)
        .collect();

    let (strength, rest_length) = match mode {
        ViewMode::ThreeD => (params.repulsion_3d, params.rest_length_3d),
        ViewMode::TwoD => (params.repulsion_2d, params.rest_length_2d),
    };

    for _ in 0..params.iterations {
        let mut velocities = vec![Vec3::ZERO; n];

        for i in 0..n {
            for j in i + 1..n {
                let delta = positions[i] - positions[j];
                let distance = delta.length();
                let (direction, distance) = if distance < params.min_distance {
                    (Vec3::X, params.min_distance)
                } else {
                    (delta / distance, distance)
                };
                let push = direction * (strength / (distance * distance));
                velocities[i] += push;
                velocities[j] -= push;
            }
        }

        if mode.is_3d() {
            let center = Vec3::centroid(&positions);
            for (v, &p) in velocities.iter_mut().zip(&positions) {
                let pull = (center - p) * params.centering;
                let length = pull.length();
                *v += if length > params.centering_limit {
                    pull * (params.centering_limit / length)
                } else {
                    pull
                };
            }
        }

        for edge in &graph.edges {
            let (a, b) = (edge.child, edge.parent);
            let delta = positions[b] - positions[a];
            let distance = delta.length();
            if distance < params.min_distance {
                continue;
            }
            let pull = delta / distance * ((distance - rest_length) * params.stiffness);
            velocities[a] += pull / masses[a];
            velocities[b] -= pull / masses[b];
        }

        for (p, v) in positions.iter_mut().zip(&velocities) {
            *p += *v * params.damping;
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
            columns: vec![2; n],
        };
        for &(child, parent) in edges {
            g.edges.push(Edge { child, parent });
            g.parents[child].push(parent);
            g.children[parent].push(child);
        }
        g
    }

    #[test]
    fn test_deterministic() {
        let g = graph(5, &[(1, 0), (2, 0), (3, 1), (4, 3)]);
        let params = ForceParams::default();
        let start = CircularParams::default();
        let a = simulate(&g, ViewMode::ThreeD, &params, &start);
        let b = simulate(&g, ViewMode::ThreeD, &params, &start);
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite()));
    }

    #[test]
    fn test_2d_stays_flat() {
        let g = graph(4, &[(1, 0), (2, 1), (3, 2)]);
        let points = simulate(&g, ViewMode::TwoD, &ForceParams::default(), &CircularParams::default());
        assert!(points.iter().all(|p| p.y == 0.0));
    }

    #[test]
    fn test_linked_pair_closer_than_unlinked() {
        let params = ForceParams::default();
        let start = CircularParams::default();
        let linked = simulate(&graph(2, &[(1, 0)]), ViewMode::TwoD, &params, &start);
        let free = simulate(&graph(2, &[]), ViewMode::TwoD, &params, &start);
        assert!((linked[0] - linked[1]).length() < (free[0] - free[1]).length());
    }

    #[test]
    fn test_zero_iterations_keeps_start() {
        let params = ForceParams {
            iterations: 0,
            ..ForceParams::default()
        };
        let start = CircularParams::default();
        let points = simulate(&graph(3, &[]), ViewMode::ThreeD, &params, &start);
        assert_eq!(points, sphere_spiral(3, start.radius(3)));
    }
}
