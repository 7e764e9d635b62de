//! Closed-form placements shared by the layout algorithms.

use std::f64::consts::{PI, TAU};

use super::types::Vec3;

/// Golden-angle spiral on a sphere of `radius`. A single point sits at the origin.
pub fn sphere_spiral(n: usize, radius: f64) -> Vec<Vec3> {
    if n == 1 {
        return vec![Vec3::ZERO];
    }
    let golden_angle = PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let y = 1.0 - 2.0 * i as f64 / (n - 1) as f64;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = i as f64 * golden_angle;
            Vec3::new(theta.cos() * r, y, theta.sin() * r) * radius
        })
        .collect()
}

/// Evenly spaced on a circle in the XZ plane. A single point sits at the origin.
pub fn circle(n: usize, radius: f64) -> Vec<Vec3> {
    if n == 1 {
        return vec![Vec3::ZERO];
    }
    (0..n)
        .map(|i| {
            let angle = TAU * i as f64 / n as f64;
            Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        })
        .collect()
}

/// Row and column of item `k` in a roughly square grid of `n` items, as
/// offsets from the grid center in cells.
pub fn grid_cell(k: usize, n: usize) -> (f64, f64) {
    let cols = (n as f64).sqrt().ceil().max(1.0) as usize;
    let rows = n.div_ceil(cols);
    let (row, col) = (k / cols, k % cols);
    (
        row as f64 - (rows as f64 - 1.0) / 2.0,
        col as f64 - (cols as f64 - 1.0) / 2.0,
    )
}

/// Shift every point so their mean is the origin.
pub fn recenter(points: &mut [Vec3]) {
    let center = Vec3::centroid(points);
    for p in points.iter_mut() {
        *p -= center;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_spiral_on_surface() {
        let points = sphere_spiral(7, 6.0);
        assert_eq!(points.len(), 7);
        for p in &points {
            assert!((p.length() - 6.0).abs() < 1e-9);
        }
        assert!((points[0].y - 6.0).abs() < 1e-9);
        assert!((points[6].y + 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_at_origin() {
        assert_eq!(sphere_spiral(1, 6.0), vec![Vec3::ZERO]);
        assert_eq!(circle(1, 6.0), vec![Vec3::ZERO]);
        assert!(circle(0, 6.0).is_empty());
    }

    #[test]
    fn test_circle_flat() {
        let points = circle(4, 2.0);
        assert!(points.iter().all(|p| p.y == 0.0));
        assert!((points[1].z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_cell() {
        // 5 items: 3 columns, 2 rows
        assert_eq!(grid_cell(0, 5), (-0.5, -1.0));
        assert_eq!(grid_cell(4, 5), (0.5, 0.0));
        assert_eq!(grid_cell(0, 1), (0.0, 0.0));
    }

    #[test]
    fn test_recenter() {
        let mut points = vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 1.0, 5.0)];
        recenter(&mut points);
        assert_eq!(points, vec![Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 0.0, 2.0)]);
    }
}
