use nalgebra::Vector3;
use std::f64::consts::FRAC_PI_2;

const DUPLICATE_TOLERANCE: f64 = 1e-5;

/// Unit vectors covering the sphere at an angular step of `2π / divisions`.
///
/// One octant is sampled and reflected into the other seven, so the set is exactly
/// symmetric under every axis flip. Reflections of points on the coordinate planes coincide
/// and are kept only once.
pub fn sphere_directions(divisions: usize) -> Vec<Vector3<f64>> {
    let step = 2.0 * std::f64::consts::PI / divisions.max(1) as f64;
    let steps = (FRAC_PI_2 / step + DUPLICATE_TOLERANCE).floor() as usize;

    let mut directions: Vec<Vector3<f64>> = Vec::new();
    for ti in 0..=steps {
        let theta = ti as f64 * step;
        for pi in 0..=steps {
            let phi = pi as f64 * step;
            let base = Vector3::new(phi.cos() * theta.sin(), phi.sin() * theta.sin(), theta.cos())
                .map(|v| if v.abs() < DUPLICATE_TOLERANCE { 0.0 } else { v });

            for sx in [1.0, -1.0] {
                for sy in [1.0, -1.0] {
                    for sz in [1.0, -1.0] {
                        let candidate = Vector3::new(sx * base.x, sy * base.y, sz * base.z);
                        let present = directions
                            .iter()
                            .any(|d| (d - candidate).norm() < DUPLICATE_TOLERANCE);
                        if !present {
                            directions.push(candidate);
                        }
                    }
                }
            }
        }
    }
    directions
}

/// The six unit vectors along the coordinate axes.
pub fn axis_directions() -> [Vector3<f64>; 6] {
    [
        Vector3::x(),
        -Vector3::x(),
        Vector3::y(),
        -Vector3::y(),
        Vector3::z(),
        -Vector3::z(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_divisions_give_twenty_six_unique_unit_directions() {
        let directions = sphere_directions(8);
        // Octant samples at 0, 45 and 90 degrees reflect into 26 distinct directions.
        assert_eq!(directions.len(), 26);
        for d in &directions {
            assert!((d.norm() - 1.0).abs() < 1e-9);
        }
        for (i, a) in directions.iter().enumerate() {
            for b in &directions[i + 1..] {
                assert!((a - b).norm() > 1e-5);
            }
        }
    }

    #[test]
    fn directions_are_symmetric_under_inversion() {
        let directions = sphere_directions(8);
        for d in &directions {
            assert!(directions.iter().any(|o| (o + d).norm() < 1e-9));
        }
    }
}
