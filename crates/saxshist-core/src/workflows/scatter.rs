use crate::core::hist::profile::ScatteringProfile;
use crate::core::models::molecule::Molecule;
use crate::engine::error::EngineError;
use crate::engine::manager::PartialHistogramManager;
use tracing::{info, instrument};

/// Brings the histogram of `molecule` up to date and transforms it into a scattering profile.
///
/// `k` scales the hydration shell and `cx` the excluded volume. Only the partials invalidated
/// since the previous call are rescanned; the scaling factors themselves never trigger a rescan.
#[instrument(skip_all, name = "scattering_workflow")]
pub fn run(
    manager: &mut PartialHistogramManager,
    molecule: &mut Molecule,
    k: f64,
    cx: f64,
) -> Result<ScatteringProfile, EngineError> {
    let mut histogram = manager.calculate(molecule)?;
    histogram.apply_water_scaling_factor(k)?;
    histogram.apply_excluded_volume_scaling_factor(cx)?;
    let profile = histogram.debye_transform()?;

    info!(
        points = profile.len(),
        k,
        cx,
        recomputed = manager.last_stats().total(),
        "Scattering profile computed"
    );
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hist::axis::Axis;
    use crate::core::models::atom::{Atom, Water};
    use crate::core::models::body::Body;
    use crate::core::models::hydration::HydrationLayer;
    use crate::engine::config::HistogramConfig;
    use nalgebra::{Point3, Vector3};

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
    }

    fn manager() -> PartialHistogramManager {
        let config = HistogramConfig::builder()
            .bin_width(0.25)
            .max_distance(40.0)
            .q_axis(Axis::new(0.0, 0.4, 20))
            .build()
            .unwrap();
        PartialHistogramManager::new(config).unwrap()
    }

    fn molecule(with_waters: bool) -> Molecule {
        let atoms = (0..6)
            .map(|i| Atom::new(Point3::new(i as f64 * 1.3, (i % 2) as f64, 0.0), 1.0 + i as f64))
            .collect();
        let mut molecule = Molecule::from_bodies([Body::new(atoms)]);
        if with_waters {
            molecule.set_hydration(HydrationLayer::new(vec![
                Water::new(Point3::new(0.0, 3.0, 0.0)),
                Water::new(Point3::new(4.0, 3.0, 1.0)),
            ]));
        }
        molecule
    }

    #[test]
    fn forward_intensity_equals_total_weight() {
        let mut molecule = molecule(true);
        let profile = run(&mut manager(), &mut molecule, 1.0, 1.0).unwrap();

        let atoms: Vec<f64> = (0..6).map(|i| 1.0 + i as f64).collect();
        let sum: f64 = atoms.iter().sum();
        let squares: f64 = atoms.iter().map(|w| w * w).sum();
        let aa = (sum * sum - squares) / 2.0;
        let expected = aa + 2.0 * sum + 1.0;
        assert!(f64_approx_equal(profile.intensity[0], expected));
    }

    #[test]
    fn zero_water_factor_matches_a_dry_molecule() {
        let wet = run(&mut manager(), &mut molecule(true), 0.0, 1.0).unwrap();
        let dry = run(&mut manager(), &mut molecule(false), 1.0, 1.0).unwrap();

        assert_eq!(wet.len(), dry.len());
        for ((_, a), (_, b)) in wet.iter().zip(dry.iter()) {
            assert!(f64_approx_equal(a, b));
        }
    }

    #[test]
    fn rigid_motion_of_a_single_body_leaves_the_profile_unchanged() {
        let mut molecule = molecule(false);
        let id = molecule.body_ids()[0];
        let mut manager = manager();
        let before = run(&mut manager, &mut molecule, 1.0, 1.0).unwrap();

        molecule.translate(id, &Vector3::new(3.0, -2.0, 5.0)).unwrap();
        let after = run(&mut manager, &mut molecule, 1.0, 1.0).unwrap();

        assert_eq!(manager.last_stats().self_terms, 0);
        assert_eq!(before, after);
    }
}
