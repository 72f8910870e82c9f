use crate::core::grid::grid::Grid;
use crate::core::hydrate::culling;
use crate::core::models::atom::{Atom, Water};
use crate::core::models::hydration::HydrationLayer;
use crate::core::models::molecule::Molecule;
use crate::engine::config::HydrationConfig;
use crate::engine::error::EngineError;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct HydrationReport {
    /// Waters accepted by the placement strategy, before culling.
    pub candidates: usize,
    /// Waters installed in the molecule.
    pub waters: usize,
    /// Envelope volume of the molecule on the grid, in cubic Angstroms.
    pub volume: f64,
    /// Size of the excluded-volume cloud, when one was generated.
    pub excluded_volume_points: Option<usize>,
}

/// Generates a hydration shell for `molecule` and installs it.
///
/// Every copy of every body is placed on a fresh grid enclosing the molecule, and the volume
/// is expanded to fill in the molecular envelope before waters are placed. The candidate set is
/// culled down to `water_fraction` waters per atom. When `excluded_volume` is enabled the
/// envelope is also installed as the molecule's excluded volume; otherwise any existing one is
/// left untouched.
///
/// The molecule is modified only once every step has succeeded.
#[instrument(skip_all, name = "hydration_workflow")]
pub fn run(molecule: &mut Molecule, config: &HydrationConfig) -> Result<HydrationReport, EngineError> {
    config.validate()?;

    let bodies: Vec<_> = molecule
        .bodies()
        .map(|(id, body)| (id, body.all_absolute_atoms().collect::<Vec<Atom>>()))
        .collect();
    let mut grid = Grid::enclosing(bodies.iter().flat_map(|(_, atoms)| atoms), config.grid)?;
    for (id, atoms) in &bodies {
        grid.place_body(*id, atoms)?;
    }
    grid.expand_volume();
    info!(
        atoms = grid.atoms().len(),
        dims = ?grid.dims(),
        strategy = ?config.strategy,
        "Placed structure on hydration grid"
    );

    let candidates = grid.generate_explicit_hydration(config.strategy)?;
    let candidate_count = candidates.len();
    if candidate_count == 0 {
        warn!("Hydration strategy produced no waters");
    }
    let target = config.target_waters(molecule.atom_count());
    let kept = culling::cull(&mut grid, candidates, target, config.culling, config.seed)?;

    let excluded_volume = if config.excluded_volume {
        Some(grid.generate_excluded_volume()?)
    } else {
        None
    };

    let report = HydrationReport {
        candidates: candidate_count,
        waters: kept.len(),
        volume: grid.volume(),
        excluded_volume_points: excluded_volume.as_ref().map(|exv| exv.len()),
    };

    let waters: Vec<Water> = kept.iter().map(|placed| placed.water).collect();
    molecule.set_hydration(HydrationLayer::new(waters));
    if let Some(exv) = excluded_volume {
        molecule.set_excluded_volume(Some(exv));
    }

    info!(
        candidates = report.candidates,
        waters = report.waters,
        volume = report.volume,
        "Hydration shell installed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::error::GridError;
    use crate::core::grid::grid::{GridSettings, RadiusModel};
    use crate::core::hydrate::culling::CullingStrategy;
    use crate::core::hydrate::placement::HydrationStrategy;
    use crate::core::models::body::Body;
    use nalgebra::Point3;

    fn config(fraction: f64) -> HydrationConfig {
        HydrationConfig::builder()
            .grid(GridSettings {
                radius_model: RadiusModel::Uniform(1.0),
                ..GridSettings::default()
            })
            .strategy(HydrationStrategy::Axes)
            .water_fraction(fraction)
            .build()
            .unwrap()
    }

    fn lone_atom() -> Molecule {
        Molecule::from_bodies([Body::new(vec![Atom::new(Point3::origin(), 1.0)])])
    }

    #[test]
    fn installs_every_candidate_when_target_is_large() {
        let mut molecule = lone_atom();
        let report = run(&mut molecule, &config(10.0)).unwrap();

        assert_eq!(report.candidates, 6);
        assert_eq!(report.waters, 6);
        assert_eq!(molecule.hydration().len(), 6);
        assert!(molecule.state().is_modified_hydration());
        assert!(molecule.excluded_volume().is_none());
        for water in molecule.hydration().iter() {
            assert!((water.position.coords.norm() - 2.52).abs() < 1e-9);
        }
    }

    #[test]
    fn culls_to_water_fraction() {
        let mut molecule = Molecule::from_bodies([
            Body::new(vec![Atom::new(Point3::new(0.0, 0.0, 0.0), 1.0)]),
            Body::new(vec![Atom::new(Point3::new(2.0, 0.0, 0.0), 1.0)]),
        ]);
        let report = run(&mut molecule, &config(2.0)).unwrap();

        assert_eq!(report.candidates, 10);
        assert_eq!(report.waters, 4);
        assert_eq!(molecule.hydration().len(), 4);
    }

    #[test]
    fn body_counter_culling_splits_by_body() {
        let mut molecule = Molecule::from_bodies([
            Body::new(vec![Atom::new(Point3::new(0.0, 0.0, 0.0), 1.0)]),
            Body::new(vec![Atom::new(Point3::new(8.0, 0.0, 0.0), 1.0)]),
        ]);
        let mut config = config(2.0);
        config.culling = CullingStrategy::BodyCounter;
        let report = run(&mut molecule, &config).unwrap();

        assert_eq!(report.waters, 4);
        let near_first = molecule
            .hydration()
            .iter()
            .filter(|w| w.position.x < 4.0)
            .count();
        assert_eq!(near_first, 2);
    }

    #[test]
    fn excluded_volume_is_installed_on_request() {
        let mut molecule = lone_atom();
        let mut config = config(10.0);
        config.excluded_volume = true;
        let report = run(&mut molecule, &config).unwrap();

        let exv = molecule.excluded_volume().unwrap();
        assert_eq!(report.excluded_volume_points, Some(exv.len()));
        assert!(!exv.is_empty());
        assert!(report.volume > 0.0);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let mut first = lone_atom();
        let mut second = lone_atom();
        run(&mut first, &config(3.0)).unwrap();
        run(&mut second, &config(3.0)).unwrap();
        assert_eq!(first.hydration(), second.hydration());
    }

    #[test]
    fn empty_molecule_is_rejected_without_changes() {
        let mut molecule = Molecule::new();
        let result = run(&mut molecule, &config(1.0));
        assert!(matches!(
            result,
            Err(EngineError::Grid {
                source: GridError::InvalidOperation(_)
            })
        ));
        assert!(molecule.hydration().is_empty());
    }

    #[test]
    fn missing_form_factor_fails_under_van_der_waals_radii() {
        let mut molecule = lone_atom();
        let config = HydrationConfig::default();
        let result = run(&mut molecule, &config);
        assert!(matches!(
            result,
            Err(EngineError::Grid {
                source: GridError::InvalidStructure(_)
            })
        ));
    }
}
