use crate::core::hist::compact::{CompactCoordinates, KernelWidth};
use crate::core::hist::error::HistError;
use crate::core::hist::partial::{Partial, PartialShape};
use crate::core::models::ids::BodyId;
use crate::engine::config::HistogramMode;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Interaction class a partial contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermClass {
    AtomAtom,
    AtomWater,
    WaterWater,
    AtomExv,
    WaterExv,
    ExvExv,
}

/// Identity of one cached partial histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TermKey {
    /// Pairs within the original copy of a body.
    SelfTerm(BodyId),
    /// Pairs of a body that involve at least one of its symmetry copies.
    Symmetry(BodyId),
    /// Pairs between two bodies, keyed by `(min, max)` of their ids.
    Cross(BodyId, BodyId),
    AtomWater(BodyId),
    WaterWater,
    AtomExv(BodyId),
    WaterExv,
    ExvExv,
}

impl TermKey {
    pub fn cross(a: BodyId, b: BodyId) -> Self {
        if a < b {
            TermKey::Cross(a, b)
        } else {
            TermKey::Cross(b, a)
        }
    }

    pub fn class(self) -> TermClass {
        match self {
            TermKey::SelfTerm(_) | TermKey::Symmetry(_) | TermKey::Cross(..) => TermClass::AtomAtom,
            TermKey::AtomWater(_) => TermClass::AtomWater,
            TermKey::WaterWater => TermClass::WaterWater,
            TermKey::AtomExv(_) => TermClass::AtomExv,
            TermKey::WaterExv => TermClass::WaterExv,
            TermKey::ExvExv => TermClass::ExvExv,
        }
    }

    /// True when the partial depends on the given body.
    pub fn involves(self, id: BodyId) -> bool {
        match self {
            TermKey::SelfTerm(a)
            | TermKey::Symmetry(a)
            | TermKey::AtomWater(a)
            | TermKey::AtomExv(a) => a == id,
            TermKey::Cross(a, b) => a == id || b == id,
            TermKey::WaterWater | TermKey::WaterExv | TermKey::ExvExv => false,
        }
    }

    pub fn is_excluded_volume(self) -> bool {
        matches!(
            self.class(),
            TermClass::AtomExv | TermClass::WaterExv | TermClass::ExvExv
        )
    }
}

/// Partial layout used for a class under a histogram mode.
pub fn shape_of(class: TermClass, mode: HistogramMode) -> PartialShape {
    match mode {
        HistogramMode::Unweighted => PartialShape::Counts,
        HistogramMode::Weighted => PartialShape::Weighted,
        HistogramMode::FormFactor => match class {
            TermClass::AtomAtom => PartialShape::PerFormFactorPair,
            TermClass::AtomWater | TermClass::AtomExv => PartialShape::PerFormFactor,
            TermClass::WaterWater | TermClass::WaterExv | TermClass::ExvExv => PartialShape::Counts,
        },
    }
}

/// The point sets a task scans.
#[derive(Debug, Clone)]
pub enum PairJob<'a> {
    /// All pairs within one store.
    Within(&'a CompactCoordinates),
    /// Pairs within `extra` plus pairs between `base` and `extra`.
    Extension {
        base: &'a CompactCoordinates,
        extra: &'a CompactCoordinates,
    },
    /// Pairs between the union of `first` and the union of `second`.
    Between {
        first: Vec<&'a CompactCoordinates>,
        second: Vec<&'a CompactCoordinates>,
    },
}

#[derive(Debug, Clone)]
pub struct PairTask<'a> {
    pub key: TermKey,
    pub job: PairJob<'a>,
}

/// Fixed parameters shared by every task of a calculation.
#[derive(Debug, Clone, Copy)]
pub struct ScanParams {
    pub mode: HistogramMode,
    pub bins: usize,
    pub inv_width: f32,
    pub kernel: KernelWidth,
}

impl PairTask<'_> {
    /// Scans the task's points into a fresh partial it owns.
    pub fn run(&self, params: &ScanParams) -> Result<(TermKey, Partial), HistError> {
        let mut partial = Partial::new(shape_of(self.key.class(), params.mode), params.bins);
        let (inv, kernel) = (params.inv_width, params.kernel);
        match &self.job {
            PairJob::Within(data) => partial.scan_self(data, inv, kernel)?,
            PairJob::Extension { base, extra } => {
                partial.scan_self(extra, inv, kernel)?;
                partial.scan_cross(base, extra, inv, kernel)?;
            }
            PairJob::Between { first, second } => {
                for a in first {
                    for b in second {
                        partial.scan_cross(a, b, inv, kernel)?;
                    }
                }
            }
        }
        Ok((self.key, partial))
    }
}

/// Runs every task and returns the results in task order.
///
/// Tasks share nothing mutable, so they run independently; the first failure is returned
/// and the other results are discarded.
#[instrument(skip_all, name = "pair_histogram_task")]
pub fn run(tasks: &[PairTask<'_>], params: &ScanParams) -> Result<Vec<(TermKey, Partial)>, HistError> {
    debug!(tasks = tasks.len(), bins = params.bins, "Scanning partial histograms");

    #[cfg(not(feature = "parallel"))]
    let iterator = tasks.iter();

    #[cfg(feature = "parallel")]
    let iterator = tasks.par_iter();

    iterator.map(|task| task.run(params)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;
    use slotmap::SlotMap;

    fn line(n: usize, offset: f64) -> CompactCoordinates {
        CompactCoordinates::from_atoms(
            (0..n).map(|i| Atom::new(Point3::new(offset + i as f64, 0.0, 0.0), 1.0)),
        )
    }

    fn params(mode: HistogramMode) -> ScanParams {
        ScanParams {
            mode,
            bins: 200,
            inv_width: 4.0,
            kernel: KernelWidth::Octo,
        }
    }

    #[test]
    fn cross_keys_are_order_independent() {
        let mut ids: SlotMap<BodyId, ()> = SlotMap::with_key();
        let (a, b) = (ids.insert(()), ids.insert(()));
        assert_eq!(TermKey::cross(a, b), TermKey::cross(b, a));
        assert!(TermKey::cross(a, b).involves(b));
        assert!(!TermKey::WaterWater.involves(a));
        assert_eq!(TermKey::Symmetry(a).class(), TermClass::AtomAtom);
        assert!(TermKey::WaterExv.is_excluded_volume());
    }

    #[test]
    fn form_factor_mode_resolves_only_atom_sides() {
        let mode = HistogramMode::FormFactor;
        assert_eq!(shape_of(TermClass::AtomAtom, mode), PartialShape::PerFormFactorPair);
        assert_eq!(shape_of(TermClass::AtomWater, mode), PartialShape::PerFormFactor);
        assert_eq!(shape_of(TermClass::WaterWater, mode), PartialShape::Counts);
        assert_eq!(
            shape_of(TermClass::ExvExv, HistogramMode::Weighted),
            PartialShape::Weighted
        );
    }

    #[test]
    fn jobs_count_the_expected_pairs() {
        let mut ids: SlotMap<BodyId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        let (a, b, c) = (line(4, 0.0), line(3, 10.0), line(2, 20.0));
        let tasks = vec![
            PairTask {
                key: TermKey::SelfTerm(id),
                job: PairJob::Within(&a),
            },
            PairTask {
                key: TermKey::Symmetry(id),
                job: PairJob::Extension { base: &a, extra: &b },
            },
            PairTask {
                key: TermKey::AtomWater(id),
                job: PairJob::Between {
                    first: vec![&a, &b],
                    second: vec![&c],
                },
            },
        ];
        let results = run(&tasks, &params(HistogramMode::Unweighted)).unwrap();
        let totals: Vec<f64> = results.iter().map(|(_, p)| p.total()).collect();
        assert_eq!(totals, vec![6.0, 3.0 + 12.0, 14.0]);
        assert_eq!(results[1].0, TermKey::Symmetry(id));
    }

    #[test]
    fn out_of_range_pair_fails_the_run() {
        let mut ids: SlotMap<BodyId, ()> = SlotMap::with_key();
        let id = ids.insert(());
        let far = line(2, 0.0);
        let store = CompactCoordinates::from_atoms([
            Atom::new(Point3::origin(), 1.0),
            Atom::new(Point3::new(100.0, 0.0, 0.0), 1.0),
        ]);
        let tasks = vec![
            PairTask {
                key: TermKey::SelfTerm(id),
                job: PairJob::Within(&far),
            },
            PairTask {
                key: TermKey::WaterWater,
                job: PairJob::Within(&store),
            },
        ];
        assert!(matches!(
            run(&tasks, &params(HistogramMode::Unweighted)),
            Err(HistError::Bounds { .. })
        ));
    }
}
