use super::cache::PartialCache;
use super::config::HistogramConfig;
use super::error::EngineError;
use super::tasks::pair_histogram::{self, PairJob, PairTask, ScanParams, TermKey};
use crate::core::hist::axis::Axis;
use crate::core::hist::compact::CompactCoordinates;
use crate::core::hist::composite::CompositeDistanceHistogram;
use crate::core::hist::error::HistError;
use crate::core::models::body::Body;
use crate::core::models::ids::BodyId;
use crate::core::models::molecule::Molecule;
use crate::core::table::sinc::SincTable;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Coordinate snapshots of one body.
#[derive(Debug, Clone)]
struct BodyStores {
    /// The original copy.
    base: CompactCoordinates,
    /// Every symmetry copy, if the body has any.
    symmetry: Option<CompactCoordinates>,
}

impl BodyStores {
    fn from_body(body: &Body) -> Self {
        Self {
            base: CompactCoordinates::from_atoms(body.absolute_atoms()),
            symmetry: (!body.symmetries().is_empty())
                .then(|| CompactCoordinates::from_atoms(body.symmetry_atoms())),
        }
    }

    /// All copies, original first.
    fn copies(&self) -> Vec<&CompactCoordinates> {
        std::iter::once(&self.base).chain(self.symmetry.as_ref()).collect()
    }
}

/// What the last calculation actually recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComputeStats {
    pub self_terms: usize,
    pub symmetry_terms: usize,
    pub cross_terms: usize,
    pub atom_water_terms: usize,
    pub water_water_terms: usize,
    pub excluded_volume_terms: usize,
    /// Successful calculations since the manager was created.
    pub calls: usize,
}

impl ComputeStats {
    fn record(&mut self, key: TermKey) {
        match key {
            TermKey::SelfTerm(_) => self.self_terms += 1,
            TermKey::Symmetry(_) => self.symmetry_terms += 1,
            TermKey::Cross(..) => self.cross_terms += 1,
            TermKey::AtomWater(_) => self.atom_water_terms += 1,
            TermKey::WaterWater => self.water_water_terms += 1,
            TermKey::AtomExv(_) | TermKey::WaterExv | TermKey::ExvExv => {
                self.excluded_volume_terms += 1
            }
        }
    }

    /// Number of partials recomputed, over every class.
    pub fn total(&self) -> usize {
        self.self_terms
            + self.symmetry_terms
            + self.cross_terms
            + self.atom_water_terms
            + self.water_water_terms
            + self.excluded_volume_terms
    }
}

/// Incremental distance-histogram engine for one molecule.
///
/// The manager caches one partial histogram per body, per body pair, and per solvent term,
/// together with the compact coordinate snapshots they were scanned from. A calculation reads
/// the molecule's change flags and rescans only the partials those flags invalidate; all
/// fresh partials are computed first, in parallel, and only then swapped into the master
/// sums. A failed calculation therefore leaves both the cache and the molecule's flags
/// exactly as they were.
///
/// A manager is bound to the molecule it first calculates: its cache keys are the body ids
/// of that molecule.
pub struct PartialHistogramManager {
    config: HistogramConfig,
    d_axis: Axis,
    q_axis: Axis,
    sinc: Arc<SincTable>,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
    bodies: HashMap<BodyId, BodyStores>,
    waters: Option<CompactCoordinates>,
    excluded_volume: Option<CompactCoordinates>,
    cache: PartialCache,
    stats: ComputeStats,
}

impl PartialHistogramManager {
    pub fn new(config: HistogramConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let d_axis = config.d_axis();
        let q_axis = config.q_axis;
        let sinc = Arc::new(SincTable::new(&q_axis.values(), &d_axis.values()));

        #[cfg(feature = "parallel")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| EngineError::ThreadPool(e.to_string()))?;

        debug!(
            bins = d_axis.bins,
            q_points = q_axis.bins,
            mode = ?config.mode,
            "Histogram manager initialized"
        );

        Ok(Self {
            cache: PartialCache::new(config.mode, d_axis.bins),
            config,
            d_axis,
            q_axis,
            sinc,
            #[cfg(feature = "parallel")]
            pool,
            bodies: HashMap::new(),
            waters: None,
            excluded_volume: None,
            stats: ComputeStats::default(),
        })
    }

    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }

    /// Breakdown of the most recent successful calculation.
    pub fn last_stats(&self) -> ComputeStats {
        self.stats
    }

    /// Drops every cached partial so the next calculation starts from scratch.
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.waters = None;
        self.excluded_volume = None;
        self.cache.clear();
    }

    /// Brings the cached partials up to date with `molecule` and returns the composite histogram.
    ///
    /// On success every change flag of the molecule is cleared. On failure nothing is committed
    /// and the flags are left untouched, so the next call retries the same work.
    #[instrument(skip_all, name = "histogram_calculation")]
    pub fn calculate(
        &mut self,
        molecule: &mut Molecule,
    ) -> Result<CompositeDistanceHistogram, EngineError> {
        if molecule.atom_count() == 0 {
            return Err(HistError::InvalidOperation("molecule contains no atoms").into());
        }

        let state = molecule.state();
        let ids = molecule.body_ids().to_vec();
        let present: HashSet<BodyId> = ids.iter().copied().collect();
        let removed_bodies: Vec<BodyId> = self
            .bodies
            .keys()
            .filter(|id| !present.contains(id))
            .copied()
            .collect();
        let with_exv = molecule.excluded_volume().is_some();

        let changed: HashSet<BodyId> = ids
            .iter()
            .copied()
            .filter(|&id| {
                state.is_externally_modified(id)
                    || state.is_internally_modified(id)
                    || !self.bodies.contains_key(&id)
            })
            .collect();
        let hydration_changed = state.is_modified_hydration() || self.waters.is_none();
        let exv_changed = with_exv
            && (state.is_modified_excluded_volume() || self.excluded_volume.is_none());

        let mut staged: HashMap<BodyId, BodyStores> = HashMap::new();
        let mut removed_keys: Vec<TermKey> = self
            .cache
            .keys()
            .filter(|key| removed_bodies.iter().any(|&id| key.involves(id)))
            .collect();
        for (id, body) in molecule.bodies() {
            if changed.contains(&id) {
                staged.insert(id, BodyStores::from_body(body));
            }
            if body.symmetries().is_empty() && self.cache.contains(TermKey::Symmetry(id)) {
                removed_keys.push(TermKey::Symmetry(id));
            }
        }
        let staged_waters = hydration_changed
            .then(|| CompactCoordinates::from_waters(molecule.hydration().waters()));
        let staged_exv = if exv_changed {
            molecule
                .excluded_volume()
                .map(CompactCoordinates::from_excluded_volume)
        } else {
            None
        };

        let params = ScanParams {
            mode: self.config.mode,
            bins: self.d_axis.bins,
            inv_width: (1.0 / self.d_axis.width()) as f32,
            kernel: self.config.kernel,
        };

        let results = {
            let stores = |id: BodyId| {
                staged
                    .get(&id)
                    .or_else(|| self.bodies.get(&id))
                    .ok_or(EngineError::BodyNotFound(id))
            };
            let waters = staged_waters
                .as_ref()
                .or(self.waters.as_ref())
                .ok_or_else(|| EngineError::Internal("water snapshot is missing".to_string()))?;
            let exv = if with_exv {
                Some(
                    staged_exv
                        .as_ref()
                        .or(self.excluded_volume.as_ref())
                        .ok_or_else(|| {
                            EngineError::Internal("excluded-volume snapshot is missing".to_string())
                        })?,
                )
            } else {
                None
            };
            let needs = |key: TermKey, dirty: bool| dirty || !self.cache.contains(key);
            let mut tasks: Vec<PairTask<'_>> = Vec::new();

            for &id in &ids {
                let key = TermKey::SelfTerm(id);
                if needs(key, state.is_internally_modified(id)) {
                    tasks.push(PairTask {
                        key,
                        job: PairJob::Within(&stores(id)?.base),
                    });
                }
            }

            for &id in &ids {
                let key = TermKey::Symmetry(id);
                let body = stores(id)?;
                if let Some(extra) = &body.symmetry {
                    if needs(key, changed.contains(&id)) {
                        tasks.push(PairTask {
                            key,
                            job: PairJob::Extension {
                                base: &body.base,
                                extra,
                            },
                        });
                    }
                }
            }

            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    let key = TermKey::cross(a, b);
                    if needs(key, changed.contains(&a) || changed.contains(&b)) {
                        tasks.push(PairTask {
                            key,
                            job: PairJob::Between {
                                first: stores(a)?.copies(),
                                second: stores(b)?.copies(),
                            },
                        });
                    }
                }
            }

            for &id in &ids {
                let key = TermKey::AtomWater(id);
                if needs(key, hydration_changed || changed.contains(&id)) {
                    tasks.push(PairTask {
                        key,
                        job: PairJob::Between {
                            first: stores(id)?.copies(),
                            second: vec![waters],
                        },
                    });
                }
            }

            if needs(TermKey::WaterWater, hydration_changed) {
                tasks.push(PairTask {
                    key: TermKey::WaterWater,
                    job: PairJob::Within(waters),
                });
            }

            if let Some(exv) = exv {
                for &id in &ids {
                    let key = TermKey::AtomExv(id);
                    if needs(key, exv_changed || changed.contains(&id)) {
                        tasks.push(PairTask {
                            key,
                            job: PairJob::Between {
                                first: stores(id)?.copies(),
                                second: vec![exv],
                            },
                        });
                    }
                }
                if needs(TermKey::WaterExv, exv_changed || hydration_changed) {
                    tasks.push(PairTask {
                        key: TermKey::WaterExv,
                        job: PairJob::Between {
                            first: vec![waters],
                            second: vec![exv],
                        },
                    });
                }
                if needs(TermKey::ExvExv, exv_changed) {
                    tasks.push(PairTask {
                        key: TermKey::ExvExv,
                        job: PairJob::Within(exv),
                    });
                }
            }

            debug!(
                tasks = tasks.len(),
                changed_bodies = changed.len(),
                removed_bodies = removed_bodies.len(),
                hydration_changed,
                exv_changed,
                "Scheduled partial histogram updates"
            );

            #[cfg(feature = "parallel")]
            let results = self.pool.install(|| pair_histogram::run(&tasks, &params));

            #[cfg(not(feature = "parallel"))]
            let results = pair_histogram::run(&tasks, &params);

            results?
        };

        let mut stats = ComputeStats {
            calls: self.stats.calls + 1,
            ..ComputeStats::default()
        };
        for key in removed_keys {
            self.cache.remove(key)?;
        }
        if !with_exv {
            self.cache.clear_excluded_volume();
            self.excluded_volume = None;
        }
        for (key, partial) in results {
            stats.record(key);
            self.cache.replace(key, partial)?;
        }
        for id in &removed_bodies {
            self.bodies.remove(id);
        }
        self.bodies.extend(staged);
        if let Some(waters) = staged_waters {
            self.waters = Some(waters);
        }
        if let Some(exv) = staged_exv {
            self.excluded_volume = Some(exv);
        }
        self.stats = stats;
        molecule.state_mut().reset_to_false();

        info!(
            self_terms = stats.self_terms,
            symmetry_terms = stats.symmetry_terms,
            cross_terms = stats.cross_terms,
            atom_water_terms = stats.atom_water_terms,
            water_water_terms = stats.water_water_terms,
            excluded_volume_terms = stats.excluded_volume_terms,
            cached = self.cache.len(),
            "Partial histograms updated"
        );

        let histogram = CompositeDistanceHistogram::from_terms(
            self.d_axis,
            self.q_axis,
            Arc::clone(&self.sinc),
            &self.cache.terms(with_exv),
        )?;
        Ok(histogram)
    }
}
