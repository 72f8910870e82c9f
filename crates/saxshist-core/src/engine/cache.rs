use super::config::HistogramMode;
use super::tasks::pair_histogram::{TermClass, TermKey, shape_of};
use crate::core::hist::composite::{ExcludedVolumeTerms, HistogramTerms};
use crate::core::hist::error::HistError;
use crate::core::hist::partial::Partial;
use std::collections::HashMap;

/// One running sum per interaction class.
#[derive(Debug, Clone)]
struct MasterTerms {
    aa: Partial,
    aw: Partial,
    ww: Partial,
    ax: Partial,
    wx: Partial,
    xx: Partial,
}

impl MasterTerms {
    fn new(mode: HistogramMode, bins: usize) -> Self {
        let empty = |class| Partial::new(shape_of(class, mode), bins);
        Self {
            aa: empty(TermClass::AtomAtom),
            aw: empty(TermClass::AtomWater),
            ww: empty(TermClass::WaterWater),
            ax: empty(TermClass::AtomExv),
            wx: empty(TermClass::WaterExv),
            xx: empty(TermClass::ExvExv),
        }
    }

    fn get_mut(&mut self, class: TermClass) -> &mut Partial {
        match class {
            TermClass::AtomAtom => &mut self.aa,
            TermClass::AtomWater => &mut self.aw,
            TermClass::WaterWater => &mut self.ww,
            TermClass::AtomExv => &mut self.ax,
            TermClass::WaterExv => &mut self.wx,
            TermClass::ExvExv => &mut self.xx,
        }
    }
}

/// Cached partial histograms and the master sums built from them.
///
/// Every cached partial is included exactly once in the master of its class. Replacing or
/// removing a partial keeps that true by subtracting the stale copy before the fresh one is
/// added, so the master never has to be rebuilt from the whole cache.
#[derive(Debug, Clone)]
pub struct PartialCache {
    mode: HistogramMode,
    bins: usize,
    partials: HashMap<TermKey, Partial>,
    master: MasterTerms,
}

impl PartialCache {
    pub fn new(mode: HistogramMode, bins: usize) -> Self {
        Self {
            mode,
            bins,
            partials: HashMap::new(),
            master: MasterTerms::new(mode, bins),
        }
    }

    pub fn contains(&self, key: TermKey) -> bool {
        self.partials.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = TermKey> + '_ {
        self.partials.keys().copied()
    }

    /// Swaps in a fresh partial for `key`, moving the master of its class along.
    pub fn replace(&mut self, key: TermKey, fresh: Partial) -> Result<(), HistError> {
        let master = self.master.get_mut(key.class());
        if let Some(stale) = self.partials.get(&key) {
            master.subtract(stale)?;
        }
        master.accumulate(&fresh)?;
        self.partials.insert(key, fresh);
        Ok(())
    }

    /// Drops the partial for `key` and takes it out of the master. Unknown keys are a no-op.
    pub fn remove(&mut self, key: TermKey) -> Result<(), HistError> {
        if let Some(stale) = self.partials.remove(&key) {
            self.master.get_mut(key.class()).subtract(&stale)?;
        }
        Ok(())
    }

    /// Forgets every excluded-volume partial and zeroes the matching masters.
    pub fn clear_excluded_volume(&mut self) {
        self.partials.retain(|key, _| !key.is_excluded_volume());
        for class in [TermClass::AtomExv, TermClass::WaterExv, TermClass::ExvExv] {
            *self.master.get_mut(class) = Partial::new(shape_of(class, self.mode), self.bins);
        }
    }

    pub fn clear(&mut self) {
        self.partials.clear();
        self.master = MasterTerms::new(self.mode, self.bins);
    }

    /// Snapshot of the masters, with the excluded-volume classes only when requested.
    pub fn terms(&self, with_excluded_volume: bool) -> HistogramTerms {
        let master = &self.master;
        HistogramTerms {
            aa: master.aa.clone(),
            aw: master.aw.clone(),
            ww: master.ww.clone(),
            excluded_volume: with_excluded_volume.then(|| ExcludedVolumeTerms {
                ax: master.ax.clone(),
                wx: master.wx.clone(),
                xx: master.xx.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hist::distribution::Distribution1D;
    use crate::core::models::ids::BodyId;
    use slotmap::SlotMap;

    fn counts(entries: &[(usize, f64)]) -> Partial {
        let mut dist = Distribution1D::new(8);
        for &(bin, value) in entries {
            dist.add(bin, value).unwrap();
        }
        Partial::Counts(dist)
    }

    #[test]
    fn replacing_a_partial_swaps_its_contribution() {
        let mut ids: SlotMap<BodyId, ()> = SlotMap::with_key();
        let (a, b) = (ids.insert(()), ids.insert(()));
        let mut cache = PartialCache::new(HistogramMode::Unweighted, 8);

        cache.replace(TermKey::SelfTerm(a), counts(&[(1, 2.0)])).unwrap();
        cache.replace(TermKey::cross(a, b), counts(&[(3, 5.0)])).unwrap();
        cache.replace(TermKey::SelfTerm(a), counts(&[(2, 1.0)])).unwrap();

        let aa = cache.terms(false).aa.collapse();
        assert_eq!(aa.counts(), &[0.0, 0.0, 1.0, 5.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn removing_a_partial_takes_it_out_of_the_master() {
        let mut ids: SlotMap<BodyId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let mut cache = PartialCache::new(HistogramMode::Unweighted, 8);
        cache.replace(TermKey::AtomWater(a), counts(&[(4, 3.0)])).unwrap();
        cache.replace(TermKey::WaterWater, counts(&[(4, 1.0)])).unwrap();

        cache.remove(TermKey::AtomWater(a)).unwrap();
        cache.remove(TermKey::AtomWater(a)).unwrap();

        let terms = cache.terms(false);
        assert_eq!(terms.aw.total(), 0.0);
        assert_eq!(terms.ww.total(), 1.0);
        assert!(!cache.contains(TermKey::AtomWater(a)));
    }

    #[test]
    fn clearing_excluded_volume_leaves_other_classes() {
        let mut ids: SlotMap<BodyId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let mut cache = PartialCache::new(HistogramMode::Unweighted, 8);
        cache.replace(TermKey::SelfTerm(a), counts(&[(1, 1.0)])).unwrap();
        cache.replace(TermKey::AtomExv(a), counts(&[(1, 2.0)])).unwrap();
        cache.replace(TermKey::ExvExv, counts(&[(2, 2.0)])).unwrap();

        cache.clear_excluded_volume();

        assert_eq!(cache.len(), 1);
        let terms = cache.terms(true);
        let exv = terms.excluded_volume.unwrap();
        assert_eq!(exv.ax.total() + exv.xx.total(), 0.0);
        assert_eq!(terms.aa.total(), 1.0);
    }

    #[test]
    fn form_factor_masters_use_resolved_shapes() {
        let cache = PartialCache::new(HistogramMode::FormFactor, 8);
        let terms = cache.terms(true);
        assert!(matches!(terms.aa, Partial::PerFormFactorPair(_)));
        assert!(matches!(terms.aw, Partial::PerFormFactor(_)));
        assert!(matches!(terms.ww, Partial::Counts(_)));
        assert!(matches!(
            terms.excluded_volume.map(|e| e.ax),
            Some(Partial::PerFormFactor(_))
        ));
    }
}
