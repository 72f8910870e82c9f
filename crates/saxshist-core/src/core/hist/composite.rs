use super::axis::Axis;
use super::distribution::{Distribution2D, Distribution3D};
use super::error::HistError;
use super::histogram::{DistanceHistogram, dot, effective_bins};
use super::partial::Partial;
use super::profile::ScatteringProfile;
use crate::core::form_factor::{FormFactorTable, FormFactorType};
use crate::core::table::sinc::SincTable;
use std::sync::Arc;

/// Master accumulators for every interaction class, as maintained by the histogram engine.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramTerms {
    /// Atom-atom pairs, self and cross terms of every body.
    pub aa: Partial,
    /// Atom-water pairs.
    pub aw: Partial,
    /// Water-water pairs.
    pub ww: Partial,
    pub excluded_volume: Option<ExcludedVolumeTerms>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedVolumeTerms {
    /// Atom-excluded-volume pairs.
    pub ax: Partial,
    /// Water-excluded-volume pairs.
    pub wx: Partial,
    /// Excluded-volume self pairs.
    pub xx: Partial,
}

#[derive(Debug, Clone, PartialEq)]
struct Terms {
    aa: Vec<f64>,
    aw: Vec<f64>,
    ww: Vec<f64>,
    exv: Option<[Vec<f64>; 3]>,
}

#[derive(Debug, Clone)]
enum Resolution {
    /// Nominal bin centres; the shared sinc table applies.
    Plain,
    /// Mean distance per bin, pooled over every interaction class, with the sinc table
    /// tabulated on those distances.
    Weighted {
        distances: Vec<f64>,
        sinc: Arc<SincTable>,
    },
    FormFactor(Box<FormFactorTerms>),
}

#[derive(Debug, Clone)]
struct FormFactorTerms {
    aa: Distribution3D,
    aw: Distribution2D,
    ax: Option<Distribution2D>,
    table: Arc<FormFactorTable>,
}

/// The distance histogram of a hydrated structure, kept split by interaction class.
///
/// Keeping the classes apart lets the scaling factors of the fitting layer be changed
/// without touching any atoms. The master histogram always satisfies, bin for bin,
///
/// ```text
/// total = aa + k·aw + k²·ww - cx·ax - k·cx·wx + cx²·xx
/// ```
///
/// where `k` is the water scaling factor and `cx` the excluded-volume scaling factor. The
/// excluded-volume classes are absent unless an excluded volume was part of the calculation.
#[derive(Debug, Clone)]
pub struct CompositeDistanceHistogram {
    d_axis: Axis,
    q_axis: Axis,
    sinc: Arc<SincTable>,
    terms: Option<Terms>,
    resolution: Resolution,
    water_factor: f64,
    exv_factor: f64,
    total: Vec<f64>,
    bins: usize,
}

impl CompositeDistanceHistogram {
    /// An empty histogram with no partials yet.
    pub fn new(d_axis: Axis, q_axis: Axis, sinc: Arc<SincTable>) -> Self {
        Self {
            d_axis,
            q_axis,
            sinc,
            terms: None,
            resolution: Resolution::Plain,
            water_factor: 1.0,
            exv_factor: 1.0,
            total: Vec::new(),
            bins: 0,
        }
    }

    /// Builds the histogram from the engine's master accumulators, with both scaling factors at one.
    pub fn from_terms(
        d_axis: Axis,
        q_axis: Axis,
        sinc: Arc<SincTable>,
        source: &HistogramTerms,
    ) -> Result<Self, HistError> {
        if sinc.q_len() != q_axis.bins || sinc.d_len() < d_axis.bins {
            return Err(HistError::Size {
                expected: q_axis.bins * d_axis.bins,
                found: sinc.q_len() * sinc.d_len(),
            });
        }

        let collapse = |partial: &Partial| -> Result<Vec<f64>, HistError> {
            let counts = partial.collapse().into_counts();
            if counts.len() != d_axis.bins {
                return Err(HistError::Size {
                    expected: d_axis.bins,
                    found: counts.len(),
                });
            }
            Ok(counts)
        };

        let terms = Terms {
            aa: collapse(&source.aa)?,
            aw: collapse(&source.aw)?,
            ww: collapse(&source.ww)?,
            exv: source
                .excluded_volume
                .as_ref()
                .map(|exv| -> Result<[Vec<f64>; 3], HistError> {
                    Ok([collapse(&exv.ax)?, collapse(&exv.wx)?, collapse(&exv.xx)?])
                })
                .transpose()?,
        };
        let resolution = Self::resolve(source, d_axis.width(), &q_axis.values())?;

        let mut histogram = Self {
            d_axis,
            q_axis,
            sinc,
            terms: Some(terms),
            resolution,
            water_factor: 1.0,
            exv_factor: 1.0,
            total: Vec::new(),
            bins: 0,
        };
        histogram.recompute_total();
        Ok(histogram)
    }

    /// Resolves how the master histogram is transformed. Every table the transform needs is
    /// built here, once, since none of them depend on the scaling factors.
    fn resolve(source: &HistogramTerms, width: f64, q: &[f64]) -> Result<Resolution, HistError> {
        match &source.aa {
            Partial::Counts(_) => Ok(Resolution::Plain),
            Partial::Weighted(aa) => {
                let mut pooled = aa.clone();
                let mut others = vec![&source.aw, &source.ww];
                if let Some(exv) = &source.excluded_volume {
                    others.extend([&exv.ax, &exv.wx, &exv.xx]);
                }
                for other in others {
                    let Partial::Weighted(d) = other else {
                        return Err(HistError::InvalidOperation(
                            "weighted histograms require weighted partials for every class",
                        ));
                    };
                    pooled.accumulate(d)?;
                }
                let distances = pooled.weighted_axis(width);
                let sinc = Arc::new(SincTable::new(q, &distances));
                Ok(Resolution::Weighted { distances, sinc })
            }
            Partial::PerFormFactorPair(aa) => {
                let Partial::PerFormFactor(aw) = &source.aw else {
                    return Err(HistError::InvalidOperation(
                        "form-factor histograms require a per-form-factor atom-water term",
                    ));
                };
                let ax = match &source.excluded_volume {
                    Some(exv) => match &exv.ax {
                        Partial::PerFormFactor(ax) => Some(ax.clone()),
                        _ => {
                            return Err(HistError::InvalidOperation(
                                "form-factor histograms require a per-form-factor atom-exv term",
                            ));
                        }
                    },
                    None => None,
                };
                Ok(Resolution::FormFactor(Box::new(FormFactorTerms {
                    aa: aa.clone(),
                    aw: aw.clone(),
                    ax,
                    table: Arc::new(FormFactorTable::new(q)),
                })))
            }
            Partial::PerFormFactor(_) => Err(HistError::InvalidOperation(
                "atom-atom term cannot be resolved by a single form factor",
            )),
        }
    }

    fn terms(&self) -> Result<&Terms, HistError> {
        self.terms
            .as_ref()
            .ok_or(HistError::InvalidOperation("no partial histograms have been computed"))
    }

    fn recompute_total(&mut self) {
        let Some(terms) = &self.terms else {
            return;
        };
        let k = self.water_factor;
        let cx = self.exv_factor;
        let mut total: Vec<f64> = (0..terms.aa.len())
            .map(|i| terms.aa[i] + k * terms.aw[i] + k * k * terms.ww[i])
            .collect();
        let mut last = [&terms.aa, &terms.aw, &terms.ww]
            .iter()
            .filter_map(|t| t.iter().rposition(|&c| c != 0.0))
            .max();

        if let Some([ax, wx, xx]) = &terms.exv {
            for (i, t) in total.iter_mut().enumerate() {
                *t += -cx * ax[i] - k * cx * wx[i] + cx * cx * xx[i];
            }
            let exv_last = [ax, wx, xx]
                .iter()
                .filter_map(|t| t.iter().rposition(|&c| c != 0.0))
                .max();
            last = last.max(exv_last);
        }

        self.bins = effective_bins(last, total.len());
        self.total = total;
    }

    /// Rescales the water contribution. Runs in O(bins); no atom is rescanned.
    pub fn apply_water_scaling_factor(&mut self, k: f64) -> Result<(), HistError> {
        self.terms()?;
        self.water_factor = k;
        self.recompute_total();
        Ok(())
    }

    /// Rescales the excluded-volume contribution. Runs in O(bins); no atom is rescanned.
    pub fn apply_excluded_volume_scaling_factor(&mut self, cx: f64) -> Result<(), HistError> {
        self.terms()?;
        self.exv_factor = cx;
        self.recompute_total();
        Ok(())
    }

    pub fn water_scaling_factor(&self) -> f64 {
        self.water_factor
    }

    pub fn excluded_volume_scaling_factor(&self) -> f64 {
        self.exv_factor
    }

    pub fn has_excluded_volume(&self) -> bool {
        self.terms.as_ref().is_some_and(|t| t.exv.is_some())
    }

    /// The master histogram, trimmed to its last non-empty bin.
    pub fn get_total_counts(&self) -> &[f64] {
        &self.total[..self.bins]
    }

    pub fn get_aa_counts(&self) -> &[f64] {
        self.terms
            .as_ref()
            .map_or(&[][..], |t| &t.aa[..self.bins])
    }

    pub fn get_aw_counts(&self) -> &[f64] {
        self.terms
            .as_ref()
            .map_or(&[][..], |t| &t.aw[..self.bins])
    }

    pub fn get_ww_counts(&self) -> &[f64] {
        self.terms
            .as_ref()
            .map_or(&[][..], |t| &t.ww[..self.bins])
    }

    /// Distance represented by each bin of [`get_total_counts`].
    ///
    /// Weighted histograms report the mean pair distance of each bin.
    ///
    /// [`get_total_counts`]: Self::get_total_counts
    pub fn get_d_axis(&self) -> Vec<f64> {
        match &self.resolution {
            Resolution::Weighted { distances, .. } => distances[..self.bins].to_vec(),
            _ => (0..self.bins).map(|i| self.d_axis.value(i)).collect(),
        }
    }

    pub fn d_axis(&self) -> &Axis {
        &self.d_axis
    }

    pub fn q_axis(&self) -> &Axis {
        &self.q_axis
    }

    /// The master histogram as a standalone trimmed [`DistanceHistogram`].
    pub fn distance_histogram(&self) -> Result<DistanceHistogram, HistError> {
        self.terms()?;
        DistanceHistogram::with_distances(
            self.d_axis.truncated(self.bins),
            self.get_total_counts().to_vec(),
            self.get_d_axis(),
        )
    }

    /// Transforms the master histogram into a scattering profile on the q axis.
    ///
    /// `I(q) = Σ_d total[d] · sinc(q·d)`, with the sinc values read from a table. Weighted
    /// histograms use the table built on their mean bin distances, and form-factor resolved
    /// histograms weight every class pair by the product of its form factors.
    pub fn debye_transform(&self) -> Result<ScatteringProfile, HistError> {
        let terms = self.terms()?;
        let q = self.q_axis.values();

        match &self.resolution {
            Resolution::Plain => self.distance_histogram()?.debye_transform_with(&q, &self.sinc),
            Resolution::Weighted { sinc, .. } => {
                self.distance_histogram()?.debye_transform_with(&q, sinc)
            }
            Resolution::FormFactor(ff_terms) => {
                let intensity = self.form_factor_intensity(terms, ff_terms, q.len());
                Ok(ScatteringProfile::new(q, intensity))
            }
        }
    }

    fn form_factor_intensity(&self, terms: &Terms, ff_terms: &FormFactorTerms, q_len: usize) -> Vec<f64> {
        let table = &ff_terms.table;
        let k = self.water_factor;
        let cx = self.exv_factor;
        let n = self.bins;

        (0..q_len)
            .map(|qi| {
                let sinc = &self.sinc.row(qi)[..n];
                let fw = table.water(qi);
                let fx = table.excluded_volume(qi);

                let mut intensity = 0.0;
                for a in 0..FormFactorType::COUNT {
                    let fa = table.atom(a, qi);
                    for b in 0..FormFactorType::COUNT {
                        let fb = table.atom(b, qi);
                        intensity += fa * fb * dot(ff_terms.aa.slice(a, b), sinc);
                    }
                    intensity += k * fa * fw * dot(ff_terms.aw.row(a), sinc);
                    if let Some(ax) = &ff_terms.ax {
                        intensity -= cx * fa * fx * dot(ax.row(a), sinc);
                    }
                }
                intensity += k * k * fw * fw * dot(&terms.ww, sinc);
                if let Some([_, wx, xx]) = &terms.exv {
                    intensity -= k * cx * fw * fx * dot(wx, sinc);
                    intensity += cx * cx * fx * fx * dot(xx, sinc);
                }
                intensity
            })
            .collect()
    }
}
