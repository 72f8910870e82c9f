use super::distribution::PairSink;
use super::error::HistError;
use crate::core::form_factor::FormFactorType;
use crate::core::models::atom::{Atom, Water};
use crate::core::models::hydration::ExcludedVolume;
use nalgebra::Point3;
use serde::Deserialize;

/// A single point of a compact store: single-precision position and weight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C, align(16))]
pub struct CompactPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl CompactPoint {
    pub fn new(position: &Point3<f64>, weight: f64) -> Self {
        Self {
            x: position.x as f32,
            y: position.y as f32,
            z: position.z as f32,
            w: weight as f32,
        }
    }
}

/// Result of evaluating one pair of points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Evaluated {
    /// Distance bin, `round(distance / width)`.
    pub bin: usize,
    /// Product of the two point weights.
    pub weight: f32,
    /// Exact pair distance.
    pub distance: f32,
}

/// Number of pairs the kernel evaluates per inner step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelWidth {
    Scalar,
    Quad,
    #[default]
    Octo,
}

/// Flattened snapshot of a point set, laid out for sequential pair scanning.
///
/// Positions are absolute (world frame) and the form-factor index of every point is kept in
/// a parallel array. A store is never updated in place; it is rebuilt from its source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompactCoordinates {
    points: Vec<CompactPoint>,
    form_factors: Vec<u8>,
}

impl CompactCoordinates {
    /// Builds a store from atoms already expressed in world coordinates.
    ///
    /// Atoms without a form-factor class are filed under [`FormFactorType::Other`].
    pub fn from_atoms(atoms: impl IntoIterator<Item = Atom>) -> Self {
        let mut store = Self::default();
        for atom in atoms {
            let ff = atom.form_factor.unwrap_or(FormFactorType::Other);
            store.push(CompactPoint::new(&atom.position, atom.weight), ff.index() as u8);
        }
        store
    }

    pub fn from_waters(waters: &[Water]) -> Self {
        let ff = FormFactorType::Oxygen.index() as u8;
        Self {
            points: waters
                .iter()
                .map(|w| CompactPoint::new(&w.position, w.weight))
                .collect(),
            form_factors: vec![ff; waters.len()],
        }
    }

    pub fn from_excluded_volume(excluded_volume: &ExcludedVolume) -> Self {
        let mut store = Self::default();
        for (position, weight) in excluded_volume.points() {
            store.push(CompactPoint::new(&position, weight), 0);
        }
        store
    }

    fn push(&mut self, point: CompactPoint, ff: u8) {
        self.points.push(point);
        self.form_factors.push(ff);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[CompactPoint] {
        &self.points
    }

    pub fn form_factors(&self) -> &[u8] {
        &self.form_factors
    }
}

#[inline(always)]
pub fn evaluate_scalar(a: &CompactPoint, b: &CompactPoint, inv_width: f32) -> Evaluated {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    let distance = (dx * dx + dy * dy + dz * dz).sqrt();
    Evaluated {
        bin: (distance * inv_width).round() as usize,
        weight: a.w * b.w,
        distance,
    }
}

/// Evaluates `N` pairs `(a, others[lane])` in lock-step.
///
/// The lanes are split into separate passes over fixed-size arrays so the compiler can keep
/// them in vector registers. Per lane the arithmetic is exactly that of [`evaluate_scalar`].
#[inline(always)]
fn evaluate_batch<const N: usize>(
    a: &CompactPoint,
    others: &[CompactPoint],
    inv_width: f32,
) -> [Evaluated; N] {
    debug_assert!(others.len() >= N);
    let mut dx = [0.0f32; N];
    let mut dy = [0.0f32; N];
    let mut dz = [0.0f32; N];
    let mut w = [0.0f32; N];
    for lane in 0..N {
        dx[lane] = a.x - others[lane].x;
        dy[lane] = a.y - others[lane].y;
        dz[lane] = a.z - others[lane].z;
        w[lane] = a.w * others[lane].w;
    }

    let mut dist = [0.0f32; N];
    for lane in 0..N {
        dist[lane] = (dx[lane] * dx[lane] + dy[lane] * dy[lane] + dz[lane] * dz[lane]).sqrt();
    }

    let mut out = [Evaluated::default(); N];
    for lane in 0..N {
        out[lane] = Evaluated {
            bin: (dist[lane] * inv_width).round() as usize,
            weight: w[lane],
            distance: dist[lane],
        };
    }
    out
}

#[inline]
pub fn evaluate_quad(a: &CompactPoint, others: &[CompactPoint], inv_width: f32) -> [Evaluated; 4] {
    evaluate_batch::<4>(a, others, inv_width)
}

#[inline]
pub fn evaluate_octo(a: &CompactPoint, others: &[CompactPoint], inv_width: f32) -> [Evaluated; 8] {
    evaluate_batch::<8>(a, others, inv_width)
}

#[inline]
fn record_batch<S: PairSink, const N: usize>(
    sink: &mut S,
    ff_a: u8,
    others_ff: &[u8],
    evaluated: &[Evaluated; N],
) -> Result<(), HistError> {
    for (pair, &ff_b) in evaluated.iter().zip(others_ff) {
        sink.record(ff_a, ff_b, pair)?;
    }
    Ok(())
}

/// Scans the pairs between one point and a contiguous run of others, in order.
fn scan_row<S: PairSink>(
    a: &CompactPoint,
    ff_a: u8,
    others: &[CompactPoint],
    others_ff: &[u8],
    inv_width: f32,
    width: KernelWidth,
    sink: &mut S,
) -> Result<(), HistError> {
    let mut j = 0;
    let n = others.len();

    if width == KernelWidth::Octo {
        while j + 8 <= n {
            let evaluated = evaluate_octo(a, &others[j..j + 8], inv_width);
            record_batch(sink, ff_a, &others_ff[j..j + 8], &evaluated)?;
            j += 8;
        }
    }
    if matches!(width, KernelWidth::Octo | KernelWidth::Quad) {
        while j + 4 <= n {
            let evaluated = evaluate_quad(a, &others[j..j + 4], inv_width);
            record_batch(sink, ff_a, &others_ff[j..j + 4], &evaluated)?;
            j += 4;
        }
    }
    while j < n {
        let evaluated = evaluate_scalar(a, &others[j], inv_width);
        sink.record(ff_a, others_ff[j], &evaluated)?;
        j += 1;
    }
    Ok(())
}

/// Records every unordered pair of distinct points within one store.
pub fn scan_self<S: PairSink>(
    data: &CompactCoordinates,
    inv_width: f32,
    width: KernelWidth,
    sink: &mut S,
) -> Result<(), HistError> {
    let points = data.points();
    let ffs = data.form_factors();
    for i in 0..points.len() {
        scan_row(
            &points[i],
            ffs[i],
            &points[i + 1..],
            &ffs[i + 1..],
            inv_width,
            width,
            sink,
        )?;
    }
    Ok(())
}

/// Records every pair with one point from `first` and one from `second`.
///
/// The form factor of the `first` point is always passed as `ff_a`.
pub fn scan_cross<S: PairSink>(
    first: &CompactCoordinates,
    second: &CompactCoordinates,
    inv_width: f32,
    width: KernelWidth,
    sink: &mut S,
) -> Result<(), HistError> {
    let others = second.points();
    let others_ff = second.form_factors();
    for (a, &ff_a) in first.points().iter().zip(first.form_factors()) {
        scan_row(a, ff_a, others, others_ff, inv_width, width, sink)?;
    }
    Ok(())
}
