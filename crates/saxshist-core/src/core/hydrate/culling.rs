use super::placement::PlacedWater;
use crate::core::grid::error::GridError;
use crate::core::grid::grid::{Grid, GridMember};
use crate::core::models::ids::BodyId;
use itertools::Itertools;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CullingStrategy {
    /// Uniform subsample.
    Random,
    /// Drop waters crowded by other waters and far from any atom first.
    #[default]
    Outlier,
    /// Keep waters per body in proportion to the body's atom count.
    BodyCounter,
}

/// Reduces `candidates` to `target` waters and removes the rejected ones from the grid.
///
/// `candidates` must be the waters currently on the grid, in grid order, as returned by
/// [`Grid::generate_explicit_hydration`]. Survivors keep their relative order.
pub fn cull(
    grid: &mut Grid,
    candidates: Vec<PlacedWater>,
    target: usize,
    strategy: CullingStrategy,
    seed: u64,
) -> Result<Vec<PlacedWater>, GridError> {
    if candidates.len() != grid.waters().len() {
        return Err(GridError::InvalidOperation(
            "culling candidates do not match the waters on the grid",
        ));
    }
    if target >= candidates.len() {
        if target > candidates.len() {
            warn!(
                target,
                candidates = candidates.len(),
                "Culling target exceeds the candidate set; keeping every water"
            );
        }
        return Ok(candidates);
    }

    let keep = match strategy {
        CullingStrategy::Random => random_mask(candidates.len(), target, seed),
        CullingStrategy::Outlier => outlier_mask(grid, target),
        CullingStrategy::BodyCounter => body_counter_mask(grid, &candidates, target),
    };
    grid.remove_waters(&keep)?;

    let survivors: Vec<PlacedWater> = candidates
        .into_iter()
        .zip(&keep)
        .filter_map(|(water, &kept)| kept.then_some(water))
        .collect();
    debug!(kept = survivors.len(), ?strategy, "Culled hydration layer");
    Ok(survivors)
}

fn random_mask(len: usize, target: usize, seed: u64) -> Vec<bool> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut keep = vec![false; len];
    for index in rand::seq::index::sample(&mut rng, len, target) {
        keep[index] = true;
    }
    keep
}

/// Members bucketed by the cell of their centre.
fn by_cell(members: &[GridMember]) -> HashMap<[usize; 3], Vec<usize>> {
    let mut buckets: HashMap<[usize; 3], Vec<usize>> = HashMap::new();
    for (index, member) in members.iter().enumerate() {
        buckets.entry(member.cell).or_default().push(index);
    }
    buckets
}

/// Indices of the members in `buckets` whose centre cell lies within `reach` cells of `cell`.
fn nearby<'a>(
    buckets: &'a HashMap<[usize; 3], Vec<usize>>,
    cell: [usize; 3],
    reach: i64,
) -> impl Iterator<Item = usize> + 'a {
    let origin = cell.map(|v| v as i64);
    (-reach..=reach)
        .cartesian_product(-reach..=reach)
        .cartesian_product(-reach..=reach)
        .filter_map(move |((di, dj), dk)| {
            let bins = [origin[0] + di, origin[1] + dj, origin[2] + dk];
            if bins.iter().any(|&b| b < 0) {
                return None;
            }
            buckets.get(&bins.map(|b| b as usize))
        })
        .flatten()
        .copied()
}

fn outlier_mask(grid: &Grid, target: usize) -> Vec<bool> {
    let waters = grid.waters();
    let atoms = grid.atoms();
    let rh = grid.settings().water_radius;
    let width = grid.width();
    let max_atom_radius = atoms.iter().map(|a| a.radius).fold(0.0, f64::max);

    let water_cells = by_cell(waters);
    let atom_cells = by_cell(atoms);
    let water_reach = (2.0 * rh / width).ceil() as i64;
    let atom_reach = ((max_atom_radius + 2.0 * rh) / width).ceil() as i64;

    let scores: Vec<i64> = waters
        .iter()
        .enumerate()
        .map(|(i, water)| {
            let crowding = nearby(&water_cells, water.cell, water_reach)
                .filter(|&j| j != i && (waters[j].position - water.position).norm() <= 2.0 * rh)
                .count() as i64;
            let contacts = nearby(&atom_cells, water.cell, atom_reach)
                .filter(|&j| {
                    (atoms[j].position - water.position).norm() <= atoms[j].radius + 2.0 * rh
                })
                .count() as i64;
            contacts - crowding
        })
        .collect();

    let mut keep = vec![true; waters.len()];
    let removals = waters.len() - target;
    for index in (0..waters.len())
        .sorted_by_key(|&i| (scores[i], Reverse(i)))
        .take(removals)
    {
        keep[index] = false;
    }
    keep
}

fn body_counter_mask(grid: &Grid, candidates: &[PlacedWater], target: usize) -> Vec<bool> {
    let mut groups: Vec<(Option<BodyId>, Vec<usize>)> = Vec::new();
    for (index, water) in candidates.iter().enumerate() {
        match groups.iter_mut().find(|(body, _)| *body == water.body) {
            Some((_, members)) => members.push(index),
            None => groups.push((water.body, vec![index])),
        }
    }

    let atom_counts = grid.atoms().iter().counts_by(|a| a.body);
    let weights: Vec<usize> = groups
        .iter()
        .map(|(body, _)| atom_counts.get(body).copied().unwrap_or(0))
        .collect();
    let total_weight: usize = weights.iter().sum();

    let mut quotas: Vec<usize> = if total_weight == 0 {
        vec![target / groups.len(); groups.len()]
    } else {
        weights.iter().map(|w| target * w / total_weight).collect()
    };
    for (quota, (_, members)) in quotas.iter_mut().zip(&groups) {
        *quota = (*quota).min(members.len());
    }

    // Hand out what is left one water at a time, first groups first.
    let mut remaining = target - quotas.iter().sum::<usize>();
    while remaining > 0 {
        let mut progressed = false;
        for (quota, (_, members)) in quotas.iter_mut().zip(&groups) {
            if remaining > 0 && *quota < members.len() {
                *quota += 1;
                remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    let mut keep = vec![false; candidates.len()];
    for (quota, (_, members)) in quotas.iter().zip(&groups) {
        for &index in members.iter().take(*quota) {
            keep[index] = true;
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::grid::{GridSettings, RadiusModel};
    use crate::core::hydrate::placement::HydrationStrategy;
    use crate::core::models::atom::{Atom, Water};
    use nalgebra::Point3;
    use slotmap::SlotMap;

    fn settings() -> GridSettings {
        GridSettings {
            radius_model: RadiusModel::Uniform(1.0),
            ..GridSettings::default()
        }
    }

    fn empty_grid() -> Grid {
        Grid::new(Point3::origin(), Point3::new(30.0, 30.0, 30.0), settings()).unwrap()
    }

    fn add(grid: &mut Grid, position: Point3<f64>, body: Option<BodyId>) -> PlacedWater {
        grid.add_water(position, body).unwrap();
        PlacedWater {
            water: Water::new(position),
            body,
            parent: 0,
        }
    }

    fn hydrated() -> (Grid, Vec<PlacedWater>) {
        let mut grid = empty_grid();
        grid.place(&[
            Atom::new(Point3::new(8.0, 8.0, 8.0), 1.0),
            Atom::new(Point3::new(20.0, 20.0, 20.0), 1.0),
        ])
        .unwrap();
        let waters = grid.generate_explicit_hydration(HydrationStrategy::Axes).unwrap();
        (grid, waters)
    }

    #[test]
    fn random_culling_keeps_target_in_original_order() {
        let (mut grid, waters) = hydrated();
        assert_eq!(waters.len(), 12);
        let kept = cull(&mut grid, waters.clone(), 5, CullingStrategy::Random, 7).unwrap();
        assert_eq!(kept.len(), 5);
        assert_eq!(grid.waters().len(), 5);
        let positions: Vec<usize> = kept
            .iter()
            .map(|k| waters.iter().position(|w| w == k).unwrap())
            .collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]));
    }

    #[test]
    fn random_culling_is_reproducible_for_a_seed() {
        let (mut first_grid, waters) = hydrated();
        let (mut second_grid, _) = hydrated();
        let first = cull(&mut first_grid, waters.clone(), 4, CullingStrategy::Random, 42).unwrap();
        let second = cull(&mut second_grid, waters, 4, CullingStrategy::Random, 42).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn target_at_or_above_candidate_count_keeps_everything() {
        let (mut grid, waters) = hydrated();
        let kept = cull(&mut grid, waters.clone(), 100, CullingStrategy::Outlier, 0).unwrap();
        assert_eq!(kept, waters);
        assert_eq!(grid.waters().len(), 12);
    }

    #[test]
    fn outlier_culling_removes_crowded_waters_later_first() {
        let mut grid = empty_grid();
        grid.place(&[Atom::new(Point3::new(10.0, 10.0, 10.0), 1.0)]).unwrap();
        let waters = vec![
            add(&mut grid, Point3::new(12.5, 10.0, 10.0), None),
            add(&mut grid, Point3::new(20.0, 20.0, 20.0), None),
            add(&mut grid, Point3::new(20.0, 21.0, 20.0), None),
        ];

        let mut two = grid.clone();
        let kept = cull(&mut two, waters.clone(), 2, CullingStrategy::Outlier, 0).unwrap();
        assert_eq!(kept, vec![waters[0], waters[1]]);

        let kept = cull(&mut grid, waters.clone(), 1, CullingStrategy::Outlier, 0).unwrap();
        assert_eq!(kept, vec![waters[0]]);
        assert!(
            grid.get(grid.to_bins(&Point3::new(20.0, 20.0, 20.0)).unwrap())
                .is_empty()
        );
    }

    #[test]
    fn body_counter_splits_target_by_atom_count() {
        let mut ids: SlotMap<BodyId, ()> = SlotMap::with_key();
        let (a, b) = (ids.insert(()), ids.insert(()));

        let mut grid = empty_grid();
        let big: Vec<Atom> = (0..6)
            .map(|i| Atom::new(Point3::new(2.0 + 2.0 * i as f64, 5.0, 5.0), 1.0))
            .collect();
        let small: Vec<Atom> = (0..2)
            .map(|i| Atom::new(Point3::new(2.0 + 2.0 * i as f64, 25.0, 25.0), 1.0))
            .collect();
        grid.place_body(a, &big).unwrap();
        grid.place_body(b, &small).unwrap();

        let mut waters = Vec::new();
        for i in 0..6 {
            let x = 2.0 + 3.0 * i as f64;
            waters.push(add(&mut grid, Point3::new(x, 12.0, 12.0), Some(a)));
            waters.push(add(&mut grid, Point3::new(x, 18.0, 18.0), Some(b)));
        }

        let mut four = grid.clone();
        let kept = cull(&mut four, waters.clone(), 4, CullingStrategy::BodyCounter, 0).unwrap();
        assert_eq!(kept.iter().filter(|w| w.body == Some(a)).count(), 3);
        assert_eq!(kept.iter().filter(|w| w.body == Some(b)).count(), 1);

        let kept = cull(&mut grid, waters, 5, CullingStrategy::BodyCounter, 0).unwrap();
        assert_eq!(kept.iter().filter(|w| w.body == Some(a)).count(), 4);
        assert_eq!(kept.iter().filter(|w| w.body == Some(b)).count(), 1);
        assert_eq!(grid.waters().len(), 5);
    }

    #[test]
    fn candidates_must_match_grid_waters() {
        let (mut grid, mut waters) = hydrated();
        waters.pop();
        assert!(matches!(
            cull(&mut grid, waters, 3, CullingStrategy::Random, 0),
            Err(GridError::InvalidOperation(_))
        ));
    }
}
