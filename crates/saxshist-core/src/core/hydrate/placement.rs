use super::directions::{axis_directions, sphere_directions};
use crate::core::grid::error::GridError;
use crate::core::grid::grid::{Grid, GridMember};
use crate::core::models::atom::Water;
use crate::core::models::ids::BodyId;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;

/// Angular divisions of the radial strategy's direction set.
const RADIAL_DIVISIONS: usize = 8;

/// Cavity probes of the radial strategy: distance in water radii and score magnitude.
const CAVITY_PROBES: [(f64, i32); 3] = [(3.0, 3), (5.0, 2), (7.0, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HydrationStrategy {
    /// Candidates on a sphere around every atom, filtered by a cavity score.
    #[default]
    Radial,
    /// Candidates along the six coordinate axes of every atom.
    Axes,
    /// Every free cell in a one-cell-thick shell around every atom.
    Jan,
}

/// A water accepted by a hydration strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedWater {
    pub water: Water,
    /// Body of the parent atom.
    pub body: Option<BodyId>,
    /// Index of the parent atom among the grid's atoms.
    pub parent: usize,
}

pub(crate) fn place(grid: &mut Grid, strategy: HydrationStrategy) -> Result<Vec<PlacedWater>, GridError> {
    let mut placer = Placer {
        placed: Vec::with_capacity(grid.atoms().len()),
    };
    match strategy {
        HydrationStrategy::Radial => placer.radial(grid)?,
        HydrationStrategy::Axes => placer.axes(grid)?,
        HydrationStrategy::Jan => placer.jan(grid)?,
    }
    Ok(placer.placed)
}

struct Placer {
    placed: Vec<PlacedWater>,
}

impl Placer {
    fn accept(
        &mut self,
        grid: &mut Grid,
        position: Point3<f64>,
        parent: usize,
        atom: &GridMember,
    ) -> Result<(), GridError> {
        grid.add_water(position, atom.body)?;
        self.placed.push(PlacedWater {
            water: Water::new(position),
            body: atom.body,
            parent,
        });
        Ok(())
    }

    fn radial(&mut self, grid: &mut Grid) -> Result<(), GridError> {
        let directions = sphere_directions(RADIAL_DIVISIONS);
        let rh = grid.settings().water_radius;
        let contact: Vec<[i64; 3]> = directions.iter().map(|d| grid.offset(d, rh)).collect();
        let probes: Vec<Vec<[i64; 3]>> = CAVITY_PROBES
            .iter()
            .map(|&(multiple, _)| directions.iter().map(|d| grid.offset(d, multiple * rh)).collect())
            .collect();
        let threshold = grid.settings().min_score * directions.len() as f64;

        let atoms = grid.atoms().to_vec();
        for (parent, atom) in atoms.iter().enumerate() {
            let reff = atom.radius + rh;
            for direction in &directions {
                let position = atom.position + direction * reff;
                let Ok(cell) = grid.to_bins(&position) else {
                    continue;
                };
                if !grid.get(cell).is_empty_or_volume() {
                    continue;
                }
                if touches_neighbour(grid, cell, atom, &contact) {
                    continue;
                }
                if cavity_score(grid, cell, &probes) as f64 > threshold {
                    self.accept(grid, position, parent, atom)?;
                }
            }
        }
        Ok(())
    }

    fn axes(&mut self, grid: &mut Grid) -> Result<(), GridError> {
        let rh = grid.settings().water_radius;
        let check = check_radius(grid);
        let atoms = grid.atoms().to_vec();
        for (parent, atom) in atoms.iter().enumerate() {
            let reff = atom.radius + rh;
            for direction in axis_directions() {
                let position = atom.position + direction * reff;
                let Ok(cell) = grid.to_bins(&position) else {
                    continue;
                };
                if grid.get(cell).is_empty_or_volume() && is_free(grid, &position, check) {
                    self.accept(grid, position, parent, atom)?;
                }
            }
        }
        Ok(())
    }

    fn jan(&mut self, grid: &mut Grid) -> Result<(), GridError> {
        let rh = grid.settings().water_radius;
        let width = grid.width();
        let check = check_radius(grid);
        let atoms = grid.atoms().to_vec();
        for (parent, atom) in atoms.iter().enumerate() {
            let reff = atom.radius + rh;
            let (inner, outer) = (reff - width / 2.0, reff + width / 2.0);
            let reach = (outer / width).ceil() as i64;
            let origin = atom.cell.map(|v| v as i64);

            for di in -reach..=reach {
                for dj in -reach..=reach {
                    for dk in -reach..=reach {
                        let bins = [origin[0] + di, origin[1] + dj, origin[2] + dk];
                        let Some(cell) = grid.checked_cell(bins) else {
                            continue;
                        };
                        let position = grid.to_position(cell);
                        let distance = (position - atom.position).norm();
                        if distance < inner || distance > outer {
                            continue;
                        }
                        if grid.get(cell).is_empty_or_volume() && is_free(grid, &position, check) {
                            self.accept(grid, position, parent, atom)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Collision radius of the axes and shell strategies: half a cell short of a water radius.
fn check_radius(grid: &Grid) -> f64 {
    grid.settings().water_radius - grid.width() / 2.0
}

fn is_free(grid: &Grid, position: &Point3<f64>, radius: f64) -> bool {
    grid.cells_within(position, radius)
        .into_iter()
        .all(|cell| grid.get(cell).is_empty_or_volume())
}

fn shifted(cell: [usize; 3], offset: &[i64; 3]) -> [i64; 3] {
    [0, 1, 2].map(|i| cell[i] as i64 + offset[i])
}

/// True when an occupied cell one water radius away belongs to anything but the parent atom.
fn touches_neighbour(grid: &Grid, cell: [usize; 3], parent: &GridMember, contact: &[[i64; 3]]) -> bool {
    let [nx, ny, nz] = grid.dims().map(|d| d as i64 - 1);
    contact.iter().any(|offset| {
        let bins = shifted(cell, offset);
        let probe = [
            bins[0].clamp(0, nx) as usize,
            bins[1].clamp(0, ny) as usize,
            bins[2].clamp(0, nz) as usize,
        ];
        if grid.get(probe).is_empty_or_volume() {
            return false;
        }
        let to_parent: Vector3<f64> = grid.to_position(probe) - parent.position;
        to_parent.norm() > parent.radius
    })
}

/// Openness of the surroundings of a candidate cell.
///
/// Every ray walks outward through the cavity probes. Leaving the grid scores the probe's
/// weight and ends the ray, hitting an occupied cell costs it and ends the ray, and a free
/// cell scores one.
fn cavity_score(grid: &Grid, cell: [usize; 3], probes: &[Vec<[i64; 3]>]) -> i32 {
    let rays = probes.first().map_or(0, Vec::len);
    let mut score = 0;
    for ray in 0..rays {
        for (probe, &(_, weight)) in probes.iter().zip(CAVITY_PROBES.iter()) {
            match grid.state_at(shifted(cell, &probe[ray])) {
                None => {
                    score += weight;
                    break;
                }
                Some(state) if !state.is_empty_or_volume() => {
                    score -= weight;
                    break;
                }
                Some(_) => score += 1,
            }
        }
    }
    score
}
