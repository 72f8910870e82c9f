use super::error::GridError;
use super::state::CellState;
use crate::core::hydrate::placement::{self, HydrationStrategy, PlacedWater};
use crate::core::models::atom::{Atom, Water};
use crate::core::models::hydration::ExcludedVolume;
use crate::core::models::ids::BodyId;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Upper bound on the number of cells a grid may allocate.
pub const MAX_GRID_CELLS: usize = 1 << 31;

/// Largest van der Waals radius of any form-factor class, in Angstroms.
const MAX_ATOMIC_RADIUS: f64 = 1.88;

/// Systems with any bounding-box extent below this are padded by their full extent.
const SMALL_SYSTEM_EXTENT: f64 = 50.0;

const NEIGHBOURS: [[i64; 3]; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

/// How the grid decides the radius of a placed atom.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RadiusModel {
    /// The same radius for every atom.
    Uniform(f64),
    /// The van der Waals radius of the atom's form-factor class.
    #[default]
    VanDerWaals,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Edge length of a cubic cell, in Angstroms.
    pub cell_width: f64,
    /// Fraction of the bounding-box extent added as padding around large systems.
    pub scaling: f64,
    pub water_radius: f64,
    /// Minimum radius around each atom that is treated as excluded volume.
    pub min_exv_radius: f64,
    /// Cavity score threshold of the radial strategy, per probed direction.
    pub min_score: f64,
    /// Weight of excluded-volume points on the envelope surface.
    pub surface_weight: f64,
    pub radius_model: RadiusModel,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            cell_width: 1.0,
            scaling: 0.25,
            water_radius: 1.52,
            min_exv_radius: 2.15,
            min_score: 0.1,
            surface_weight: 1.0,
            radius_model: RadiusModel::VanDerWaals,
        }
    }
}

/// An atom or water registered on the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMember {
    pub position: Point3<f64>,
    pub cell: [usize; 3],
    pub radius: f64,
    /// Owning body, when the member was placed as part of one.
    pub body: Option<BodyId>,
}

/// A dense voxel grid tracking which regions are taken by atoms, solvent and excluded volume.
///
/// Cell `[i, j, k]` is centred on `min + (i, j, k) · width` and stored at `(i·ny + j)·nz + k`.
#[derive(Debug, Clone)]
pub struct Grid {
    settings: GridSettings,
    min: Point3<f64>,
    dims: [usize; 3],
    cells: Vec<CellState>,
    atoms: Vec<GridMember>,
    waters: Vec<GridMember>,
    expanded: bool,
}

impl Grid {
    /// Creates an empty grid covering `[min, max]`, rounded outward to whole cells.
    pub fn new(min: Point3<f64>, max: Point3<f64>, settings: GridSettings) -> Result<Self, GridError> {
        let width = settings.cell_width;
        if width.is_nan() || width <= 0.0 {
            return Err(GridError::InvalidOperation("cell width must be positive"));
        }
        if (0..3).any(|i| max[i] < min[i]) {
            return Err(GridError::InvalidOperation("grid maximum lies below its minimum"));
        }

        let mut dims = [0usize; 3];
        for (i, dim) in dims.iter_mut().enumerate() {
            *dim = ((max[i] - min[i]) / width).ceil() as usize + 1;
        }
        let cells = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .unwrap_or(usize::MAX);
        if cells > MAX_GRID_CELLS {
            return Err(GridError::Size {
                cells,
                limit: MAX_GRID_CELLS,
            });
        }

        debug!(?dims, cells, "Allocated voxel grid");
        Ok(Self {
            settings,
            min,
            dims,
            cells: vec![CellState::EMPTY; cells],
            atoms: Vec::new(),
            waters: Vec::new(),
            expanded: false,
        })
    }

    /// Creates an empty grid around `atoms`, padded so that a hydration shell fits.
    ///
    /// Each side of the bounding box is pushed out by half the extent times the scaling
    /// factor (the full extent for systems smaller than 50 Å), at least by the reach of a
    /// hydration shell, and then by one more cell. Bounds are floored and ceiled.
    pub fn enclosing<'a>(
        atoms: impl IntoIterator<Item = &'a Atom>,
        settings: GridSettings,
    ) -> Result<Self, GridError> {
        let mut bounds: Option<(Point3<f64>, Point3<f64>)> = None;
        for atom in atoms {
            let p = atom.position;
            bounds = Some(match bounds {
                None => (p, p),
                Some((lo, hi)) => (lo.inf(&p), hi.sup(&p)),
            });
        }
        let (lo, hi) =
            bounds.ok_or(GridError::InvalidOperation("cannot enclose an empty set of atoms"))?;

        let extent = hi - lo;
        let scaling = if extent.iter().any(|&e| e < SMALL_SYSTEM_EXTENT) {
            1.0
        } else {
            settings.scaling
        };
        let reach = MAX_ATOMIC_RADIUS + 2.0 * settings.water_radius;
        let pad = extent.map(|e| (0.5 * e * scaling).max(reach) + settings.cell_width);

        let min = (lo - pad).map(f64::floor);
        let max = (hi + pad).map(f64::ceil);
        Self::new(min, max, settings)
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn width(&self) -> f64 {
        self.settings.cell_width
    }

    pub fn min(&self) -> Point3<f64> {
        self.min
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn atoms(&self) -> &[GridMember] {
        &self.atoms
    }

    pub fn waters(&self) -> &[GridMember] {
        &self.waters
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    #[inline]
    fn index(&self, cell: [usize; 3]) -> usize {
        (cell[0] * self.dims[1] + cell[1]) * self.dims[2] + cell[2]
    }

    #[inline]
    fn unindex(&self, index: usize) -> [usize; 3] {
        let k = index % self.dims[2];
        let rest = index / self.dims[2];
        [rest / self.dims[1], rest % self.dims[1], k]
    }

    #[inline]
    fn signed_bins(&self, position: &Point3<f64>) -> [i64; 3] {
        let w = self.settings.cell_width;
        [0, 1, 2].map(|i| ((position[i] - self.min[i]) / w).round() as i64)
    }

    /// The cell whose centre is nearest to `position`.
    pub fn to_bins(&self, position: &Point3<f64>) -> Result<[usize; 3], GridError> {
        self.checked_cell(self.signed_bins(position))
            .ok_or(GridError::Bounds {
                position: *position,
            })
    }

    /// Like [`to_bins`](Self::to_bins), but clamps positions outside the grid to its faces.
    pub fn to_bins_clamped(&self, position: &Point3<f64>) -> [usize; 3] {
        let bins = self.signed_bins(position);
        [0, 1, 2].map(|i| bins[i].clamp(0, self.dims[i] as i64 - 1) as usize)
    }

    /// Centre of a cell.
    pub fn to_position(&self, cell: [usize; 3]) -> Point3<f64> {
        let w = self.settings.cell_width;
        Point3::new(
            self.min.x + cell[0] as f64 * w,
            self.min.y + cell[1] as f64 * w,
            self.min.z + cell[2] as f64 * w,
        )
    }

    /// Converts a signed cell index to an in-grid one.
    #[inline]
    pub fn checked_cell(&self, bins: [i64; 3]) -> Option<[usize; 3]> {
        let mut cell = [0usize; 3];
        for i in 0..3 {
            if bins[i] < 0 || bins[i] >= self.dims[i] as i64 {
                return None;
            }
            cell[i] = bins[i] as usize;
        }
        Some(cell)
    }

    pub fn contains(&self, position: &Point3<f64>) -> bool {
        self.checked_cell(self.signed_bins(position)).is_some()
    }

    #[inline]
    pub fn get(&self, cell: [usize; 3]) -> CellState {
        self.cells[self.index(cell)]
    }

    /// State of a possibly out-of-grid cell.
    #[inline]
    pub fn state_at(&self, bins: [i64; 3]) -> Option<CellState> {
        self.checked_cell(bins).map(|cell| self.get(cell))
    }

    /// Number of cells carrying any bit of `state`.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| c.intersects(state)).count()
    }

    /// Cells whose centres lie within `radius` of `center`, clipped to the grid.
    pub(crate) fn cells_within(&self, center: &Point3<f64>, radius: f64) -> Vec<[usize; 3]> {
        let w = self.settings.cell_width;
        let reach = (radius / w).ceil() as i64;
        let origin = self.signed_bins(center);
        let r2 = radius * radius;

        let mut cells = Vec::new();
        for di in -reach..=reach {
            for dj in -reach..=reach {
                for dk in -reach..=reach {
                    let bins = [origin[0] + di, origin[1] + dj, origin[2] + dk];
                    if let Some(cell) = self.checked_cell(bins) {
                        if (self.to_position(cell) - center).norm_squared() <= r2 {
                            cells.push(cell);
                        }
                    }
                }
            }
        }
        cells
    }

    fn radius_of(&self, atom: &Atom) -> Result<f64, GridError> {
        match self.settings.radius_model {
            RadiusModel::Uniform(radius) => Ok(radius),
            RadiusModel::VanDerWaals => atom
                .form_factor
                .map(|ff| ff.van_der_waals_radius())
                .ok_or_else(|| {
                    GridError::InvalidStructure(format!(
                        "atom at {:?} has no form-factor class for a van der Waals radius",
                        atom.position
                    ))
                }),
        }
    }

    /// Places free-standing atoms on the grid.
    pub fn place<'a>(&mut self, atoms: impl IntoIterator<Item = &'a Atom>) -> Result<(), GridError> {
        self.place_members(atoms.into_iter().map(|a| (None, a)))
    }

    /// Places the atoms of one body, remembering the owner of every atom.
    pub fn place_body<'a>(
        &mut self,
        body: BodyId,
        atoms: impl IntoIterator<Item = &'a Atom>,
    ) -> Result<(), GridError> {
        self.place_members(atoms.into_iter().map(|a| (Some(body), a)))
    }

    fn place_members<'a>(
        &mut self,
        atoms: impl Iterator<Item = (Option<BodyId>, &'a Atom)>,
    ) -> Result<(), GridError> {
        // Validate everything before touching any cell.
        let members = atoms
            .map(|(body, atom)| {
                Ok(GridMember {
                    position: atom.position,
                    cell: self.to_bins(&atom.position)?,
                    radius: self.radius_of(atom)?,
                    body,
                })
            })
            .collect::<Result<Vec<_>, GridError>>()?;

        for member in &members {
            let center = self.index(member.cell);
            self.cells[center] |= CellState::ATOM_CENTER | CellState::ATOM_AREA;
            for cell in self.cells_within(&member.position, member.radius) {
                let index = self.index(cell);
                if self.cells[index].is_empty_or_volume() {
                    self.cells[index] |= CellState::ATOM_AREA;
                }
            }
        }

        trace!(placed = members.len(), "Placed atoms on grid");
        self.atoms.extend(members);
        self.expanded = false;
        Ok(())
    }

    /// Registers a water and marks its centre and area. The position must lie inside the grid.
    pub(crate) fn add_water(
        &mut self,
        position: Point3<f64>,
        body: Option<BodyId>,
    ) -> Result<usize, GridError> {
        let member = GridMember {
            position,
            cell: self.to_bins(&position)?,
            radius: self.settings.water_radius,
            body,
        };
        self.mark_water(&member);
        self.waters.push(member);
        Ok(self.waters.len() - 1)
    }

    fn mark_water(&mut self, member: &GridMember) {
        let center = self.index(member.cell);
        self.cells[center] |= CellState::WATER_CENTER | CellState::WATER_AREA;
        for cell in self.cells_within(&member.position, member.radius) {
            let index = self.index(cell);
            if self.cells[index].is_empty_or_volume() {
                self.cells[index] |= CellState::WATER_AREA;
            }
        }
    }

    fn clear_water_bits(&mut self) {
        for cell in &mut self.cells {
            cell.remove(CellState::WATER_CENTER | CellState::WATER_AREA);
        }
    }

    /// Removes every water whose entry in `keep` is false.
    pub fn remove_waters(&mut self, keep: &[bool]) -> Result<(), GridError> {
        if keep.len() != self.waters.len() {
            return Err(GridError::InvalidOperation(
                "water mask length does not match the placed waters",
            ));
        }
        self.clear_water_bits();
        let mut kept = std::mem::take(&mut self.waters);
        let mut flags = keep.iter();
        kept.retain(|_| flags.next().copied().unwrap_or(false));
        for member in &kept {
            self.mark_water(member);
        }
        self.waters = kept;
        Ok(())
    }

    pub fn clear_waters(&mut self) {
        self.clear_water_bits();
        self.waters.clear();
    }

    /// Marks the solvent-inaccessible interior of the molecule as `VOLUME`.
    ///
    /// Empty cells near an atom become volume first. Then a flood fill from the grid
    /// boundary walks every cell that is neither atom area nor volume; empty cells it
    /// cannot reach are enclosed cavities and become volume too.
    pub fn expand_volume(&mut self) {
        for member in self.atoms.clone() {
            let radius = self.settings.min_exv_radius.max(member.radius);
            for cell in self.cells_within(&member.position, radius) {
                let index = self.index(cell);
                if self.cells[index].is_empty() {
                    self.cells[index] = CellState::VOLUME;
                }
            }
        }

        let passable = |c: CellState| !c.is_atom_area() && !c.is_volume();
        let mut reached = vec![false; self.cells.len()];
        let mut queue = VecDeque::new();
        let [nx, ny, nz] = self.dims;
        for index in 0..self.cells.len() {
            let [i, j, k] = self.unindex(index);
            let boundary = i == 0 || j == 0 || k == 0 || i == nx - 1 || j == ny - 1 || k == nz - 1;
            if boundary && passable(self.cells[index]) {
                reached[index] = true;
                queue.push_back(index);
            }
        }

        while let Some(index) = queue.pop_front() {
            let cell = self.unindex(index);
            for offset in NEIGHBOURS {
                let bins = [0, 1, 2].map(|i| cell[i] as i64 + offset[i]);
                if let Some(next) = self.checked_cell(bins) {
                    let next = self.index(next);
                    if !reached[next] && passable(self.cells[next]) {
                        reached[next] = true;
                        queue.push_back(next);
                    }
                }
            }
        }

        let mut enclosed = 0usize;
        for (cell, reached) in self.cells.iter_mut().zip(&reached) {
            if !reached && cell.is_empty() {
                *cell = CellState::VOLUME;
                enclosed += 1;
            }
        }
        debug!(enclosed, "Expanded molecular volume");
        self.expanded = true;
    }

    /// Volume of the molecular envelope (atom area plus expanded volume), in Å³.
    pub fn volume(&self) -> f64 {
        let w = self.settings.cell_width;
        self.count(CellState::ATOM_AREA | CellState::VOLUME) as f64 * w * w * w
    }

    /// Converts the molecular envelope into an excluded-volume point cloud.
    ///
    /// Expands the volume first if that has not been done since the last placement.
    pub fn generate_excluded_volume(&mut self) -> Result<ExcludedVolume, GridError> {
        if self.atoms.is_empty() {
            return Err(GridError::InvalidOperation(
                "no atoms have been placed on the grid",
            ));
        }
        if !self.expanded {
            self.expand_volume();
        }

        let envelope = CellState::ATOM_AREA | CellState::VOLUME;
        let mut interior = Vec::new();
        let mut surface = Vec::new();
        for index in 0..self.cells.len() {
            if !self.cells[index].intersects(envelope) {
                continue;
            }
            let cell = self.unindex(index);
            let on_surface = NEIGHBOURS.iter().any(|offset| {
                let bins = [0, 1, 2].map(|i| cell[i] as i64 + offset[i]);
                self.state_at(bins)
                    .is_none_or(|state| !state.intersects(envelope))
            });
            if on_surface {
                surface.push(self.to_position(cell));
            } else {
                interior.push(self.to_position(cell));
            }
        }

        debug!(
            interior = interior.len(),
            surface = surface.len(),
            "Generated excluded volume"
        );
        Ok(ExcludedVolume {
            interior,
            surface,
            interior_weight: 1.0,
            surface_weight: self.settings.surface_weight,
        })
    }

    /// Places a hydration shell around the atoms on the grid.
    ///
    /// Waters from any previous call are cleared first. Accepted waters are marked on the
    /// grid as they are found, so a candidate can never collide with an earlier one.
    pub fn generate_explicit_hydration(
        &mut self,
        strategy: HydrationStrategy,
    ) -> Result<Vec<PlacedWater>, GridError> {
        if self.atoms.is_empty() {
            return Err(GridError::InvalidOperation(
                "no atoms have been placed on the grid",
            ));
        }
        self.clear_waters();
        let placed = placement::place(self, strategy)?;
        debug!(waters = placed.len(), ?strategy, "Generated hydration candidates");
        Ok(placed)
    }

    /// Water positions currently on the grid, as solvent pseudo-atoms.
    pub fn water_positions(&self) -> Vec<Water> {
        self.waters.iter().map(|m| Water::new(m.position)).collect()
    }

    pub(crate) fn offset(&self, direction: &Vector3<f64>, distance: f64) -> [i64; 3] {
        let w = self.settings.cell_width;
        [0, 1, 2].map(|i| (distance * direction[i] / w).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn uniform(radius: f64) -> GridSettings {
        GridSettings {
            radius_model: RadiusModel::Uniform(radius),
            ..GridSettings::default()
        }
    }

    fn setup(radius: f64) -> Grid {
        Grid::new(
            Point3::origin(),
            Point3::new(10.0, 10.0, 10.0),
            uniform(radius),
        )
        .unwrap()
    }

    fn atom_at(x: f64, y: f64, z: f64) -> Atom {
        Atom::new(Point3::new(x, y, z), 1.0)
    }

    #[test]
    fn new_rounds_region_to_whole_cells() {
        let grid = Grid::new(
            Point3::origin(),
            Point3::new(9.5, 10.0, 4.0),
            GridSettings::default(),
        )
        .unwrap();
        assert_eq!(grid.dims(), [11, 11, 5]);
        assert_eq!(grid.len(), 11 * 11 * 5);
    }

    #[test]
    fn new_rejects_grid_above_cell_limit() {
        let result = Grid::new(
            Point3::origin(),
            Point3::new(2000.0, 2000.0, 2000.0),
            GridSettings::default(),
        );
        assert!(matches!(result, Err(GridError::Size { .. })));
    }

    #[test]
    fn enclosing_pads_around_atoms() {
        let atoms = [atom_at(0.0, 0.0, 0.0), atom_at(4.0, 2.0, -3.0)];
        let grid = Grid::enclosing(&atoms, GridSettings::default()).unwrap();
        let reach = MAX_ATOMIC_RADIUS + 2.0 * 1.52;
        for atom in &atoms {
            assert!(grid.contains(&atom.position));
            assert!(grid.contains(&(atom.position + Vector3::repeat(reach))));
            assert!(grid.contains(&(atom.position - Vector3::repeat(reach))));
        }
        assert!(matches!(
            Grid::enclosing(std::iter::empty::<&Atom>(), GridSettings::default()),
            Err(GridError::InvalidOperation(_))
        ));
    }

    #[test]
    fn bins_and_positions_are_inverse_at_cell_centres() {
        let grid = setup(1.0);
        let cell = grid.to_bins(&Point3::new(3.2, 4.9, 0.4)).unwrap();
        assert_eq!(cell, [3, 5, 0]);
        assert_eq!(grid.to_position(cell), Point3::new(3.0, 5.0, 0.0));
        assert!(grid.to_bins(&Point3::new(-1.0, 0.0, 0.0)).is_err());
        assert_eq!(grid.to_bins_clamped(&Point3::new(-4.0, 50.0, 5.0)), [0, 10, 5]);
    }

    #[test]
    fn placing_an_atom_marks_center_and_area() {
        let mut grid = setup(1.0);
        grid.place(&[atom_at(5.0, 5.0, 5.0)]).unwrap();
        assert!(grid.get([5, 5, 5]).contains(CellState::ATOM_CENTER | CellState::ATOM_AREA));
        assert!(grid.get([6, 5, 5]).is_atom_area());
        assert!(!grid.get([6, 6, 5]).is_atom_area());
        assert_eq!(grid.count(CellState::ATOM_AREA), 7);
        assert!(f64_approx_equal(grid.volume(), 7.0));
    }

    #[test]
    fn every_atom_center_is_also_atom_area() {
        let mut grid = setup(1.5);
        grid.place(&[atom_at(2.0, 2.0, 2.0), atom_at(3.0, 2.0, 2.0), atom_at(7.0, 6.0, 5.0)])
            .unwrap();
        for index in 0..grid.len() {
            let cell = grid.cells[index];
            if cell.is_atom_center() {
                assert!(cell.is_atom_area());
                assert!(!cell.is_empty());
            }
        }
        assert_eq!(grid.count(CellState::ATOM_CENTER), 3);
    }

    #[test]
    fn out_of_bounds_atom_is_rejected_before_any_cell_is_touched() {
        let mut grid = setup(1.0);
        let result = grid.place(&[atom_at(5.0, 5.0, 5.0), atom_at(20.0, 5.0, 5.0)]);
        assert!(matches!(result, Err(GridError::Bounds { .. })));
        assert_eq!(grid.count(CellState::ATOM_AREA), 0);
        assert!(grid.atoms().is_empty());
    }

    #[test]
    fn van_der_waals_model_requires_form_factor() {
        let mut grid =
            Grid::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0), GridSettings::default())
                .unwrap();
        assert!(matches!(
            grid.place(&[atom_at(5.0, 5.0, 5.0)]),
            Err(GridError::InvalidStructure(_))
        ));
        let carbon = Atom::from_element(Point3::new(5.0, 5.0, 5.0), 1.0, "C");
        grid.place(&[carbon]).unwrap();
        assert!(f64_approx_equal(grid.atoms()[0].radius, 1.70));
    }

    #[test]
    fn expand_volume_fills_enclosed_cavity() {
        let mut grid = Grid::new(
            Point3::origin(),
            Point3::new(20.0, 20.0, 20.0),
            uniform(1.0),
        )
        .unwrap();
        let mut shell = Vec::new();
        for i in 5..=15 {
            for j in 5..=15 {
                for k in 5..=15 {
                    let on_face = [i, j, k].iter().any(|&v| v == 5 || v == 15);
                    if on_face {
                        shell.push(atom_at(i as f64, j as f64, k as f64));
                    }
                }
            }
        }
        grid.place(&shell).unwrap();
        assert!(grid.get([10, 10, 10]).is_empty());

        grid.expand_volume();
        assert!(grid.is_expanded());
        assert!(grid.get([10, 10, 10]).is_volume());
        assert!(grid.get([0, 0, 0]).is_empty());
        assert!(grid.get([2, 10, 10]).is_empty());
    }

    #[test]
    fn expand_volume_is_idempotent() {
        let mut grid = setup(1.0);
        grid.place(&[atom_at(5.0, 5.0, 5.0)]).unwrap();
        grid.expand_volume();
        let first = grid.cells.clone();
        grid.expand_volume();
        assert_eq!(grid.cells, first);
    }

    #[test]
    fn excluded_volume_of_single_atom_splits_interior_and_surface() {
        let mut grid = setup(1.0);
        grid.place(&[atom_at(5.0, 5.0, 5.0)]).unwrap();
        let exv = grid.generate_excluded_volume().unwrap();
        assert_eq!(exv.len(), 33);
        assert_eq!(exv.interior.len(), 7);
        assert_eq!(exv.surface.len(), 26);
        assert!(f64_approx_equal(exv.surface_weight, 1.0));
    }

    #[test]
    fn excluded_volume_without_atoms_is_invalid() {
        let mut grid = setup(1.0);
        assert!(matches!(
            grid.generate_excluded_volume(),
            Err(GridError::InvalidOperation(_))
        ));
        assert!(matches!(
            grid.generate_explicit_hydration(HydrationStrategy::Axes),
            Err(GridError::InvalidOperation(_))
        ));
    }

    #[test]
    fn remove_waters_keeps_marked_waters_only() {
        let mut grid = setup(1.0);
        grid.add_water(Point3::new(2.0, 2.0, 2.0), None).unwrap();
        grid.add_water(Point3::new(7.0, 7.0, 7.0), None).unwrap();
        assert_eq!(grid.count(CellState::WATER_CENTER), 2);

        assert!(grid.remove_waters(&[true]).is_err());
        grid.remove_waters(&[false, true]).unwrap();
        assert_eq!(grid.waters().len(), 1);
        assert!(grid.get([7, 7, 7]).is_water_center());
        assert!(grid.get([2, 2, 2]).is_empty());

        grid.clear_waters();
        assert_eq!(grid.count(CellState::WATER_CENTER | CellState::WATER_AREA), 0);
    }
}
