use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Occupancy of a single voxel, stored as a bit set.
///
/// A cell can carry several roles at once, e.g. an atom centre is always also part of the
/// atom's area. `EMPTY` is the absence of every bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellState(u8);

impl CellState {
    pub const EMPTY: Self = Self(0);
    pub const VOLUME: Self = Self(1);
    pub const ATOM_CENTER: Self = Self(1 << 1);
    pub const ATOM_AREA: Self = Self(1 << 2);
    pub const WATER_CENTER: Self = Self(1 << 3);
    pub const WATER_AREA: Self = Self(1 << 4);

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True when every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_volume(self) -> bool {
        self.intersects(Self::VOLUME)
    }

    /// Free for solvent: nothing but (possibly) expanded volume.
    #[inline]
    pub const fn is_empty_or_volume(self) -> bool {
        self.0 & !Self::VOLUME.0 == 0
    }

    #[inline]
    pub const fn is_atom_center(self) -> bool {
        self.intersects(Self::ATOM_CENTER)
    }

    #[inline]
    pub const fn is_atom_area(self) -> bool {
        self.intersects(Self::ATOM_AREA)
    }

    #[inline]
    pub const fn is_water_center(self) -> bool {
        self.intersects(Self::WATER_CENTER)
    }

    #[inline]
    pub const fn is_water_area(self) -> bool {
        self.intersects(Self::WATER_AREA)
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for CellState {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CellState {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CellState {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}
