//! Sparse terrain storage backing the world's grid queries.

use std::collections::HashMap;

use menagerie_core::{Coordinate, TerrainKind};

/// Finite set of grid cells, each holding exactly one terrain classification.
///
/// Membership and lookup are hash-based so irregular level shapes cost no
/// more than rectangular ones.
#[derive(Clone, Debug, Default)]
pub(crate) struct TerrainMap {
    cells: HashMap<Coordinate, TerrainKind>,
}

impl TerrainMap {
    pub(crate) fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = (Coordinate, TerrainKind)>,
    {
        Self {
            cells: cells.into_iter().collect(),
        }
    }

    pub(crate) fn get(&self, at: Coordinate) -> Option<TerrainKind> {
        self.cells.get(&at).copied()
    }

    /// Stores `terrain` at `at`, returning the classification it replaced.
    pub(crate) fn set(&mut self, at: Coordinate, terrain: TerrainKind) -> Option<TerrainKind> {
        self.cells.insert(at, terrain)
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Coordinate, TerrainKind)> + '_ {
        self.cells.iter().map(|(cell, kind)| (*cell, *kind))
    }

    /// Smallest rectangle enclosing every cell, as `(min, max)` corners.
    pub(crate) fn bounds(&self) -> Option<(Coordinate, Coordinate)> {
        let mut cells = self.cells.keys();
        let first = *cells.next()?;
        let (min, max) = cells.fold((first, first), |(min, max), cell| {
            (
                Coordinate::new(min.x().min(cell.x()), min.z().min(cell.z())),
                Coordinate::new(max.x().max(cell.x()), max.z().max(cell.z())),
            )
        });
        Some((min, max))
    }
}
