//! Grid placement engine: the cell matrix of grid containers and the
//! geometric search over it.
//!
//! Cells never store quantities. A non-empty cell points at a stack through
//! `(item_id, stack_index)`; every cell of a footprint carries the same
//! reference and only the top-left cell is marked `origin`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stowage_core::ItemId;

use crate::metadata::ItemSize;
use crate::stack::{ItemStack, Placement};

/// Reference from a cell to the stack covering it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub item_id: ItemId,
    pub stack_index: usize,
    pub origin: bool,
}

/// A cell resolved against live stack state (see `Engine::grid`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellView {
    pub item_id: ItemId,
    pub stack_index: usize,
    pub quantity: u32,
    pub origin: bool,
}

/// Row-major cell matrix of one grid container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridState {
    width: u32,
    height: u32,
    cells: Vec<Option<GridCell>>,
}

impl GridState {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            cells: vec![None; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<&GridCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[self.index(x, y)].as_ref()
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[Option<GridCell>] {
        &self.cells
    }

    pub fn free_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn in_bounds(&self, x: u32, y: u32, size: ItemSize) -> bool {
        u64::from(x) + u64::from(size.width) <= u64::from(self.width)
            && u64::from(y) + u64::from(size.height) <= u64::from(self.height)
    }

    /// True when the footprint lies inside the grid and covers no occupied cell.
    pub fn is_free(&self, x: u32, y: u32, size: ItemSize) -> bool {
        if !self.in_bounds(x, y, size) {
            return false;
        }
        (y..y + size.height).all(|cy| {
            let row = self.index(x, cy);
            self.cells[row..row + size.width as usize]
                .iter()
                .all(Option::is_none)
        })
    }

    /// Every top-left coordinate where `size` fits, row-major. When rotation
    /// is allowed and the item is not square, rotated candidates follow the
    /// unrotated ones.
    pub fn find_placements(&self, size: ItemSize, allow_rotation: bool) -> Vec<Placement> {
        let mut found = self.scan(size, false);
        if allow_rotation && !size.is_square() {
            found.extend(self.scan(size.oriented(true), true));
        }
        found
    }

    /// First candidate `find_placements` would return.
    pub fn first_placement(&self, size: ItemSize, allow_rotation: bool) -> Option<Placement> {
        self.scan_first(size, false).or_else(|| {
            if allow_rotation && !size.is_square() {
                self.scan_first(size.oriented(true), true)
            } else {
                None
            }
        })
    }

    /// How many footprints repeated `first_placement` + occupy calls would
    /// claim, without touching the grid.
    ///
    /// A claim only ever blocks candidates, so the greedy fill is a single
    /// row-major sweep per orientation: the unrotated pass first, then the
    /// rotated pass over whatever is left.
    pub fn count_placements(&self, size: ItemSize, allow_rotation: bool) -> u64 {
        let mut taken: Vec<bool> = self.cells.iter().map(Option::is_some).collect();
        let mut count = self.sweep(&mut taken, size);
        if allow_rotation && !size.is_square() {
            count += self.sweep(&mut taken, size.oriented(true));
        }
        count
    }

    fn sweep(&self, taken: &mut [bool], footprint: ItemSize) -> u64 {
        let w = footprint.width as usize;
        let mut count = 0;
        for (x, y) in self.candidates(footprint) {
            let rows = y..y + footprint.height;
            let free = rows.clone().all(|cy| {
                let start = self.index(x, cy);
                !taken[start..start + w].iter().any(|&t| t)
            });
            if free {
                for cy in rows {
                    let start = self.index(x, cy);
                    taken[start..start + w].iter_mut().for_each(|t| *t = true);
                }
                count += 1;
            }
        }
        count
    }

    fn candidates(&self, footprint: ItemSize) -> impl Iterator<Item = (u32, u32)> + use<> {
        let span_x = self.width.checked_sub(footprint.width).map_or(0, |m| m + 1);
        let span_y = self.height.checked_sub(footprint.height).map_or(0, |m| m + 1);
        (0..span_y).flat_map(move |y| (0..span_x).map(move |x| (x, y)))
    }

    fn scan(&self, footprint: ItemSize, rotated: bool) -> Vec<Placement> {
        self.candidates(footprint)
            .filter(|&(x, y)| self.is_free(x, y, footprint))
            .map(|(x, y)| Placement { x, y, rotated })
            .collect()
    }

    fn scan_first(&self, footprint: ItemSize, rotated: bool) -> Option<Placement> {
        self.candidates(footprint)
            .find(|&(x, y)| self.is_free(x, y, footprint))
            .map(|(x, y)| Placement { x, y, rotated })
    }

    /// Write a footprint. Callers check `is_free` first.
    pub(crate) fn occupy(&mut self, x: u32, y: u32, footprint: ItemSize, item: &ItemId, stack_index: usize) {
        for cy in y..y + footprint.height {
            for cx in x..x + footprint.width {
                let idx = self.index(cx, cy);
                self.cells[idx] = Some(GridCell {
                    item_id: item.clone(),
                    stack_index,
                    origin: cx == x && cy == y,
                });
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// Rebuild the stack indices of `item`'s cells from current stack
    /// positions. Origin cells are matched to the stack anchored at their
    /// coordinate; the rest of each footprint follows its origin. Cells whose
    /// stack no longer exists are cleared.
    pub(crate) fn reindex_item(&mut self, item: &ItemId, stacks: &[ItemStack]) {
        let by_position: HashMap<(u32, u32), usize> = stacks
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.position.map(|p| ((p.x, p.y), i)))
            .collect();

        let width = self.width as usize;
        let mut remap: HashMap<usize, usize> = HashMap::new();
        for (idx, slot) in self.cells.iter_mut().enumerate() {
            let Some(cell) = slot.as_mut() else { continue };
            if cell.item_id != *item || !cell.origin {
                continue;
            }
            let at = ((idx % width) as u32, (idx / width) as u32);
            match by_position.get(&at) {
                Some(&new_index) => {
                    remap.insert(cell.stack_index, new_index);
                    cell.stack_index = new_index;
                }
                None => *slot = None,
            }
        }

        for slot in self.cells.iter_mut() {
            let Some(cell) = slot.as_mut() else { continue };
            if cell.item_id != *item || cell.origin {
                continue;
            }
            match remap.get(&cell.stack_index) {
                Some(&new_index) => cell.stack_index = new_index,
                None => *slot = None,
            }
        }
    }
}
