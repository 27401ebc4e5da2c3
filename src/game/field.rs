use rand::Rng;
use tracing::warn;

use super::rng::TileDistribution;
use super::types::{Axis, Match, Pos, Tile};
use crate::error::GameError;

/// Cap on whole-board regenerations before accepting an imperfect board.
pub const REGENERATION_ATTEMPTS: u32 = 100;

/// A tile moved by gravity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub from: Pos,
    pub to: Pos,
}

/// The square N×N grid. Cells are stored row-major; `None` is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Tile>>,
}

impl Board {
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Build a board from one string per row, whitespace-separated tile
    /// codes (`Tg`, `*r`, ...) with `.` for an empty cell.
    pub fn from_rows(rows: &[&str]) -> Result<Self, GameError> {
        let size = rows.len();
        let mut board = Self::empty(size);
        for (row, line) in rows.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != size {
                return Err(GameError::Layout(format!(
                    "row {row} has {} cells, expected {size}",
                    tokens.len()
                )));
            }
            for (col, token) in tokens.into_iter().enumerate() {
                let tile = match token {
                    "." => None,
                    code => Some(code.parse()?),
                };
                board.set(Pos::new(row, col), tile);
            }
        }
        Ok(board)
    }

    /// Fresh board with no match at rest and at least one productive swap.
    pub fn generate<R: Rng + ?Sized>(size: usize, dist: &TileDistribution, rng: &mut R) -> Self {
        let mut board = Self::empty(size);
        board.randomize(dist, rng);
        board
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    pub fn check(&self, pos: Pos) -> Result<(), GameError> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(GameError::OutOfBounds {
                pos,
                size: self.size,
            })
        }
    }

    #[inline]
    fn index(&self, pos: Pos) -> usize {
        pos.row * self.size + pos.col
    }

    /// Tile at `pos`; out-of-range positions read as empty.
    pub fn get(&self, pos: Pos) -> Option<Tile> {
        if !self.contains(pos) {
            return None;
        }
        self.cells[self.index(pos)]
    }

    /// Writing outside the board is a caller bug: it panics in debug builds
    /// and is ignored in release builds.
    pub fn set(&mut self, pos: Pos, tile: Option<Tile>) {
        debug_assert!(self.contains(pos), "set at {pos} outside the {0}x{0} board", self.size);
        if self.contains(pos) {
            let i = self.index(pos);
            self.cells[i] = tile;
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> {
        let size = self.size;
        (0..size).flat_map(move |row| (0..size).map(move |col| Pos::new(row, col)))
    }

    pub fn has_empty(&self) -> bool {
        self.cells.iter().any(Option::is_none)
    }

    /// Exchange two cells unconditionally.
    pub fn swap(&mut self, a: Pos, b: Pos) {
        debug_assert!(
            self.contains(a) && self.contains(b),
            "swap {a} <-> {b} outside the {0}x{0} board",
            self.size
        );
        if self.contains(a) && self.contains(b) {
            let (ia, ib) = (self.index(a), self.index(b));
            self.cells.swap(ia, ib);
        }
    }

    pub fn clear(&mut self, cells: &[Pos]) {
        for &pos in cells {
            self.set(pos, None);
        }
    }

    /// Overwrite every cell with a fresh draw.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, dist: &TileDistribution, rng: &mut R) {
        for cell in &mut self.cells {
            *cell = Some(dist.sample(rng));
        }
    }

    /// Regenerate until nothing matches at rest and a productive swap exists.
    /// Returns `false` when the attempt cap was hit and the board is only best-effort.
    pub fn randomize<R: Rng + ?Sized>(&mut self, dist: &TileDistribution, rng: &mut R) -> bool {
        let mut settled = self.fill_quiet(dist, rng);
        let mut attempts = 0;
        while !self.has_possible_moves() {
            if attempts >= REGENERATION_ATTEMPTS {
                warn!(size = self.size, "regeneration exhausted, keeping a board without moves");
                return false;
            }
            settled = self.fill_quiet(dist, rng);
            attempts += 1;
        }
        settled
    }

    fn fill_quiet<R: Rng + ?Sized>(&mut self, dist: &TileDistribution, rng: &mut R) -> bool {
        self.fill_random(dist, rng);
        let mut attempts = 0;
        while !self.find_matches().is_empty() {
            if attempts >= REGENERATION_ATTEMPTS {
                warn!(size = self.size, "regeneration exhausted, keeping a board with matches");
                return false;
            }
            self.fill_random(dist, rng);
            attempts += 1;
        }
        true
    }

    /// Every horizontal and vertical run of three or more identical tiles.
    ///
    /// A run is started at every cell, so a run of four also yields the
    /// three-long run beginning one cell later. Horizontal runs come first.
    pub fn find_matches(&self) -> Vec<Match> {
        let mut matches = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size.saturating_sub(2) {
                if let Some(m) = self.run_from(Pos::new(row, col), Axis::Horizontal) {
                    matches.push(m);
                }
            }
        }
        for col in 0..self.size {
            for row in 0..self.size.saturating_sub(2) {
                if let Some(m) = self.run_from(Pos::new(row, col), Axis::Vertical) {
                    matches.push(m);
                }
            }
        }
        matches
    }

    fn run_from(&self, start: Pos, axis: Axis) -> Option<Match> {
        let first = self.get(start)?;
        let step = |p: Pos| match axis {
            Axis::Horizontal => Pos::new(p.row, p.col + 1),
            Axis::Vertical => Pos::new(p.row + 1, p.col),
        };
        let mut cells = vec![start];
        let mut next = step(start);
        while self.get(next) == Some(first) {
            cells.push(next);
            next = step(next);
        }
        (cells.len() >= 3).then_some(Match { axis, cells })
    }

    /// Swap, test for any match, and swap back.
    pub fn swap_makes_match(&mut self, a: Pos, b: Pos) -> bool {
        self.swap(a, b);
        let found = !self.find_matches().is_empty();
        self.swap(a, b);
        found
    }

    /// Every right/down neighbour swap that would produce a match.
    pub fn productive_swaps(&mut self) -> Vec<(Pos, Pos)> {
        let mut swaps = Vec::new();
        self.probe(|a, b| {
            swaps.push((a, b));
            false
        });
        swaps
    }

    /// True as soon as one right/down neighbour swap produces a match.
    /// Costs O(N²) probes of an O(N²) scan each.
    pub fn has_possible_moves(&mut self) -> bool {
        self.probe(|_, _| true)
    }

    /// Runs `hit` for each productive swap until it returns true.
    fn probe(&mut self, mut hit: impl FnMut(Pos, Pos) -> bool) -> bool {
        for row in 0..self.size {
            for col in 0..self.size {
                let here = Pos::new(row, col);
                let neighbours = [Pos::new(row, col + 1), Pos::new(row + 1, col)];
                for there in neighbours {
                    if self.contains(there) && self.swap_makes_match(here, there) && hit(here, there) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Per column, bottom-up: each empty cell pulls the nearest tile above it down.
    pub fn apply_gravity(&mut self) -> Vec<Fall> {
        let mut falls = Vec::new();
        for col in 0..self.size {
            for row in (0..self.size).rev() {
                let to = Pos::new(row, col);
                if self.get(to).is_some() {
                    continue;
                }
                let above = (0..row).rev().map(|r| Pos::new(r, col)).find(|p| self.get(*p).is_some());
                if let Some(from) = above {
                    self.set(to, self.get(from));
                    self.set(from, None);
                    falls.push(Fall { from, to });
                }
            }
        }
        falls
    }

    /// Fill every empty cell with a fresh draw, column by column, top-down.
    pub fn refill<R: Rng + ?Sized>(&mut self, dist: &TileDistribution, rng: &mut R) -> Vec<Pos> {
        let mut placed = Vec::new();
        for col in 0..self.size {
            for row in 0..self.size {
                let pos = Pos::new(row, col);
                if self.get(pos).is_none() {
                    self.set(pos, Some(dist.sample(rng)));
                    placed.push(pos);
                }
            }
        }
        placed
    }
}
