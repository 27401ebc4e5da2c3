//! Power-ups: inventory, acquisition rolls and the board-side helpers for
//! the items that need them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::config::ItemTable;
use crate::game::field::Board;
use crate::game::types::{Color, Pos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Highlight a few productive swaps.
    Scry,
    /// Blow up a random 3x3 area.
    Bomb,
    Shuffle,
    Recolor,
    /// Random score multipliers for the next few score applications.
    Streak,
    /// Swap any two cells.
    FreeSwap,
}

impl ItemKind {
    pub const ALL: [Self; 6] = [
        Self::Scry,
        Self::Bomb,
        Self::Shuffle,
        Self::Recolor,
        Self::Streak,
        Self::FreeSwap,
    ];
    pub const NORMAL: [Self; 3] = [Self::Scry, Self::Bomb, Self::Shuffle];
    pub const SPECIAL: [Self; 3] = [Self::Recolor, Self::Streak, Self::FreeSwap];

    pub fn id(self) -> &'static str {
        match self {
            Self::Scry => "scry",
            Self::Bomb => "bomb",
            Self::Shuffle => "shuffle",
            Self::Recolor => "recolor",
            Self::Streak => "streak",
            Self::FreeSwap => "free_swap",
        }
    }

    pub fn is_special(self) -> bool {
        Self::SPECIAL.contains(&self)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ItemKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|item| item.id() == id)
            .ok_or_else(|| GameError::UnknownItem(s.to_string()))
    }
}

/// Item counts. Normal items start at one, special items at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    counts: BTreeMap<ItemKind, u32>,
}

impl Default for Inventory {
    fn default() -> Self {
        let counts = ItemKind::ALL
            .into_iter()
            .map(|item| (item, u32::from(!item.is_special())))
            .collect();
        Self { counts }
    }
}

impl Inventory {
    pub fn count(&self, item: ItemKind) -> u32 {
        self.counts.get(&item).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item: ItemKind) {
        *self.counts.entry(item).or_default() += 1;
    }

    /// Consume one unit; `false` when the slot is empty.
    pub fn take(&mut self, item: ItemKind) -> bool {
        match self.counts.get_mut(&item) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemKind, u32)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}

/// Multiplier window opened by [`ItemKind::Streak`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultiplierStreak {
    remaining: u32,
}

impl MultiplierStreak {
    pub fn activate(&mut self, table: &ItemTable) {
        self.remaining = table.streak_length;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
    }

    /// Scale one score application by a random multiplier, rounding up.
    /// Returns `(multiplier, scaled)` while the window is open.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        points: u64,
        table: &ItemTable,
        rng: &mut R,
    ) -> Option<(f64, u64)> {
        if !self.is_active() {
            return None;
        }
        let multiplier = table.streak_multipliers.choose(rng).copied().unwrap_or(1.0);
        self.remaining -= 1;
        Some((multiplier, (points as f64 * multiplier).ceil() as u64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    Item(ItemKind),
    BonusMoves(u32),
}

/// The roll made each time the score enters a new hundred.
pub fn roll_acquisition<R: Rng + ?Sized>(table: &ItemTable, rng: &mut R) -> Acquisition {
    let roll = rng.gen::<f64>();
    if roll < table.normal_chance {
        return Acquisition::Item(pick(&ItemKind::NORMAL, rng));
    }
    if roll < table.normal_chance + table.special_chance {
        return Acquisition::Item(pick(&ItemKind::SPECIAL, rng));
    }
    let bonus = rng.gen::<f64>();
    let moves = if bonus < table.bonus_three_chance {
        3
    } else if bonus < table.bonus_three_chance + table.bonus_two_chance {
        2
    } else {
        1
    };
    Acquisition::BonusMoves(moves)
}

/// Uniform pick over all six items; the boss-defeat reward.
pub fn random_item<R: Rng + ?Sized>(rng: &mut R) -> ItemKind {
    pick(&ItemKind::ALL, rng)
}

fn pick<R: Rng + ?Sized>(items: &[ItemKind], rng: &mut R) -> ItemKind {
    items.choose(rng).copied().unwrap_or(ItemKind::Scry)
}

/// A random 3x3 block whose center lies strictly inside the board.
pub fn bomb_area<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Option<Vec<Pos>> {
    if size < 3 {
        return None;
    }
    let row = rng.gen_range(1..size - 1);
    let col = rng.gen_range(1..size - 1);
    Some(
        (row - 1..=row + 1)
            .flat_map(|r| (col - 1..=col + 1).map(move |c| Pos::new(r, c)))
            .collect(),
    )
}

/// Repaint every tile. Returns the cells whose color changed.
pub fn recolor(board: &mut Board, color: Color) -> Vec<Pos> {
    let mut changed = Vec::new();
    for pos in board.positions().collect::<Vec<_>>() {
        if let Some(mut tile) = board.get(pos) {
            if tile.color != color {
                tile.color = color;
                board.set(pos, Some(tile));
                changed.push(pos);
            }
        }
    }
    changed
}
