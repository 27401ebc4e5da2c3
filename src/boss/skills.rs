use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::BossEncounter;
use crate::game::config::BossTable;
use crate::game::field::Board;
use crate::game::types::{Pos, Shape};

const FREEZE_CELLS: RangeInclusive<usize> = 3..=5;
const POISON_CELLS: RangeInclusive<usize> = 1..=10;
const SUMMON_CELLS: usize = 3;
const MONSTER_HP: RangeInclusive<u32> = 2..=4;
const BOMB_FUSE: RangeInclusive<u32> = 3..=5;
/// Shield is `ceil(max_hp * u)` with `u` drawn from `[0.1, 0.3)`.
const SHIELD_BASE: f64 = 0.1;
const SHIELD_SPREAD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossSkill {
    Freeze,
    Poison,
    Summon,
    Shield,
    /// Reshape a share of the board's tiles.
    Transform,
    Countdown,
    NormalAttack,
}

impl BossSkill {
    pub const ALL: [Self; 7] = [
        Self::Freeze,
        Self::Poison,
        Self::Summon,
        Self::Shield,
        Self::Transform,
        Self::Countdown,
        Self::NormalAttack,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Freeze => "freeze",
            Self::Poison => "poison",
            Self::Summon => "summon",
            Self::Shield => "shield",
            Self::Transform => "transform",
            Self::Countdown => "countdown",
            Self::NormalAttack => "normal_attack",
        }
    }
}

/// Cumulative walk over the weight table. Weights are not normalised, so a
/// roll past their sum selects nothing.
pub fn select_skill(weights: &[(BossSkill, f64)], roll: f64) -> Option<BossSkill> {
    let mut cumulative = 0.0;
    for &(skill, weight) in weights {
        cumulative += weight;
        if roll <= cumulative {
            return Some(skill);
        }
    }
    None
}

/// What a cast skill did to the board or the combatants.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillEffect {
    Froze(Vec<Pos>),
    Poisoned(Vec<Pos>),
    Summoned(Vec<Pos>),
    Shielded(u64),
    Transformed(Vec<Pos>),
    BombPlaced { pos: Pos, fuse: u32 },
    Attacked { damage: u64 },
}

impl SkillEffect {
    pub fn skill(&self) -> BossSkill {
        match self {
            Self::Froze(_) => BossSkill::Freeze,
            Self::Poisoned(_) => BossSkill::Poison,
            Self::Summoned(_) => BossSkill::Summon,
            Self::Shielded(_) => BossSkill::Shield,
            Self::Transformed(_) => BossSkill::Transform,
            Self::BombPlaced { .. } => BossSkill::Countdown,
            Self::Attacked { .. } => BossSkill::NormalAttack,
        }
    }

    /// Cells whose tile or hazard marker changed.
    pub fn cells(&self) -> Vec<Pos> {
        match self {
            Self::Froze(cells)
            | Self::Poisoned(cells)
            | Self::Summoned(cells)
            | Self::Transformed(cells) => cells.clone(),
            Self::BombPlaced { pos, .. } => vec![*pos],
            Self::Shielded(_) | Self::Attacked { .. } => Vec::new(),
        }
    }
}

fn pick_cells<R: Rng + ?Sized>(
    board: &Board,
    amount: usize,
    rng: &mut R,
    free: impl Fn(Pos) -> bool,
) -> Vec<Pos> {
    let candidates: Vec<Pos> = board.positions().filter(|p| free(*p)).collect();
    let mut picked: Vec<Pos> = candidates.choose_multiple(rng, amount).copied().collect();
    picked.sort();
    picked
}

impl BossEncounter {
    /// Apply one skill. `None` when the skill found nowhere to act.
    pub fn execute<R: Rng + ?Sized>(
        &mut self,
        skill: BossSkill,
        board: &mut Board,
        table: &BossTable,
        rng: &mut R,
    ) -> Option<SkillEffect> {
        let effect = match skill {
            BossSkill::Freeze => {
                let amount = rng.gen_range(FREEZE_CELLS);
                let cells = pick_cells(board, amount, rng, |p| !self.hazards.frozen.contains_key(&p));
                for &pos in &cells {
                    self.hazards.frozen.insert(pos, table.freeze_hits);
                }
                SkillEffect::Froze(cells)
            }
            BossSkill::Poison => {
                let amount = rng.gen_range(POISON_CELLS);
                let cells = pick_cells(board, amount, rng, |p| !self.hazards.poisoned.contains(&p));
                self.hazards.poisoned.extend(cells.iter().copied());
                SkillEffect::Poisoned(cells)
            }
            BossSkill::Summon => {
                let cells = pick_cells(board, SUMMON_CELLS, rng, |p| {
                    !self.hazards.monsters.contains_key(&p)
                });
                for &pos in &cells {
                    self.hazards.monsters.insert(pos, rng.gen_range(MONSTER_HP));
                }
                SkillEffect::Summoned(cells)
            }
            BossSkill::Shield => {
                let ratio = SHIELD_BASE + rng.gen::<f64>() * SHIELD_SPREAD;
                let amount = (self.boss.max_hp as f64 * ratio).ceil() as u64;
                self.boss.shield += amount;
                SkillEffect::Shielded(amount)
            }
            BossSkill::Transform => {
                let total = board.size() * board.size();
                let amount = (total as f64 * table.transform_ratio).floor() as usize;
                let cells = pick_cells(board, amount, rng, |p| board.get(p).is_some());
                for &pos in &cells {
                    if let Some(mut tile) = board.get(pos) {
                        let others: Vec<Shape> =
                            Shape::ALL.into_iter().filter(|s| *s != tile.shape).collect();
                        if let Some(&shape) = others.choose(rng) {
                            tile.shape = shape;
                            board.set(pos, Some(tile));
                        }
                    }
                }
                SkillEffect::Transformed(cells)
            }
            BossSkill::Countdown => {
                let pos = *pick_cells(board, 1, rng, |p| !self.hazards.bombs.contains_key(&p)).first()?;
                let fuse = rng.gen_range(BOMB_FUSE);
                self.hazards.bombs.insert(pos, fuse);
                SkillEffect::BombPlaced { pos, fuse }
            }
            BossSkill::NormalAttack => {
                let damage = (self.boss.max_hp as f64 * table.attack_ratio).ceil() as u64;
                self.damage_player(damage);
                SkillEffect::Attacked { damage }
            }
        };
        Some(effect)
    }
}
