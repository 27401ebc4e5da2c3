//! Outbound interface to a presentation layer.
//!
//! The session reports every structural change through [`GameObserver`] and
//! hands out read-only snapshots, so a renderer never touches live state.

use crate::boss::{BossEncounter, BossSkill, Hazards};
use crate::game::field::Board;
use crate::game::types::{MatchKind, Pos, Tile};
use crate::items::ItemKind;

/// Points in a turn where a frontend may pause to animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspend {
    AfterSwap,
    AfterClear,
    AfterGravity,
    AfterRefill,
    AfterHazards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Poison,
    BossAttack,
}

/// Transient notices for banners and floating numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Combo(u32),
    MatchKind(MatchKind),
    SkillCast(BossSkill),
    SkillSealed { remaining: u32 },
    PlayerDamaged { amount: u64, source: DamageSource },
    PlayerHealed(u64),
    BossDamaged { amount: u64, absorbed: u64 },
    StreakApplied { multiplier: f64, points: u64 },
    ItemGained(ItemKind),
    BonusMoves(u32),
    BombDetonated { pos: Pos, penalty: u32 },
    Hints(Vec<(Pos, Pos)>),
    BoardRefreshed,
    LevelStarted(u32),
    BossDefeated(u32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellView {
    pub tile: Option<Tile>,
    pub frozen: Option<u32>,
    pub poisoned: bool,
    pub monster: Option<u32>,
    pub bomb: Option<u32>,
    pub hinted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub size: usize,
    pub cells: Vec<CellView>,
}

impl BoardSnapshot {
    pub fn capture(board: &Board, hazards: Option<&Hazards>, hints: &[(Pos, Pos)]) -> Self {
        let cells = board
            .positions()
            .map(|pos| {
                let mut view = CellView {
                    tile: board.get(pos),
                    hinted: hints.iter().any(|(a, b)| *a == pos || *b == pos),
                    ..CellView::default()
                };
                if let Some(h) = hazards {
                    view.frozen = h.frozen.get(&pos).copied();
                    view.poisoned = h.poisoned.contains(&pos);
                    view.monster = h.monsters.get(&pos).copied();
                    view.bomb = h.bombs.get(&pos).copied();
                }
                view
            })
            .collect();
        Self {
            size: board.size(),
            cells,
        }
    }

    pub fn get(&self, pos: Pos) -> Option<&CellView> {
        if pos.row >= self.size || pos.col >= self.size {
            return None;
        }
        self.cells.get(pos.row * self.size + pos.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BossSnapshot {
    pub level: u32,
    pub name: &'static str,
    pub avatar: &'static str,
    pub hp: u64,
    pub max_hp: u64,
    pub shield: u64,
    pub player_hp: u64,
    pub player_max_hp: u64,
    pub seal_turns: u32,
    pub trigger_rate: f64,
}

impl From<&BossEncounter> for BossSnapshot {
    fn from(enc: &BossEncounter) -> Self {
        Self {
            level: enc.level,
            name: enc.boss.name,
            avatar: enc.boss.avatar(),
            hp: enc.boss.hp,
            max_hp: enc.boss.max_hp,
            shield: enc.boss.shield,
            player_hp: enc.player_hp,
            player_max_hp: enc.player_max_hp,
            seal_turns: enc.skill_seal_turns,
            trigger_rate: enc.boss.skill_trigger_rate,
        }
    }
}

/// Every method has a no-op default; implement only what you render.
pub trait GameObserver {
    fn on_board_changed(&mut self, _board: &BoardSnapshot, _changed: &[Pos]) {}

    fn on_score_changed(&mut self, _total: u64, _delta: u64, _formula: &str) {}

    fn on_effect(&mut self, _effect: &Effect) {}

    fn on_boss_changed(&mut self, _boss: &BossSnapshot) {}

    fn on_turn_end(&mut self) {}

    /// `level` is 0 outside boss mode.
    fn on_game_over(&mut self, _victory: bool, _final_score: u64, _level: u32) {}

    /// Headless callers leave this empty; the final state is the same.
    fn suspend(&mut self, _point: Suspend) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl GameObserver for NullObserver {}

impl<T: GameObserver + ?Sized> GameObserver for &mut T {
    fn on_board_changed(&mut self, board: &BoardSnapshot, changed: &[Pos]) {
        (**self).on_board_changed(board, changed);
    }

    fn on_score_changed(&mut self, total: u64, delta: u64, formula: &str) {
        (**self).on_score_changed(total, delta, formula);
    }

    fn on_effect(&mut self, effect: &Effect) {
        (**self).on_effect(effect);
    }

    fn on_boss_changed(&mut self, boss: &BossSnapshot) {
        (**self).on_boss_changed(boss);
    }

    fn on_turn_end(&mut self) {
        (**self).on_turn_end();
    }

    fn on_game_over(&mut self, victory: bool, final_score: u64, level: u32) {
        (**self).on_game_over(victory, final_score, level);
    }

    fn suspend(&mut self, point: Suspend) {
        (**self).suspend(point);
    }
}
