//! Tunable rule tables. Everything here is data, not logic, and can be
//! overridden from `settings.json`.

use serde::{Deserialize, Serialize};

use super::types::{Color, Shape};
use crate::boss::BossSkill;

pub const DEFAULT_BOARD_SIZE: usize = 11;
pub const CLASSIC_MOVES: u32 = 30;
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub board_size: usize,
    pub classic_moves: u32,
    pub leaderboard_size: usize,
    pub tiles: TileWeights,
    pub scoring: ScoringTable,
    pub boss: BossTable,
    pub items: ItemTable,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            classic_moves: CLASSIC_MOVES,
            leaderboard_size: LEADERBOARD_SIZE,
            tiles: TileWeights::default(),
            scoring: ScoringTable::default(),
            boss: BossTable::default(),
            items: ItemTable::default(),
        }
    }
}

/// Independent shape and color weights; the joint table is their product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileWeights {
    pub shapes: Vec<(Shape, f64)>,
    pub colors: Vec<(Color, f64)>,
}

impl Default for TileWeights {
    fn default() -> Self {
        Self {
            shapes: vec![
                (Shape::Triangle, 0.3),
                (Shape::Square, 0.3),
                (Shape::Circle, 0.3),
                (Shape::Star, 0.1),
            ],
            colors: vec![(Color::Green, 0.4), (Color::Blue, 0.4), (Color::Red, 0.2)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTable {
    /// Indexed by `Shape::rank`.
    pub shape_scores: [u32; 4],
    /// Indexed by `Color::rank`.
    pub color_multipliers: [f64; 3],
    pub five_multiplier: f64,
    pub combo_cap: u32,
}

impl ScoringTable {
    pub fn shape_score(&self, shape: Shape) -> u32 {
        self.shape_scores[shape.rank()]
    }

    pub fn color_multiplier(&self, color: Color) -> f64 {
        self.color_multipliers[color.rank()]
    }
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self {
            shape_scores: [3, 4, 5, 10],
            color_multipliers: [1.0, 1.5, 3.0],
            five_multiplier: 2.0,
            combo_cap: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTable {
    pub max_level: u32,
    pub hp_per_level: u64,
    pub player_hp_ratio: f64,
    pub base_moves: u32,
    pub moves_per_level: u32,
    /// Extra moves granted for every ten bosses already defeated.
    pub bonus_moves_per_ten: u32,
    /// `(first level of tier, trigger chance)`, ascending by level.
    pub trigger_tiers: Vec<(u32, f64)>,
    /// Selection weights; they need not sum to one.
    pub skill_weights: Vec<(BossSkill, f64)>,
    pub freeze_hits: u32,
    pub bomb_penalty: u32,
    pub attack_ratio: f64,
    pub heal_ratio: f64,
    pub transform_ratio: f64,
}

impl BossTable {
    pub fn trigger_rate(&self, level: u32) -> f64 {
        self.trigger_tiers
            .iter()
            .rev()
            .find(|(from, _)| *from <= level)
            .map(|(_, rate)| *rate)
            .unwrap_or(0.1)
    }

    /// Move budget on entering `level`; used identically by level-up and level select.
    pub fn move_budget(&self, level: u32) -> u32 {
        let defeated = level.saturating_sub(1);
        self.base_moves + defeated * self.moves_per_level + (defeated / 10) * self.bonus_moves_per_ten
    }

    pub fn boss_hp(&self, level: u32) -> u64 {
        u64::from(level) * self.hp_per_level
    }
}

impl Default for BossTable {
    fn default() -> Self {
        Self {
            max_level: 70,
            hp_per_level: 100,
            player_hp_ratio: 0.5,
            base_moves: 50,
            moves_per_level: 10,
            bonus_moves_per_ten: 30,
            trigger_tiers: vec![
                (1, 0.1),
                (11, 0.2),
                (21, 0.3),
                (31, 0.4),
                (41, 0.5),
                (51, 0.7),
                (61, 0.9),
            ],
            skill_weights: vec![
                (BossSkill::Freeze, 0.03),
                (BossSkill::Poison, 0.02),
                (BossSkill::Summon, 0.03),
                (BossSkill::Shield, 0.04),
                (BossSkill::Transform, 0.01),
                (BossSkill::Countdown, 0.01),
                (BossSkill::NormalAttack, 0.20),
            ],
            freeze_hits: 3,
            bomb_penalty: 3,
            attack_ratio: 0.01,
            heal_ratio: 0.2,
            transform_ratio: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemTable {
    /// Score interval at which an acquisition roll happens.
    pub milestone: u64,
    pub normal_chance: f64,
    pub special_chance: f64,
    /// Inside the bonus-moves branch: chance of +3, then of +2; the rest is +1.
    pub bonus_three_chance: f64,
    pub bonus_two_chance: f64,
    pub streak_multipliers: Vec<f64>,
    pub streak_length: u32,
    pub recolor_target: Color,
    pub scry_hints: usize,
}

impl Default for ItemTable {
    fn default() -> Self {
        Self {
            milestone: 100,
            normal_chance: 0.75,
            special_chance: 0.15,
            bonus_three_chance: 0.2,
            bonus_two_chance: 0.3,
            streak_multipliers: vec![0.5, 0.8, 1.0, 1.5, 2.0, 3.0, 5.0],
            streak_length: 3,
            recolor_target: Color::Blue,
            scry_hints: 3,
        }
    }
}
