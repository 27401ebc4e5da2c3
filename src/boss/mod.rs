//! Boss encounter: the per-level boss, the player's HP pool, board hazards
//! and the skill roll that runs after every resolved player action.

mod skills;

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

pub use skills::{select_skill, BossSkill, SkillEffect};

use crate::game::config::{BossTable, ScoringTable};
use crate::game::field::Board;
use crate::game::types::{Pos, Tile};

pub const BOSS_NAMES: [&str; 30] = [
    "Dark Overlord",
    "God of Ruin",
    "Void Lord",
    "Shadow Assassin",
    "Flame Demon",
    "Frost Giant",
    "Thunder Tyrant",
    "Venom Witch",
    "War God",
    "Necromancer",
    "Abyss Lord",
    "Doom Herald",
    "Black Knight",
    "Blood Queen",
    "Chaos Fiend",
    "Soul Reaper",
    "Nightmare King",
    "Witch of Despair",
    "Eye of Ruin",
    "Lord of the Underworld",
    "Source of Darkness",
    "Abyss Warden",
    "Doom Judge",
    "Raging Spirit",
    "Night Sovereign",
    "God of Annihilation",
    "Shadow Master",
    "Void Walker",
    "Wing of Death",
    "Source of Chaos",
];

pub const AVATARS: [&str; 10] = ["👹", "👺", "🤡", "👿", "💀", "👻", "👽", "🤖", "🎃", "😈"];

#[derive(Debug, Clone, PartialEq)]
pub struct BossState {
    pub name: &'static str,
    pub avatar_id: usize,
    pub max_hp: u64,
    pub hp: u64,
    pub shield: u64,
    pub skill_trigger_rate: f64,
}

/// Split of one hit between shield and HP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Absorbed {
    pub shield: u64,
    pub hp: u64,
}

impl BossState {
    pub fn spawn<R: Rng + ?Sized>(level: u32, table: &BossTable, rng: &mut R) -> Self {
        let max_hp = table.boss_hp(level);
        Self {
            name: BOSS_NAMES.choose(rng).copied().unwrap_or(BOSS_NAMES[0]),
            avatar_id: rng.gen_range(0..AVATARS.len()),
            max_hp,
            hp: max_hp,
            shield: 0,
            skill_trigger_rate: table.trigger_rate(level),
        }
    }

    pub fn avatar(&self) -> &'static str {
        AVATARS.get(self.avatar_id).copied().unwrap_or(AVATARS[0])
    }

    /// The shield soaks damage first; anything beyond it spills into HP.
    pub fn absorb(&mut self, damage: u64) -> Absorbed {
        let shield = damage.min(self.shield);
        self.shield -= shield;
        let hp = (damage - shield).min(self.hp);
        self.hp -= hp;
        Absorbed { shield, hp }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp == 0
    }
}

/// Board afflictions, keyed by cell and independent of the tile there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hazards {
    /// Remaining hits before the ice breaks.
    pub frozen: BTreeMap<Pos, u32>,
    pub poisoned: BTreeSet<Pos>,
    /// Remaining monster HP.
    pub monsters: BTreeMap<Pos, u32>,
    /// Remaining fuse.
    pub bombs: BTreeMap<Pos, u32>,
}

impl Hazards {
    pub fn is_empty(&self) -> bool {
        self.frozen.is_empty()
            && self.poisoned.is_empty()
            && self.monsters.is_empty()
            && self.bombs.is_empty()
    }

    /// Frozen cells and monsters keep a whole match from clearing.
    pub fn is_blocking(&self, pos: Pos) -> bool {
        self.frozen.contains_key(&pos) || self.monsters.contains_key(&pos)
    }

    /// One hit against the ice or monster at `pos`; markers at zero are removed.
    pub fn chip(&mut self, pos: Pos) {
        for map in [&mut self.frozen, &mut self.monsters] {
            if let Some(left) = map.get_mut(&pos) {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    map.remove(&pos);
                }
            }
        }
    }

    /// Advance every fuse by one and return the bombs that went off.
    pub fn tick_bombs(&mut self) -> Vec<Pos> {
        let mut detonated = Vec::new();
        self.bombs.retain(|pos, fuse| {
            *fuse = fuse.saturating_sub(1);
            if *fuse == 0 {
                detonated.push(*pos);
                false
            } else {
                true
            }
        });
        detonated
    }
}

/// Outcome of the boss's turn after a player action.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillReaction {
    /// Red tiles sealed the boss; one seal turn was spent.
    Sealed { remaining: u32 },
    /// The trigger roll failed or the weight table selected nothing.
    Idle,
    /// A skill was chosen but had nowhere to act.
    Fizzled(BossSkill),
    Cast(SkillEffect),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttackReport {
    pub healed: u64,
    pub sealed: u32,
    pub absorbed: u64,
    pub damage: u64,
    pub defeated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BossEncounter {
    pub level: u32,
    pub boss: BossState,
    pub player_hp: u64,
    pub player_max_hp: u64,
    pub skill_seal_turns: u32,
    pub hazards: Hazards,
    /// Move budget granted when the level started.
    pub initial_moves: u32,
}

impl BossEncounter {
    pub fn new<R: Rng + ?Sized>(level: u32, table: &BossTable, rng: &mut R) -> Self {
        let boss = BossState::spawn(level, table, rng);
        let player_max_hp = player_hp_for(&boss, table);
        Self {
            level,
            boss,
            player_hp: player_max_hp,
            player_max_hp,
            skill_seal_turns: 0,
            hazards: Hazards::default(),
            initial_moves: table.move_budget(level),
        }
    }

    pub fn player_down(&self) -> bool {
        self.player_hp == 0
    }

    /// Returns `true` when this brought the player to zero.
    pub fn damage_player(&mut self, amount: u64) -> bool {
        self.player_hp = self.player_hp.saturating_sub(amount);
        self.player_down()
    }

    /// Clearing a poisoned cell consumes the poison and hurts the player by
    /// the tile's base value. `None` if the cell was clean.
    pub fn consume_poison(&mut self, pos: Pos, tile: Tile, scoring: &ScoringTable) -> Option<u64> {
        if !self.hazards.poisoned.remove(&pos) {
            return None;
        }
        let damage = (f64::from(scoring.shape_score(tile.shape)) * scoring.color_multiplier(tile.color))
            .ceil() as u64;
        self.damage_player(damage);
        Some(damage)
    }

    /// The boss's reaction to a resolved player action.
    pub fn trigger_skill<R: Rng + ?Sized>(
        &mut self,
        board: &mut Board,
        table: &BossTable,
        rng: &mut R,
    ) -> SkillReaction {
        if self.skill_seal_turns > 0 {
            self.skill_seal_turns -= 1;
            return SkillReaction::Sealed {
                remaining: self.skill_seal_turns,
            };
        }
        if rng.gen::<f64>() > self.boss.skill_trigger_rate {
            return SkillReaction::Idle;
        }
        let Some(skill) = select_skill(&table.skill_weights, rng.gen::<f64>()) else {
            return SkillReaction::Idle;
        };
        debug!(level = self.level, skill = skill.id(), "boss casts");
        match self.execute(skill, board, table, rng) {
            Some(effect) => SkillReaction::Cast(effect),
            None => SkillReaction::Fizzled(skill),
        }
    }

    /// Settle one action's worth of player damage against the boss.
    pub fn player_attack(
        &mut self,
        score: u64,
        green_weight: u32,
        red_count: u32,
        table: &BossTable,
    ) -> AttackReport {
        let mut report = AttackReport::default();
        if green_weight > 0 {
            let heal = (score as f64 * table.heal_ratio).ceil() as u64;
            report.healed = heal.min(self.player_max_hp - self.player_hp);
            self.player_hp += report.healed;
        }
        self.skill_seal_turns += red_count;
        report.sealed = red_count;

        let absorbed = self.boss.absorb(score);
        report.absorbed = absorbed.shield;
        report.damage = absorbed.hp;
        report.defeated = self.boss.is_defeated();
        report
    }
}

fn player_hp_for(boss: &BossState, table: &BossTable) -> u64 {
    (boss.max_hp as f64 * table.player_hp_ratio).ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::{Color, Shape};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn encounter(level: u32) -> BossEncounter {
        let mut rng = StdRng::seed_from_u64(11);
        BossEncounter::new(level, &BossTable::default(), &mut rng)
    }

    #[test]
    fn level_scales_boss_and_player() {
        let enc = encounter(5);
        assert_eq!(enc.boss.max_hp, 500);
        assert_eq!(enc.boss.hp, 500);
        assert_eq!(enc.player_max_hp, 250);
        assert_eq!(enc.player_hp, 250);
        assert_eq!(enc.initial_moves, 90);
        assert_eq!(enc.boss.skill_trigger_rate, 0.1);
        assert!(BOSS_NAMES.contains(&enc.boss.name));
    }

    #[test]
    fn shield_absorbs_before_hp() {
        let mut enc = encounter(5);
        enc.boss.shield = 50;
        let report = enc.player_attack(80, 0, 0, &BossTable::default());
        assert_eq!(enc.boss.shield, 0);
        assert_eq!(enc.boss.hp, 470);
        assert_eq!(report.absorbed, 50);
        assert_eq!(report.damage, 30);
    }

    #[test]
    fn small_hits_only_dent_the_shield() {
        let mut boss = encounter(5).boss;
        boss.shield = 50;
        assert_eq!(boss.absorb(20), Absorbed { shield: 20, hp: 0 });
        assert_eq!(boss.shield, 30);
        assert_eq!(boss.hp, 500);
    }

    #[test]
    fn green_heals_up_to_max_and_red_seals() {
        let mut enc = encounter(5);
        enc.player_hp = 240;
        let report = enc.player_attack(100, 3, 2, &BossTable::default());
        assert_eq!(report.healed, 10);
        assert_eq!(enc.player_hp, 250);
        assert_eq!(enc.skill_seal_turns, 2);

        enc.player_hp = 100;
        let report = enc.player_attack(100, 0, 0, &BossTable::default());
        assert_eq!(report.healed, 0);
        assert_eq!(enc.player_hp, 100);
    }

    #[test]
    fn overkill_floors_hp_and_defeats() {
        let mut enc = encounter(1);
        let report = enc.player_attack(1_000, 0, 0, &BossTable::default());
        assert_eq!(enc.boss.hp, 0);
        assert_eq!(report.damage, 100);
        assert!(report.defeated);
    }

    #[test]
    fn seal_skips_and_counts_down() {
        let mut rng = StdRng::seed_from_u64(3);
        let table = BossTable::default();
        let mut board = Board::empty(5);
        let mut enc = BossEncounter::new(70, &table, &mut rng);
        enc.skill_seal_turns = 2;
        assert_eq!(
            enc.trigger_skill(&mut board, &table, &mut rng),
            SkillReaction::Sealed { remaining: 1 }
        );
        assert_eq!(
            enc.trigger_skill(&mut board, &table, &mut rng),
            SkillReaction::Sealed { remaining: 0 }
        );
    }

    #[test]
    fn zero_trigger_rate_never_casts() {
        let mut rng = StdRng::seed_from_u64(9);
        let table = BossTable {
            trigger_tiers: vec![(1, 0.0)],
            ..BossTable::default()
        };
        let mut board = Board::empty(5);
        let mut enc = BossEncounter::new(1, &table, &mut rng);
        for _ in 0..50 {
            assert_eq!(enc.trigger_skill(&mut board, &table, &mut rng), SkillReaction::Idle);
        }
    }

    #[test]
    fn poison_consumes_once_and_hurts_by_base_value() {
        let mut enc = encounter(5);
        let pos = Pos::new(2, 2);
        enc.hazards.poisoned.insert(pos);
        let tile = Tile::new(Shape::Square, Color::Blue);
        assert_eq!(enc.consume_poison(pos, tile, &ScoringTable::default()), Some(6));
        assert_eq!(enc.player_hp, 244);
        assert_eq!(enc.consume_poison(pos, tile, &ScoringTable::default()), None);
    }

    #[test]
    fn chip_wears_down_ice_and_monsters() {
        let mut hazards = Hazards::default();
        let pos = Pos::new(0, 0);
        hazards.frozen.insert(pos, 2);
        hazards.monsters.insert(pos, 1);
        hazards.chip(pos);
        assert_eq!(hazards.frozen.get(&pos), Some(&1));
        assert!(!hazards.monsters.contains_key(&pos));
        hazards.chip(pos);
        assert!(!hazards.is_blocking(pos));
    }

    #[test]
    fn bombs_detonate_when_the_fuse_runs_out() {
        let mut hazards = Hazards::default();
        hazards.bombs.insert(Pos::new(1, 1), 1);
        hazards.bombs.insert(Pos::new(2, 2), 3);
        assert_eq!(hazards.tick_bombs(), vec![Pos::new(1, 1)]);
        assert_eq!(hazards.bombs.get(&Pos::new(2, 2)), Some(&2));
        assert!(hazards.tick_bombs().is_empty());
        assert_eq!(hazards.tick_bombs(), vec![Pos::new(2, 2)]);
        assert!(hazards.is_empty());
    }
}
