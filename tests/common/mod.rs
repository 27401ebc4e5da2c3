#![allow(dead_code)]

use puzzle_boss_battle::game::config::RulesConfig;
use puzzle_boss_battle::game::field::Board;
use puzzle_boss_battle::game::logic::GameSession;
use puzzle_boss_battle::game::types::GameMode;
use puzzle_boss_battle::observer::{BoardSnapshot, BossSnapshot, Effect, GameObserver, Suspend};
use puzzle_boss_battle::storage::MemoryStore;

/// Observer that keeps everything it is told.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub boards: usize,
    pub deltas: Vec<u64>,
    pub effects: Vec<Effect>,
    pub bosses: Vec<BossSnapshot>,
    pub turn_ends: usize,
    pub game_overs: Vec<(bool, u64, u32)>,
    pub suspends: Vec<Suspend>,
    /// Number of score deltas seen before the first skill cast.
    pub deltas_before_cast: Option<usize>,
}

impl RecordingObserver {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn has(&self, effect: &Effect) -> bool {
        self.effects.contains(effect)
    }
}

impl GameObserver for RecordingObserver {
    fn on_board_changed(&mut self, _board: &BoardSnapshot, _changed: &[puzzle_boss_battle::game::types::Pos]) {
        self.boards += 1;
    }

    fn on_score_changed(&mut self, _total: u64, delta: u64, _formula: &str) {
        if delta > 0 {
            self.deltas.push(delta);
        }
    }

    fn on_effect(&mut self, effect: &Effect) {
        if matches!(effect, Effect::SkillCast(_)) && self.deltas_before_cast.is_none() {
            self.deltas_before_cast = Some(self.deltas.len());
        }
        self.effects.push(effect.clone());
    }

    fn on_boss_changed(&mut self, boss: &BossSnapshot) {
        self.bosses.push(boss.clone());
    }

    fn on_turn_end(&mut self) {
        self.turn_ends += 1;
    }

    fn on_game_over(&mut self, victory: bool, final_score: u64, level: u32) {
        self.game_overs.push((victory, final_score, level));
    }

    fn suspend(&mut self, point: Suspend) {
        self.suspends.push(point);
    }
}

pub type Session = GameSession<RecordingObserver, MemoryStore>;

/// No boss skills, no item rolls, a boss that survives any cascade.
pub fn quiet_rules() -> RulesConfig {
    let mut rules = RulesConfig::default();
    rules.boss.trigger_tiers = vec![(1, -1.0)];
    rules.boss.hp_per_level = 10_000;
    rules.items.milestone = 1_000_000;
    rules
}

/// Session with `board` loaded and the recorder emptied.
pub fn session_with(mode: GameMode, rules: RulesConfig, board: Board) -> Session {
    let mut session = GameSession::new(mode, rules, 42, RecordingObserver::default(), MemoryStore::default());
    session.load_board(board);
    session.observer_mut().clear();
    session
}

/// Swapping (0,1) with (1,1) lines up three green triangles in row 0 and
/// nothing else.
pub fn triangle_board() -> Board {
    Board::from_rows(&[
        "Tg Sb Tg Cr Sb",
        "Sb Tg Cr Sb Cr",
        "Cr Sb Sb Cr Tb",
        "Sb Cr Tb Sb Cr",
        "Cr Tb Cr Tb Sb",
    ])
    .unwrap()
}

/// Like [`triangle_board`] with a spare green triangle at (3,3), far from row 0.
pub fn far_triangle_board() -> Board {
    Board::from_rows(&[
        "Tg Sb Tg Cr Sb",
        "Sb Tg Cr Sb Cr",
        "Cr Sb Sb Cr Tb",
        "Sb Cr Tb Tg Cr",
        "Cr Tb Cr Tb Sb",
    ])
    .unwrap()
}

/// Swapping (0,2) with (1,2) completes five red stars in row 0.
pub fn star_board() -> Board {
    Board::from_rows(&[
        "*r *r Sb *r *r",
        "Tg Sb *r Cr Tg",
        "Cr Tg Sb Tg Cr",
        "Sb Cr Tg Cr Sb",
        "Tg Sb Cr Sb Tg",
    ])
    .unwrap()
}

/// No match at rest and no swap that makes one.
pub fn dead_board() -> Board {
    Board::from_rows(&[
        "Tg Sb Cr Tg Sb",
        "Sb Cr Tg Sb Cr",
        "Cr Tg Sb Cr Tg",
        "Tg Sb Cr Tg Sb",
        "Sb Cr Tg Sb Cr",
    ])
    .unwrap()
}
