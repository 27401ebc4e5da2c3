use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::analysis::{analyze, compute_score};
use super::combo::ComboTracker;
use super::config::RulesConfig;
use super::field::Board;
use super::rng::TileDistribution;
use super::types::{GameMode, GameOutcome, MatchKind, Pos};
use crate::ai;
use crate::boss::{BossEncounter, Hazards, SkillEffect, SkillReaction};
use crate::error::GameError;
use crate::items::{self, Acquisition, Inventory, ItemKind, MultiplierStreak};
use crate::observer::{BoardSnapshot, BossSnapshot, DamageSource, Effect, GameObserver, NullObserver, Suspend};
use crate::storage::{MemoryStore, RecordEntry, RecordStore};

/// How the next `request_swap` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    #[default]
    Normal,
    /// A free-swap item is armed: the next pair swaps regardless of adjacency.
    AwaitingFreeSwap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotAdjacent,
    SameCell,
    Frozen,
    GameOver,
}

/// What one player action amounted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Cascade steps that found at least one match.
    pub steps: u32,
    pub score_gained: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    /// Nothing changed.
    Rejected(RejectReason),
    /// The swap produced no match and was undone.
    Reverted,
    Resolved(TurnReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The slot was empty; nothing changed.
    Insufficient,
    /// The item had nothing to act on and was not consumed.
    NoEffect,
    Rejected(RejectReason),
    Hints(Vec<(Pos, Pos)>),
    /// The item changes later actions (streak, free swap).
    Armed,
    Resolved(TurnReport),
}

/// Totals carried through one resolution loop.
#[derive(Debug, Default)]
struct Resolution {
    steps: u32,
    green_weight: u32,
    red_count: u32,
    skill_fired: bool,
}

/// One game from start to game over: board, score, moves, items and, in boss
/// mode, the encounter. Owns its randomness so a seed replays a game exactly.
pub struct GameSession<O: GameObserver = NullObserver, S: RecordStore = MemoryStore> {
    rules: RulesConfig,
    dist: TileDistribution,
    rng: StdRng,
    board: Board,
    mode: GameMode,
    score: u64,
    moves: u32,
    combo: ComboTracker,
    inventory: Inventory,
    streak: MultiplierStreak,
    boss: Option<BossEncounter>,
    input: InputMode,
    hints: Vec<(Pos, Pos)>,
    outcome: GameOutcome,
    observer: O,
    store: S,
}

impl GameSession {
    /// Default rules, no observer, in-memory records.
    pub fn headless(mode: GameMode, seed: u64) -> Self {
        Self::new(mode, RulesConfig::default(), seed, NullObserver, MemoryStore::default())
    }
}

impl<O: GameObserver, S: RecordStore> GameSession<O, S> {
    pub fn new(mode: GameMode, rules: RulesConfig, seed: u64, observer: O, store: S) -> Self {
        let dist = TileDistribution::from_weights(&rules.tiles);
        let rng = StdRng::seed_from_u64(seed);
        let board = Board::empty(rules.board_size);
        let mut session = Self {
            moves: rules.classic_moves,
            rules,
            dist,
            rng,
            board,
            mode,
            score: 0,
            combo: ComboTracker::default(),
            inventory: Inventory::default(),
            streak: MultiplierStreak::default(),
            boss: None,
            input: InputMode::Normal,
            hints: Vec::new(),
            outcome: GameOutcome::Running,
            observer,
            store,
        };
        session.restart();
        session
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    pub fn input_mode(&self) -> InputMode {
        self.input
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn streak(&self) -> &MultiplierStreak {
        &self.streak
    }

    pub fn hints(&self) -> &[(Pos, Pos)] {
        &self.hints
    }

    pub fn combo(&self) -> u32 {
        self.combo.count()
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    pub fn encounter(&self) -> Option<&BossEncounter> {
        self.boss.as_ref()
    }

    /// Direct access to item counts, for scripted setups.
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Direct access to hazards, for scripted setups.
    pub fn hazards_mut(&mut self) -> Option<&mut Hazards> {
        self.boss.as_mut().map(|b| &mut b.hazards)
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_parts(self) -> (O, S) {
        (self.observer, self.store)
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(&self.board, self.boss.as_ref().map(|b| &b.hazards), &self.hints)
    }

    /// Replace the board wholesale, e.g. with a scripted layout.
    pub fn load_board(&mut self, board: Board) {
        self.board = board;
        self.hints.clear();
        self.board_changed(&[]);
    }

    /// Swap two cells. Adjacent cells in normal input; any two cells while a
    /// free swap is armed.
    pub fn request_swap(&mut self, a: Pos, b: Pos) -> Result<SwapOutcome, GameError> {
        self.board.check(a)?;
        self.board.check(b)?;
        if self.outcome != GameOutcome::Running {
            return Ok(SwapOutcome::Rejected(RejectReason::GameOver));
        }
        if a == b {
            return Ok(SwapOutcome::Rejected(RejectReason::SameCell));
        }
        let outcome = match self.input {
            InputMode::AwaitingFreeSwap => self.free_swap(a, b),
            InputMode::Normal => {
                if !a.is_adjacent(b) {
                    return Ok(SwapOutcome::Rejected(RejectReason::NotAdjacent));
                }
                if let Some(enc) = &self.boss {
                    if enc.hazards.frozen.contains_key(&a) || enc.hazards.frozen.contains_key(&b) {
                        return Ok(SwapOutcome::Rejected(RejectReason::Frozen));
                    }
                }
                self.hints.clear();
                self.try_swap(a, b)
            }
        };
        self.end_action();
        Ok(outcome)
    }

    fn free_swap(&mut self, a: Pos, b: Pos) -> SwapOutcome {
        self.input = InputMode::Normal;
        self.hints.clear();
        self.try_swap(a, b)
    }

    /// Keep the swap and resolve if it matched, otherwise undo it for free.
    fn try_swap(&mut self, a: Pos, b: Pos) -> SwapOutcome {
        self.board.swap(a, b);
        self.board_changed(&[a, b]);
        self.observer.suspend(Suspend::AfterSwap);
        if self.board.find_matches().is_empty() {
            self.board.swap(a, b);
            self.board_changed(&[a, b]);
            return SwapOutcome::Reverted;
        }
        self.moves = self.moves.saturating_sub(1);
        SwapOutcome::Resolved(self.begin_resolve())
    }

    /// Use one item. An empty slot or an idle game changes nothing.
    pub fn use_item(&mut self, item: ItemKind) -> ItemOutcome {
        if self.outcome != GameOutcome::Running {
            return ItemOutcome::Rejected(RejectReason::GameOver);
        }
        if self.inventory.count(item) == 0 {
            return ItemOutcome::Insufficient;
        }
        let outcome = match item {
            ItemKind::Scry => {
                let hints = ai::pick_hints(&mut self.board, self.rules.items.scry_hints, &mut self.rng);
                if hints.is_empty() {
                    return ItemOutcome::NoEffect;
                }
                self.inventory.take(item);
                self.hints = hints.clone();
                self.observer.on_effect(&Effect::Hints(hints.clone()));
                self.board_changed(&[]);
                ItemOutcome::Hints(hints)
            }
            ItemKind::Bomb => {
                let Some(area) = items::bomb_area(self.board.size(), &mut self.rng) else {
                    return ItemOutcome::NoEffect;
                };
                self.inventory.take(item);
                self.board.clear(&area);
                self.board_changed(&area);
                self.observer.suspend(Suspend::AfterClear);
                self.settle();
                ItemOutcome::Resolved(self.begin_resolve())
            }
            ItemKind::Shuffle => {
                self.inventory.take(item);
                self.board.fill_random(&self.dist, &mut self.rng);
                self.board_changed(&[]);
                ItemOutcome::Resolved(self.begin_resolve())
            }
            ItemKind::Recolor => {
                self.inventory.take(item);
                let changed = items::recolor(&mut self.board, self.rules.items.recolor_target);
                self.board_changed(&changed);
                ItemOutcome::Resolved(self.begin_resolve())
            }
            ItemKind::Streak => {
                self.inventory.take(item);
                self.streak.activate(&self.rules.items);
                ItemOutcome::Armed
            }
            ItemKind::FreeSwap => {
                if self.input == InputMode::AwaitingFreeSwap {
                    return ItemOutcome::NoEffect;
                }
                self.inventory.take(item);
                self.input = InputMode::AwaitingFreeSwap;
                ItemOutcome::Armed
            }
        };
        info!(item = item.id(), "item used");
        self.end_action();
        outcome
    }

    /// Start a fresh game in the current mode.
    pub fn restart(&mut self) {
        self.score = 0;
        self.combo.reset();
        self.inventory = Inventory::default();
        self.streak.cancel();
        self.input = InputMode::Normal;
        self.hints.clear();
        self.outcome = GameOutcome::Running;
        match self.mode {
            GameMode::Classic => {
                self.boss = None;
                self.moves = self.rules.classic_moves;
            }
            GameMode::Boss => self.enter_level(1),
        }
        self.fresh_board();
        self.observer.on_score_changed(self.score, 0, "");
        info!(mode = %self.mode, "game started");
    }

    /// Switching to the current mode is a no-op.
    pub fn switch_mode(&mut self, mode: GameMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.restart();
    }

    /// Jump to an unlocked boss level. Score and items carry over.
    pub fn select_level(&mut self, level: u32) -> Result<(), GameError> {
        if self.mode != GameMode::Boss {
            return Err(GameError::WrongMode {
                expected: GameMode::Boss,
            });
        }
        let max = self.store.load_max_level()?.min(self.rules.boss.max_level);
        if level == 0 || level > max {
            return Err(GameError::InvalidLevel { level, max });
        }
        self.reset_level(level);
        Ok(())
    }

    /// Replay the current boss level after a loss.
    pub fn retry_level(&mut self) -> Result<(), GameError> {
        let level = self
            .boss
            .as_ref()
            .map(|b| b.level)
            .ok_or(GameError::WrongMode {
                expected: GameMode::Boss,
            })?;
        self.reset_level(level);
        Ok(())
    }

    /// Put the current score on the leaderboard.
    pub fn save_record(&mut self, name: &str) -> Result<Vec<RecordEntry>, GameError> {
        let entry = RecordEntry::now(self.score, name);
        Ok(self.store.save_record(entry, self.rules.leaderboard_size)?)
    }

    pub fn load_records(&self) -> Result<Vec<RecordEntry>, GameError> {
        Ok(self.store.load_records()?)
    }

    pub fn max_level_reached(&self) -> Result<u32, GameError> {
        Ok(self.store.load_max_level()?)
    }

    fn reset_level(&mut self, level: u32) {
        self.combo.reset();
        self.input = InputMode::Normal;
        self.hints.clear();
        self.outcome = GameOutcome::Running;
        self.enter_level(level);
        self.fresh_board();
    }

    fn enter_level(&mut self, level: u32) {
        let enc = BossEncounter::new(level, &self.rules.boss, &mut self.rng);
        self.moves = enc.initial_moves;
        info!(level, boss = enc.boss.name, moves = self.moves, "boss level started");
        self.observer.on_boss_changed(&BossSnapshot::from(&enc));
        self.observer.on_effect(&Effect::LevelStarted(level));
        self.boss = Some(enc);
    }

    fn fresh_board(&mut self) {
        self.board = Board::generate(self.rules.board_size, &self.dist, &mut self.rng);
        self.board_changed(&[]);
    }

    fn begin_resolve(&mut self) -> TurnReport {
        self.combo.reset();
        self.resolve()
    }

    /// The cascade: score, clear, drop and refill until the board is quiet,
    /// then let the boss react and take the action's damage.
    fn resolve(&mut self) -> TurnReport {
        let start_score = self.score;
        let mut run = Resolution::default();

        loop {
            let matches = self.board.find_matches();
            if matches.is_empty() {
                if self.boss.is_some() && run.steps > 0 && !run.skill_fired {
                    run.skill_fired = true;
                    self.boss_reaction();
                    if self.outcome != GameOutcome::Running {
                        return self.report(&run, start_score);
                    }
                    if !self.board.find_matches().is_empty() {
                        continue;
                    }
                }
                if !self.board.has_possible_moves() {
                    self.refresh_dead_board();
                }
                break;
            }

            let combo = self.combo.step();
            let analysis = analyze(&matches);
            let breakdown = compute_score(&self.board, &matches, &analysis, combo, &self.rules.scoring);
            debug!(
                combo,
                kind = ?analysis.kind,
                cells = analysis.total_cells,
                score = breakdown.score,
                "cascade step"
            );
            if combo > 1 {
                self.observer.on_effect(&Effect::Combo(combo));
            }
            if analysis.kind != MatchKind::Normal {
                self.observer.on_effect(&Effect::MatchKind(analysis.kind));
            }
            run.steps += 1;
            run.green_weight += breakdown.green_weight;
            run.red_count += breakdown.red_count;
            self.add_score(breakdown.score, &breakdown.formula);

            let mut cleared = BTreeSet::new();
            match self.boss.as_mut() {
                None => cleared.extend(matches.iter().flat_map(|m| m.cells.iter().copied())),
                Some(enc) => {
                    let mut chipped = Vec::new();
                    let mut open = Vec::new();
                    for m in &matches {
                        if m.cells.iter().any(|p| enc.hazards.is_blocking(*p)) {
                            for &pos in &m.cells {
                                if enc.hazards.is_blocking(pos) {
                                    enc.hazards.chip(pos);
                                    chipped.push(pos);
                                }
                            }
                        } else {
                            open.push(m);
                        }
                    }
                    let mut poison_hits = Vec::new();
                    // A lethal poison hit ends the action; later cells keep their poison.
                    'open: for m in open {
                        for &pos in &m.cells {
                            if let Some(tile) = self.board.get(pos) {
                                if let Some(dmg) = enc.consume_poison(pos, tile, &self.rules.scoring) {
                                    poison_hits.push(dmg);
                                    if enc.player_down() {
                                        break 'open;
                                    }
                                }
                            }
                            cleared.insert(pos);
                        }
                    }
                    let down = enc.player_down();
                    let snapshot = BossSnapshot::from(&*enc);
                    for amount in poison_hits {
                        self.observer.on_effect(&Effect::PlayerDamaged {
                            amount,
                            source: DamageSource::Poison,
                        });
                    }
                    if !chipped.is_empty() {
                        self.board_changed(&chipped);
                        self.observer.suspend(Suspend::AfterHazards);
                    }
                    self.observer.on_boss_changed(&snapshot);
                    if down {
                        self.lose();
                        return self.report(&run, start_score);
                    }
                }
            }

            let cleared: Vec<Pos> = cleared.into_iter().collect();
            self.board.clear(&cleared);
            self.board_changed(&cleared);
            self.tick_bombs();
            self.observer.suspend(Suspend::AfterClear);
            self.settle();
        }

        if run.steps > 0 && self.boss.is_some() {
            self.attack_boss(&run, self.score - start_score);
        }
        self.report(&run, start_score)
    }

    fn report(&self, run: &Resolution, start_score: u64) -> TurnReport {
        TurnReport {
            steps: run.steps,
            score_gained: self.score - start_score,
        }
    }

    /// Gravity then refill, each reported separately.
    fn settle(&mut self) {
        let falls = self.board.apply_gravity();
        let moved: Vec<Pos> = falls.iter().flat_map(|f| [f.from, f.to]).collect();
        self.board_changed(&moved);
        self.observer.suspend(Suspend::AfterGravity);
        let placed = self.board.refill(&self.dist, &mut self.rng);
        self.board_changed(&placed);
        self.observer.suspend(Suspend::AfterRefill);
    }

    fn tick_bombs(&mut self) {
        let Some(enc) = self.boss.as_mut() else {
            return;
        };
        let detonated = enc.hazards.tick_bombs();
        let penalty = self.rules.boss.bomb_penalty;
        for pos in detonated {
            self.moves = self.moves.saturating_sub(penalty);
            debug!(%pos, moves = self.moves, "countdown bomb detonated");
            self.observer.on_effect(&Effect::BombDetonated { pos, penalty });
        }
    }

    fn refresh_dead_board(&mut self) {
        info!("no moves left, regenerating board");
        self.board.randomize(&self.dist, &mut self.rng);
        self.observer.on_effect(&Effect::BoardRefreshed);
        self.board_changed(&[]);
    }

    /// Apply points through the streak multiplier and roll for items on
    /// every new hundred.
    fn add_score(&mut self, points: u64, formula: &str) {
        let actual = match self.streak.apply(points, &self.rules.items, &mut self.rng) {
            Some((multiplier, scaled)) => {
                self.observer.on_effect(&Effect::StreakApplied {
                    multiplier,
                    points: scaled,
                });
                scaled
            }
            None => points,
        };
        let before = self.score;
        self.score += actual;
        self.observer.on_score_changed(self.score, actual, formula);

        let milestone = self.rules.items.milestone.max(1);
        if self.score / milestone > before / milestone {
            self.grant_acquisition();
        }
    }

    fn grant_acquisition(&mut self) {
        match items::roll_acquisition(&self.rules.items, &mut self.rng) {
            Acquisition::Item(item) => {
                info!(item = item.id(), score = self.score, "item acquired");
                self.inventory.add(item);
                self.observer.on_effect(&Effect::ItemGained(item));
            }
            Acquisition::BonusMoves(n) => {
                info!(moves = n, score = self.score, "bonus moves");
                self.moves += n;
                self.observer.on_effect(&Effect::BonusMoves(n));
            }
        }
    }

    fn boss_reaction(&mut self) {
        let Some(enc) = self.boss.as_mut() else {
            return;
        };
        let reaction = enc.trigger_skill(&mut self.board, &self.rules.boss, &mut self.rng);
        let down = enc.player_down();
        let snapshot = BossSnapshot::from(&*enc);
        match reaction {
            SkillReaction::Idle => return,
            SkillReaction::Sealed { remaining } => {
                self.observer.on_effect(&Effect::SkillSealed { remaining });
            }
            SkillReaction::Fizzled(skill) => {
                self.observer.on_effect(&Effect::SkillCast(skill));
            }
            SkillReaction::Cast(effect) => {
                self.observer.on_effect(&Effect::SkillCast(effect.skill()));
                if let SkillEffect::Attacked { damage } = &effect {
                    self.observer.on_effect(&Effect::PlayerDamaged {
                        amount: *damage,
                        source: DamageSource::BossAttack,
                    });
                }
                let cells = effect.cells();
                if !cells.is_empty() {
                    self.board_changed(&cells);
                    self.observer.suspend(Suspend::AfterHazards);
                }
            }
        }
        self.observer.on_boss_changed(&snapshot);
        if down {
            self.lose();
        }
    }

    fn attack_boss(&mut self, run: &Resolution, damage: u64) {
        let Some(enc) = self.boss.as_mut() else {
            return;
        };
        let report = enc.player_attack(damage, run.green_weight, run.red_count, &self.rules.boss);
        let snapshot = BossSnapshot::from(&*enc);
        if report.healed > 0 {
            self.observer.on_effect(&Effect::PlayerHealed(report.healed));
        }
        self.observer.on_effect(&Effect::BossDamaged {
            amount: report.damage,
            absorbed: report.absorbed,
        });
        self.observer.on_boss_changed(&snapshot);
        if report.defeated {
            self.boss_defeated();
        }
    }

    fn boss_defeated(&mut self) {
        let Some(level) = self.boss.as_ref().map(|b| b.level) else {
            return;
        };
        let max_level = self.rules.boss.max_level;
        info!(level, score = self.score, "boss defeated");
        if let Err(err) = self.store.save_max_level((level + 1).min(max_level)) {
            warn!(%err, "could not persist boss progress");
        }
        let reward = items::random_item(&mut self.rng);
        self.inventory.add(reward);
        self.observer.on_effect(&Effect::BossDefeated(level));
        self.observer.on_effect(&Effect::ItemGained(reward));

        if level >= max_level {
            info!(score = self.score, "campaign complete");
            self.outcome = GameOutcome::Won;
            self.observer.on_game_over(true, self.score, level);
            return;
        }
        self.enter_level(level + 1);
        self.board_changed(&[]);
    }

    fn lose(&mut self) {
        let level = self.boss.as_ref().map_or(0, |b| b.level);
        info!(level, score = self.score, "game lost");
        self.outcome = GameOutcome::Lost;
        self.observer.on_game_over(false, self.score, level);
    }

    /// Move-budget check and turn-end notification after every action.
    fn end_action(&mut self) {
        if self.outcome == GameOutcome::Running && self.moves == 0 {
            match self.mode {
                GameMode::Classic => {
                    info!(score = self.score, "out of moves");
                    self.outcome = GameOutcome::Finished;
                    self.observer.on_game_over(true, self.score, 0);
                }
                GameMode::Boss => self.lose(),
            }
        }
        self.observer.on_turn_end();
    }

    fn board_changed(&mut self, changed: &[Pos]) {
        let snapshot = self.snapshot();
        self.observer.on_board_changed(&snapshot, changed);
    }
}
