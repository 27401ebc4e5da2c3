//! Line-oriented frontend: prints notices through [`I18n`] and reads
//! commands from any `BufRead`.

use std::io::{self, BufRead, Write};

use fluent_bundle::FluentArgs;

use crate::game::logic::{GameSession, ItemOutcome, RejectReason, SwapOutcome};
use crate::game::types::{GameMode, MatchKind, Pos};
use crate::i18n::I18n;
use crate::items::ItemKind;
use crate::observer::{BoardSnapshot, BossSnapshot, CellView, DamageSource, Effect, GameObserver};
use crate::storage::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Swap(Pos, Pos),
    Item(String),
    Level(u32),
    Retry,
    Mode(String),
    Restart,
    Records,
    Save(Option<String>),
    Board,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Command::Board;
    };
    let rest: Vec<&str> = words.collect();
    let unknown = || Command::Unknown(line.trim().to_string());
    match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("swap" | "s", [r1, c1, r2, c2]) => {
            let nums: Result<Vec<usize>, _> = [r1, c1, r2, c2].iter().map(|w| w.parse()).collect();
            match nums.as_deref() {
                Ok([r1, c1, r2, c2]) => Command::Swap(Pos::new(*r1, *c1), Pos::new(*r2, *c2)),
                _ => unknown(),
            }
        }
        ("item" | "i", [id]) => Command::Item((*id).to_string()),
        ("level", [n]) => n.parse().map(Command::Level).unwrap_or_else(|_| unknown()),
        ("retry", []) => Command::Retry,
        ("mode", [m]) => Command::Mode((*m).to_string()),
        ("restart", []) => Command::Restart,
        ("records", []) => Command::Records,
        ("save", []) => Command::Save(None),
        ("save", name) => Command::Save(Some(name.join(" "))),
        ("board" | "b", []) => Command::Board,
        ("help" | "h" | "?", []) => Command::Help,
        ("quit" | "q" | "exit", []) => Command::Quit,
        _ => unknown(),
    }
}

fn cell_marker(cell: &CellView) -> char {
    if cell.frozen.is_some() {
        '#'
    } else if cell.monster.is_some() {
        'm'
    } else if cell.bomb.is_some() {
        '!'
    } else if cell.poisoned {
        '~'
    } else if cell.hinted {
        '?'
    } else {
        ' '
    }
}

/// Text grid with row and column indices; each cell is its tile code and a
/// hazard marker (`#` frozen, `m` monster, `!` bomb, `~` poison, `?` hint).
pub fn render_board(board: &BoardSnapshot) -> String {
    let mut out = String::from("    ");
    for col in 0..board.size {
        out.push_str(&format!("{col:<4}"));
    }
    out.push('\n');
    for row in 0..board.size {
        out.push_str(&format!("{row:>2}  "));
        for col in 0..board.size {
            let cell = board.get(Pos::new(row, col)).copied().unwrap_or_default();
            let code = cell.tile.map_or_else(|| "..".to_string(), |t| t.to_string());
            out.push_str(&code);
            out.push(cell_marker(&cell));
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

/// Prints notices as they happen and keeps the latest snapshots for status lines.
pub struct ConsoleObserver<W: Write> {
    out: W,
    i18n: I18n,
    board: Option<BoardSnapshot>,
    boss: Option<BossSnapshot>,
    /// First failed write; observer callbacks cannot return it directly.
    failed: Option<io::Error>,
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W, i18n: I18n) -> Self {
        Self {
            out,
            i18n,
            board: None,
            boss: None,
            failed: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Report and clear the first write failure since the last call.
    pub fn take_error(&mut self) -> io::Result<()> {
        match self.failed.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn emit(&mut self, text: &str) {
        if self.failed.is_some() {
            return;
        }
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            self.failed = Some(err);
        }
    }

    pub fn say(&mut self, id: &str) {
        let text = self.i18n.t(id);
        self.emit(&format!("{text}\n"));
    }

    pub fn say_args(&mut self, id: &str, args: &FluentArgs) {
        let text = self.i18n.t_args(id, args);
        self.emit(&format!("{text}\n"));
    }

    pub fn print_board(&mut self) {
        if let Some(board) = &self.board {
            let text = render_board(board);
            self.emit(&text);
        }
    }

    pub fn print_status(&mut self, mode: GameMode, score: u64, moves: u32) {
        let mut args = FluentArgs::new();
        args.set("score", score);
        args.set("moves", moves);
        match (mode, self.boss.clone()) {
            (GameMode::Boss, Some(boss)) => {
                args.set("level", boss.level);
                args.set("avatar", boss.avatar);
                args.set("name", boss.name);
                args.set("hp", boss.hp);
                args.set("max_hp", boss.max_hp);
                args.set("shield", boss.shield);
                args.set("player_hp", boss.player_hp);
                args.set("player_max_hp", boss.player_max_hp);
                self.say_args("status-boss", &args);
            }
            _ => self.say_args("status-classic", &args),
        }
    }

    fn notice(&mut self, id: &str, key: &str, value: u64) {
        let mut args = FluentArgs::new();
        args.set(key.to_string(), value);
        self.say_args(id, &args);
    }
}

impl<W: Write> GameObserver for ConsoleObserver<W> {
    fn on_board_changed(&mut self, board: &BoardSnapshot, _changed: &[Pos]) {
        self.board = Some(board.clone());
    }

    fn on_score_changed(&mut self, _total: u64, delta: u64, formula: &str) {
        if delta == 0 {
            return;
        }
        let mut args = FluentArgs::new();
        args.set("delta", delta);
        args.set("formula", formula.to_string());
        self.say_args("score-changed", &args);
    }

    fn on_effect(&mut self, effect: &Effect) {
        match effect {
            Effect::Combo(n) => self.notice("combo", "count", u64::from(*n)),
            Effect::MatchKind(kind) => match kind {
                MatchKind::L => self.say("match-l"),
                MatchKind::T => self.say("match-t"),
                MatchKind::Five => self.say("match-five"),
                MatchKind::Normal => {}
            },
            Effect::SkillCast(skill) => self.say(&format!("skill-{}", skill.id())),
            Effect::SkillSealed { remaining } => self.notice("skill-sealed", "remaining", u64::from(*remaining)),
            Effect::PlayerDamaged { amount, source } => {
                let id = match source {
                    DamageSource::Poison => "player-poisoned",
                    DamageSource::BossAttack => "player-damaged",
                };
                self.notice(id, "amount", *amount);
            }
            Effect::PlayerHealed(amount) => self.notice("player-healed", "amount", *amount),
            Effect::BossDamaged { amount, absorbed } => {
                let mut args = FluentArgs::new();
                args.set("amount", *amount);
                args.set("absorbed", *absorbed);
                self.say_args("boss-damaged", &args);
            }
            Effect::StreakApplied { multiplier, points } => {
                let mut args = FluentArgs::new();
                args.set("multiplier", multiplier.to_string());
                args.set("points", *points);
                self.say_args("streak-applied", &args);
            }
            Effect::ItemGained(item) => {
                let mut args = FluentArgs::new();
                args.set("item", item.id());
                self.say_args("item-gained", &args);
            }
            Effect::BonusMoves(n) => self.notice("bonus-moves", "count", u64::from(*n)),
            Effect::BombDetonated { penalty, .. } => self.notice("bomb-detonated", "penalty", u64::from(*penalty)),
            Effect::Hints(pairs) => {
                let text: Vec<String> = pairs.iter().map(|(a, b)| format!("{a}<->{b}")).collect();
                let mut args = FluentArgs::new();
                args.set("pairs", text.join(", "));
                self.say_args("hints", &args);
            }
            Effect::BoardRefreshed => self.say("board-refreshed"),
            Effect::LevelStarted(level) => self.notice("level-started", "level", u64::from(*level)),
            Effect::BossDefeated(level) => self.notice("boss-defeated", "level", u64::from(*level)),
        }
    }

    fn on_boss_changed(&mut self, boss: &BossSnapshot) {
        self.boss = Some(boss.clone());
    }

    fn on_game_over(&mut self, victory: bool, final_score: u64, level: u32) {
        let mut args = FluentArgs::new();
        args.set("score", final_score);
        args.set("level", level);
        let id = match (victory, level) {
            (false, _) => "game-over-lost",
            (true, 0) => "game-over-classic",
            (true, _) => "game-over-won",
        };
        self.say_args(id, &args);
    }
}

/// Run commands until `quit` or end of input.
pub fn run<R, W, S>(session: &mut GameSession<ConsoleObserver<W>, S>, input: R, player_name: &str) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    S: RecordStore,
{
    let mut args = FluentArgs::new();
    args.set("mode", session.mode().to_string());
    session.observer_mut().say_args("welcome", &args);
    show(session);
    session.observer_mut().take_error()?;

    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Command::Quit => break,
            Command::Help => session.observer_mut().say("help"),
            Command::Board => show(session),
            Command::Swap(a, b) => {
                match session.request_swap(a, b) {
                    Ok(SwapOutcome::Resolved(_)) => {}
                    Ok(SwapOutcome::Reverted) => session.observer_mut().say("swap-reverted"),
                    Ok(SwapOutcome::Rejected(reason)) => session.observer_mut().say(reject_id(reason)),
                    Err(err) => report_error(session, &err),
                }
                show(session);
            }
            Command::Item(id) => {
                match id.parse::<ItemKind>() {
                    Ok(item) => {
                        let outcome = session.use_item(item);
                        let obs = session.observer_mut();
                        match outcome {
                            ItemOutcome::Insufficient => obs.say("item-insufficient"),
                            ItemOutcome::NoEffect => obs.say("item-no_effect"),
                            ItemOutcome::Rejected(reason) => obs.say(reject_id(reason)),
                            ItemOutcome::Armed if item == ItemKind::FreeSwap => obs.say("item-free_swap"),
                            ItemOutcome::Armed => obs.say("item-armed"),
                            ItemOutcome::Hints(_) | ItemOutcome::Resolved(_) => {}
                        }
                    }
                    Err(err) => report_error(session, &err),
                }
                show(session);
            }
            Command::Level(n) => {
                if let Err(err) = session.select_level(n) {
                    report_error(session, &err);
                }
                show(session);
            }
            Command::Retry => {
                if let Err(err) = session.retry_level() {
                    report_error(session, &err);
                }
                show(session);
            }
            Command::Mode(m) => {
                match m.parse::<GameMode>() {
                    Ok(mode) => session.switch_mode(mode),
                    Err(err) => report_error(session, &err),
                }
                show(session);
            }
            Command::Restart => {
                session.restart();
                show(session);
            }
            Command::Records => print_records(session),
            Command::Save(name) => {
                let name = name.unwrap_or_else(|| player_name.to_string());
                match session.save_record(&name) {
                    Ok(_) => session.observer_mut().say("record-saved"),
                    Err(err) => report_error(session, &err),
                }
            }
            Command::Unknown(_) => session.observer_mut().say("unknown-command"),
        }
        session.observer_mut().take_error()?;
    }
    Ok(())
}

fn reject_id(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::NotAdjacent => "reject-not_adjacent",
        RejectReason::SameCell => "reject-same_cell",
        RejectReason::Frozen => "reject-frozen",
        RejectReason::GameOver => "reject-game_over",
    }
}

fn report_error<W: Write, S: RecordStore>(session: &mut GameSession<ConsoleObserver<W>, S>, err: &dyn std::error::Error) {
    session.observer_mut().emit(&format!("error: {err}\n"));
}

fn show<W: Write, S: RecordStore>(session: &mut GameSession<ConsoleObserver<W>, S>) {
    let (mode, score, moves) = (session.mode(), session.score(), session.moves());
    let items: Vec<String> = session
        .inventory()
        .iter()
        .map(|(item, n)| format!("{item}:{n}"))
        .collect();
    let obs = session.observer_mut();
    obs.print_board();
    obs.print_status(mode, score, moves);
    let mut args = FluentArgs::new();
    args.set("items", items.join(" "));
    obs.say_args("inventory", &args);
}

fn print_records<W: Write, S: RecordStore>(session: &mut GameSession<ConsoleObserver<W>, S>) {
    let records = match session.load_records() {
        Ok(records) => records,
        Err(err) => {
            report_error(session, &err);
            return;
        }
    };
    let obs = session.observer_mut();
    if records.is_empty() {
        obs.say("records-empty");
        return;
    }
    for (rank, r) in records.iter().enumerate() {
        let mut args = FluentArgs::new();
        args.set("rank", rank + 1);
        args.set("name", r.name.clone());
        args.set("score", r.score);
        args.set("date", r.date.clone());
        args.set("time", r.time.clone());
        obs.say_args("record-line", &args);
    }
}
