mod common;

use common::*;
use puzzle_boss_battle::error::GameError;
use puzzle_boss_battle::game::config::RulesConfig;
use puzzle_boss_battle::game::logic::{GameSession, InputMode, ItemOutcome, RejectReason, SwapOutcome};
use puzzle_boss_battle::game::types::{GameMode, GameOutcome, Pos};
use puzzle_boss_battle::items::ItemKind;
use puzzle_boss_battle::observer::{Effect, Suspend};

fn p(row: usize, col: usize) -> Pos {
    Pos::new(row, col)
}

fn classic(board: puzzle_boss_battle::game::field::Board) -> Session {
    session_with(GameMode::Classic, quiet_rules(), board)
}

fn assert_settled(session: &Session) {
    let board = session.board();
    assert!(!board.has_empty());
    assert!(board.find_matches().is_empty());
}

// ── swaps ─────────────────────────────────────────────────────────────────────

#[test]
fn three_green_triangles_score_nine() {
    let mut s = classic(triangle_board());
    let outcome = s.request_swap(p(0, 1), p(1, 1)).unwrap();

    let SwapOutcome::Resolved(report) = outcome else {
        panic!("expected a resolved swap, got {outcome:?}");
    };
    assert!(report.steps >= 1);
    assert_eq!(report.score_gained, s.score());
    assert_eq!(s.observer().deltas[0], 9);
    assert_eq!(s.moves(), 29);
    assert_eq!(s.outcome(), GameOutcome::Running);
    assert_settled(&s);
}

#[test]
fn resolution_pauses_in_order() {
    let mut s = classic(triangle_board());
    s.request_swap(p(0, 1), p(1, 1)).unwrap();
    assert_eq!(
        s.observer().suspends[..4],
        [
            Suspend::AfterSwap,
            Suspend::AfterClear,
            Suspend::AfterGravity,
            Suspend::AfterRefill
        ]
    );
    assert_eq!(s.observer().turn_ends, 1);
}

#[test]
fn illegal_swaps_change_nothing() {
    let mut s = classic(triangle_board());
    let before = s.board().clone();

    assert_eq!(
        s.request_swap(p(0, 0), p(2, 0)).unwrap(),
        SwapOutcome::Rejected(RejectReason::NotAdjacent)
    );
    assert_eq!(
        s.request_swap(p(0, 0), p(0, 0)).unwrap(),
        SwapOutcome::Rejected(RejectReason::SameCell)
    );
    assert!(matches!(
        s.request_swap(p(0, 4), p(0, 5)),
        Err(GameError::OutOfBounds { size: 5, .. })
    ));
    assert_eq!(s.board(), &before);
    assert_eq!(s.moves(), 30);
}

#[test]
fn swap_without_match_is_undone_for_free() {
    let mut s = classic(triangle_board());
    let before = s.board().clone();
    assert_eq!(s.request_swap(p(0, 0), p(0, 1)).unwrap(), SwapOutcome::Reverted);
    assert_eq!(s.board(), &before);
    assert_eq!(s.moves(), 30);
    assert_eq!(s.score(), 0);
    assert_eq!(s.observer().turn_ends, 1);
}

#[test]
fn last_move_finishes_the_game() {
    let mut rules = quiet_rules();
    rules.classic_moves = 1;
    let mut s = session_with(GameMode::Classic, rules, triangle_board());
    s.request_swap(p(0, 1), p(1, 1)).unwrap();

    assert_eq!(s.moves(), 0);
    assert_eq!(s.outcome(), GameOutcome::Finished);
    assert_eq!(s.observer().game_overs, [(true, s.score(), 0)]);
    assert_eq!(
        s.request_swap(p(0, 0), p(0, 1)).unwrap(),
        SwapOutcome::Rejected(RejectReason::GameOver)
    );
    assert_eq!(s.use_item(ItemKind::Scry), ItemOutcome::Rejected(RejectReason::GameOver));
}

// ── items ─────────────────────────────────────────────────────────────────────

#[test]
fn special_items_start_empty() {
    let mut s = classic(triangle_board());
    assert_eq!(s.inventory().count(ItemKind::Scry), 1);
    assert_eq!(s.inventory().count(ItemKind::Recolor), 0);
    assert_eq!(s.use_item(ItemKind::Recolor), ItemOutcome::Insufficient);
    assert_eq!(s.use_item(ItemKind::FreeSwap), ItemOutcome::Insufficient);
    assert_eq!(s.input_mode(), InputMode::Normal);
}

#[test]
fn scry_marks_productive_swaps() {
    let mut s = classic(triangle_board());
    let productive = s.board().clone().productive_swaps();

    let ItemOutcome::Hints(hints) = s.use_item(ItemKind::Scry) else {
        panic!("scry should produce hints");
    };
    assert_eq!(hints.len(), 3);
    assert!(hints.iter().all(|h| productive.contains(h)));
    assert_eq!(s.inventory().count(ItemKind::Scry), 0);
    assert_eq!(s.moves(), 30);
    let snapshot = s.snapshot();
    assert!(hints.iter().all(|(a, b)| snapshot.get(*a).unwrap().hinted && snapshot.get(*b).unwrap().hinted));
    assert!(s.observer().has(&Effect::Hints(hints.clone())));

    s.request_swap(p(0, 1), p(1, 1)).unwrap();
    assert!(s.hints().is_empty());
}

#[test]
fn scry_on_a_dead_board_is_not_consumed() {
    let mut s = classic(dead_board());
    assert_eq!(s.use_item(ItemKind::Scry), ItemOutcome::NoEffect);
    assert_eq!(s.inventory().count(ItemKind::Scry), 1);
}

#[test]
fn bomb_and_shuffle_leave_a_settled_board() {
    let mut s = classic(triangle_board());
    assert!(matches!(s.use_item(ItemKind::Bomb), ItemOutcome::Resolved(_)));
    assert_settled(&s);
    assert!(matches!(s.use_item(ItemKind::Shuffle), ItemOutcome::Resolved(_)));
    assert_settled(&s);

    assert_eq!(s.use_item(ItemKind::Bomb), ItemOutcome::Insufficient);
    assert_eq!(s.use_item(ItemKind::Shuffle), ItemOutcome::Insufficient);
    assert_eq!(s.moves(), 30);
}

#[test]
fn recolor_resolves_immediately() {
    let mut s = classic(triangle_board());
    s.inventory_mut().add(ItemKind::Recolor);
    assert!(matches!(s.use_item(ItemKind::Recolor), ItemOutcome::Resolved(_)));
    assert_eq!(s.inventory().count(ItemKind::Recolor), 0);
    assert_settled(&s);
}

#[test]
fn streak_scales_the_next_scores() {
    let mut s = classic(triangle_board());
    s.inventory_mut().add(ItemKind::Streak);
    assert_eq!(s.use_item(ItemKind::Streak), ItemOutcome::Armed);
    assert_eq!(s.streak().remaining(), 3);

    s.request_swap(p(0, 1), p(1, 1)).unwrap();
    let first = s
        .observer()
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::StreakApplied { multiplier, points } => Some((*multiplier, *points)),
            _ => None,
        })
        .expect("streak should apply to the first step");
    assert_eq!(first.1, (9.0 * first.0).ceil() as u64);
    assert_eq!(s.observer().deltas[0], first.1);
    assert!(s.streak().remaining() < 3);
}

#[test]
fn free_swap_ignores_adjacency() {
    let mut s = classic(far_triangle_board());
    s.inventory_mut().add(ItemKind::FreeSwap);
    assert_eq!(s.use_item(ItemKind::FreeSwap), ItemOutcome::Armed);
    assert_eq!(s.input_mode(), InputMode::AwaitingFreeSwap);

    assert_eq!(
        s.request_swap(p(0, 1), p(0, 1)).unwrap(),
        SwapOutcome::Rejected(RejectReason::SameCell)
    );
    assert_eq!(s.input_mode(), InputMode::AwaitingFreeSwap);

    assert!(matches!(
        s.request_swap(p(0, 1), p(3, 3)).unwrap(),
        SwapOutcome::Resolved(_)
    ));
    assert_eq!(s.observer().deltas[0], 9);
    assert_eq!(s.input_mode(), InputMode::Normal);
    assert_eq!(s.inventory().count(ItemKind::FreeSwap), 0);
}

#[test]
fn arming_free_swap_twice_keeps_the_second_item() {
    let mut s = classic(triangle_board());
    s.inventory_mut().add(ItemKind::FreeSwap);
    s.inventory_mut().add(ItemKind::FreeSwap);
    assert_eq!(s.use_item(ItemKind::FreeSwap), ItemOutcome::Armed);
    assert_eq!(s.use_item(ItemKind::FreeSwap), ItemOutcome::NoEffect);
    assert_eq!(s.inventory().count(ItemKind::FreeSwap), 1);
    assert_eq!(s.input_mode(), InputMode::AwaitingFreeSwap);
}

#[test]
fn dead_board_is_refreshed_after_resolving() {
    // Repainting the dead layout blue keeps its shapes, so it stays dead.
    let mut s = classic(dead_board());
    s.inventory_mut().add(ItemKind::Recolor);
    let ItemOutcome::Resolved(report) = s.use_item(ItemKind::Recolor) else {
        panic!("recolor should resolve");
    };
    assert_eq!(report.steps, 0);
    assert!(s.observer().has(&Effect::BoardRefreshed));
    assert_settled(&s);
    assert!(s.board().clone().has_possible_moves());
}

// ── session lifecycle ─────────────────────────────────────────────────────────

#[test]
fn restart_resets_score_and_items() {
    let mut s = classic(triangle_board());
    s.request_swap(p(0, 1), p(1, 1)).unwrap();
    s.use_item(ItemKind::Bomb);
    s.restart();

    assert_eq!(s.score(), 0);
    assert_eq!(s.moves(), 30);
    assert_eq!(s.inventory().count(ItemKind::Bomb), 1);
    assert_eq!(s.board().size(), 11);
    assert_settled(&s);
    assert!(s.board().clone().has_possible_moves());
}

#[test]
fn switching_mode_starts_the_campaign() {
    let mut s = classic(triangle_board());
    s.switch_mode(GameMode::Classic);
    assert_eq!(s.board().size(), 5);

    s.switch_mode(GameMode::Boss);
    assert_eq!(s.mode(), GameMode::Boss);
    let enc = s.encounter().expect("boss mode has an encounter");
    assert_eq!(enc.level, 1);
    assert_eq!(s.moves(), 50);
    assert!(s.observer().has(&Effect::LevelStarted(1)));

    s.switch_mode(GameMode::Classic);
    assert!(s.encounter().is_none());
    assert_eq!(s.moves(), 30);
}

#[test]
fn level_select_needs_boss_mode() {
    let mut s = classic(triangle_board());
    assert!(matches!(s.select_level(1), Err(GameError::WrongMode { .. })));
    assert!(matches!(s.retry_level(), Err(GameError::WrongMode { .. })));
}

#[test]
fn records_are_ranked_and_named() {
    let mut s = classic(triangle_board());
    s.request_swap(p(0, 1), p(1, 1)).unwrap();
    let score = s.score();
    s.save_record("  ").unwrap();
    s.restart();
    let records = s.save_record("Ada").unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].score, score);
    assert_eq!(records[0].name, "Anonymous");
    assert_eq!(records[1].name, "Ada");
    assert_eq!(s.load_records().unwrap(), records);
}

#[test]
fn headless_sessions_replay_by_seed() {
    let a = GameSession::headless(GameMode::Classic, 9);
    let b = GameSession::headless(GameMode::Classic, 9);
    assert_eq!(a.board(), b.board());
    assert_eq!(a.board().size(), RulesConfig::default().board_size);
}
