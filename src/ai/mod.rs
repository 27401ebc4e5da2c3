use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::game::analysis::{analyze, compute_score};
use crate::game::config::ScoringTable;
use crate::game::field::Board;
use crate::game::logic::{GameSession, SwapOutcome};
use crate::game::types::{GameOutcome, Pos};
use crate::observer::GameObserver;
use crate::storage::RecordStore;

/// How the autoplayer picks among productive swaps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    Random,
    /// Highest immediate score, ties broken at random.
    #[default]
    Greedy,
}

/// Pick a productive swap that `allowed` accepts, or `None` if there is none.
pub fn calculate_swap<R: Rng + ?Sized>(
    strategy: Strategy,
    board: &Board,
    scoring: &ScoringTable,
    allowed: impl Fn(Pos, Pos) -> bool,
    rng: &mut R,
) -> Option<(Pos, Pos)> {
    let mut probe = board.clone();
    let candidates: Vec<(Pos, Pos)> = probe
        .productive_swaps()
        .into_iter()
        .filter(|&(a, b)| allowed(a, b))
        .collect();
    match strategy {
        Strategy::Random => candidates.choose(rng).copied(),
        Strategy::Greedy => greedy_swap(&mut probe, &candidates, scoring, rng),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Greedy (pick best immediate value)
// ════════════════════════════════════════════════════════════════════════════

fn greedy_swap<R: Rng + ?Sized>(
    board: &mut Board,
    candidates: &[(Pos, Pos)],
    scoring: &ScoringTable,
    rng: &mut R,
) -> Option<(Pos, Pos)> {
    let mut best_score = 0;
    let mut best_candidates = Vec::new();

    for &(a, b) in candidates {
        let score = evaluate_swap(board, a, b, scoring);
        if score > best_score || best_candidates.is_empty() {
            best_score = score;
            best_candidates.clear();
            best_candidates.push((a, b));
        } else if score == best_score {
            best_candidates.push((a, b));
        }
    }

    best_candidates.choose(rng).copied()
}

/// Score of the first cascade step a swap would trigger; the board is left
/// as it was.
pub fn evaluate_swap(board: &mut Board, a: Pos, b: Pos, scoring: &ScoringTable) -> u64 {
    board.swap(a, b);
    let matches = board.find_matches();
    let score = if matches.is_empty() {
        0
    } else {
        let analysis = analyze(&matches);
        compute_score(board, &matches, &analysis, 1, scoring).score
    };
    board.swap(a, b);
    score
}

/// Up to `count` distinct productive swaps chosen at random, for the scry item.
pub fn pick_hints<R: Rng + ?Sized>(board: &mut Board, count: usize, rng: &mut R) -> Vec<(Pos, Pos)> {
    let swaps = board.productive_swaps();
    let mut hints: Vec<(Pos, Pos)> = swaps.choose_multiple(rng, count).copied().collect();
    hints.sort();
    hints
}

/// Totals of an autoplay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplaySummary {
    pub turns: u32,
    pub score: u64,
    pub outcome: GameOutcome,
}

/// Play up to `turns` swaps, stopping early when the game ends or no legal
/// swap is left. Frozen cells are avoided.
pub fn autoplay<O: GameObserver, S: RecordStore, R: Rng + ?Sized>(
    session: &mut GameSession<O, S>,
    turns: u32,
    strategy: Strategy,
    rng: &mut R,
) -> AutoplaySummary {
    let mut played = 0;
    while played < turns && session.outcome() == GameOutcome::Running {
        let frozen = |p: Pos| {
            session
                .encounter()
                .is_some_and(|enc| enc.hazards.frozen.contains_key(&p))
        };
        let Some((a, b)) = calculate_swap(
            strategy,
            session.board(),
            &session.rules().scoring,
            |a, b| !frozen(a) && !frozen(b),
            rng,
        ) else {
            debug!(played, "autoplay found no legal swap");
            break;
        };
        match session.request_swap(a, b) {
            Ok(SwapOutcome::Resolved(_)) => played += 1,
            other => {
                debug!(?other, "autoplay swap did not resolve");
                break;
            }
        }
    }
    AutoplaySummary {
        turns: played,
        score: session.score(),
        outcome: session.outcome(),
    }
}
