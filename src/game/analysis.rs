//! Match classification and score computation.

use std::collections::{BTreeMap, BTreeSet};

use super::config::ScoringTable;
use super::field::Board;
use super::types::{Axis, Color, Match, MatchKind, Pos, Tile};

/// Summary of one detection pass; recomputed every cascade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchAnalysis {
    pub kind: MatchKind,
    pub total_cells: usize,
}

/// Points contributed by one shape/color group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupScore {
    pub tile: Tile,
    pub count: u32,
    pub shape_score: u32,
    pub color_multiplier: f64,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub score: u64,
    /// Sum of shape scores over green cells; drives boss-mode healing.
    pub green_weight: u32,
    /// Number of red cells; each one seals a boss skill turn.
    pub red_count: u32,
    pub cell_count: u32,
    pub groups: Vec<GroupScore>,
    pub formula: String,
}

pub fn distinct_cells(matches: &[Match]) -> BTreeSet<Pos> {
    matches.iter().flat_map(|m| m.cells.iter().copied()).collect()
}

/// Classify a match set. A five-run always wins over any intersection shape.
pub fn analyze(matches: &[Match]) -> MatchAnalysis {
    let total_cells = distinct_cells(matches).len();
    let kind = if matches.iter().any(|m| m.len() >= 5) {
        MatchKind::Five
    } else if has_intersection(matches) {
        t_or_l(matches)
    } else {
        MatchKind::Normal
    };
    MatchAnalysis { kind, total_cells }
}

fn split(matches: &[Match]) -> (Vec<&Match>, Vec<&Match>) {
    matches.iter().partition(|m| m.axis == Axis::Horizontal)
}

fn has_intersection(matches: &[Match]) -> bool {
    let (horizontal, vertical) = split(matches);
    horizontal
        .iter()
        .any(|h| vertical.iter().any(|v| h.cells.iter().any(|c| v.contains(*c))))
}

fn t_or_l(matches: &[Match]) -> MatchKind {
    let (horizontal, vertical) = split(matches);
    if horizontal.len() >= 2 || vertical.len() >= 2 {
        return MatchKind::T;
    }
    match (horizontal.first(), vertical.first()) {
        (Some(h), Some(v)) if h.len() >= 4 || v.len() >= 4 => MatchKind::T,
        _ => MatchKind::L,
    }
}

/// `min(combo, cap)` from the second cascade step on, otherwise 1.
pub fn combo_multiplier(combo: u32, cap: u32) -> u32 {
    if combo >= 2 {
        combo.min(cap)
    } else {
        1
    }
}

/// Score the distinct cells of a match set, grouped by tile.
///
/// Five-runs double every group; T shapes score each group as its
/// promoted tile; the combo multiplier applies on top. The total is floored.
pub fn compute_score(
    board: &Board,
    matches: &[Match],
    analysis: &MatchAnalysis,
    combo: u32,
    table: &ScoringTable,
) -> ScoreBreakdown {
    let mut counts: BTreeMap<Tile, u32> = BTreeMap::new();
    let mut green_weight = 0;
    let mut red_count = 0;
    let mut cell_count = 0;

    for pos in distinct_cells(matches) {
        let Some(tile) = board.get(pos) else {
            continue;
        };
        match tile.color {
            Color::Green => green_weight += table.shape_score(tile.shape),
            Color::Red => red_count += 1,
            Color::Blue => {}
        }
        cell_count += 1;
        *counts.entry(tile).or_default() += 1;
    }

    let type_multiplier = match analysis.kind {
        MatchKind::Five => table.five_multiplier,
        _ => 1.0,
    };
    let combo_mult = combo_multiplier(combo, table.combo_cap);

    let groups: Vec<GroupScore> = counts
        .into_iter()
        .map(|(tile, count)| {
            let scored = match analysis.kind {
                MatchKind::T => tile.promoted(),
                _ => tile,
            };
            let shape_score = table.shape_score(scored.shape);
            let color_multiplier = table.color_multiplier(scored.color);
            let points = f64::from(count)
                * f64::from(shape_score)
                * color_multiplier
                * type_multiplier
                * f64::from(combo_mult);
            GroupScore {
                tile,
                count,
                shape_score,
                color_multiplier,
                points,
            }
        })
        .collect();

    let total: f64 = groups.iter().map(|g| g.points).sum();
    let formula = formula(&groups, analysis.kind, type_multiplier, combo_mult);

    ScoreBreakdown {
        score: total.floor() as u64,
        green_weight,
        red_count,
        cell_count,
        groups,
        formula,
    }
}

fn formula(groups: &[GroupScore], kind: MatchKind, type_multiplier: f64, combo: u32) -> String {
    let mut parts = Vec::with_capacity(groups.len());
    for g in groups {
        let mut part = format!(
            "{}({}/{})x{}x{}",
            g.count,
            g.tile.shape.name(),
            g.tile.color.name(),
            g.shape_score,
            g.color_multiplier
        );
        match kind {
            MatchKind::Five => part.push_str(&format!("x{type_multiplier}(five)")),
            MatchKind::T => part.push_str("(promoted)"),
            _ => {}
        }
        parts.push(part);
    }
    let mut out = parts.join(" + ");
    if combo > 1 {
        out.push_str(&format!(" x{combo}(combo)"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Shape;

    fn board(rows: &[&str]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    fn score_of(b: &Board, kind: MatchKind, combo: u32) -> ScoreBreakdown {
        let matches = b.find_matches();
        let analysis = MatchAnalysis {
            kind,
            total_cells: distinct_cells(&matches).len(),
        };
        compute_score(b, &matches, &analysis, combo, &ScoringTable::default())
    }

    fn three_green_triangles() -> Board {
        board(&[
            "Tg Tg Tg Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ])
    }

    #[test]
    fn three_green_triangles_score_nine() {
        let b = three_green_triangles();
        let analysis = analyze(&b.find_matches());
        assert_eq!(analysis.kind, MatchKind::Normal);
        assert_eq!(analysis.total_cells, 3);
        let s = score_of(&b, analysis.kind, 1);
        assert_eq!(s.score, 9);
        assert_eq!(s.green_weight, 9);
        assert_eq!(s.red_count, 0);
        assert_eq!(s.cell_count, 3);
    }

    #[test]
    fn five_run_doubles() {
        let b = board(&[
            "Tg Tg Tg Tg Tg",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ]);
        let analysis = analyze(&b.find_matches());
        assert_eq!(analysis.kind, MatchKind::Five);
        assert_eq!(score_of(&b, analysis.kind, 1).score, 30);
    }

    #[test]
    fn t_shape_scores_promoted_tiles() {
        let b = board(&[
            "Tg Tg Tg Sb Cr",
            "Sb Tg Sb Cr Sb",
            "Cr Tg Cr Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ]);
        let s = score_of(&b, MatchKind::T, 1);
        assert_eq!(s.cell_count, 5);
        assert_eq!(s.groups.len(), 1);
        assert_eq!(s.groups[0].shape_score, 4);
        assert_eq!(s.groups[0].color_multiplier, 1.5);
        assert_eq!(s.score, 30);
        // healing weight still uses the tile as it sits on the board
        assert_eq!(s.green_weight, 15);
    }

    #[test]
    fn combo_multiplies_the_base() {
        let b = three_green_triangles();
        assert_eq!(score_of(&b, MatchKind::Normal, 3).score, 27);
        assert_eq!(score_of(&b, MatchKind::Normal, 9).score, 45);
    }

    #[test]
    fn score_never_drops_as_combo_grows() {
        let b = board(&[
            "Cb Cb Cb Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ]);
        for kind in [MatchKind::Normal, MatchKind::L, MatchKind::T, MatchKind::Five] {
            let mut last = 0;
            for combo in 0..10 {
                let s = score_of(&b, kind, combo).score;
                assert!(s >= last, "{kind:?} combo {combo}: {s} < {last}");
                last = s;
            }
        }
    }

    #[test]
    fn plain_corner_is_an_l() {
        let b = board(&[
            "Tg Tg Tg Sb Cr",
            "Tg Cr Sb Cr Sb",
            "Tg Sb Cr Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ]);
        let analysis = analyze(&b.find_matches());
        assert_eq!(analysis.kind, MatchKind::L);
        assert_eq!(analysis.total_cells, 5);
    }

    #[test]
    fn intersection_with_a_four_run_is_a_t() {
        let b = board(&[
            "Tg Tg Tg Tg Cr",
            "Tg Cr Sb Cr Sb",
            "Tg Sb Cr Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ]);
        let analysis = analyze(&b.find_matches());
        assert_eq!(analysis.kind, MatchKind::T);
        assert_eq!(analysis.total_cells, 6);
    }

    #[test]
    fn five_beats_intersection() {
        let b = board(&[
            "Tg Tg Tg Tg Tg",
            "Sb Cr Tg Cr Sb",
            "Cr Sb Tg Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ]);
        let analysis = analyze(&b.find_matches());
        assert_eq!(analysis.kind, MatchKind::Five);
        assert_eq!(analysis.total_cells, 7);
    }

    #[test]
    fn separate_runs_do_not_intersect() {
        let b = board(&[
            "Tg Tg Tg Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cg Cg Cg",
        ]);
        let matches = b.find_matches();
        assert_eq!(matches.len(), 2);
        assert_eq!(analyze(&matches).kind, MatchKind::Normal);
    }

    #[test]
    fn red_cells_are_counted_and_groups_split_by_tile() {
        let b = board(&[
            "Cr Cr Cr Sb Tg",
            "Sb Tg Sb Cr Tg",
            "Cr Sb Cr Sb Tg",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ]);
        let s = score_of(&b, MatchKind::Normal, 1);
        assert_eq!(s.red_count, 3);
        assert_eq!(s.green_weight, 9);
        assert_eq!(s.groups.len(), 2);
        // 3 x 5 x 3 + 3 x 3 x 1
        assert_eq!(s.score, 54);
        assert!(s.formula.contains("3(circle/red)x5x3"));
    }

    #[test]
    fn combo_multiplier_only_from_second_step() {
        assert_eq!(combo_multiplier(0, 5), 1);
        assert_eq!(combo_multiplier(1, 5), 1);
        assert_eq!(combo_multiplier(2, 5), 2);
        assert_eq!(combo_multiplier(7, 5), 5);
    }

    #[test]
    fn star_stays_star_when_promoted() {
        let b = board(&[
            "*r *r *r Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
            "Sb Cr Sb Cr Sb",
            "Cr Sb Cr Sb Cr",
        ]);
        let s = score_of(&b, MatchKind::T, 1);
        assert_eq!(s.groups[0].tile, Tile::new(Shape::Star, Color::Red));
        assert_eq!(s.score, 90);
    }
}
