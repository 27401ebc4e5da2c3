use rand::Rng;

use super::config::TileWeights;
use super::types::{Color, Shape, Tile};

/// Returned when a roll lands past the end of the table.
const FALLBACK_TILE: Tile = Tile::new(Shape::Triangle, Color::Green);

/// Joint shape x color probability table with cumulative sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDistribution {
    table: Vec<(Tile, f64)>,
}

impl TileDistribution {
    /// Build the joint table as the product of independent shape and color weights.
    pub fn from_weights(weights: &TileWeights) -> Self {
        let table = weights
            .shapes
            .iter()
            .flat_map(|&(shape, ps)| {
                weights
                    .colors
                    .iter()
                    .map(move |&(color, pc)| (Tile::new(shape, color), ps * pc))
            })
            .collect();
        Self { table }
    }

    pub fn from_table(table: Vec<(Tile, f64)>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &[(Tile, f64)] {
        &self.table
    }

    pub fn probability(&self, tile: Tile) -> f64 {
        self.table
            .iter()
            .filter(|(t, _)| *t == tile)
            .map(|(_, p)| p)
            .sum()
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Tile {
        self.pick(rng.gen::<f64>())
    }

    /// Map a roll in `[0, 1)` to a tile by walking the cumulative sum.
    pub fn pick(&self, roll: f64) -> Tile {
        let mut cumulative = 0.0;
        for &(tile, p) in &self.table {
            cumulative += p;
            if roll <= cumulative {
                return tile;
            }
        }
        FALLBACK_TILE
    }
}

impl Default for TileDistribution {
    fn default() -> Self {
        Self::from_weights(&TileWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn default_table_matches_configured_weights() {
        let dist = TileDistribution::default();
        assert_eq!(dist.table().len(), 12);
        let total: f64 = dist.table().iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
        let star_red = dist.probability(Tile::new(Shape::Star, Color::Red));
        assert!((star_red - 0.02).abs() < 1e-9);
        let tri_blue = dist.probability(Tile::new(Shape::Triangle, Color::Blue));
        assert!((tri_blue - 0.12).abs() < 1e-9);
    }

    #[test]
    fn pick_walks_the_cumulative_sum() {
        let dist = TileDistribution::default();
        assert_eq!(dist.pick(0.0), Tile::new(Shape::Triangle, Color::Green));
        // triangle/green 0.12, triangle/blue 0.12 -> 0.2 falls in the second bucket
        assert_eq!(dist.pick(0.2), Tile::new(Shape::Triangle, Color::Blue));
        assert_eq!(dist.pick(0.999), Tile::new(Shape::Star, Color::Red));
    }

    #[test]
    fn rounding_gap_falls_back_to_green_triangle() {
        let dist = TileDistribution::from_table(vec![(Tile::new(Shape::Star, Color::Red), 0.5)]);
        assert_eq!(dist.pick(0.75), FALLBACK_TILE);
    }

    #[test]
    fn stars_are_rare() {
        let dist = TileDistribution::default();
        let mut rng = StdRng::seed_from_u64(7);
        let stars = (0..10_000)
            .filter(|_| dist.sample(&mut rng).shape == Shape::Star)
            .count();
        assert!((700..1300).contains(&stars), "got {stars} stars");
    }
}
