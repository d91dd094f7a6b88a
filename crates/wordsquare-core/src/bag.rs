//! The shared pool of undrawn tiles.

use crate::tile::{Tile, TileDistribution};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Shuffled pool of undrawn tiles.
///
/// Blanks never sit in the drawable pool. They wait in a reserve and are
/// handed out one at a time through [`TileBag::swap_one_for_blank`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileBag {
    tiles: Vec<Tile>,
    reserved_blanks: u32,
}

impl TileBag {
    /// Build a freshly shuffled bag for a language
    pub fn for_language<R: Rng + ?Sized>(language: &str, rng: &mut R) -> Option<Self> {
        let dist = TileDistribution::for_language(language)?;
        Some(Self::from_distribution(&dist, rng))
    }

    /// Build a freshly shuffled bag from a distribution table
    pub fn from_distribution<R: Rng + ?Sized>(dist: &TileDistribution, rng: &mut R) -> Self {
        let mut tiles = dist.letter_tiles();
        tiles.shuffle(rng);
        Self {
            tiles,
            reserved_blanks: dist.blank_count(),
        }
    }

    /// Bag with exactly these tiles in this order, no shuffle
    pub fn from_tiles(tiles: Vec<Tile>, reserved_blanks: u32) -> Self {
        Self {
            tiles,
            reserved_blanks,
        }
    }

    /// Number of drawable tiles
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether no drawable tiles remain
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Blanks still waiting to be handed out
    pub fn reserved_blanks(&self) -> u32 {
        self.reserved_blanks
    }

    /// Drawable tiles plus reserved blanks
    pub fn total_held(&self) -> usize {
        self.tiles.len() + self.reserved_blanks as usize
    }

    /// Remove up to `n` tiles from the front of the bag
    pub fn draw(&mut self, n: usize) -> Vec<Tile> {
        let take = n.min(self.tiles.len());
        self.tiles.drain(..take).collect()
    }

    /// Put tiles back and reshuffle. Blanks go back to the reserve.
    pub fn return_tiles<R: Rng + ?Sized>(&mut self, tiles: Vec<Tile>, rng: &mut R) {
        for tile in tiles {
            if tile.is_blank {
                self.reserved_blanks += 1;
            } else {
                self.tiles.push(tile);
            }
        }
        self.tiles.shuffle(rng);
    }

    /// Send the last of `drawn` back to the bag and put a blank in its place.
    ///
    /// Returns false (and leaves `drawn` untouched) when `drawn` is empty
    /// or the blank reserve is exhausted.
    pub fn swap_one_for_blank<R: Rng + ?Sized>(&mut self, drawn: &mut Vec<Tile>, rng: &mut R) -> bool {
        if self.reserved_blanks == 0 {
            return false;
        }
        let Some(returned) = drawn.pop() else {
            return false;
        };
        self.return_tiles(vec![returned], rng);
        self.reserved_blanks -= 1;
        drawn.push(Tile::blank());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_new_bag_holds_full_set() {
        let bag = TileBag::for_language("en", &mut rng()).unwrap();
        assert_eq!(bag.len(), 98);
        assert_eq!(bag.reserved_blanks(), 2);
        assert_eq!(bag.total_held(), 100);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let a = TileBag::for_language("nl", &mut rng()).unwrap();
        let b = TileBag::for_language("nl", &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_draw_never_overdraws() {
        let mut bag = TileBag::from_tiles(vec![Tile::new('A', 1), Tile::new('B', 3)], 0);
        let drawn = bag.draw(7);
        assert_eq!(drawn.len(), 2);
        assert_eq!(drawn[0].letter, 'A');
        assert!(bag.is_empty());
        assert!(bag.draw(3).is_empty());
    }

    #[test]
    fn test_return_tiles_routes_blanks_to_reserve() {
        let mut bag = TileBag::from_tiles(vec![], 0);
        bag.return_tiles(vec![Tile::new('A', 1), Tile::blank_as('E')], &mut rng());
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.reserved_blanks(), 1);
    }

    #[test]
    fn test_swap_one_for_blank() {
        let mut bag = TileBag::from_tiles(vec![], 1);
        let mut drawn = vec![Tile::new('A', 1), Tile::new('Q', 10)];

        assert!(bag.swap_one_for_blank(&mut drawn, &mut rng()));
        assert_eq!(drawn, vec![Tile::new('A', 1), Tile::blank()]);
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.reserved_blanks(), 0);

        // Reserve exhausted
        assert!(!bag.swap_one_for_blank(&mut drawn, &mut rng()));
        assert_eq!(drawn.len(), 2);
    }

    #[test]
    fn test_swap_with_nothing_drawn() {
        let mut bag = TileBag::from_tiles(vec![], 2);
        let mut drawn = Vec::new();
        assert!(!bag.swap_one_for_blank(&mut drawn, &mut rng()));
        assert_eq!(bag.reserved_blanks(), 2);
    }
}
