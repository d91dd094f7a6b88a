//! Game board representation and word extraction.
//!
//! This module contains:
//! - Square types and the standard multiplier layout
//! - The 15x15 board grid, stored flat and indexed `y * 15 + x`
//! - Placement and formed-word extraction

use crate::template::BoardTemplate;
use crate::tile::{PlacedTile, Tile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Width and height of the board
pub const BOARD_SIZE: usize = 15;

/// Index of the center row and column
pub const CENTER: usize = 7;

/// Standard multiplier layout, one string per row.
///
/// `T` triple word, `D` double word, `t` triple letter, `d` double letter,
/// `*` center (double word), `.` plain.
const STANDARD_LAYOUT: [&str; BOARD_SIZE] = [
    "T..d...T...d..T",
    ".D...t...t...D.",
    "..D...d.d...D..",
    "d..D...d...D..d",
    "....D.....D....",
    ".t...t...t...t.",
    "..d...d.d...d..",
    "T..d...*...d..T",
    "..d...d.d...d..",
    ".t...t...t...t.",
    "....D.....D....",
    "d..D...d...D..d",
    "..D...d.d...D..",
    ".D...t...t...D.",
    "T..d...T...d..T",
];

/// Multiplier carried by a board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SquareType {
    Normal,
    DoubleLetter,
    TripleLetter,
    DoubleWord,
    TripleWord,
}

impl SquareType {
    /// Factor applied to a tile's points on this square
    pub fn letter_multiplier(self) -> u32 {
        match self {
            SquareType::DoubleLetter => 2,
            SquareType::TripleLetter => 3,
            _ => 1,
        }
    }

    /// Factor applied to a whole word crossing this square
    pub fn word_multiplier(self) -> u32 {
        match self {
            SquareType::DoubleWord => 2,
            SquareType::TripleWord => 3,
            _ => 1,
        }
    }
}

/// Direction a word runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn perpendicular(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// Unit step `(dx, dy)` along this orientation
    fn step(self) -> (usize, usize) {
        match self {
            Orientation::Horizontal => (1, 0),
            Orientation::Vertical => (0, 1),
        }
    }
}

/// A contiguous run of two or more occupied cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start_x: usize,
    pub start_y: usize,
    pub orientation: Orientation,
    /// Tiles along the word, in reading order
    pub tiles: Vec<PlacedTile>,
}

impl Word {
    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Same text, start cell and orientation
    fn same_span(&self, other: &Word) -> bool {
        self.text == other.text
            && self.start_x == other.start_x
            && self.start_y == other.start_y
            && self.orientation == other.orientation
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BoardError {
    #[error("Position ({x}, {y}) is outside the board")]
    OutOfBounds { x: usize, y: usize },

    #[error("Position ({x}, {y}) is already occupied")]
    Occupied { x: usize, y: usize },
}

/// The 15x15 board with its multiplier layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Vec<Option<Tile>>,
    template: Option<BoardTemplate>,
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// Empty board using the standard layout
    pub fn empty() -> Self {
        Self::with_template(None)
    }

    /// Empty board using a custom template, or the standard layout for `None`
    pub fn with_template(template: Option<BoardTemplate>) -> Self {
        Self {
            cells: vec![None; BOARD_SIZE * BOARD_SIZE],
            template,
        }
    }

    pub fn template(&self) -> Option<&BoardTemplate> {
        self.template.as_ref()
    }

    pub fn is_within_bounds(x: usize, y: usize) -> bool {
        x < BOARD_SIZE && y < BOARD_SIZE
    }

    fn index(x: usize, y: usize) -> Option<usize> {
        Self::is_within_bounds(x, y).then_some(y * BOARD_SIZE + x)
    }

    /// Tile at a cell, `None` if the cell is empty or off the board
    pub fn get(&self, x: usize, y: usize) -> Option<&Tile> {
        Self::index(x, y).and_then(|i| self.cells.get(i)).and_then(Option::as_ref)
    }

    /// Whether an on-board cell holds no tile.
    /// Off-board cells are reported as not empty.
    pub fn is_cell_empty(&self, x: usize, y: usize) -> bool {
        Self::index(x, y)
            .and_then(|i| self.cells.get(i))
            .map_or(false, Option::is_none)
    }

    fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some()
    }

    /// Whether no tile has been placed yet
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Every tile on the board with its coordinates, row by row
    pub fn placed_tiles(&self) -> Vec<PlacedTile> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                cell.map(|tile| PlacedTile::new(tile, i % BOARD_SIZE, i / BOARD_SIZE))
            })
            .collect()
    }

    /// Whether any orthogonal neighbour of `(x, y)` holds a tile
    pub fn has_orthogonal_neighbor(&self, x: usize, y: usize) -> bool {
        let left = x.checked_sub(1).map_or(false, |lx| self.is_occupied(lx, y));
        let up = y.checked_sub(1).map_or(false, |uy| self.is_occupied(x, uy));
        left || up || self.is_occupied(x + 1, y) || self.is_occupied(x, y + 1)
    }

    /// Multiplier of a cell under this board's layout
    pub fn square_type(&self, x: usize, y: usize) -> SquareType {
        Self::square_type_for(x, y, self.template.as_ref())
    }

    /// Multiplier of a cell under a custom template, or the standard layout for `None`
    pub fn square_type_for(x: usize, y: usize, template: Option<&BoardTemplate>) -> SquareType {
        if !Self::is_within_bounds(x, y) {
            return SquareType::Normal;
        }
        match template {
            Some(template) => template
                .code_at(x, y)
                .map_or(SquareType::Normal, |code| code.square_type()),
            None => standard_square_type(x, y),
        }
    }

    /// New board with `tiles` written in. `self` is left untouched.
    pub fn place_tiles(&self, tiles: &[PlacedTile]) -> Result<Board, BoardError> {
        let mut next = self.clone();
        for placed in tiles {
            let cell = Self::index(placed.x, placed.y)
                .and_then(|i| next.cells.get_mut(i))
                .ok_or(BoardError::OutOfBounds {
                    x: placed.x,
                    y: placed.y,
                })?;
            if cell.is_some() {
                return Err(BoardError::Occupied {
                    x: placed.x,
                    y: placed.y,
                });
            }
            *cell = Some(placed.tile);
        }
        Ok(next)
    }

    /// Words formed by `placed`, which must already be on this board.
    ///
    /// The main word along the placement axis comes first (if it has at
    /// least two letters), followed by the perpendicular word through each
    /// placed tile. A single tile is treated as a horizontal placement.
    pub fn find_formed_words(&self, placed: &[PlacedTile]) -> Vec<Word> {
        let Some(first) = placed.first() else {
            return Vec::new();
        };

        let distinct_x: HashSet<usize> = placed.iter().map(|t| t.x).collect();
        let orientation = if placed.len() == 1 || distinct_x.len() > 1 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        let mut words: Vec<Word> = Vec::new();
        if let Some(main) = self.word_through(first.x, first.y, orientation) {
            words.push(main);
        }

        for tile in placed {
            if let Some(cross) = self.word_through(tile.x, tile.y, orientation.perpendicular()) {
                if !words.iter().any(|w| w.same_span(&cross)) {
                    words.push(cross);
                }
            }
        }

        words
    }

    /// The run of occupied cells through `(x, y)` along `orientation`
    fn word_through(&self, x: usize, y: usize, orientation: Orientation) -> Option<Word> {
        if !self.is_occupied(x, y) {
            return None;
        }
        let (dx, dy) = orientation.step();

        let (mut sx, mut sy) = (x, y);
        while sx >= dx && sy >= dy && self.is_occupied(sx - dx, sy - dy) {
            sx -= dx;
            sy -= dy;
        }

        let mut tiles = Vec::new();
        let (mut cx, mut cy) = (sx, sy);
        while let Some(tile) = self.get(cx, cy) {
            tiles.push(PlacedTile::new(*tile, cx, cy));
            cx += dx;
            cy += dy;
        }

        if tiles.len() < 2 {
            return None;
        }

        Some(Word {
            text: tiles.iter().map(|t| t.letter()).collect(),
            start_x: sx,
            start_y: sy,
            orientation,
            tiles,
        })
    }
}

/// Multiplier of a cell in the standard layout
pub fn standard_square_type(x: usize, y: usize) -> SquareType {
    let code = STANDARD_LAYOUT
        .get(y)
        .and_then(|row| row.as_bytes().get(x))
        .copied()
        .unwrap_or(b'.');
    match code {
        b'T' => SquareType::TripleWord,
        b'D' | b'*' => SquareType::DoubleWord,
        b't' => SquareType::TripleLetter,
        b'd' => SquareType::DoubleLetter,
        _ => SquareType::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateCode;

    fn tile(letter: char, x: usize, y: usize) -> PlacedTile {
        PlacedTile::new(Tile::new(letter, 1), x, y)
    }

    #[test]
    fn test_standard_layout_counts() {
        let mut counts = std::collections::HashMap::new();
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                *counts.entry(standard_square_type(x, y)).or_insert(0) += 1;
            }
        }
        assert_eq!(counts[&SquareType::TripleWord], 8);
        assert_eq!(counts[&SquareType::DoubleWord], 17);
        assert_eq!(counts[&SquareType::TripleLetter], 12);
        assert_eq!(counts[&SquareType::DoubleLetter], 24);
    }

    #[test]
    fn test_standard_layout_is_symmetric() {
        for y in 0..BOARD_SIZE {
            for x in 0..BOARD_SIZE {
                assert_eq!(standard_square_type(x, y), standard_square_type(y, x));
                assert_eq!(
                    standard_square_type(x, y),
                    standard_square_type(BOARD_SIZE - 1 - x, y)
                );
            }
        }
    }

    #[test]
    fn test_center_square_differs_by_layout() {
        let standard = Board::empty();
        assert_eq!(standard.square_type(CENTER, CENTER), SquareType::DoubleWord);

        let custom = Board::with_template(Some(BoardTemplate::blank()));
        assert_eq!(custom.template().unwrap().code_at(CENTER, CENTER), Some(TemplateCode::Star));
        assert_eq!(custom.square_type(CENTER, CENTER), SquareType::Normal);
    }

    #[test]
    fn test_bounds_checked_access() {
        let board = Board::empty();
        assert!(Board::is_within_bounds(14, 14));
        assert!(!Board::is_within_bounds(15, 0));
        assert!(board.get(20, 3).is_none());
        assert!(!board.is_cell_empty(15, 15));
        assert!(board.is_cell_empty(0, 0));
    }

    #[test]
    fn test_place_tiles_is_pure() {
        let board = Board::empty();
        let next = board.place_tiles(&[tile('A', 7, 7)]).unwrap();
        assert!(board.is_empty());
        assert_eq!(next.get(7, 7).map(|t| t.letter), Some('A'));
        assert_eq!(next.occupied_count(), 1);
    }

    #[test]
    fn test_place_tiles_rejects_bad_cells() {
        let board = Board::empty().place_tiles(&[tile('A', 7, 7)]).unwrap();
        assert_eq!(
            board.place_tiles(&[tile('B', 7, 7)]),
            Err(BoardError::Occupied { x: 7, y: 7 })
        );
        assert_eq!(
            board.place_tiles(&[tile('B', 15, 7)]),
            Err(BoardError::OutOfBounds { x: 15, y: 7 })
        );
    }

    #[test]
    fn test_first_move_word() {
        let placed = vec![tile('C', 6, 7), tile('A', 7, 7), tile('T', 8, 7)];
        let board = Board::empty().place_tiles(&placed).unwrap();
        let words = board.find_formed_words(&placed);

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "CAT");
        assert_eq!((words[0].start_x, words[0].start_y), (6, 7));
        assert!(words[0].is_horizontal());
    }

    #[test]
    fn test_vertical_word_with_cross_word() {
        let existing = vec![tile('C', 6, 7), tile('A', 7, 7), tile('T', 8, 7)];
        let board = Board::empty().place_tiles(&existing).unwrap();

        // Extend down from the T; neither new tile touches anything sideways
        let placed = vec![tile('O', 8, 8), tile('E', 8, 9)];
        let board = board.place_tiles(&placed).unwrap();
        let words = board.find_formed_words(&placed);

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "TOE");
        assert_eq!(words[0].orientation, Orientation::Vertical);
        assert_eq!((words[0].start_x, words[0].start_y), (8, 7));
    }

    #[test]
    fn test_single_tile_forms_perpendicular_word() {
        let existing = vec![tile('A', 7, 7), tile('T', 8, 7)];
        let board = Board::empty().place_tiles(&existing).unwrap();

        // S below A: horizontal run is just S, vertical is AS
        let placed = vec![tile('S', 7, 8)];
        let board = board.place_tiles(&placed).unwrap();
        let words = board.find_formed_words(&placed);

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "AS");
        assert_eq!(words[0].orientation, Orientation::Vertical);
    }

    #[test]
    fn test_parallel_play_forms_cross_words() {
        let existing = vec![tile('A', 7, 7), tile('T', 8, 7)];
        let board = Board::empty().place_tiles(&existing).unwrap();

        let placed = vec![tile('B', 7, 8), tile('E', 8, 8)];
        let board = board.place_tiles(&placed).unwrap();
        let texts: Vec<String> = board
            .find_formed_words(&placed)
            .into_iter()
            .map(|w| w.text)
            .collect();

        assert_eq!(texts, vec!["BE", "AB", "TE"]);
    }

    #[test]
    fn test_lone_tile_forms_nothing() {
        let placed = vec![tile('A', 7, 7)];
        let board = Board::empty().place_tiles(&placed).unwrap();
        assert!(board.find_formed_words(&placed).is_empty());
    }

    #[test]
    fn test_word_at_board_edge() {
        let placed = vec![tile('A', 0, 0), tile('B', 0, 1)];
        let board = Board::empty().place_tiles(&placed).unwrap();
        let words = board.find_formed_words(&placed);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "AB");
        assert_eq!((words[0].start_x, words[0].start_y), (0, 0));
    }

    #[test]
    fn test_orthogonal_neighbor() {
        let board = Board::empty().place_tiles(&[tile('A', 7, 7)]).unwrap();
        assert!(board.has_orthogonal_neighbor(7, 8));
        assert!(board.has_orthogonal_neighbor(6, 7));
        assert!(!board.has_orthogonal_neighbor(8, 8));
        assert!(!board.has_orthogonal_neighbor(0, 0));
    }
}
