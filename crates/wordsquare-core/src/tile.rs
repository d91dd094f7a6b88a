//! Letter tiles and per-language tile distributions.
//!
//! This module contains:
//! - The immutable `Tile` value and its on-board form `PlacedTile`
//! - `TileDistribution` tables (letters, point values, counts)

use serde::{Deserialize, Serialize};

/// Letter carried by a blank tile until it is played
pub const BLANK_LETTER: char = '*';

/// A single letter tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    /// Uppercase letter, or `*` for an unplayed blank
    pub letter: char,
    /// Point value (always 0 for a blank)
    pub points: u32,
    /// Whether this is a blank tile
    pub is_blank: bool,
}

impl Tile {
    /// Create a regular letter tile
    pub fn new(letter: char, points: u32) -> Self {
        Self {
            letter: letter.to_ascii_uppercase(),
            points,
            is_blank: false,
        }
    }

    /// Create an unplayed blank tile
    pub fn blank() -> Self {
        Self {
            letter: BLANK_LETTER,
            points: 0,
            is_blank: true,
        }
    }

    /// A blank tile standing in for `letter`
    pub fn blank_as(letter: char) -> Self {
        Self {
            letter: letter.to_ascii_uppercase(),
            points: 0,
            is_blank: true,
        }
    }
}

/// A tile together with the board cell it is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedTile {
    pub tile: Tile,
    pub x: usize,
    pub y: usize,
}

impl PlacedTile {
    pub fn new(tile: Tile, x: usize, y: usize) -> Self {
        Self { tile, x, y }
    }

    pub fn letter(&self) -> char {
        self.tile.letter
    }

    pub fn points(&self) -> u32 {
        self.tile.points
    }
}

/// One row of a distribution table: letter, point value, count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterEntry {
    pub letter: char,
    pub points: u32,
    pub count: u32,
}

const fn entry(letter: char, points: u32, count: u32) -> LetterEntry {
    LetterEntry {
        letter,
        points,
        count,
    }
}

const ENGLISH: &[LetterEntry] = &[
    entry('A', 1, 9),
    entry('B', 3, 2),
    entry('C', 3, 2),
    entry('D', 2, 4),
    entry('E', 1, 12),
    entry('F', 4, 2),
    entry('G', 2, 3),
    entry('H', 4, 2),
    entry('I', 1, 9),
    entry('J', 8, 1),
    entry('K', 5, 1),
    entry('L', 1, 4),
    entry('M', 3, 2),
    entry('N', 1, 6),
    entry('O', 1, 8),
    entry('P', 3, 2),
    entry('Q', 10, 1),
    entry('R', 1, 6),
    entry('S', 1, 4),
    entry('T', 1, 6),
    entry('U', 1, 4),
    entry('V', 4, 2),
    entry('W', 4, 2),
    entry('X', 8, 1),
    entry('Y', 4, 2),
    entry('Z', 10, 1),
];

const DUTCH: &[LetterEntry] = &[
    entry('A', 1, 6),
    entry('B', 3, 2),
    entry('C', 5, 2),
    entry('D', 2, 5),
    entry('E', 1, 18),
    entry('F', 4, 2),
    entry('G', 3, 3),
    entry('H', 4, 2),
    entry('I', 1, 4),
    entry('J', 4, 2),
    entry('K', 3, 3),
    entry('L', 3, 3),
    entry('M', 3, 3),
    entry('N', 1, 10),
    entry('O', 1, 6),
    entry('P', 3, 2),
    entry('Q', 10, 1),
    entry('R', 2, 5),
    entry('S', 2, 5),
    entry('T', 2, 5),
    entry('U', 4, 3),
    entry('V', 4, 2),
    entry('W', 5, 2),
    entry('X', 8, 1),
    entry('Y', 8, 1),
    entry('Z', 4, 2),
];

/// Letters, point values and counts for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDistribution {
    /// Language code (`en`, `nl`)
    pub language: &'static str,
    letters: &'static [LetterEntry],
    blanks: u32,
}

impl TileDistribution {
    /// Languages with a built-in distribution
    pub const LANGUAGES: [&'static str; 2] = ["en", "nl"];

    /// Look up the distribution for a language code
    pub fn for_language(language: &str) -> Option<Self> {
        match language.to_ascii_lowercase().as_str() {
            "en" => Some(Self {
                language: "en",
                letters: ENGLISH,
                blanks: 2,
            }),
            "nl" => Some(Self {
                language: "nl",
                letters: DUTCH,
                blanks: 2,
            }),
            _ => None,
        }
    }

    /// Letter rows of the table (blanks excluded)
    pub fn letters(&self) -> &'static [LetterEntry] {
        self.letters
    }

    /// Number of blank tiles in the set
    pub fn blank_count(&self) -> u32 {
        self.blanks
    }

    /// Point value of a letter, 0 if it is not part of this language
    pub fn points_for(&self, letter: char) -> u32 {
        let upper = letter.to_ascii_uppercase();
        self.letters
            .iter()
            .find(|s| s.letter == upper)
            .map(|s| s.points)
            .unwrap_or(0)
    }

    /// Total number of tiles in the set, blanks included
    pub fn total_tiles(&self) -> usize {
        let letters: u32 = self.letters.iter().map(|s| s.count).sum();
        (letters + self.blanks) as usize
    }

    /// Every non-blank tile of the set, in table order
    pub fn letter_tiles(&self) -> Vec<Tile> {
        self.letters
            .iter()
            .flat_map(|s| std::iter::repeat(Tile::new(s.letter, s.points)).take(s.count as usize))
            .collect()
    }
}
