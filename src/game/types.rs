use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Tile shape, ranked from triangle (lowest) to star (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Triangle,
    Square,
    Circle,
    Star,
}

impl Shape {
    pub const ALL: [Self; 4] = [Self::Triangle, Self::Square, Self::Circle, Self::Star];

    pub fn rank(self) -> usize {
        self as usize
    }

    /// The next shape up the ladder; star stays star.
    pub fn promoted(self) -> Self {
        match self {
            Self::Triangle => Self::Square,
            Self::Square => Self::Circle,
            Self::Circle | Self::Star => Self::Star,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Triangle => "triangle",
            Self::Square => "square",
            Self::Circle => "circle",
            Self::Star => "star",
        }
    }

    /// Single-character code used by board layouts.
    pub fn code(self) -> char {
        match self {
            Self::Triangle => 'T',
            Self::Square => 'S',
            Self::Circle => 'C',
            Self::Star => '*',
        }
    }

    fn from_code(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == c)
    }
}

/// Tile color, ranked from green (lowest) to red (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Green,
    Blue,
    Red,
}

impl Color {
    pub const ALL: [Self; 3] = [Self::Green, Self::Blue, Self::Red];

    pub fn rank(self) -> usize {
        self as usize
    }

    /// The next color up the ladder; red stays red.
    pub fn promoted(self) -> Self {
        match self {
            Self::Green => Self::Blue,
            Self::Blue | Self::Red => Self::Red,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }

    pub fn code(self) -> char {
        match self {
            Self::Green => 'g',
            Self::Blue => 'b',
            Self::Red => 'r',
        }
    }

    fn from_code(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|col| col.code() == c)
    }
}

/// A tile is just its shape and color; two equal tiles are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    pub shape: Shape,
    pub color: Color,
}

impl Tile {
    pub const fn new(shape: Shape, color: Color) -> Self {
        Self { shape, color }
    }

    /// Both shape and color moved one rank up.
    pub fn promoted(self) -> Self {
        Self::new(self.shape.promoted(), self.color.promoted())
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.shape.code(), self.color.code())
    }
}

impl FromStr for Tile {
    type Err = GameError;

    /// Parses the two-character layout code, e.g. `Tg` or `*r`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(sh), Some(co), None) => Shape::from_code(sh).zip(Color::from_code(co)),
            _ => None,
        };
        parsed
            .map(|(shape, color)| Self::new(shape, color))
            .ok_or_else(|| GameError::Layout(format!("bad tile code `{s}`")))
    }
}

/// Board coordinate; row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// True for orthogonal neighbours only.
    pub fn is_adjacent(self, other: Self) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A straight run of three or more identical tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub axis: Axis,
    pub cells: Vec<Pos>,
}

impl Match {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.cells.contains(&pos)
    }
}

/// Classification of everything found in one detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Normal,
    L,
    /// T-shaped intersection; scores with promoted tiles.
    T,
    Five,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Classic,
    Boss,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Classic => "classic",
            Self::Boss => "boss",
        })
    }
}

impl FromStr for GameMode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "boss" => Ok(Self::Boss),
            other => Err(GameError::UnknownMode(other.to_string())),
        }
    }
}

/// Where the session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Running,
    /// Classic run ended by exhausting its moves.
    Finished,
    /// Final boss defeated.
    Won,
    /// Player HP or boss-mode moves ran out.
    Lost,
}
