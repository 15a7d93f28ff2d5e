use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single grid cell as seen by the renderer.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    #[default]
    Empty,
    Wall,
    Start,
    Goal,
    Path,
    Visited,
    Current,
    Frontier,
}

impl CellState {
    /// Start and goal markers are never painted over by a search.
    pub fn is_endpoint(self) -> bool {
        matches!(self, CellState::Start | CellState::Goal)
    }

    pub fn is_wall(self) -> bool {
        matches!(self, CellState::Wall)
    }

    /// Character used by `Grid::parse` and `Grid::render`.
    pub fn symbol(self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Wall => '#',
            CellState::Start => 'S',
            CellState::Goal => 'G',
            CellState::Path => '*',
            CellState::Visited => 'v',
            CellState::Current => 'c',
            CellState::Frontier => 'f',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(CellState::Empty),
            '#' => Some(CellState::Wall),
            'S' => Some(CellState::Start),
            'G' => Some(CellState::Goal),
            '*' => Some(CellState::Path),
            'v' => Some(CellState::Visited),
            'c' => Some(CellState::Current),
            'f' => Some(CellState::Frontier),
            _ => None,
        }
    }
}

/// A 0-indexed grid coordinate.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Position { row, col }
    }

    pub fn offset(self, dr: i32, dc: i32) -> Self {
        Position {
            row: self.row + dr,
            col: self.col + dc,
        }
    }

    pub fn manhattan(self, other: Position) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    pub fn euclidean(self, other: Position) -> f64 {
        let dr = f64::from(self.row - other.row);
        let dc = f64::from(self.col - other.col);
        (dr * dr + dc * dc).sqrt()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
