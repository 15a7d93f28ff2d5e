use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cell::{CellState, Position};
use crate::error::EngineError;

/// A rectangular board of cell states.
///
/// Cells are stored row-major in one vector. On the wire a grid is a nested
/// `CellState[][]`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(
    into = "Vec<Vec<CellState>>",
    try_from = "Vec<Vec<CellState>>"
)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
}

impl Grid {
    /// Creates a grid with every cell empty.
    pub fn new(rows: usize, cols: usize) -> Self {
        Grid {
            rows,
            cols,
            cells: vec![CellState::Empty; rows * cols],
        }
    }

    /// Builds a grid from nested rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<CellState>>) -> Result<Self, EngineError> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        let mut cells = Vec::with_capacity(row_count * col_count);

        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != col_count {
                return Err(EngineError::InvalidGrid(format!(
                    "row {} has {} cells, expected {}",
                    r,
                    row.len(),
                    col_count
                )));
            }
            cells.extend(row);
        }

        Ok(Grid {
            rows: row_count,
            cols: col_count,
            cells,
        })
    }

    /// Parses an ASCII layout, one line per row.
    ///
    /// `.` empty, `#` wall, `S` start, `G` goal. Blank lines and surrounding
    /// whitespace are ignored.
    pub fn parse(layout: &str) -> Result<Self, EngineError> {
        let mut rows = Vec::new();
        for (r, line) in layout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .enumerate()
        {
            let row = line
                .chars()
                .enumerate()
                .map(|(c, ch)| {
                    CellState::from_symbol(ch).ok_or_else(|| {
                        EngineError::InvalidGrid(format!(
                            "unknown symbol '{}' at row {}, col {}",
                            ch, r, c
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.rows
            && (pos.col as usize) < self.cols
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.row as usize * self.cols + pos.col as usize)
        } else {
            None
        }
    }

    /// Returns the state at `pos`, or `None` when out of bounds.
    pub fn get(&self, pos: Position) -> Option<CellState> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Overwrites the state at `pos`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, pos: Position, state: CellState) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = state;
        }
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(CellState::is_wall)
    }

    /// Number of cells currently in `state`.
    pub fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|&&c| c == state).count()
    }

    /// First cell holding `state`, scanning row-major.
    pub fn find(&self, state: CellState) -> Option<Position> {
        self.cells
            .iter()
            .position(|&c| c == state)
            .map(|i| Position::new((i / self.cols) as i32, (i % self.cols) as i32))
    }

    /// Iterates over `(position, state)` pairs row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellState)> + '_ {
        self.cells.iter().enumerate().map(move |(i, &state)| {
            (
                Position::new((i / self.cols) as i32, (i % self.cols) as i32),
                state,
            )
        })
    }

    pub fn to_rows(&self) -> Vec<Vec<CellState>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells.chunks(self.cols).map(<[CellState]>::to_vec).collect()
    }

    /// Renders the grid with the same symbols `parse` accepts.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in self.to_rows() {
            out.extend(row.into_iter().map(CellState::symbol));
            out.push('\n');
        }
        out
    }
}

impl From<Grid> for Vec<Vec<CellState>> {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

impl TryFrom<Vec<Vec<CellState>>> for Grid {
    type Error = EngineError;

    fn try_from(rows: Vec<Vec<CellState>>) -> Result<Self, Self::Error> {
        Grid::from_rows(rows)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
