use serde::{Deserialize, Serialize};

use crate::cell::Position;
use crate::error::{EngineError, Result};
use crate::grid::Grid;
use crate::pathfinding::{PathTrace, run_path};
use crate::sorting::{SortTrace, run_sort};

/// Largest array a sort request may carry.
pub const MAX_ARRAY_LEN: usize = 50;
/// Largest grid a pathfinding request may carry.
pub const MAX_ROWS: usize = 20;
pub const MAX_COLS: usize = 30;

/// Body of a sort request as the front end sends it.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SortRequest {
    pub array: Vec<i32>,
    pub algorithm: String,
}

impl SortRequest {
    /// Runs the request. Arrays longer than [`MAX_ARRAY_LEN`] are rejected.
    pub fn execute(&self) -> Result<SortTrace> {
        let algorithm = self.algorithm.parse()?;
        if self.array.len() > MAX_ARRAY_LEN {
            return Err(EngineError::InputTooLarge(format!(
                "array has {} elements, at most {} allowed",
                self.array.len(),
                MAX_ARRAY_LEN
            )));
        }
        Ok(run_sort(algorithm, &self.array))
    }
}

/// Body of a pathfinding request as the front end sends it.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathRequest {
    pub grid: Grid,
    pub start_position: Position,
    pub goal_position: Position,
    pub algorithm: String,
    pub rows: i64,
    pub cols: i64,
}

impl PathRequest {
    /// Runs the request. Grids beyond [`MAX_ROWS`] x [`MAX_COLS`] are
    /// rejected before any snapshot is recorded.
    pub fn execute(&self) -> Result<PathTrace> {
        let algorithm = self.algorithm.parse()?;
        let rows = dimension("rows", self.rows)?;
        let cols = dimension("cols", self.cols)?;
        let too_large = |name: &str, got: usize, max: usize| {
            EngineError::InputTooLarge(format!("grid has {} {}, at most {} allowed", got, name, max))
        };
        for (got, name) in [(rows, "rows"), (self.grid.rows(), "rows")] {
            if got > MAX_ROWS {
                return Err(too_large(name, got, MAX_ROWS));
            }
        }
        for (got, name) in [(cols, "cols"), (self.grid.cols(), "cols")] {
            if got > MAX_COLS {
                return Err(too_large(name, got, MAX_COLS));
            }
        }
        run_path(
            algorithm,
            &self.grid,
            self.start_position,
            self.goal_position,
            rows,
            cols,
        )
    }
}

fn dimension(name: &str, value: i64) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| EngineError::InvalidGrid(format!("{} must be positive, got {}", name, value)))
}

/// Parses a JSON sort request and runs it.
pub fn sort_from_json(body: &str) -> std::result::Result<SortTrace, Box<dyn std::error::Error>> {
    let request: SortRequest = serde_json::from_str(body)?;
    Ok(request.execute()?)
}

/// Parses a JSON pathfinding request and runs it.
pub fn path_from_json(body: &str) -> std::result::Result<PathTrace, Box<dyn std::error::Error>> {
    let request: PathRequest = serde_json::from_str(body)?;
    Ok(request.execute()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellState;

    #[test]
    fn sort_request_from_json() {
        let trace = sort_from_json(r#"{"array":[5,3,1],"algorithm":"bubble"}"#).unwrap();
        assert_eq!(trace.final_values(), Some(&[1, 3, 5][..]));
    }

    #[test]
    fn unknown_sort_algorithm_is_an_engine_error() {
        let request = SortRequest {
            array: vec![1, 2],
            algorithm: "bogo".to_string(),
        };
        assert_eq!(
            request.execute(),
            Err(EngineError::InvalidAlgorithm("bogo".to_string()))
        );
    }

    #[test]
    fn path_request_uses_wire_field_names() {
        let body = r#"{
            "grid": [["start","empty"],["wall","goal"]],
            "startPosition": {"row": 0, "col": 0},
            "goalPosition": {"row": 1, "col": 1},
            "algorithm": "a-star",
            "rows": 2,
            "cols": 2
        }"#;
        let trace = path_from_json(body).unwrap();
        assert!(trace.path_found);
        let last = trace.final_grid().unwrap();
        assert_eq!(last.get(Position::new(0, 1)), Some(CellState::Path));
        assert_eq!(last.get(Position::new(1, 0)), Some(CellState::Wall));
    }

    fn open_request(rows: usize, cols: usize) -> PathRequest {
        let mut grid = Grid::new(rows, cols);
        grid.set(Position::new(0, 0), CellState::Start);
        grid.set(Position::new(rows as i32 - 1, cols as i32 - 1), CellState::Goal);
        PathRequest {
            grid,
            start_position: Position::new(0, 0),
            goal_position: Position::new(rows as i32 - 1, cols as i32 - 1),
            algorithm: "bfs".to_string(),
            rows: rows as i64,
            cols: cols as i64,
        }
    }

    #[test]
    fn array_length_limit() {
        let mut request = SortRequest {
            array: (0..MAX_ARRAY_LEN as i32).rev().collect(),
            algorithm: "bubble".to_string(),
        };
        assert!(request.execute().is_ok());

        request.array.push(-1);
        assert!(matches!(request.execute(), Err(EngineError::InputTooLarge(_))));
    }

    #[test]
    fn grid_size_limit() {
        assert!(open_request(MAX_ROWS, MAX_COLS).execute().unwrap().path_found);

        for request in [
            open_request(MAX_ROWS + 1, MAX_COLS),
            open_request(MAX_ROWS, MAX_COLS + 1),
            open_request(200, 200),
        ] {
            assert!(matches!(request.execute(), Err(EngineError::InputTooLarge(_))));
        }
    }

    #[test]
    fn grid_limit_checks_the_grid_itself() {
        // Understated dimensions must not let an oversized grid through.
        let mut request = open_request(MAX_ROWS + 5, 3);
        request.rows = 2;
        assert!(matches!(request.execute(), Err(EngineError::InputTooLarge(_))));
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let request = PathRequest {
            grid: Grid::new(1, 1),
            start_position: Position::new(0, 0),
            goal_position: Position::new(0, 0),
            algorithm: "bfs".to_string(),
            rows: -1,
            cols: 1,
        };
        assert!(matches!(request.execute(), Err(EngineError::InvalidGrid(_))));
    }
}
