/*!
# AlgoCanvas

Step-recording engines behind an educational algorithm visualizer, built in Rust.

## Overview

The application lets a user pick a sorting or pathfinding algorithm, feed it an
array or a grid of walls, and watch it run frame by frame. The engines in this
crate do the actual work: each one replays an algorithm on a private copy of
the input and returns the complete trace of intermediate states. Playback
speed, pausing and restarting are left to whoever consumes the trace; the
engines never need to be invoked twice for the same run.

## Architecture

### Engine Layer
- **Sort trace engine** (`sorting`) - bubble, selection, insertion and quick
  sort, one snapshot per comparison, swap or shift, with highlighted indices,
  a description and the indices already settled
- **Path trace engine** (`pathfinding`) - A*, DFS, BFS and greedy best-first
  over a 4-connected grid, painting `current`, `visited` and `frontier` cells
  for every expansion and the discovered path at the end
- **Grid model** (`cell`, `grid`) - cell states, positions and the board

### Boundary Layer
- Request types mirroring the JSON bodies sent by the front end (`request`)
- Saved visualizations with gzip compression and bincode serialization (`saving`)
- HTTP routes behind the `web` feature (`app`)
- Environment/flag configuration (`config`)

## Determinism

Both engines are pure: the same input always yields the same trace, and the
caller's array or grid is never modified. The pathfinding engine carries a
hard iteration cap of `rows * cols * 2` as a safety valve; hitting it is
reported as "no path" and logged as a warning.

## Modules

- **cell**: Cell states and grid positions
- **grid**: Rectangular board with ASCII parsing/rendering
- **sorting**: Sort trace engine
- **pathfinding**: Path trace engine
- **request**: JSON request bodies and dispatch
- **saving**: Saved-visualization persistence
- **config**: Server configuration
- **error**: Engine error type
*/

pub mod app;
pub mod cell;
pub mod config;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod request;
pub mod saving;
pub mod sorting;

pub use cell::{CellState, Position};
pub use error::EngineError;
pub use grid::Grid;
pub use pathfinding::{PathAlgorithm, PathTrace, run_path, run_path_by_name};
pub use request::{PathRequest, SortRequest};
pub use saving::{SavedVisualization, VisualizationData, VisualizationKind, VisualizationStore};
pub use sorting::{SortAlgorithm, SortTrace, run_sort, run_sort_by_name};
