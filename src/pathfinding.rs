//! Step-recording grid searches.
//!
//! Every search runs the same expansion loop: pop a node, paint it
//! `current`, stop if it is the goal, otherwise paint it `visited`, push its
//! neighbours and paint everything still queued as `frontier`. Each paint is
//! a separate snapshot so the renderer can replay the search frame by frame.
//! The strategies only differ in how their [`Frontier`] orders and admits
//! nodes.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::cell::{CellState, Position};
use crate::error::{EngineError, Result};
use crate::grid::Grid;

/// up, down, left, right
const SEARCH_ORDER: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// right, down, left, up
const DFS_ORDER: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Weight applied to the A* heuristic. Makes the search greedier and the
/// heuristic inadmissible, so A* paths are not guaranteed shortest.
const ASTAR_HEURISTIC_WEIGHT: f64 = 2.0;

/// Search strategies the engine can replay.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum PathAlgorithm {
    #[serde(rename = "a-star")]
    AStar,
    #[serde(rename = "dfs")]
    Dfs,
    #[serde(rename = "bfs")]
    Bfs,
    #[serde(rename = "greedy")]
    Greedy,
}

impl PathAlgorithm {
    pub const ALL: [PathAlgorithm; 4] = [
        PathAlgorithm::AStar,
        PathAlgorithm::Dfs,
        PathAlgorithm::Bfs,
        PathAlgorithm::Greedy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PathAlgorithm::AStar => "a-star",
            PathAlgorithm::Dfs => "dfs",
            PathAlgorithm::Bfs => "bfs",
            PathAlgorithm::Greedy => "greedy",
        }
    }
}

impl FromStr for PathAlgorithm {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "a-star" => Ok(PathAlgorithm::AStar),
            "dfs" => Ok(PathAlgorithm::Dfs),
            "bfs" => Ok(PathAlgorithm::Bfs),
            "greedy" => Ok(PathAlgorithm::Greedy),
            other => Err(EngineError::InvalidAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for PathAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshots of a search run and whether it reached the goal.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathTrace {
    pub steps: Vec<Grid>,
    pub path_found: bool,
}

impl PathTrace {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn final_grid(&self) -> Option<&Grid> {
        self.steps.last()
    }

    /// Number of cells painted as path in the final snapshot.
    pub fn path_cells(&self) -> usize {
        self.final_grid().map_or(0, |g| g.count(CellState::Path))
    }
}

/// How a search loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Found,
    Exhausted,
    IterationCap,
}

/// Replays `algorithm` from `start` to `goal` over a copy of `grid`.
///
/// `rows`/`cols` must match the grid. Start and goal must be in bounds and
/// not on a wall.
pub fn run_path(
    algorithm: PathAlgorithm,
    grid: &Grid,
    start: Position,
    goal: Position,
    rows: usize,
    cols: usize,
) -> Result<PathTrace> {
    validate(grid, start, goal, rows, cols)?;
    debug!(
        "running {} search on {}x{} grid from {} to {}",
        algorithm, rows, cols, start, goal
    );

    let (trace, outcome) = match algorithm {
        PathAlgorithm::AStar => search(grid, start, goal, AStarOpenSet::new(start, goal)),
        PathAlgorithm::Greedy => search(grid, start, goal, GreedyOpenSet::new(start, goal)),
        PathAlgorithm::Bfs => search(grid, start, goal, BfsQueue::new(start)),
        PathAlgorithm::Dfs => search(grid, start, goal, DfsStack::new(start)),
    };

    match outcome {
        Outcome::IterationCap => warn!(
            "{} search stopped at the iteration cap ({}) without reaching {}",
            algorithm,
            iteration_cap(rows, cols),
            goal
        ),
        Outcome::Exhausted => debug!("{} search exhausted the grid", algorithm),
        Outcome::Found => {}
    }
    debug!("{} search recorded {} steps", algorithm, trace.len());

    Ok(trace)
}

/// Like [`run_path`], but takes the wire selector and rejects unknown names.
pub fn run_path_by_name(
    algorithm: &str,
    grid: &Grid,
    start: Position,
    goal: Position,
    rows: usize,
    cols: usize,
) -> Result<PathTrace> {
    run_path(algorithm.parse()?, grid, start, goal, rows, cols)
}

fn validate(grid: &Grid, start: Position, goal: Position, rows: usize, cols: usize) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Err(EngineError::InvalidGrid(format!(
            "grid must not be empty, got {}x{}",
            rows, cols
        )));
    }
    if grid.rows() != rows || grid.cols() != cols {
        return Err(EngineError::InvalidGrid(format!(
            "expected {}x{} grid, got {}x{}",
            rows,
            cols,
            grid.rows(),
            grid.cols()
        )));
    }
    for (role, position) in [("start", start), ("goal", goal)] {
        if !grid.contains(position) {
            return Err(EngineError::InvalidPosition {
                role,
                position,
                reason: "out of bounds",
            });
        }
        if grid.is_wall(position) {
            return Err(EngineError::InvalidPosition {
                role,
                position,
                reason: "on a wall",
            });
        }
    }
    Ok(())
}

/// Upper bound on loop iterations for a `rows x cols` grid.
///
/// A safety valve against runaway loops, not a property of the searches:
/// none of them needs more than one pop per grid edge.
pub fn iteration_cap(rows: usize, cols: usize) -> usize {
    rows * cols * 2
}

/// Passable 4-connected neighbours of `pos`, in `order`.
fn neighbors<'a>(
    grid: &'a Grid,
    pos: Position,
    order: &'a [(i32, i32)],
) -> impl Iterator<Item = Position> + 'a {
    order
        .iter()
        .map(move |&(dr, dc)| pos.offset(dr, dc))
        .filter(move |&next| grid.contains(next) && !grid.is_wall(next))
}

/// A queued node and the route that reached it.
#[derive(Debug, Clone)]
struct Entry {
    pos: Position,
    path: Vec<Position>,
}

impl Entry {
    fn root(pos: Position) -> Self {
        Entry {
            pos,
            path: vec![pos],
        }
    }

    fn extend(&self, next: Position) -> Vec<Position> {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend_from_slice(&self.path);
        path.push(next);
        path
    }
}

/// Ordering and admission policy of one search strategy.
trait Frontier {
    fn is_empty(&self) -> bool;

    fn pop(&mut self) -> Option<Entry>;

    /// Queues the neighbours of the node just expanded.
    fn expand(&mut self, grid: &Grid, current: &Entry, closed: &HashSet<Position>);

    /// Every position still queued, duplicates allowed.
    fn positions(&self) -> Vec<Position>;
}

/// A* open set: unique positions ordered by `g + 2h` (Euclidean `h`).
struct AStarOpenSet {
    goal: Position,
    open: Vec<(Entry, f64)>,
    g_score: HashMap<Position, u32>,
}

impl AStarOpenSet {
    fn new(start: Position, goal: Position) -> Self {
        let mut g_score = HashMap::new();
        g_score.insert(start, 0);
        AStarOpenSet {
            goal,
            open: vec![(Entry::root(start), start.euclidean(goal))],
            g_score,
        }
    }
}

impl Frontier for AStarOpenSet {
    fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    fn pop(&mut self) -> Option<Entry> {
        if self.open.is_empty() {
            return None;
        }
        // Stable sort: among equal scores the entry queued first wins.
        self.open.sort_by(|a, b| a.1.total_cmp(&b.1));
        Some(self.open.remove(0).0)
    }

    fn expand(&mut self, grid: &Grid, current: &Entry, closed: &HashSet<Position>) {
        let current_g = self.g_score.get(&current.pos).copied().unwrap_or(0);

        for next in neighbors(grid, current.pos, &SEARCH_ORDER) {
            if closed.contains(&next) {
                continue;
            }
            let tentative = current_g + 1;
            if self.g_score.get(&next).is_some_and(|&g| g <= tentative) {
                continue;
            }
            self.g_score.insert(next, tentative);

            let f_score = f64::from(tentative) + ASTAR_HEURISTIC_WEIGHT * next.euclidean(self.goal);
            let path = current.extend(next);
            match self.open.iter_mut().find(|(entry, _)| entry.pos == next) {
                Some((entry, score)) => {
                    entry.path = path;
                    *score = f_score;
                }
                None => self.open.push((Entry { pos: next, path }, f_score)),
            }
        }
    }

    fn positions(&self) -> Vec<Position> {
        self.open.iter().map(|(entry, _)| entry.pos).collect()
    }
}

/// Greedy best-first open set ordered by Manhattan distance alone.
///
/// Positions may be queued more than once; stale copies are skipped on pop.
struct GreedyOpenSet {
    goal: Position,
    open: Vec<(Entry, i32)>,
}

impl GreedyOpenSet {
    fn new(start: Position, goal: Position) -> Self {
        GreedyOpenSet {
            goal,
            open: vec![(Entry::root(start), 0)],
        }
    }
}

impl Frontier for GreedyOpenSet {
    fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    fn pop(&mut self) -> Option<Entry> {
        if self.open.is_empty() {
            return None;
        }
        self.open.sort_by_key(|(_, h)| *h);
        Some(self.open.remove(0).0)
    }

    fn expand(&mut self, grid: &Grid, current: &Entry, closed: &HashSet<Position>) {
        for next in neighbors(grid, current.pos, &SEARCH_ORDER) {
            if !closed.contains(&next) {
                let entry = Entry {
                    pos: next,
                    path: current.extend(next),
                };
                self.open.push((entry, next.manhattan(self.goal)));
            }
        }
    }

    fn positions(&self) -> Vec<Position> {
        self.open.iter().map(|(entry, _)| entry.pos).collect()
    }
}

/// FIFO queue. Cells count as seen when enqueued, so none is queued twice.
struct BfsQueue {
    queue: VecDeque<Entry>,
    seen: HashSet<Position>,
}

impl BfsQueue {
    fn new(start: Position) -> Self {
        BfsQueue {
            queue: VecDeque::from([Entry::root(start)]),
            seen: HashSet::from([start]),
        }
    }
}

impl Frontier for BfsQueue {
    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn pop(&mut self) -> Option<Entry> {
        self.queue.pop_front()
    }

    fn expand(&mut self, grid: &Grid, current: &Entry, _closed: &HashSet<Position>) {
        for next in neighbors(grid, current.pos, &SEARCH_ORDER) {
            if self.seen.insert(next) {
                self.queue.push_back(Entry {
                    pos: next,
                    path: current.extend(next),
                });
            }
        }
    }

    fn positions(&self) -> Vec<Position> {
        self.queue.iter().map(|entry| entry.pos).collect()
    }
}

/// LIFO stack. Neighbours are pushed in reverse so "right" is explored first.
struct DfsStack {
    stack: Vec<Entry>,
}

impl DfsStack {
    fn new(start: Position) -> Self {
        DfsStack {
            stack: vec![Entry::root(start)],
        }
    }
}

impl Frontier for DfsStack {
    fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    fn pop(&mut self) -> Option<Entry> {
        self.stack.pop()
    }

    fn expand(&mut self, grid: &Grid, current: &Entry, closed: &HashSet<Position>) {
        let ordered: Vec<Position> = neighbors(grid, current.pos, &DFS_ORDER).collect();
        for &next in ordered.iter().rev() {
            if !closed.contains(&next) {
                self.stack.push(Entry {
                    pos: next,
                    path: current.extend(next),
                });
            }
        }
    }

    fn positions(&self) -> Vec<Position> {
        self.stack.iter().map(|entry| entry.pos).collect()
    }
}

/// Accumulates snapshots, each one derived from the previous.
struct Recorder {
    start: Position,
    goal: Position,
    steps: Vec<Grid>,
}

impl Recorder {
    fn new(grid: &Grid, start: Position, goal: Position) -> Self {
        let mut base = grid.clone();
        // Marks left over from an earlier run are not part of the topology.
        for (pos, state) in grid.iter() {
            if matches!(
                state,
                CellState::Path | CellState::Visited | CellState::Current | CellState::Frontier
            ) {
                base.set(pos, CellState::Empty);
            }
        }
        Recorder {
            start,
            goal,
            steps: vec![base],
        }
    }

    fn last(&self) -> &Grid {
        // `new` always records the base snapshot.
        &self.steps[self.steps.len() - 1]
    }

    fn is_endpoint(&self, pos: Position) -> bool {
        pos == self.start
            || pos == self.goal
            || self.last().get(pos).is_some_and(CellState::is_endpoint)
    }

    /// Paints one cell, skipping endpoints entirely (no snapshot).
    fn paint(&mut self, pos: Position, state: CellState) {
        if self.is_endpoint(pos) {
            return;
        }
        let mut next = self.last().clone();
        next.set(pos, state);
        self.steps.push(next);
    }

    /// Paints every queued cell that has not been expanded yet. Always
    /// records a snapshot, even when nothing changes.
    fn paint_frontier(&mut self, queued: &[Position]) {
        let mut next = self.last().clone();
        for &pos in queued {
            if self.is_endpoint(pos) {
                continue;
            }
            if matches!(
                next.get(pos),
                Some(CellState::Current | CellState::Visited | CellState::Wall)
            ) {
                continue;
            }
            next.set(pos, CellState::Frontier);
        }
        self.steps.push(next);
    }

    /// One snapshot per interior cell of `path`, start to goal.
    fn paint_path(&mut self, path: &[Position]) {
        if path.len() < 3 {
            return;
        }
        for &pos in &path[1..path.len() - 1] {
            let mut next = self.last().clone();
            if !self.is_endpoint(pos) {
                next.set(pos, CellState::Path);
            }
            self.steps.push(next);
        }
    }
}

fn search<F: Frontier>(
    grid: &Grid,
    start: Position,
    goal: Position,
    mut frontier: F,
) -> (PathTrace, Outcome) {
    let mut recorder = Recorder::new(grid, start, goal);
    let mut closed: HashSet<Position> = HashSet::new();
    let cap = iteration_cap(grid.rows(), grid.cols());
    let mut iterations = 0;
    let mut outcome = Outcome::Exhausted;
    let mut final_path = Vec::new();

    recorder.paint_frontier(&frontier.positions());

    while !frontier.is_empty() {
        iterations += 1;
        if iterations > cap {
            outcome = Outcome::IterationCap;
            break;
        }

        let Some(current) = frontier.pop() else {
            break;
        };
        if closed.contains(&current.pos) {
            continue;
        }

        recorder.paint(current.pos, CellState::Current);

        if current.pos == goal {
            outcome = Outcome::Found;
            final_path = current.path;
            break;
        }

        closed.insert(current.pos);
        recorder.paint(current.pos, CellState::Visited);

        frontier.expand(grid, &current, &closed);
        recorder.paint_frontier(&frontier.positions());
    }

    if outcome == Outcome::Found {
        recorder.paint_path(&final_path);
    }

    let trace = PathTrace {
        steps: recorder.steps,
        path_found: outcome == Outcome::Found,
    };
    (trace, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(rows: usize, cols: usize) -> Grid {
        let mut grid = Grid::new(rows, cols);
        grid.set(Position::new(0, 0), CellState::Start);
        grid.set(
            Position::new(rows as i32 - 1, cols as i32 - 1),
            CellState::Goal,
        );
        grid
    }

    #[test]
    fn bfs_finds_shortest_path_on_open_grid() {
        let grid = open_grid(3, 3);
        let trace = run_path(
            PathAlgorithm::Bfs,
            &grid,
            Position::new(0, 0),
            Position::new(2, 2),
            3,
            3,
        )
        .unwrap();
        assert!(trace.path_found);
        assert_eq!(trace.path_cells(), 3);
    }

    #[test]
    fn bfs_prefers_up_down_before_left_right() {
        // With up/down explored first, the path hugs column 0 before turning.
        let grid = open_grid(3, 3);
        let trace = run_path(
            PathAlgorithm::Bfs,
            &grid,
            Position::new(0, 0),
            Position::new(2, 2),
            3,
            3,
        )
        .unwrap();
        let last = trace.final_grid().unwrap();
        assert_eq!(last.get(Position::new(1, 0)), Some(CellState::Path));
        assert_eq!(last.get(Position::new(2, 0)), Some(CellState::Path));
        assert_eq!(last.get(Position::new(2, 1)), Some(CellState::Path));
    }

    #[test]
    fn dfs_explores_right_first() {
        let grid = open_grid(3, 3);
        let trace = run_path(
            PathAlgorithm::Dfs,
            &grid,
            Position::new(0, 0),
            Position::new(2, 2),
            3,
            3,
        )
        .unwrap();
        assert!(trace.path_found);
        // base, initial frontier, frontier after expanding the start, then
        // the first popped cell is painted current
        assert_eq!(trace.steps[3].get(Position::new(0, 1)), Some(CellState::Current));
        let last = trace.final_grid().unwrap();
        assert_eq!(last.get(Position::new(0, 1)), Some(CellState::Path));
        assert_eq!(last.get(Position::new(0, 2)), Some(CellState::Path));
        assert_eq!(last.get(Position::new(1, 2)), Some(CellState::Path));
    }

    #[test]
    fn expansion_emits_current_visited_frontier() {
        let grid = Grid::parse("S..G").unwrap();
        let trace = run_path(
            PathAlgorithm::Bfs,
            &grid,
            Position::new(0, 0),
            Position::new(0, 3),
            1,
            4,
        )
        .unwrap();
        let rendered: Vec<String> = trace.steps.iter().map(|g| g.render()).collect();
        assert_eq!(
            rendered,
            vec![
                "S..G\n", // base
                "S..G\n", // initial frontier (only the start)
                "Sf.G\n", // start expanded, no paint for endpoints
                "Sc.G\n",
                "Sv.G\n",
                "SvfG\n",
                "SvcG\n",
                "SvvG\n",
                "SvvG\n", // goal queued, but endpoints are never painted
                "S*vG\n",
                "S**G\n",
            ]
        );
    }

    #[test]
    fn start_equal_to_goal_is_found_immediately() {
        let mut grid = Grid::new(2, 2);
        grid.set(Position::new(1, 1), CellState::Start);
        for algorithm in PathAlgorithm::ALL {
            let trace = run_path(
                algorithm,
                &grid,
                Position::new(1, 1),
                Position::new(1, 1),
                2,
                2,
            )
            .unwrap();
            assert!(trace.path_found);
            for step in &trace.steps {
                assert_eq!(step.count(CellState::Visited), 0);
                assert_eq!(step.count(CellState::Current), 0);
            }
        }
    }

    #[test]
    fn enclosed_goal_is_unreachable() {
        let grid = Grid::parse(
            "
            S....
            ...#.
            ..#G#
            ...#.
            ",
        )
        .unwrap();
        let cap = iteration_cap(4, 5);
        for algorithm in PathAlgorithm::ALL {
            let trace = run_path(
                algorithm,
                &grid,
                Position::new(0, 0),
                Position::new(2, 3),
                4,
                5,
            )
            .unwrap();
            assert!(!trace.path_found, "{} should not reach the goal", algorithm);
            assert!(trace.len() <= 2 + 3 * cap);
            for step in &trace.steps {
                assert_eq!(step.count(CellState::Wall), 4);
            }
        }
    }

    #[test]
    fn astar_weighting_still_reaches_goal() {
        let grid = Grid::parse(
            "
            S.....
            .####.
            .....G
            ",
        )
        .unwrap();
        let trace = run_path(
            PathAlgorithm::AStar,
            &grid,
            Position::new(0, 0),
            Position::new(2, 5),
            3,
            6,
        )
        .unwrap();
        assert!(trace.path_found);
        assert_eq!(trace.path_cells(), 6);
    }

    #[test]
    fn rejects_bad_positions_and_dimensions() {
        let grid = Grid::parse("S#\n.G").unwrap();
        let err = run_path(
            PathAlgorithm::Bfs,
            &grid,
            Position::new(0, 1),
            Position::new(1, 1),
            2,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPosition { role: "start", .. }));

        let err = run_path(
            PathAlgorithm::Bfs,
            &grid,
            Position::new(0, 0),
            Position::new(2, 0),
            2,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPosition { role: "goal", .. }));

        let err = run_path(
            PathAlgorithm::Bfs,
            &grid,
            Position::new(0, 0),
            Position::new(1, 1),
            3,
            2,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidGrid(_)));
    }

    #[test]
    fn leftover_marks_are_cleared() {
        let grid = Grid::parse("S*vG").unwrap();
        let trace = run_path(
            PathAlgorithm::Greedy,
            &grid,
            Position::new(0, 0),
            Position::new(0, 3),
            1,
            4,
        )
        .unwrap();
        assert_eq!(trace.steps[0].render(), "S..G\n");
    }

    #[test]
    fn selector_names_round_trip() {
        for algorithm in PathAlgorithm::ALL {
            assert_eq!(algorithm.as_str().parse::<PathAlgorithm>(), Ok(algorithm));
            let json = serde_json::to_string(&algorithm).unwrap();
            assert_eq!(json, format!("\"{}\"", algorithm.as_str()));
        }
        assert!(matches!(
            "dijkstra".parse::<PathAlgorithm>(),
            Err(EngineError::InvalidAlgorithm(_))
        ));
    }
}
