//! Step-recording sorts.
//!
//! Each algorithm replays a classic comparison sort on a private copy of the
//! input and records one snapshot per comparison, swap or shift, together with
//! the indices being touched, a human-readable description and the indices
//! that are known to be in their final position.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// Sorting algorithms the engine can replay.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortAlgorithm {
    Bubble,
    Selection,
    Insertion,
    Quick,
}

impl SortAlgorithm {
    pub const ALL: [SortAlgorithm; 4] = [
        SortAlgorithm::Bubble,
        SortAlgorithm::Selection,
        SortAlgorithm::Insertion,
        SortAlgorithm::Quick,
    ];

    /// Selector string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            SortAlgorithm::Bubble => "bubble",
            SortAlgorithm::Selection => "selection",
            SortAlgorithm::Insertion => "insertion",
            SortAlgorithm::Quick => "quick",
        }
    }
}

impl FromStr for SortAlgorithm {
    type Err = EngineError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "bubble" => Ok(SortAlgorithm::Bubble),
            "selection" => Ok(SortAlgorithm::Selection),
            "insertion" => Ok(SortAlgorithm::Insertion),
            "quick" => Ok(SortAlgorithm::Quick),
            other => Err(EngineError::InvalidAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for SortAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full record of a sort run, stored as parallel arrays.
///
/// Index `i` of every field describes the same step.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SortTrace {
    /// Snapshot of the array after each step
    pub steps: Vec<Vec<i32>>,
    /// Indices being compared or swapped
    pub highlights: Vec<Vec<usize>>,
    pub descriptions: Vec<String>,
    /// Indices that will not move again
    pub sorted_indices: Vec<Vec<usize>>,
}

/// Borrowed view of one step of a [`SortTrace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortStep<'a> {
    pub values: &'a [i32],
    pub highlight: &'a [usize],
    pub description: &'a str,
    pub settled: &'a [usize],
}

impl SortTrace {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<SortStep<'_>> {
        Some(SortStep {
            values: self.steps.get(index)?,
            highlight: self.highlights.get(index)?,
            description: self.descriptions.get(index)?,
            settled: self.sorted_indices.get(index)?,
        })
    }

    /// Iterates over the steps in playback order.
    pub fn iter(&self) -> impl Iterator<Item = SortStep<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.step(i))
    }

    /// The array as it stands after the last step.
    pub fn final_values(&self) -> Option<&[i32]> {
        self.steps.last().map(Vec::as_slice)
    }
}

/// Replays `algorithm` over a copy of `input`.
pub fn run_sort(algorithm: SortAlgorithm, input: &[i32]) -> SortTrace {
    debug!("running {} sort over {} values", algorithm, input.len());
    let trace = match algorithm {
        SortAlgorithm::Bubble => bubble_sort_steps(input),
        SortAlgorithm::Selection => selection_sort_steps(input),
        SortAlgorithm::Insertion => insertion_sort_steps(input),
        SortAlgorithm::Quick => quick_sort_steps(input),
    };
    debug!("{} sort recorded {} steps", algorithm, trace.len());
    trace
}

/// Like [`run_sort`], but takes the wire selector and rejects unknown names.
pub fn run_sort_by_name(algorithm: &str, input: &[i32]) -> Result<SortTrace> {
    Ok(run_sort(algorithm.parse()?, input))
}

/// Working array plus the trace being written.
struct Recorder {
    arr: Vec<i32>,
    trace: SortTrace,
}

impl Recorder {
    fn new(input: &[i32]) -> Self {
        let mut recorder = Recorder {
            arr: input.to_vec(),
            trace: SortTrace::default(),
        };
        recorder.record(Vec::new(), "Initial array".to_string(), Vec::new());
        recorder
    }

    fn record(&mut self, highlight: Vec<usize>, description: String, settled: Vec<usize>) {
        self.trace.steps.push(self.arr.clone());
        self.trace.highlights.push(highlight);
        self.trace.descriptions.push(description);
        self.trace.sorted_indices.push(settled);
    }

    fn finish(mut self) -> SortTrace {
        let all = (0..self.arr.len()).collect();
        self.record(Vec::new(), "Array fully sorted".to_string(), all);
        self.trace
    }
}

fn prefix(len: usize) -> Vec<usize> {
    (0..len).collect()
}

pub fn bubble_sort_steps(input: &[i32]) -> SortTrace {
    let mut rec = Recorder::new(input);
    let n = rec.arr.len();

    for i in 0..n.saturating_sub(1) {
        // Passes already completed have parked the largest values at the end.
        let settled: Vec<usize> = (0..i).map(|k| n - k - 1).collect();
        for j in 0..n - i - 1 {
            let description = if rec.arr[j] > rec.arr[j + 1] {
                rec.arr.swap(j, j + 1);
                format!("Swapped elements at index {} and {}", j, j + 1)
            } else {
                format!("Compared {} and {}, no swap", rec.arr[j], rec.arr[j + 1])
            };
            rec.record(vec![j, j + 1], description, settled.clone());
        }
    }

    rec.finish()
}

pub fn selection_sort_steps(input: &[i32]) -> SortTrace {
    let mut rec = Recorder::new(input);
    let n = rec.arr.len();

    for i in 0..n.saturating_sub(1) {
        let mut min_index = i;

        for j in i + 1..n {
            rec.record(
                vec![min_index, j],
                format!(
                    "Compared current minimum {} at index {} with {} at index {}",
                    rec.arr[min_index], min_index, rec.arr[j], j
                ),
                prefix(i),
            );
            if rec.arr[j] < rec.arr[min_index] {
                min_index = j;
            }
        }

        if min_index != i {
            rec.arr.swap(i, min_index);
            rec.record(
                vec![i, min_index],
                format!("Swapped index {} with min index {}", i, min_index),
                prefix(i + 1),
            );
        }
    }

    rec.finish()
}

pub fn insertion_sort_steps(input: &[i32]) -> SortTrace {
    let mut rec = Recorder::new(input);
    let n = rec.arr.len();

    for i in 1..n {
        let key = rec.arr[i];
        // `slot` is where the key currently sits; it walks left one swap at a time.
        let mut slot = i;

        while slot > 0 && rec.arr[slot - 1] > key {
            let moved = rec.arr[slot - 1];
            rec.arr.swap(slot - 1, slot);
            rec.record(
                vec![slot - 1, slot],
                format!("Shifted {} right to index {}", moved, slot),
                prefix(i),
            );
            slot -= 1;
        }

        rec.record(
            vec![slot],
            format!("Inserted {} at index {}", key, slot),
            prefix(i + 1),
        );
    }

    rec.finish()
}

pub fn quick_sort_steps(input: &[i32]) -> SortTrace {
    let mut rec = Recorder::new(input);
    let n = rec.arr.len();
    if n > 1 {
        quick_sort_range(&mut rec, 0, n - 1);
    }
    rec.finish()
}

fn quick_sort_range(rec: &mut Recorder, low: usize, high: usize) {
    if low >= high {
        return;
    }
    let pivot_index = partition(rec, low, high);
    if pivot_index > low {
        quick_sort_range(rec, low, pivot_index - 1);
    }
    quick_sort_range(rec, pivot_index + 1, high);
}

/// Lomuto partition of `low..=high` around `arr[high]`.
///
/// Returns the pivot's final index. Quicksort does not track settled indices.
fn partition(rec: &mut Recorder, low: usize, high: usize) -> usize {
    let pivot = rec.arr[high];
    rec.record(
        vec![high],
        format!("Pivot chosen: {} at index {}", pivot, high),
        Vec::new(),
    );

    // Next slot for an element smaller than the pivot.
    let mut store = low;
    for j in low..high {
        rec.record(
            vec![j, high],
            format!("Comparing {} with pivot {}", rec.arr[j], pivot),
            Vec::new(),
        );
        if rec.arr[j] < pivot {
            rec.arr.swap(store, j);
            rec.record(
                vec![store, j],
                format!("Swapped {} and {}", rec.arr[store], rec.arr[j]),
                Vec::new(),
            );
            store += 1;
        }
    }

    rec.arr.swap(store, high);
    rec.record(
        vec![store, high],
        format!("Moved pivot to index {}", store),
        Vec::new(),
    );
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_parallel(trace: &SortTrace) {
        assert_eq!(trace.highlights.len(), trace.steps.len());
        assert_eq!(trace.descriptions.len(), trace.steps.len());
        assert_eq!(trace.sorted_indices.len(), trace.steps.len());
    }

    #[test]
    fn bubble_records_every_comparison() {
        let trace = run_sort(SortAlgorithm::Bubble, &[5, 3, 1]);
        assert_parallel(&trace);
        // initial + 2 + 1 comparisons + final
        assert_eq!(trace.len(), 5);
        assert_eq!(trace.highlights[1], vec![0, 1]);
        assert!(trace.descriptions[1].contains("Swapped"));
        assert_eq!(trace.steps[1], vec![3, 5, 1]);
        assert_eq!(trace.sorted_indices[3], vec![2]);
        assert_eq!(trace.final_values(), Some(&[1, 3, 5][..]));
    }

    #[test]
    fn bubble_reports_no_swap() {
        let trace = run_sort(SortAlgorithm::Bubble, &[1, 2]);
        assert_eq!(trace.descriptions[1], "Compared 1 and 2, no swap");
        assert_eq!(trace.steps[1], vec![1, 2]);
    }

    #[test]
    fn selection_highlights_running_minimum() {
        let trace = run_sort(SortAlgorithm::Selection, &[3, 1, 2]);
        assert_parallel(&trace);
        assert_eq!(trace.highlights[1], vec![0, 1]);
        // index 1 became the minimum, so the next comparison is against it
        assert_eq!(trace.highlights[2], vec![1, 2]);
        assert_eq!(trace.highlights[3], vec![0, 1]);
        assert_eq!(trace.steps[3], vec![1, 3, 2]);
        assert_eq!(trace.sorted_indices[3], vec![0]);
        assert_eq!(trace.final_values(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn selection_skips_swap_when_minimum_in_place() {
        let trace = run_sort(SortAlgorithm::Selection, &[1, 2]);
        // initial + one comparison + final
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn insertion_shifts_then_places_key() {
        let trace = run_sort(SortAlgorithm::Insertion, &[2, 3, 1]);
        assert_parallel(&trace);
        let descriptions: Vec<&str> = trace.descriptions.iter().map(String::as_str).collect();
        assert_eq!(
            descriptions,
            vec![
                "Initial array",
                "Inserted 3 at index 1",
                "Shifted 3 right to index 2",
                "Shifted 2 right to index 1",
                "Inserted 1 at index 0",
                "Array fully sorted",
            ]
        );
        assert_eq!(trace.steps[2], vec![2, 1, 3]);
        assert_eq!(trace.highlights[2], vec![1, 2]);
        assert_eq!(trace.sorted_indices[4], vec![0, 1, 2]);
    }

    #[test]
    fn insertion_snapshots_stay_permutations() {
        let input = [4, 2, 4, 1, 3];
        let mut expected = input.to_vec();
        expected.sort_unstable();
        let trace = run_sort(SortAlgorithm::Insertion, &input);
        for step in &trace.steps {
            let mut values = step.clone();
            values.sort_unstable();
            assert_eq!(values, expected);
        }
    }

    #[test]
    fn quick_leaves_settled_empty_until_the_end() {
        let trace = run_sort(SortAlgorithm::Quick, &[3, 1, 2]);
        assert_parallel(&trace);
        let last = trace.len() - 1;
        assert!(trace.sorted_indices[..last].iter().all(Vec::is_empty));
        assert_eq!(trace.sorted_indices[last], vec![0, 1, 2]);
        assert_eq!(trace.descriptions[1], "Pivot chosen: 2 at index 2");
        assert_eq!(trace.final_values(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn quick_handles_trivial_inputs() {
        for input in [vec![], vec![7]] {
            let trace = run_sort(SortAlgorithm::Quick, &input);
            assert_eq!(trace.steps, vec![input.clone(), input.clone()]);
            assert_eq!(trace.descriptions.last().unwrap(), "Array fully sorted");
        }
    }

    #[test]
    fn unknown_selector_is_rejected() {
        assert_eq!(
            run_sort_by_name("bogo", &[1]),
            Err(EngineError::InvalidAlgorithm("bogo".to_string()))
        );
        assert!(run_sort_by_name("quick", &[1]).is_ok());
    }

    #[test]
    fn serializes_with_wire_names() {
        let trace = run_sort(SortAlgorithm::Bubble, &[1]);
        let json = serde_json::to_value(&trace).unwrap();
        assert!(json.get("sortedIndices").is_some());
        assert!(json.get("highlights").is_some());
    }
}
