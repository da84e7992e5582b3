//! Heuristic grid search ("A*" in the rest of the codebase).
//!
//! The frontier is ordered purely by the heuristic distance to the target;
//! no accumulated path cost (g-score) is tracked. Strictly speaking that makes
//! this a greedy best-first search: routes are heuristically short but not
//! guaranteed to be the shortest. On obstacle-free maps of moderate size the
//! Manhattan term dominates and every step moves one cell closer to the
//! target, so the route length there is exactly `manhattan + 1` cells.
//!
//! ```text
//! h(n) = 0.9 * manhattan(n, target) + 0.1 * euclidean(n, target)
//! ```
//!
//! The euclidean term only breaks ties between cells with equal Manhattan
//! distance, steering towards the straight line. Remaining ties are resolved
//! by discovery order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

use gridsim_pose::DiscretePoint;
use tracing::debug;

use crate::error::{FailureReason, PathFindingError};
use crate::map::PassabilityMap;

const MANHATTAN_WEIGHT: f64 = 0.9;
const EUCLIDEAN_WEIGHT: f64 = 0.1;

/// Result of a successful search with metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathSearch {
    /// Cells from start to target inclusive, in travel order.
    pub path: Vec<DiscretePoint>,
    /// The number of nodes popped from the frontier.
    pub nodes_explored: usize,
}

impl PathSearch {
    /// Returns the path, dropping the metadata.
    pub fn into_path(self) -> Vec<DiscretePoint> {
        self.path
    }
}

impl fmt::Display for PathSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PathSearch {{ path_length: {}, nodes_explored: {} }}",
            self.path.len(),
            self.nodes_explored
        )
    }
}

/// Weighted blend of Manhattan and Euclidean distance to `target`.
pub fn heuristic(point: &DiscretePoint, target: &DiscretePoint) -> f64 {
    MANHATTAN_WEIGHT * f64::from(point.manhattan_distance(target))
        + EUCLIDEAN_WEIGHT * point.euclidean_distance(target)
}

/// A discovered cell: its heuristic and the node it was discovered from.
#[derive(Debug, Clone, Copy)]
struct PathFindingPoint {
    point: DiscretePoint,
    parent: Option<usize>,
}

/// Frontier entry. `node` indexes the discovery arena, so it doubles as the
/// discovery sequence number.
#[derive(Copy, Clone, Debug)]
struct State {
    cost: f64,
    node: usize,
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Flipped on both keys: BinaryHeap is a max-heap and we want the
        // lowest cost, then the earliest discovery.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

/// Walks parent links back from `node` and returns the route in travel order.
fn reconstruct_path(nodes: &[PathFindingPoint], node: usize) -> Vec<DiscretePoint> {
    let mut path = Vec::new();
    let mut current = Some(node);
    while let Some(index) = current {
        path.push(nodes[index].point);
        current = nodes[index].parent;
    }
    path.reverse();
    path
}

/// Finds a route from `start` to `target` over the passable cells of `map`.
///
/// # Returns
/// * `Result<Vec<DiscretePoint>, PathFindingError>` - Start to target inclusive
pub fn find_path(
    start: DiscretePoint,
    target: DiscretePoint,
    map: &PassabilityMap,
) -> Result<Vec<DiscretePoint>, PathFindingError> {
    find_path_detailed(start, target, map).map(PathSearch::into_path)
}

/// Finds a route from `start` to `target` and reports how much of the map was explored.
///
/// The target is validated before any node is expanded: an out-of-bounds or
/// impassable target fails with `nodes_explored == 0`. The start cell is not
/// required to be passable.
pub fn find_path_detailed(
    start: DiscretePoint,
    target: DiscretePoint,
    map: &PassabilityMap,
) -> Result<PathSearch, PathFindingError> {
    let failure = |reason: FailureReason, nodes_explored: usize| PathFindingError {
        start,
        target,
        reason,
        nodes_explored,
        passability: map.clone(),
    };

    if !map.in_bounds(&start) || !map.in_bounds(&target) {
        return Err(failure(FailureReason::OutOfBounds, 0));
    }
    if !map.is_passable(&target) {
        return Err(failure(FailureReason::TargetImpassable, 0));
    }

    let mut nodes = vec![PathFindingPoint {
        point: start,
        parent: None,
    }];
    let mut discovered: HashSet<DiscretePoint> = HashSet::from([start]);
    let mut open_set = BinaryHeap::new();
    open_set.push(State {
        cost: heuristic(&start, &target),
        node: 0,
    });

    let mut nodes_explored = 0;
    while let Some(State { node, .. }) = open_set.pop() {
        nodes_explored += 1;
        let current = nodes[node].point;

        if current == target {
            let path = reconstruct_path(&nodes, node);
            debug!(%start, %target, path_length = path.len(), nodes_explored, "Path found");
            return Ok(PathSearch {
                path,
                nodes_explored,
            });
        }

        for neighbor in current.neighbors() {
            if !map.is_passable(&neighbor) || !discovered.insert(neighbor) {
                continue;
            }
            nodes.push(PathFindingPoint {
                point: neighbor,
                parent: Some(node),
            });
            open_set.push(State {
                cost: heuristic(&neighbor, &target),
                node: nodes.len() - 1,
            });
        }
    }

    debug!(%start, %target, nodes_explored, "Frontier exhausted without reaching target");
    Err(failure(FailureReason::Unreachable, nodes_explored))
}
