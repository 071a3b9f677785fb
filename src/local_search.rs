//! Local search over the event-distance metric.
//!
//! Every move goes through the [`Solution`] mutators, is evaluated on the
//! re-aggregated distances and is undone with its exact inverse when it does
//! not strictly improve the metric. Drivers use first improvement and restart
//! their scan after each accepted move, bounded by an iteration budget.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{PlannerError, Result};
use crate::solution::Solution;
use crate::traits::{DEPOT, InstanceProvider};

/// How the per-event distances are folded into a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Sum of all event distances.
    #[default]
    Sum,
    /// Worst event distance.
    Max,
}

impl DistanceMetric {
    pub fn evaluate(self, distances: &[u32]) -> u64 {
        match self {
            DistanceMetric::Sum => distances.iter().map(|&d| u64::from(d)).sum(),
            DistanceMetric::Max => distances.iter().copied().max().map_or(0, u64::from),
        }
    }
}

/// Outcome of one driver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    pub driver: String,
    pub initial_metric: u64,
    pub final_metric: u64,
    pub accepted_moves: usize,
    pub passes: usize,
    /// The budget ran out while moves were still being accepted.
    pub budget_exhausted: bool,
}

impl SearchReport {
    fn start(driver: &str, initial_metric: u64) -> Self {
        Self {
            driver: driver.to_string(),
            initial_metric,
            final_metric: initial_metric,
            accepted_moves: 0,
            passes: 0,
            budget_exhausted: false,
        }
    }

    fn finish(mut self, final_metric: u64, budget_exhausted: bool) -> Self {
        self.final_metric = final_metric;
        self.budget_exhausted = budget_exhausted;
        if budget_exhausted {
            warn!(driver = %self.driver, passes = self.passes, "search budget exhausted before convergence");
        }
        info!(
            driver = %self.driver,
            initial = self.initial_metric,
            last = self.final_metric,
            accepted = self.accepted_moves,
            passes = self.passes,
            "local search finished"
        );
        self
    }
}

fn current_metric<I: InstanceProvider>(solution: &mut Solution<'_, I>, metric: DistanceMetric) -> Result<u64> {
    solution.refresh()?;
    Ok(metric.evaluate(solution.distances()))
}

// ============================================================================
// Move primitives
// ============================================================================

/// Moves the node at `from_pos` of vehicle `from` to position `to_pos` of
/// vehicle `to` and keeps the move only if the metric strictly improves.
///
/// A rejected move is undone by removing the node from `to` and re-inserting
/// it into `from`, which restores both tours exactly.
pub fn relocate_and_evaluate<I: InstanceProvider>(
    solution: &mut Solution<'_, I>,
    from: usize,
    from_pos: usize,
    to: usize,
    to_pos: usize,
    metric: DistanceMetric,
) -> Result<bool> {
    if from == to {
        return Err(PlannerError::InvalidMove(format!(
            "relocation needs two distinct vehicles, got {} twice",
            from
        )));
    }
    let node = solution.node_at_pos(from, from_pos)?;
    let to_len = solution.vehicle_n_nodes(to)?;
    if to_pos > to_len {
        return Err(PlannerError::PositionOutOfRange { pos: to_pos, len: to_len });
    }

    let before = current_metric(solution, metric)?;
    solution.batch(|s| {
        s.remove_node(from, from_pos)?;
        s.insert_node(to, node, to_pos)
    })?;
    let after = current_metric(solution, metric)?;

    if after < before {
        debug!(node, from, from_pos, to, to_pos, before, after, "accepted relocation");
        return Ok(true);
    }

    solution.batch(|s| {
        s.remove_node(to, to_pos)?;
        s.insert_node(from, node, from_pos)
    })?;
    solution.refresh()?;
    Ok(false)
}

/// Reverses positions `pos_i..=pos_e` of `vehicle` and keeps the reversal
/// only if the metric strictly improves.
pub fn reverse_and_evaluate<I: InstanceProvider>(
    solution: &mut Solution<'_, I>,
    vehicle: usize,
    pos_i: usize,
    pos_e: usize,
    metric: DistanceMetric,
) -> Result<bool> {
    let before = current_metric(solution, metric)?;
    solution.reverse_subtour(vehicle, pos_i, pos_e)?;
    let after = current_metric(solution, metric)?;

    if after < before {
        debug!(vehicle, pos_i, pos_e, before, after, "accepted reversal");
        return Ok(true);
    }

    solution.reverse_subtour(vehicle, pos_i, pos_e)?;
    solution.refresh()?;
    Ok(false)
}

// ============================================================================
// Drivers
// ============================================================================

/// Event-driven relocation.
///
/// For each event of the global timeline, tries to move the visited node into
/// every other vehicle, at the head of the edge that vehicle is traversing at
/// that time. Events sharing a time are all scanned, not only the one that
/// carries the aggregated distance. Depot visits and tour endpoints are never
/// moved.
pub fn minimize_event_distance<I: InstanceProvider>(
    solution: &mut Solution<'_, I>,
    metric: DistanceMetric,
    budget: usize,
) -> Result<SearchReport> {
    let mut report = SearchReport::start("event_relocation", current_metric(solution, metric)?);
    let mut remaining = budget;
    let mut improved = true;

    while improved && remaining > 0 {
        improved = false;
        remaining -= 1;
        report.passes += 1;

        'scan: for index in 0..solution.events().len() {
            let event = solution.events()[index];
            let source = solution.vehicle(event.vehicle)?;
            let interior = event.position > 0 && event.position + 1 < source.n_nodes();
            if !interior || source.tour()[event.position] == DEPOT {
                continue;
            }

            for target in 0..solution.k_vehicles() {
                if target == event.vehicle {
                    continue;
                }
                let Some(edge) = solution.edge_at_event(target, event.time)? else {
                    continue;
                };
                if relocate_and_evaluate(solution, event.vehicle, event.position, target, edge.to_pos, metric)? {
                    report.accepted_moves += 1;
                    improved = true;
                    break 'scan;
                }
            }
        }
    }

    let final_metric = current_metric(solution, metric)?;
    Ok(report.finish(final_metric, improved))
}

/// Exhaustive relocation over every (vehicle pair, interior position pair).
pub fn minimize_event_distance_exhaustive<I: InstanceProvider>(
    solution: &mut Solution<'_, I>,
    metric: DistanceMetric,
    budget: usize,
) -> Result<SearchReport> {
    let mut report = SearchReport::start("exhaustive_relocation", current_metric(solution, metric)?);
    let mut remaining = budget;
    let mut improved = true;

    while improved && remaining > 0 {
        improved = false;
        remaining -= 1;
        report.passes += 1;

        'scan: for from in 0..solution.k_vehicles() {
            for to in 0..solution.k_vehicles() {
                if from == to {
                    continue;
                }
                let from_len = solution.vehicle_n_nodes(from)?;
                let to_len = solution.vehicle_n_nodes(to)?;

                for from_pos in 1..from_len.saturating_sub(1) {
                    for to_pos in 1..to_len {
                        if relocate_and_evaluate(solution, from, from_pos, to, to_pos, metric)? {
                            report.accepted_moves += 1;
                            improved = true;
                            break 'scan;
                        }
                    }
                }
            }
        }
    }

    let final_metric = current_metric(solution, metric)?;
    Ok(report.finish(final_metric, improved))
}

/// Intra-route reversal of every interior segment of every tour.
pub fn minimize_by_reversal<I: InstanceProvider>(
    solution: &mut Solution<'_, I>,
    metric: DistanceMetric,
    budget: usize,
) -> Result<SearchReport> {
    let mut report = SearchReport::start("reversal", current_metric(solution, metric)?);
    let mut remaining = budget;
    let mut improved = true;

    while improved && remaining > 0 {
        improved = false;
        remaining -= 1;
        report.passes += 1;

        'scan: for vehicle in 0..solution.k_vehicles() {
            let len = solution.vehicle_n_nodes(vehicle)?;
            for pos_i in 1..len.saturating_sub(1) {
                for pos_e in pos_i + 1..len - 1 {
                    if reverse_and_evaluate(solution, vehicle, pos_i, pos_e, metric)? {
                        report.accepted_moves += 1;
                        improved = true;
                        break 'scan;
                    }
                }
            }
        }
    }

    let final_metric = current_metric(solution, metric)?;
    Ok(report.finish(final_metric, improved))
}
