//! Construction heuristics producing a first complete solution.
//!
//! Everything here works through the public [`Solution`] API, so tours,
//! events and aggregates stay consistent throughout.

use std::ops::Range;

use tracing::{debug, info};

use crate::error::{PlannerError, Result};
use crate::geometry::{Coord, Orientation, euclidean, orientation};
use crate::solution::Solution;
use crate::tour::Tour;
use crate::traits::{DEPOT, InstanceProvider};

/// Convex hull of `points` by Graham scan, returned as ids in
/// counter-clockwise order starting from the leftmost-lowest point.
///
/// Collinear points on the hull boundary are dropped.
pub fn convex_hull(points: &[(usize, Coord)]) -> Vec<usize> {
    let Some(&pivot) = points
        .iter()
        .min_by(|a, b| a.1.x.total_cmp(&b.1.x).then(a.1.y.total_cmp(&b.1.y)))
    else {
        return Vec::new();
    };

    // Polar angle around the pivot, nearest first on a shared ray.
    let polar = |c: Coord| ((c.y - pivot.1.y).atan2(c.x - pivot.1.x), euclidean(pivot.1, c));
    let mut rest: Vec<(usize, Coord)> = points.iter().copied().filter(|&(id, _)| id != pivot.0).collect();
    rest.sort_by(|a, b| {
        let (angle_a, dist_a) = polar(a.1);
        let (angle_b, dist_b) = polar(b.1);
        angle_a.total_cmp(&angle_b).then(dist_a.total_cmp(&dist_b))
    });

    let mut hull: Vec<(usize, Coord)> = vec![pivot];
    for point in rest {
        while hull.len() >= 2
            && orientation(hull[hull.len() - 2].1, hull[hull.len() - 1].1, point.1) != Orientation::CounterClockwise
        {
            hull.pop();
        }
        hull.push(point);
    }
    hull.into_iter().map(|(id, _)| id).collect()
}

fn assigned_nodes<I: InstanceProvider>(solution: &Solution<'_, I>) -> Vec<bool> {
    let mut assigned = vec![false; solution.n_nodes()];
    for tour in solution.tours() {
        for &node in tour.tour() {
            if let Some(slot) = assigned.get_mut(node) {
                *slot = true;
            }
        }
    }
    assigned
}

fn unassigned_customers(assigned: &[bool]) -> impl Iterator<Item = usize> + '_ {
    (1..assigned.len()).filter(|&node| !assigned[node])
}

/// Peels successive convex hulls off the unassigned customers, one per
/// vehicle, appending each hull to that vehicle's tour.
///
/// Returns the number of nodes placed.
pub fn find_onion_hull<I: InstanceProvider>(solution: &mut Solution<'_, I>) -> Result<usize> {
    let mut assigned = assigned_nodes(solution);
    let mut placed = 0;

    for vehicle in 0..solution.k_vehicles() {
        let candidates = unassigned_customers(&assigned)
            .map(|node| -> Result<(usize, Coord)> { Ok((node, solution.coord(node)?)) })
            .collect::<Result<Vec<_>>>()?;
        if candidates.is_empty() {
            break;
        }

        let hull = convex_hull(&candidates);
        debug!(vehicle, layer = hull.len(), "assigned hull layer");
        for node in hull {
            solution.push_back(vehicle, node)?;
            assigned[node] = true;
            placed += 1;
        }
    }
    Ok(placed)
}

/// Positions where a node may be inserted. Tours that already start and end
/// at the depot only accept interior positions, so they stay closed.
fn insertion_positions(tour: &Tour) -> Range<usize> {
    let nodes = tour.tour();
    let depot_bounded = nodes.len() >= 2 && nodes.first() == Some(&DEPOT) && nodes.last() == Some(&DEPOT);
    if depot_bounded { 1..nodes.len() } else { 0..nodes.len() + 1 }
}

/// Inserts the remaining customers one at a time, always choosing the
/// (node, vehicle, position) with the smallest objective increase.
///
/// Ties keep the first candidate found. Returns the number of nodes placed.
pub fn cheapest_insertion<I: InstanceProvider>(solution: &mut Solution<'_, I>) -> Result<usize> {
    let instance = solution.instance();
    let mut assigned = assigned_nodes(solution);
    let mut placed = 0;

    loop {
        let mut best: Option<(i64, usize, usize, usize)> = None;
        for node in unassigned_customers(&assigned) {
            for (vehicle, tour) in solution.tours().iter().enumerate() {
                for pos in insertion_positions(tour) {
                    let delta = tour.insertion_delta(node, pos, instance)?;
                    if best.is_none_or(|(best_delta, ..)| delta < best_delta) {
                        best = Some((delta, node, vehicle, pos));
                    }
                }
            }
        }

        let Some((delta, node, vehicle, pos)) = best else {
            if unassigned_customers(&assigned).next().is_some() {
                return Err(PlannerError::InvalidInstance(
                    "customers remain but the solution has no vehicles".to_string(),
                ));
            }
            return Ok(placed);
        };

        debug!(node, vehicle, pos, delta, "cheapest insertion");
        solution.insert_node(vehicle, node, pos)?;
        assigned[node] = true;
        placed += 1;
    }
}

/// Inserts the depot at its cheapest position in every tour that does not
/// already visit it. Returns the number of tours changed.
pub fn assign_depot<I: InstanceProvider>(solution: &mut Solution<'_, I>) -> Result<usize> {
    let instance = solution.instance();
    let mut changed = 0;

    for vehicle in 0..solution.k_vehicles() {
        let tour = solution.vehicle(vehicle)?;
        if tour.pos_for_node(DEPOT).is_some() {
            continue;
        }

        let mut best: Option<(i64, usize)> = None;
        for pos in 0..=tour.n_nodes() {
            let delta = tour.insertion_delta(DEPOT, pos, instance)?;
            if best.is_none_or(|(best_delta, _)| delta < best_delta) {
                best = Some((delta, pos));
            }
        }

        let pos = best.map_or(0, |(_, pos)| pos);
        solution.insert_node(vehicle, DEPOT, pos)?;
        changed += 1;
    }
    Ok(changed)
}

/// Rotates every open tour so it starts at the depot, then returns it to
/// the depot. Tours without a depot get one at the front first.
pub fn close_tours<I: InstanceProvider>(solution: &mut Solution<'_, I>) -> Result<usize> {
    let mut closed = 0;

    for vehicle in 0..solution.k_vehicles() {
        if solution.complete_tour(vehicle)? {
            continue;
        }

        match solution.pos_for_node(vehicle, DEPOT)? {
            Some(depot_pos) => {
                for _ in 0..depot_pos {
                    let head = solution.node_at_pos(vehicle, 0)?;
                    solution.pop_front(vehicle)?;
                    solution.push_back(vehicle, head)?;
                }
            }
            None => {
                solution.push_front(vehicle, DEPOT)?;
            }
        }

        solution.push_back(vehicle, DEPOT)?;
        closed += 1;
    }
    Ok(closed)
}

/// Onion hull, depot assignment, closing, then cheapest insertion of the
/// leftover customers inside the closed tours. Every tour is reversed at the
/// end. Aggregation runs once, after the last step.
pub fn build_initial_solution<I: InstanceProvider>(solution: &mut Solution<'_, I>) -> Result<()> {
    let (hull, closed, inserted) = solution.batch(|s| {
        let hull = find_onion_hull(s)?;
        assign_depot(s)?;
        let closed = close_tours(s)?;
        let inserted = cheapest_insertion(s)?;
        for vehicle in 0..s.k_vehicles() {
            s.reverse_tour(vehicle)?;
        }
        Ok((hull, closed, inserted))
    })?;
    solution.refresh()?;

    info!(
        hull_nodes = hull,
        closed,
        inserted,
        total_obj = solution.total_obj(),
        max_distance = solution.max_distance(),
        feasible = solution.is_feasible(),
        "built initial solution"
    );
    Ok(())
}
