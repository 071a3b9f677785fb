//! Multi-vehicle solution: owns one [`Tour`] per vehicle and aggregates their
//! arrival events into a global timeline.
//!
//! After every mutation the solution rebuilds the sorted event list and, for
//! each distinct arrival time, the largest distance between the arriving
//! vehicle and any other moving vehicle. A solution is feasible when no
//! such distance exceeds the coverage radius.

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{PlannerError, Result};
use crate::geometry::{Coord, distance};
use crate::polyline::Polyline;
use crate::tour::{Edge, Tour};
use crate::traits::InstanceProvider;

/// Arrival of `vehicle` at tour position `position` at cumulative time `time`.
///
/// Ordering is by time, then vehicle, then position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Event {
    pub time: u64,
    pub vehicle: usize,
    pub position: usize,
}

pub struct Solution<'a, I: InstanceProvider> {
    instance: &'a I,
    tours: Vec<Tour>,
    radius: u32,
    total_obj: u64,
    events: Vec<Event>,
    distinct_events: Vec<Event>,
    distances: Vec<u32>,
    max_distance: u32,
    feasible: bool,
    auto_aggregate: bool,
    dirty: bool,
}

impl<'a, I: InstanceProvider> Solution<'a, I> {
    pub fn new(instance: &'a I) -> Self {
        Self {
            instance,
            tours: Vec::new(),
            radius: 0,
            total_obj: 0,
            events: Vec::new(),
            distinct_events: Vec::new(),
            distances: Vec::new(),
            max_distance: 0,
            feasible: true,
            auto_aggregate: true,
            dirty: false,
        }
    }

    pub fn instance(&self) -> &'a I {
        self.instance
    }

    // ========================================================================
    // Fleet and configuration
    // ========================================================================

    /// Adds an empty tour and returns the new vehicle count.
    pub fn create_vehicle(&mut self) -> usize {
        self.tours.push(Tour::new());
        self.tours.len()
    }

    /// Removes a vehicle; later vehicle ids shift down by one.
    pub fn remove_vehicle(&mut self, vehicle: usize) -> Result<usize> {
        self.check_vehicle(vehicle)?;
        let tour = self.tours.remove(vehicle);
        self.total_obj -= tour.obj();
        self.touch()?;
        Ok(self.tours.len())
    }

    pub fn set_radius(&mut self, radius: u32) -> u32 {
        self.radius = radius;
        self.feasible = self.max_distance <= radius;
        radius
    }

    // ========================================================================
    // Tour mutators
    // ========================================================================

    pub fn insert_node(&mut self, vehicle: usize, node: usize, pos: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.insert_node(node, pos, instance))
    }

    pub fn remove_node(&mut self, vehicle: usize, pos: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.remove_node(pos, instance))
    }

    pub fn insert_subtour(&mut self, vehicle: usize, block: &[usize], pos_i: usize, pos_e: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.insert_subtour(block, pos_i, pos_e, instance))
    }

    pub fn replace_subtour(&mut self, vehicle: usize, block: &[usize], pos_i: usize, pos_e: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.replace_subtour(block, pos_i, pos_e, instance))
    }

    pub fn remove_subtour(&mut self, vehicle: usize, pos_i: usize, pos_e: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.remove_subtour(pos_i, pos_e, instance))
    }

    pub fn reverse_subtour(&mut self, vehicle: usize, pos_i: usize, pos_e: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.reverse_subtour(pos_i, pos_e, instance))
    }

    pub fn push_back(&mut self, vehicle: usize, node: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.push_back(node, instance))
    }

    pub fn push_front(&mut self, vehicle: usize, node: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.push_front(node, instance))
    }

    pub fn pop_back(&mut self, vehicle: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.pop_back(instance))
    }

    pub fn pop_front(&mut self, vehicle: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.pop_front(instance))
    }

    pub fn reverse_tour(&mut self, vehicle: usize) -> Result<u64> {
        self.mutate(vehicle, |tour, instance| tour.reverse_tour(instance))
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Runs `f` with aggregation deferred, then aggregates once if anything
    /// changed. Nested batches aggregate only when the outermost one ends.
    pub fn batch<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let previous = self.auto_aggregate;
        self.auto_aggregate = false;
        let outcome = f(self);
        self.auto_aggregate = previous;

        if previous && self.dirty {
            self.aggregate()?;
        }
        outcome
    }

    /// Recomputes events, distances and feasibility if a mutation happened
    /// since the last aggregation.
    pub fn refresh(&mut self) -> Result<()> {
        if self.dirty {
            self.aggregate()?;
        }
        Ok(())
    }

    /// Recomputes the global timeline and the per-event distances.
    pub fn aggregate(&mut self) -> Result<()> {
        self.collect_events();
        self.compute_max_distances()?;
        self.dirty = false;

        debug!(
            events = self.events.len(),
            max_distance = self.max_distance,
            radius = self.radius,
            feasible = self.feasible,
            "aggregated solution"
        );
        Ok(())
    }

    /// Gathers every tour's events and sorts them chronologically.
    pub fn collect_events(&mut self) -> usize {
        self.events.clear();
        for (vehicle, tour) in self.tours.iter().enumerate() {
            self.events.extend(tour.events().iter().enumerate().map(|(position, &time)| Event {
                time,
                vehicle,
                position,
            }));
        }
        self.events.sort_unstable();
        self.events.len()
    }

    /// Evaluates the worst inter-vehicle distance at each distinct event time.
    ///
    /// Consecutive events sharing a time are collapsed onto the first one.
    /// Vehicles with fewer than two nodes and the arriving vehicle itself do
    /// not contribute.
    pub fn compute_max_distances(&mut self) -> Result<u32> {
        let distinct: Vec<Event> = self
            .events
            .iter()
            .enumerate()
            .filter(|&(i, event)| i == 0 || self.events[i - 1].time != event.time)
            .map(|(_, event)| *event)
            .collect();

        let tours = &self.tours;
        let instance = self.instance;
        let distances = distinct
            .par_iter()
            .map(|event| event_distance(tours, instance, event))
            .collect::<Result<Vec<u32>>>()?;

        self.max_distance = distances.iter().copied().max().unwrap_or(0);
        self.feasible = self.max_distance <= self.radius;
        self.distinct_events = distinct;
        self.distances = distances;
        Ok(self.max_distance)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ========================================================================
    // Aggregate accessors
    // ========================================================================

    pub fn total_obj(&self) -> u64 {
        self.total_obj
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// First event of each run of equal times, parallel to [`Solution::distances`].
    pub fn distinct_events(&self) -> &[Event] {
        &self.distinct_events
    }

    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    pub fn distances(&self) -> &[u32] {
        &self.distances
    }

    pub fn dist_at_event(&self, index: usize) -> Result<u32> {
        self.distances.get(index).copied().ok_or(PlannerError::EventOutOfRange {
            index,
            count: self.distances.len(),
        })
    }

    pub fn event(&self, index: usize) -> Result<Event> {
        self.events.get(index).copied().ok_or(PlannerError::EventOutOfRange {
            index,
            count: self.events.len(),
        })
    }

    pub fn n_events(&self) -> usize {
        self.events.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.instance.n()
    }

    pub fn k_vehicles(&self) -> usize {
        self.tours.len()
    }

    pub fn r_radius(&self) -> u32 {
        self.radius
    }

    pub fn cost(&self, from: usize, to: usize) -> Result<u32> {
        self.instance.cost(from, to)
    }

    pub fn coord(&self, node: usize) -> Result<Coord> {
        if node >= self.instance.n() {
            return Err(PlannerError::NodeOutOfRange {
                node,
                count: self.instance.n(),
            });
        }
        self.instance.coordinate(node)
    }

    // ========================================================================
    // Per-vehicle read-throughs
    // ========================================================================

    pub fn vehicle(&self, vehicle: usize) -> Result<&Tour> {
        self.tours.get(vehicle).ok_or(PlannerError::VehicleNotFound {
            vehicle,
            count: self.tours.len(),
        })
    }

    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    pub fn tour(&self, vehicle: usize) -> Result<&[usize]> {
        Ok(self.vehicle(vehicle)?.tour())
    }

    pub fn obj_vehicle(&self, vehicle: usize) -> Result<u64> {
        Ok(self.vehicle(vehicle)?.obj())
    }

    pub fn pos_for_node(&self, vehicle: usize, node: usize) -> Result<Option<usize>> {
        Ok(self.vehicle(vehicle)?.pos_for_node(node))
    }

    pub fn node_at_pos(&self, vehicle: usize, pos: usize) -> Result<usize> {
        self.vehicle(vehicle)?.node_at_pos(pos)
    }

    pub fn node_at_event(&self, vehicle: usize, time: u64) -> Result<usize> {
        self.vehicle(vehicle)?
            .node_at_event(time)
            .ok_or(PlannerError::EventNotFound { vehicle, time })
    }

    pub fn complete_tour(&self, vehicle: usize) -> Result<bool> {
        Ok(self.vehicle(vehicle)?.is_complete())
    }

    pub fn vehicle_events(&self, vehicle: usize) -> Result<&[u64]> {
        Ok(self.vehicle(vehicle)?.events())
    }

    pub fn vehicle_n_nodes(&self, vehicle: usize) -> Result<usize> {
        Ok(self.vehicle(vehicle)?.n_nodes())
    }

    pub fn edge(&self, vehicle: usize, i: usize) -> Result<Edge> {
        self.vehicle(vehicle)?.edge(i)
    }

    pub fn edge_at_event(&self, vehicle: usize, time: u64) -> Result<Option<Edge>> {
        Ok(self.vehicle(vehicle)?.edge_at_event(time))
    }

    pub fn event_index(&self, vehicle: usize, time: u64) -> Result<Option<usize>> {
        Ok(self.vehicle(vehicle)?.event_index(time))
    }

    /// Visited coordinates of a vehicle, in tour order.
    pub fn vehicle_polyline(&self, vehicle: usize) -> Result<Polyline> {
        let points = self
            .vehicle(vehicle)?
            .tour()
            .iter()
            .map(|&node| self.instance.coordinate(node))
            .collect::<Result<Vec<Coord>>>()?;
        Ok(Polyline::new(points))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_vehicle(&self, vehicle: usize) -> Result<()> {
        self.vehicle(vehicle).map(|_| ())
    }

    fn mutate<F>(&mut self, vehicle: usize, op: F) -> Result<u64>
    where
        F: FnOnce(&mut Tour, &I) -> Result<i64>,
    {
        self.check_vehicle(vehicle)?;
        let instance = self.instance;
        let delta = op(&mut self.tours[vehicle], instance)?;
        self.total_obj = (self.total_obj as i64 + delta) as u64;
        self.touch()?;
        Ok(self.total_obj)
    }

    fn touch(&mut self) -> Result<()> {
        self.dirty = true;
        if self.auto_aggregate {
            self.aggregate()?;
        }
        Ok(())
    }
}

/// Worst distance between the node visited at `event` and every other
/// vehicle's interpolated position at that instant.
fn event_distance<I>(tours: &[Tour], instance: &I, event: &Event) -> Result<u32>
where
    I: InstanceProvider + ?Sized,
{
    let node = tours[event.vehicle].node_at_pos(event.position)?;
    let visited = instance.coordinate(node)?;

    let mut worst = 0;
    for (vehicle, tour) in tours.iter().enumerate() {
        if vehicle == event.vehicle || tour.n_nodes() < 2 {
            continue;
        }
        if let Some(position) = tour.position_at(event.time, instance)? {
            worst = worst.max(distance(visited, position));
        }
    }
    Ok(worst)
}
