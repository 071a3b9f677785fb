//! End-to-end planner: construction followed by local search.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::construction::build_initial_solution;
use crate::error::Result;
use crate::local_search::{
    DistanceMetric, SearchReport, minimize_by_reversal, minimize_event_distance,
    minimize_event_distance_exhaustive,
};
use crate::polyline::Polyline;
use crate::solution::Solution;
use crate::traits::InstanceProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    /// How per-event distances are scored during local search.
    pub metric: DistanceMetric,
    /// Maximum passes of the event-driven relocation.
    pub event_search_budget: usize,
    /// Maximum passes of the exhaustive relocation.
    pub exhaustive_search_budget: usize,
    /// Maximum passes of the reversal search.
    pub reversal_budget: usize,
    pub run_event_search: bool,
    pub run_exhaustive_search: bool,
    pub run_reversal_search: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Sum,
            event_search_budget: 100,
            exhaustive_search_budget: 1000,
            reversal_budget: 100,
            run_event_search: true,
            run_exhaustive_search: true,
            run_reversal_search: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub vehicle: usize,
    pub nodes: Vec<usize>,
    pub events: Vec<u64>,
    pub objective: u64,
    pub closed: bool,
    pub path: Polyline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerResult {
    pub routes: Vec<RouteResult>,
    pub total_objective: u64,
    pub max_distance: u32,
    pub radius: u32,
    pub feasible: bool,
    pub reports: Vec<SearchReport>,
}

impl PlannerResult {
    /// Snapshots a solution, aggregating it first if it is dirty.
    pub fn from_solution<I: InstanceProvider>(
        solution: &mut Solution<'_, I>,
        reports: Vec<SearchReport>,
    ) -> Result<Self> {
        solution.refresh()?;

        let routes = (0..solution.k_vehicles())
            .map(|vehicle| -> Result<RouteResult> {
                let tour = solution.vehicle(vehicle)?;
                Ok(RouteResult {
                    vehicle,
                    nodes: tour.tour().to_vec(),
                    events: tour.events().to_vec(),
                    objective: tour.obj(),
                    closed: tour.is_complete(),
                    path: solution.vehicle_polyline(vehicle)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            routes,
            total_objective: solution.total_obj(),
            max_distance: solution.max_distance(),
            radius: solution.r_radius(),
            feasible: solution.is_feasible(),
            reports,
        })
    }
}

impl<I: InstanceProvider> Solution<'_, I> {
    /// Result snapshot of a hand-built solution, without search reports.
    pub fn to_result(&mut self) -> Result<PlannerResult> {
        PlannerResult::from_solution(self, Vec::new())
    }
}

/// Builds and improves a plan with one tour per vehicle of `instance`.
pub fn solve<I: InstanceProvider>(instance: &I, options: &SolveOptions) -> Result<PlannerResult> {
    info!(
        nodes = instance.n(),
        vehicles = instance.k(),
        radius = instance.r(),
        "solving coverage plan"
    );

    let mut solution = Solution::new(instance);
    for _ in 0..instance.k() {
        solution.create_vehicle();
    }
    solution.set_radius(instance.r());

    build_initial_solution(&mut solution)?;

    // Local search improvement phase
    let mut reports = Vec::new();
    if options.run_event_search {
        reports.push(minimize_event_distance(
            &mut solution,
            options.metric,
            options.event_search_budget,
        )?);
    }
    if options.run_exhaustive_search {
        reports.push(minimize_event_distance_exhaustive(
            &mut solution,
            options.metric,
            options.exhaustive_search_budget,
        )?);
    }
    if options.run_reversal_search {
        reports.push(minimize_by_reversal(
            &mut solution,
            options.metric,
            options.reversal_budget,
        )?);
    }

    let result = PlannerResult::from_solution(&mut solution, reports)?;
    info!(
        total_objective = result.total_objective,
        max_distance = result.max_distance,
        feasible = result.feasible,
        "solve finished"
    );
    Ok(result)
}
