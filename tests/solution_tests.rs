//! Solution-level behaviour: aggregation, feasibility and error surfaces.

mod fixtures;

use coverage_planner::traits::DEPOT;
use coverage_planner::{MatrixInstance, PlannerError, Solution, TourState};
use rstest::{fixture, rstest};

use fixtures::{planar_instance, ring_instance, solution_from};

/// Depot at the origin, node 1 ten units east, node 2 twenty units north.
#[fixture]
fn triangle() -> MatrixInstance {
    planar_instance(&[(0.0, 0.0), (10.0, 0.0), (0.0, 20.0)], 2, 20)
}

fn loop_and_spur(instance: &MatrixInstance) -> Solution<'_, MatrixInstance> {
    solution_from(instance, &[&[0, 1, 0], &[0, 2]])
}

#[rstest]
fn aggregates_interpolated_distances(triangle: MatrixInstance) {
    let solution = loop_and_spur(&triangle);

    assert_eq!(solution.total_obj(), 40);
    assert_eq!(solution.n_events(), 5);
    // Both vehicles reach time 20; only the first of the pair is evaluated.
    assert_eq!(solution.distinct_events().len(), 3);
    assert_eq!(solution.distances(), &[0, 14, 20]);
    assert_eq!(solution.max_distance(), 20);
}

#[rstest]
#[case(0, false)]
#[case(19, false)]
#[case(20, true)]
#[case(1_000, true)]
fn radius_decides_feasibility(triangle: MatrixInstance, #[case] radius: u32, #[case] feasible: bool) {
    let mut solution = loop_and_spur(&triangle);
    solution.set_radius(radius);
    assert_eq!(solution.is_feasible(), feasible);
}

#[rstest]
#[case::unknown_vehicle(2, 0)]
#[case::past_the_end(0, 3)]
#[case::far_past_the_end(1, 5)]
fn invalid_removal_leaves_solution_untouched(triangle: MatrixInstance, #[case] vehicle: usize, #[case] pos: usize) {
    let mut solution = loop_and_spur(&triangle);
    let events = solution.events().to_vec();

    assert!(solution.remove_node(vehicle, pos).is_err());
    assert_eq!(solution.tour(0).unwrap(), &[0, 1, 0]);
    assert_eq!(solution.tour(1).unwrap(), &[0, 2]);
    assert_eq!(solution.events(), events.as_slice());
    assert_eq!(solution.total_obj(), 40);
}

#[rstest]
fn removing_from_two_node_tour_pops_endpoint(triangle: MatrixInstance) {
    let mut solution = loop_and_spur(&triangle);
    assert_eq!(solution.remove_node(1, 1).unwrap(), 20);
    assert_eq!(solution.tour(1).unwrap(), &[DEPOT]);
}

#[rstest]
fn empty_tour_failures(triangle: MatrixInstance) {
    let mut solution = Solution::new(&triangle);
    solution.create_vehicle();

    assert!(matches!(solution.pop_back(0), Err(PlannerError::EmptyTour)));
    assert!(matches!(solution.pop_front(0), Err(PlannerError::EmptyTour)));
    assert!(matches!(solution.remove_node(0, 0), Err(PlannerError::EmptyTour)));
    assert_eq!(solution.vehicle(0).unwrap().state(), TourState::Empty);
}

#[rstest]
fn event_lookup(triangle: MatrixInstance) {
    let solution = loop_and_spur(&triangle);

    assert_eq!(solution.node_at_event(0, 10).unwrap(), 1);
    assert_eq!(solution.node_at_event(1, 20).unwrap(), 2);
    assert!(matches!(
        solution.node_at_event(1, 10),
        Err(PlannerError::EventNotFound { vehicle: 1, time: 10 })
    ));
    assert!(matches!(
        solution.event(5),
        Err(PlannerError::EventOutOfRange { index: 5, count: 5 })
    ));

    let edge = solution.edge_at_event(1, 10).unwrap().expect("vehicle 1 is moving");
    assert_eq!((edge.from, edge.to), (0, 2));
    assert!(solution.edge_at_event(1, 25).unwrap().is_none());
}

#[rstest]
fn batch_aggregates_once_at_the_end(triangle: MatrixInstance) {
    let mut solution = loop_and_spur(&triangle);

    solution
        .batch(|s| {
            s.pop_back(0)?;
            s.push_back(1, DEPOT)?;
            assert!(s.is_dirty());
            Ok(())
        })
        .unwrap();

    assert!(!solution.is_dirty());
    assert_eq!(solution.tour(0).unwrap(), &[0, 1]);
    assert_eq!(solution.tour(1).unwrap(), &[0, 2, 0]);
    assert_eq!(solution.n_events(), 5);
    assert!(solution.complete_tour(1).unwrap());
    assert!(!solution.complete_tour(0).unwrap());
}

#[rstest]
fn failed_batch_still_refreshes(triangle: MatrixInstance) {
    let mut solution = loop_and_spur(&triangle);

    let outcome = solution.batch(|s| {
        s.push_back(0, 2)?;
        s.push_back(0, 99)
    });

    assert!(matches!(outcome, Err(PlannerError::NodeOutOfRange { node: 99, .. })));
    assert!(!solution.is_dirty());
    assert_eq!(solution.tour(0).unwrap(), &[0, 1, 0, 2]);
    assert_eq!(solution.n_events(), 6);
}

#[rstest]
#[case(4, 2)]
#[case(7, 3)]
#[case(12, 4)]
fn ring_round_trip_keeps_aggregates(#[case] customers: usize, #[case] vehicles: usize) {
    let instance = ring_instance(customers, 50.0, vehicles, 100);
    let mut sequences: Vec<Vec<usize>> = vec![vec![DEPOT]; vehicles];
    for node in 1..=customers {
        sequences[node % vehicles].push(node);
    }
    for sequence in &mut sequences {
        sequence.push(DEPOT);
    }
    let refs: Vec<&[usize]> = sequences.iter().map(Vec::as_slice).collect();
    let mut solution = solution_from(&instance, &refs);

    let events = solution.events().to_vec();
    let distances = solution.distances().to_vec();
    let total = solution.total_obj();

    solution.insert_node(0, customers, 1).unwrap();
    solution.remove_node(0, 1).unwrap();

    assert_eq!(solution.events(), events.as_slice());
    assert_eq!(solution.distances(), distances.as_slice());
    assert_eq!(solution.total_obj(), total);
}
