mod fixtures;

use std::fs;

use coverage_planner::MatrixInstance;
use coverage_planner::export::{save_json, save_solution};
use coverage_planner::solver::{PlannerResult, SolveOptions, solve};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use fixtures::{planar_instance, solution_from};

#[fixture]
fn workdir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

#[fixture]
fn square() -> MatrixInstance {
    planar_instance(&[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)], 2, 10)
}

#[rstest]
fn saves_points_and_tours(workdir: TempDir, square: MatrixInstance) {
    let solution = solution_from(&square, &[&[0, 1, 2, 0], &[0, 3, 0]]);
    let points = workdir.path().join("points.txt");
    let tours = workdir.path().join("tours.txt");

    save_solution(&solution, &points, &tours).unwrap();

    assert_eq!(fs::read_to_string(&points).unwrap(), "0 0\n4 0\n4 3\n0 3\n");
    assert_eq!(
        fs::read_to_string(&tours).unwrap(),
        "0 0\n4 0\n4 3\n0 0\n\n\n0 0\n0 3\n0 0\n\n\n"
    );
}

#[rstest]
fn method_form_matches_free_function(workdir: TempDir, square: MatrixInstance) {
    let solution = solution_from(&square, &[&[0, 2, 0]]);
    let (p1, t1) = (workdir.path().join("p1"), workdir.path().join("t1"));
    let (p2, t2) = (workdir.path().join("p2"), workdir.path().join("t2"));

    save_solution(&solution, &p1, &t1).unwrap();
    solution.save_solution(&p2, &t2).unwrap();

    assert_eq!(fs::read(&p1).unwrap(), fs::read(&p2).unwrap());
    assert_eq!(fs::read(&t1).unwrap(), fs::read(&t2).unwrap());
}

#[rstest]
fn missing_directory_is_an_io_error(workdir: TempDir, square: MatrixInstance) {
    let solution = solution_from(&square, &[&[0, 1, 0]]);
    let missing = workdir.path().join("nope").join("points.txt");

    let err = save_solution(&solution, &missing, workdir.path().join("tours.txt")).unwrap_err();
    assert!(matches!(err, coverage_planner::PlannerError::Io(_)));
}

#[rstest]
fn json_result_round_trips(workdir: TempDir, square: MatrixInstance) {
    let result = solve(&square, &SolveOptions::default()).unwrap();
    let path = workdir.path().join("result.json");

    save_json(&result, &path).unwrap();

    let loaded: PlannerResult = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(loaded, result);
}

#[rstest]
fn loads_instance_files(workdir: TempDir) {
    let instance_path = workdir.path().join("instance.txt");
    let dist_path = workdir.path().join("dist.txt");
    fs::write(&instance_path, "# demo\n1 2 7\n0 0\n3 4\n6 8\n").unwrap();
    fs::write(&dist_path, "3 3\n0 1 5\n1 2 5\n2 0 10\n").unwrap();

    let instance = MatrixInstance::from_files(&instance_path, &dist_path).unwrap();
    let result = solve(&instance, &SolveOptions::default()).unwrap();

    assert_eq!(result.routes.len(), 1);
    assert_eq!(result.routes[0].nodes.first(), Some(&0));
    assert_eq!(result.routes[0].nodes.last(), Some(&0));
    assert_eq!(result.radius, 7);
}
