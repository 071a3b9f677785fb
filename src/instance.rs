//! In-memory problem instance and its text-file loader.

use std::fs;
use std::path::Path;

use crate::error::{PlannerError, Result};
use crate::geometry::Coord;
use crate::traits::{DistanceMatrixProvider, InstanceProvider};

/// Instance backed by a dense cost matrix and a coordinate table.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixInstance {
    cost_matrix: Vec<Vec<u32>>,
    coordinates: Vec<Coord>,
    k_vehicles: usize,
    r_radius: u32,
}

impl MatrixInstance {
    /// Builds an instance, checking that the matrix is square and matches the
    /// coordinate table.
    pub fn new(
        cost_matrix: Vec<Vec<u32>>,
        coordinates: Vec<Coord>,
        k_vehicles: usize,
        r_radius: u32,
    ) -> Result<Self> {
        let n = coordinates.len();
        if cost_matrix.len() != n {
            return Err(PlannerError::InvalidInstance(format!(
                "cost matrix has {} rows for {} coordinates",
                cost_matrix.len(),
                n
            )));
        }
        if let Some((row, values)) = cost_matrix.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(PlannerError::InvalidInstance(format!(
                "cost matrix row {} has {} columns, expected {}",
                row,
                values.len(),
                n
            )));
        }

        Ok(Self {
            cost_matrix,
            coordinates,
            k_vehicles,
            r_radius,
        })
    }

    /// Builds an instance whose costs come from a matrix provider.
    pub fn from_coordinates<M>(
        coordinates: Vec<Coord>,
        k_vehicles: usize,
        r_radius: u32,
        provider: &M,
    ) -> Result<Self>
    where
        M: DistanceMatrixProvider,
    {
        let matrix = provider.matrix_for(&coordinates);
        Self::new(matrix, coordinates, k_vehicles, r_radius)
    }

    /// Loads an instance file (`k n r` header, then depot and node
    /// coordinates) and a distance file (header, then `a b cost` triples).
    pub fn from_files(instance_path: impl AsRef<Path>, dist_path: impl AsRef<Path>) -> Result<Self> {
        let instance_text = fs::read_to_string(instance_path)?;
        let dist_text = fs::read_to_string(dist_path)?;
        Self::parse(&instance_text, &dist_text)
    }

    /// Parses the two text formats accepted by [`MatrixInstance::from_files`].
    ///
    /// The header's node count excludes the depot. Blank lines and lines
    /// starting with `#` are ignored. Pairs missing from the distance file
    /// keep a cost of zero.
    pub fn parse(instance_text: &str, dist_text: &str) -> Result<Self> {
        let mut lines = data_lines(instance_text);

        let (header_line, header) = lines.next().ok_or_else(|| PlannerError::Parse {
            line: 0,
            message: "missing `k n r` header".to_string(),
        })?;
        let fields = parse_fields::<u64>(header, header_line, 3)?;
        let k_vehicles = usize::try_from(fields[0]).map_err(|_| PlannerError::Parse {
            line: header_line,
            message: format!("vehicle count {} is too large", fields[0]),
        })?;
        let n_nodes = usize::try_from(fields[1])
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| PlannerError::Parse {
                line: header_line,
                message: format!("node count {} is too large", fields[1]),
            })?;
        let r_radius = u32::try_from(fields[2]).map_err(|_| PlannerError::Parse {
            line: header_line,
            message: format!("radius {} does not fit in 32 bits", fields[2]),
        })?;

        // Sized by the lines actually read, not by the header.
        let mut coordinates = Vec::new();
        for (line_no, line) in lines {
            let xy = parse_fields::<f64>(line, line_no, 2)?;
            coordinates.push(Coord::new(xy[0], xy[1]));
        }
        if coordinates.len() != n_nodes {
            return Err(PlannerError::InvalidInstance(format!(
                "expected {} coordinates (depot included), found {}",
                n_nodes,
                coordinates.len()
            )));
        }

        let mut cost_matrix = vec![vec![0; n_nodes]; n_nodes];
        for (line_no, line) in data_lines(dist_text).skip(1) {
            let entry = parse_fields::<u64>(line, line_no, 3)?;
            let (from, to) = (entry[0] as usize, entry[1] as usize);
            if from >= n_nodes || to >= n_nodes {
                return Err(PlannerError::Parse {
                    line: line_no,
                    message: format!("edge {}->{} references a node outside 0..{}", from, to, n_nodes),
                });
            }
            cost_matrix[from][to] = u32::try_from(entry[2]).map_err(|_| PlannerError::Parse {
                line: line_no,
                message: format!("cost {} does not fit in 32 bits", entry[2]),
            })?;
        }

        Self::new(cost_matrix, coordinates, k_vehicles, r_radius)
    }

    pub fn coordinates(&self) -> &[Coord] {
        &self.coordinates
    }

    fn check_node(&self, node: usize) -> Result<()> {
        if node >= self.coordinates.len() {
            return Err(PlannerError::NodeOutOfRange {
                node,
                count: self.coordinates.len(),
            });
        }
        Ok(())
    }
}

impl InstanceProvider for MatrixInstance {
    fn cost(&self, from: usize, to: usize) -> Result<u32> {
        self.check_node(from)?;
        self.check_node(to)?;
        Ok(self.cost_matrix[from][to])
    }

    fn coordinate(&self, node: usize) -> Result<Coord> {
        self.check_node(node)?;
        Ok(self.coordinates[node])
    }

    fn k(&self) -> usize {
        self.k_vehicles
    }

    fn n(&self) -> usize {
        self.coordinates.len()
    }

    fn r(&self) -> u32 {
        self.r_radius
    }
}

/// Non-empty, non-comment lines with their 1-based line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_fields<T: std::str::FromStr>(line: &str, line_no: usize, expected: usize) -> Result<Vec<T>> {
    let values = line
        .split_whitespace()
        .take(expected)
        .map(|field| {
            field.parse::<T>().map_err(|_| PlannerError::Parse {
                line: line_no,
                message: format!("cannot parse `{}`", field),
            })
        })
        .collect::<Result<Vec<T>>>()?;

    if values.len() < expected {
        return Err(PlannerError::Parse {
            line: line_no,
            message: format!("expected {} fields, found {}", expected, values.len()),
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euclidean::EuclideanMatrix;

    const INSTANCE: &str = "\
# k n r
2 3 10
0 0
10 0
0 10

10 10
";

    const DISTANCES: &str = "\
# distances
header
0 1 10
1 0 10
0 2 15
2 3 7
";

    #[test]
    fn test_parse_counts_depot() {
        let instance = MatrixInstance::parse(INSTANCE, DISTANCES).unwrap();
        assert_eq!(instance.k(), 2);
        assert_eq!(instance.n(), 4);
        assert_eq!(instance.r(), 10);
        assert_eq!(instance.coordinate(3).unwrap(), Coord::new(10.0, 10.0));
    }

    #[test]
    fn test_parse_distance_triples() {
        let instance = MatrixInstance::parse(INSTANCE, DISTANCES).unwrap();
        assert_eq!(instance.cost(0, 1).unwrap(), 10);
        assert_eq!(instance.cost(0, 2).unwrap(), 15);
        assert_eq!(instance.cost(2, 3).unwrap(), 7);
        // Missing entries stay zero.
        assert_eq!(instance.cost(3, 2).unwrap(), 0);
    }

    #[test]
    fn test_parse_rejects_short_coordinate_list() {
        let err = MatrixInstance::parse("1 3 5\n0 0\n1 1\n", "h\n").unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInstance(_)));
    }

    #[test]
    fn test_parse_rejects_node_count_overflow() {
        let header = format!("1 {} 5\n0 0\n", u64::MAX);
        let err = MatrixInstance::parse(&header, "h\n").unwrap_err();
        assert!(matches!(err, PlannerError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_huge_node_count_fails_on_missing_coordinates() {
        let err = MatrixInstance::parse("1 1000000000000 5\n0 0\n1 1\n", "h\n").unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInstance(_)));
    }

    #[test]
    fn test_parse_reports_bad_field_line() {
        let err = MatrixInstance::parse("1 1 5\n0 0\n1 x\n", "h\n").unwrap_err();
        assert!(matches!(err, PlannerError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_parse_rejects_edge_outside_instance() {
        let err = MatrixInstance::parse("1 1 5\n0 0\n1 1\n", "h\n0 9 4\n").unwrap_err();
        assert!(matches!(err, PlannerError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_new_rejects_ragged_matrix() {
        let coords = vec![Coord::new(0.0, 0.0), Coord::new(1.0, 0.0)];
        let err = MatrixInstance::new(vec![vec![0, 1], vec![1]], coords, 1, 0).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidInstance(_)));
    }

    #[test]
    fn test_out_of_range_node() {
        let coords = vec![Coord::new(0.0, 0.0), Coord::new(3.0, 4.0)];
        let instance = MatrixInstance::from_coordinates(coords, 1, 5, &EuclideanMatrix::default()).unwrap();
        assert_eq!(instance.cost(0, 1).unwrap(), 5);
        assert!(matches!(
            instance.cost(0, 2),
            Err(PlannerError::NodeOutOfRange { node: 2, count: 2 })
        ));
        assert!(matches!(
            instance.coordinate(7),
            Err(PlannerError::NodeOutOfRange { node: 7, count: 2 })
        ));
    }

    #[test]
    fn test_coverage_bounds_default_to_none() {
        let coords = vec![Coord::new(0.0, 0.0)];
        let instance = MatrixInstance::from_coordinates(coords, 1, 5, &EuclideanMatrix::default()).unwrap();
        assert_eq!(instance.coverage_lower_bound(0, 0, 0), None);
        assert_eq!(instance.coverage_upper_bound(0, 0, 0), None);
    }
}
