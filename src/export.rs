//! Plain-text and JSON export of instances and solutions.
//!
//! The text layout is the one plotting scripts expect: a points file with
//! one `x y` line per node, and a tours file listing each vehicle's visited
//! coordinates followed by a blank line.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::solution::Solution;
use crate::solver::PlannerResult;
use crate::traits::InstanceProvider;

/// Writes one `x y` line per node, depot first.
pub fn write_points<W, I>(writer: &mut W, instance: &I) -> Result<()>
where
    W: Write,
    I: InstanceProvider + ?Sized,
{
    for node in 0..instance.n() {
        let coord = instance.coordinate(node)?;
        writeln!(writer, "{} {}", coord.x, coord.y)?;
    }
    Ok(())
}

/// Writes each vehicle's visited coordinates, one `x y` per line, with two
/// newlines after every vehicle.
pub fn write_tours<W, I>(writer: &mut W, solution: &Solution<'_, I>) -> Result<()>
where
    W: Write,
    I: InstanceProvider,
{
    for vehicle in 0..solution.k_vehicles() {
        for point in solution.vehicle_polyline(vehicle)?.points() {
            writeln!(writer, "{} {}", point.x, point.y)?;
        }
        write!(writer, "\n\n")?;
    }
    Ok(())
}

/// Writes the points file and the tours file of a solution.
pub fn save_solution<I: InstanceProvider>(
    solution: &Solution<'_, I>,
    points_path: impl AsRef<Path>,
    tours_path: impl AsRef<Path>,
) -> Result<()> {
    let mut points = BufWriter::new(File::create(points_path.as_ref())?);
    write_points(&mut points, solution.instance())?;
    points.flush()?;

    let mut tours = BufWriter::new(File::create(tours_path.as_ref())?);
    write_tours(&mut tours, solution)?;
    tours.flush()?;

    debug!(
        points = %points_path.as_ref().display(),
        tours = %tours_path.as_ref().display(),
        "saved solution"
    );
    Ok(())
}

/// Serializes a planner result as pretty-printed JSON.
pub fn save_json(result: &PlannerResult, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    Ok(())
}

impl<I: InstanceProvider> Solution<'_, I> {
    /// See [`save_solution`].
    pub fn save_solution(&self, points_path: impl AsRef<Path>, tours_path: impl AsRef<Path>) -> Result<()> {
        save_solution(self, points_path, tours_path)
    }
}
