//! Flat text formats the engine exchanges with its surroundings.
//!
//! ## Dataset
//! Whitespace separated decimal numbers, read as consecutive `x y` pairs. Line breaks carry no
//! meaning, blank lines are skipped.
//!
//! ## Results
//! One line per point, in dataset order: both coordinates with two decimals, then the cluster id.
//! ```text
//! 0.00 1.00 0
//! 10.00 1.00 1
//! ```

use crate::{error::{KMeansError, Result}, memory::*};
use std::io::{BufRead, Write};
use log::debug;

/// Read a dataset from **reader**.
pub fn read_points<T: Primitive, R: BufRead>(reader: R) -> Result<Vec<Point<T>>> {
    let mut points = Vec::new();
    let mut pending_x: Option<T> = None;
    let mut line_nr = 0;
    for line in reader.lines() {
        let line = line?;
        line_nr += 1;
        for token in line.split_whitespace() {
            let value = token.parse::<T>().map_err(|_| KMeansError::Dataset {
                line: line_nr,
                reason: format!("`{}` is not a number", token)
            })?;
            match pending_x.take() {
                Some(x) => points.push(Point::new(x, value)),
                None => pending_x = Some(value)
            }
        }
    }
    if pending_x.is_some() {
        return Err(KMeansError::Dataset {
            line: line_nr,
            reason: "odd amount of coordinates, the last point has no y".to_string()
        });
    }
    debug!("read {} points from {} lines", points.len(), line_nr);
    Ok(points)
}

/// Write the result listing of **points** with their **assignments** to **writer**.
pub fn write_results<T: Primitive, W: Write>(mut writer: W, points: &[Point<T>], assignments: &[usize]) -> Result<()> {
    debug_assert_eq!(points.len(), assignments.len());
    for (p, cluster) in points.iter().zip(assignments) {
        writeln!(writer, "{:.2} {:.2} {}", p.x, p.y, cluster)?;
    }
    writer.flush()?;
    Ok(())
}
