//! Plain text rendition of a grid.
//!
//! One line per cross, `0` for a dark (`true`) cell and `1` otherwise, the same
//! digits the binary payload uses. Tri-channel grids list the red, green and
//! blue planes in that order, separated by a blank line.
use crate::error::{MosaicError, Result};
use crate::grid::MosaicGrid;

pub fn to_text(grid: &MosaicGrid) -> String {
    let lines = grid.height() as usize * grid.mode().planes();
    let mut out = String::with_capacity((grid.width() as usize + 1) * lines + 2);
    for (i, (channel, _)) in grid.planes().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for row in grid.rows(channel) {
            out.extend(row.iter().map(|&cell| if cell { '0' } else { '1' }));
            out.push('\n');
        }
    }
    out
}

pub fn from_text(text: &str) -> Result<MosaicGrid> {
    let mut planes: Vec<Vec<Vec<bool>>> = vec![vec![]];
    // line each plane starts on
    let mut starts = vec![];
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            if planes.last().is_some_and(|p| !p.is_empty()) {
                planes.push(vec![]);
            }
            continue;
        }
        let row = line
            .chars()
            .map(|c| match c {
                '0' => Ok(true),
                '1' => Ok(false),
                c => Err(MosaicError::InvalidText {
                    line: idx + 1,
                    reason: format!("unexpected character {c:?}"),
                }),
            })
            .collect::<Result<Vec<bool>>>()?;
        let width = planes.iter().flatten().next().map_or(row.len(), Vec::len);
        if row.len() != width {
            return Err(MosaicError::InvalidText {
                line: idx + 1,
                reason: format!("row has {} cells, expected {width}", row.len()),
            });
        }
        if let Some(plane) = planes.last_mut() {
            if plane.is_empty() {
                starts.push(idx + 1);
            }
            plane.push(row);
        }
    }
    if planes.last().is_some_and(Vec::is_empty) {
        planes.pop();
    }
    if planes.is_empty() {
        return Err(MosaicError::InvalidDimensions {
            threads: 0,
            crosses: 0,
        });
    }
    let height = planes[0].len();
    if let Some(pos) = planes.iter().position(|p| p.len() != height) {
        return Err(MosaicError::InvalidText {
            line: starts[pos],
            reason: format!("plane {} has {} rows, expected {height}", pos + 1, planes[pos].len()),
        });
    }
    MosaicGrid::from_rows(planes)
}
