use crate::error::{MosaicError, Result};
use log::debug;

/// Number of boolean planes stored by a grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// A single intensity plane.
    Monochrome,
    /// One plane per color channel, stored red, green, blue.
    TriChannel,
}

impl Mode {
    /// Header flag value: `1` for monochrome, `0` for tri-channel.
    pub fn flag(self) -> u32 {
        match self {
            Mode::Monochrome => 1,
            Mode::TriChannel => 0,
        }
    }

    pub fn from_flag(flag: u32) -> Result<Mode> {
        match flag {
            1 => Ok(Mode::Monochrome),
            0 => Ok(Mode::TriChannel),
            n => Err(MosaicError::InvalidMode(n)),
        }
    }

    /// Mode holding the given number of planes.
    pub fn from_plane_count(planes: usize) -> Result<Mode> {
        match planes {
            1 => Ok(Mode::Monochrome),
            3 => Ok(Mode::TriChannel),
            n => Err(MosaicError::InvalidMode(n as u32)),
        }
    }

    /// The channels of this mode, in storage order.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Mode::Monochrome => &[Channel::Luma],
            Mode::TriChannel => &[Channel::Red, Channel::Green, Channel::Blue],
        }
    }

    pub fn planes(self) -> usize {
        self.channels().len()
    }
}

/// The channel a plane was reduced from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Luma,
    Red,
    Green,
    Blue,
}

/// Validate grid dimensions, accepting anything from 1 up to `i32::MAX`.
pub(crate) fn check_dimensions(threads: i64, crosses: i64) -> Result<(u32, u32)> {
    let valid = 1..=i32::MAX as i64;
    if valid.contains(&threads) && valid.contains(&crosses) {
        Ok((threads as u32, crosses as u32))
    } else {
        Err(MosaicError::InvalidDimensions { threads, crosses })
    }
}

/// A reduced mosaic: `height` crosses of `width` threads, one boolean per cell
/// and plane.
///
/// A cell is `true` where the source region was darker than the threshold.
/// Grids are validated on construction and never change afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MosaicGrid {
    mode: Mode,
    width: u32,
    height: u32,
    planes: Vec<Vec<bool>>,
}

impl MosaicGrid {
    /// Build a grid from row-major planes, one per channel of `mode`.
    pub fn new(mode: Mode, width: u32, height: u32, planes: Vec<Vec<bool>>) -> Result<Self> {
        let (width, height) = check_dimensions(width as i64, height as i64)?;
        if planes.len() != mode.planes() {
            return Err(MosaicError::InvalidMode(planes.len() as u32));
        }
        let cells = width as usize * height as usize;
        for plane in &planes {
            if plane.len() != cells {
                debug!("plane holds {} cells, {width}x{height} needs {cells}", plane.len());
                return Err(MosaicError::InvalidDimensions {
                    threads: width as i64,
                    crosses: height as i64,
                });
            }
        }
        Ok(MosaicGrid {
            mode,
            width,
            height,
            planes,
        })
    }

    /// Build a grid from planes of nested rows.
    ///
    /// The mode is taken from the number of planes. All rows of all planes must
    /// have the same length.
    pub fn from_rows(planes: Vec<Vec<Vec<bool>>>) -> Result<Self> {
        let mode = Mode::from_plane_count(planes.len())?;
        let height = planes[0].len();
        let width = planes[0].first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(planes.len());
        for plane in planes {
            if plane.len() != height || plane.iter().any(|row| row.len() != width) {
                return Err(MosaicError::InvalidDimensions {
                    threads: width as i64,
                    crosses: plane.len() as i64,
                });
            }
            flat.push(plane.concat());
        }
        let (width, height) = check_dimensions(width as i64, height as i64)?;
        MosaicGrid::new(mode, width, height, flat)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of threads (columns).
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of crosses (rows).
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cells in one plane.
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major cells of the given channel, if the grid has it.
    pub fn plane(&self, channel: Channel) -> Option<&[bool]> {
        let idx = self.mode.channels().iter().position(|&c| c == channel)?;
        Some(&self.planes[idx])
    }

    /// All planes in storage order.
    pub fn planes(&self) -> impl Iterator<Item = (Channel, &[bool])> + '_ {
        self.mode
            .channels()
            .iter()
            .copied()
            .zip(self.planes.iter().map(Vec::as_slice))
    }

    /// Rows of one plane.
    pub fn rows(&self, channel: Channel) -> impl Iterator<Item = &[bool]> + '_ {
        self.plane(channel)
            .unwrap_or(&[])
            .chunks_exact(self.width as usize)
    }

    /// Cell at thread `x`, cross `y`.
    pub fn get(&self, channel: Channel, x: u32, y: u32) -> Option<bool> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let plane = self.plane(channel)?;
        Some(plane[y as usize * self.width as usize + x as usize])
    }
}
