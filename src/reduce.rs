//! Block reduction of pixel arrays onto thread grids.
//!
//! Cell `(i, j)` of a `crosses x threads` grid covers source rows
//! `[floor(i * rows / crosses), floor((i + 1) * rows / crosses))` and the
//! analogous column range. When the source size is not a multiple of the grid
//! size the blocks differ in size by one pixel; that is intended.
//!
//! A region can be empty when the grid is finer than the source. Its mean is
//! taken to be the threshold itself, so the cell is `false`.
use crate::error::{MosaicError, Result};
use crate::grid::{check_dimensions, Mode, MosaicGrid};
use log::{debug, trace};

/// Row-major intensity samples with an interleaved channel axis.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelArray {
    rows: usize,
    cols: usize,
    channels: usize,
    data: Vec<f32>,
}

impl PixelArray {
    /// Wrap `data` as a `rows x cols x channels` array.
    ///
    /// At least one channel is required.
    pub fn new(rows: usize, cols: usize, channels: usize, data: Vec<f32>) -> Result<Self> {
        let needed = rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(channels))
            .filter(|_| channels > 0);
        if needed != Some(data.len()) {
            return Err(MosaicError::InvalidPixelBuffer {
                rows,
                cols,
                channels,
                actual: data.len(),
            });
        }
        Ok(PixelArray {
            rows,
            cols,
            channels,
            data,
        })
    }

    /// A single channel array from 8-bit samples.
    pub fn from_luma(rows: usize, cols: usize, data: &[u8]) -> Result<Self> {
        Self::new(rows, cols, 1, data.iter().map(|&v| v as f32).collect())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Average the channel axis away.
    pub fn collapse(&self) -> PixelArray {
        let data = self
            .data
            .chunks_exact(self.channels)
            .map(|px| px.iter().sum::<f32>() / self.channels as f32)
            .collect();
        PixelArray {
            rows: self.rows,
            cols: self.cols,
            channels: 1,
            data,
        }
    }

    fn sample(&self, row: usize, col: usize, channel: usize) -> f32 {
        self.data[(row * self.cols + col) * self.channels + channel]
    }
}

impl From<&image::GrayImage> for PixelArray {
    fn from(img: &image::GrayImage) -> Self {
        PixelArray {
            rows: img.height() as usize,
            cols: img.width() as usize,
            channels: 1,
            data: img.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }
}

impl From<&image::RgbImage> for PixelArray {
    fn from(img: &image::RgbImage) -> Self {
        PixelArray {
            rows: img.height() as usize,
            cols: img.width() as usize,
            channels: 3,
            data: img.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }
}

/// Parameters for [`reduce`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReduceConfig {
    /// Grid columns.
    pub threads: u32,
    /// Grid rows.
    pub crosses: u32,
    /// Regions with a mean below this become `true`.
    pub threshold: f32,
    pub mode: Mode,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        ReduceConfig {
            threads: 1,
            crosses: 1,
            threshold: 128.0,
            mode: Mode::Monochrome,
        }
    }
}

/// Half-open source ranges of each target cell along one axis.
///
/// `floor(i * source / cells)` is evaluated in integers so boundaries are exact.
fn partition(source: usize, cells: u32) -> Vec<(usize, usize)> {
    let bound = |i: u64| (i * source as u64 / cells as u64) as usize;
    (0..cells as u64).map(|i| (bound(i), bound(i + 1))).collect()
}

/// Reduce `pixels` to a `config.crosses x config.threads` grid.
///
/// Monochrome reduction of a three channel array uses the per-pixel channel
/// mean. Tri-channel reduction needs exactly three channels.
pub fn reduce(pixels: &PixelArray, config: &ReduceConfig) -> Result<MosaicGrid> {
    let (threads, crosses) = check_dimensions(config.threads as i64, config.crosses as i64)?;

    let collapsed;
    let source = match (config.mode, pixels.channels) {
        (Mode::Monochrome, 1) | (Mode::TriChannel, 3) => pixels,
        (Mode::Monochrome, 3) => {
            debug!("collapsing 3 channels to intensity");
            collapsed = pixels.collapse();
            &collapsed
        }
        (mode, channels) => return Err(MosaicError::InvalidChannelShape { mode, channels }),
    };

    let row_ranges = partition(source.rows, crosses);
    let col_ranges = partition(source.cols, threads);
    debug!(
        "reducing {}x{}x{} to {}x{} ({:?}), threshold {}",
        source.rows, source.cols, source.channels, crosses, threads, config.mode, config.threshold
    );

    let planes = (0..source.channels)
        .map(|channel| {
            let mut plane = Vec::with_capacity(threads as usize * crosses as usize);
            for &(r0, r1) in &row_ranges {
                for &(c0, c1) in &col_ranges {
                    let count = (r1 - r0) * (c1 - c0);
                    let mean = if count == 0 {
                        trace!("empty region rows {r0}..{r1} cols {c0}..{c1}");
                        config.threshold as f64
                    } else {
                        let mut sum = 0f64;
                        for row in r0..r1 {
                            for col in c0..c1 {
                                sum += source.sample(row, col, channel) as f64;
                            }
                        }
                        sum / count as f64
                    };
                    plane.push(mean < config.threshold as f64);
                }
            }
            plane
        })
        .collect();

    MosaicGrid::new(config.mode, threads, crosses, planes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Channel;
    use rstest::rstest;

    fn config(threads: u32, crosses: u32, threshold: f32, mode: Mode) -> ReduceConfig {
        ReduceConfig {
            threads,
            crosses,
            threshold,
            mode,
        }
    }

    #[test]
    fn partition_floors_boundaries() {
        assert_eq!(partition(10, 3), [(0, 3), (3, 6), (6, 10)]);
        assert_eq!(partition(4, 2), [(0, 2), (2, 4)]);
        assert_eq!(partition(2, 4), [(0, 0), (0, 1), (1, 1), (1, 2)]);
    }

    #[rstest]
    #[case::black(0, true)]
    #[case::white(255, false)]
    fn uniform_source(#[case] value: u8, #[case] expected: bool) {
        let pixels = PixelArray::from_luma(100, 100, &[value; 100 * 100]).unwrap();
        let grid = reduce(&pixels, &config(10, 10, 128.0, Mode::Monochrome)).unwrap();
        assert_eq!((grid.width(), grid.height()), (10, 10));
        assert!(grid.plane(Channel::Luma).unwrap().iter().all(|&c| c == expected));
    }

    #[test]
    fn block_means() {
        let row = [0u8, 0, 255, 255];
        let data: Vec<u8> = row.iter().copied().cycle().take(16).collect();
        let pixels = PixelArray::from_luma(4, 4, &data).unwrap();
        let grid = reduce(&pixels, &config(2, 2, 128.0, Mode::Monochrome)).unwrap();
        let rows: Vec<_> = grid.rows(Channel::Luma).collect();
        assert_eq!(rows, [&[true, false][..], &[true, false][..]]);
    }

    #[test]
    fn uneven_blocks_use_floor_partition() {
        // 5 columns into 2 threads: columns 0..2 and 2..5
        let data = [0u8, 0, 200, 200, 200];
        let pixels = PixelArray::from_luma(1, 5, &data).unwrap();
        let grid = reduce(&pixels, &config(2, 1, 150.0, Mode::Monochrome)).unwrap();
        assert_eq!(grid.plane(Channel::Luma).unwrap(), [true, false]);
    }

    #[test]
    fn empty_regions_are_false() {
        let pixels = PixelArray::from_luma(1, 2, &[0, 0]).unwrap();
        let grid = reduce(&pixels, &config(4, 3, 128.0, Mode::Monochrome)).unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 3));
        // only the last of the three row ranges is non-empty
        let rows: Vec<_> = grid.rows(Channel::Luma).collect();
        assert_eq!(rows[0], [false; 4]);
        assert_eq!(rows[1], [false; 4]);
        assert_eq!(rows[2], [false, true, false, true]);
    }

    #[rstest]
    #[case::source_smaller(3, 7, 5, 2)]
    #[case::source_larger(97, 61, 13, 7)]
    #[case::single_cell(8, 8, 1, 1)]
    fn shape_is_preserved(
        #[case] rows: usize,
        #[case] cols: usize,
        #[case] threads: u32,
        #[case] crosses: u32,
    ) {
        let data: Vec<f32> = (0..rows * cols * 3).map(|v| (v % 256) as f32).collect();
        let pixels = PixelArray::new(rows, cols, 3, data).unwrap();
        for mode in [Mode::Monochrome, Mode::TriChannel] {
            let grid = reduce(&pixels, &config(threads, crosses, 100.0, mode)).unwrap();
            assert_eq!((grid.width(), grid.height()), (threads, crosses));
            assert_eq!(grid.planes().count(), mode.planes());
        }
    }

    #[test]
    fn threshold_is_monotonic() {
        let data: Vec<u8> = (0..64u32).map(|v| (v * 37 % 256) as u8).collect();
        let pixels = PixelArray::from_luma(8, 8, &data).unwrap();
        let mut previous: Option<Vec<bool>> = None;
        for threshold in (0..=256).step_by(16) {
            let config = config(3, 3, threshold as f32, Mode::Monochrome);
            let grid = reduce(&pixels, &config).unwrap();
            let cells = grid.plane(Channel::Luma).unwrap().to_vec();
            if let Some(prev) = &previous {
                assert!(prev.iter().zip(&cells).all(|(&p, &c)| !p || c));
            }
            previous = Some(cells);
        }
    }

    #[test]
    fn channels_are_reduced_independently() {
        // one pixel: red dark, green bright, blue dark
        let pixels = PixelArray::new(1, 1, 3, vec![10.0, 250.0, 10.0]).unwrap();
        let grid = reduce(&pixels, &config(1, 1, 128.0, Mode::TriChannel)).unwrap();
        assert_eq!(grid.get(Channel::Red, 0, 0), Some(true));
        assert_eq!(grid.get(Channel::Green, 0, 0), Some(false));
        assert_eq!(grid.get(Channel::Blue, 0, 0), Some(true));

        // mean of the three is 90
        let grid = reduce(&pixels, &config(1, 1, 100.0, Mode::Monochrome)).unwrap();
        assert_eq!(grid.get(Channel::Luma, 0, 0), Some(true));
    }

    #[test]
    fn rejects_bad_input() {
        let luma = PixelArray::from_luma(2, 2, &[0; 4]).unwrap();
        assert_eq!(
            reduce(&luma, &config(1, 1, 128.0, Mode::TriChannel)),
            Err(MosaicError::InvalidChannelShape {
                mode: Mode::TriChannel,
                channels: 1
            })
        );
        assert_eq!(
            reduce(&luma, &config(0, 1, 128.0, Mode::Monochrome)),
            Err(MosaicError::InvalidDimensions {
                threads: 0,
                crosses: 1
            })
        );
        let two = PixelArray::new(1, 1, 2, vec![0.0, 0.0]).unwrap();
        assert!(matches!(
            reduce(&two, &config(1, 1, 128.0, Mode::Monochrome)),
            Err(MosaicError::InvalidChannelShape { channels: 2, .. })
        ));
        assert!(matches!(
            PixelArray::new(2, 2, 1, vec![0.0; 3]),
            Err(MosaicError::InvalidPixelBuffer { actual: 3, .. })
        ));
    }

    #[test]
    fn rejects_unusable_shapes() {
        assert!(matches!(
            PixelArray::new(usize::MAX, 2, 1, vec![]),
            Err(MosaicError::InvalidPixelBuffer { rows: usize::MAX, .. })
        ));
        assert!(matches!(
            PixelArray::new(usize::MAX / 2, 3, 1, vec![0.0; 4]),
            Err(MosaicError::InvalidPixelBuffer { actual: 4, .. })
        ));
        assert!(matches!(
            PixelArray::new(1, 1, 0, vec![]),
            Err(MosaicError::InvalidPixelBuffer { channels: 0, .. })
        ));
        assert!(matches!(
            PixelArray::new(0, 5, 0, vec![]),
            Err(MosaicError::InvalidPixelBuffer { channels: 0, .. })
        ));
    }

    #[test]
    fn collapse_averages_channels() {
        let pixels = PixelArray::new(1, 2, 3, vec![0.0, 30.0, 60.0, 90.0, 90.0, 90.0]).unwrap();
        let collapsed = pixels.collapse();
        assert_eq!(collapsed, PixelArray::new(1, 2, 1, vec![30.0, 90.0]).unwrap());
    }
}
