use crate::grid::MosaicGrid;
use crate::{BitWriter, Bits, Header, VecWriter, HEADER_BITS, MARKER};
use log::{debug, trace};

/// Bit written for a cell. Dark (`true`) cells are stored as `0`.
pub fn cell_bit(cell: bool) -> Bits {
    Bits::bit(!cell)
}

pub struct Encoder<W> {
    writer: W,
}
impl<W: BitWriter> Encoder<W> {
    pub fn new(writer: W) -> Self {
        Encoder { writer }
    }

    pub fn write_header(&mut self, header: &Header) -> Result<(), W::Error> {
        debug!("header {:?}", header);
        self.writer.write_u32(MARKER)?;
        self.writer.write_u32(header.threads as u32)?;
        self.writer.write_u32(header.crosses as u32)?;
        self.writer.write(Bits::bit(header.mode.flag() == 1))?;
        self.writer.write_u32(MARKER)
    }

    /// Write one plane, row after row.
    pub fn encode_plane(&mut self, cells: &[bool]) -> Result<(), W::Error> {
        for &cell in cells {
            self.writer.write(cell_bit(cell))?;
        }
        Ok(())
    }

    /// Write the header and all planes of `grid`.
    pub fn encode_grid(&mut self, grid: &MosaicGrid) -> Result<(), W::Error> {
        self.write_header(&Header::of(grid))?;
        for (channel, plane) in grid.planes() {
            trace!("  plane {:?}", channel);
            self.encode_plane(plane)?;
        }
        Ok(())
    }

    pub fn finish(self) -> W {
        self.writer
    }
}

/// Serialize `grid` into a zero padded byte buffer.
pub fn encode(grid: &MosaicGrid) -> Vec<u8> {
    let bits = HEADER_BITS as usize + grid.cells() * grid.mode().planes();
    let mut encoder = Encoder::new(VecWriter::with_capacity(bits));
    match encoder.encode_grid(grid) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    encoder.finish().finish()
}

/// Bytes [`encode`] produces for a grid of this shape.
pub fn encoded_len(grid: &MosaicGrid) -> usize {
    (HEADER_BITS as usize + grid.cells() * grid.mode().planes()).div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Mode;

    #[test]
    fn header_layout() {
        let grid = MosaicGrid::new(Mode::Monochrome, 2, 1, vec![vec![true, false]]).unwrap();
        let data = encode(&grid);
        assert_eq!(data.len(), encoded_len(&grid));
        assert_eq!(&data[..4], &MARKER.to_be_bytes());
        assert_eq!(&data[4..8], &2i32.to_be_bytes());
        assert_eq!(&data[8..12], &1i32.to_be_bytes());
        // flag 1, then the end marker shifted by one bit
        assert_eq!(data[12], 0b1110_1111);
        // last marker bit, cells 0 and 1, zero padding
        assert_eq!(data[16], 0b1010_0000);
    }

    #[test]
    fn tri_channel_flag_is_zero() {
        let plane = vec![false];
        let grid =
            MosaicGrid::new(Mode::TriChannel, 1, 1, vec![plane.clone(), plane.clone(), plane])
                .unwrap();
        let data = encode(&grid);
        assert_eq!(data[12] >> 7, 0);
        // marker's last bit, then three `1` cells
        assert_eq!(data[16], 0b1111_0000);
    }
}
