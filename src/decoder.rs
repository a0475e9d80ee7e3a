use crate::error::{MosaicError, Result};
use crate::grid::{check_dimensions, Mode, MosaicGrid};
use crate::{BitReader, Bits, ByteReader, Header, HEADER_BITS, MARKER};
use log::{debug, trace};

fn marker(reader: &mut impl BitReader, which: &'static str) -> Result<()> {
    for half in [(MARKER >> 16) as u16, MARKER as u16] {
        match reader.expect(Bits { data: half, len: 16 }) {
            Ok(()) => reader.consume(16),
            Err(Some(found)) => {
                debug!("{which} marker mismatch: {found:?}");
                return Err(MosaicError::MalformedHeader(which));
            }
            Err(None) => return Err(MosaicError::MalformedHeader("header ends early")),
        }
    }
    Ok(())
}

/// Read and check the header fields.
///
/// The dimensions are returned as stored; they are not validated here.
pub fn decode_header(reader: &mut impl BitReader) -> Result<Header> {
    let early = MosaicError::MalformedHeader("header ends early");
    marker(reader, "start")?;
    let threads = reader.read_u32().ok_or(early.clone())? as i32;
    let crosses = reader.read_u32().ok_or(early.clone())? as i32;
    let mode = Mode::from_flag(reader.read(1).ok_or(early)? as u32)?;
    marker(reader, "end")?;
    let header = Header {
        threads,
        crosses,
        mode,
    };
    debug!("header {:?}", header);
    Ok(header)
}

/// Decode a mosaic file.
///
/// The payload length follows from the header. Input shorter than that fails
/// with `TruncatedPayload` before any cell is read; bytes past the payload are
/// ignored.
pub fn decode(data: &[u8]) -> Result<MosaicGrid> {
    let mut reader = ByteReader::from_slice(data);
    let header = decode_header(&mut reader)?;
    let (width, height) = check_dimensions(header.threads as i64, header.crosses as i64)?;

    let available = (data.len() as u64 * 8).saturating_sub(HEADER_BITS);
    let needed = header.payload_bits().ok_or(MosaicError::InvalidDimensions {
        threads: header.threads as i64,
        crosses: header.crosses as i64,
    })?;
    if available < needed {
        return Err(MosaicError::TruncatedPayload { needed, available });
    }
    trace!("payload {needed} of {available} bits");

    let cells = width as usize * height as usize;
    let mut bits = reader.into_bits();
    let mut planes = Vec::with_capacity(header.mode.planes());
    for channel in header.mode.channels() {
        trace!("  plane {:?}", channel);
        // a `0` bit is a dark cell
        let plane: Vec<bool> = bits.by_ref().take(cells).map(|bit| !bit).collect();
        if plane.len() != cells {
            return Err(MosaicError::TruncatedPayload { needed, available });
        }
        planes.push(plane);
    }

    MosaicGrid::new(header.mode, width, height, planes)
}
