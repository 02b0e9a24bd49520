use nom::{
    number::complete::{be_u16, be_u32, u8},
    sequence::tuple,
};

use super::{finish, ParseableChunk};
use crate::{
    bitmap::{BlendOp, Delay, DisposeOp, FrameControl},
    error::Result,
};

/// Frame control, the 26-byte chunk that opens every animation frame.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct fcTLChunk {
    pub(crate) sequence_number: u32,
    pub(crate) control: FrameControl,
}
impl<'a> ParseableChunk<'a> for fcTLChunk {
    const HEADER: &'static [u8; 4] = b"fcTL";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let (sequence_number, width, height, x_offset, y_offset, numerator, denominator, dispose, blend) =
            finish(
                Self::HEADER,
                tuple((
                    be_u32, be_u32, be_u32, be_u32, be_u32, be_u16, be_u16, u8, u8,
                ))(chunk_data),
            )?;
        Ok(Self {
            sequence_number,
            control: FrameControl {
                width,
                height,
                x_offset,
                y_offset,
                delay: Delay::new(numerator, denominator),
                dispose_op: DisposeOp::try_from(dispose)?,
                blend_op: BlendOp::try_from(blend)?,
            },
        })
    }

    fn payload(&self) -> Vec<u8> {
        let fc = &self.control;
        let mut bytes = Vec::with_capacity(26);
        bytes.extend(self.sequence_number.to_be_bytes());
        bytes.extend(fc.width.to_be_bytes());
        bytes.extend(fc.height.to_be_bytes());
        bytes.extend(fc.x_offset.to_be_bytes());
        bytes.extend(fc.y_offset.to_be_bytes());
        bytes.extend(fc.delay.numerator.to_be_bytes());
        bytes.extend(fc.delay.denominator.to_be_bytes());
        bytes.push(fc.dispose_op as u8);
        bytes.push(fc.blend_op as u8);
        bytes
    }
}
