use nom::{combinator::rest, number::complete::be_u32, sequence::tuple};

use super::{finish, ParseableChunk};
use crate::error::Result;

/// Frame data: an IDAT for every frame after the first, prefixed with its
/// place in the shared sequence counter.
#[allow(non_camel_case_types)]
#[derive(Debug)]
pub(crate) struct fdATChunk<'a> {
    pub(crate) sequence_number: u32,
    pub(crate) data: &'a [u8],
}
impl<'a> ParseableChunk<'a> for fdATChunk<'a> {
    const HEADER: &'static [u8; 4] = b"fdAT";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let (sequence_number, data) = finish(Self::HEADER, tuple((be_u32, rest))(chunk_data))?;
        Ok(Self {
            sequence_number,
            data,
        })
    }

    fn payload(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() + 4);
        bytes.extend(self.sequence_number.to_be_bytes());
        bytes.extend(self.data);
        bytes
    }
}
