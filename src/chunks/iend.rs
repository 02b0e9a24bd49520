use super::{finish, ParseableChunk};
use crate::error::Result;

pub(crate) struct IENDChunk;
impl<'a> ParseableChunk<'a> for IENDChunk {
    const HEADER: &'static [u8; 4] = b"IEND";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        finish(Self::HEADER, Ok((chunk_data, Self)))
    }

    fn payload(&self) -> Vec<u8> {
        Vec::new()
    }
}
