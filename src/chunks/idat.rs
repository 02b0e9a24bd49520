use super::ParseableChunk;
use crate::error::Result;

/// A slice of the default image's zlib stream. Consecutive IDATs concatenate.
#[derive(Debug)]
pub(crate) struct IDATChunk<'a> {
    pub(crate) data: &'a [u8],
}
impl<'a> ParseableChunk<'a> for IDATChunk<'a> {
    const HEADER: &'static [u8; 4] = b"IDAT";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        Ok(IDATChunk { data: chunk_data })
    }

    fn payload(&self) -> Vec<u8> {
        self.data.to_vec()
    }
}
