use nom::{
    bytes::complete::{tag, take},
    combinator::map_res,
    number::complete::be_u32,
    sequence::tuple,
    IResult,
};

use crate::error::{PngError, Result};

pub(crate) mod actl;
pub(crate) mod crc;
pub(crate) mod fctl;
pub(crate) mod fdat;
pub(crate) mod idat;
pub(crate) mod iend;
pub(crate) mod ihdr;
pub(crate) mod plte;
pub(crate) mod text;
pub(crate) mod trns;

pub(crate) const SIGNATURE: &[u8; 8] = b"\x89PNG\x0d\x0a\x1a\x0a";

pub(crate) fn parse_signature(input: &[u8]) -> Result<&[u8]> {
    let signature: IResult<&[u8], &[u8]> = tag(SIGNATURE.as_slice())(input);
    signature
        .map(|(rest, _)| rest)
        .map_err(|_| PngError::BadSignature)
}

/// A CRC-checked chunk whose payload hasn't been interpreted yet.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawChunk<'a> {
    pub(crate) chunk_type: &'a [u8; 4],
    pub(crate) data: &'a [u8],
}
impl RawChunk<'_> {
    pub(crate) fn name(&self) -> String {
        String::from_utf8_lossy(self.chunk_type).into_owned()
    }

    /// Type, payload and CRC; everything after the length field.
    pub(crate) fn consumed_len(&self) -> u64 {
        4 + self.data.len() as u64 + 4
    }

    /// Ancillary chunks have a lowercase first letter.
    pub(crate) fn is_ancillary(&self) -> bool {
        self.chunk_type[0].is_ascii_lowercase()
    }
}

/// Type code and payload length of one chunk, as reported by
/// [`PNG::list_chunks`](crate::PNG::list_chunks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkInfo {
    pub chunk_type: String,
    pub length: u32,
}

fn chunk_type(input: &[u8]) -> IResult<&[u8], &[u8; 4]> {
    map_res(take(4usize), <&[u8; 4]>::try_from)(input)
}

fn chunk_header(input: &[u8]) -> IResult<&[u8], (u32, &[u8; 4])> {
    tuple((be_u32, chunk_type))(input)
}

fn chunk_body(input: &[u8], length: usize) -> IResult<&[u8], (&[u8], u32)> {
    tuple((take(length), be_u32))(input)
}

/// Splits one chunk off the front of `input`, checking its length and CRC.
pub(crate) fn split_chunk(input: &[u8], max_length: u32) -> Result<(&[u8], RawChunk<'_>)> {
    let (rest, (length, chunk_type)) = chunk_header(input).map_err(|_| PngError::Truncated)?;
    if length > max_length {
        return Err(PngError::BadChunkLength {
            chunk: String::from_utf8_lossy(chunk_type).into_owned(),
            length,
        });
    }
    let (rest, (data, stored)) =
        chunk_body(rest, length as usize).map_err(|_| PngError::Truncated)?;
    let computed = crc::chunk_crc(chunk_type, data);
    if stored != computed {
        return Err(PngError::CrcMismatch {
            chunk: String::from_utf8_lossy(chunk_type).into_owned(),
            stored,
            computed,
        });
    }
    Ok((rest, RawChunk { chunk_type, data }))
}

pub(crate) fn iter_chunks(source: &[u8], max_length: u32) -> ChunkIter<'_> {
    ChunkIter {
        source,
        max_length,
        finished: false,
    }
}

/// Walks validated chunks up to and including IEND. Running out of input
/// before IEND is reported as [`PngError::Truncated`].
pub(crate) struct ChunkIter<'a> {
    source: &'a [u8],
    max_length: u32,
    finished: bool,
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<RawChunk<'a>>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match split_chunk(self.source, self.max_length) {
            Ok((rest, chunk)) => {
                self.source = rest;
                if chunk.chunk_type == iend::IENDChunk::HEADER {
                    self.finished = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Length, type, payload and CRC, ready to append to a stream.
pub(crate) fn frame_chunk(chunk_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 12);
    bytes.extend((payload.len() as u32).to_be_bytes());
    bytes.extend(chunk_type);
    bytes.extend(payload);
    bytes.extend(crc::chunk_crc(chunk_type, payload).to_be_bytes());
    bytes
}

pub(crate) fn chunk_name(chunk_type: &'static [u8; 4]) -> &'static str {
    std::str::from_utf8(chunk_type).unwrap_or("????")
}

/// Turns a payload parser's result into a value, insisting the whole payload
/// was used.
pub(crate) fn finish<T>(chunk_type: &'static [u8; 4], result: IResult<&[u8], T>) -> Result<T> {
    let chunk = chunk_name(chunk_type);
    match result {
        Ok((rest, value)) if rest.is_empty() => Ok(value),
        Ok((rest, _)) => Err(PngError::MalformedChunk {
            chunk,
            reason: format!("{} unexpected trailing bytes", rest.len()),
        }),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(PngError::MalformedChunk {
            chunk,
            reason: format!("{:?} with {} bytes left", e.code, e.input.len()),
        }),
        Err(nom::Err::Incomplete(_)) => Err(PngError::MalformedChunk {
            chunk,
            reason: "payload too short".to_owned(),
        }),
    }
}

pub(crate) trait ParseableChunk<'a>: Sized {
    const HEADER: &'static [u8; 4];

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self>;
    fn payload(&self) -> Vec<u8>;

    fn to_bytes(&self) -> Vec<u8> {
        frame_chunk(Self::HEADER, &self.payload())
    }
}
