use nom::{number::complete::be_u32, sequence::tuple};

use super::{finish, ParseableChunk};
use crate::error::Result;

/// Animation control: frame count and how many times to loop (0 = forever).
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct acTLChunk {
    pub num_frames: u32,
    pub num_plays: u32,
}
impl<'a> ParseableChunk<'a> for acTLChunk {
    const HEADER: &'static [u8; 4] = b"acTL";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let (num_frames, num_plays) = finish(Self::HEADER, tuple((be_u32, be_u32))(chunk_data))?;
        Ok(Self {
            num_frames,
            num_plays,
        })
    }

    fn payload(&self) -> Vec<u8> {
        [self.num_frames.to_be_bytes(), self.num_plays.to_be_bytes()].concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_byte_payload() {
        let actl = acTLChunk {
            num_frames: 3,
            num_plays: 0,
        };
        assert_eq!(actl.payload(), vec![0, 0, 0, 3, 0, 0, 0, 0]);
        assert_eq!(acTLChunk::from_bytes(&actl.payload()).unwrap(), actl);
        assert!(acTLChunk::from_bytes(&[0; 7]).is_err());
    }
}
