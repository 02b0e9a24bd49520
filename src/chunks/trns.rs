use super::{finish, frame_chunk};
use crate::{
    chunks::ihdr::ColorType,
    error::{PngError, Result},
};
use nom::{number::complete::be_u16, sequence::tuple};

/// Simple transparency: a color key for greyscale/truecolor images, or one
/// alpha value per palette index.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum tRNSChunk {
    Greyscale(u16),
    Truecolor(u16, u16, u16),
    Indexed(Vec<u8>),
}
impl tRNSChunk {
    pub(crate) const HEADER: &'static [u8; 4] = b"tRNS";

    /// The payload layout depends on the image's color type.
    pub(crate) fn from_bytes(chunk_data: &[u8], color_type: ColorType) -> Result<Self> {
        match color_type {
            ColorType::Greyscale => Ok(Self::Greyscale(finish(
                Self::HEADER,
                be_u16(chunk_data),
            )?)),
            ColorType::Truecolor => {
                let (r, g, b) = finish(Self::HEADER, tuple((be_u16, be_u16, be_u16))(chunk_data))?;
                Ok(Self::Truecolor(r, g, b))
            }
            ColorType::IndexedColor if chunk_data.len() <= 256 => {
                Ok(Self::Indexed(chunk_data.to_vec()))
            }
            ColorType::IndexedColor => Err(PngError::MalformedChunk {
                chunk: "tRNS",
                reason: format!("{} alpha entries", chunk_data.len()),
            }),
            ColorType::GreyscaleWithAlpha | ColorType::TruecolorWithAlpha => {
                Err(PngError::UnexpectedChunk {
                    chunk: "tRNS",
                    reason: "image already has an alpha channel".to_owned(),
                })
            }
        }
    }

    /// Alpha of a palette entry; indices past the end of the list are opaque.
    pub fn palette_alpha(&self, index: usize) -> u8 {
        match self {
            Self::Indexed(alphas) => *alphas.get(index).unwrap_or(&255),
            _ => u8::MAX,
        }
    }

    pub(crate) fn payload(&self) -> Vec<u8> {
        match self {
            Self::Greyscale(grey) => grey.to_be_bytes().to_vec(),
            Self::Truecolor(r, g, b) => [r.to_be_bytes(), g.to_be_bytes(), b.to_be_bytes()].concat(),
            Self::Indexed(alphas) => alphas.clone(),
        }
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        frame_chunk(Self::HEADER, &self.payload())
    }
}
