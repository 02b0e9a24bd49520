use nom::{
    number::complete::{be_u32, u8},
    sequence::tuple,
};

use super::{finish, ParseableChunk};
use crate::{
    error::{PngError, Result},
    scanlines::Layout,
    utils::div_ceil,
};

/// Image header: canvas size and the pixel encoding every frame shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IHDRChunk {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: Interlacing,
}
impl IHDRChunk {
    pub fn new(width: u32, height: u32, color_type: ColorType, bit_depth: u8) -> Self {
        Self {
            width,
            height,
            bit_depth,
            color_type,
            compression_method: 0,
            filter_method: 0,
            interlace_method: Interlacing::None,
        }
    }

    pub fn interlaced(mut self) -> Self {
        self.interlace_method = Interlacing::Adam7;
        self
    }

    /// Bytes per complete pixel, rounded up to one; the distance filters
    /// look back by.
    pub(crate) fn filter_width(&self) -> usize {
        let channel_count = self.color_type.channel_count() as usize;
        let sample_width = usize::max(self.bit_depth as usize / 8, 1);
        channel_count * sample_width
    }

    /// Bits per pixel.
    pub fn pixel_width(&self) -> usize {
        self.color_type.channel_count() as usize * self.bit_depth as usize
    }

    /// Filter-type byte plus packed samples for a row `width` pixels wide.
    pub(crate) fn scanline_size(&self, width: usize) -> usize {
        div_ceil(width * self.pixel_width(), 8) + 1
    }

    /// Whether rows get the adaptive filter search or always filter `None`.
    pub(crate) fn adaptive_filtering(&self) -> bool {
        self.color_type != ColorType::IndexedColor && self.bit_depth >= 8
    }

    pub(crate) fn layout(&self) -> Result<Layout> {
        Layout::select(self.color_type, self.bit_depth).ok_or(PngError::UnsupportedColorType {
            color_type: self.color_type as u8,
            bit_depth: self.bit_depth,
        })
    }
}
impl<'a> ParseableChunk<'a> for IHDRChunk {
    const HEADER: &'static [u8; 4] = b"IHDR";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let (width, height, bit_depth, color_type, compression_method, filter_method, interlace) =
            finish(
                Self::HEADER,
                tuple((be_u32, be_u32, u8, u8, u8, u8, u8))(chunk_data),
            )?;
        if width == 0 || height == 0 {
            return Err(PngError::MalformedChunk {
                chunk: "IHDR",
                reason: format!("empty {width}x{height} image"),
            });
        }
        if compression_method != 0 {
            return Err(PngError::UnsupportedMethod {
                kind: "compression",
                value: compression_method,
            });
        }
        if filter_method != 0 {
            return Err(PngError::UnsupportedMethod {
                kind: "filter",
                value: filter_method,
            });
        }
        let header = IHDRChunk {
            width,
            height,
            bit_depth,
            color_type: ColorType::from_u8(color_type).ok_or(PngError::UnsupportedColorType {
                color_type,
                bit_depth,
            })?,
            compression_method,
            filter_method,
            interlace_method: interlace.try_into()?,
        };
        header.layout()?;
        Ok(header)
    }

    fn payload(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(13);
        bytes.extend(&self.width.to_be_bytes());
        bytes.extend(&self.height.to_be_bytes());
        bytes.extend(&[
            self.bit_depth,
            self.color_type as u8,
            self.compression_method,
            self.filter_method,
            self.interlace_method as u8,
        ]);
        bytes
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorType {
    #[default]
    Greyscale = 0,
    Truecolor = 2,
    IndexedColor = 3,
    GreyscaleWithAlpha = 4,
    TruecolorWithAlpha = 6,
}
impl ColorType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Greyscale),
            2 => Some(Self::Truecolor),
            3 => Some(Self::IndexedColor),
            4 => Some(Self::GreyscaleWithAlpha),
            6 => Some(Self::TruecolorWithAlpha),
            _ => None,
        }
    }

    pub fn channel_count(&self) -> u8 {
        match self {
            Self::Greyscale => 1,
            Self::IndexedColor => 1,
            Self::GreyscaleWithAlpha => 2,
            Self::Truecolor => 3,
            Self::TruecolorWithAlpha => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::GreyscaleWithAlpha | Self::TruecolorWithAlpha)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interlacing {
    #[default]
    None = 0,
    Adam7 = 1,
}
impl TryFrom<u8> for Interlacing {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Adam7),
            v => Err(PngError::UnsupportedInterlace(v)),
        }
    }
}
