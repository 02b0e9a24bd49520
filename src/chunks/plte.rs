use super::{finish, trns::tRNSChunk, ParseableChunk};
use crate::{
    error::{PngError, Result},
    pixel::Pixel,
};
use nom::{bytes::complete::take, combinator::map, multi::count};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entry(pub u8, pub u8, pub u8);

/// Palette of up to 256 RGB entries. Alpha lives in a separate tRNS chunk
/// and only meets the colors through [`PLTEChunk::merged_argb`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PLTEChunk {
    colors: Vec<Entry>,
}
impl PLTEChunk {
    pub const MAX_ENTRIES: usize = 256;

    pub fn new(colors: Vec<Entry>) -> Result<Self> {
        if colors.is_empty() || colors.len() > Self::MAX_ENTRIES {
            return Err(PngError::TooManyColors {
                count: colors.len(),
            });
        }
        Ok(Self { colors })
    }

    /// Palette from packed pixels; alpha is dropped.
    pub fn from_argb(colors: &[u32]) -> Result<Self> {
        Self::new(
            colors
                .iter()
                .map(|&argb| {
                    let p = Pixel::from_argb(argb);
                    Entry(p.red, p.green, p.blue)
                })
                .collect(),
        )
    }

    pub fn get_color(&self, index: u8) -> Option<&Entry> {
        self.colors.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Entry] {
        &self.colors
    }

    /// Entries as `0xAARRGGBB`, alpha taken from `transparency` when it holds
    /// per-index values and opaque otherwise.
    pub fn merged_argb(&self, transparency: Option<&tRNSChunk>) -> Vec<u32> {
        self.colors
            .iter()
            .enumerate()
            .map(|(index, &Entry(red, green, blue))| {
                let alpha = transparency
                    .map(|t| t.palette_alpha(index))
                    .unwrap_or(u8::MAX);
                Pixel::new(red, green, blue, alpha).to_argb()
            })
            .collect()
    }
}
impl<'a> ParseableChunk<'a> for PLTEChunk {
    const HEADER: &'static [u8; 4] = b"PLTE";

    fn from_bytes(chunk_data: &'a [u8]) -> Result<Self> {
        let entry_count = chunk_data.len() / 3;
        if chunk_data.len() % 3 != 0 || entry_count == 0 || entry_count > Self::MAX_ENTRIES {
            return Err(PngError::MalformedChunk {
                chunk: "PLTE",
                reason: format!("{} bytes is not 1 to 256 RGB entries", chunk_data.len()),
            });
        }
        let colors = finish(
            Self::HEADER,
            count(
                map(take(3usize), |i: &[u8]| Entry(i[0], i[1], i[2])),
                entry_count,
            )(chunk_data),
        )?;
        Ok(PLTEChunk { colors })
    }

    fn payload(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|&Entry(r, g, b)| [r, g, b])
            .collect()
    }
}
