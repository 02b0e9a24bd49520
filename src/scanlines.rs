use std::collections::HashMap;

use crate::{
    bitmap::Bitmap,
    chunks::{ihdr::ColorType, ihdr::IHDRChunk, plte::PLTEChunk, trns::tRNSChunk},
    error::{PngError, Result},
    pixel::Pixel,
};

/// Which codec handles a color type / bit depth pairing. [`Layout::select`] is
/// the only place that decides this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    TrueColor { alpha: bool, sixteen_bit: bool },
    Indexed { bit_depth: u8, greyscale: bool },
    Greyscale { alpha: bool, bit_depth: u8 },
}
impl Layout {
    pub(crate) fn select(color_type: ColorType, bit_depth: u8) -> Option<Self> {
        use ColorType::*;
        let layout = match (color_type, bit_depth) {
            (Truecolor, 8 | 16) => Self::TrueColor {
                alpha: false,
                sixteen_bit: bit_depth == 16,
            },
            (TruecolorWithAlpha, 8 | 16) => Self::TrueColor {
                alpha: true,
                sixteen_bit: bit_depth == 16,
            },
            (IndexedColor, 1 | 2 | 4 | 8) => Self::Indexed {
                bit_depth,
                greyscale: false,
            },
            (Greyscale, 1 | 2 | 4) => Self::Indexed {
                bit_depth,
                greyscale: true,
            },
            (Greyscale, 8 | 16) => Self::Greyscale {
                alpha: false,
                bit_depth,
            },
            // 4-bit luminance/alpha nibble pairs are accepted alongside the
            // standard depths.
            (GreyscaleWithAlpha, 4 | 8 | 16) => Self::Greyscale {
                alpha: true,
                bit_depth,
            },
            _ => return None,
        };
        Some(layout)
    }
}

/// Converts between packed scanline bytes and a bitmap's pixels.
///
/// `write` decodes one (possibly strided) row of samples into the bitmap,
/// `read` packs one back out. Rows visit columns `offset_x, offset_x + step_x, ...`
/// of canvas line `line`.
pub(crate) enum ScanlineCodec {
    TrueColor(TrueColor),
    Indexed(Indexed),
    Greyscale(Greyscale),
}
impl ScanlineCodec {
    /// Codec for reading. An indexed image's palette may still be missing at
    /// this point; that is reported by the first `write`.
    pub(crate) fn for_decode(
        header: &IHDRChunk,
        palette: Option<&PLTEChunk>,
        transparency: Option<&tRNSChunk>,
    ) -> Result<Self> {
        Ok(match header.layout()? {
            Layout::TrueColor { alpha, sixteen_bit } => Self::TrueColor(TrueColor {
                alpha,
                sixteen_bit,
                key: truecolor_key(transparency, alpha),
            }),
            Layout::Greyscale { alpha, bit_depth } => Self::Greyscale(Greyscale {
                alpha,
                bit_depth,
                key: greyscale_key(transparency, alpha),
            }),
            Layout::Indexed {
                bit_depth,
                greyscale,
            } => {
                let palette = if greyscale {
                    Some(grey_ramp(bit_depth))
                } else {
                    palette.map(|p| p.merged_argb(None))
                };
                Self::Indexed(Indexed {
                    bit_depth,
                    palette,
                    pending_transparency: transparency.cloned(),
                    lookup: HashMap::new(),
                })
            }
        })
    }

    /// Codec for writing; transparency is folded into the palette up front.
    pub(crate) fn for_encode(
        header: &IHDRChunk,
        palette: Option<&PLTEChunk>,
        transparency: Option<&tRNSChunk>,
    ) -> Result<Self> {
        match Self::for_decode(header, palette, transparency)? {
            Self::Indexed(mut indexed) => {
                if indexed.palette.is_none() {
                    return Err(PngError::MissingPalette);
                }
                indexed.merge_transparency()?;
                indexed.build_lookup();
                Ok(Self::Indexed(indexed))
            }
            codec => Ok(codec),
        }
    }

    pub(crate) fn write(
        &mut self,
        bitmap: &mut Bitmap,
        src: &[u8],
        offset_x: usize,
        step_x: usize,
        line: usize,
    ) -> Result<()> {
        let width = bitmap.width() as usize;
        let row = &mut bitmap.pixels_mut()[line * width..(line + 1) * width];
        match self {
            Self::TrueColor(codec) => codec.write(row, src, offset_x, step_x),
            Self::Greyscale(codec) => codec.write(row, src, offset_x, step_x),
            Self::Indexed(codec) => codec.write(row, src, offset_x, step_x)?,
        }
        Ok(())
    }

    pub(crate) fn read(
        &self,
        bitmap: &Bitmap,
        dest: &mut [u8],
        offset_x: usize,
        step_x: usize,
        line: usize,
    ) {
        let row = bitmap.row(line as u32);
        match self {
            Self::TrueColor(codec) => codec.read(row, dest, offset_x, step_x),
            Self::Greyscale(codec) => codec.read(row, dest, offset_x, step_x),
            Self::Indexed(codec) => codec.read(row, dest, offset_x, step_x),
        }
    }
}

fn truecolor_key(transparency: Option<&tRNSChunk>, alpha: bool) -> Option<[u16; 3]> {
    match transparency {
        Some(tRNSChunk::Truecolor(r, g, b)) if !alpha => Some([*r, *g, *b]),
        _ => None,
    }
}

fn greyscale_key(transparency: Option<&tRNSChunk>, alpha: bool) -> Option<u16> {
    match transparency {
        Some(tRNSChunk::Greyscale(grey)) if !alpha => Some(*grey),
        _ => None,
    }
}

/// Evenly spaced opaque greys for a low bit depth greyscale image.
pub(crate) fn grey_ramp(bit_depth: u8) -> Vec<u32> {
    let levels = 1u32 << bit_depth;
    (0..levels)
        .map(|i| {
            let v = (i * 255 / (levels - 1)) as u8;
            Pixel::new(v, v, v, u8::MAX).to_argb()
        })
        .collect()
}

/// A pixel value that encodes to something reading back with alpha 0, or
/// `None` when the layout has no way to store one. Key-based layouts also
/// need [`hits_color_key`] to be false for every visible pixel.
pub(crate) fn transparent_value(
    header: &IHDRChunk,
    palette: Option<&PLTEChunk>,
    transparency: Option<&tRNSChunk>,
) -> Option<u32> {
    match (Layout::select(header.color_type, header.bit_depth)?, transparency) {
        (Layout::TrueColor { alpha: true, .. } | Layout::Greyscale { alpha: true, .. }, _) => {
            Some(Pixel::TRANSPARENT)
        }
        (Layout::TrueColor { .. }, Some(tRNSChunk::Truecolor(..)))
        | (Layout::Greyscale { .. }, Some(tRNSChunk::Greyscale(_))) => Some(Pixel::TRANSPARENT),
        (Layout::Indexed { bit_depth, greyscale: true }, Some(tRNSChunk::Greyscale(key))) => {
            (u32::from(*key) < 1 << bit_depth).then_some(Pixel::TRANSPARENT)
        }
        (Layout::Indexed { greyscale: false, .. }, Some(transparency)) => palette?
            .merged_argb(Some(transparency))
            .into_iter()
            .find(|&argb| Pixel::from_argb(argb).alpha == 0),
        _ => None,
    }
}

/// Whether a visible pixel lands on the tRNS color key and would read back
/// fully transparent.
pub(crate) fn hits_color_key(
    header: &IHDRChunk,
    transparency: Option<&tRNSChunk>,
    argb: u32,
) -> bool {
    let pixel = Pixel::from_argb(argb);
    if pixel.alpha == 0 {
        return false;
    }
    let sixteen_bit = header.bit_depth == 16;
    match (Layout::select(header.color_type, header.bit_depth), transparency) {
        (Some(Layout::TrueColor { alpha: false, .. }), Some(tRNSChunk::Truecolor(r, g, b))) => {
            [pixel.red, pixel.green, pixel.blue].map(|c| widen(c, sixteen_bit)) == [*r, *g, *b]
        }
        (Some(Layout::Greyscale { alpha: false, .. }), Some(tRNSChunk::Greyscale(key))) => {
            widen(pixel.luminance(), sixteen_bit) == *key
        }
        (Some(Layout::Indexed { bit_depth, greyscale: true }), Some(tRNSChunk::Greyscale(key))) => {
            grey_ramp(bit_depth).get(*key as usize) == Some(&argb)
        }
        _ => false,
    }
}

fn columns(width: usize, offset_x: usize, step_x: usize) -> impl Iterator<Item = (usize, usize)> {
    (offset_x..width).step_by(step_x).enumerate()
}

/// Sample `channel` of a pixel at `stride` bytes: the full value and the
/// byte kept when decoding (the high byte of a 16-bit sample).
fn sample(px: &[u8], channel: usize, sixteen_bit: bool) -> (u16, u8) {
    if sixteen_bit {
        let hi = px[channel * 2];
        (u16::from_be_bytes([hi, px[channel * 2 + 1]]), hi)
    } else {
        (px[channel] as u16, px[channel])
    }
}

fn put_sample(px: &mut [u8], channel: usize, value: u16, sixteen_bit: bool) {
    if sixteen_bit {
        px[channel * 2..channel * 2 + 2].copy_from_slice(&value.to_be_bytes());
    } else {
        px[channel] = value as u8;
    }
}

/// Widens an 8-bit value to the output sample size.
fn widen(value: u8, sixteen_bit: bool) -> u16 {
    if sixteen_bit {
        value as u16 * 257
    } else {
        value as u16
    }
}

/// Color types 2 and 6. 16-bit samples keep only their high byte.
pub(crate) struct TrueColor {
    alpha: bool,
    sixteen_bit: bool,
    key: Option<[u16; 3]>,
}
impl TrueColor {
    fn stride(&self) -> usize {
        let channels = if self.alpha { 4 } else { 3 };
        channels * if self.sixteen_bit { 2 } else { 1 }
    }

    fn write(&self, row: &mut [u32], src: &[u8], offset_x: usize, step_x: usize) {
        let stride = self.stride();
        for (i, x) in columns(row.len(), offset_x, step_x) {
            let px = &src[i * stride..(i + 1) * stride];
            let (r, red) = sample(px, 0, self.sixteen_bit);
            let (g, green) = sample(px, 1, self.sixteen_bit);
            let (b, blue) = sample(px, 2, self.sixteen_bit);
            row[x] = if self.key == Some([r, g, b]) {
                Pixel::TRANSPARENT
            } else {
                let alpha = if self.alpha {
                    sample(px, 3, self.sixteen_bit).1
                } else {
                    u8::MAX
                };
                Pixel::new(red, green, blue, alpha).to_argb()
            };
        }
    }

    fn read(&self, row: &[u32], dest: &mut [u8], offset_x: usize, step_x: usize) {
        let stride = self.stride();
        for (i, x) in columns(row.len(), offset_x, step_x) {
            let px = &mut dest[i * stride..(i + 1) * stride];
            let pixel = Pixel::from_argb(row[x]);
            let rgb = match self.key {
                Some(key) if pixel.alpha == 0 => key,
                _ => [
                    widen(pixel.red, self.sixteen_bit),
                    widen(pixel.green, self.sixteen_bit),
                    widen(pixel.blue, self.sixteen_bit),
                ],
            };
            for (channel, value) in rgb.into_iter().enumerate() {
                put_sample(px, channel, value, self.sixteen_bit);
            }
            if self.alpha {
                put_sample(px, 3, widen(pixel.alpha, self.sixteen_bit), self.sixteen_bit);
            }
        }
    }
}

/// 4-bit levels, `0x00, 0x11, ..., 0xff`.
const GREY4_TABLE: [u8; 16] = {
    let mut table = [0; 16];
    let mut i = 0;
    while i < 16 {
        table[i] = i as u8 * 0x11;
        i += 1;
    }
    table
};

fn nearest_grey4(value: u8) -> u8 {
    let mut best = 0;
    for (i, &level) in GREY4_TABLE.iter().enumerate() {
        if level.abs_diff(value) < GREY4_TABLE[best].abs_diff(value) {
            best = i;
        }
    }
    best as u8
}

/// Color types 0 (8/16-bit) and 4, including 4-bit luminance/alpha pairs.
pub(crate) struct Greyscale {
    alpha: bool,
    bit_depth: u8,
    key: Option<u16>,
}
impl Greyscale {
    fn write(&self, row: &mut [u32], src: &[u8], offset_x: usize, step_x: usize) {
        if self.bit_depth == 4 {
            for (i, x) in columns(row.len(), offset_x, step_x) {
                let byte = src[i];
                let luminance = GREY4_TABLE[(byte >> 4) as usize];
                let alpha = GREY4_TABLE[(byte & 0x0f) as usize];
                row[x] = Pixel::new(luminance, luminance, luminance, alpha).to_argb();
            }
            return;
        }
        let sixteen_bit = self.bit_depth == 16;
        let stride = (1 + self.alpha as usize) * (1 + sixteen_bit as usize);
        for (i, x) in columns(row.len(), offset_x, step_x) {
            let px = &src[i * stride..(i + 1) * stride];
            let (raw, luminance) = sample(px, 0, sixteen_bit);
            row[x] = if self.key == Some(raw) {
                Pixel::TRANSPARENT
            } else {
                let alpha = if self.alpha {
                    sample(px, 1, sixteen_bit).1
                } else {
                    u8::MAX
                };
                Pixel::new(luminance, luminance, luminance, alpha).to_argb()
            };
        }
    }

    fn read(&self, row: &[u32], dest: &mut [u8], offset_x: usize, step_x: usize) {
        if self.bit_depth == 4 {
            for (i, x) in columns(row.len(), offset_x, step_x) {
                let pixel = Pixel::from_argb(row[x]);
                dest[i] = nearest_grey4(pixel.luminance()) << 4 | nearest_grey4(pixel.alpha);
            }
            return;
        }
        let sixteen_bit = self.bit_depth == 16;
        let stride = (1 + self.alpha as usize) * (1 + sixteen_bit as usize);
        for (i, x) in columns(row.len(), offset_x, step_x) {
            let px = &mut dest[i * stride..(i + 1) * stride];
            let pixel = Pixel::from_argb(row[x]);
            let luminance = match self.key {
                Some(key) if pixel.alpha == 0 => key,
                _ => widen(pixel.luminance(), sixteen_bit),
            };
            put_sample(px, 0, luminance, sixteen_bit);
            if self.alpha {
                put_sample(px, 1, widen(pixel.alpha, sixteen_bit), sixteen_bit);
            }
        }
    }
}

/// Palette lookups: color type 3 at every depth, and low-depth greyscale
/// through a synthesized grey ramp.
pub(crate) struct Indexed {
    bit_depth: u8,
    palette: Option<Vec<u32>>,
    /// tRNS waiting to be folded into `palette`; done once, on first decode.
    pending_transparency: Option<tRNSChunk>,
    lookup: HashMap<u32, u8>,
}
impl Indexed {
    fn merge_transparency(&mut self) -> Result<()> {
        let Some(transparency) = self.pending_transparency.take() else {
            return Ok(());
        };
        let palette = self.palette.as_mut().ok_or(PngError::MissingPalette)?;
        match transparency {
            tRNSChunk::Indexed(alphas) => {
                for (entry, alpha) in palette.iter_mut().zip(alphas) {
                    *entry = (*entry & 0x00ff_ffff) | (alpha as u32) << 24;
                }
            }
            tRNSChunk::Greyscale(key) => {
                if let Some(entry) = palette.get_mut(key as usize) {
                    *entry = Pixel::TRANSPARENT;
                }
            }
            tRNSChunk::Truecolor(..) => {}
        }
        Ok(())
    }

    fn build_lookup(&mut self) {
        self.lookup.clear();
        for (index, &argb) in self.palette.iter().flatten().enumerate() {
            self.lookup.entry(argb).or_insert(index as u8);
        }
    }

    fn write(&mut self, row: &mut [u32], src: &[u8], offset_x: usize, step_x: usize) -> Result<()> {
        if self.palette.is_none() {
            return Err(PngError::MissingPalette);
        }
        self.merge_transparency()?;
        let palette = self.palette.as_deref().unwrap_or_default();
        let depth = self.bit_depth as usize;
        let mask = ((1u16 << depth) - 1) as u8;
        for (i, x) in columns(row.len(), offset_x, step_x) {
            let bit = i * depth;
            let shift = 8 - depth - bit % 8;
            let index = (src[bit / 8] >> shift) & mask;
            row[x] = *palette
                .get(index as usize)
                .ok_or(PngError::PaletteIndex {
                    index,
                    len: palette.len(),
                })?;
        }
        Ok(())
    }

    fn index_of(&self, argb: u32) -> u8 {
        if let Some(&index) = self.lookup.get(&argb) {
            return index;
        }
        let target = Pixel::from_argb(argb);
        self.palette
            .iter()
            .flatten()
            .enumerate()
            .min_by_key(|(_, entry)| Pixel::from_argb(**entry).distance(&target))
            .map(|(index, _)| index as u8)
            .unwrap_or_default()
    }

    fn read(&self, row: &[u32], dest: &mut [u8], offset_x: usize, step_x: usize) {
        assert!(
            self.pending_transparency.is_none(),
            "palette transparency has to be merged before a codec encodes"
        );
        dest.fill(0);
        let depth = self.bit_depth as usize;
        for (i, x) in columns(row.len(), offset_x, step_x) {
            let bit = i * depth;
            let shift = 8 - depth - bit % 8;
            dest[bit / 8] |= self.index_of(row[x]) << shift;
        }
    }
}
