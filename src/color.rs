use std::collections::{HashMap, HashSet};

use crate::{
    bitmap::Bitmap,
    chunks::{ihdr::ColorType, plte::PLTEChunk, trns::tRNSChunk},
    error::Result,
    pixel::Pixel,
    sequence::{BitmapSequence, Header},
};

/// Population counts and a histogram of distinct `0xAARRGGBB` values, built in
/// one pass over the pixels.
#[derive(Debug, Clone, Default)]
pub struct ColorAnalyzer {
    pub grey: u64,
    pub non_grey: u64,
    /// Alpha 0.
    pub transparent: u64,
    /// Alpha 0 with color left in the RGB channels.
    pub bogus_transparent: u64,
    /// Alpha strictly between 0 and 255.
    pub translucent: u64,
    pub opaque: u64,
    pub total: u64,
    histogram: HashMap<u32, u64>,
}

impl ColorAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sequence(sequence: &BitmapSequence) -> Self {
        let mut analyzer = Self::new();
        for bitmap in &sequence.bitmaps {
            analyzer.add_bitmap(bitmap);
        }
        analyzer
    }

    pub fn add_bitmap(&mut self, bitmap: &Bitmap) {
        for &argb in bitmap.pixels() {
            self.add(argb);
        }
    }

    pub fn add(&mut self, argb: u32) {
        let pixel = Pixel::from_argb(argb);
        if pixel.is_grey() {
            self.grey += 1;
        } else {
            self.non_grey += 1;
        }
        match pixel.alpha {
            0 => {
                self.transparent += 1;
                if argb != Pixel::TRANSPARENT {
                    self.bogus_transparent += 1;
                }
            }
            u8::MAX => self.opaque += 1,
            _ => self.translucent += 1,
        }
        self.total += 1;
        *self.histogram.entry(argb).or_default() += 1;
    }

    pub fn distinct_colors(&self) -> usize {
        self.histogram.len()
    }

    pub fn histogram(&self) -> &HashMap<u32, u64> {
        &self.histogram
    }

    /// The cheapest color type that represents every analyzed pixel.
    pub fn suggest(&self) -> Suggestion {
        let all_grey = self.non_grey == 0;
        if self.total > 0 && self.transparent == self.total {
            // Nothing visible to key against; the result drops alpha.
            return Suggestion {
                color_type: if all_grey {
                    ColorType::Greyscale
                } else {
                    ColorType::Truecolor
                },
                bit_depth: 8,
                palette: None,
                transparency: None,
                lossless: false,
            };
        }

        if self.distinct_colors() <= PLTEChunk::MAX_ENTRIES {
            return self.indexed();
        }

        if self.transparent == 0 && self.translucent == 0 {
            return Suggestion::direct(all_grey, false, None);
        }
        if self.translucent == 0 && self.bogus_transparent == 0 {
            if let Some(key) = self.unused_key(all_grey) {
                return Suggestion::direct(all_grey, false, Some(key));
            }
        }
        Suggestion::direct(all_grey, true, None)
    }

    /// Palette with the non-opaque entries first so tRNS stays short, the rest
    /// by descending frequency.
    fn indexed(&self) -> Suggestion {
        let mut entries = self
            .histogram
            .iter()
            .map(|(&argb, &count)| (argb, count))
            .collect::<Vec<_>>();
        entries.sort_by_key(|&(argb, count)| {
            (
                Pixel::from_argb(argb).alpha == u8::MAX,
                std::cmp::Reverse(count),
                argb,
            )
        });
        let palette = entries.into_iter().map(|(argb, _)| argb).collect::<Vec<_>>();
        let alphas = palette
            .iter()
            .map(|&argb| Pixel::from_argb(argb).alpha)
            .take_while(|&alpha| alpha != u8::MAX)
            .collect::<Vec<_>>();
        Suggestion {
            color_type: ColorType::IndexedColor,
            bit_depth: index_bit_depth(palette.len()),
            transparency: (!alphas.is_empty()).then_some(tRNSChunk::Indexed(alphas)),
            palette: Some(palette),
            lossless: true,
        }
    }

    /// Lowest color no visible pixel uses, by linear scan.
    fn unused_key(&self, grey: bool) -> Option<tRNSChunk> {
        let used = self
            .histogram
            .keys()
            .filter(|&&argb| Pixel::from_argb(argb).alpha != 0)
            .map(|&argb| argb & 0x00ff_ffff)
            .collect::<HashSet<_>>();
        if grey {
            (0..=u8::MAX)
                .find(|&v| !used.contains(&Pixel::new(v, v, v, 0).to_argb()))
                .map(|v| tRNSChunk::Greyscale(v as u16))
        } else {
            (0..=0x00ff_ffffu32).find(|rgb| !used.contains(rgb)).map(|rgb| {
                let key = Pixel::from_argb(rgb);
                tRNSChunk::Truecolor(key.red as u16, key.green as u16, key.blue as u16)
            })
        }
    }
}

/// Smallest of 1, 2, 4 or 8 bits that can index `len` entries.
pub(crate) fn index_bit_depth(len: usize) -> u8 {
    match len {
        0..=2 => 1,
        3..=4 => 2,
        5..=16 => 4,
        _ => 8,
    }
}

/// A color type (and what goes with it) for a population of pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub color_type: ColorType,
    pub bit_depth: u8,
    /// Entries as `0xAARRGGBB`, for indexed suggestions.
    pub palette: Option<Vec<u32>>,
    pub transparency: Option<tRNSChunk>,
    /// False when writing with this suggestion would change some pixels.
    pub lossless: bool,
}

impl Suggestion {
    fn direct(grey: bool, alpha: bool, key: Option<tRNSChunk>) -> Self {
        let color_type = match (grey, alpha) {
            (true, false) => ColorType::Greyscale,
            (true, true) => ColorType::GreyscaleWithAlpha,
            (false, false) => ColorType::Truecolor,
            (false, true) => ColorType::TruecolorWithAlpha,
        };
        Self {
            color_type,
            bit_depth: 8,
            palette: None,
            transparency: key,
            lossless: true,
        }
    }

    pub fn needs_trns(&self) -> bool {
        self.transparency.is_some()
    }

    /// Bits per pixel this suggestion would write.
    pub fn pixel_width(&self) -> usize {
        self.color_type.channel_count() as usize * self.bit_depth as usize
    }

    /// `base` with this color type and depth; size and interlacing are kept.
    pub fn header(&self, base: &Header) -> Header {
        Header {
            color_type: self.color_type,
            bit_depth: self.bit_depth,
            ..*base
        }
    }

    pub fn palette_chunk(&self) -> Result<Option<PLTEChunk>> {
        self.palette
            .as_deref()
            .map(PLTEChunk::from_argb)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(pixels: &[u32]) -> ColorAnalyzer {
        let mut analyzer = ColorAnalyzer::new();
        for &argb in pixels {
            analyzer.add(argb);
        }
        analyzer
    }

    #[test]
    fn counts_every_category() {
        let analyzer = analyze(&[0, 0x0012_3456, 0x80ff_ffff, 0xff10_1010, 0xff10_1010]);
        assert_eq!(analyzer.total, 5);
        assert_eq!(analyzer.transparent, 2);
        assert_eq!(analyzer.bogus_transparent, 1);
        assert_eq!(analyzer.translucent, 1);
        assert_eq!(analyzer.opaque, 2);
        assert_eq!(analyzer.grey, 4);
        assert_eq!(analyzer.non_grey, 1);
        assert_eq!(analyzer.distinct_colors(), 4);
        assert_eq!(analyzer.histogram()[&0xff10_1010], 2);
    }

    #[test]
    fn fully_transparent_black_needs_no_trns() {
        let suggestion = analyze(&[0; 16]).suggest();
        assert!(matches!(
            suggestion.color_type,
            ColorType::Greyscale | ColorType::Truecolor
        ));
        assert!(!suggestion.needs_trns());
        assert!(!suggestion.lossless);
    }

    #[test]
    fn few_colors_become_a_palette() {
        let suggestion = analyze(&[
            0xff00_0000,
            0xff00_0000,
            0xff00_0000,
            0xffff_0000,
            0x0000_0000,
        ])
        .suggest();
        insta::assert_debug_snapshot!(suggestion, @r###"
        Suggestion {
            color_type: IndexedColor,
            bit_depth: 2,
            palette: Some(
                [
                    0,
                    4278190080,
                    4294901760,
                ],
            ),
            transparency: Some(
                Indexed(
                    [
                        0,
                    ],
                ),
            ),
            lossless: true,
        }
        "###);
    }

    fn many_colors(alpha: u8) -> Vec<u32> {
        (0..300u32)
            .map(|i| Pixel::new((i % 256) as u8, (i / 256) as u8, 7, alpha).to_argb())
            .collect()
    }

    #[test]
    fn many_opaque_colors_are_truecolor() {
        let suggestion = analyze(&many_colors(255)).suggest();
        assert_eq!(suggestion.color_type, ColorType::Truecolor);
        assert!(!suggestion.needs_trns());
    }

    #[test]
    fn transparent_pixels_get_a_color_key() {
        let mut pixels = many_colors(255);
        pixels.push(0);
        // The first free RGB value; 0x000007 is taken.
        let suggestion = analyze(&pixels).suggest();
        assert_eq!(suggestion.color_type, ColorType::Truecolor);
        assert_eq!(suggestion.transparency, Some(tRNSChunk::Truecolor(0, 0, 0)));

        pixels.push(0xff00_0000);
        let suggestion = analyze(&pixels).suggest();
        assert_eq!(suggestion.transparency, Some(tRNSChunk::Truecolor(0, 0, 1)));
    }

    #[test]
    fn translucency_needs_an_alpha_channel() {
        let suggestion = analyze(&many_colors(128)).suggest();
        assert_eq!(suggestion.color_type, ColorType::TruecolorWithAlpha);
        assert!(!suggestion.needs_trns());
    }

    #[test]
    fn grey_population_stays_grey() {
        let mut pixels = (0..=255u8)
            .flat_map(|v| [Pixel::new(v, v, v, 255).to_argb(), Pixel::new(v, v, v, 40).to_argb()])
            .collect::<Vec<_>>();
        let suggestion = analyze(&pixels).suggest();
        assert_eq!(suggestion.color_type, ColorType::GreyscaleWithAlpha);
        pixels.retain(|&argb| Pixel::from_argb(argb).alpha == 255);
        pixels.push(0);
        pixels.push(0xff12_3456);
        // 258 distinct colors, one of them not grey.
        assert_eq!(analyze(&pixels).suggest().color_type, ColorType::Truecolor);
    }

    #[test]
    fn index_depth_is_the_smallest_that_fits() {
        assert_eq!(index_bit_depth(1), 1);
        assert_eq!(index_bit_depth(2), 1);
        assert_eq!(index_bit_depth(3), 2);
        assert_eq!(index_bit_depth(16), 4);
        assert_eq!(index_bit_depth(17), 8);
        assert_eq!(index_bit_depth(256), 8);
    }
}
