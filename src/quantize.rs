use std::collections::HashMap;

use log::debug;

use crate::{
    bitmap::Bitmap,
    chunks::{ihdr::ColorType, plte::PLTEChunk, trns::tRNSChunk},
    color::{index_bit_depth, ColorAnalyzer},
    error::Result,
    pixel::Pixel,
    sequence::BitmapSequence,
};

/// Greedy palette reduction: keep the most frequent colors, send every other
/// color to its nearest kept one.
pub struct Quantizer {
    /// Most frequent first; equal counts by ascending value.
    colors: Vec<(u32, u64)>,
}

impl Quantizer {
    pub fn new(histogram: &HashMap<u32, u64>) -> Self {
        let mut colors = histogram
            .iter()
            .map(|(&argb, &count)| (argb, count))
            .collect::<Vec<_>>();
        colors.sort_by_key(|&(argb, count)| (std::cmp::Reverse(count), argb));
        Self { colors }
    }

    pub fn from_analyzer(analyzer: &ColorAnalyzer) -> Self {
        Self::new(analyzer.histogram())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn rollup(&self, limit: usize) -> Rollup {
        let keep = limit.min(self.colors.len());
        let palette = self.colors[..keep]
            .iter()
            .map(|&(argb, _)| argb)
            .collect::<Vec<_>>();
        let kept = palette.iter().map(|&argb| Pixel::from_argb(argb)).collect::<Vec<_>>();
        let relocations = self.colors[keep..]
            .iter()
            .filter_map(|&(argb, _)| {
                let dropped = Pixel::from_argb(argb);
                let nearest = kept
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, candidate)| candidate.distance(&dropped))?
                    .0;
                Some((argb, nearest))
            })
            .collect::<HashMap<_, _>>();
        debug!(
            "kept {} colors, relocated {}",
            palette.len(),
            relocations.len()
        );
        Rollup {
            palette,
            relocations,
        }
    }
}

/// Result of [`Quantizer::rollup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollup {
    pub palette: Vec<u32>,
    /// Dropped color to the index of its replacement in `palette`.
    pub relocations: HashMap<u32, usize>,
}

impl Rollup {
    /// The color `argb` turns into.
    pub fn map(&self, argb: u32) -> u32 {
        match self.relocations.get(&argb) {
            Some(&index) => self.palette[index],
            None => argb,
        }
    }

    pub fn apply(&self, bitmap: &mut Bitmap) {
        for pixel in bitmap.pixels_mut() {
            *pixel = self.map(*pixel);
        }
    }
}

/// Rewrites `sequence` as an indexed image of at most `limit` (1 to 256)
/// colors. Lossy whenever the sequence had more.
pub fn quantize_sequence(sequence: &mut BitmapSequence, limit: usize) -> Result<()> {
    let limit = limit.clamp(1, PLTEChunk::MAX_ENTRIES);
    let analyzer = ColorAnalyzer::from_sequence(sequence);
    let rollup = Quantizer::from_analyzer(&analyzer).rollup(limit);
    for bitmap in &mut sequence.bitmaps {
        rollup.apply(bitmap);
    }

    let palette = PLTEChunk::from_argb(&rollup.palette)?;
    let last_translucent = rollup
        .palette
        .iter()
        .rposition(|&argb| Pixel::from_argb(argb).alpha != u8::MAX);
    sequence.transparency = last_translucent.map(|last| {
        tRNSChunk::Indexed(
            rollup.palette[..=last]
                .iter()
                .map(|&argb| Pixel::from_argb(argb).alpha)
                .collect(),
        )
    });
    sequence.header.color_type = ColorType::IndexedColor;
    sequence.header.bit_depth = index_bit_depth(palette.len());
    sequence.palette = Some(palette);
    Ok(())
}
