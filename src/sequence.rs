use crate::{
    bitmap::{Bitmap, Delay, FrameControl},
    chunks::{actl::acTLChunk, ihdr::IHDRChunk, plte::PLTEChunk, text::TextEntry, trns::tRNSChunk},
};

pub type Header = IHDRChunk;
pub type Palette = PLTEChunk;
pub type Transparency = tRNSChunk;
pub type AnimationControl = acTLChunk;

/// How the default image relates to the animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationType {
    /// A still image.
    #[default]
    None,
    /// The default image is the first animation frame.
    Animated,
    /// The default image is shown only by viewers without APNG support.
    SkipFirst,
}

/// Everything one PNG/APNG stream holds, decoded.
///
/// `bitmaps` is in stream order; `bitmaps[0]` is always the default (IDAT)
/// image. Which of them belong to the animation depends on `animation_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapSequence {
    pub header: Header,
    pub bitmaps: Vec<Bitmap>,
    pub palette: Option<Palette>,
    pub transparency: Option<Transparency>,
    pub animation_control: Option<AnimationControl>,
    pub animation_type: AnimationType,
    pub text: Vec<TextEntry>,
    pub(crate) optimized: bool,
}

impl BitmapSequence {
    /// An empty sequence for `header`; used by the decoder as it fills in.
    pub fn new(header: Header) -> Self {
        Self {
            header,
            bitmaps: Vec::new(),
            palette: None,
            transparency: None,
            animation_control: None,
            animation_type: AnimationType::None,
            text: Vec::new(),
            optimized: false,
        }
    }

    /// A single still image.
    pub fn still(header: Header, bitmap: Bitmap) -> Self {
        Self {
            bitmaps: vec![bitmap],
            ..Self::new(header)
        }
    }

    /// Full-canvas animation frames, each shown for `delay` unless it already
    /// carries a frame control.
    pub fn animated(header: Header, frames: Vec<Bitmap>, delay: Delay, num_plays: u32) -> Self {
        let bitmaps = frames
            .into_iter()
            .map(|bitmap| match bitmap.frame_control {
                Some(_) => bitmap,
                None => {
                    let control = FrameControl::full(bitmap.width(), bitmap.height(), delay);
                    bitmap.with_frame_control(control)
                }
            })
            .collect::<Vec<_>>();
        Self {
            animation_control: Some(AnimationControl {
                num_frames: bitmaps.len() as u32,
                num_plays,
            }),
            animation_type: AnimationType::Animated,
            bitmaps,
            ..Self::new(header)
        }
    }

    pub fn is_animated(&self) -> bool {
        self.animation_type != AnimationType::None
    }

    /// Whether frames are stored as deltas (see [`crate::optimizer`]).
    pub fn is_optimized(&self) -> bool {
        self.optimized
    }

    /// The image a non-animating viewer shows.
    pub fn default_image(&self) -> Option<&Bitmap> {
        self.bitmaps.first()
    }

    /// Index into `bitmaps` of the first animation frame.
    pub(crate) fn first_frame_index(&self) -> usize {
        match self.animation_type {
            AnimationType::SkipFirst => 1,
            _ => 0,
        }
    }

    pub fn animation_frames(&self) -> &[Bitmap] {
        match self.animation_type {
            AnimationType::None => &[],
            _ => self.bitmaps.get(self.first_frame_index()..).unwrap_or_default(),
        }
    }

    /// Re-derives acTL's frame count after frames were added or dropped.
    pub(crate) fn sync_frame_count(&mut self) {
        let num_frames = self.animation_frames().len() as u32;
        if let Some(control) = self.animation_control.as_mut() {
            control.num_frames = num_frames;
        }
    }

    /// Every pixel of every bitmap, default image included.
    pub fn pixels(&self) -> impl Iterator<Item = u32> + '_ {
        self.bitmaps.iter().flat_map(|b| b.pixels().iter().copied())
    }
}
