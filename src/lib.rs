mod bitmap;
mod chunks;
mod color;
mod decoder;
mod encoder;
mod error;
mod filters;
mod image_data;
mod interlacing;
pub mod optimizer;
mod options;
mod pixel;
mod png;
mod progress;
mod quantize;
mod scanlines;
mod sequence;
mod utils;

pub use bitmap::{Bitmap, BlendOp, Delay, DisposeOp, FrameControl, Rect};
pub use chunks::{
    actl::acTLChunk,
    ihdr::{ColorType, IHDRChunk, Interlacing},
    plte::{Entry, PLTEChunk},
    text::{TextEntry, TextKind},
    trns::tRNSChunk,
    ChunkInfo,
};
pub use color::{ColorAnalyzer, Suggestion};
pub use decoder::{Chunks, PNGDecoder, Start};
pub use encoder::PNGEncoder;
pub use error::{ErrorKind, PngError, Result};
pub use options::{DecodeOptions, EncodeOptions};
pub use pixel::Pixel;
pub use png::PNG;
pub use progress::{NoProgress, ProgressSink};
pub use quantize::{quantize_sequence, Quantizer, Rollup};
pub use sequence::{
    AnimationControl, AnimationType, BitmapSequence, Header, Palette, Transparency,
};
