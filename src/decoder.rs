use std::marker::PhantomData;

use log::{debug, trace, warn};

use crate::{
    bitmap::{Bitmap, FrameControl},
    chunks::{
        actl::acTLChunk, fctl::fcTLChunk, fdat::fdATChunk, idat::IDATChunk, iend::IENDChunk,
        ihdr::IHDRChunk, iter_chunks, parse_signature, plte::PLTEChunk, split_chunk,
        text::TextEntry, trns::tRNSChunk, ParseableChunk, RawChunk, SIGNATURE,
    },
    error::{PngError, Result},
    image_data::PixelCodec,
    options::DecodeOptions,
    progress::ProgressSink,
    sequence::{AnimationControl, AnimationType, BitmapSequence},
};

/// Reads a PNG/APNG stream. The type parameter tracks how far along it is:
/// the signature is checked by `new`, the header by `parse_ihdr`, and
/// `decode` consumes the rest.
pub struct PNGDecoder<'a, State> {
    rest: &'a [u8],
    options: DecodeOptions,
    _state: PhantomData<State>,
}

pub struct Start;
pub struct Chunks;

impl<'a> PNGDecoder<'a, Start> {
    pub fn new(data: &'a [u8], options: DecodeOptions) -> Result<Self> {
        let rest = parse_signature(data)?;
        Ok(Self {
            rest,
            options,
            _state: PhantomData,
        })
    }

    pub fn parse_ihdr(
        self,
        progress: &mut dyn ProgressSink,
    ) -> Result<(PNGDecoder<'a, Chunks>, IHDRChunk)> {
        progress.add_progress(SIGNATURE.len() as u64);
        let (rest, chunk) = split_chunk(self.rest, self.options.max_chunk_length)?;
        if chunk.chunk_type != IHDRChunk::HEADER {
            return Err(PngError::HeaderNotFirst(chunk.name()));
        }
        let header = IHDRChunk::from_bytes(chunk.data)?;
        debug!("{header:?}");
        progress.add_progress(chunk.consumed_len());
        Ok((
            PNGDecoder {
                rest,
                options: self.options,
                _state: PhantomData,
            },
            header,
        ))
    }
}

impl<'a> PNGDecoder<'a, Chunks> {
    pub fn decode(
        self,
        header: IHDRChunk,
        progress: &mut dyn ProgressSink,
    ) -> Result<BitmapSequence> {
        let mut state = DecodeState::new(header);
        for chunk in iter_chunks(self.rest, self.options.max_chunk_length) {
            let chunk = chunk?;
            trace!("{} chunk, {} bytes", chunk.name(), chunk.data.len());
            state.handle(chunk)?;
            progress.add_progress(chunk.consumed_len());
        }
        state.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataKind {
    Image,
    Frame,
}

/// Frame data waiting for its boundary. PNG lets one frame's zlib stream be
/// split over any number of consecutive IDAT (or fdAT) chunks, so nothing is
/// inflated until the next fcTL or IEND.
enum Lingering {
    Idle,
    Accumulating { kind: DataKind, data: Vec<u8> },
}

struct DecodeState {
    sequence: BitmapSequence,
    lingering: Lingering,
    /// fcTL of the frame currently being collected.
    frame_control: Option<FrameControl>,
    next_sequence_number: u32,
    seen_image_data: bool,
    seen_iend: bool,
    codec: Option<PixelCodec>,
}

impl DecodeState {
    fn new(header: IHDRChunk) -> Self {
        Self {
            sequence: BitmapSequence::new(header),
            lingering: Lingering::Idle,
            frame_control: None,
            next_sequence_number: 0,
            seen_image_data: false,
            seen_iend: false,
            codec: None,
        }
    }

    fn header(&self) -> &IHDRChunk {
        &self.sequence.header
    }

    fn handle(&mut self, chunk: RawChunk<'_>) -> Result<()> {
        match chunk.chunk_type {
            b"IHDR" => {
                return Err(PngError::UnexpectedChunk {
                    chunk: "IHDR",
                    reason: "second header".to_owned(),
                })
            }
            b"PLTE" => {
                if self.codec.is_some() {
                    warn!("PLTE after image data, ignored");
                } else {
                    self.sequence.palette = Some(PLTEChunk::from_bytes(chunk.data)?);
                }
            }
            b"tRNS" => {
                if self.codec.is_some() {
                    warn!("tRNS after image data, ignored");
                } else {
                    let color_type = self.header().color_type;
                    self.sequence.transparency = Some(tRNSChunk::from_bytes(chunk.data, color_type)?);
                }
            }
            b"acTL" => {
                let control = acTLChunk::from_bytes(chunk.data)?;
                debug!("{} frames, {} plays", control.num_frames, control.num_plays);
                self.sequence.animation_control = Some(control);
            }
            b"fcTL" => self.start_frame(fcTLChunk::from_bytes(chunk.data)?)?,
            b"IDAT" => {
                let idat = IDATChunk::from_bytes(chunk.data)?;
                self.accumulate(DataKind::Image, idat.data)?;
            }
            b"fdAT" => {
                let fdat = fdATChunk::from_bytes(chunk.data)?;
                self.check_sequence_number(fdat.sequence_number)?;
                self.accumulate(DataKind::Frame, fdat.data)?;
            }
            b"IEND" => {
                IENDChunk::from_bytes(chunk.data)?;
                self.flush()?;
                if self.frame_control.is_some() {
                    return Err(PngError::UnexpectedChunk {
                        chunk: "IEND",
                        reason: "last fcTL has no frame data".to_owned(),
                    });
                }
                self.seen_iend = true;
            }
            chunk_type if TextEntry::is_text_chunk(chunk_type) => {
                self.sequence
                    .text
                    .push(TextEntry::from_bytes(chunk_type, chunk.data)?);
            }
            _ if chunk.is_ancillary() => debug!("discarding {} chunk", chunk.name()),
            _ => debug!("discarding unknown critical {} chunk", chunk.name()),
        }
        Ok(())
    }

    fn check_sequence_number(&mut self, found: u32) -> Result<()> {
        if found != self.next_sequence_number {
            return Err(PngError::SequenceMismatch {
                expected: self.next_sequence_number,
                found,
            });
        }
        self.next_sequence_number += 1;
        Ok(())
    }

    fn start_frame(&mut self, fctl: fcTLChunk) -> Result<()> {
        self.check_sequence_number(fctl.sequence_number)?;
        self.flush()?;
        if self.frame_control.is_some() {
            return Err(PngError::UnexpectedChunk {
                chunk: "fcTL",
                reason: "previous fcTL has no frame data".to_owned(),
            });
        }
        let control = fctl.control;
        let header = self.header();
        if control.width == 0
            || control.height == 0
            || !control.rect().fits_within(header.width, header.height)
        {
            return Err(PngError::FrameOutOfBounds {
                width: control.width,
                height: control.height,
                x: control.x_offset,
                y: control.y_offset,
                canvas_width: header.width,
                canvas_height: header.height,
            });
        }
        if self.sequence.animation_type == AnimationType::None {
            self.sequence.animation_type = if self.seen_image_data {
                AnimationType::SkipFirst
            } else {
                AnimationType::Animated
            };
            debug!("animation type {:?}", self.sequence.animation_type);
        }
        self.frame_control = Some(control);
        Ok(())
    }

    fn accumulate(&mut self, kind: DataKind, data: &[u8]) -> Result<()> {
        match (&mut self.lingering, kind) {
            (Lingering::Accumulating { kind: current, data: buffer }, _) if *current == kind => {
                buffer.extend_from_slice(data);
                return Ok(());
            }
            (Lingering::Accumulating { .. }, DataKind::Frame) => {
                return Err(PngError::UnexpectedChunk {
                    chunk: "fdAT",
                    reason: "frame data without its own fcTL".to_owned(),
                })
            }
            (Lingering::Accumulating { .. }, DataKind::Image) => {
                return Err(PngError::UnexpectedChunk {
                    chunk: "IDAT",
                    reason: "IDAT after frame data".to_owned(),
                })
            }
            (Lingering::Idle, DataKind::Image) if self.seen_image_data => {
                return Err(PngError::UnexpectedChunk {
                    chunk: "IDAT",
                    reason: "IDAT chunks are not consecutive".to_owned(),
                })
            }
            (Lingering::Idle, DataKind::Frame) if self.frame_control.is_none() => {
                return Err(PngError::UnexpectedChunk {
                    chunk: "fdAT",
                    reason: "frame data without a preceding fcTL".to_owned(),
                })
            }
            (Lingering::Idle, DataKind::Frame) if !self.seen_image_data => {
                return Err(PngError::UnexpectedChunk {
                    chunk: "fdAT",
                    reason: "frame data before the default image".to_owned(),
                })
            }
            (Lingering::Idle, _) => {}
        }
        if kind == DataKind::Image {
            self.seen_image_data = true;
        }
        self.lingering = Lingering::Accumulating {
            kind,
            data: data.to_vec(),
        };
        Ok(())
    }

    /// Inflates whatever is lingering into a new bitmap.
    fn flush(&mut self) -> Result<()> {
        let Lingering::Accumulating { kind, data } =
            std::mem::replace(&mut self.lingering, Lingering::Idle)
        else {
            return Ok(());
        };
        let header = self.sequence.header;
        let control = self.frame_control.take();
        if let (DataKind::Image, Some(control)) = (kind, control) {
            if control.rect() != FrameControl::full(header.width, header.height, control.delay).rect() {
                return Err(PngError::MalformedChunk {
                    chunk: "fcTL",
                    reason: "the default image's frame must cover the whole canvas".to_owned(),
                });
            }
        }
        let (width, height) = control.map_or((header.width, header.height), |c| (c.width, c.height));

        let codec = match &mut self.codec {
            Some(codec) => codec,
            codec @ None => codec.insert(PixelCodec::for_decode(
                &header,
                self.sequence.palette.as_ref(),
                self.sequence.transparency.as_ref(),
            )?),
        };
        let mut bitmap = Bitmap::new(width, height);
        codec.decode(&data, &mut bitmap)?;
        debug!(
            "decoded {:?} #{}: {width}x{height} from {} bytes",
            kind,
            self.sequence.bitmaps.len(),
            data.len()
        );
        bitmap.frame_control = control;
        self.sequence.bitmaps.push(bitmap);
        Ok(())
    }

    fn finish(mut self) -> Result<BitmapSequence> {
        if !self.seen_iend {
            return Err(PngError::Truncated);
        }
        if self.sequence.bitmaps.is_empty() {
            return Err(PngError::MissingImageData);
        }
        let frames = self.sequence.animation_frames().len() as u32;
        match (self.sequence.animation_type, self.sequence.animation_control) {
            (AnimationType::None, Some(_)) => {
                warn!("acTL without any fcTL, treating as a still image");
                self.sequence.animation_control = None;
            }
            (AnimationType::None, None) => {}
            (_, None) => {
                warn!("fcTL without acTL");
                self.sequence.animation_control = Some(AnimationControl {
                    num_frames: frames,
                    num_plays: 0,
                });
            }
            (_, Some(control)) if control.num_frames != frames => {
                warn!(
                    "acTL announces {} frames, stream has {frames}",
                    control.num_frames
                );
                self.sequence.sync_frame_count();
            }
            _ => {}
        }
        // Stored frames are deltas until deoptimized.
        self.sequence.optimized = self.sequence.is_animated();
        Ok(self.sequence)
    }
}
