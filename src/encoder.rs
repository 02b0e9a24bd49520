use log::{debug, warn};

use crate::{
    bitmap::{Bitmap, FrameControl},
    chunks::{
        fctl::fcTLChunk, fdat::fdATChunk, idat::IDATChunk, iend::IENDChunk, ParseableChunk,
        SIGNATURE,
    },
    error::{PngError, Result},
    image_data::PixelCodec,
    options::EncodeOptions,
    progress::ProgressSink,
    sequence::{AnimationControl, BitmapSequence},
};

/// Writes a [`BitmapSequence`] as a PNG, or an APNG when it is animated.
pub struct PNGEncoder<'s> {
    sequence: &'s BitmapSequence,
    options: EncodeOptions,
    output: Vec<u8>,
    steps_done: u64,
    steps_total: u64,
}

impl<'s> PNGEncoder<'s> {
    pub fn new(sequence: &'s BitmapSequence, options: EncodeOptions) -> Self {
        Self {
            sequence,
            options,
            output: Vec::new(),
            steps_done: 0,
            steps_total: Self::estimate_steps(sequence),
        }
    }

    /// How many progress steps [`PNGEncoder::encode`] reports: signature,
    /// IHDR and IEND, one per text/PLTE/tRNS/acTL chunk, and two per frame.
    pub fn estimate_steps(sequence: &BitmapSequence) -> u64 {
        let mut steps = 3 + sequence.text.len() as u64;
        steps += sequence.palette.is_some() as u64;
        steps += sequence.transparency.is_some() as u64;
        steps += sequence.is_animated() as u64;
        steps + 2 * frames_to_write(sequence).len() as u64
    }

    fn step(&mut self, progress: &mut dyn ProgressSink) {
        self.steps_done += 1;
        progress.update_progress(self.steps_done, Some(self.steps_total));
    }

    pub fn encode(mut self, progress: &mut dyn ProgressSink) -> Result<Vec<u8>> {
        let sequence = self.sequence;
        let header = &sequence.header;
        let frames = frames_to_write(sequence);
        if frames.is_empty() {
            return Err(PngError::MissingImageData);
        }
        if sequence.bitmaps.len() > frames.len() {
            warn!(
                "still image with {} bitmaps, only the first is written",
                sequence.bitmaps.len()
            );
        }
        // Checked up front so a bad palette fails before anything is written.
        let mut codec = PixelCodec::for_encode(
            header,
            sequence.palette.as_ref(),
            sequence.transparency.as_ref(),
        )?;

        self.output.extend(SIGNATURE);
        self.step(progress);
        self.output.extend(header.to_bytes());
        self.step(progress);
        for entry in &sequence.text {
            self.output
                .extend(entry.to_bytes(self.options.compression_level));
            self.step(progress);
        }
        if let Some(palette) = &sequence.palette {
            self.output.extend(palette.to_bytes());
            self.step(progress);
        }
        if let Some(transparency) = &sequence.transparency {
            self.output.extend(transparency.to_bytes());
            self.step(progress);
        }
        if sequence.is_animated() {
            let control = AnimationControl {
                num_frames: sequence.animation_frames().len() as u32,
                num_plays: sequence.animation_control.map_or(0, |c| c.num_plays),
            };
            self.output.extend(control.to_bytes());
            self.step(progress);
        }

        let mut sequence_number = 0;
        for (index, bitmap) in frames.iter().enumerate() {
            let control = self.frame_control(index, bitmap)?;
            if let Some(control) = control {
                self.output.extend(
                    fcTLChunk {
                        sequence_number,
                        control,
                    }
                    .to_bytes(),
                );
                sequence_number += 1;
            }
            self.step(progress);

            let data = codec.encode(bitmap, self.options.compression_level);
            debug!(
                "frame {index}: {}x{} into {} bytes",
                bitmap.width(),
                bitmap.height(),
                data.len()
            );
            for piece in data.chunks(self.options.max_data_chunk_len.max(1)) {
                if index == 0 {
                    self.output.extend(IDATChunk { data: piece }.to_bytes());
                } else {
                    self.output.extend(
                        fdATChunk {
                            sequence_number,
                            data: piece,
                        }
                        .to_bytes(),
                    );
                    sequence_number += 1;
                }
            }
            self.step(progress);
        }

        self.output.extend(IENDChunk.to_bytes());
        self.step(progress);
        Ok(self.output)
    }

    /// The fcTL to write ahead of the `index`th bitmap, checked against the
    /// canvas. The first written bitmap is the IDAT image and must fill it.
    fn frame_control(&self, index: usize, bitmap: &Bitmap) -> Result<Option<FrameControl>> {
        let header = &self.sequence.header;
        let canvas = FrameControl::full(header.width, header.height, bitmap.delay());
        let in_animation = self.sequence.is_animated() && index >= self.sequence.first_frame_index();
        let control = in_animation.then(|| bitmap.frame_control.unwrap_or(canvas));

        if index == 0 && control.map_or(true, |c| c.rect() == canvas.rect()) {
            if (bitmap.width(), bitmap.height()) != (header.width, header.height) {
                return Err(PngError::DimensionMismatch {
                    expected_width: header.width,
                    expected_height: header.height,
                    width: bitmap.width(),
                    height: bitmap.height(),
                });
            }
        } else if index == 0 {
            // A cropped first frame has no place in IDAT.
            let control = control.unwrap_or(canvas);
            return Err(PngError::DimensionMismatch {
                expected_width: header.width,
                expected_height: header.height,
                width: control.width,
                height: control.height,
            });
        }

        if let Some(control) = control {
            if bitmap.frame_control.is_some() {
                bitmap.check_frame_control()?;
            }
            if !control.rect().fits_within(header.width, header.height) {
                return Err(PngError::FrameOutOfBounds {
                    width: control.width,
                    height: control.height,
                    x: control.x_offset,
                    y: control.y_offset,
                    canvas_width: header.width,
                    canvas_height: header.height,
                });
            }
        }
        Ok(control)
    }
}

fn frames_to_write(sequence: &BitmapSequence) -> &[Bitmap] {
    if sequence.is_animated() {
        &sequence.bitmaps
    } else {
        sequence.bitmaps.get(..1).unwrap_or_default()
    }
}
