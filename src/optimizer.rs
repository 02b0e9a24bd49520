//! Turns fully composited animation frames into minimal APNG deltas, and back.
//!
//! Both directions keep a running canvas: what a viewer shows after the
//! previous frame has been disposed. [`optimize`] diffs each frame against it;
//! [`deoptimize`] composites each delta onto it.

use log::debug;

use crate::{
    bitmap::{Bitmap, BlendOp, Delay, DisposeOp, FrameControl, Rect},
    color::ColorAnalyzer,
    error::{PngError, Result},
    pixel::{alpha, blend_over, Pixel},
    scanlines::{hits_color_key, transparent_value},
    sequence::BitmapSequence,
};

trait Canvas {
    fn pixel(&self, x: u32, y: u32) -> u32;
}

impl Canvas for Bitmap {
    fn pixel(&self, x: u32, y: u32) -> u32 {
        Bitmap::pixel(self, x, y)
    }
}

enum Fill<'a> {
    Keep,
    Clear,
    Restore(&'a Bitmap),
}

/// A frame as it would look after `op` disposes `rect`, read straight through
/// to the frame and the pre-composite canvas. Nothing is copied until
/// [`DisposedView::to_bitmap`].
struct DisposedView<'a> {
    frame: &'a Bitmap,
    rect: Rect,
    fill: Fill<'a>,
}

impl<'a> DisposedView<'a> {
    fn new(op: DisposeOp, frame: &'a Bitmap, before: &'a Bitmap, rect: Rect) -> Self {
        let fill = match op {
            DisposeOp::None => Fill::Keep,
            DisposeOp::Background => Fill::Clear,
            DisposeOp::Previous => Fill::Restore(before),
        };
        Self { frame, rect, fill }
    }

    fn to_bitmap(&self) -> Bitmap {
        let mut bitmap = self.frame.clone();
        bitmap.frame_control = None;
        match self.fill {
            Fill::Keep => {}
            Fill::Clear => bitmap.fill(self.rect, Pixel::TRANSPARENT),
            Fill::Restore(before) => bitmap.blit(&before.crop(self.rect), self.rect.x, self.rect.y),
        }
        bitmap
    }
}

impl Canvas for DisposedView<'_> {
    fn pixel(&self, x: u32, y: u32) -> u32 {
        match self.fill {
            Fill::Clear if self.rect.contains(x, y) => Pixel::TRANSPARENT,
            Fill::Restore(before) if self.rect.contains(x, y) => before.pixel(x, y),
            _ => self.frame.pixel(x, y),
        }
    }
}

/// Smallest rectangle holding every pixel where `canvas` and `frame` differ.
fn diff_rect(canvas: &impl Canvas, frame: &Bitmap) -> Option<Rect> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..frame.height() {
        for (x, &argb) in (0..).zip(frame.row(y)) {
            if canvas.pixel(x, y) == argb {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0, x1.max(x), y1.max(y)),
            });
        }
    }
    bounds.map(|(x0, y0, x1, y1)| Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

fn rect_points(rect: Rect) -> impl Iterator<Item = (u32, u32)> {
    (rect.y..rect.y + rect.height).flat_map(move |y| (rect.x..rect.x + rect.width).map(move |x| (x, y)))
}

/// What an OVER patch holds where the canvas shows through, if the sequence's
/// format can store it without any frame pixel colliding with it.
fn see_through_value(sequence: &BitmapSequence) -> Option<u32> {
    let transparency = sequence.transparency.as_ref();
    let value = transparent_value(&sequence.header, sequence.palette.as_ref(), transparency)?;
    let collides = sequence
        .pixels()
        .any(|argb| hits_color_key(&sequence.header, transparency, argb));
    (!collides).then_some(value)
}

/// OVER when nothing visible on the canvas gets covered by a non-opaque
/// pixel and at least one visible pixel stays as it was; those pixels are
/// set to `see_through` in the patch. Always SOURCE without one.
fn choose_blend(
    canvas: &Bitmap,
    frame: &Bitmap,
    rect: Rect,
    see_through: Option<u32>,
) -> (BlendOp, Bitmap) {
    let mut patch = frame.crop(rect);
    let Some(see_through) = see_through else {
        return (BlendOp::Source, patch);
    };
    let mut unchanged_visible = 0u64;
    let mut covered_visible = 0u64;
    for (x, y) in rect_points(rect) {
        let (old, new) = (canvas.pixel(x, y), frame.pixel(x, y));
        if alpha(old) == 0 {
            continue;
        }
        if old == new {
            unchanged_visible += 1;
        } else if alpha(new) != u8::MAX {
            covered_visible += 1;
        }
    }
    if covered_visible > 0 || unchanged_visible == 0 {
        return (BlendOp::Source, patch);
    }
    for (x, y) in rect_points(rect) {
        let old = canvas.pixel(x, y);
        if alpha(old) != 0 && old == frame.pixel(x, y) {
            patch.set_pixel(x - rect.x, y - rect.y, see_through);
        }
    }
    (BlendOp::Over, patch)
}

/// The dispose op leaving the smallest change for `next`. Ties prefer NONE,
/// then BACKGROUND.
fn choose_dispose(before: &Bitmap, frame: &Bitmap, rect: Rect, next: &Bitmap) -> DisposeOp {
    let mut best = (DisposeOp::None, u64::MAX);
    for op in [DisposeOp::None, DisposeOp::Background, DisposeOp::Previous] {
        let view = DisposedView::new(op, frame, before, rect);
        let area = diff_rect(&view, next).map_or(0, |r| r.area());
        if area < best.1 {
            best = (op, area);
        }
    }
    best.0
}

fn check_canvas_sized(sequence: &BitmapSequence, frames: &[Bitmap]) -> Result<()> {
    let header = &sequence.header;
    match frames
        .iter()
        .find(|f| (f.width(), f.height()) != (header.width, header.height))
    {
        Some(frame) => Err(PngError::DimensionMismatch {
            expected_width: header.width,
            expected_height: header.height,
            width: frame.width(),
            height: frame.height(),
        }),
        None => Ok(()),
    }
}

/// Replaces the animation frames with deltas. Frames must be canvas-sized.
///
/// - A frame is blended OVER only when the color type can store a fully
///   transparent pixel, no visible (alpha above zero) canvas pixel would be
///   covered by a non-opaque one, and some visible pixel is unchanged.
///   Everything else is SOURCE.
/// - PREVIOUS disposal restores the canvas as it was before the frame was
///   drawn, so it is chosen from the frame's own snapshot.
/// - A frame identical to the previous source frame is dropped and its delay
///   added on. A frame that differs from its source but not from the disposed
///   canvas is stored as a 1×1 frame at the origin.
///
/// Does nothing for still images or sequences that are already optimized.
pub fn optimize(sequence: &mut BitmapSequence) -> Result<()> {
    if sequence.optimized || !sequence.is_animated() {
        return Ok(());
    }
    let first = sequence.first_frame_index();
    check_canvas_sized(sequence, &sequence.bitmaps[first..])?;
    let (width, height) = (sequence.header.width, sequence.header.height);
    let see_through = see_through_value(sequence);
    if see_through.is_none() {
        debug!(
            "{:?} cannot store a transparent pixel, every frame blends by source",
            sequence.header.color_type
        );
    }
    let frames = sequence.bitmaps.split_off(first);

    let mut canvas = Bitmap::new(width, height);
    let mut deltas: Vec<Bitmap> = Vec::with_capacity(frames.len());
    for (index, frame) in frames.iter().enumerate() {
        let delay = frame.delay();
        let rect = if index == 0 {
            Rect::new(0, 0, width, height)
        } else {
            match diff_rect(&canvas, frame) {
                Some(rect) => rect,
                None if frame.pixels() == frames[index - 1].pixels() => {
                    if let Some(control) = deltas.last_mut().and_then(|d| d.frame_control.as_mut()) {
                        control.delay = control.delay.combine(delay);
                    }
                    debug!("frame {index} repeats the one before, merged");
                    continue;
                }
                // Nothing to draw, but the frame still has to be shown.
                None => Rect::new(0, 0, 1, 1),
            }
        };
        let (blend_op, patch) = if index == 0 {
            (BlendOp::Source, frame.crop(rect))
        } else {
            choose_blend(&canvas, frame, rect, see_through)
        };
        let dispose_op = match frames.get(index + 1) {
            Some(next) => choose_dispose(&canvas, frame, rect, next),
            None => DisposeOp::None,
        };
        debug!("frame {index}: {rect:?} {blend_op:?} {dispose_op:?}");

        let disposed = DisposedView::new(dispose_op, frame, &canvas, rect).to_bitmap();
        canvas = disposed;
        deltas.push(patch.with_frame_control(FrameControl {
            width: rect.width,
            height: rect.height,
            x_offset: rect.x,
            y_offset: rect.y,
            delay,
            dispose_op,
            blend_op,
        }));
    }

    sequence.bitmaps.extend(deltas);
    sequence.sync_frame_count();
    sequence.optimized = true;
    Ok(())
}

/// A delta's frame control; a bare bitmap covers itself from the origin.
fn delta_control(delta: &Bitmap) -> FrameControl {
    delta
        .frame_control
        .unwrap_or_else(|| FrameControl::full(delta.width(), delta.height(), Delay::default()))
}

/// Rebuilds canvas-sized frames from deltas. Every rebuilt frame gets a full
/// frame control with the delta's delay.
///
/// Does nothing unless the sequence is animated and optimized.
pub fn deoptimize(sequence: &mut BitmapSequence) -> Result<()> {
    if !sequence.optimized || !sequence.is_animated() {
        return Ok(());
    }
    let (width, height) = (sequence.header.width, sequence.header.height);
    let first = sequence.first_frame_index();
    for delta in &sequence.bitmaps[first..] {
        delta.check_frame_control()?;
        let control = delta_control(delta);
        if !control.rect().fits_within(width, height) {
            return Err(PngError::FrameOutOfBounds {
                width: control.width,
                height: control.height,
                x: control.x_offset,
                y: control.y_offset,
                canvas_width: width,
                canvas_height: height,
            });
        }
    }
    let deltas = sequence.bitmaps.split_off(first);

    let mut canvas = Bitmap::new(width, height);
    let mut frames = Vec::with_capacity(deltas.len());
    for delta in deltas {
        let control = delta_control(&delta);
        let rect = control.rect();
        let snapshot = (control.dispose_op == DisposeOp::Previous).then(|| canvas.crop(rect));

        match control.blend_op {
            BlendOp::Source => canvas.blit(&delta, rect.x, rect.y),
            BlendOp::Over => {
                for (x, y) in rect_points(rect) {
                    let src = delta.pixel(x - rect.x, y - rect.y);
                    canvas.set_pixel(x, y, blend_over(src, canvas.pixel(x, y)));
                }
            }
        }
        frames.push(
            canvas
                .clone()
                .with_frame_control(FrameControl::full(width, height, control.delay)),
        );

        match (control.dispose_op, snapshot) {
            (DisposeOp::Background, _) => canvas.fill(rect, Pixel::TRANSPARENT),
            (DisposeOp::Previous, Some(snapshot)) => canvas.blit(&snapshot, rect.x, rect.y),
            _ => {}
        }
    }

    sequence.bitmaps.extend(frames);
    sequence.sync_frame_count();
    sequence.optimized = false;
    Ok(())
}

/// Switches to the cheapest color type that still represents every pixel,
/// rewriting header, palette and transparency. Returns whether it did.
pub fn optimize_color_type(sequence: &mut BitmapSequence) -> Result<bool> {
    let suggestion = ColorAnalyzer::from_sequence(sequence).suggest();
    let current = sequence.header.pixel_width();
    if !suggestion.lossless || suggestion.pixel_width() >= current {
        debug!(
            "keeping {:?}/{} over {:?}/{}",
            sequence.header.color_type,
            sequence.header.bit_depth,
            suggestion.color_type,
            suggestion.bit_depth
        );
        return Ok(false);
    }
    sequence.palette = suggestion.palette_chunk()?;
    sequence.transparency = suggestion.transparency.clone();
    sequence.header = suggestion.header(&sequence.header);
    debug!(
        "color type now {:?}/{}",
        sequence.header.color_type, sequence.header.bit_depth
    );
    Ok(true)
}
