use crate::{chunks::ihdr::Interlacing, utils::strided_len};

/// One sub-image of an interlaced (or, as the single pass 0, a plain) frame:
/// the pixels at `offset + n * step` in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pass {
    pub(crate) offset_x: usize,
    pub(crate) step_x: usize,
    pub(crate) offset_y: usize,
    pub(crate) step_y: usize,
    pub(crate) width: usize,
    pub(crate) height: usize,
}
impl Pass {
    fn new(offset_x: usize, step_x: usize, offset_y: usize, step_y: usize, w: usize, h: usize) -> Self {
        Self {
            offset_x,
            step_x,
            offset_y,
            step_y,
            width: strided_len(w, offset_x, step_x),
            height: strided_len(h, offset_y, step_y),
        }
    }

    /// Canvas row of the pass's `row`th line.
    pub(crate) fn line(&self, row: usize) -> usize {
        self.offset_y + row * self.step_y
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The passes a `width` x `height` frame is stored in, skipping passes that
/// hold no pixels.
pub(crate) fn passes(interlacing: Interlacing, width: usize, height: usize) -> Vec<Pass> {
    match interlacing {
        Interlacing::None => vec![Pass::new(0, 1, 0, 1, width, height)],
        Interlacing::Adam7 => Adam7Iter::new(width, height).collect(),
    }
}

pub(crate) struct Adam7Iter {
    current_pass: usize,
    width: usize,
    height: usize,
}
impl Adam7Iter {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            current_pass: 0,
            width,
            height,
        }
    }

    const STARTING_ROW: [usize; 7] = [0, 0, 4, 0, 2, 0, 1];
    const STARTING_COL: [usize; 7] = [0, 4, 0, 2, 0, 1, 0];
    const ROW_INCREMENT: [usize; 7] = [8, 8, 8, 4, 4, 2, 2];
    const COL_INCREMENT: [usize; 7] = [8, 8, 4, 4, 2, 2, 1];
}
impl Iterator for Adam7Iter {
    type Item = Pass;
    fn next(&mut self) -> Option<Self::Item> {
        while self.current_pass < 7 {
            let pass = self.current_pass;
            self.current_pass += 1;
            let sub_image = Pass::new(
                Self::STARTING_COL[pass],
                Self::COL_INCREMENT[pass],
                Self::STARTING_ROW[pass],
                Self::ROW_INCREMENT[pass],
                self.width,
                self.height,
            );
            // A pass with no pixels contributes no bytes at all.
            if !sub_image.is_empty() {
                return Some(sub_image);
            }
        }
        None
    }
}
