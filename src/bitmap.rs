use crate::error::{PngError, Result};

/// What happens to a frame's region after it has been shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum DisposeOp {
    /// Leave the canvas as it is.
    #[default]
    None = 0,
    /// Clear the region to transparent black.
    Background = 1,
    /// Put back what the region held before this frame was drawn.
    Previous = 2,
}
impl TryFrom<u8> for DisposeOp {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Background),
            2 => Ok(Self::Previous),
            v => Err(PngError::MalformedChunk {
                chunk: "fcTL",
                reason: format!("dispose op {v}"),
            }),
        }
    }
}

/// How a frame's pixels land on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum BlendOp {
    /// Replace the region.
    #[default]
    Source = 0,
    /// Alpha-composite over the region.
    Over = 1,
}
impl TryFrom<u8> for BlendOp {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Source),
            1 => Ok(Self::Over),
            v => Err(PngError::MalformedChunk {
                chunk: "fcTL",
                reason: format!("blend op {v}"),
            }),
        }
    }
}

/// Frame delay in seconds, as `numerator / denominator`. A zero denominator
/// means hundredths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Delay {
    pub numerator: u16,
    pub denominator: u16,
}
impl Default for Delay {
    fn default() -> Self {
        Self::new(1, 10)
    }
}
impl Delay {
    pub fn new(numerator: u16, denominator: u16) -> Self {
        Delay {
            numerator,
            denominator,
        }
    }

    fn effective_denominator(&self) -> u64 {
        match self.denominator {
            0 => 100,
            d => d as u64,
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.numerator as u64 * 1000 / self.effective_denominator()
    }

    /// Exact sum where it still fits in 16 bits, otherwise milliseconds.
    pub fn combine(self, other: Delay) -> Delay {
        if self.denominator == other.denominator {
            if let Some(numerator) = self.numerator.checked_add(other.numerator) {
                return Delay::new(numerator, self.denominator);
            }
        }
        let (d1, d2) = (self.effective_denominator(), other.effective_denominator());
        let denominator = lcm(d1, d2);
        let numerator =
            self.numerator as u64 * (denominator / d1) + other.numerator as u64 * (denominator / d2);
        let divisor = gcd(numerator, denominator).max(1);
        match (
            u16::try_from(numerator / divisor),
            u16::try_from(denominator / divisor),
        ) {
            (Ok(n), Ok(d)) => Delay::new(n, d),
            _ => {
                let millis = self.as_millis() + other.as_millis();
                Delay::new(millis.min(u16::MAX as u64) as u16, 1000)
            }
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u64, b: u64) -> u64 {
    a / gcd(a, b).max(1) * b
}

/// Axis-aligned pixel region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }

    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

/// Placement and timing of one animation frame (the fcTL payload minus its
/// sequence number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FrameControl {
    pub width: u32,
    pub height: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub delay: Delay,
    pub dispose_op: DisposeOp,
    pub blend_op: BlendOp,
}
impl FrameControl {
    /// A frame covering a whole `width` x `height` canvas.
    pub fn full(width: u32, height: u32, delay: Delay) -> Self {
        Self {
            width,
            height,
            delay,
            ..Default::default()
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x_offset, self.y_offset, self.width, self.height)
    }
}

/// A pixel buffer of `0xAARRGGBB` values, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    pub frame_control: Option<FrameControl>,
}
impl Bitmap {
    /// Fully transparent bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            frame_control: None,
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(PngError::DimensionMismatch {
                expected_width: width,
                expected_height: height,
                width: pixels.len() as u32,
                height: 1,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            frame_control: None,
        })
    }

    pub fn with_frame_control(mut self, frame_control: FrameControl) -> Self {
        self.frame_control = Some(frame_control);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable view; the slice can't change length so the buffer always
    /// matches the dimensions.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
        let width = self.width as usize;
        self.pixels[y as usize * width + x as usize] = argb;
    }

    pub fn row(&self, y: u32) -> &[u32] {
        let start = y as usize * self.width as usize;
        &self.pixels[start..start + self.width as usize]
    }

    pub fn delay(&self) -> Delay {
        self.frame_control.map(|fc| fc.delay).unwrap_or_default()
    }

    /// Copy of the pixels under `rect`.
    pub fn crop(&self, rect: Rect) -> Bitmap {
        let mut pixels = Vec::with_capacity(rect.area() as usize);
        for y in rect.y..rect.y + rect.height {
            let start = y as usize * self.width as usize + rect.x as usize;
            pixels.extend_from_slice(&self.pixels[start..start + rect.width as usize]);
        }
        Bitmap {
            width: rect.width,
            height: rect.height,
            pixels,
            frame_control: None,
        }
    }

    /// Copies `patch` onto this bitmap with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, patch: &Bitmap, x: u32, y: u32) {
        for row in 0..patch.height {
            let start = (y + row) as usize * self.width as usize + x as usize;
            self.pixels[start..start + patch.width as usize].copy_from_slice(patch.row(row));
        }
    }

    pub fn fill(&mut self, rect: Rect, argb: u32) {
        for y in rect.y..rect.y + rect.height {
            let start = y as usize * self.width as usize + rect.x as usize;
            self.pixels[start..start + rect.width as usize].fill(argb);
        }
    }

    /// True when the bitmap's size matches its frame control, or it has none.
    pub(crate) fn check_frame_control(&self) -> Result<()> {
        match self.frame_control {
            Some(fc) if fc.width != self.width || fc.height != self.height => {
                Err(PngError::DimensionMismatch {
                    expected_width: fc.width,
                    expected_height: fc.height,
                    width: self.width,
                    height: self.height,
                })
            }
            _ => Ok(()),
        }
    }
}
