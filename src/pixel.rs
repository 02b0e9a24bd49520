/// One pixel split into channels. Bitmaps store pixels packed as `0xAARRGGBB`;
/// this is the unpacked view used wherever channels are inspected.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct Pixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}
impl Pixel {
    pub const TRANSPARENT: u32 = 0;

    pub fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn from_argb(argb: u32) -> Self {
        let [alpha, red, green, blue] = argb.to_be_bytes();
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.alpha, self.red, self.green, self.blue])
    }

    pub fn is_grey(&self) -> bool {
        self.red == self.green && self.green == self.blue
    }

    /// Luminance for greyscale output; exact for pixels that are already grey.
    pub fn luminance(&self) -> u8 {
        if self.is_grey() {
            return self.red;
        }
        let weighted =
            self.red as u32 * 299 + self.green as u32 * 587 + self.blue as u32 * 114 + 500;
        (weighted / 1000) as u8
    }

    /// Manhattan distance over all four channels.
    pub fn distance(&self, other: &Pixel) -> u32 {
        self.red.abs_diff(other.red) as u32
            + self.green.abs_diff(other.green) as u32
            + self.blue.abs_diff(other.blue) as u32
            + self.alpha.abs_diff(other.alpha) as u32
    }
}

pub(crate) fn alpha(argb: u32) -> u8 {
    (argb >> 24) as u8
}

/// Source-over compositing of `src` onto `dst`, premultiplied, no gamma.
/// A destination with zero alpha is overwritten outright.
pub(crate) fn blend_over(src: u32, dst: u32) -> u32 {
    let (s, d) = (Pixel::from_argb(src), Pixel::from_argb(dst));
    if s.alpha == u8::MAX || d.alpha == 0 {
        return src;
    }
    if s.alpha == 0 {
        return dst;
    }
    let sa = s.alpha as u32;
    let da = d.alpha as u32;
    let inverse = 255 - sa;
    let out_alpha = sa + (da * inverse + 127) / 255;
    let divisor = out_alpha * 255;
    let channel = |sc: u8, dc: u8| {
        let numerator = sc as u32 * sa * 255 + dc as u32 * da * inverse;
        ((numerator + divisor / 2) / divisor).min(255) as u8
    };
    Pixel {
        red: channel(s.red, d.red),
        green: channel(s.green, d.green),
        blue: channel(s.blue, d.blue),
        alpha: out_alpha.min(255) as u8,
    }
    .to_argb()
}
