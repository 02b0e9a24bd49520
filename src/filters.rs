use crate::error::PngError;

/// Per-row byte predictors. Each filtered byte is `x` minus a prediction made
/// from `a` (left), `b` (above) and `c` (above-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Filter {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}
impl Filter {
    pub(crate) const ALL: [Filter; 5] = [
        Filter::None,
        Filter::Sub,
        Filter::Up,
        Filter::Average,
        Filter::Paeth,
    ];

    fn predict(&self, a: u8, b: u8, c: u8) -> u8 {
        match self {
            Filter::None => 0,
            Filter::Sub => a,
            Filter::Up => b,
            Filter::Average => ((a as u16 + b as u16) / 2) as u8,
            Filter::Paeth => paeth_predictor(a, b, c),
        }
    }

    pub(crate) fn filter(&self, x: u8, a: u8, b: u8, c: u8) -> u8 {
        x.wrapping_sub(self.predict(a, b, c))
    }

    pub(crate) fn reconstruct(&self, x: u8, a: u8, b: u8, c: u8) -> u8 {
        x.wrapping_add(self.predict(a, b, c))
    }

    /// Undoes this filter in place. `previous` is the already reconstructed
    /// row above (all zeros for a pass's first row).
    pub(crate) fn reconstruct_row(&self, row: &mut [u8], previous: &[u8], bpp: usize) {
        if *self == Filter::None {
            return;
        }
        for i in 0..row.len() {
            let (a, c) = if i >= bpp {
                (row[i - bpp], previous[i - bpp])
            } else {
                (0, 0)
            };
            row[i] = self.reconstruct(row[i], a, previous[i], c);
        }
    }

    /// Filters `row` into `output`, which is cleared first.
    pub(crate) fn filter_row(&self, row: &[u8], previous: &[u8], bpp: usize, output: &mut Vec<u8>) {
        output.clear();
        output.extend(row.iter().enumerate().map(|(i, &x)| {
            let (a, c) = if i >= bpp {
                (row[i - bpp], previous[i - bpp])
            } else {
                (0, 0)
            };
            self.filter(x, a, previous[i], c)
        }));
    }
}
impl TryFrom<u8> for Filter {
    type Error = PngError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Sub),
            2 => Ok(Self::Up),
            3 => Ok(Self::Average),
            4 => Ok(Self::Paeth),
            i => Err(PngError::UnknownFilter(i)),
        }
    }
}

/// Whichever of `a`, `b`, `c` is closest to `a + b - c`; ties go to `a`, then `b`.
pub(crate) fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Sum of the filtered bytes read as signed values; smaller usually deflates
/// better.
fn signed_sum(filtered: &[u8]) -> u64 {
    filtered
        .iter()
        .map(|&b| (b as i8).unsigned_abs() as u64)
        .sum()
}

/// Trial buffers for the minimum-sum filter search, one per filter type,
/// reused from row to row.
pub(crate) struct AdaptiveFilter {
    trials: [Vec<u8>; 5],
}
impl AdaptiveFilter {
    pub(crate) fn new() -> Self {
        Self {
            trials: Default::default(),
        }
    }

    /// Runs every filter over `row` and returns the winner with its output.
    /// Ties keep the lower filter number.
    pub(crate) fn best(&mut self, row: &[u8], previous: &[u8], bpp: usize) -> (Filter, &[u8]) {
        let mut best = 0;
        let mut best_sum = u64::MAX;
        for (i, filter) in Filter::ALL.iter().enumerate() {
            filter.filter_row(row, previous, bpp, &mut self.trials[i]);
            let sum = signed_sum(&self.trials[i]);
            if sum < best_sum {
                best = i;
                best_sum = sum;
            }
        }
        (Filter::ALL[best], &self.trials[best])
    }
}
