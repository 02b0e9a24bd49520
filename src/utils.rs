pub(crate) const fn div_ceil(lhs: usize, rhs: usize) -> usize {
    let d = lhs / rhs;
    let r = lhs % rhs;
    if r > 0 && rhs > 0 {
        d + 1
    } else {
        d
    }
}

/// Number of samples a row of `width` pixels contributes when starting at
/// `offset` and taking every `step`th pixel.
pub(crate) const fn strided_len(width: usize, offset: usize, step: usize) -> usize {
    if width <= offset {
        0
    } else {
        div_ceil(width - offset, step)
    }
}

pub(crate) fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Characters outside Latin-1 become `?`.
pub(crate) fn string_to_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
