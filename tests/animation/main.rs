use simple_apng::{
    optimizer, tRNSChunk, AnimationType, Bitmap, BitmapSequence, BlendOp, ColorType, Delay,
    DisposeOp, Header, PLTEChunk, PngError, Rect, PNG,
};

const RED: u32 = 0xffff_0000;
const BLUE: u32 = 0xff00_00ff;
const GREEN: u32 = 0xff00_ff00;
const BLACK: u32 = 0xff00_0000;
const CLEAR: u32 = 0;

/// Linear congruential generator; good enough for reproducible frames.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0
    }

    fn below(&mut self, bound: u32) -> u32 {
        (self.next() >> 8) % bound
    }
}

fn header(width: u32, height: u32) -> Header {
    Header::new(width, height, ColorType::TruecolorWithAlpha, 8)
}

fn animation(width: u32, height: u32, frames: Vec<Vec<u32>>) -> BitmapSequence {
    let frames = frames
        .into_iter()
        .map(|pixels| Bitmap::from_pixels(width, height, pixels).unwrap())
        .collect();
    BitmapSequence::animated(header(width, height), frames, Delay::new(1, 10), 0)
}

/// Frames that change a few pixels at a time from `colors`, sometimes
/// filling with `colors[0]` or restoring regions, so each dispose op gets
/// exercised. Every frame differs from the one before it.
fn random_frames(
    seed: u32,
    width: u32,
    height: u32,
    count: usize,
    colors: &[u32],
) -> Vec<Vec<u32>> {
    let mut rng = Lcg(seed);
    let pick = |rng: &mut Lcg| colors[rng.below(colors.len() as u32) as usize];
    let mut frames: Vec<Vec<u32>> = vec![(0..width * height).map(|_| pick(&mut rng)).collect()];
    while frames.len() < count {
        let mut next = match rng.below(4) {
            0 if frames.len() >= 2 => frames[frames.len() - 2].clone(),
            1 => vec![colors[0]; (width * height) as usize],
            _ => frames[frames.len() - 1].clone(),
        };
        for _ in 0..rng.below(4) + 1 {
            let i = rng.below(width * height) as usize;
            next[i] = pick(&mut rng);
        }
        if next == frames[frames.len() - 1] {
            let i = rng.below(width * height) as usize;
            next[i] = if next[i] == colors[1] { colors[2] } else { colors[1] };
        }
        frames.push(next);
    }
    frames
}

fn random_animation(seed: u32, width: u32, height: u32, count: usize) -> BitmapSequence {
    let colors = [CLEAR, RED, BLUE, GREEN, 0x80ff_ff00];
    animation(width, height, random_frames(seed, width, height, count, &colors))
}

/// `random_animation` stored as `color_type`, drawing only from `colors`.
/// Indexed images get `colors` as their palette.
fn random_animation_as(
    seed: u32,
    color_type: ColorType,
    bit_depth: u8,
    colors: &[u32],
    transparency: Option<tRNSChunk>,
) -> BitmapSequence {
    let mut sequence = animation(5, 4, random_frames(seed, 5, 4, 6, colors));
    sequence.header = Header::new(5, 4, color_type, bit_depth);
    if color_type == ColorType::IndexedColor {
        sequence.palette = Some(PLTEChunk::from_argb(colors).unwrap());
    }
    sequence.transparency = transparency;
    sequence
}

fn optimize_through_a_file(sequence: BitmapSequence) -> PNG {
    let mut png = PNG::from(sequence);
    png.optimize().unwrap();
    let bytes = png.encode().unwrap();
    let mut decoded = PNG::decode(&bytes).unwrap();
    decoded.deoptimize().unwrap();
    decoded
}

fn canvas_pixels(sequence: &BitmapSequence) -> Vec<Vec<u32>> {
    sequence
        .animation_frames()
        .iter()
        .map(|frame| frame.pixels().to_vec())
        .collect()
}

#[test]
fn changed_square_is_all_that_gets_stored() {
    let first = vec![RED; 36];
    let mut second = first.clone();
    for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
        second[y * 6 + x] = BLUE;
    }
    let mut png = PNG::from(animation(6, 6, vec![first, second]));
    png.optimize().unwrap();
    let control = png.sequence().bitmaps[1].frame_control.unwrap();
    assert_eq!(control.rect(), Rect::new(3, 3, 2, 2));
    assert_eq!(control.dispose_op, DisposeOp::None);

    let bytes = png.encode().unwrap();
    let decoded = PNG::decode(&bytes).unwrap();
    assert!(decoded.sequence().is_optimized());
    assert_eq!(decoded.sequence().bitmaps, png.sequence().bitmaps);
}

#[test]
fn identical_frames_merge_their_delays() {
    let mut png = PNG::from(animation(3, 2, vec![vec![BLUE; 6], vec![BLUE; 6]]));
    png.optimize().unwrap();
    let bytes = png.encode().unwrap();
    let decoded = PNG::decode(&bytes).unwrap().into_sequence();
    assert_eq!(decoded.animation_control.unwrap().num_frames, 1);
    assert_eq!(decoded.bitmaps.len(), 1);
    assert_eq!(decoded.bitmaps[0].delay(), Delay::new(2, 10));
}

#[test]
fn optimize_then_deoptimize_restores_every_frame() {
    for seed in 0..40 {
        let original = random_animation(seed, 5, 4, 6);
        let mut sequence = original.clone();
        optimizer::optimize(&mut sequence).unwrap();
        assert!(sequence.is_optimized());
        assert_eq!(sequence.animation_frames().len(), 6, "seed {seed}");
        optimizer::deoptimize(&mut sequence).unwrap();
        assert_eq!(canvas_pixels(&sequence), canvas_pixels(&original), "seed {seed}");
    }
}

#[test]
fn stored_frames_never_grow() {
    for seed in 0..20 {
        let original = random_animation(seed, 6, 6, 5);
        let mut sequence = original.clone();
        optimizer::optimize(&mut sequence).unwrap();
        for (optimized, full) in sequence.bitmaps.iter().zip(&original.bitmaps) {
            assert!(optimized.pixels().len() <= full.pixels().len());
        }
    }
}

#[test]
fn optimize_twice_changes_nothing() {
    let mut sequence = random_animation(7, 4, 4, 5);
    optimizer::optimize(&mut sequence).unwrap();
    let once = sequence.clone();
    optimizer::optimize(&mut sequence).unwrap();
    assert_eq!(sequence, once);
}

#[test]
fn optimized_file_decodes_back_to_full_frames() {
    for seed in [3, 11, 29] {
        let original = random_animation(seed, 7, 5, 4);
        let mut png = PNG::from(original.clone());
        png.optimize().unwrap();
        let bytes = png.encode().unwrap();

        let mut decoded = PNG::decode(&bytes).unwrap();
        assert_eq!(decoded.sequence().animation_type, AnimationType::Animated);
        decoded.deoptimize().unwrap();
        assert_eq!(canvas_pixels(decoded.sequence()), canvas_pixels(&original));
    }
}

#[test]
fn unoptimized_animation_round_trips_through_a_file() {
    let original = random_animation(5, 4, 3, 3);
    let bytes = PNG::from(original.clone()).encode().unwrap();
    let chunks: Vec<_> = PNG::list_chunks(&bytes)
        .unwrap()
        .into_iter()
        .map(|chunk| chunk.chunk_type)
        .collect();
    assert_eq!(
        chunks,
        ["IHDR", "acTL", "fcTL", "IDAT", "fcTL", "fdAT", "fcTL", "fdAT", "IEND"]
    );

    let mut decoded = PNG::decode(&bytes).unwrap();
    decoded.deoptimize().unwrap();
    assert_eq!(decoded.sequence().bitmaps, original.bitmaps);
}

#[test]
fn color_type_reduction_survives_encoding() {
    let original = random_animation(13, 4, 4, 3);
    let mut png = PNG::from(original.clone());
    assert!(png.optimize_color_type().unwrap());
    assert_eq!(png.sequence().header.color_type, ColorType::IndexedColor);
    let bytes = png.encode().unwrap();
    let decoded = PNG::decode(&bytes).unwrap().into_sequence();
    assert_eq!(canvas_pixels(&decoded), canvas_pixels(&original));
}

#[test]
fn frames_outside_the_canvas_are_rejected() {
    let mut sequence = animation(2, 2, vec![vec![RED; 4], vec![BLUE; 4]]);
    if let Some(control) = sequence.bitmaps[1].frame_control.as_mut() {
        control.x_offset = 1;
    }
    let error = PNG::from(sequence).encode().unwrap_err();
    assert!(matches!(error, PngError::FrameOutOfBounds { .. }));
}

#[test]
fn every_color_type_survives_optimizing_through_a_file() {
    let grey = |v: u32| BLACK | v << 16 | v << 8 | v;
    let formats = [
        (ColorType::Truecolor, 8, vec![BLACK, RED, BLUE, GREEN, 0xff80_8080], None),
        (ColorType::Truecolor, 16, vec![BLACK, RED, BLUE, GREEN], None),
        (
            ColorType::Truecolor,
            8,
            vec![CLEAR, RED, BLUE, GREEN],
            Some(tRNSChunk::Truecolor(1, 2, 3)),
        ),
        (ColorType::Greyscale, 8, vec![BLACK, grey(0xff), grey(0x80), grey(0x40)], None),
        (
            ColorType::Greyscale,
            8,
            vec![CLEAR, grey(0xff), grey(0x80), grey(0x40)],
            Some(tRNSChunk::Greyscale(0x20)),
        ),
        (ColorType::IndexedColor, 2, vec![BLACK, RED, BLUE, GREEN], None),
        (
            ColorType::IndexedColor,
            2,
            vec![CLEAR, RED, BLUE, GREEN],
            Some(tRNSChunk::Indexed(vec![0])),
        ),
    ];
    for (color_type, bit_depth, colors, transparency) in formats {
        for seed in 0..12 {
            let original =
                random_animation_as(seed, color_type, bit_depth, &colors, transparency.clone());
            let decoded = optimize_through_a_file(original.clone());
            assert_eq!(
                canvas_pixels(decoded.sequence()),
                canvas_pixels(&original),
                "{color_type:?}/{bit_depth} seed {seed}"
            );
        }
    }
}

#[test]
fn truecolor_keeps_unchanged_pixels_opaque() {
    let mut original = animation(3, 1, vec![vec![RED; 3], vec![BLUE, RED, BLUE]]);
    original.header = Header::new(3, 1, ColorType::Truecolor, 8);
    let mut png = PNG::from(original.clone());
    png.optimize().unwrap();
    let control = png.sequence().bitmaps[1].frame_control.unwrap();
    assert_eq!(control.blend_op, BlendOp::Source);

    let decoded = optimize_through_a_file(original.clone());
    assert_eq!(decoded.sequence().bitmaps[1].pixels(), &[BLUE, RED, BLUE]);
}

#[test]
fn process_image_steps_keep_a_many_colored_truecolor_animation() {
    let (width, height) = (20, 20);
    let first: Vec<u32> = (0..width * height)
        .map(|i| BLACK | (i / 256) << 16 | (i % 7) << 8 | i % 256)
        .collect();
    let mut second = first.clone();
    for i in [1, 2, 21, 22, 300] {
        second[i] = RED;
    }
    let mut third = second.clone();
    third[399] = BLUE;
    let mut original = animation(width, height, vec![first, second, third]);
    original.header = Header::new(width, height, ColorType::Truecolor, 8);
    let input = PNG::from(original.clone()).encode().unwrap();

    let mut png = PNG::decode(&input).unwrap();
    png.deoptimize().unwrap().optimize().unwrap();
    assert!(!png.optimize_color_type().unwrap());
    assert_eq!(png.sequence().header.color_type, ColorType::Truecolor);
    let output = png.encode().unwrap();

    let mut decoded = PNG::decode(&output).unwrap();
    decoded.deoptimize().unwrap();
    assert_eq!(canvas_pixels(decoded.sequence()), canvas_pixels(&original));
}
