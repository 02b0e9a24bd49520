use simple_apng::{
    Bitmap, BitmapSequence, ColorType, ErrorKind, Header, PLTEChunk, PngError, TextEntry,
    tRNSChunk, PNG,
};

const RED: u32 = 0xffff_0000;
const GREEN: u32 = 0xff00_ff00;
const BLUE: u32 = 0xff00_00ff;

/// Deterministic opaque-ish noise so the filters have something to chew on.
fn noise(width: u32, height: u32, seed: u32) -> Bitmap {
    let mut state = seed;
    let pixels = (0..width * height)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            state | 0x8000_0000
        })
        .collect();
    Bitmap::from_pixels(width, height, pixels).unwrap()
}

fn round_trip(sequence: BitmapSequence) -> BitmapSequence {
    let bytes = PNG::from(sequence).encode().unwrap();
    PNG::decode(&bytes).unwrap().into_sequence()
}

fn chunk_types(bytes: &[u8]) -> Vec<String> {
    PNG::list_chunks(bytes)
        .unwrap()
        .into_iter()
        .map(|chunk| chunk.chunk_type)
        .collect()
}

fn scenario_a() -> BitmapSequence {
    let pixels = [RED, RED, GREEN, GREEN, BLUE, BLUE, RED, RED]
        .iter()
        .cycle()
        .take(16)
        .copied()
        .collect();
    let bitmap = Bitmap::from_pixels(4, 4, pixels).unwrap();
    BitmapSequence::still(Header::new(4, 4, ColorType::TruecolorWithAlpha, 8), bitmap)
}

#[test]
fn opaque_rgba_round_trips_with_minimal_chunks() {
    let sequence = scenario_a();
    let bytes = PNG::from(sequence.clone()).encode().unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    insta::assert_debug_snapshot!(chunk_types(&bytes), @r###"
    [
        "IHDR",
        "IDAT",
        "IEND",
    ]
    "###);
    let decoded = PNG::decode(&bytes).unwrap().into_sequence();
    assert_eq!(decoded.header, sequence.header);
    assert_eq!(decoded.bitmaps, sequence.bitmaps);
    assert!(!decoded.is_animated());
}

#[test]
fn corrupting_any_payload_byte_is_a_format_error() {
    let bytes = PNG::from(scenario_a()).encode().unwrap();
    let mut offset = 8;
    for chunk in PNG::list_chunks(&bytes).unwrap() {
        let payload = offset + 8..offset + 8 + chunk.length as usize;
        for i in payload {
            let mut corrupt = bytes.clone();
            corrupt[i] ^= 0x01;
            let error = PNG::decode(&corrupt).unwrap_err();
            assert!(
                matches!(error, PngError::CrcMismatch { .. }),
                "byte {i} of {}: {error}",
                chunk.chunk_type
            );
            assert_eq!(error.kind(), ErrorKind::Format);
        }
        offset += 12 + chunk.length as usize;
    }
}

#[test]
fn bad_signature_is_rejected() {
    let mut bytes = PNG::from(scenario_a()).encode().unwrap();
    bytes[1] = b'J';
    let error = PNG::decode(&bytes).unwrap_err();
    assert!(matches!(error, PngError::BadSignature));
    assert_eq!(error.kind(), ErrorKind::Format);
}

#[test]
fn missing_iend_is_truncation() {
    let bytes = PNG::from(scenario_a()).encode().unwrap();
    let error = PNG::decode(&bytes[..bytes.len() - 12]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Format);
}

#[test]
fn adam7_round_trips_at_awkward_sizes() {
    for (width, height) in [(1, 1), (8, 8), (9, 5), (3, 17), (13, 2)] {
        let bitmap = noise(width, height, width * 31 + height);
        let header = Header::new(width, height, ColorType::TruecolorWithAlpha, 8).interlaced();
        let decoded = round_trip(BitmapSequence::still(header, bitmap.clone()));
        assert_eq!(decoded.bitmaps, vec![bitmap], "{width}x{height}");
    }
}

#[test]
fn interlaced_and_progressive_decode_to_the_same_pixels() {
    let bitmap = noise(10, 7, 99);
    let plain = Header::new(10, 7, ColorType::TruecolorWithAlpha, 8);
    let progressive = round_trip(BitmapSequence::still(plain, bitmap.clone()));
    let interlaced = round_trip(BitmapSequence::still(plain.interlaced(), bitmap));
    assert_eq!(progressive.bitmaps, interlaced.bitmaps);
}

#[test]
fn truecolor_drops_alpha() {
    let bitmap = Bitmap::from_pixels(3, 1, vec![RED, GREEN, BLUE]).unwrap();
    let header = Header::new(3, 1, ColorType::Truecolor, 8);
    let decoded = round_trip(BitmapSequence::still(header, bitmap.clone()));
    assert_eq!(decoded.bitmaps, vec![bitmap]);
}

#[test]
fn indexed_images_keep_palette_and_transparency() {
    let colors = [RED, GREEN, BLUE, 0x80ff_ffff];
    let pixels = (0..24).map(|i| colors[i % 4]).collect();
    let bitmap = Bitmap::from_pixels(6, 4, pixels).unwrap();
    let mut sequence =
        BitmapSequence::still(Header::new(6, 4, ColorType::IndexedColor, 2), bitmap.clone());
    sequence.palette = Some(PLTEChunk::from_argb(&colors).unwrap());
    sequence.transparency = Some(tRNSChunk::Indexed(vec![255, 255, 255, 0x80]));

    let bytes = PNG::from(sequence).encode().unwrap();
    assert_eq!(chunk_types(&bytes), ["IHDR", "PLTE", "tRNS", "IDAT", "IEND"]);
    let decoded = PNG::decode(&bytes).unwrap().into_sequence();
    assert_eq!(decoded.bitmaps, vec![bitmap]);
    assert_eq!(decoded.palette.unwrap().len(), 4);
}

#[test]
fn indexed_without_palette_is_a_precondition_error() {
    let sequence = BitmapSequence::still(
        Header::new(1, 1, ColorType::IndexedColor, 8),
        Bitmap::new(1, 1),
    );
    let error = PNG::from(sequence).encode().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Precondition);
}

#[test]
fn greyscale_depths_round_trip() {
    let eight = (0..16u32).map(|v| {
        let grey = v * 17;
        0xff00_0000 | grey << 16 | grey << 8 | grey
    });
    let bitmap = Bitmap::from_pixels(4, 4, eight.collect()).unwrap();
    let header = Header::new(4, 4, ColorType::Greyscale, 8);
    let decoded = round_trip(BitmapSequence::still(header, bitmap.clone()));
    assert_eq!(decoded.bitmaps, vec![bitmap]);

    let ramp = [0xff00_0000, 0xff55_5555, 0xffaa_aaaa, 0xffff_ffff];
    let pixels = (0..15).map(|i| ramp[i % 4]).collect();
    let bitmap = Bitmap::from_pixels(5, 3, pixels).unwrap();
    let header = Header::new(5, 3, ColorType::Greyscale, 2);
    let decoded = round_trip(BitmapSequence::still(header, bitmap.clone()));
    assert_eq!(decoded.bitmaps, vec![bitmap]);
}

#[test]
fn text_chunks_survive() {
    let mut sequence = scenario_a();
    sequence.text.push(TextEntry::new("Title", "four by four"));
    let decoded = round_trip(sequence);
    assert_eq!(decoded.text.len(), 1);
    assert_eq!(decoded.text[0].keyword, "Title");
    assert_eq!(decoded.text[0].text, "four by four");
}

#[test]
fn large_images_split_into_several_idat_chunks() {
    let bitmap = noise(64, 64, 7);
    let sequence = BitmapSequence::still(
        Header::new(64, 64, ColorType::TruecolorWithAlpha, 8),
        bitmap.clone(),
    );
    let options = simple_apng::EncodeOptions {
        max_data_chunk_len: 1024,
        ..Default::default()
    };
    let bytes = PNG::from(sequence)
        .encode_with(&options, &mut simple_apng::NoProgress)
        .unwrap();
    let idats = chunk_types(&bytes).iter().filter(|t| *t == "IDAT").count();
    assert!(idats > 1);
    let decoded = PNG::decode(&bytes).unwrap().into_sequence();
    assert_eq!(decoded.bitmaps, vec![bitmap]);
}
