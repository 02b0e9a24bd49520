use log::trace;
use miniz_oxide::{
    deflate::compress_to_vec_zlib,
    inflate::stream::{inflate, InflateState},
    DataFormat, MZError, MZFlush, MZStatus,
};

use crate::{
    bitmap::Bitmap,
    chunks::{ihdr::IHDRChunk, plte::PLTEChunk, trns::tRNSChunk},
    error::{PngError, Result},
    filters::{AdaptiveFilter, Filter},
    interlacing::passes,
    scanlines::ScanlineCodec,
};

/// Pulls exactly as many inflated bytes as asked for out of one zlib stream.
struct Inflater<'a> {
    state: Box<InflateState>,
    input: &'a [u8],
}
impl<'a> Inflater<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            state: InflateState::new_boxed(DataFormat::Zlib),
            input,
        }
    }

    fn fill(&mut self, out: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < out.len() {
            let result = inflate(&mut self.state, self.input, &mut out[filled..], MZFlush::None);
            self.input = &self.input[result.bytes_consumed..];
            filled += result.bytes_written;
            match result.status {
                Ok(MZStatus::StreamEnd) if filled < out.len() => {
                    return Err(PngError::UnexpectedEndOfData)
                }
                Ok(_) if result.bytes_written == 0 && result.bytes_consumed == 0 => {
                    return Err(PngError::UnexpectedEndOfData)
                }
                Ok(_) => {}
                Err(MZError::Buf) => return Err(PngError::UnexpectedEndOfData),
                Err(e) => return Err(PngError::Inflate(format!("{e:?}"))),
            }
        }
        Ok(())
    }
}

/// Moves one frame between its zlib stream and a bitmap: inflate, unfilter and
/// scatter into the pixel buffer on the way in, gather, filter and deflate on
/// the way out.
///
/// Row buffers and filter trials belong to the instance and are reused for
/// every row of every frame it handles.
pub(crate) struct PixelCodec {
    header: IHDRChunk,
    codec: ScanlineCodec,
    current: Vec<u8>,
    previous: Vec<u8>,
    adaptive: AdaptiveFilter,
}
impl PixelCodec {
    fn with_codec(header: &IHDRChunk, codec: ScanlineCodec) -> Self {
        Self {
            header: *header,
            codec,
            current: Vec::new(),
            previous: Vec::new(),
            adaptive: AdaptiveFilter::new(),
        }
    }

    pub(crate) fn for_decode(
        header: &IHDRChunk,
        palette: Option<&PLTEChunk>,
        transparency: Option<&tRNSChunk>,
    ) -> Result<Self> {
        let codec = ScanlineCodec::for_decode(header, palette, transparency)?;
        Ok(Self::with_codec(header, codec))
    }

    pub(crate) fn for_encode(
        header: &IHDRChunk,
        palette: Option<&PLTEChunk>,
        transparency: Option<&tRNSChunk>,
    ) -> Result<Self> {
        let codec = ScanlineCodec::for_encode(header, palette, transparency)?;
        Ok(Self::with_codec(header, codec))
    }

    /// Decodes a frame's concatenated IDAT/fdAT payloads into `bitmap`, whose
    /// size is the frame's.
    pub(crate) fn decode(&mut self, data: &[u8], bitmap: &mut Bitmap) -> Result<()> {
        let bpp = self.header.filter_width();
        let mut inflater = Inflater::new(data);
        let frame_passes = passes(
            self.header.interlace_method,
            bitmap.width() as usize,
            bitmap.height() as usize,
        );
        for pass in frame_passes {
            let len = self.header.scanline_size(pass.width);
            trace!("pass {}x{}, {len} bytes per line", pass.width, pass.height);
            self.previous.clear();
            self.previous.resize(len - 1, 0);
            self.current.resize(len, 0);
            for row in 0..pass.height {
                inflater.fill(&mut self.current[..len])?;
                let filter = Filter::try_from(self.current[0])?;
                let line = &mut self.current[1..len];
                filter.reconstruct_row(line, &self.previous, bpp);
                self.codec
                    .write(bitmap, line, pass.offset_x, pass.step_x, pass.line(row))?;
                self.previous.copy_from_slice(line);
            }
        }
        if !inflater.input.is_empty() {
            trace!("{} bytes after the last scanline", inflater.input.len());
        }
        Ok(())
    }

    /// Encodes `bitmap` into one zlib stream.
    pub(crate) fn encode(&mut self, bitmap: &Bitmap, compression_level: u8) -> Vec<u8> {
        let bpp = self.header.filter_width();
        let adaptive = self.header.adaptive_filtering();
        let mut raw = Vec::new();
        let frame_passes = passes(
            self.header.interlace_method,
            bitmap.width() as usize,
            bitmap.height() as usize,
        );
        for pass in frame_passes {
            let len = self.header.scanline_size(pass.width) - 1;
            raw.reserve((len + 1) * pass.height);
            self.previous.clear();
            self.previous.resize(len, 0);
            self.current.clear();
            self.current.resize(len, 0);
            for row in 0..pass.height {
                self.codec.read(
                    bitmap,
                    &mut self.current,
                    pass.offset_x,
                    pass.step_x,
                    pass.line(row),
                );
                if adaptive {
                    let (filter, filtered) =
                        self.adaptive.best(&self.current, &self.previous, bpp);
                    raw.push(filter as u8);
                    raw.extend_from_slice(filtered);
                } else {
                    raw.push(Filter::None as u8);
                    raw.extend_from_slice(&self.current);
                }
                std::mem::swap(&mut self.current, &mut self.previous);
            }
        }
        compress_to_vec_zlib(&raw, compression_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::ihdr::ColorType;
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    fn gradient(width: u32, height: u32) -> Bitmap {
        let pixels = (0..width * height)
            .map(|i| 0xff00_0000 | (i * 7919) & 0x00ff_ffff)
            .collect();
        Bitmap::from_pixels(width, height, pixels).unwrap()
    }

    #[test]
    fn frames_survive_encode_and_decode() {
        for header in [
            IHDRChunk::new(7, 5, ColorType::TruecolorWithAlpha, 8),
            IHDRChunk::new(7, 5, ColorType::Truecolor, 8).interlaced(),
            IHDRChunk::new(1, 1, ColorType::TruecolorWithAlpha, 8).interlaced(),
        ] {
            let bitmap = gradient(header.width, header.height);
            let data = PixelCodec::for_encode(&header, None, None)
                .unwrap()
                .encode(&bitmap, 6);
            let mut decoded = Bitmap::new(header.width, header.height);
            PixelCodec::for_decode(&header, None, None)
                .unwrap()
                .decode(&data, &mut decoded)
                .unwrap();
            assert_eq!(decoded, bitmap, "{header:?}");
        }
    }

    #[test]
    fn line_sizes_include_the_filter_byte() {
        let header = IHDRChunk::new(3, 2, ColorType::Truecolor, 8);
        let data = PixelCodec::for_encode(&header, None, None)
            .unwrap()
            .encode(&gradient(3, 2), 9);
        assert_eq!(decompress_to_vec_zlib(&data).unwrap().len(), 2 * (1 + 9));
    }

    #[test]
    fn short_data_is_unexpected_end() {
        let header = IHDRChunk::new(4, 4, ColorType::Greyscale, 8);
        let data = compress_to_vec_zlib(&[0; 5 * 3], 6);
        let mut bitmap = Bitmap::new(4, 4);
        let err = PixelCodec::for_decode(&header, None, None)
            .unwrap()
            .decode(&data, &mut bitmap)
            .unwrap_err();
        assert!(matches!(err, PngError::UnexpectedEndOfData), "{err:?}");
    }

    #[test]
    fn corrupt_stream_is_an_inflate_error() {
        let header = IHDRChunk::new(4, 4, ColorType::Greyscale, 8);
        let mut bitmap = Bitmap::new(4, 4);
        let err = PixelCodec::for_decode(&header, None, None)
            .unwrap()
            .decode(&[0x78, 0x9c, 0xff, 0xff, 0xff, 0xff], &mut bitmap)
            .unwrap_err();
        assert!(
            matches!(err, PngError::Inflate(_) | PngError::UnexpectedEndOfData),
            "{err:?}"
        );
    }

    #[test]
    fn unknown_filter_byte_fails() {
        let header = IHDRChunk::new(2, 1, ColorType::Greyscale, 8);
        let data = compress_to_vec_zlib(&[9, 1, 2], 6);
        let mut bitmap = Bitmap::new(2, 1);
        let err = PixelCodec::for_decode(&header, None, None)
            .unwrap()
            .decode(&data, &mut bitmap)
            .unwrap_err();
        assert!(matches!(err, PngError::UnknownFilter(9)));
    }
}
