use crate::{
    chunks::{iter_chunks, parse_signature, ChunkInfo},
    decoder::PNGDecoder,
    encoder::PNGEncoder,
    error::Result,
    optimizer,
    options::{DecodeOptions, EncodeOptions},
    progress::{NoProgress, ProgressSink},
    sequence::BitmapSequence,
};

/// A decoded PNG or APNG.
#[derive(Debug, Clone, PartialEq)]
pub struct PNG {
    sequence: BitmapSequence,
}

impl PNG {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, &DecodeOptions::default(), &mut NoProgress)
    }

    pub fn decode_with(
        bytes: &[u8],
        options: &DecodeOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<Self> {
        let decoder = PNGDecoder::new(bytes, *options)?;
        let (decoder, header) = decoder.parse_ihdr(progress)?;
        let sequence = decoder.decode(header, progress)?;
        Ok(Self { sequence })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        self.encode_with(&EncodeOptions::default(), &mut NoProgress)
    }

    pub fn encode_with(
        &self,
        options: &EncodeOptions,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<u8>> {
        PNGEncoder::new(&self.sequence, *options).encode(progress)
    }

    /// Type and payload length of every chunk up to IEND, CRCs checked.
    pub fn list_chunks(bytes: &[u8]) -> Result<Vec<ChunkInfo>> {
        let rest = parse_signature(bytes)?;
        iter_chunks(rest, DecodeOptions::default().max_chunk_length)
            .map(|chunk| {
                chunk.map(|chunk| ChunkInfo {
                    chunk_type: chunk.name(),
                    length: chunk.data.len() as u32,
                })
            })
            .collect()
    }

    pub fn sequence(&self) -> &BitmapSequence {
        &self.sequence
    }

    pub fn sequence_mut(&mut self) -> &mut BitmapSequence {
        &mut self.sequence
    }

    pub fn into_sequence(self) -> BitmapSequence {
        self.sequence
    }

    /// Composites stored deltas into full frames; see [`optimizer::deoptimize`].
    pub fn deoptimize(&mut self) -> Result<&mut Self> {
        optimizer::deoptimize(&mut self.sequence)?;
        Ok(self)
    }

    /// See [`optimizer::optimize`].
    pub fn optimize(&mut self) -> Result<&mut Self> {
        optimizer::optimize(&mut self.sequence)?;
        Ok(self)
    }

    pub fn optimize_color_type(&mut self) -> Result<bool> {
        optimizer::optimize_color_type(&mut self.sequence)
    }
}

impl From<BitmapSequence> for PNG {
    fn from(sequence: BitmapSequence) -> Self {
        Self { sequence }
    }
}
