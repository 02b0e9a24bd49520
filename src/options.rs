/// Knobs for [`PNG::decode_with`](crate::PNG::decode_with).
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Longest chunk payload accepted before the stream is rejected.
    pub max_chunk_length: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_chunk_length: (1 << 31) - 1,
        }
    }
}

/// Knobs for [`PNG::encode_with`](crate::PNG::encode_with).
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// zlib level, 0-10.
    pub compression_level: u8,
    /// Deflated frame data is split into IDAT/fdAT chunks no longer than this.
    pub max_data_chunk_len: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compression_level: 9,
            max_data_chunk_len: 32 * 1024,
        }
    }
}
