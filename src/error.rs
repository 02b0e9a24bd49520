/// Every way a read, write or frame transformation can fail.
///
/// None of these are recoverable for the call that produced them; the only
/// chunks the decoder skips over are ancillary ones it does not model, and those
/// never surface here.
#[derive(Debug, thiserror::Error)]
pub enum PngError {
    #[error("input doesn't start with the PNG signature")]
    BadSignature,

    #[error("CRC mismatch in {chunk} chunk: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        chunk: String,
        stored: u32,
        computed: u32,
    },

    #[error("{chunk} chunk declares an invalid length of {length} bytes")]
    BadChunkLength { chunk: String, length: u32 },

    #[error("stream ended inside a chunk or before IEND")]
    Truncated,

    #[error("expected IHDR as the first chunk, found {0}")]
    HeaderNotFirst(String),

    #[error("frame sequence number {found} doesn't match the expected {expected}")]
    SequenceMismatch { expected: u32, found: u32 },

    #[error("malformed {chunk} chunk: {reason}")]
    MalformedChunk { chunk: &'static str, reason: String },

    #[error("{chunk} chunk is not allowed here: {reason}")]
    UnexpectedChunk { chunk: &'static str, reason: String },

    #[error("unknown filter type {0}")]
    UnknownFilter(u8),

    #[error("palette index {index} is out of range for {len} entries")]
    PaletteIndex { index: u8, len: usize },

    #[error("frame {width}x{height} at ({x}, {y}) doesn't fit a {canvas_width}x{canvas_height} canvas")]
    FrameOutOfBounds {
        width: u32,
        height: u32,
        x: u32,
        y: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("stream contains no image data")]
    MissingImageData,

    #[error("unsupported color type {color_type} with bit depth {bit_depth}")]
    UnsupportedColorType { color_type: u8, bit_depth: u8 },

    #[error("unsupported interlace method {0}")]
    UnsupportedInterlace(u8),

    #[error("unsupported {kind} method {value}")]
    UnsupportedMethod { kind: &'static str, value: u8 },

    #[error("failed to inflate image data: {0}")]
    Inflate(String),

    #[error("compressed data ended before every scanline was read")]
    UnexpectedEndOfData,

    #[error("indexed image data without a palette")]
    MissingPalette,

    #[error("expected {expected_width}x{expected_height} pixels, got {width}x{height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("sequence has no header")]
    MissingHeader,

    #[error("{count} colors don't fit a palette")]
    TooManyColors { count: usize },
}

/// The four families of [`PngError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The byte stream is not a well-formed PNG/APNG.
    Format,
    /// Well-formed, but uses something this codec can't represent.
    Unsupported,
    /// The zlib stream is corrupt or short.
    DataIntegrity,
    /// The caller handed over a model that can't be written as asked.
    Precondition,
}

impl PngError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadSignature
            | Self::CrcMismatch { .. }
            | Self::BadChunkLength { .. }
            | Self::Truncated
            | Self::HeaderNotFirst(_)
            | Self::SequenceMismatch { .. }
            | Self::MalformedChunk { .. }
            | Self::UnexpectedChunk { .. }
            | Self::UnknownFilter(_)
            | Self::PaletteIndex { .. }
            | Self::FrameOutOfBounds { .. }
            | Self::MissingImageData => ErrorKind::Format,
            Self::UnsupportedColorType { .. }
            | Self::UnsupportedInterlace(_)
            | Self::UnsupportedMethod { .. } => ErrorKind::Unsupported,
            Self::Inflate(_) | Self::UnexpectedEndOfData => ErrorKind::DataIntegrity,
            Self::MissingPalette
            | Self::DimensionMismatch { .. }
            | Self::MissingHeader
            | Self::TooManyColors { .. } => ErrorKind::Precondition,
        }
    }
}

pub type Result<T, E = PngError> = std::result::Result<T, E>;
