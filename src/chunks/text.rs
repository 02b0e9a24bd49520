use miniz_oxide::{deflate::compress_to_vec_zlib, inflate::decompress_to_vec_zlib};
use nom::{
    bytes::complete::{tag, take_until},
    combinator::rest,
    number::complete::u8,
    sequence::{terminated, tuple},
    IResult,
};

use super::{finish, frame_chunk};
use crate::{
    error::{PngError, Result},
    utils::{latin1_to_string, string_to_latin1},
};

pub(crate) const TEXT: &[u8; 4] = b"tEXt";
pub(crate) const COMPRESSED_TEXT: &[u8; 4] = b"zTXt";
pub(crate) const INTERNATIONAL_TEXT: &[u8; 4] = b"iTXt";

/// Which of the three text chunks an entry came from, and how it is written
/// back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TextKind {
    /// `tEXt`, Latin-1.
    #[default]
    Plain,
    /// `zTXt`, zlib-compressed Latin-1.
    Compressed,
    /// `iTXt`, UTF-8.
    International {
        compressed: bool,
        language_tag: String,
        translated_keyword: String,
    },
}

/// One keyword/value pair of image metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub keyword: String,
    pub text: String,
    pub kind: TextKind,
}
impl TextEntry {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
            kind: TextKind::Plain,
        }
    }

    pub(crate) fn is_text_chunk(chunk_type: &[u8; 4]) -> bool {
        chunk_type == TEXT || chunk_type == COMPRESSED_TEXT || chunk_type == INTERNATIONAL_TEXT
    }

    pub(crate) fn from_bytes(chunk_type: &[u8; 4], chunk_data: &[u8]) -> Result<Self> {
        match chunk_type {
            TEXT => {
                let (keyword, text) = finish(TEXT, tuple((keyword, rest))(chunk_data))?;
                Ok(Self {
                    keyword: latin1_to_string(keyword),
                    text: latin1_to_string(text),
                    kind: TextKind::Plain,
                })
            }
            COMPRESSED_TEXT => {
                let (keyword, method, data) =
                    finish(COMPRESSED_TEXT, tuple((keyword, u8, rest))(chunk_data))?;
                check_method(COMPRESSED_TEXT, method)?;
                Ok(Self {
                    keyword: latin1_to_string(keyword),
                    text: latin1_to_string(&inflate(data)?),
                    kind: TextKind::Compressed,
                })
            }
            INTERNATIONAL_TEXT => {
                let (keyword, flag, method, language_tag, translated_keyword, data) = finish(
                    INTERNATIONAL_TEXT,
                    tuple((keyword, u8, u8, null_terminated, null_terminated, rest))(chunk_data),
                )?;
                let compressed = flag != 0;
                let text = if compressed {
                    check_method(INTERNATIONAL_TEXT, method)?;
                    inflate(data)?
                } else {
                    data.to_vec()
                };
                Ok(Self {
                    keyword: latin1_to_string(keyword),
                    text: String::from_utf8_lossy(&text).into_owned(),
                    kind: TextKind::International {
                        compressed,
                        language_tag: latin1_to_string(language_tag),
                        translated_keyword: String::from_utf8_lossy(translated_keyword)
                            .into_owned(),
                    },
                })
            }
            _ => Err(PngError::UnexpectedChunk {
                chunk: "tEXt",
                reason: format!("{} is not a text chunk", String::from_utf8_lossy(chunk_type)),
            }),
        }
    }

    pub(crate) fn to_bytes(&self, compression_level: u8) -> Vec<u8> {
        let mut payload = string_to_latin1(&self.keyword);
        payload.push(0);
        match &self.kind {
            TextKind::Plain => {
                payload.extend(string_to_latin1(&self.text));
                frame_chunk(TEXT, &payload)
            }
            TextKind::Compressed => {
                payload.push(0);
                payload.extend(compress_to_vec_zlib(
                    &string_to_latin1(&self.text),
                    compression_level,
                ));
                frame_chunk(COMPRESSED_TEXT, &payload)
            }
            TextKind::International {
                compressed,
                language_tag,
                translated_keyword,
            } => {
                payload.extend([*compressed as u8, 0]);
                payload.extend(string_to_latin1(language_tag));
                payload.push(0);
                payload.extend(translated_keyword.as_bytes());
                payload.push(0);
                if *compressed {
                    payload.extend(compress_to_vec_zlib(self.text.as_bytes(), compression_level));
                } else {
                    payload.extend(self.text.as_bytes());
                }
                frame_chunk(INTERNATIONAL_TEXT, &payload)
            }
        }
    }
}

fn null_terminated(input: &[u8]) -> IResult<&[u8], &[u8]> {
    terminated(take_until(&b"\0"[..]), tag(&b"\0"[..]))(input)
}

/// 1 to 79 bytes followed by a null separator.
fn keyword(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (rest, keyword) = null_terminated(input)?;
    if keyword.is_empty() || keyword.len() > 79 {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((rest, keyword))
}

fn check_method(chunk: &'static [u8; 4], method: u8) -> Result<()> {
    match method {
        0 => Ok(()),
        value => Err(PngError::UnsupportedMethod {
            kind: super::chunk_name(chunk),
            value,
        }),
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    decompress_to_vec_zlib(data).map_err(|e| PngError::Inflate(format!("{:?}", e.status)))
}
