//! Binary program images: `PALB`, a format version byte, then the
//! postcard encoding of a [`Program`].

use thiserror::Error;

use crate::bytecode::Program;

pub const MAGIC: &[u8; 4] = b"PALB";
pub const VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("not a program image (bad magic)")]
    BadMagic,

    #[error("unsupported image version {found} (expected {})", VERSION)]
    UnsupportedVersion { found: u8 },

    #[error("malformed image: {0}")]
    Malformed(#[from] postcard::Error),
}

/// Whether `bytes` start with the image magic.
pub fn is_image(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

pub fn encode(program: &Program) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::with_capacity(MAGIC.len() + 1 + program.len() * 3);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&postcard::to_allocvec(program)?);
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<Program, ImageError> {
    let body = bytes.strip_prefix(MAGIC).ok_or(ImageError::BadMagic)?;
    let (&version, body) = body.split_first().ok_or(ImageError::BadMagic)?;
    if version != VERSION {
        return Err(ImageError::UnsupportedVersion { found: version });
    }
    Ok(postcard::from_bytes(body)?)
}
