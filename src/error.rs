use thiserror::Error;

use crate::ObjectId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An Object has the wrong type, e.g. the Object is an Array where a Name would be expected.
    #[error("object has wrong type; expected type {expected} but found type {found}")]
    ObjectType {
        expected: &'static str,
        found: &'static str,
    },
    /// Dictionary key was not found.
    #[error("missing required dictionary key \"{0}\"")]
    DictKey(String),
    /// The stream couldn't be decompressed.
    #[error("couldn't decompress stream: {0}")]
    Decompress(#[from] DecompressError),
    /// Failed to parse input.
    #[error("couldn't parse input: {0}")]
    Parse(#[from] ParseError),
    /// Invalid inline image. Aborts the content stream parse that hit it.
    #[error("invalid inline image: {0}")]
    InvalidInlineImage(String),
    /// The Object ID was not found.
    #[error("object {0:?} not found")]
    ObjectNotFound(ObjectId),
    /// Dereferencing object failed due to a reference cycle.
    #[error("reference cycle while dereferencing object {0:?}")]
    ReferenceCycle(ObjectId),
    /// A canonical reference key could not be parsed.
    #[error("invalid reference key \"{0}\"")]
    ReferenceKey(String),
    /// IO error
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DecompressError {
    #[error("unsupported filter {0}")]
    UnsupportedFilter(String),
    #[error("zlib stream is corrupt: {0}")]
    Flate(std::io::Error),
    #[error("LZW stream is corrupt: {0}")]
    Lzw(String),
    #[error("PNG predictor failed: {0}")]
    Predictor(std::io::Error),
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid object stream header")]
    InvalidObjectStream,
    #[error("invalid page tree")]
    InvalidPageTree,
}
