use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZipError {
    /// Basic sanity check
    #[error("provided file is not a zip archive")]
    InvalidHeader,

    /// Got error while decompressing object
    #[error("got error while decompressing object")]
    DecompressionError,

    /// Got EOF while reading data
    #[error("got EOF while parsing zip")]
    EOF,

    /// Provided file not found in zip
    #[error("file not exist in zip")]
    FileNotFound,

    /// Can't operate without EOCD
    #[error("can't find EOCD in zip")]
    NotFoundEOCD,

    /// Generic parsing error
    #[error("got error while parsing zip archive")]
    ParseError,
}

/// How a member was actually stored
#[derive(Debug, PartialEq, Eq)]
pub enum FileCompressionType {
    /// Stored without compression
    Stored,

    /// Raw deflate stream
    Deflated,

    /// The declared method was bogus, the bytes were stored
    StoredTampered,

    /// The declared method was bogus, the bytes were deflated
    DeflatedTampered,
}

#[derive(Error, Debug)]
pub enum CertificateError {
    #[error("no signature block in archive")]
    NotFound,

    #[error("signature block holds no certificates")]
    EmptyChain,

    #[error("got error while decoding signature block: {0}")]
    DerError(#[from] der::Error),

    #[error("got zip error while reading certificate: {0}")]
    ZipError(#[from] ZipError),
}
