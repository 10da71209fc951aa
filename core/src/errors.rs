use std::io;

use apkshell_axml::AxmlError;
use apkshell_dex::DexError;
use apkshell_zip::{CertificateError, ZipError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApkError {
    /// Generic I/O error while trying to read or write data
    #[error(transparent)]
    IoError(#[from] io::Error),

    /// Got invalid input (for example, empty file or not an apk)
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// Error occurred while parsing AndroidManifest.xml
    #[error("got error while parsing AndroidManifest.xml")]
    ManifestError(#[from] AxmlError),

    /// Error occurred while parsing the apk as a zip archive
    #[error("got error while parsing apk archive")]
    ZipError(#[from] ZipError),

    /// Error occurred while parsing a dex image
    #[error("got error while parsing dex image")]
    DexError(#[from] DexError),

    /// Error occurred while reading the signing certificate
    #[error("got error while reading certificate")]
    CertificateError(#[from] CertificateError),
}
