//! Errors returned by this crate.

use thiserror::Error;

/// Errors that may occur while parsing a dex image.
#[derive(Error, Debug)]
pub enum DexError {
    #[error("got unknown dex version: {0}")]
    UnknownVersion(u16),

    #[error("invalid header")]
    InvalidHeader,

    #[error("got error while parsing string_ids")]
    StringError,

    #[error("got error while parsing type_ids")]
    TypeError,

    #[error("got error while parsing proto_ids")]
    ProtoError,

    #[error("got error while parsing field_ids")]
    FieldError,

    #[error("got error while parsing method_ids")]
    MethodError,

    #[error("got error while parsing class_defs")]
    ClassError,

    #[error("got unknown type item: {0}")]
    UnknownTypeItem(u16),

    #[error("got error while parsing map_list")]
    MapListError,

    #[error("got error while parsing class data for class {0}")]
    ClassDataError(u32),

    #[error("got error while parsing code item at offset {0:#x}")]
    CodeItemError(u32),

    #[error("got error while parsing debug info at offset {0:#x}")]
    DebugInfoError(u32),

    #[error("got truncated method body")]
    TruncatedBody,

    /// Sink failures while writing a listing
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
