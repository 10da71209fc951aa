use thiserror::Error;

/// Errors that may occur while decoding a compiled manifest.
#[derive(Error, Debug)]
pub enum AxmlError {
    /// Provided buffer too small to be a manifest
    #[error("file size too small for manifest")]
    TooSmallError,

    /// Invalid document header
    #[error("got error while parsing header")]
    HeaderError,

    /// Invalid document header size
    #[error("got invalid header size, expected - 8")]
    HeaderSizeError(u16),

    /// Got error while parsing string pool
    #[error("got error while parsing string pool")]
    StringPoolError,

    /// A style offset table is announced but points nowhere
    #[error("string pool declares styles without a style offset")]
    StylesOffsetError,

    /// Got error while parsing resource map
    #[error("got error while parsing resource map")]
    ResourceMapError,

    /// Got error while parsing xml tree
    #[error("got error while parsing xml tree")]
    XmlTreeError,

    #[error("can't get root for xml tree")]
    MissingRoot,
}
