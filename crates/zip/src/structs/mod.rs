mod central_directory;
mod eocd;
mod local_file_header;

pub(crate) use central_directory::{CentralDirectory, CentralDirectoryEntry};
pub(crate) use eocd::EndOfCentralDirectory;
pub(crate) use local_file_header::LocalFileHeader;
