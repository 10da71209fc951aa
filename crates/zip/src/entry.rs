use std::collections::HashMap;

use flate2::{Decompress, FlushDecompress, Status};
use log::warn;

use crate::errors::{FileCompressionType, ZipError};
use crate::structs::{CentralDirectory, EndOfCentralDirectory, LocalFileHeader};

/// Represents a parsed ZIP archive held fully in memory.
#[derive(Debug)]
pub struct ZipEntry {
    input: Vec<u8>,
    central_directory: CentralDirectory,
    local_headers: HashMap<String, LocalFileHeader>,
}

impl ZipEntry {
    /// How far back from the end of the buffer the EOCD scan steps per round
    const EOCD_CHUNK: usize = 4096;

    pub fn new(input: Vec<u8>) -> Result<ZipEntry, ZipError> {
        // perform basic sanity check
        if !input.starts_with(b"PK\x03\x04") {
            return Err(ZipError::InvalidHeader);
        }

        let eocd_offset = EndOfCentralDirectory::find(&input, Self::EOCD_CHUNK)
            .ok_or(ZipError::NotFoundEOCD)?;

        let eocd = EndOfCentralDirectory::parse(&mut &input[eocd_offset..])
            .map_err(|_| ZipError::ParseError)?;

        let central_directory =
            CentralDirectory::parse(&input, &eocd).map_err(|_| ZipError::ParseError)?;

        if central_directory.entries.len() != eocd.total_entries as usize {
            warn!(
                "central directory holds {} entries, the end record declares {}",
                central_directory.entries.len(),
                eocd.total_entries
            );
        }

        let local_headers = central_directory
            .entries
            .iter()
            .filter_map(|(filename, entry)| {
                LocalFileHeader::parse(&input, entry.local_header_offset as usize)
                    .ok()
                    .map(|header| (filename.clone(), header))
            })
            .collect();

        Ok(ZipEntry {
            input,
            central_directory,
            local_headers,
        })
    }

    /// Get list of the filenames from zip archive
    pub fn namelist(&self) -> impl Iterator<Item = &str> {
        self.central_directory.entries.keys().map(String::as_str)
    }

    /// Read a member by filename, tolerating tampered size and method fields
    pub fn read(&self, filename: &str) -> Result<(Vec<u8>, FileCompressionType), ZipError> {
        let local_header = self
            .local_headers
            .get(filename)
            .ok_or(ZipError::FileNotFound)?;

        let entry = self
            .central_directory
            .entries
            .get(filename)
            .ok_or(ZipError::FileNotFound)?;

        // zeroed local sizes are a known obfuscation, the central directory wins
        let (compressed_size, uncompressed_size) =
            if local_header.compressed_size == 0 || local_header.uncompressed_size == 0 {
                (
                    entry.compressed_size as usize,
                    entry.uncompressed_size as usize,
                )
            } else {
                (
                    local_header.compressed_size as usize,
                    local_header.uncompressed_size as usize,
                )
            };

        let offset = entry.local_header_offset as usize + local_header.size();
        // helper to safely get a slice from input
        let get_slice = |start: usize, end: usize| self.input.get(start..end).ok_or(ZipError::EOF);

        match (
            local_header.compression_method,
            compressed_size == uncompressed_size,
        ) {
            (0, _) => {
                // stored (no compression)
                let slice = get_slice(offset, offset + uncompressed_size)?;
                Ok((slice.to_vec(), FileCompressionType::Stored))
            }
            (8, _) => {
                // deflate default
                let compressed_data = get_slice(offset, offset + compressed_size)?;
                let mut uncompressed_data = Vec::with_capacity(uncompressed_size);

                Decompress::new(false)
                    .decompress_vec(
                        compressed_data,
                        &mut uncompressed_data,
                        FlushDecompress::Finish,
                    )
                    .map_err(|_| ZipError::DecompressionError)?;

                Ok((uncompressed_data, FileCompressionType::Deflated))
            }
            (_, true) => {
                // bogus method with equal sizes, treat as stored
                let slice = get_slice(offset, offset + uncompressed_size)?;
                Ok((slice.to_vec(), FileCompressionType::StoredTampered))
            }
            (_, false) => {
                // bogus method with differing sizes, try deflate first
                let compressed_data = get_slice(offset, offset + compressed_size)?;
                let mut uncompressed_data = Vec::with_capacity(uncompressed_size);
                let mut decompressor = Decompress::new(false);

                let status = decompressor.decompress_vec(
                    compressed_data,
                    &mut uncompressed_data,
                    FlushDecompress::Finish,
                );

                // check if decompression actually consumed the whole stream
                let is_valid = decompressor.total_in() == compressed_data.len() as u64;
                match status {
                    Ok(Status::Ok) | Ok(Status::StreamEnd) if is_valid => {
                        Ok((uncompressed_data, FileCompressionType::DeflatedTampered))
                    }
                    _ => {
                        let slice = get_slice(offset, offset + uncompressed_size)?;
                        Ok((slice.to_vec(), FileCompressionType::StoredTampered))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::DeflateEncoder;

    fn push_u16(buf: &mut Vec<u8>, value: u16) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    struct Member {
        name: &'static str,
        method: u16,
        data: Vec<u8>,
        uncompressed_len: u32,
    }

    fn build_zip(members: &[Member]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut offsets = Vec::new();

        for member in members {
            offsets.push(out.len() as u32);
            push_u32(&mut out, 0x04034b50);
            push_u16(&mut out, 20); // version needed
            push_u16(&mut out, 0); // flags
            push_u16(&mut out, member.method);
            push_u16(&mut out, 0); // time
            push_u16(&mut out, 0); // date
            push_u32(&mut out, 0); // crc32
            push_u32(&mut out, member.data.len() as u32);
            push_u32(&mut out, member.uncompressed_len);
            push_u16(&mut out, member.name.len() as u16);
            push_u16(&mut out, 0); // extra
            out.extend_from_slice(member.name.as_bytes());
            out.extend_from_slice(&member.data);
        }

        let central_start = out.len() as u32;
        for (member, offset) in members.iter().zip(&offsets) {
            push_u32(&mut out, 0x02014b50);
            push_u16(&mut out, 20); // version made by
            push_u16(&mut out, 20); // version needed
            push_u16(&mut out, 0); // flags
            push_u16(&mut out, member.method);
            push_u16(&mut out, 0); // time
            push_u16(&mut out, 0); // date
            push_u32(&mut out, 0); // crc32
            push_u32(&mut out, member.data.len() as u32);
            push_u32(&mut out, member.uncompressed_len);
            push_u16(&mut out, member.name.len() as u16);
            push_u16(&mut out, 0); // extra
            push_u16(&mut out, 0); // comment
            push_u16(&mut out, 0); // disk number
            push_u16(&mut out, 0); // internal attrs
            push_u32(&mut out, 0); // external attrs
            push_u32(&mut out, *offset);
            out.extend_from_slice(member.name.as_bytes());
        }
        let central_size = out.len() as u32 - central_start;

        push_u32(&mut out, 0x06054b50);
        push_u16(&mut out, 0); // disk number
        push_u16(&mut out, 0); // start disk
        push_u16(&mut out, members.len() as u16);
        push_u16(&mut out, members.len() as u16);
        push_u32(&mut out, central_size);
        push_u32(&mut out, central_start);
        push_u16(&mut out, 0); // comment length

        out
    }

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn reads_stored_and_deflated_members() {
        let manifest = b"manifest bytes".to_vec();
        let classes = b"some dex payload, long enough to squeeze".to_vec();

        let zip = build_zip(&[
            Member {
                name: "AndroidManifest.xml",
                method: 0,
                uncompressed_len: manifest.len() as u32,
                data: manifest.clone(),
            },
            Member {
                name: "classes.dex",
                method: 8,
                uncompressed_len: classes.len() as u32,
                data: deflate(&classes),
            },
        ]);

        let archive = ZipEntry::new(zip).unwrap();

        let mut names: Vec<&str> = archive.namelist().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["AndroidManifest.xml", "classes.dex"]);

        let (data, kind) = archive.read("AndroidManifest.xml").unwrap();
        assert_eq!(data, manifest);
        assert_eq!(kind, FileCompressionType::Stored);

        let (data, kind) = archive.read("classes.dex").unwrap();
        assert_eq!(data, classes);
        assert_eq!(kind, FileCompressionType::Deflated);
    }

    #[test]
    fn missing_member_is_not_found() {
        let zip = build_zip(&[Member {
            name: "a.txt",
            method: 0,
            uncompressed_len: 2,
            data: b"hi".to_vec(),
        }]);

        let archive = ZipEntry::new(zip).unwrap();
        assert!(matches!(
            archive.read("missing"),
            Err(ZipError::FileNotFound)
        ));
    }

    #[test]
    fn not_a_zip_is_rejected() {
        assert!(matches!(
            ZipEntry::new(b"MZ\x90\x00".to_vec()),
            Err(ZipError::InvalidHeader)
        ));
    }
}
