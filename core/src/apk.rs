use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use apkshell_axml::Axml;
use apkshell_dex::{CfgType, Dex};
use apkshell_zip::{SigningCertificate, ZipEntry};
use log::warn;
use sha1::{Digest, Sha1};

use crate::errors::ApkError;
use crate::manifest::Manifest;

const ANDROID_MANIFEST_PATH: &str = "AndroidManifest.xml";
const NATIVE_LIB_PREFIX: &str = "lib/";
const LIB_DUMP_DIR: &str = "libs";

/// Main structure that represents an APK file: the archive, its decoded
/// manifest, every dex image and the signing certificate.
#[derive(Debug)]
pub struct Apk {
    zip: ZipEntry,
    manifest: Manifest,
    images: Vec<(String, Dex)>,
    certificate: Option<SigningCertificate>,
}

impl Apk {
    pub fn new(path: &Path) -> Result<Apk, ApkError> {
        // basic sanity check
        if !path.exists() {
            return Err(ApkError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                "file not found",
            )));
        }

        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(1024 * 1024, file);
        let mut input = Vec::new();
        reader.read_to_end(&mut input)?;

        if input.is_empty() {
            return Err(ApkError::InvalidInput("got empty file"));
        }

        let zip = ZipEntry::new(input)?;

        let (manifest_data, _) = zip
            .read(ANDROID_MANIFEST_PATH)
            .map_err(|_| ApkError::InvalidInput("can't find AndroidManifest.xml, is it apk?"))?;
        if manifest_data.is_empty() {
            return Err(ApkError::InvalidInput(
                "AndroidManifest.xml is empty, not a valid apk",
            ));
        }

        let document = Axml::parse(&manifest_data)?;
        let manifest = Manifest::from_document(&document);

        let mut dex_names: Vec<String> = zip
            .namelist()
            .filter(|name| Self::is_dex_member(name))
            .map(str::to_owned)
            .collect();
        dex_names.sort_unstable();

        let mut images = Vec::new();
        for name in dex_names {
            let (data, _) = zip.read(&name)?;
            match Dex::new(data) {
                Ok(dex) => images.push((name, dex)),
                Err(err) => warn!("skipping {name}: {err}"),
            }
        }

        if images.is_empty() {
            return Err(ApkError::InvalidInput("no parsable dex image in archive"));
        }

        let certificate = Self::read_certificate(&zip);

        Ok(Apk {
            zip,
            manifest,
            images,
            certificate,
        })
    }

    /// `classes.dex`, `classes2.dex`, ... at the archive root
    fn is_dex_member(name: &str) -> bool {
        let Some(middle) = name
            .strip_prefix("classes")
            .and_then(|rest| rest.strip_suffix(".dex"))
        else {
            return false;
        };

        middle.is_empty() || middle.chars().all(|c| c.is_ascii_digit())
    }

    fn read_certificate(zip: &ZipEntry) -> Option<SigningCertificate> {
        let member = zip.namelist().find(|name| {
            name.starts_with("META-INF/")
                && (name.ends_with(".RSA") || name.ends_with(".DSA") || name.ends_with(".EC"))
        })?;

        let (data, _) = zip.read(member).ok()?;
        match SigningCertificate::from_pkcs7(&data) {
            Ok(certificate) => Some(certificate),
            Err(err) => {
                warn!("can't read signature block {member}: {err}");
                None
            }
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Decoded manifest rendered back to text
    pub fn manifest_xml(&self) -> &str {
        &self.manifest.xml
    }

    pub fn is_debuggable(&self) -> bool {
        self.manifest.is_debuggable()
    }

    pub fn certificate(&self) -> Option<&SigningCertificate> {
        self.certificate.as_ref()
    }

    /// Parsed dex images with their archive member names
    pub fn images(&self) -> impl Iterator<Item = (&str, &Dex)> {
        self.images.iter().map(|(name, dex)| (name.as_str(), dex))
    }

    /// List of the filenames included in the central directory
    pub fn namelist(&self) -> impl Iterator<Item = &str> {
        self.zip.namelist()
    }

    /// Disassemble `class.method` wherever it occurs, one listing per image
    pub fn disassemble(
        &self,
        method_path: &str,
        sink: &mut dyn Write,
    ) -> Result<bool, ApkError> {
        let mut found = false;
        for (_, dex) in self.images() {
            found |= dex.disassemble(method_path, CfgType::None, sink)?;
        }
        Ok(found)
    }

    /// Native library paths, relative to the `lib/` directory
    pub fn libs(&self) -> Vec<String> {
        self.zip
            .namelist()
            .filter_map(|name| name.strip_prefix(NATIVE_LIB_PREFIX))
            .filter(|rest| !rest.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Write native libraries below `./libs/`, all of them or the one
    /// matching `target`. Returns the destination paths.
    pub fn extract_libs(&self, target: Option<&str>) -> Result<Vec<PathBuf>, ApkError> {
        let mut written = Vec::new();

        let members: Vec<String> = self
            .zip
            .namelist()
            .filter(|name| name.starts_with(NATIVE_LIB_PREFIX))
            .filter(|name| match target {
                Some(target) => name.strip_prefix(NATIVE_LIB_PREFIX) == Some(target),
                None => true,
            })
            .map(str::to_owned)
            .collect();

        for member in members {
            let (data, _) = self.zip.read(&member)?;

            let dest = Path::new(LIB_DUMP_DIR).join(&member);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, data)?;
            written.push(dest);
        }

        Ok(written)
    }

    /// SHA-1 of every native library, by archive member name
    pub fn libs_hash(&self) -> Result<Vec<(String, String)>, ApkError> {
        let members: Vec<String> = self
            .zip
            .namelist()
            .filter(|name| name.starts_with(NATIVE_LIB_PREFIX))
            .map(str::to_owned)
            .collect();

        let mut hashes = Vec::new();
        for member in members {
            let (data, _) = self.zip.read(&member)?;
            let digest = const_hex::encode(Sha1::digest(&data));
            hashes.push((member, digest));
        }

        Ok(hashes)
    }

    /// Guess the source language from telltale archive members
    pub fn language(&self) -> &'static str {
        for name in self.zip.namelist() {
            if name.starts_with("kotlin/") {
                return "Kotlin";
            }
            if name.starts_with("assemblies/Xamarin.") {
                return ".NET (Xamarin)";
            }
        }

        "Java"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dex_member_names_are_recognized() {
        assert!(Apk::is_dex_member("classes.dex"));
        assert!(Apk::is_dex_member("classes2.dex"));
        assert!(Apk::is_dex_member("classes10.dex"));
        assert!(!Apk::is_dex_member("classesX.dex"));
        assert!(!Apk::is_dex_member("lib/classes.dex"));
        assert!(!Apk::is_dex_member("resources.arsc"));
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let err = Apk::new(Path::new("/definitely/not/here.apk")).unwrap_err();
        assert!(matches!(err, ApkError::IoError(_)));
    }
}
