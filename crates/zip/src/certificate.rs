//! v1 (JAR) signing certificate extraction.
//!
//! The `META-INF/*.RSA` / `.DSA` / `.EC` member is a PKCS#7 `SignedData`
//! blob carrying the signer chain; the last certificate of the chain is the
//! root signer whose details are rendered here.

use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use der::{Decode, Encode};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x509_cert::Certificate;
use x509_cert::time::Time;

use crate::errors::CertificateError;

/// Decoded root signer of an archive.
#[derive(Debug)]
pub struct SigningCertificate {
    text: String,
    not_before: String,
    not_after: String,
}

impl SigningCertificate {
    /// Decode a PKCS#7 signature block and render its root certificate.
    pub fn from_pkcs7(data: &[u8]) -> Result<SigningCertificate, CertificateError> {
        let content_info = ContentInfo::from_der(data)?;
        let signed_data: SignedData = content_info.content.decode_as()?;

        let certificates = signed_data
            .certificates
            .as_ref()
            .ok_or(CertificateError::EmptyChain)?;

        // the chain is leaf-first, the root signer comes last
        let root = certificates
            .0
            .iter()
            .filter_map(|choice| match choice {
                CertificateChoices::Certificate(certificate) => Some(certificate),
                _ => None,
            })
            .last()
            .ok_or(CertificateError::EmptyChain)?;

        let not_before = time_string(&root.tbs_certificate.validity.not_before);
        let not_after = time_string(&root.tbs_certificate.validity.not_after);
        let text = render_certificate(root, &not_before, &not_after)?;

        Ok(SigningCertificate {
            text,
            not_before,
            not_after,
        })
    }

    /// Multi-line textual rendering of the root certificate
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Start of the validity window; effectively when the application was signed
    pub fn not_before(&self) -> &str {
        &self.not_before
    }

    /// End of the validity window
    pub fn not_after(&self) -> &str {
        &self.not_after
    }
}

fn time_string(time: &Time) -> String {
    match time {
        Time::UtcTime(utc) => utc.to_date_time().to_string(),
        Time::GeneralTime(general) => general.to_date_time().to_string(),
    }
}

fn render_certificate(
    certificate: &Certificate,
    not_before: &str,
    not_after: &str,
) -> Result<String, CertificateError> {
    let tbs = &certificate.tbs_certificate;

    let serial = const_hex::encode(tbs.serial_number.as_bytes());
    let algorithm = signature_algorithm_name(&certificate.signature_algorithm.oid.to_string());

    let der = certificate.to_der()?;
    let md5 = const_hex::encode(Md5::digest(&der));
    let sha1 = const_hex::encode(Sha1::digest(&der));
    let sha256 = const_hex::encode(Sha256::digest(&der));

    Ok(format!(
        "Certificate:\n\
         \x20   Data:\n\
         \x20       Version: {:?}\n\
         \x20       Serial Number: {}\n\
         \x20       Signature Algorithm: {}\n\
         \x20       Issuer: {}\n\
         \x20       Validity:\n\
         \x20           Not Before: {}\n\
         \x20           Not After : {}\n\
         \x20       Subject: {}\n\
         \x20   Fingerprints:\n\
         \x20       MD5:     {}\n\
         \x20       SHA-1:   {}\n\
         \x20       SHA-256: {}",
        tbs.version, serial, algorithm, tbs.issuer, not_before, not_after, tbs.subject, md5, sha1, sha256,
    ))
}

/// Friendly names for the signature algorithms seen on app markets
fn signature_algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.4" => "md5WithRSAEncryption".to_owned(),
        "1.2.840.113549.1.1.5" => "sha1WithRSAEncryption".to_owned(),
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption".to_owned(),
        "1.2.840.113549.1.1.12" => "sha384WithRSAEncryption".to_owned(),
        "1.2.840.113549.1.1.13" => "sha512WithRSAEncryption".to_owned(),
        "1.2.840.10040.4.3" => "dsaWithSha1".to_owned(),
        "1.2.840.10045.4.3.2" => "ecdsaWithSHA256".to_owned(),
        "1.2.840.10045.4.3.3" => "ecdsaWithSHA384".to_owned(),
        other => other.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_not_a_signature_block() {
        assert!(SigningCertificate::from_pkcs7(b"not a der blob").is_err());
    }

    #[test]
    fn algorithm_names_resolve() {
        assert_eq!(
            signature_algorithm_name("1.2.840.113549.1.1.11"),
            "sha256WithRSAEncryption"
        );
        assert_eq!(signature_algorithm_name("1.2.3.4"), "1.2.3.4");
    }
}
