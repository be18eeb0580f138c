#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use certclone::cert::SignatureAlgorithm;
use certclone::cert::extensions::{
    BasicConstraints, ExtendedKeyUsage, ExtendedKeyUsageOption, SubjectAltName,
    ToAndFromX509Extension,
};
use certclone::key::{CertificateSigner, KeyPair};
use const_oid::ObjectIdentifier;
use der::asn1::{BitString, GeneralizedTime, OctetString, UtcTime};
use der::pem::LineEnding;
use der::{Encode, EncodePem};
use rsa::pkcs8::EncodePrivateKey;
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::{Time, Validity};
use x509_cert::Version;

pub const SUBJECT: &str = "CN=example.com,O=Example Corp,C=US";
pub const ISSUER: &str = "CN=Example Issuing CA,O=Example Corp,C=US";
pub const SERIAL: &[u8] = &[0x01, 0x23, 0x45, 0x67, 0x89];
/// A private extension OID the library knows nothing about.
pub const CUSTOM_EXTENSION_OID: &str = "1.3.6.1.4.1.55555.1.1";

pub fn name(rfc4514: &str) -> Name {
    Name::from_str(rfc4514).unwrap()
}

pub fn validity() -> Validity {
    Validity {
        not_before: Time::UtcTime(
            UtcTime::from_unix_duration(Duration::from_secs(1_700_000_000)).unwrap(),
        ),
        not_after: Time::GeneralTime(
            GeneralizedTime::from_unix_duration(Duration::from_secs(4_102_444_800)).unwrap(),
        ),
    }
}

pub fn extension<E: ToAndFromX509Extension>(value: E, critical: bool) -> Extension {
    raw_extension(E::OID, critical, value.to_x509_extension_value().unwrap())
}

pub fn raw_extension(oid: ObjectIdentifier, critical: bool, value: Vec<u8>) -> Extension {
    Extension {
        extn_id: oid,
        critical,
        extn_value: OctetString::new(value).unwrap(),
    }
}

/// The extensions a typical server certificate carries, plus one unknown extension.
pub fn server_extensions() -> Vec<Extension> {
    vec![
        extension(
            BasicConstraints {
                is_ca: false,
                max_path_length: None,
            },
            true,
        ),
        extension(
            SubjectAltName {
                names: vec!["example.com".to_string(), "www.example.com".to_string()],
            },
            false,
        ),
        extension(
            ExtendedKeyUsage {
                usage: vec![ExtendedKeyUsageOption::ServerAuth],
            },
            false,
        ),
        raw_extension(
            ObjectIdentifier::new_unwrap(CUSTOM_EXTENSION_OID),
            false,
            vec![0x0c, 0x05, b'h', b'e', b'l', b'l', b'o'],
        ),
    ]
}

/// Builds a certificate for `subject_key`, signed by `issuer_key` under `issuer`.
pub fn source_certificate(
    subject_key: &KeyPair,
    issuer_key: &KeyPair,
    issuer: &str,
    algorithm: SignatureAlgorithm,
    extensions: Vec<Extension>,
) -> CertificateInner {
    let tbs_certificate = TbsCertificateInner {
        version: Version::V3,
        serial_number: SerialNumber::new(SERIAL).unwrap(),
        signature: AlgorithmIdentifierOwned::from(algorithm),
        issuer: name(issuer),
        validity: validity(),
        subject: name(SUBJECT),
        subject_public_key_info: subject_key.public_key().to_spki().unwrap(),
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: (!extensions.is_empty()).then_some(extensions),
    };
    let signature = issuer_key
        .sign(algorithm, &tbs_certificate.to_der().unwrap())
        .unwrap();
    CertificateInner {
        tbs_certificate,
        signature_algorithm: AlgorithmIdentifierOwned::from(algorithm),
        signature: BitString::from_bytes(&signature).unwrap(),
    }
}

/// A self-signed server certificate with [`server_extensions`].
pub fn self_signed_certificate(key: &KeyPair) -> CertificateInner {
    source_certificate(
        key,
        key,
        SUBJECT,
        SignatureAlgorithm::Sha256WithRSA,
        server_extensions(),
    )
}

pub fn to_pem(cert: &CertificateInner) -> String {
    cert.to_pem(LineEnding::LF).unwrap()
}

/// The key as a PKCS#8 `PRIVATE KEY` block.
pub fn pkcs8_pem(key: &KeyPair) -> String {
    let KeyPair::Rsa { private, .. } = key;
    private.to_pkcs8_pem(LineEnding::LF).unwrap().to_string()
}

pub fn generate_key() -> KeyPair {
    KeyPair::generate_rsa(1024).unwrap()
}

/// Creates `<parent>/<name>/` holding `<name>.crt` and, if given, `<name>.key`.
pub fn source_dir(parent: &Path, name: &str, cert_pem: &str, key_pem: Option<&str>) -> PathBuf {
    let dir = parent.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{name}.crt")), cert_pem).unwrap();
    if let Some(key_pem) = key_pem {
        std::fs::write(dir.join(format!("{name}.key")), key_pem).unwrap();
    }
    dir
}
