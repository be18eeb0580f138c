use const_oid::AssociatedOid;
use der::{Decode, Encode, asn1::Ia5String, oid::ObjectIdentifier};
use x509_cert::ext::pkix::{self, name::GeneralName};

use super::params::ExtensionParam;
use crate::error::CertCloneError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use certclone::cert::extensions::SubjectAltName;
/// use certclone::cert::extensions::ToAndFromX509Extension;
/// let san = SubjectAltName { names: vec!["example.com".to_string()] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertCloneError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertCloneError>
    where
        Self: Sized;
}

/// Checks that a copied extension value decodes as the structure its OID announces.
///
/// Extensions this module does not model are passed through unchecked.
pub fn check_well_formed(ext: &ExtensionParam) -> Result<(), CertCloneError> {
    check_as::<SubjectAltName>(ext)
        .or_else(|| check_as::<BasicConstraints>(ext))
        .or_else(|| check_as::<KeyUsage>(ext))
        .or_else(|| check_as::<ExtendedKeyUsage>(ext))
        .or_else(|| check_der::<pkix::AuthorityKeyIdentifier>(ext))
        .or_else(|| check_der::<pkix::SubjectKeyIdentifier>(ext))
        .unwrap_or(Ok(()))
        .map_err(|e| {
            CertCloneError::SigningError(format!("malformed extension {}: {e}", ext.oid))
        })
}

fn check_as<E: ToAndFromX509Extension>(
    ext: &ExtensionParam,
) -> Option<Result<(), CertCloneError>> {
    (ext.oid == E::OID).then(|| E::from_x509_extension_value(&ext.value).map(drop))
}

// Key identifiers are copied verbatim from the source, so only their syntax is checked.
fn check_der<'a, T>(ext: &'a ExtensionParam) -> Option<Result<(), CertCloneError>>
where
    T: AssociatedOid + Decode<'a>,
{
    (ext.oid == T::OID).then(|| T::from_der(&ext.value).map(drop).map_err(Into::into))
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Only DNS names are surfaced; other general name forms are accepted and skipped.
///
/// # Fields
/// * `names` - A list of DNS names.
#[derive(Debug, Clone)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertCloneError> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(|name| {
                    Ia5String::new(name)
                        .map(GeneralName::DnsName)
                        .map_err(|e| CertCloneError::ValidationError(e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
        );

        san.to_der().map_err(CertCloneError::encoding)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertCloneError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .filter_map(|name| match name {
                GeneralName::DnsName(dns) => Some(dns.to_string()),
                _ => None,
            })
            .collect();
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Default)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u32>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertCloneError> {
        let path_len_constraint = self
            .max_path_length
            .map(u8::try_from)
            .transpose()
            .map_err(|_| {
                CertCloneError::ValidationError(format!(
                    "path length {} does not fit the encoding (max 255)",
                    self.max_path_length.unwrap_or_default()
                ))
            })?;
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint,
        };

        bc.to_der().map_err(CertCloneError::encoding)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CertCloneError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint.map(u32::from),
        })
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertCloneError> {
        let ku = X509KeyUsage::from(self.0);
        ku.to_der().map_err(CertCloneError::encoding)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertCloneError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
#[derive(Debug, Clone, Default)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CertCloneError> {
        let oids: Vec<ObjectIdentifier> = self.usage.iter().map(|v| (*v).into()).collect();
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(oids);
        eku.to_der().map_err(CertCloneError::encoding)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertCloneError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        let usage = eku.0.iter().map(|v| ExtendedKeyUsageOption::from(*v)).collect();
        Ok(Self { usage })
    }
}

/// Represents an option for the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    Other(ObjectIdentifier),
}

impl From<ObjectIdentifier> for ExtendedKeyUsageOption {
    fn from(value: ObjectIdentifier) -> Self {
        match value {
            const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => ExtendedKeyUsageOption::OcspSigning,
            const_oid::db::rfc5912::ID_KP_SERVER_AUTH => ExtendedKeyUsageOption::ServerAuth,
            const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => ExtendedKeyUsageOption::ClientAuth,
            const_oid::db::rfc5912::ID_KP_CODE_SIGNING => ExtendedKeyUsageOption::CodeSigning,
            const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                ExtendedKeyUsageOption::EmailProtection
            }
            const_oid::db::rfc5912::ID_KP_TIME_STAMPING => ExtendedKeyUsageOption::TimeStamping,
            other => ExtendedKeyUsageOption::Other(other),
        }
    }
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
            ExtendedKeyUsageOption::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
            ExtendedKeyUsageOption::Other(oid) => oid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_constraints_encoding_decoding() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(3),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.is_ca, decoded.is_ca);
        assert_eq!(original.max_path_length, decoded.max_path_length);
    }

    #[test]
    fn test_basic_constraints_rejects_oversized_path_length() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(256),
        };
        assert!(matches!(
            original.to_x509_extension_value(),
            Err(CertCloneError::ValidationError(_))
        ));

        let widest = BasicConstraints {
            is_ca: true,
            max_path_length: Some(255),
        };
        let encoded = widest.to_x509_extension_value().unwrap();
        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(decoded.max_path_length, Some(255));
    }

    #[test]
    fn test_key_usage_encoding_decoding() {
        let original = KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_extended_key_usage_keeps_unknown_purposes() {
        let custom = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.3");
        let original = ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::Other(custom),
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = ExtendedKeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.usage, decoded.usage);
    }

    #[test]
    fn test_check_well_formed() {
        let san = SubjectAltName {
            names: vec!["example.com".to_string()],
        };
        let good = ExtensionParam {
            oid: SubjectAltName::OID,
            critical: false,
            value: san.to_x509_extension_value().unwrap(),
        };
        assert!(check_well_formed(&good).is_ok());

        let truncated = ExtensionParam {
            value: good.value[..good.value.len() - 2].to_vec(),
            ..good.clone()
        };
        assert!(matches!(
            check_well_formed(&truncated),
            Err(CertCloneError::SigningError(_))
        ));

        let unknown = ExtensionParam {
            oid: ObjectIdentifier::new_unwrap("1.2.3.4.5"),
            critical: false,
            value: vec![0xff],
        };
        assert!(check_well_formed(&unknown).is_ok());

        let bad_ski = ExtensionParam {
            oid: <pkix::SubjectKeyIdentifier as AssociatedOid>::OID,
            critical: false,
            value: vec![0x02, 0x01, 0x00],
        };
        assert!(check_well_formed(&bad_ski).is_err());
    }
}
