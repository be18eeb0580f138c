use const_oid::ObjectIdentifier;
use der::asn1::OctetString;
use time::OffsetDateTime;

use super::extensions::ToAndFromX509Extension;
use crate::error::CertCloneError;

/// Certificate validity period.
///
/// This struct is a time-typed view of the `notBefore` and `notAfter` fields.
///
/// # Fields
/// * `not_before` - The start of the validity period.
/// * `not_after` - The end of the validity period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Reads the validity period of an encoded certificate.
    ///
    /// # Arguments
    /// * `validity` - The `x509_cert` validity, in either UTCTime or GeneralizedTime.
    pub fn from_x509(validity: &x509_cert::time::Validity) -> Self {
        Self {
            not_before: to_offset_date_time(&validity.not_before),
            not_after: to_offset_date_time(&validity.not_after),
        }
    }

    /// Whether `instant` falls inside the window, bounds included.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }
}

fn to_offset_date_time(time: &x509_cert::time::Time) -> OffsetDateTime {
    match time {
        x509_cert::time::Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Copies an extension out of a decoded certificate.
    pub fn from_x509(ext: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: ext.extn_id,
            critical: ext.critical,
            value: ext.extn_value.as_bytes().to_vec(),
        }
    }

    /// Builds the `x509_cert` extension carrying the same OID, criticality and value.
    pub fn to_x509(&self) -> Result<x509_cert::ext::Extension, CertCloneError> {
        let extn_value = OctetString::new(self.value.clone())
            .map_err(|e| CertCloneError::EncodingError(e.to_string()))?;
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    ///
    /// # Returns
    /// A decoded extension object.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CertCloneError> {
        E::from_x509_extension_value(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::asn1::{GeneralizedTime, UtcTime};
    use std::time::Duration;

    #[test]
    fn test_validity_reads_both_time_encodings() {
        let validity = x509_cert::time::Validity {
            not_before: x509_cert::time::Time::UtcTime(
                UtcTime::from_unix_duration(Duration::from_secs(1_700_000_000)).unwrap(),
            ),
            not_after: x509_cert::time::Time::GeneralTime(
                GeneralizedTime::from_unix_duration(Duration::from_secs(4_102_444_800)).unwrap(),
            ),
        };
        let parsed = Validity::from_x509(&validity);
        assert_eq!(parsed.not_before.unix_timestamp(), 1_700_000_000);
        assert_eq!(parsed.not_after.unix_timestamp(), 4_102_444_800);
        assert!(parsed.contains(OffsetDateTime::from_unix_timestamp(1_800_000_000).unwrap()));
        assert!(!parsed.contains(OffsetDateTime::from_unix_timestamp(1_600_000_000).unwrap()));
    }

    #[test]
    fn test_extension_param_keeps_fields() {
        let ext = x509_cert::ext::Extension {
            extn_id: ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11129.2.4.2"),
            critical: false,
            extn_value: OctetString::new(vec![0x04, 0x02, 0xca, 0xfe]).unwrap(),
        };
        let param = ExtensionParam::from_x509(&ext);
        assert_eq!(param.value, vec![0x04, 0x02, 0xca, 0xfe]);
        assert_eq!(param.to_x509().unwrap(), ext);
    }
}
